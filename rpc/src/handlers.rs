//! Request handlers.

use crate::server::{AppState, REQUEST_ID_HEADER};
use crate::RpcError;
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ecobuild_attestation::{AttestationError, ImageUpload};
use ecobuild_types::Address;
use ecobuild_verification::{ConversionMode, ConversionRequest, VerificationOutcome};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info_span, warn, Instrument};

/// `{"ok": true, ...body}`
#[derive(Serialize)]
struct OkBody<T> {
    ok: bool,
    #[serde(flatten)]
    body: T,
}

fn ok<T: Serialize>(body: T) -> Json<OkBody<T>> {
    Json(OkBody { ok: true, body })
}

fn tag_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn respond(result: Result<Response, RpcError>, request_id: &str) -> Response {
    let response = result.unwrap_or_else(IntoResponse::into_response);
    tag_request_id(response, request_id)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let orchestrator = &state.orchestrator;
    let accounts = orchestrator.ledger_accounts();
    Json(json!({
        "ok": true,
        "version": state.config.version,
        "commit": state.config.commit,
        "ledgerMode": orchestrator.ledger_mode().as_str(),
        "classifierMode": orchestrator.classifier_mode().as_str(),
        "conversionMode": orchestrator.conversion_mode().as_str(),
        "programId": accounts.program_id,
        "globalConfig": accounts.global_config,
        "blockMint": accounts.block_mint,
        "authority": orchestrator.authority(),
    }))
}

fn malformed(e: MultipartError) -> RpcError {
    RpcError::Invalid(vec![format!("malformed multipart body: {}", e.body_text())])
}

async fn read_verify_form(
    mut multipart: Multipart,
) -> Result<(Option<String>, Option<ImageUpload>), RpcError> {
    let mut wallet = None;
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            Some("player_wallet") => {
                wallet = Some(field.text().await.map_err(malformed)?);
            }
            _ => {}
        }
    }
    Ok((wallet, image))
}

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = state.request_id(&headers);
    let span = info_span!("verify", request_id = %request_id);
    let result = verify_inner(&state, multipart).instrument(span).await;
    respond(result, &request_id)
}

async fn verify_inner(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RpcError> {
    let multipart = multipart.map_err(|e| {
        state.metrics.record_verify("invalid");
        RpcError::Invalid(vec![format!("expected a multipart form: {}", e.body_text())])
    })?;
    let (wallet, image) = read_verify_form(multipart).await.inspect_err(|_| {
        state.metrics.record_verify("invalid");
    })?;

    let outcome = match state.orchestrator.verify(wallet.as_deref(), image).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let label = e.stage().map(|s| s.as_str()).unwrap_or("error");
            state.metrics.record_verify(label);
            return Err(e.into());
        }
    };
    state.metrics.record_verify(outcome.stage().as_str());

    let verified = outcome.is_verified();
    let body = match outcome {
        VerificationOutcome::Rejected {
            actor,
            verdict,
            reason,
            attestation_id,
        } => json!({
            "ok": true,
            "verified": verified,
            "classification": verdict,
            "reason": reason,
            "playerWallet": actor,
            "attestationId": attestation_id.to_hex(),
        }),
        VerificationOutcome::Minted {
            actor,
            verdict,
            reward_units,
            transaction,
            attestation_id,
            ..
        } => json!({
            "ok": true,
            "verified": verified,
            "classification": verdict,
            "blocksMinted": reward_units,
            "transaction": transaction,
            "playerWallet": actor,
            "attestationId": attestation_id.to_hex(),
        }),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn attest(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = state.request_id(&headers);
    let result =
        info_span!("attest", request_id = %request_id).in_scope(|| attest_inner(&state, &body));
    respond(result, &request_id)
}

fn attest_inner(state: &AppState, body: &[u8]) -> Result<Response, RpcError> {
    let raw = match serde_json::from_slice::<Value>(body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "attestation body is not JSON");
            state.metrics.record_attest("invalid");
            return Err(RpcError::InvalidClaim {
                errors: vec![format!("body is not valid JSON: {e}")],
                server_timestamp: state.orchestrator.now(),
            });
        }
    };

    match state.orchestrator.attest(&raw) {
        Ok(validated) => {
            state.metrics.record_attest("accepted");
            Ok(Json(json!({
                "ok": true,
                "attestationId": validated.attestation_id.to_hex(),
                "normalized": validated.claim,
                "serverTimestamp": validated.server_timestamp,
            }))
            .into_response())
        }
        Err(AttestationError::Invalid {
            violations,
            server_timestamp,
        }) => {
            state.metrics.record_attest("invalid");
            Err(RpcError::InvalidClaim {
                errors: violations,
                server_timestamp,
            })
        }
        Err(AttestationError::Serialization(detail)) => Err(RpcError::Internal(detail)),
    }
}

pub async fn convert(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = state.request_id(&headers);
    let span = info_span!("convert", request_id = %request_id);
    let result = convert_inner(&state, &body).instrument(span).await;
    respond(result, &request_id)
}

async fn convert_inner(state: &AppState, body: &[u8]) -> Result<Response, RpcError> {
    let request = match state.orchestrator.conversion_mode() {
        ConversionMode::Authority => None,
        ConversionMode::Actor if body.is_empty() => None,
        ConversionMode::Actor => Some(
            serde_json::from_slice::<ConversionRequest>(body)
                .map_err(|e| RpcError::Invalid(vec![format!("body is not valid JSON: {e}")]))?,
        ),
    };
    let receipt = state
        .orchestrator
        .convert(request.as_ref())
        .await
        .map_err(RpcError::from_conversion)?;
    Ok(ok(receipt).into_response())
}

pub async fn player_stats(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Response, RpcError> {
    let actor = Address::parse(address.trim()).map_err(|_| {
        RpcError::Invalid(vec![format!(
            "address is not a valid address (got '{address}')"
        )])
    })?;
    let stats = state.orchestrator.player_stats(&actor).await?;
    Ok(ok(stats).into_response())
}

pub async fn global_stats(State(state): State<AppState>) -> Result<Response, RpcError> {
    let stats = state.orchestrator.global_stats().await?;
    Ok(ok(stats).into_response())
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, RpcError> {
    let text = state.metrics.encode()?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        text,
    )
        .into_response())
}
