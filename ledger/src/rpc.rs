//! JSON-RPC ledger client.
//!
//! Builds and signs reward program transactions locally with the authority
//! keypair and submits them with `sendTransaction`, then polls
//! `getSignatureStatuses` until the cluster reports the transaction as
//! confirmed. Preflight refusals and execution failures are classified into
//! [`LedgerError`] variants with the ledger detail attached.

use crate::instructions::{convert_to_brick, mint_blocks};
use crate::state::{GlobalConfigAccount, PlayerProfileAccount};
use crate::transaction::{Instruction, Message};
use crate::{
    ConversionReceipt, GlobalStats, LedgerAccounts, LedgerAdapter, LedgerError, LedgerMode,
    PlayerStats,
};

use async_trait::async_trait;
use base64::Engine;
use ecobuild_crypto::AuthorityKeypair;
use ecobuild_types::{Address, TransactionRef};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONFIRM_INTERVAL: Duration = Duration::from_millis(500);
const COMMITMENT: &str = "confirmed";

/// Custom error number of the reward program's `Overflow` variant.
const PROGRAM_OVERFLOW: u64 = 6005;

#[derive(Clone, Debug)]
pub struct RpcLedgerConfig {
    pub url: String,
    pub timeout: Duration,
    pub blocks_per_brick: u64,
    /// Delay between confirmation polls.
    pub confirm_interval: Duration,
}

impl Default for RpcLedgerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            blocks_per_brick: 10,
            confirm_interval: DEFAULT_CONFIRM_INTERVAL,
        }
    }
}

pub struct RpcLedger {
    http_client: reqwest::Client,
    url: String,
    accounts: LedgerAccounts,
    authority: AuthorityKeypair,
    blocks_per_brick: u64,
    timeout: Duration,
    confirm_interval: Duration,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
struct AccountValue {
    /// `[payload, encoding]`
    data: (String, String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<String>,
}

impl SignatureStatus {
    fn is_confirmed(&self) -> bool {
        matches!(
            self.confirmation_status.as_deref(),
            Some("confirmed") | Some("finalized")
        )
    }
}

/// Classify an execution failure reported in a signature status.
fn classify_status_error(err: &Value) -> LedgerError {
    let detail = format!("transaction failed: {err}");
    let custom = err
        .get("InstructionError")
        .and_then(|e| e.get(1))
        .and_then(|e| e.get("Custom"))
        .and_then(Value::as_u64);
    match custom {
        Some(PROGRAM_OVERFLOW) => LedgerError::Overflow(detail),
        _ => LedgerError::classify(&detail, &[]),
    }
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    amount: String,
}

impl RpcLedger {
    pub fn new(config: RpcLedgerConfig, accounts: LedgerAccounts, authority: AuthorityKeypair) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            url: config.url,
            accounts,
            authority,
            blocks_per_brick: config.blocks_per_brick,
            timeout: config.timeout,
            confirm_interval: config.confirm_interval,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let response = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerError::Unreachable(format!("{method} timed out: {e}"))
                } else if e.is_connect() {
                    LedgerError::Unreachable(format!("connection failed: {e}"))
                } else {
                    LedgerError::Unreachable(format!("{method} failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(LedgerError::Unreachable(format!(
                "{method}: HTTP status {}",
                response.status()
            )));
        }

        let parsed: RpcResponse<T> = response.json().await.map_err(|e| {
            LedgerError::InvalidResponse(format!("failed to parse {method} response: {e}"))
        })?;

        if let Some(error) = parsed.error {
            let logs: Vec<String> = error
                .data
                .as_ref()
                .and_then(|d| d.get("logs"))
                .and_then(Value::as_array)
                .map(|logs| {
                    logs.iter()
                        .filter_map(|l| l.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            tracing::debug!(method, code = error.code, message = %error.message, "ledger rpc error");
            return Err(LedgerError::classify(&error.message, &logs));
        }

        parsed
            .result
            .ok_or_else(|| LedgerError::InvalidResponse(format!("{method} returned no result")))
    }

    async fn latest_blockhash(&self) -> Result<[u8; 32], LedgerError> {
        let reply: WithContext<BlockhashValue> = self
            .call("getLatestBlockhash", json!([{ "commitment": COMMITMENT }]))
            .await?;
        let bytes = bs58::decode(&reply.value.blockhash)
            .into_vec()
            .map_err(|e| LedgerError::InvalidResponse(format!("bad blockhash: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| LedgerError::InvalidResponse("blockhash is not 32 bytes".into()))
    }

    async fn submit(&self, instruction: Instruction) -> Result<TransactionRef, LedgerError> {
        let blockhash = self.latest_blockhash().await?;
        let message = Message::compile(&self.authority.address(), &[instruction], blockhash)?;
        let (wire, _) = message.sign(&self.authority)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(wire);

        let signature: String = self
            .call(
                "sendTransaction",
                json!([encoded, { "encoding": "base64", "preflightCommitment": COMMITMENT }]),
            )
            .await?;
        self.confirm(&signature).await?;
        Ok(TransactionRef::new(signature))
    }

    /// Poll until `signature` reaches `confirmed`, fails, or the ledger
    /// timeout passes.
    async fn confirm(&self, signature: &str) -> Result<(), LedgerError> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            let reply: WithContext<Vec<Option<SignatureStatus>>> = self
                .call("getSignatureStatuses", json!([[signature]]))
                .await?;
            if let Some(status) = reply.value.into_iter().next().flatten() {
                if let Some(err) = status.err.as_ref().filter(|e| !e.is_null()) {
                    tracing::warn!(signature, error = %err, "transaction failed on execution");
                    return Err(classify_status_error(err));
                }
                if status.is_confirmed() {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() + self.confirm_interval > deadline {
                return Err(LedgerError::Unreachable(format!(
                    "transaction {signature} not confirmed within {}ms",
                    self.timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.confirm_interval).await;
        }
    }

    async fn account_data(&self, address: &Address) -> Result<Option<Vec<u8>>, LedgerError> {
        let reply: WithContext<Option<AccountValue>> = self
            .call(
                "getAccountInfo",
                json!([address.to_base58(), { "encoding": "base64", "commitment": COMMITMENT }]),
            )
            .await?;
        let Some(account) = reply.value else {
            return Ok(None);
        };
        base64::engine::general_purpose::STANDARD
            .decode(&account.data.0)
            .map(Some)
            .map_err(|e| LedgerError::InvalidResponse(format!("bad account data: {e}")))
    }

    /// `None` when the token account does not exist.
    async fn token_balance(&self, address: &Address) -> Result<Option<u64>, LedgerError> {
        let reply: Result<WithContext<TokenAmount>, LedgerError> = self
            .call(
                "getTokenAccountBalance",
                json!([address.to_base58(), { "commitment": COMMITMENT }]),
            )
            .await;
        match reply {
            Ok(reply) => reply
                .value
                .amount
                .parse()
                .map(Some)
                .map_err(|e| LedgerError::InvalidResponse(format!("bad token amount: {e}"))),
            Err(LedgerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl LedgerAdapter for RpcLedger {
    fn mode(&self) -> LedgerMode {
        LedgerMode::Rpc
    }

    fn accounts(&self) -> &LedgerAccounts {
        &self.accounts
    }

    fn authority(&self) -> Address {
        self.authority.address()
    }

    fn blocks_per_brick(&self) -> u64 {
        self.blocks_per_brick
    }

    async fn mint(
        &self,
        actor: &Address,
        amount: u64,
        category_code: u8,
    ) -> Result<TransactionRef, LedgerError> {
        let player = self.accounts.player(actor)?;
        let ix = mint_blocks(
            &self.accounts,
            &self.authority.address(),
            &player,
            amount,
            category_code,
        );
        let tx = self.submit(ix).await?;
        tracing::info!(%actor, amount, category_code, transaction = %tx, "minted blocks");
        Ok(tx)
    }

    async fn convert(&self, owner: &Address) -> Result<ConversionReceipt, LedgerError> {
        let authority = self.authority.address();
        if *owner != authority {
            return Err(LedgerError::Unauthorized(format!(
                "conversion for {owner} must be signed by its owner; this ledger signs as {authority}"
            )));
        }
        let player = self.accounts.player(owner)?;
        let transaction = self.submit(convert_to_brick(&self.accounts, &player)).await?;
        tracing::info!(%owner, transaction = %transaction, "converted blocks to brick");
        Ok(ConversionReceipt {
            transaction,
            blocks_converted: self.blocks_per_brick,
            bricks_received: 1,
        })
    }

    async fn player_stats(&self, actor: &Address) -> Result<PlayerStats, LedgerError> {
        let player = self.accounts.player(actor)?;
        let data = self
            .account_data(&player.profile)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("no player profile for {actor}")))?;
        let profile = PlayerProfileAccount::decode(&data)?;
        let balance = self.token_balance(&player.token_account).await?.unwrap_or(0);
        Ok(PlayerStats {
            wallet: *actor,
            total_credits: profile.total_credits,
            blocks_minted: profile.blocks_minted,
            brick_count: profile.brick_count,
            collections_count: profile.collections_count,
            current_block_balance: balance,
        })
    }

    async fn global_stats(&self) -> Result<GlobalStats, LedgerError> {
        let data = self
            .account_data(&self.accounts.global_config)
            .await?
            .ok_or_else(|| LedgerError::NotFound("global config is not initialised".into()))?;
        let config = GlobalConfigAccount::decode(&data)?;
        Ok(GlobalStats {
            authority: config.authority,
            block_mint: config.block_mint,
            total_blocks_minted: config.total_blocks_minted,
            total_bricks_created: config.total_bricks_created,
        })
    }
}
