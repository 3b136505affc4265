//! Upload checks for the image surface.

use ecobuild_crypto::sha256_hex;
use ecobuild_types::Address;

const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// An image file as received from the multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// A well-formed image verification request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    pub actor: Address,
    pub image: Vec<u8>,
    pub media_type: String,
}

impl VerificationRequest {
    /// Lowercase hex SHA-256 of the image, used as the evidence hash.
    pub fn image_digest(&self) -> String {
        sha256_hex(&self.image)
    }
}

/// Check the actor address and image, collecting every violation.
pub fn validate_upload(
    player_wallet: Option<&str>,
    image: Option<ImageUpload>,
    max_bytes: usize,
) -> Result<VerificationRequest, Vec<String>> {
    let mut violations = Vec::new();

    let actor = match player_wallet.map(str::trim) {
        None | Some("") => {
            violations.push("player_wallet is required".to_string());
            None
        }
        Some(raw) => match Address::parse(raw) {
            Ok(address) => Some(address),
            Err(_) => {
                violations.push(format!("player_wallet is not a valid address (got '{raw}')"));
                None
            }
        },
    };

    let image = match image {
        None => {
            violations.push("image is required".to_string());
            None
        }
        Some(upload) if upload.bytes.is_empty() => {
            violations.push("image must not be empty".to_string());
            None
        }
        Some(upload) if upload.bytes.len() > max_bytes => {
            violations.push(format!(
                "image exceeds {max_bytes} bytes (got {})",
                upload.bytes.len()
            ));
            None
        }
        Some(upload) => Some(upload),
    };

    match (actor, image) {
        (Some(actor), Some(upload)) if violations.is_empty() => Ok(VerificationRequest {
            actor,
            image: upload.bytes,
            media_type: upload
                .content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
        }),
        _ => Err(violations),
    }
}
