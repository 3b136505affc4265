//! Classification client.
//!
//! With a credential, images go to the Anthropic Messages API; without one
//! the client runs in mock mode and returns [`ClassificationVerdict::mock`].

use crate::media::normalize_media_type;
use crate::{ClassificationVerdict, VisionError};

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 512;

const VISION_PROMPT: &str = r#"You verify waste collection photos for EcoBuild, an environmental rewards platform.

Decide whether the image shows collected waste or recyclable materials.

Reply with JSON only, no prose and no code fences, in exactly this shape:
{
  "waste_detected": boolean,
  "waste_type": "plastic" | "glass" | "metal" | "paper" | "organic" | "mixed",
  "estimated_weight_lbs": number,
  "confidence": number between 0 and 1,
  "description": "one sentence describing the image"
}

- waste_detected is true only when collected waste or recyclables are clearly visible.
- waste_type is the dominant material; use "mixed" when several are visible.
- estimated_weight_lbs is a rough total in pounds, at least 1 when waste is detected.
- confidence is your certainty in the classification.

For anything else (selfies, landscapes, food) set waste_detected to false and
confidence to how certain you are of that. Be conservative."#;

/// Whether verdicts come from the live oracle or the fixed mock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    Live,
    Mock,
}

impl ClassifierMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierMode::Live => "live",
            ClassifierMode::Mock => "mock",
        }
    }
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can turn an image into a verdict.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn mode(&self) -> ClassifierMode;

    async fn classify(
        &self,
        image: &[u8],
        media_type: &str,
    ) -> Result<ClassificationVerdict, VisionError>;
}

#[derive(Clone, Debug)]
pub struct VisionConfig {
    /// `None` selects mock mode.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

enum Backend {
    Mock,
    Live {
        http_client: reqwest::Client,
        api_key: String,
        model: String,
        base_url: String,
    },
}

pub struct VisionClient {
    backend: Backend,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Self {
        let backend = match config.api_key.filter(|k| !k.trim().is_empty()) {
            None => {
                tracing::warn!("no classifier credential configured, using mock classification");
                Backend::Mock
            }
            Some(api_key) => {
                let http_client = reqwest::Client::builder()
                    .timeout(config.timeout)
                    .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
                    .build()
                    .unwrap_or_default();
                tracing::info!(model = %config.model, "live classifier initialised");
                Backend::Live {
                    http_client,
                    api_key,
                    model: config.model,
                    base_url: config.base_url,
                }
            }
        };
        Self { backend }
    }

    pub fn mock() -> Self {
        Self {
            backend: Backend::Mock,
        }
    }
}

#[async_trait]
impl Classifier for VisionClient {
    fn mode(&self) -> ClassifierMode {
        match self.backend {
            Backend::Mock => ClassifierMode::Mock,
            Backend::Live { .. } => ClassifierMode::Live,
        }
    }

    async fn classify(
        &self,
        image: &[u8],
        media_type: &str,
    ) -> Result<ClassificationVerdict, VisionError> {
        let (http_client, api_key, model, base_url) = match &self.backend {
            Backend::Mock => {
                tracing::info!(bytes = image.len(), "mock classification");
                return Ok(ClassificationVerdict::mock());
            }
            Backend::Live {
                http_client,
                api_key,
                model,
                base_url,
            } => (http_client, api_key, model, base_url),
        };

        let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));
        let body = json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": normalize_media_type(media_type),
                            "data": base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                    { "type": "text", "text": VISION_PROMPT },
                ],
            }],
        });

        let response = http_client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VisionError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    VisionError::Unreachable(format!("connection failed: {e}"))
                } else {
                    VisionError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let message: MessagesResponse = response.json().await.map_err(|e| {
            VisionError::InvalidResponse(format!("failed to parse messages response: {e}"))
        })?;

        let text = message
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .ok_or_else(|| VisionError::InvalidResponse("no text block in reply".into()))?;

        let verdict = ClassificationVerdict::from_text(&text)?;
        tracing::debug!(
            detected = verdict.detected,
            category = %verdict.category,
            confidence = verdict.confidence,
            "live classification"
        );
        Ok(verdict)
    }
}
