//! Classification verdicts.
//!
//! The classifier is an untrusted oracle. Its output is decoded field by
//! field and every field is clamped or defaulted before the rest of the
//! pipeline sees it; a malformed field never fails the whole verdict.

use crate::VisionError;
use ecobuild_types::WasteType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MOCK_DESCRIPTION: &str =
    "Mock classification: appears to be collected plastic waste materials";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    #[serde(rename = "waste_detected")]
    pub detected: bool,
    #[serde(rename = "waste_type")]
    pub category: WasteType,
    /// Estimated weight in pounds, always finite and `>= 0`.
    #[serde(rename = "estimated_weight_lbs")]
    pub estimated_quantity: f64,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub description: String,
}

impl ClassificationVerdict {
    /// The fixed verdict returned when no classifier credential is configured.
    pub fn mock() -> Self {
        Self {
            detected: true,
            category: WasteType::Plastic,
            estimated_quantity: 5.0,
            confidence: 0.85,
            description: MOCK_DESCRIPTION.to_string(),
        }
    }

    /// Build a verdict from untrusted JSON.
    ///
    /// - `waste_detected`: must be a bool, else `false`
    /// - `waste_type`: known category after lowercasing, else `mixed`
    /// - `estimated_weight_lbs`: finite, floored at 0, else 0
    /// - `confidence`: finite, clamped to `[0, 1]`, else 0
    /// - `description`: string, else empty
    pub fn sanitize(raw: &Value) -> Self {
        let number = |key: &str| raw.get(key).and_then(Value::as_f64).filter(|n| n.is_finite());

        Self {
            detected: raw
                .get("waste_detected")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            category: raw
                .get("waste_type")
                .and_then(Value::as_str)
                .and_then(WasteType::parse)
                .unwrap_or(WasteType::Mixed),
            estimated_quantity: number("estimated_weight_lbs").map_or(0.0, |n| n.max(0.0)),
            confidence: number("confidence").map_or(0.0, |n| n.clamp(0.0, 1.0)),
            description: raw
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Parse the classifier's text reply, tolerating a markdown code fence.
    pub fn from_text(text: &str) -> Result<Self, VisionError> {
        let body = strip_code_fence(text);
        let raw: Value = serde_json::from_str(body)
            .map_err(|e| VisionError::InvalidResponse(format!("verdict is not JSON: {e}")))?;
        if !raw.is_object() {
            return Err(VisionError::InvalidResponse(
                "verdict is not a JSON object".into(),
            ));
        }
        Ok(Self::sanitize(&raw))
    }
}

/// Return the contents of the first ```` ``` ```` fence, or the trimmed text.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(end) => after[..end].trim(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamps_out_of_range_values() {
        let v = ClassificationVerdict::sanitize(&json!({
            "waste_detected": true,
            "waste_type": "GLASS",
            "estimated_weight_lbs": -3.0,
            "confidence": 1.7,
            "description": "bottles",
        }));
        assert_eq!(v.category, WasteType::Glass);
        assert_eq!(v.estimated_quantity, 0.0);
        assert_eq!(v.confidence, 1.0);
    }

    #[test]
    fn defaults_missing_and_mistyped_fields() {
        let v = ClassificationVerdict::sanitize(&json!({
            "waste_detected": "yes",
            "waste_type": "",
            "confidence": "high",
        }));
        assert!(!v.detected);
        assert_eq!(v.category, WasteType::Mixed);
        assert_eq!(v.estimated_quantity, 0.0);
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.description, "");
    }

    #[test]
    fn unknown_category_becomes_mixed() {
        let v = ClassificationVerdict::sanitize(&json!({ "waste_type": "cardboard" }));
        assert_eq!(v.category, WasteType::Mixed);
    }

    #[test]
    fn parses_fenced_reply() {
        let text = "Here you go:\n```json\n{\"waste_detected\": true, \"waste_type\": \"metal\", \"estimated_weight_lbs\": 2.5, \"confidence\": 0.9, \"description\": \"cans\"}\n```";
        let v = ClassificationVerdict::from_text(text).unwrap();
        assert_eq!(v.category, WasteType::Metal);
        assert_eq!(v.estimated_quantity, 2.5);
    }

    #[test]
    fn parses_bare_reply() {
        let v = ClassificationVerdict::from_text(r#" {"waste_detected": false} "#).unwrap();
        assert!(!v.detected);
    }

    #[test]
    fn rejects_non_json_reply() {
        assert!(matches!(
            ClassificationVerdict::from_text("I cannot tell."),
            Err(VisionError::InvalidResponse(_))
        ));
        assert!(ClassificationVerdict::from_text("[1, 2]").is_err());
    }

    #[test]
    fn serializes_with_wire_keys() {
        let v = serde_json::to_value(ClassificationVerdict::mock()).unwrap();
        assert_eq!(
            v,
            json!({
                "waste_detected": true,
                "waste_type": "plastic",
                "estimated_weight_lbs": 5.0,
                "confidence": 0.85,
                "description": MOCK_DESCRIPTION,
            })
        );
    }
}
