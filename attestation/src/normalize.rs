//! Payload normalization.
//!
//! Turns an untyped JSON claim into a [`NormalizedClaim`]: strings trimmed,
//! categories lowercased, numbers coerced from either JSON numbers or numeric
//! strings. Coercion fails closed: anything that is not a finite number
//! becomes `None`, never `0`.
//!
//! Normalization has no side effects and is a pure function of its input.

use serde_json::{Map, Value};

const PLAYER_KEYS: &[&str] = &["playerPubkey", "actorId"];
const MATERIAL_KEYS: &[&str] = &["materialType", "materialCategory"];
const QUANTITY_KEYS: &[&str] = &["quantity"];
const ZONE_KEYS: &[&str] = &["zoneId"];
const PHOTO_KEYS: &[&str] = &["photoHash", "evidenceHash"];
const GPS_KEYS: &[&str] = &["gps", "location"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "claimedTimestamp"];

/// A normalized value together with the wire key it was read from, so
/// violations can name the field the caller actually sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T> {
    pub label: &'static str,
    pub value: T,
}

/// Location as sent, each coordinate coerced independently.
#[derive(Clone, Debug, PartialEq)]
pub struct GpsFields {
    pub label: &'static str,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Claim after normalization, before any rule is applied.
///
/// Missing string fields normalize to `""`; optional fields (`zoneId`, `gps`)
/// stay `None` when the key is absent or `null`.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedClaim {
    pub player_pubkey: Field<String>,
    pub material_type: Field<String>,
    pub quantity: Field<Option<f64>>,
    pub zone_id: Field<Option<String>>,
    pub photo_hash: Field<String>,
    pub gps: Option<GpsFields>,
    pub timestamp: Field<Option<f64>>,
}

/// Normalize a raw claim. Non-object input normalizes to an all-empty claim.
pub fn normalize(raw: &Value) -> NormalizedClaim {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let (label, value) = lookup(obj, PLAYER_KEYS);
    let player_pubkey = Field {
        label,
        value: trimmed_string(value).unwrap_or_default(),
    };

    let (label, value) = lookup(obj, MATERIAL_KEYS);
    let material_type = Field {
        label,
        value: trimmed_string(value)
            .map(|s| s.to_lowercase())
            .unwrap_or_default(),
    };

    let (label, value) = lookup(obj, QUANTITY_KEYS);
    let quantity = Field {
        label,
        value: value.and_then(coerce_number),
    };

    let (label, value) = lookup(obj, ZONE_KEYS);
    let zone_id = Field {
        label,
        value: match value {
            None | Some(Value::Null) => None,
            Some(v) => Some(trimmed_string(Some(v)).unwrap_or_default()),
        },
    };

    let (label, value) = lookup(obj, PHOTO_KEYS);
    let photo_hash = Field {
        label,
        value: trimmed_string(value).unwrap_or_default(),
    };

    let (label, value) = lookup(obj, GPS_KEYS);
    let gps = match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(GpsFields {
            label,
            lat: v.get("lat").and_then(coerce_number),
            lon: v.get("lon").and_then(coerce_number),
        }),
    };

    let (label, value) = lookup(obj, TIMESTAMP_KEYS);
    let timestamp = Field {
        label,
        value: value.and_then(coerce_number),
    };

    NormalizedClaim {
        player_pubkey,
        material_type,
        quantity,
        zone_id,
        photo_hash,
        gps,
        timestamp,
    }
}

/// Coerce a JSON number or numeric string to a finite `f64`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First present key wins; the label falls back to the primary key name.
fn lookup<'a>(
    obj: &'a Map<String, Value>,
    keys: &[&'static str],
) -> (&'static str, Option<&'a Value>) {
    for key in keys {
        if let Some(v) = obj.get(*key) {
            return (*key, Some(v));
        }
    }
    (keys[0], None)
}

fn trimmed_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}
