//! Canonical claims and the shared rule set.

use crate::normalize::NormalizedClaim;
use ecobuild_types::{MaterialType, WasteType};
use serde::{Serialize, Serializer};

/// Which call surface produced the claim.
///
/// The manual surface only admits ledger materials and requires a zone and a
/// location; the image surface admits every classifier category and treats
/// zone and location as optional.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Manual,
    Image,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoPoint {
    #[serde(serialize_with = "canonical_number")]
    pub lat: f64,
    #[serde(serialize_with = "canonical_number")]
    pub lon: f64,
}

/// A claim that passed every rule for its surface.
///
/// Field order here is the serialization order used for hashing; do not
/// reorder.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalClaim {
    pub player_pubkey: String,
    pub material_type: String,
    #[serde(serialize_with = "canonical_number")]
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    pub photo_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GeoPoint>,
    #[serde(serialize_with = "canonical_number")]
    pub timestamp: f64,
}

impl CanonicalClaim {
    /// Ledger material for manual claims; `None` for classifier-only categories.
    pub fn material(&self) -> Option<MaterialType> {
        MaterialType::parse(&self.material_type)
    }

    pub fn waste_type(&self) -> Option<WasteType> {
        WasteType::parse(&self.material_type)
    }
}

/// Apply the field rules for `capability`, collecting every violation.
pub fn canonicalize(
    claim: &NormalizedClaim,
    capability: Capability,
) -> Result<CanonicalClaim, Vec<String>> {
    let mut violations = Vec::new();

    if claim.player_pubkey.value.is_empty() {
        violations.push(format!("{} is required", claim.player_pubkey.label));
    }

    let category = &claim.material_type;
    if category.value.is_empty() {
        violations.push(format!("{} is required", category.label));
    } else {
        let known = match capability {
            Capability::Manual => MaterialType::parse(&category.value).is_some(),
            Capability::Image => WasteType::parse(&category.value).is_some(),
        };
        if !known {
            violations.push(format!(
                "{} must be one of: {} (got '{}')",
                category.label,
                allowed_categories(capability),
                category.value
            ));
        }
    }

    match claim.quantity.value {
        Some(q) if q > 0.0 => {}
        _ => violations.push(format!(
            "{} must be a number greater than 0",
            claim.quantity.label
        )),
    }

    let zone_id = match (&claim.zone_id.value, capability) {
        (Some(zone), _) if !zone.is_empty() => Some(zone.clone()),
        (_, Capability::Manual) => {
            violations.push(format!("{} is required", claim.zone_id.label));
            None
        }
        (None, Capability::Image) => None,
        (Some(_), Capability::Image) => {
            violations.push(format!("{} must not be empty", claim.zone_id.label));
            None
        }
    };

    if claim.photo_hash.value.is_empty() {
        violations.push(format!("{} is required", claim.photo_hash.label));
    }

    let gps = match (&claim.gps, capability) {
        (Some(gps), _) => {
            if gps.lat.is_none() {
                violations.push(format!("{}.lat must be a finite number", gps.label));
            }
            if gps.lon.is_none() {
                violations.push(format!("{}.lon must be a finite number", gps.label));
            }
            match (gps.lat, gps.lon) {
                (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
                _ => None,
            }
        }
        (None, Capability::Manual) => {
            violations.push("gps.lat must be a finite number".to_string());
            violations.push("gps.lon must be a finite number".to_string());
            None
        }
        (None, Capability::Image) => None,
    };

    if claim.timestamp.value.is_none() {
        violations.push(format!("{} must be a finite number", claim.timestamp.label));
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(CanonicalClaim {
        player_pubkey: claim.player_pubkey.value.clone(),
        material_type: category.value.clone(),
        quantity: claim.quantity.value.unwrap_or_default(),
        zone_id,
        photo_hash: claim.photo_hash.value.clone(),
        gps,
        timestamp: claim.timestamp.value.unwrap_or_default(),
    })
}

fn allowed_categories(capability: Capability) -> String {
    match capability {
        Capability::Manual => MaterialType::ALL.map(|m| m.as_str()).join(", "),
        Capability::Image => WasteType::ALL.map(|w| w.as_str()).join(", "),
    }
}

/// Integral values are written without a fractional part (`4`, not `4.0`),
/// matching the number formatting of the clients that compute the same ids.
fn canonical_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    fn manual_raw() -> serde_json::Value {
        json!({
            "playerPubkey": "TestPlayer1111111111111111111111111111111",
            "materialType": "Plastic",
            "quantity": 4,
            "zoneId": "zone-17",
            "photoHash": "photo-hash-abc",
            "gps": { "lat": 37.7749, "lon": -122.4194 },
            "timestamp": 1_700_000_000_000i64,
        })
    }

    #[test]
    fn manual_claim_canonicalizes() {
        let claim = canonicalize(&normalize(&manual_raw()), Capability::Manual).unwrap();
        assert_eq!(claim.material_type, "plastic");
        assert_eq!(claim.material(), Some(MaterialType::Plastic));
        assert_eq!(claim.zone_id.as_deref(), Some("zone-17"));
        assert_eq!(
            claim.gps,
            Some(GeoPoint {
                lat: 37.7749,
                lon: -122.4194
            })
        );
    }

    #[test]
    fn manual_surface_rejects_qualitative_categories() {
        let mut raw = manual_raw();
        raw["materialType"] = json!("organic");
        let errors = canonicalize(&normalize(&raw), Capability::Manual).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("materialType must be one of"));
        assert!(errors[0].contains("'organic'"));
    }

    #[test]
    fn image_surface_admits_classifier_categories_without_zone() {
        let raw = json!({
            "playerPubkey": "p",
            "materialType": "mixed",
            "quantity": 2,
            "photoHash": "h",
            "timestamp": 1,
        });
        let claim = canonicalize(&normalize(&raw), Capability::Image).unwrap();
        assert_eq!(claim.waste_type(), Some(WasteType::Mixed));
        assert_eq!(claim.zone_id, None);
        assert_eq!(claim.gps, None);
    }

    #[test]
    fn manual_surface_requires_zone_and_location() {
        let raw = json!({
            "playerPubkey": "p",
            "materialType": "glass",
            "quantity": 1,
            "photoHash": "h",
            "timestamp": 1,
        });
        let errors = canonicalize(&normalize(&raw), Capability::Manual).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "zoneId is required".to_string(),
                "gps.lat must be a finite number".to_string(),
                "gps.lon must be a finite number".to_string(),
            ]
        );
    }

    #[test]
    fn canonical_numbers_drop_integral_fraction() {
        let claim = canonicalize(&normalize(&manual_raw()), Capability::Manual).unwrap();
        let rendered = serde_json::to_string(&claim).unwrap();
        assert!(rendered.contains("\"quantity\":4,"));
        assert!(rendered.contains("\"timestamp\":1700000000000"));
        assert!(rendered.contains("\"lat\":37.7749"));
    }
}
