//! Collection categories.
//!
//! Two domains exist: the manual attestation path only admits the four
//! materials the ledger program knows about, while the classifier may also
//! report qualitative categories (`organic`, `mixed`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Material accepted on the manual attestation path and by the ledger program.
///
/// The discriminant is the on-ledger `waste_type: u8`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Plastic = 0,
    Glass = 1,
    Metal = 2,
    Paper = 3,
}

impl MaterialType {
    pub const ALL: [MaterialType; 4] = [
        MaterialType::Plastic,
        MaterialType::Glass,
        MaterialType::Metal,
        MaterialType::Paper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Plastic => "plastic",
            MaterialType::Glass => "glass",
            MaterialType::Metal => "metal",
            MaterialType::Paper => "paper",
        }
    }

    /// Parse an already-canonical (trimmed, lowercase) category.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category reported by the image classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteType {
    Plastic,
    Glass,
    Metal,
    Paper,
    Organic,
    Mixed,
}

impl WasteType {
    pub const ALL: [WasteType; 6] = [
        WasteType::Plastic,
        WasteType::Glass,
        WasteType::Metal,
        WasteType::Paper,
        WasteType::Organic,
        WasteType::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteType::Plastic => "plastic",
            WasteType::Glass => "glass",
            WasteType::Metal => "metal",
            WasteType::Paper => "paper",
            WasteType::Organic => "organic",
            WasteType::Mixed => "mixed",
        }
    }

    /// Parse a category leniently: surrounding whitespace and case are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|w| w.as_str() == lowered)
    }

    /// The ledger material this category maps to, if any.
    pub fn material(self) -> Option<MaterialType> {
        match self {
            WasteType::Plastic => Some(MaterialType::Plastic),
            WasteType::Glass => Some(MaterialType::Glass),
            WasteType::Metal => Some(MaterialType::Metal),
            WasteType::Paper => Some(MaterialType::Paper),
            WasteType::Organic | WasteType::Mixed => None,
        }
    }

    /// On-ledger discriminant. Qualitative categories have no ledger
    /// counterpart and are recorded as plastic.
    pub fn category_code(self) -> u8 {
        self.material().unwrap_or(MaterialType::Plastic).code()
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MaterialType> for WasteType {
    fn from(m: MaterialType) -> Self {
        match m {
            MaterialType::Plastic => WasteType::Plastic,
            MaterialType::Glass => WasteType::Glass,
            MaterialType::Metal => WasteType::Metal,
            MaterialType::Paper => WasteType::Paper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_codes_match_ledger_table() {
        assert_eq!(MaterialType::Plastic.code(), 0);
        assert_eq!(MaterialType::Glass.code(), 1);
        assert_eq!(MaterialType::Metal.code(), 2);
        assert_eq!(MaterialType::Paper.code(), 3);
        assert_eq!(MaterialType::from_code(2), Some(MaterialType::Metal));
        assert_eq!(MaterialType::from_code(9), None);
    }

    #[test]
    fn material_parse_is_strict() {
        assert_eq!(MaterialType::parse("glass"), Some(MaterialType::Glass));
        assert_eq!(MaterialType::parse("wood"), None);
        assert_eq!(MaterialType::parse("organic"), None);
    }

    #[test]
    fn waste_parse_is_lenient_about_case() {
        assert_eq!(WasteType::parse("  Metal "), Some(WasteType::Metal));
        assert_eq!(WasteType::parse("MIXED"), Some(WasteType::Mixed));
        assert_eq!(WasteType::parse(""), None);
    }

    #[test]
    fn qualitative_categories_map_to_plastic_code() {
        assert_eq!(WasteType::Organic.category_code(), 0);
        assert_eq!(WasteType::Mixed.category_code(), 0);
        assert_eq!(WasteType::Paper.category_code(), 3);
    }
}
