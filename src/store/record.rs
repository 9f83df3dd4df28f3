//! Facility record definitions
//!
//! A facility record is the extraction target: one physical store location
//! keyed by its directory number. Field names on the wire match the legacy
//! store document (`number`, `type`, `address`) so existing data files
//! round-trip unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Facility category, recognized from the directory's naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Supercenter")]
    Supercenter,

    #[serde(rename = "Neighborhood Market")]
    NeighborhoodMarket,

    #[serde(rename = "Sam's Club")]
    ClubStore,

    /// Plain "Walmart" with no qualifier
    #[serde(rename = "Walmart", alias = "Store")]
    Generic,
}

impl Category {
    /// Recognizes a category from free text such as a card link label.
    ///
    /// Longer keywords are tried first so "Neighborhood Market" is not
    /// swallowed by the bare "Walmart" fallback.
    pub fn from_text(text: &str) -> Option<Self> {
        if text.contains("Supercenter") {
            Some(Self::Supercenter)
        } else if text.contains("Neighborhood Market") {
            Some(Self::NeighborhoodMarket)
        } else if text.contains("Sam's Club") {
            Some(Self::ClubStore)
        } else if text.contains("Walmart") {
            Some(Self::Generic)
        } else {
            None
        }
    }

    /// The human label, as used in card text and on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Supercenter => "Supercenter",
            Self::NeighborhoodMarket => "Neighborhood Market",
            Self::ClubStore => "Sam's Club",
            Self::Generic => "Walmart",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One facility record
///
/// The identifier is immutable and the sole dedup key. A record is complete
/// when address, city and state are all non-empty; phone completeness is
/// tracked separately because phones arrive through the enrichment path too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Stable facility identifier, never reassigned
    #[serde(rename = "number")]
    pub id: String,

    /// Display name, e.g. "Springfield Supercenter"
    pub name: String,

    #[serde(rename = "type")]
    pub category: Category,

    /// Full postal address: "<street>, <city>, <ST> <zip>"
    pub address: String,

    pub city: String,

    /// Two-letter region code, uppercase
    pub state: String,

    /// Normalized to NNN-NNN-NNNN; absent when never observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl FacilityRecord {
    /// True when address, city and state are all populated.
    pub fn is_complete(&self) -> bool {
        !self.address.is_empty() && !self.city.is_empty() && !self.state.is_empty()
    }

    /// True when a phone number has been observed for this facility.
    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.is_empty())
    }
}
