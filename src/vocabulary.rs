//! Static drill vocabulary: subcategory → category codes and record defaults.

use serde::{Deserialize, Serialize};

/// Subcategory code → category code, as the registration API expects them.
const SUBCATEGORY_CATEGORIES: &[(&str, &str)] = &[
    ("WORKSHOP", "SAARTHI"),
    ("WEBINAR", "SAARTHI"),
    ("MASTERCLASS", "SAARTHI"),
    ("INNOVATIONHACKATHON", "OPENINNOVATION"),
    ("SQUADPROGRAM", "OPENINNOVATION"),
    ("CASESTUDY", "OPENINNOVATION"),
    ("HIRINGHACKATHON", "OPENINNOVATION"),
    ("INNOVATION", "OPENINNOVATION"),
    ("TECHCONFERENCES", "HACKATHON"),
    ("BOOTCAMP", "HACKATHON"),
    ("STARTUPPITCH", "HACKATHON"),
    ("CONCLAVE", "HACKATHON"),
    ("CONTRACTUALRESEARCH&DEVELOPMENT", "HACKATHON"),
    ("IDEATHON", "HACKATHON"),
    ("INTERNALHACKATHON", "HACKATHON"),
    ("SMARTINDIAHACKATHON(SIH)", "HACKATHON"),
];

/// Subcategory is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown drill subcategory: {0}")]
pub struct LookupError(pub String);

/// Read-only view over the subcategory table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vocabulary;

impl Vocabulary {
    /// Every subcategory code, in table order.
    pub fn all_subcategories(&self) -> impl Iterator<Item = &'static str> {
        SUBCATEGORY_CATEGORIES.iter().map(|(sub, _)| *sub)
    }

    pub fn contains(&self, subcategory: &str) -> bool {
        SUBCATEGORY_CATEGORIES.iter().any(|(sub, _)| *sub == subcategory)
    }

    /// Category code for a subcategory. Exact, case-sensitive match.
    pub fn category_for(&self, subcategory: &str) -> Result<&'static str, LookupError> {
        SUBCATEGORY_CATEGORIES
            .iter()
            .find(|(sub, _)| *sub == subcategory)
            .map(|(_, category)| *category)
            .ok_or_else(|| LookupError(subcategory.to_string()))
    }
}

/// Constant fields stamped onto every new registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillDefaults {
    pub timezone: String,
    pub partner_id: String,
    pub partner_name: String,
}

impl Default for DrillDefaults {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_string(),
            partner_id: "b886470e-52ac-4d34-8621-ff3e4d8335fb".to_string(),
            partner_name: "WUElev8 Innovation services private ltd".to_string(),
        }
    }
}
