//! Registration record and its controlled-vocabulary field types.

use serde::{Deserialize, Serialize};

use crate::vocabulary::{DrillDefaults, LookupError, Vocabulary};

/// Why the drill is being run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    #[default]
    Innovation,
    Hiring,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Innovation => "Innovation",
            Self::Hiring => "Hiring",
        }
    }

    /// Parse the exact label the classifier emits.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Innovation" => Some(Self::Innovation),
            "Hiring" => Some(Self::Hiring),
            _ => None,
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission style of the drill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrillType {
    #[default]
    #[serde(rename = "Theme Based")]
    ThemeBased,
    #[serde(rename = "Product Based")]
    ProductBased,
}

impl DrillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThemeBased => "Theme Based",
            Self::ProductBased => "Product Based",
        }
    }

    /// Case-insensitive match against the two literal phrases.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        match phrase.trim().to_lowercase().as_str() {
            "theme based" => Some(Self::ThemeBased),
            "product based" => Some(Self::ProductBased),
            _ => None,
        }
    }
}

impl std::fmt::Display for DrillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-progress registration.
///
/// User-supplied fields stay `None` until their question is answered, so the
/// submitter can tell a finished record from a partial one. `category` is
/// private and only ever written together with `subcategory`, looked up from
/// the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    category: String,
    subcategory: String,
    pub name: Option<String>,
    pub purpose: Option<Purpose>,
    pub timezone: String,
    pub drill_type: Option<DrillType>,
    pub is_paid: Option<bool>,
    pub description: Option<String>,
    /// Raw `DD-MM-YYYY` answer.
    pub registration_start_date: Option<String>,
    pub partner_id: String,
    pub partner_name: String,
}

impl RegistrationRecord {
    pub fn new(defaults: &DrillDefaults) -> Self {
        Self {
            category: String::new(),
            subcategory: String::new(),
            name: None,
            purpose: None,
            timezone: defaults.timezone.clone(),
            drill_type: None,
            is_paid: None,
            description: None,
            registration_start_date: None,
            partner_id: defaults.partner_id.clone(),
            partner_name: defaults.partner_name.clone(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    /// Set the subcategory and its vocabulary category in one step.
    ///
    /// An unknown subcategory leaves the record untouched.
    pub fn set_classification(&mut self, subcategory: &str) -> Result<(), LookupError> {
        let category = Vocabulary.category_for(subcategory)?;
        self.subcategory = subcategory.to_string();
        self.category = category.to_string();
        Ok(())
    }

    /// First required field that is still unset, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.subcategory.is_empty() || self.category.is_empty() {
            return Some("subcategory");
        }
        if self.name.as_deref().is_none_or(str::is_empty) {
            return Some("name");
        }
        if self.registration_start_date.is_none() {
            return Some("registrationStartDate");
        }
        if self.drill_type.is_none() {
            return Some("type");
        }
        if self.is_paid.is_none() {
            return Some("isPaid");
        }
        if self.purpose.is_none() {
            return Some("purpose");
        }
        None
    }
}

impl Default for RegistrationRecord {
    fn default() -> Self {
        Self::new(&DrillDefaults::default())
    }
}
