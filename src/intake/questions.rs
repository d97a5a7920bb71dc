//! The fixed question sequence.

use serde::{Deserialize, Serialize};

/// Which record field a question fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKey {
    Subcategory,
    Name,
    RegistrationStartDate,
    Type,
    IsPaid,
    Purpose,
}

impl QuestionKey {
    /// Field name as the registration API spells it.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Subcategory => "drillSubCategory",
            Self::Name => "drillName",
            Self::RegistrationStartDate => "drillRegistrationStartDt",
            Self::Type => "drillType",
            Self::IsPaid => "isDrillPaid",
            Self::Purpose => "drillPurpose",
        }
    }
}

impl std::fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Subcategory => "subcategory",
            Self::Name => "name",
            Self::RegistrationStartDate => "registrationStartDate",
            Self::Type => "type",
            Self::IsPaid => "isPaid",
            Self::Purpose => "purpose",
        };
        write!(f, "{s}")
    }
}

/// A question shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub key: QuestionKey,
    pub text: &'static str,
}

/// Asked in this order; one question per required field.
pub const QUESTIONS: [Question; 6] = [
    Question {
        key: QuestionKey::Subcategory,
        text: "What is the subcategory of your event? (e.g., Workshop, Webinar, Innovation Hackathon, Hiring Hackathon, etc.)",
    },
    Question {
        key: QuestionKey::Name,
        text: "What name do you want to give to your event?",
    },
    Question {
        key: QuestionKey::RegistrationStartDate,
        text: "When do you want to organize it? (Please provide a date in DD-MM-YYYY format; the end date will be 15 days ahead)",
    },
    Question {
        key: QuestionKey::Type,
        text: "Do you want submissions based on specific themes or solutions to problems? (Problems Based or Theme Based)",
    },
    Question {
        key: QuestionKey::IsPaid,
        text: "Will this event be paid? (Yes/No)",
    },
    Question {
        key: QuestionKey::Purpose,
        text: "What is the purpose of this event? (Provide a one-liner answer)",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique_and_ordered() {
        let keys: Vec<QuestionKey> = QUESTIONS.iter().map(|q| q.key).collect();
        assert_eq!(
            keys,
            vec![
                QuestionKey::Subcategory,
                QuestionKey::Name,
                QuestionKey::RegistrationStartDate,
                QuestionKey::Type,
                QuestionKey::IsPaid,
                QuestionKey::Purpose,
            ]
        );
    }

    #[test]
    fn display_matches_serde() {
        for question in QUESTIONS {
            let json = serde_json::to_string(&question.key).unwrap();
            assert_eq!(format!("\"{}\"", question.key), json);
        }
    }
}
