//! Wire shape of a drill registration request.

use serde::Serialize;

use crate::error::SubmissionError;
use crate::intake::model::{DrillType, Purpose, RegistrationRecord};
use crate::intake::schedule::{DrillSchedule, iso, iso_millis_z};

/// Body of `POST /drills`. Field names follow the registration API exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillPayload {
    pub drill_name: String,
    pub drill_timezone: String,
    pub drill_registration_start_dt: String,
    pub drill_registration_end_dt: String,
    pub drill_start_dt: String,
    pub drill_end_dt: String,
    pub drill_purpose: Purpose,
    pub drill_type: DrillType,
    pub is_drill_paid: bool,
    /// JSON-encoded [`PhaseConfig`]; the API expects a string here.
    pub drill_phase: String,
    pub drill_category: String,
    pub drill_sub_category: String,
    pub drill_partner_id: String,
    pub drill_partner_name: String,
}

/// Single-phase hackathon configuration, double-encoded into `drillPhase`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PhaseConfig {
    #[serde(rename = "type")]
    kind: &'static str,
    has_idea_phase: &'static str,
    is_self_paced: bool,
    schedule: Vec<PhaseSchedule>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PhaseSchedule {
    phase_type: &'static str,
    phase_desc: &'static str,
    date_confirmed: bool,
    phase_start_dt: String,
    phase_end_dt: String,
    phase_submission_end_dt: Option<String>,
    is_submission_allowed: bool,
    phase_name: &'static str,
    phase_timezone: String,
    phase_mode: &'static str,
    phase_position: u32,
}

impl DrillPayload {
    /// Build the payload. Fails if any required record field is unset.
    pub fn build(
        record: &RegistrationRecord,
        schedule: &DrillSchedule,
    ) -> Result<Self, SubmissionError> {
        if let Some(field) = record.missing_field() {
            return Err(SubmissionError::IncompleteRecord(field));
        }
        let (Some(name), Some(purpose), Some(drill_type), Some(is_paid)) = (
            record.name.clone(),
            record.purpose,
            record.drill_type,
            record.is_paid,
        ) else {
            return Err(SubmissionError::IncompleteRecord("record"));
        };

        let phase = PhaseConfig {
            kind: "Single",
            has_idea_phase: "",
            is_self_paced: false,
            schedule: vec![PhaseSchedule {
                phase_type: "HACKATHON",
                phase_desc: "Hackathon Phase",
                date_confirmed: true,
                phase_start_dt: iso_millis_z(&schedule.phase_start),
                phase_end_dt: iso_millis_z(&schedule.phase_end),
                phase_submission_end_dt: None,
                is_submission_allowed: false,
                phase_name: "Phase 1",
                phase_timezone: record.timezone.clone(),
                phase_mode: "Online",
                phase_position: 0,
            }],
        };

        Ok(Self {
            drill_name: name,
            drill_timezone: record.timezone.clone(),
            drill_registration_start_dt: iso(&schedule.registration_start),
            drill_registration_end_dt: iso(&schedule.registration_end),
            drill_start_dt: iso(&schedule.phase_start),
            drill_end_dt: iso(&schedule.phase_end),
            drill_purpose: purpose,
            drill_type,
            is_drill_paid: is_paid,
            drill_phase: serde_json::to_string(&phase)?,
            drill_category: record.category().to_string(),
            drill_sub_category: record.subcategory().to_string(),
            drill_partner_id: record.partner_id.clone(),
            drill_partner_name: record.partner_name.clone(),
        })
    }
}
