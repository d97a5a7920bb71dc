//! Derives the registration and phase windows from one start date.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::SubmissionError;

/// Length of the registration window.
pub const REGISTRATION_DAYS: i64 = 15;
/// Gap between registration close and phase start.
pub const PHASE_GAP_DAYS: i64 = 1;
/// Length of the hackathon phase.
pub const PHASE_DAYS: i64 = 15;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The four timestamps sent with a registration. Local wall-clock time, no
/// timezone conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrillSchedule {
    pub registration_start: NaiveDateTime,
    pub registration_end: NaiveDateTime,
    pub phase_start: NaiveDateTime,
    pub phase_end: NaiveDateTime,
}

impl DrillSchedule {
    /// Derive the schedule from a `DD-MM-YYYY` date, taken at midnight.
    pub fn derive(start_date: &str) -> Result<Self, SubmissionError> {
        let date = NaiveDate::parse_from_str(start_date, "%d-%m-%Y")
            .map_err(|_| SubmissionError::InvalidStartDate(start_date.to_string()))?;
        let registration_start = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| SubmissionError::InvalidStartDate(start_date.to_string()))?;
        let registration_end = registration_start + Duration::days(REGISTRATION_DAYS);
        let phase_start = registration_end + Duration::days(PHASE_GAP_DAYS);
        let phase_end = phase_start + Duration::days(PHASE_DAYS);
        Ok(Self {
            registration_start,
            registration_end,
            phase_start,
            phase_end,
        })
    }
}

/// `YYYY-MM-DDTHH:MM:SS`.
pub fn iso(ts: &NaiveDateTime) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// `YYYY-MM-DDTHH:MM:SS.000Z`, the form the phase schedule uses.
pub fn iso_millis_z(ts: &NaiveDateTime) -> String {
    format!("{}.000Z", iso(ts))
}
