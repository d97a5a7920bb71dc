//! Registration submitter: turns a finished record into a created drill.

pub mod client;
pub mod payload;

pub use client::{HttpRegistrationApi, RegistrationApi, RegistrationApiConfig};
pub use payload::DrillPayload;

use std::sync::Arc;

use tracing::info;

use crate::classifier::ClassifierGateway;
use crate::error::SubmissionError;
use crate::intake::model::RegistrationRecord;
use crate::intake::schedule::DrillSchedule;

/// Generates the description, posts the drill, and builds the public link.
pub struct RegistrationSubmitter {
    gateway: Arc<ClassifierGateway>,
    api: Arc<dyn RegistrationApi>,
    config: RegistrationApiConfig,
}

impl RegistrationSubmitter {
    pub fn new(
        gateway: Arc<ClassifierGateway>,
        api: Arc<dyn RegistrationApi>,
        config: RegistrationApiConfig,
    ) -> Self {
        Self {
            gateway,
            api,
            config,
        }
    }

    /// Submit the record once. No retry.
    ///
    /// On success the record's description is set and the public link is
    /// returned.
    pub async fn submit(
        &self,
        record: &mut RegistrationRecord,
        schedule: &DrillSchedule,
    ) -> Result<String, SubmissionError> {
        if let Some(field) = record.missing_field() {
            return Err(SubmissionError::IncompleteRecord(field));
        }
        let (Some(name), Some(drill_type), Some(purpose), Some(is_paid)) = (
            record.name.as_deref(),
            record.drill_type,
            record.purpose,
            record.is_paid,
        ) else {
            return Err(SubmissionError::IncompleteRecord("record"));
        };

        let summary = self
            .gateway
            .generate_description(name, drill_type, purpose)
            .await?;
        let cost = if is_paid { "Paid" } else { "Free" };
        record.description = Some(format!("{summary} This event is {cost}."));

        let payload = DrillPayload::build(record, schedule)?;
        let slug = self.api.create_drill(&payload).await?;
        let link = self.config.drill_link(&slug);

        info!(
            name = %payload.drill_name,
            subcategory = %payload.drill_sub_category,
            link = %link,
            "Drill registered"
        );
        Ok(link)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::classifier::tests::ScriptedLlm;
    use crate::submission::payload::tests::complete_record;

    /// Registration API double that records payloads and replies with a
    /// fixed result.
    pub(crate) struct RecordingApi {
        reply: Result<String, u16>,
        pub(crate) payloads: Mutex<Vec<DrillPayload>>,
    }

    impl RecordingApi {
        pub(crate) fn ok(slug: &str) -> Self {
            Self {
                reply: Ok(slug.to_string()),
                payloads: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                payloads: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn count(&self) -> usize {
            self.payloads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RegistrationApi for RecordingApi {
        async fn create_drill(&self, payload: &DrillPayload) -> Result<String, SubmissionError> {
            self.payloads.lock().unwrap().push(payload.clone());
            match &self.reply {
                Ok(slug) => Ok(slug.clone()),
                Err(status) => Err(SubmissionError::Status {
                    status: *status,
                    body: "rejected".to_string(),
                }),
            }
        }
    }

    fn submitter(llm: ScriptedLlm, api: Arc<RecordingApi>) -> RegistrationSubmitter {
        let gateway = Arc::new(ClassifierGateway::new(Arc::new(llm)));
        RegistrationSubmitter::new(gateway, api, RegistrationApiConfig::default())
    }

    #[tokio::test]
    async fn success_builds_link_and_description() {
        let api = Arc::new(RecordingApi::ok("rust-week"));
        let s = submitter(
            ScriptedLlm::new().on("short description", "A week of Rust."),
            api.clone(),
        );
        let mut record = complete_record();
        let schedule = DrillSchedule::derive("01-01-2025").unwrap();

        let link = s.submit(&mut record, &schedule).await.unwrap();

        assert_eq!(link, "https://dev.whereuelevate.com/drills/rust-week");
        assert_eq!(
            record.description.as_deref(),
            Some("A week of Rust. This event is Paid.")
        );
        assert_eq!(api.count(), 1);
    }

    #[tokio::test]
    async fn free_suffix() {
        let api = Arc::new(RecordingApi::ok("x"));
        let s = submitter(ScriptedLlm::new().on("short description", "Fun."), api);
        let mut record = complete_record();
        record.is_paid = Some(false);
        let schedule = DrillSchedule::derive("01-01-2025").unwrap();
        s.submit(&mut record, &schedule).await.unwrap();
        assert_eq!(record.description.as_deref(), Some("Fun. This event is Free."));
    }

    #[tokio::test]
    async fn api_failure_is_reported_once() {
        let api = Arc::new(RecordingApi::failing(500));
        let s = submitter(ScriptedLlm::new(), api.clone());
        let mut record = complete_record();
        let schedule = DrillSchedule::derive("01-01-2025").unwrap();
        let err = s.submit(&mut record, &schedule).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Status { status: 500, .. }));
        assert_eq!(api.count(), 1);
    }

    #[tokio::test]
    async fn incomplete_record_never_reaches_api() {
        let llm = Arc::new(ScriptedLlm::new());
        let api = Arc::new(RecordingApi::ok("x"));
        let s = RegistrationSubmitter::new(
            Arc::new(ClassifierGateway::new(llm.clone())),
            api.clone(),
            RegistrationApiConfig::default(),
        );
        let mut record = complete_record();
        record.name = None;
        let schedule = DrillSchedule::derive("01-01-2025").unwrap();
        let err = s.submit(&mut record, &schedule).await.unwrap_err();
        assert!(matches!(err, SubmissionError::IncompleteRecord("name")));
        assert_eq!(api.count(), 0);
        assert_eq!(llm.calls(), 0);
    }
}
