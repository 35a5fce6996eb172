//! Summary job payloads and the status views returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::appointment::Appointment;
use crate::error::{DomainError, DomainResult};
use crate::id::JobId;

/// List the summary worker consumes jobs from.
pub const SUMMARY_QUEUE_KEY: &str = "summary_jobs";

/// Slot holding the most recently generated summary.
pub const SUMMARY_RESULT_KEY: &str = "latest_summary";

/// A request to summarise a snapshot of appointments.
///
/// Only `appointments` is required on the wire; `id` and `enqueued_at` are
/// filled by [`SummaryJob::new`] and tolerated when absent. Entries are kept
/// as raw JSON; records with missing fields are summarised as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enqueued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub appointments: Vec<Value>,
}

impl SummaryJob {
    /// Snapshot `appointments` into a new job.
    pub fn new(appointments: &[Appointment]) -> DomainResult<Self> {
        let appointments = appointments
            .iter()
            .map(|a| serde_json::to_value(a).map_err(|e| DomainError::payload(e.to_string())))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Self {
            id: Some(JobId::new()),
            enqueued_at: Some(Utc::now()),
            appointments,
        })
    }

    pub fn to_payload(&self) -> DomainResult<String> {
        serde_json::to_string(self).map_err(|e| DomainError::payload(e.to_string()))
    }

    pub fn from_payload(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw).map_err(|e| DomainError::payload(e.to_string()))
    }
}

/// Acknowledgement returned when a summary job was queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSummary {
    pub status: String,
    pub count: usize,
}

impl QueuedSummary {
    pub fn new(count: usize) -> Self {
        Self {
            status: "queued".to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryState {
    Pending,
    Ready,
}

/// Current content of the result slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub status: SummaryState,
    pub summary: Option<String>,
}

impl SummaryResult {
    pub fn pending() -> Self {
        Self {
            status: SummaryState::Pending,
            summary: None,
        }
    }

    pub fn ready(summary: impl Into<String>) -> Self {
        Self {
            status: SummaryState::Ready,
            summary: Some(summary.into()),
        }
    }

    /// An absent or empty slot is still pending.
    pub fn from_slot(slot: Option<String>) -> Self {
        match slot {
            Some(s) if !s.is_empty() => Self::ready(s),
            _ => Self::pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::AppointmentId;
    use serde_json::json;

    #[test]
    fn minimal_payload_is_accepted() {
        let raw = r#"{"appointments": [{"id": 1, "client_name": "A", "date": "2025-01-01", "time": "12:00"}]}"#;
        let job = SummaryJob::from_payload(raw).unwrap();
        assert!(job.id.is_none());
        assert_eq!(job.appointments.len(), 1);
        assert_eq!(job.appointments[0]["id"], json!(1));
        assert!(job.appointments[0].get("notes").is_none());
    }

    #[test]
    fn partial_records_are_accepted() {
        let raw = r#"{"appointments": [{"client_name": "A", "time": "12:00"}, "free text"]}"#;
        let job = SummaryJob::from_payload(raw).unwrap();
        assert_eq!(job.appointments.len(), 2);
        assert_eq!(job.appointments[1], json!("free text"));
    }

    #[test]
    fn appointments_must_be_a_list() {
        assert!(SummaryJob::from_payload(r#"{"appointments": 5}"#).is_err());
    }

    #[test]
    fn new_job_snapshots_appointments() {
        let appointment = Appointment {
            id: AppointmentId::new(7),
            client_name: "A".into(),
            date: "2025-01-01".into(),
            time: "12:00".into(),
            notes: None,
        };
        let job = SummaryJob::new(&[appointment]).unwrap();
        assert_eq!(job.appointments[0]["id"], json!(7));
        assert_eq!(job.appointments[0]["client_name"], json!("A"));
    }

    #[test]
    fn payload_without_appointments_is_empty() {
        let job = SummaryJob::from_payload("{}").unwrap();
        assert!(job.appointments.is_empty());
    }

    #[test]
    fn garbage_payload_is_a_payload_error() {
        assert!(matches!(SummaryJob::from_payload("not json"), Err(DomainError::Payload(_))));
    }

    #[test]
    fn new_job_carries_id_and_timestamp() {
        let job = SummaryJob::new(&[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&job.to_payload().unwrap()).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("enqueued_at").is_some());
        assert_eq!(value["appointments"], json!([]));
    }

    #[test]
    fn result_views_serialize_like_the_api() {
        assert_eq!(
            serde_json::to_value(SummaryResult::pending()).unwrap(),
            json!({"status": "pending", "summary": null})
        );
        assert_eq!(
            serde_json::to_value(SummaryResult::from_slot(Some("hello".into()))).unwrap(),
            json!({"status": "ready", "summary": "hello"})
        );
        assert_eq!(SummaryResult::from_slot(Some(String::new())), SummaryResult::pending());
        assert_eq!(
            serde_json::to_value(QueuedSummary::new(2)).unwrap(),
            json!({"status": "queued", "count": 2})
        );
    }
}
