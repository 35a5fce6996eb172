//! Appointment records, their validation rules and the CSV export view.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::AppointmentId;

/// Column order of the CSV export.
pub const CSV_HEADER: [&str; 5] = ["id", "client_name", "date", "time", "notes"];

/// A stored appointment.
///
/// `date` and `time` are kept as the client supplied them; two appointments
/// conflict when both strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_name: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    /// Returns `true` if this appointment occupies the given date+time slot.
    pub fn occupies(&self, date: &str, time: &str) -> bool {
        self.date == date && self.time == time
    }
}

/// Input for creating an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub client_name: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn new(
        client_name: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            date: date.into(),
            time: time.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.client_name.trim().is_empty() {
            return Err(DomainError::validation("client name cannot be empty"));
        }
        if self.date.trim().is_empty() || self.time.trim().is_empty() {
            return Err(DomainError::validation("date and time are required"));
        }
        Ok(())
    }

    pub fn into_appointment(self, id: AppointmentId) -> Appointment {
        Appointment {
            id,
            client_name: self.client_name,
            date: self.date,
            time: self.time,
            notes: self.notes,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPatch {
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self.client_name.is_none() && self.date.is_none() && self.time.is_none() && self.notes.is_none()
    }

    /// Reject empty patches and patches that would blank a required field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation("no fields provided for update"));
        }
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.client_name) {
            return Err(DomainError::validation("client name cannot be empty"));
        }
        if blank(&self.date) || blank(&self.time) {
            return Err(DomainError::validation("date and time are required"));
        }
        Ok(())
    }

    /// Apply the patch to a copy of `current`.
    pub fn apply_to(&self, current: &Appointment) -> Appointment {
        let mut next = current.clone();
        if let Some(v) = &self.client_name {
            next.client_name = v.clone();
        }
        if let Some(v) = &self.date {
            next.date = v.clone();
        }
        if let Some(v) = &self.time {
            next.time = v.clone();
        }
        if let Some(v) = &self.notes {
            next.notes = Some(v.clone());
        }
        next
    }
}

/// Render appointments as CSV (`id,client_name,date,time,notes`).
///
/// Fields are quoted only when needed; missing notes become an empty field.
pub fn export_csv(appointments: &[Appointment]) -> DomainResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| DomainError::payload(e.to_string()))?;

    for a in appointments {
        let id = a.id.to_string();
        writer
            .write_record([
                id.as_str(),
                a.client_name.as_str(),
                a.date.as_str(),
                a.time.as_str(),
                a.notes.as_deref().unwrap_or(""),
            ])
            .map_err(|e| DomainError::payload(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DomainError::payload(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DomainError::payload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appt(id: u64, name: &str, notes: Option<&str>) -> Appointment {
        Appointment {
            id: AppointmentId::new(id),
            client_name: name.to_string(),
            date: "2025-01-01".to_string(),
            time: "12:00".to_string(),
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn blank_client_name_is_rejected() {
        let err = NewAppointment::new(" ", "2025-01-01", "12:00").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_date_or_time_is_rejected() {
        assert!(NewAppointment::new("A", "", "12:00").validate().is_err());
        assert!(NewAppointment::new("A", "2025-01-01", " ").validate().is_err());
        assert!(NewAppointment::new("A", "2025-01-01", "12:00").validate().is_ok());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = AppointmentPatch::default().validate().unwrap_err();
        assert_eq!(err, DomainError::validation("no fields provided for update"));
    }

    #[test]
    fn patch_cannot_blank_required_fields() {
        let patch = AppointmentPatch {
            time: Some("".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let current = appt(1, "Test User", Some("Testing"));
        let patch = AppointmentPatch {
            time: Some("13:00".into()),
            ..Default::default()
        };
        let next = patch.apply_to(&current);
        assert_eq!(next.time, "13:00");
        assert_eq!(next.client_name, "Test User");
        assert_eq!(next.notes.as_deref(), Some("Testing"));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = export_csv(&[appt(1, "Test User", Some("Testing")), appt(2, "B", None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,client_name,date,time,notes");
        assert_eq!(lines[1], "1,Test User,2025-01-01,12:00,Testing");
        assert_eq!(lines[2], "2,B,2025-01-01,12:00,");
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let csv = export_csv(&[appt(3, "Doe, Jane", Some("say \"hi\""))]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "3,\"Doe, Jane\",2025-01-01,12:00,\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_of_nothing_is_just_the_header() {
        assert_eq!(export_csv(&[]).unwrap(), "id,client_name,date,time,notes\n");
    }
}
