//! Appointment storage.
//!
//! The rules live here rather than in the HTTP layer: creation rejects a
//! date+time slot that is already booked, and an update may not move an
//! appointment onto another appointment's slot.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{debug, instrument};

use appointly_core::{
    Appointment, AppointmentId, AppointmentPatch, DomainError, NewAppointment, export_csv,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("storage error: {0}")]
    Storage(String),
}

pub trait AppointmentRepository: Send + Sync {
    /// All appointments, ordered by id.
    fn list(&self) -> Result<Vec<Appointment>, RepositoryError>;

    fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, RepositoryError>;

    /// The appointment holding the given date+time slot, if any.
    fn find_by_datetime(&self, date: &str, time: &str) -> Result<Option<Appointment>, RepositoryError>;

    fn create(&self, input: NewAppointment) -> Result<Appointment, RepositoryError>;

    fn update(&self, id: AppointmentId, patch: AppointmentPatch) -> Result<Appointment, RepositoryError>;

    fn delete(&self, id: AppointmentId) -> Result<(), RepositoryError>;

    /// All appointments as CSV.
    fn export_csv(&self) -> Result<String, RepositoryError> {
        let all = self.list()?;
        Ok(export_csv(&all)?)
    }
}

#[derive(Debug, Default)]
struct Rows {
    last_id: u64,
    by_id: BTreeMap<AppointmentId, Appointment>,
}

impl Rows {
    fn slot_taken(&self, date: &str, time: &str, except: Option<AppointmentId>) -> bool {
        self.by_id
            .values()
            .any(|a| Some(a.id) != except && a.occupies(date, time))
    }
}

/// In-memory repository (tests/dev). Ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentRepository {
    rows: RwLock<Rows>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>, RepositoryError> {
        self.rows
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>, RepositoryError> {
        self.rows
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))
    }
}

impl AppointmentRepository for InMemoryAppointmentRepository {
    fn list(&self) -> Result<Vec<Appointment>, RepositoryError> {
        Ok(self.read()?.by_id.values().cloned().collect())
    }

    fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        Ok(self.read()?.by_id.get(&id).cloned())
    }

    fn find_by_datetime(&self, date: &str, time: &str) -> Result<Option<Appointment>, RepositoryError> {
        Ok(self
            .read()?
            .by_id
            .values()
            .find(|a| a.occupies(date, time))
            .cloned())
    }

    #[instrument(skip(self, input))]
    fn create(&self, input: NewAppointment) -> Result<Appointment, RepositoryError> {
        input.validate()?;

        let mut rows = self.write()?;
        if rows.slot_taken(&input.date, &input.time, None) {
            return Err(DomainError::conflict("appointment already exists at this date and time").into());
        }

        rows.last_id += 1;
        let appointment = input.into_appointment(AppointmentId::new(rows.last_id));
        rows.by_id.insert(appointment.id, appointment.clone());
        debug!(id = %appointment.id, "appointment created");
        Ok(appointment)
    }

    #[instrument(skip(self, patch))]
    fn update(&self, id: AppointmentId, patch: AppointmentPatch) -> Result<Appointment, RepositoryError> {
        patch.validate()?;

        let mut rows = self.write()?;
        let current = rows.by_id.get(&id).ok_or(DomainError::NotFound)?;
        let next = patch.apply_to(current);

        if rows.slot_taken(&next.date, &next.time, Some(id)) {
            return Err(DomainError::conflict("another appointment already exists at this date and time").into());
        }

        rows.by_id.insert(id, next.clone());
        Ok(next)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: AppointmentId) -> Result<(), RepositoryError> {
        self.write()?
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_with_one() -> InMemoryAppointmentRepository {
        let repo = InMemoryAppointmentRepository::new();
        repo.create(NewAppointment::new("Test User", "2025-01-01", "12:00").with_notes("Testing"))
            .unwrap();
        repo
    }

    fn is_domain(err: &RepositoryError, expected: fn(&DomainError) -> bool) -> bool {
        matches!(err, RepositoryError::Domain(e) if expected(e))
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let repo = repo_with_one();
        let second = repo.create(NewAppointment::new("B", "2025-01-02", "09:00")).unwrap();
        assert_eq!(second.id, AppointmentId::new(2));
        assert_eq!(repo.list().unwrap().len(), 2);
    }

    #[test]
    fn find_by_datetime_matches_exact_slot() {
        let repo = repo_with_one();
        let found = repo.find_by_datetime("2025-01-01", "12:00").unwrap().unwrap();
        assert_eq!(found.client_name, "Test User");
        assert!(repo.find_by_datetime("2025-01-01", "12:30").unwrap().is_none());
    }

    #[test]
    fn double_booking_is_a_conflict() {
        let repo = repo_with_one();
        let err = repo
            .create(NewAppointment::new("Other", "2025-01-01", "12:00"))
            .unwrap_err();
        assert!(is_domain(&err, |e| matches!(e, DomainError::Conflict(_))));
    }

    #[test]
    fn blank_name_is_rejected_before_storage() {
        let repo = InMemoryAppointmentRepository::new();
        let err = repo.create(NewAppointment::new("", "2025-01-01", "12:00")).unwrap_err();
        assert!(is_domain(&err, |e| matches!(e, DomainError::Validation(_))));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn update_changes_only_given_fields() {
        let repo = repo_with_one();
        let patch = AppointmentPatch {
            time: Some("13:00".into()),
            ..Default::default()
        };
        let updated = repo.update(AppointmentId::new(1), patch).unwrap();
        assert_eq!(updated.time, "13:00");
        assert_eq!(updated.notes.as_deref(), Some("Testing"));
        assert_eq!(repo.get(AppointmentId::new(1)).unwrap(), Some(updated));
    }

    #[test]
    fn update_onto_own_slot_is_allowed() {
        let repo = repo_with_one();
        let patch = AppointmentPatch {
            client_name: Some("Renamed".into()),
            date: Some("2025-01-01".into()),
            ..Default::default()
        };
        assert!(repo.update(AppointmentId::new(1), patch).is_ok());
    }

    #[test]
    fn update_onto_taken_slot_is_a_conflict() {
        let repo = repo_with_one();
        repo.create(NewAppointment::new("B", "2025-01-02", "09:00")).unwrap();
        let patch = AppointmentPatch {
            date: Some("2025-01-01".into()),
            time: Some("12:00".into()),
            ..Default::default()
        };
        let err = repo.update(AppointmentId::new(2), patch).unwrap_err();
        assert!(is_domain(&err, |e| matches!(e, DomainError::Conflict(_))));
    }

    #[test]
    fn missing_appointments_are_not_found() {
        let repo = repo_with_one();
        let patch = AppointmentPatch {
            notes: Some("x".into()),
            ..Default::default()
        };
        let err = repo.update(AppointmentId::new(9999), patch).unwrap_err();
        assert!(is_domain(&err, |e| *e == DomainError::NotFound));
        let err = repo.delete(AppointmentId::new(9999)).unwrap_err();
        assert!(is_domain(&err, |e| *e == DomainError::NotFound));
    }

    #[test]
    fn delete_frees_the_slot() {
        let repo = repo_with_one();
        repo.delete(AppointmentId::new(1)).unwrap();
        assert!(repo.get(AppointmentId::new(1)).unwrap().is_none());
        let again = repo.create(NewAppointment::new("C", "2025-01-01", "12:00")).unwrap();
        assert_eq!(again.id, AppointmentId::new(2));
    }

    #[test]
    fn export_includes_every_row() {
        let repo = repo_with_one();
        let csv = repo.export_csv().unwrap();
        assert_eq!(
            csv,
            "id,client_name,date,time,notes\n1,Test User,2025-01-01,12:00,Testing\n"
        );
    }
}
