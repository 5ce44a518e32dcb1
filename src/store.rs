//! Record store for write-once desk artifacts (OPD slips, identification events).
//!
//! Store failures never replace the artifact: callers attach a
//! `PersistenceStatus` to the response instead.

use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::db::{self, DatabaseError};
use crate::models::{IdentificationRecord, OpdSlip};
use crate::opd::token_prefix;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("OPD token already stored: {0}")]
    DuplicateToken(String),

    #[error("Record store lock poisoned")]
    LockPoisoned,
}

/// Outcome of persisting an artifact, reported next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceStatus {
    pub stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersistenceStatus {
    pub fn from_result(result: Result<(), PersistenceError>) -> Self {
        match result {
            Ok(()) => Self {
                stored: true,
                error: None,
            },
            Err(e) => Self {
                stored: false,
                error: Some(e.to_string()),
            },
        }
    }
}

pub trait RecordStore: Send + Sync {
    /// Fails when the slip's token is already stored.
    fn save_opd_slip(&self, slip: &OpdSlip) -> Result<(), PersistenceError>;

    /// Tokens of slips stored for the given UTC day.
    fn opd_tokens_for_day(&self, day: NaiveDate) -> Result<Vec<String>, PersistenceError>;

    fn save_identification_event(
        &self,
        record: &IdentificationRecord,
    ) -> Result<(), PersistenceError>;

    /// Short backend label for health output.
    fn backend(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════
// SQLite
// ═══════════════════════════════════════════════════════════

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        let conn = db::open_database(path)?;
        tracing::info!(path = %path.display(), "Record store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: Mutex::new(db::open_memory_database()?),
        })
    }

    /// Run `f` against the underlying connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, PersistenceError> {
        let conn = self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(f(&conn)?)
    }
}

impl RecordStore for SqliteRecordStore {
    fn save_opd_slip(&self, slip: &OpdSlip) -> Result<(), PersistenceError> {
        self.with_conn(|conn| db::insert_opd_slip(conn, slip))
    }

    fn opd_tokens_for_day(&self, day: NaiveDate) -> Result<Vec<String>, PersistenceError> {
        self.with_conn(|conn| db::get_opd_tokens_with_prefix(conn, &token_prefix(day)))
    }

    fn save_identification_event(
        &self,
        record: &IdentificationRecord,
    ) -> Result<(), PersistenceError> {
        self.with_conn(|conn| db::insert_identification_record(conn, record))
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
struct Records {
    slips: Vec<OpdSlip>,
    identifications: Vec<IdentificationRecord>,
}

/// Volatile store, also used to simulate an unavailable backend.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Records>,
    failure: Option<String>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            records: Mutex::new(Records::default()),
            failure: Some(message.into()),
        }
    }

    pub fn opd_slips(&self) -> Vec<OpdSlip> {
        self.records
            .lock()
            .map(|r| r.slips.clone())
            .unwrap_or_default()
    }

    pub fn identification_events(&self) -> Vec<IdentificationRecord> {
        self.records
            .lock()
            .map(|r| r.identifications.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        match &self.failure {
            Some(message) => Err(PersistenceError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl RecordStore for InMemoryRecordStore {
    fn save_opd_slip(&self, slip: &OpdSlip) -> Result<(), PersistenceError> {
        self.check_available()?;
        let mut records = self
            .records
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        if records
            .slips
            .iter()
            .any(|s| s.token_number == slip.token_number)
        {
            return Err(PersistenceError::DuplicateToken(slip.token_number.clone()));
        }
        records.slips.push(slip.clone());
        Ok(())
    }

    fn opd_tokens_for_day(&self, day: NaiveDate) -> Result<Vec<String>, PersistenceError> {
        self.check_available()?;
        let prefix = token_prefix(day);
        let records = self
            .records
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(records
            .slips
            .iter()
            .filter(|s| s.token_number.starts_with(&prefix))
            .map(|s| s.token_number.clone())
            .collect())
    }

    fn save_identification_event(
        &self,
        record: &IdentificationRecord,
    ) -> Result<(), PersistenceError> {
        self.check_available()?;
        let mut records = self
            .records
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        records.identifications.push(record.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, PatientSnapshot};
    use crate::opd::OpdSlipGenerator;

    fn sample_slip() -> OpdSlip {
        OpdSlipGenerator::default()
            .generate(
                &PatientSnapshot {
                    id: "patient-1".into(),
                    name: "Jane Roe".into(),
                    age: 34,
                    gender: Gender::Female,
                },
                None,
            )
            .unwrap()
    }

    #[test]
    fn sqlite_store_persists_slip() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let slip = sample_slip();
        store.save_opd_slip(&slip).unwrap();

        let loaded = store
            .with_conn(|conn| db::get_opd_slip(conn, &slip.id))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.token_number, slip.token_number);
        assert_eq!(loaded.slip_date, slip.slip_date);
    }

    #[test]
    fn sqlite_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::open(&dir.path().join("records.db")).unwrap();
        store.save_opd_slip(&sample_slip()).unwrap();
        assert_eq!(store.backend(), "sqlite");
    }

    #[test]
    fn sqlite_store_reports_duplicate_write() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let slip = sample_slip();
        store.save_opd_slip(&slip).unwrap();
        let status = PersistenceStatus::from_result(store.save_opd_slip(&slip));
        assert!(!status.stored);
        assert!(status.error.unwrap().contains("Constraint"));
    }

    #[test]
    fn sqlite_store_rejects_reused_token() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let first = sample_slip();
        store.save_opd_slip(&first).unwrap();

        let mut second = sample_slip();
        second.token_number = first.token_number.clone();
        let err = store.save_opd_slip(&second).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Database(DatabaseError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn tokens_for_day_only_lists_that_day() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let mut today = sample_slip();
        today.token_number = "OPD-20261019-000003".into();
        let mut yesterday = sample_slip();
        yesterday.token_number = "OPD-20261018-000009".into();
        store.save_opd_slip(&today).unwrap();
        store.save_opd_slip(&yesterday).unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            store.opd_tokens_for_day(day).unwrap(),
            vec!["OPD-20261019-000003".to_string()]
        );

        let memory = InMemoryRecordStore::new();
        memory.save_opd_slip(&today).unwrap();
        memory.save_opd_slip(&yesterday).unwrap();
        assert_eq!(memory.opd_tokens_for_day(day).unwrap().len(), 1);
    }

    #[test]
    fn memory_store_rejects_reused_token() {
        let store = InMemoryRecordStore::new();
        let first = sample_slip();
        store.save_opd_slip(&first).unwrap();
        let mut second = sample_slip();
        second.token_number = first.token_number.clone();
        assert_eq!(
            store.save_opd_slip(&second).unwrap_err().to_string(),
            format!("OPD token already stored: {}", first.token_number)
        );
    }

    #[test]
    fn memory_store_keeps_records() {
        let store = InMemoryRecordStore::new();
        store.save_opd_slip(&sample_slip()).unwrap();
        assert_eq!(store.opd_slips().len(), 1);
        assert!(store.identification_events().is_empty());
    }

    #[test]
    fn failing_store_reports_message() {
        let store = InMemoryRecordStore::failing("disk full");
        let status = PersistenceStatus::from_result(store.save_opd_slip(&sample_slip()));
        assert_eq!(
            status,
            PersistenceStatus {
                stored: false,
                error: Some("Record store unavailable: disk full".into()),
            }
        );
        assert!(store.opd_slips().is_empty());
    }
}
