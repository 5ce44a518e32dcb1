use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

// ═══════════════════════════════════════════════════════════
// OPD slips
// ═══════════════════════════════════════════════════════════

pub fn insert_opd_slip(conn: &Connection, slip: &OpdSlip) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO opd_slips (id, patient_id, patient_name, patient_age, patient_gender,
         token_number, slip_date, department, doctor_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            slip.id,
            slip.patient_id,
            slip.patient_name,
            slip.patient_age,
            slip.patient_gender.as_str(),
            slip.token_number,
            slip.slip_date.to_rfc3339(),
            slip.department,
            slip.doctor_name,
        ],
    )
    .map_err(constraint_or_sqlite)?;
    Ok(())
}

pub fn get_opd_slip(conn: &Connection, id: &str) -> Result<Option<OpdSlip>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, patient_name, patient_age, patient_gender, token_number,
             slip_date, department, doctor_name
             FROM opd_slips WHERE id = ?1",
            params![id],
            |row| Ok(opd_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => Ok(Some(opd_slip_from_row(r?)?)),
        None => Ok(None),
    }
}

pub fn get_opd_slips_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<OpdSlip>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, patient_name, patient_age, patient_gender, token_number,
         slip_date, department, doctor_name
         FROM opd_slips WHERE patient_id = ?1 ORDER BY slip_date",
    )?;

    let rows = stmt.query_map(params![patient_id], |row| Ok(opd_row_from_rusqlite(row)))?;

    let mut slips = Vec::new();
    for row in rows {
        slips.push(opd_slip_from_row(row??)?);
    }
    Ok(slips)
}

/// Token numbers starting with `prefix`, e.g. every token of one day.
pub fn get_opd_tokens_with_prefix(
    conn: &Connection,
    prefix: &str,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT token_number FROM opd_slips
         WHERE substr(token_number, 1, length(?1)) = ?1
         ORDER BY token_number",
    )?;
    let tokens = stmt
        .query_map(params![prefix], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tokens)
}

struct OpdRow {
    id: String,
    patient_id: String,
    patient_name: String,
    patient_age: u32,
    patient_gender: String,
    token_number: String,
    slip_date: String,
    department: String,
    doctor_name: Option<String>,
}

fn opd_row_from_rusqlite(row: &Row) -> Result<OpdRow, rusqlite::Error> {
    Ok(OpdRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        patient_age: row.get(3)?,
        patient_gender: row.get(4)?,
        token_number: row.get(5)?,
        slip_date: row.get(6)?,
        department: row.get(7)?,
        doctor_name: row.get(8)?,
    })
}

fn opd_slip_from_row(row: OpdRow) -> Result<OpdSlip, DatabaseError> {
    Ok(OpdSlip {
        id: row.id,
        patient_id: row.patient_id,
        patient_name: row.patient_name,
        patient_age: row.patient_age,
        patient_gender: Gender::from_str(&row.patient_gender)?,
        token_number: row.token_number,
        slip_date: parse_timestamp("slip_date", &row.slip_date)?,
        department: row.department,
        doctor_name: row.doctor_name,
    })
}

// ═══════════════════════════════════════════════════════════
// Identification events
// ═══════════════════════════════════════════════════════════

pub fn insert_identification_record(
    conn: &Connection,
    record: &IdentificationRecord,
) -> Result<(), DatabaseError> {
    let snapshot = record.snapshot.as_ref();
    conn.execute(
        "INSERT INTO identification_events (log_id, patient_id, identified_at, method, source,
         snapshot_mime, snapshot_sha256, snapshot_bytes, snapshot_complete, logged_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.log_id,
            record.patient_id,
            record.identified_at.to_rfc3339(),
            record.method,
            record.source,
            snapshot.map(|s| s.mime_type.as_str()),
            snapshot.map(|s| s.sha256.as_str()),
            snapshot.map(|s| s.byte_len as i64),
            snapshot.map(|s| s.complete),
            record.logged_at.to_rfc3339(),
        ],
    )
    .map_err(constraint_or_sqlite)?;
    Ok(())
}

pub fn get_identification_record(
    conn: &Connection,
    log_id: &str,
) -> Result<Option<IdentificationRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT log_id, patient_id, identified_at, method, source,
             snapshot_mime, snapshot_sha256, snapshot_bytes, snapshot_complete, logged_at
             FROM identification_events WHERE log_id = ?1",
            params![log_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<i64>>(7)?,
                    row.get::<_, Option<bool>>(8)?,
                    row.get::<_, String>(9)?,
                ))
            },
        )
        .optional()?;

    let Some((
        log_id,
        patient_id,
        identified_at,
        method,
        source,
        mime,
        sha256,
        bytes,
        complete,
        logged_at,
    )) = row
    else {
        return Ok(None);
    };

    let snapshot = match (mime, sha256) {
        (Some(mime_type), Some(sha256)) => Some(SnapshotReference {
            mime_type,
            sha256,
            byte_len: bytes.unwrap_or(0).max(0) as usize,
            complete: complete.unwrap_or(true),
        }),
        _ => None,
    };

    Ok(Some(IdentificationRecord {
        log_id,
        patient_id,
        identified_at: parse_timestamp("identified_at", &identified_at)?,
        method,
        source,
        snapshot,
        logged_at: parse_timestamp("logged_at", &logged_at)?,
    }))
}

pub fn count_identification_records(
    conn: &Connection,
    patient_id: &str,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM identification_events WHERE patient_id = ?1",
        params![patient_id],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidTimestamp {
            column,
            value: value.to_string(),
        })
}

fn constraint_or_sqlite(e: rusqlite::Error) -> DatabaseError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, ref msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(msg.clone().unwrap_or_else(|| err.to_string()))
        }
        other => DatabaseError::Sqlite(other),
    }
}
