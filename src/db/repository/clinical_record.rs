use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{ClinicalRecord, ClinicalRecordEntry};

/// Insert a clinical record unless the patient already has one. The UNIQUE
/// constraint on `patient_id` decides the race; losers are silent no-ops.
pub fn insert_record_if_absent(
    conn: &Connection,
    id: &Uuid,
    patient_id: &Uuid,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinical_records (id, patient_id) VALUES (?1, ?2)
         ON CONFLICT(patient_id) DO NOTHING",
        params![id.to_string(), patient_id.to_string()],
    )?;
    Ok(())
}

pub fn get_record_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<ClinicalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id FROM clinical_records WHERE patient_id = ?1",
    )?;
    let mut rows = stmt.query_map(params![patient_id.to_string()], record_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Insert an entry unless one already references the same appointment.
/// Manual entries (no appointment id) always insert.
pub fn insert_entry_if_absent(
    conn: &Connection,
    entry: &ClinicalRecordEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinical_record_entries
         (id, clinical_record_id, appointment_id, treatment_type_id, date, doctor_report)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(appointment_id) DO NOTHING",
        params![
            entry.id.to_string(),
            entry.clinical_record_id.to_string(),
            entry.appointment_id.map(|id| id.to_string()),
            entry.treatment_type_id.to_string(),
            entry.date.to_string(),
            entry.doctor_report,
        ],
    )?;
    Ok(())
}

pub fn get_entry(conn: &Connection, id: &Uuid) -> Result<Option<ClinicalRecordEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinical_record_id, appointment_id, treatment_type_id, date, doctor_report
         FROM clinical_record_entries WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id.to_string()], entry_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn get_entry_by_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<Option<ClinicalRecordEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinical_record_id, appointment_id, treatment_type_id, date, doctor_report
         FROM clinical_record_entries WHERE appointment_id = ?1",
    )?;
    let mut rows = stmt.query_map(params![appointment_id.to_string()], entry_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Entries of one record, newest treatment first.
pub fn list_entries_for_record(
    conn: &Connection,
    record_id: &Uuid,
) -> Result<Vec<ClinicalRecordEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinical_record_id, appointment_id, treatment_type_id, date, doctor_report
         FROM clinical_record_entries WHERE clinical_record_id = ?1 ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(params![record_id.to_string()], entry_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_entry(conn: &Connection, entry: &ClinicalRecordEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE clinical_record_entries
         SET treatment_type_id = ?2, date = ?3, doctor_report = ?4 WHERE id = ?1",
        params![
            entry.id.to_string(),
            entry.treatment_type_id.to_string(),
            entry.date.to_string(),
            entry.doctor_report,
        ],
    )?;
    Ok(())
}

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<ClinicalRecord, rusqlite::Error> {
    let id: String = row.get(0)?;
    let patient_id: String = row.get(1)?;
    Ok(ClinicalRecord {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        patient_id: Uuid::parse_str(&patient_id).unwrap_or_default(),
    })
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> Result<ClinicalRecordEntry, rusqlite::Error> {
    let id: String = row.get(0)?;
    let record_id: String = row.get(1)?;
    let appt_id: Option<String> = row.get(2)?;
    let tt_id: String = row.get(3)?;
    let date: String = row.get(4)?;
    Ok(ClinicalRecordEntry {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        clinical_record_id: Uuid::parse_str(&record_id).unwrap_or_default(),
        appointment_id: appt_id.and_then(|s| Uuid::parse_str(&s).ok()),
        treatment_type_id: Uuid::parse_str(&tt_id).unwrap_or_default(),
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap_or_default(),
        doctor_report: row.get(5)?,
    })
}
