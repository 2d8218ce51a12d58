//! Clinical record linkage and entry management.
//!
//! Every patient owns exactly one clinical record; completing an
//! appointment files an entry into it. Both the record get-or-create and
//! the entry creation lean on UNIQUE constraints, so running the same
//! completion twice (or two completions racing) cannot duplicate rows.

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    get_entry, get_entry_by_appointment, get_patient, get_record_by_patient,
    get_treatment_type, insert_entry_if_absent, insert_record_if_absent,
    list_entries_for_record, update_entry,
};
use crate::db::DatabaseError;
use crate::error::ClinicError;
use crate::models::{ClinicalRecord, ClinicalRecordEntry};

/// Get the patient's clinical record, creating it if absent. A concurrent
/// creator may win the insert; the re-read picks up whichever row survived.
pub fn ensure_record(conn: &Connection, patient_id: &Uuid) -> Result<ClinicalRecord, ClinicError> {
    if let Some(record) = get_record_by_patient(conn, patient_id)? {
        return Ok(record);
    }
    insert_record_if_absent(conn, &Uuid::new_v4(), patient_id)?;
    get_record_by_patient(conn, patient_id)?.ok_or_else(|| {
        ClinicError::Database(DatabaseError::ConstraintViolation(
            "clinical record missing after insert".into(),
        ))
    })
}

/// File an entry for a completed appointment, or return the one that
/// already references it.
pub fn ensure_entry_for_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
    record_id: &Uuid,
    treatment_type_id: &Uuid,
    date: NaiveDate,
    report_text: &str,
) -> Result<ClinicalRecordEntry, ClinicError> {
    if let Some(existing) = get_entry_by_appointment(conn, appointment_id)? {
        return Ok(existing);
    }

    let entry = ClinicalRecordEntry {
        id: Uuid::new_v4(),
        clinical_record_id: *record_id,
        appointment_id: Some(*appointment_id),
        treatment_type_id: *treatment_type_id,
        date,
        doctor_report: report_text.to_string(),
    };
    insert_entry_if_absent(conn, &entry)?;

    get_entry_by_appointment(conn, appointment_id)?.ok_or_else(|| {
        ClinicError::Database(DatabaseError::ConstraintViolation(
            "clinical record entry missing after insert".into(),
        ))
    })
}

/// The patient's record plus its entries, newest first. Creates the record
/// on the fly if it is somehow absent (patient creation normally spawns it).
pub fn record_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<(ClinicalRecord, Vec<ClinicalRecordEntry>), ClinicError> {
    if get_patient(conn, patient_id)?.is_none() {
        return Err(ClinicError::PatientNotFound);
    }
    let record = ensure_record(conn, patient_id)?;
    let entries = list_entries_for_record(conn, &record.id)?;
    Ok((record, entries))
}

/// Manually filed entry, not linked to any appointment.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub treatment_type_id: Uuid,
    pub date: NaiveDate,
    pub doctor_report: String,
}

pub fn add_entry(
    conn: &Connection,
    record_id: &Uuid,
    input: NewEntry,
) -> Result<ClinicalRecordEntry, ClinicError> {
    if get_treatment_type(conn, &input.treatment_type_id)?.is_none() {
        return Err(ClinicError::TreatmentTypeNotFound);
    }
    let entry = ClinicalRecordEntry {
        id: Uuid::new_v4(),
        clinical_record_id: *record_id,
        appointment_id: None,
        treatment_type_id: input.treatment_type_id,
        date: input.date,
        doctor_report: input.doctor_report,
    };
    insert_entry_if_absent(conn, &entry)?;
    Ok(entry)
}

#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub treatment_type_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub doctor_report: Option<String>,
}

pub fn edit_entry(
    conn: &Connection,
    id: &Uuid,
    patch: EntryPatch,
) -> Result<ClinicalRecordEntry, ClinicError> {
    let existing = get_entry(conn, id)?.ok_or(ClinicError::RecordEntryNotFound)?;
    if let Some(tt) = patch.treatment_type_id {
        if get_treatment_type(conn, &tt)?.is_none() {
            return Err(ClinicError::TreatmentTypeNotFound);
        }
    }
    let updated = ClinicalRecordEntry {
        treatment_type_id: patch.treatment_type_id.unwrap_or(existing.treatment_type_id),
        date: patch.date.unwrap_or(existing.date),
        doctor_report: patch.doctor_report.unwrap_or(existing.doctor_report.clone()),
        ..existing
    };
    update_entry(conn, &updated)?;
    Ok(updated)
}
