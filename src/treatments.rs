//! Treatment type catalog.
//!
//! Labels are unique case-insensitively. A type referenced by any
//! appointment or clinical record entry cannot be deleted.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    count_appointments_for_type, count_entries_for_type, delete_treatment_type,
    find_treatment_type_by_label, get_treatment_type, insert_treatment_type,
    list_treatment_types, update_treatment_type,
};
use crate::error::ClinicError;
use crate::models::TreatmentType;

pub fn create(conn: &Connection, label: &str) -> Result<TreatmentType, ClinicError> {
    if find_treatment_type_by_label(conn, label, None)?.is_some() {
        return Err(ClinicError::TreatmentTypeAlreadyExists);
    }
    let tt = TreatmentType {
        id: Uuid::new_v4(),
        label: label.to_string(),
    };
    insert_treatment_type(conn, &tt)?;
    Ok(tt)
}

pub fn rename(conn: &Connection, id: &Uuid, label: &str) -> Result<TreatmentType, ClinicError> {
    get_treatment_type(conn, id)?.ok_or(ClinicError::TreatmentTypeNotFound)?;
    if find_treatment_type_by_label(conn, label, Some(id))?.is_some() {
        return Err(ClinicError::TreatmentTypeAlreadyExists);
    }
    update_treatment_type(conn, id, label)?;
    Ok(TreatmentType { id: *id, label: label.to_string() })
}

pub fn remove(conn: &Connection, id: &Uuid) -> Result<(), ClinicError> {
    get_treatment_type(conn, id)?.ok_or(ClinicError::TreatmentTypeNotFound)?;
    if count_appointments_for_type(conn, id)? > 0 {
        return Err(ClinicError::TreatmentTypeInUse("appointments"));
    }
    if count_entries_for_type(conn, id)? > 0 {
        return Err(ClinicError::TreatmentTypeInUse("clinical records"));
    }
    delete_treatment_type(conn, id)?;
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<TreatmentType>, ClinicError> {
    Ok(list_treatment_types(conn)?)
}
