//! Patient management.
//!
//! Creating a patient also spawns their clinical record; both rows land in
//! one transaction so no patient ever exists without a record.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repository::{
    delete_patient, get_patient, get_patient_by_email, insert_patient, insert_record_if_absent,
    list_patients, update_patient,
};
use crate::db::DatabaseError;
use crate::error::ClinicError;
use crate::models::Patient;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
    pub date_of_birth: NaiveDate,
    pub has_payroll_deduction: bool,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub has_payroll_deduction: Option<bool>,
    pub company_name: Option<String>,
}

fn ensure_company_rule(has_deduction: bool, company: Option<&str>) -> Result<(), ClinicError> {
    if has_deduction && company.map_or(true, |c| c.trim().is_empty()) {
        return Err(ClinicError::CompanyNameRequired);
    }
    Ok(())
}

pub fn create(conn: &Connection, input: NewPatient) -> Result<Patient, ClinicError> {
    ensure_company_rule(input.has_payroll_deduction, input.company_name.as_deref())?;
    if get_patient_by_email(conn, &input.email)?.is_some() {
        return Err(ClinicError::EmailAlreadyExists);
    }

    let patient = Patient {
        id: Uuid::new_v4(),
        first_name: input.first_name,
        last_name: input.last_name,
        phone: input.phone,
        email: input.email,
        address: input.address,
        date_of_birth: input.date_of_birth,
        has_payroll_deduction: input.has_payroll_deduction,
        company_name: input.company_name,
    };

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    insert_patient(&tx, &patient)?;
    insert_record_if_absent(&tx, &Uuid::new_v4(), &patient.id)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::debug!(id = %patient.id, "patient created with clinical record");
    Ok(patient)
}

pub fn update(conn: &Connection, id: &Uuid, patch: PatientPatch) -> Result<Patient, ClinicError> {
    let existing = get_patient(conn, id)?.ok_or(ClinicError::PatientNotFound)?;

    if let Some(email) = &patch.email {
        if *email != existing.email && get_patient_by_email(conn, email)?.is_some() {
            return Err(ClinicError::EmailAlreadyExists);
        }
    }

    let updated = Patient {
        id: existing.id,
        first_name: patch.first_name.unwrap_or(existing.first_name),
        last_name: patch.last_name.unwrap_or(existing.last_name),
        phone: patch.phone.unwrap_or(existing.phone),
        email: patch.email.unwrap_or(existing.email),
        address: patch.address.or(existing.address),
        date_of_birth: patch.date_of_birth.unwrap_or(existing.date_of_birth),
        has_payroll_deduction: patch
            .has_payroll_deduction
            .unwrap_or(existing.has_payroll_deduction),
        company_name: patch.company_name.or(existing.company_name),
    };
    ensure_company_rule(updated.has_payroll_deduction, updated.company_name.as_deref())?;

    update_patient(conn, &updated)?;
    Ok(updated)
}

/// Deleting a patient cascades their clinical record (and its entries) and
/// detaches their appointments.
pub fn remove(conn: &Connection, id: &Uuid) -> Result<(), ClinicError> {
    get_patient(conn, id)?.ok_or(ClinicError::PatientNotFound)?;
    delete_patient(conn, id)?;
    tracing::debug!(id = %id, "patient deleted");
    Ok(())
}

pub fn by_id(conn: &Connection, id: &Uuid) -> Result<Patient, ClinicError> {
    get_patient(conn, id)?.ok_or(ClinicError::PatientNotFound)
}

pub fn list(conn: &Connection) -> Result<Vec<Patient>, ClinicError> {
    Ok(list_patients(conn)?)
}
