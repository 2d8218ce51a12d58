use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Patient;

const PATIENT_COLUMNS: &str = "id, first_name, last_name, phone, email, address, date_of_birth,
         has_payroll_deduction, company_name";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, phone, email, address, date_of_birth,
         has_payroll_deduction, company_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.phone,
            patient.email,
            patient.address,
            patient.date_of_birth.to_string(),
            patient.has_payroll_deduction as i32,
            patient.company_name,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], patient_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn get_patient_by_email(conn: &Connection, email: &str) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE email = ?1"
    ))?;
    let mut rows = stmt.query_map(params![email], patient_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map([], patient_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE patients SET first_name = ?2, last_name = ?3, phone = ?4, email = ?5,
         address = ?6, date_of_birth = ?7, has_payroll_deduction = ?8, company_name = ?9
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.phone,
            patient.email,
            patient.address,
            patient.date_of_birth.to_string(),
            patient.has_payroll_deduction as i32,
            patient.company_name,
        ],
    )?;
    Ok(())
}

pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

fn patient_from_row(row: &rusqlite::Row<'_>) -> Result<Patient, rusqlite::Error> {
    let id: String = row.get(0)?;
    let dob: String = row.get(6)?;
    let flag: i32 = row.get(7)?;
    Ok(Patient {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        date_of_birth: NaiveDate::parse_from_str(&dob, "%Y-%m-%d").unwrap_or_default(),
        has_payroll_deduction: flag != 0,
        company_name: row.get(8)?,
    })
}
