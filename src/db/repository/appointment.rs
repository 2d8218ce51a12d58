use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;

const APPOINTMENT_COLUMNS: &str = "id, patient_id, treatment_type_id, date, time, status, notes,
         payroll_deduction_months, payroll_deduction_amount";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, treatment_type_id, date, time, status, notes,
         payroll_deduction_months, payroll_deduction_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.id.to_string(),
            appt.patient_id.map(|id| id.to_string()),
            appt.treatment_type_id.to_string(),
            appt.date.to_string(),
            appt.time.format("%H:%M").to_string(),
            appt.status.as_str(),
            appt.notes,
            appt.payroll_deduction_months,
            appt.payroll_deduction_amount,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], |row| Ok(appointment_row(row)))?;
    match rows.next() {
        Some(row) => Ok(Some(appointment_from_row(row??)?)),
        None => Ok(None),
    }
}

pub fn update_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE appointments SET patient_id = ?2, treatment_type_id = ?3, date = ?4, time = ?5,
         status = ?6, notes = ?7, payroll_deduction_months = ?8, payroll_deduction_amount = ?9
         WHERE id = ?1",
        params![
            appt.id.to_string(),
            appt.patient_id.map(|id| id.to_string()),
            appt.treatment_type_id.to_string(),
            appt.date.to_string(),
            appt.time.format("%H:%M").to_string(),
            appt.status.as_str(),
            appt.notes,
            appt.payroll_deduction_months,
            appt.payroll_deduction_amount,
        ],
    )?;
    Ok(())
}

pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM appointments WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

/// All appointments, optionally restricted to an inclusive date range.
pub fn list_appointments(
    conn: &Connection,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let (start, end) = match range {
        Some((s, e)) => (s.to_string(), e.to_string()),
        // ISO date strings compare lexicographically, so these bound everything.
        None => ("0000-01-01".to_string(), "9999-12-31".to_string()),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date ASC, time ASC"
    ))?;
    let rows = stmt.query_map(params![start, end], |row| Ok(appointment_row(row)))?;

    let mut appts = Vec::new();
    for row in rows {
        appts.push(appointment_from_row(row??)?);
    }
    Ok(appts)
}

/// Completed appointments within an inclusive date range, in encounter
/// order (date, then slot time).
pub fn completed_appointments_between(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE status = 'completed' AND date >= ?1 AND date <= ?2
         ORDER BY date ASC, time ASC"
    ))?;
    let rows = stmt.query_map(params![start.to_string(), end.to_string()], |row| {
        Ok(appointment_row(row))
    })?;

    let mut appts = Vec::new();
    for row in rows {
        appts.push(appointment_from_row(row??)?);
    }
    Ok(appts)
}

/// An appointment joined with the patient identity the payroll report needs.
pub struct PayrollCandidate {
    pub appointment: Appointment,
    pub patient_name: String,
    pub company_name: Option<String>,
}

/// Completed appointments carrying an active payroll deduction, dated on or
/// before the reference date.
pub fn payroll_candidates(
    conn: &Connection,
    reference: NaiveDate,
) -> Result<Vec<PayrollCandidate>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.patient_id, a.treatment_type_id, a.date, a.time, a.status, a.notes,
                a.payroll_deduction_months, a.payroll_deduction_amount,
                p.first_name, p.last_name, p.company_name
         FROM appointments a
         JOIN patients p ON p.id = a.patient_id
         WHERE a.status = 'completed'
           AND a.payroll_deduction_amount > 0
           AND a.patient_id IS NOT NULL
           AND a.date <= ?1
         ORDER BY a.date ASC, a.time ASC",
    )?;
    let rows = stmt.query_map(params![reference.to_string()], |row| {
        Ok((
            appointment_row(row),
            row.get::<_, String>(9)?,
            row.get::<_, String>(10)?,
            row.get::<_, Option<String>>(11)?,
        ))
    })?;

    let mut candidates = Vec::new();
    for row in rows {
        let (appt_row, first, last, company) = row?;
        candidates.push(PayrollCandidate {
            appointment: appointment_from_row(appt_row?)?,
            patient_name: format!("{first} {last}"),
            company_name: company,
        });
    }
    Ok(candidates)
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: String,
    patient_id: Option<String>,
    treatment_type_id: String,
    date: String,
    time: String,
    status: String,
    notes: Option<String>,
    payroll_deduction_months: Option<i32>,
    payroll_deduction_amount: Option<f64>,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        treatment_type_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        payroll_deduction_months: row.get(7)?,
        payroll_deduction_amount: row.get(8)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: row.patient_id.and_then(|s| Uuid::parse_str(&s).ok()),
        treatment_type_id: Uuid::parse_str(&row.treatment_type_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        date: NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        time: NaiveTime::parse_from_str(&row.time, "%H:%M")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        status: AppointmentStatus::from_str(&row.status)?,
        notes: row.notes,
        payroll_deduction_months: row.payroll_deduction_months,
        payroll_deduction_amount: row.payroll_deduction_amount,
    })
}
