//! Appointment lifecycle.
//!
//! Owns the status state machine (`scheduled → completed` locked,
//! `scheduled → cancelled` terminal) and the completion side effects:
//! payroll deduction validation for patients billed through their employer,
//! and filing a clinical record entry. Every completion runs inside one
//! transaction; a rule violation rolls everything back.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repository::{
    delete_appointment, get_appointment, get_patient, get_treatment_type, insert_appointment,
    list_appointments, update_appointment,
};
use crate::db::DatabaseError;
use crate::error::ClinicError;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;
use crate::payroll;
use crate::records;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Option<Uuid>,
    pub treatment_type_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub payroll_deduction_months: Option<i32>,
    pub payroll_deduction_amount: Option<f64>,
}

/// Field patch; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentPatch {
    pub patient_id: Option<Uuid>,
    pub treatment_type_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub payroll_deduction_months: Option<i32>,
    pub payroll_deduction_amount: Option<f64>,
}

fn ensure_slot_aligned(time: NaiveTime) -> Result<(), ClinicError> {
    if time.minute() % 30 != 0 || time.second() != 0 {
        return Err(ClinicError::InvalidTimeSlot);
    }
    Ok(())
}

pub fn create(conn: &Connection, input: NewAppointment) -> Result<Appointment, ClinicError> {
    ensure_slot_aligned(input.time)?;
    if get_treatment_type(conn, &input.treatment_type_id)?.is_none() {
        return Err(ClinicError::TreatmentTypeNotFound);
    }

    let appt = Appointment {
        id: Uuid::new_v4(),
        patient_id: input.patient_id,
        treatment_type_id: input.treatment_type_id,
        date: input.date,
        time: input.time,
        status: input.status,
        notes: input.notes,
        payroll_deduction_months: input.payroll_deduction_months,
        payroll_deduction_amount: input.payroll_deduction_amount,
    };

    if appt.status != AppointmentStatus::Completed {
        insert_appointment(conn, &appt)?;
        tracing::debug!(id = %appt.id, status = appt.status.as_str(), "appointment created");
        return Ok(appt);
    }

    let Some(patient_id) = appt.patient_id else {
        return Err(ClinicError::PatientRequiredForCompletion);
    };

    // Completion writes the appointment and its clinical record entry
    // together; the transaction rolls back on any rule violation.
    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    let patient = get_patient(&tx, &patient_id)?.ok_or(ClinicError::PatientNotFound)?;
    if patient.has_payroll_deduction {
        payroll::validate_deduction(
            appt.payroll_deduction_months,
            appt.payroll_deduction_amount,
        )?;
    }

    insert_appointment(&tx, &appt)?;
    link_completion(&tx, &appt, &patient_id)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::debug!(id = %appt.id, patient = %patient_id, "appointment created as completed");
    Ok(appt)
}

pub fn update(
    conn: &Connection,
    id: &Uuid,
    patch: AppointmentPatch,
) -> Result<Appointment, ClinicError> {
    if let Some(time) = patch.time {
        ensure_slot_aligned(time)?;
    }

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    let existing = get_appointment(&tx, id)?.ok_or(ClinicError::AppointmentNotFound)?;

    // Completed is locked outright; cancelled is treated as terminal too.
    if let Some(next) = patch.status {
        let terminal = matches!(
            existing.status,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        );
        if terminal && next != existing.status {
            return Err(ClinicError::LockedStatus);
        }
    }

    if let Some(tt) = patch.treatment_type_id {
        if get_treatment_type(&tx, &tt)?.is_none() {
            return Err(ClinicError::TreatmentTypeNotFound);
        }
    }

    let effective_patient = patch.patient_id.or(existing.patient_id);
    let next_status = patch.status.unwrap_or(existing.status);
    if patch.status == Some(AppointmentStatus::Completed) && effective_patient.is_none() {
        return Err(ClinicError::PatientRequiredForCompletion);
    }

    let updated = Appointment {
        id: existing.id,
        patient_id: effective_patient,
        treatment_type_id: patch.treatment_type_id.unwrap_or(existing.treatment_type_id),
        date: patch.date.unwrap_or(existing.date),
        time: patch.time.unwrap_or(existing.time),
        status: next_status,
        notes: patch.notes.or(existing.notes),
        payroll_deduction_months: patch
            .payroll_deduction_months
            .or(existing.payroll_deduction_months),
        payroll_deduction_amount: patch
            .payroll_deduction_amount
            .or(existing.payroll_deduction_amount),
    };

    let completing = next_status == AppointmentStatus::Completed
        && existing.status != AppointmentStatus::Completed;
    if completing {
        let Some(patient_id) = effective_patient else {
            return Err(ClinicError::PatientRequiredForCompletion);
        };
        let patient = get_patient(&tx, &patient_id)?.ok_or(ClinicError::PatientNotFound)?;
        if patient.has_payroll_deduction {
            payroll::validate_deduction(
                updated.payroll_deduction_months,
                updated.payroll_deduction_amount,
            )?;
        }
        link_completion(&tx, &updated, &patient_id)?;
    }

    update_appointment(&tx, &updated)?;
    tx.commit().map_err(DatabaseError::from)?;

    if completing {
        tracing::debug!(id = %updated.id, "appointment completed");
    }
    Ok(updated)
}

pub fn remove(conn: &Connection, id: &Uuid) -> Result<(), ClinicError> {
    get_appointment(conn, id)?.ok_or(ClinicError::AppointmentNotFound)?;
    // Linked clinical record entries stay: they are historical clinical
    // data, independent of the scheduling row once created.
    delete_appointment(conn, id)?;
    tracing::debug!(id = %id, "appointment deleted");
    Ok(())
}

pub fn by_id(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    get_appointment(conn, id)?.ok_or(ClinicError::AppointmentNotFound)
}

pub fn list(
    conn: &Connection,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<Appointment>, ClinicError> {
    Ok(list_appointments(conn, range)?)
}

/// Get-or-create the patient's clinical record and file the entry for this
/// appointment. Idempotent per appointment id.
fn link_completion(
    conn: &Connection,
    appt: &Appointment,
    patient_id: &Uuid,
) -> Result<(), ClinicError> {
    let record = records::ensure_record(conn, patient_id)?;
    records::ensure_entry_for_appointment(
        conn,
        &appt.id,
        &record.id,
        &appt.treatment_type_id,
        appt.date,
        appt.notes.as_deref().unwrap_or(""),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{
        get_entry_by_appointment, get_record_by_patient, insert_patient, insert_treatment_type,
        list_entries_for_record,
    };
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Patient, TreatmentType};

    fn seed_patient(conn: &Connection, payroll: bool) -> Uuid {
        let id = Uuid::new_v4();
        insert_patient(conn, &Patient {
            id,
            first_name: "Iva".into(),
            last_name: "Maric".into(),
            phone: "555-0100".into(),
            email: format!("{id}@example.com"),
            address: None,
            date_of_birth: NaiveDate::from_ymd_opt(1985, 7, 12).unwrap(),
            has_payroll_deduction: payroll,
            company_name: payroll.then(|| "Acme d.o.o.".to_string()),
        }).unwrap();
        id
    }

    fn seed_treatment(conn: &Connection) -> Uuid {
        let id = Uuid::new_v4();
        insert_treatment_type(conn, &TreatmentType { id, label: format!("T-{id}") }).unwrap();
        id
    }

    fn scheduled_input(patient: Option<Uuid>, treatment: Uuid) -> NewAppointment {
        NewAppointment {
            patient_id: patient,
            treatment_type_id: treatment,
            date: NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            payroll_deduction_months: None,
            payroll_deduction_amount: None,
        }
    }

    fn count_appointments(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM appointments", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn completed_create_without_patient_is_rejected_and_writes_nothing() {
        let conn = open_memory_database().unwrap();
        let tt = seed_treatment(&conn);
        let input = NewAppointment {
            status: AppointmentStatus::Completed,
            ..scheduled_input(None, tt)
        };
        assert!(matches!(
            create(&conn, input),
            Err(ClinicError::PatientRequiredForCompletion)
        ));
        assert_eq!(count_appointments(&conn), 0);
    }

    #[test]
    fn misaligned_slot_time_is_rejected() {
        let conn = open_memory_database().unwrap();
        let tt = seed_treatment(&conn);
        let input = NewAppointment {
            time: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            ..scheduled_input(None, tt)
        };
        assert!(matches!(create(&conn, input), Err(ClinicError::InvalidTimeSlot)));
    }

    #[test]
    fn completing_on_create_files_a_record_entry() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, false);
        let tt = seed_treatment(&conn);
        let input = NewAppointment {
            status: AppointmentStatus::Completed,
            notes: Some("two fillings".into()),
            ..scheduled_input(Some(pid), tt)
        };
        let appt = create(&conn, input).unwrap();

        let record = get_record_by_patient(&conn, &pid).unwrap().unwrap();
        let entry = get_entry_by_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(entry.clinical_record_id, record.id);
        assert_eq!(entry.doctor_report, "two fillings");
        assert_eq!(entry.date, appt.date);
    }

    #[test]
    fn payroll_patient_without_months_rolls_back_everything() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, true);
        let tt = seed_treatment(&conn);
        let input = NewAppointment {
            status: AppointmentStatus::Completed,
            payroll_deduction_months: None,
            payroll_deduction_amount: Some(600.0),
            ..scheduled_input(Some(pid), tt)
        };
        assert!(matches!(
            create(&conn, input),
            Err(ClinicError::PayrollMonthsRequired)
        ));
        assert_eq!(count_appointments(&conn), 0);
        assert!(get_record_by_patient(&conn, &pid).unwrap().is_none());
    }

    #[test]
    fn completed_status_is_locked() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, false);
        let tt = seed_treatment(&conn);
        let appt = create(&conn, NewAppointment {
            status: AppointmentStatus::Completed,
            ..scheduled_input(Some(pid), tt)
        }).unwrap();

        let result = update(&conn, &appt.id, AppointmentPatch {
            status: Some(AppointmentStatus::Scheduled),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClinicError::LockedStatus)));

        let stored = by_id(&conn, &appt.id).unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);
    }

    #[test]
    fn cancelled_is_terminal() {
        let conn = open_memory_database().unwrap();
        let tt = seed_treatment(&conn);
        let appt = create(&conn, scheduled_input(None, tt)).unwrap();
        update(&conn, &appt.id, AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        }).unwrap();

        let result = update(&conn, &appt.id, AppointmentPatch {
            status: Some(AppointmentStatus::Scheduled),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClinicError::LockedStatus)));
    }

    #[test]
    fn update_to_completed_without_patient_is_rejected() {
        let conn = open_memory_database().unwrap();
        let tt = seed_treatment(&conn);
        let appt = create(&conn, scheduled_input(None, tt)).unwrap();

        let result = update(&conn, &appt.id, AppointmentPatch {
            status: Some(AppointmentStatus::Completed),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClinicError::PatientRequiredForCompletion)));
    }

    #[test]
    fn completing_twice_creates_exactly_one_entry() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, false);
        let tt = seed_treatment(&conn);
        let appt = create(&conn, scheduled_input(Some(pid), tt)).unwrap();

        let complete = AppointmentPatch {
            status: Some(AppointmentStatus::Completed),
            ..Default::default()
        };
        update(&conn, &appt.id, complete.clone()).unwrap();
        update(&conn, &appt.id, complete).unwrap();

        let record = get_record_by_patient(&conn, &pid).unwrap().unwrap();
        assert_eq!(list_entries_for_record(&conn, &record.id).unwrap().len(), 1);
    }

    #[test]
    fn update_uses_patch_payroll_values_with_fallback_to_existing() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, true);
        let tt = seed_treatment(&conn);
        let appt = create(&conn, NewAppointment {
            payroll_deduction_months: Some(6),
            ..scheduled_input(Some(pid), tt)
        }).unwrap();

        // Months come from the stored row, amount from the patch.
        let updated = update(&conn, &appt.id, AppointmentPatch {
            status: Some(AppointmentStatus::Completed),
            payroll_deduction_amount: Some(600.0),
            ..Default::default()
        }).unwrap();
        assert_eq!(updated.payroll_deduction_months, Some(6));
        assert_eq!(updated.payroll_deduction_amount, Some(600.0));
    }

    #[test]
    fn failed_completion_update_leaves_status_unchanged() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, true);
        let tt = seed_treatment(&conn);
        let appt = create(&conn, scheduled_input(Some(pid), tt)).unwrap();

        let result = update(&conn, &appt.id, AppointmentPatch {
            status: Some(AppointmentStatus::Completed),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClinicError::PayrollMonthsRequired)));

        let stored = by_id(&conn, &appt.id).unwrap();
        assert_eq!(stored.status, AppointmentStatus::Scheduled);
        assert!(get_entry_by_appointment(&conn, &appt.id).unwrap().is_none());
    }

    #[test]
    fn remove_keeps_linked_record_entries() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, false);
        let tt = seed_treatment(&conn);
        let appt = create(&conn, NewAppointment {
            status: AppointmentStatus::Completed,
            ..scheduled_input(Some(pid), tt)
        }).unwrap();

        remove(&conn, &appt.id).unwrap();
        assert!(matches!(by_id(&conn, &appt.id), Err(ClinicError::AppointmentNotFound)));

        let record = get_record_by_patient(&conn, &pid).unwrap().unwrap();
        assert_eq!(list_entries_for_record(&conn, &record.id).unwrap().len(), 1);
    }

    #[test]
    fn remove_missing_appointment_fails() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            remove(&conn, &Uuid::new_v4()),
            Err(ClinicError::AppointmentNotFound)
        ));
    }
}
