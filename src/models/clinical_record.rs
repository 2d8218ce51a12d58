use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One-per-patient container for treatment history entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
}

/// A single historical treatment note. `appointment_id` is set when the
/// entry was spawned by completing an appointment; at most one entry may
/// reference a given appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalRecordEntry {
    pub id: Uuid,
    pub clinical_record_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub treatment_type_id: Uuid,
    pub date: NaiveDate,
    pub doctor_report: String,
}
