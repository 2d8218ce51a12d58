use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Option<Uuid>,
    pub treatment_type_id: Uuid,
    pub date: NaiveDate,
    /// Slot start time; must fall on a 30-minute boundary.
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub payroll_deduction_months: Option<i32>,
    pub payroll_deduction_amount: Option<f64>,
}
