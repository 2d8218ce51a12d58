//! Business-rule error taxonomy.
//!
//! Every rule violation is a distinct variant so boundary layers can map
//! kinds to response codes without matching on message strings. Unexpected
//! storage failures stay opaque behind `Database`.

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Treatment type not found")]
    TreatmentTypeNotFound,

    #[error("Price list item not found")]
    PriceItemNotFound,

    #[error("Report not found")]
    ReportNotFound,

    #[error("Clinical record entry not found")]
    RecordEntryNotFound,

    #[error("A patient with this email already exists")]
    EmailAlreadyExists,

    #[error("Treatment type already exists")]
    TreatmentTypeAlreadyExists,

    #[error("Price for this treatment type already exists")]
    PriceAlreadyExists,

    #[error("Company name is required for payroll deduction")]
    CompanyNameRequired,

    #[error("Cannot change status of a completed appointment")]
    LockedStatus,

    #[error("Patient is required to mark appointment as completed")]
    PatientRequiredForCompletion,

    #[error("Payroll deduction months required for this patient")]
    PayrollMonthsRequired,

    #[error("Payroll deduction amount is required and must be a positive number")]
    PayrollAmountRequired,

    #[error("Invalid report type: {0}")]
    InvalidReportType(String),

    #[error("Appointment time must fall on a 30-minute slot")]
    InvalidTimeSlot,

    #[error("Price must be a positive amount")]
    InvalidPrice,

    #[error("Cannot delete treatment type used in {0}")]
    TreatmentTypeInUse(&'static str),
}
