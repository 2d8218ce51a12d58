//! Repository layer — entity-scoped database operations.
//!
//! Free functions over `&Connection` so service code can run several of
//! them inside one transaction.

mod appointment;
mod clinical_record;
mod patient;
mod price_list;
mod report;
mod treatment_type;

pub use appointment::*;
pub use clinical_record::*;
pub use patient::*;
pub use price_list::*;
pub use report::*;
pub use treatment_type::*;
