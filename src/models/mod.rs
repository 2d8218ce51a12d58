pub mod appointment;
pub mod clinical_record;
pub mod enums;
pub mod patient;
pub mod price_list;
pub mod report;
pub mod treatment_type;

pub use appointment::*;
pub use clinical_record::*;
pub use enums::*;
pub use patient::*;
pub use price_list::*;
pub use report::*;
pub use treatment_type::*;
