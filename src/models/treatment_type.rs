use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentType {
    pub id: Uuid,
    pub label: String,
}
