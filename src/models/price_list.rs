use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most one price per treatment type; a type with no price is a valid state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceListItem {
    pub id: Uuid,
    pub treatment_type_id: Uuid,
    pub price: f64,
}
