//! Price catalog.
//!
//! At most one price per treatment type; a type without a price is a valid
//! state, not an error — period reports surface it as `price_exists = false`.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{
    delete_price_item, get_price_for_type, get_price_item, get_treatment_type, insert_price_item,
    list_price_items, treatment_label_map, update_price_item,
};
use crate::error::ClinicError;
use crate::models::PriceListItem;

/// Catalog row joined with its treatment label for listing.
#[derive(Debug, Clone, Serialize)]
pub struct PriceCatalogItem {
    pub id: Uuid,
    pub treatment_type_id: Uuid,
    pub treatment_label: String,
    pub price: f64,
}

fn ensure_positive(price: f64) -> Result<(), ClinicError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ClinicError::InvalidPrice);
    }
    Ok(())
}

pub fn create(
    conn: &Connection,
    treatment_type_id: &Uuid,
    price: f64,
) -> Result<PriceListItem, ClinicError> {
    ensure_positive(price)?;
    if get_treatment_type(conn, treatment_type_id)?.is_none() {
        return Err(ClinicError::TreatmentTypeNotFound);
    }
    if get_price_for_type(conn, treatment_type_id)?.is_some() {
        return Err(ClinicError::PriceAlreadyExists);
    }
    let item = PriceListItem {
        id: Uuid::new_v4(),
        treatment_type_id: *treatment_type_id,
        price,
    };
    insert_price_item(conn, &item)?;
    Ok(item)
}

pub fn update(conn: &Connection, id: &Uuid, price: f64) -> Result<PriceListItem, ClinicError> {
    ensure_positive(price)?;
    let existing = get_price_item(conn, id)?.ok_or(ClinicError::PriceItemNotFound)?;
    update_price_item(conn, id, price)?;
    Ok(PriceListItem { price, ..existing })
}

pub fn remove(conn: &Connection, id: &Uuid) -> Result<(), ClinicError> {
    get_price_item(conn, id)?.ok_or(ClinicError::PriceItemNotFound)?;
    delete_price_item(conn, id)?;
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<PriceCatalogItem>, ClinicError> {
    let labels = treatment_label_map(conn)?;
    let items = list_price_items(conn)?;
    Ok(items
        .into_iter()
        .map(|item| PriceCatalogItem {
            id: item.id,
            treatment_type_id: item.treatment_type_id,
            treatment_label: labels
                .get(&item.treatment_type_id)
                .cloned()
                .unwrap_or_default(),
            price: item.price,
        })
        .collect())
}
