use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::PriceListItem;

pub fn insert_price_item(conn: &Connection, item: &PriceListItem) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO price_list_items (id, treatment_type_id, price) VALUES (?1, ?2, ?3)",
        params![item.id.to_string(), item.treatment_type_id.to_string(), item.price],
    )?;
    Ok(())
}

pub fn get_price_item(conn: &Connection, id: &Uuid) -> Result<Option<PriceListItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, treatment_type_id, price FROM price_list_items WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id.to_string()], price_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn get_price_for_type(
    conn: &Connection,
    treatment_type_id: &Uuid,
) -> Result<Option<PriceListItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, treatment_type_id, price FROM price_list_items WHERE treatment_type_id = ?1",
    )?;
    let mut rows = stmt.query_map(params![treatment_type_id.to_string()], price_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Full price catalog, one row per priced treatment type.
pub fn list_price_items(conn: &Connection) -> Result<Vec<PriceListItem>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, treatment_type_id, price FROM price_list_items")?;
    let rows = stmt.query_map([], price_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_price_item(conn: &Connection, id: &Uuid, price: f64) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE price_list_items SET price = ?2 WHERE id = ?1",
        params![id.to_string(), price],
    )?;
    Ok(())
}

pub fn delete_price_item(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM price_list_items WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

fn price_from_row(row: &rusqlite::Row<'_>) -> Result<PriceListItem, rusqlite::Error> {
    let id: String = row.get(0)?;
    let tt: String = row.get(1)?;
    Ok(PriceListItem {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        treatment_type_id: Uuid::parse_str(&tt).unwrap_or_default(),
        price: row.get(2)?,
    })
}
