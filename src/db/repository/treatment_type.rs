use std::collections::HashMap;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::TreatmentType;

pub fn insert_treatment_type(conn: &Connection, tt: &TreatmentType) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatment_types (id, label) VALUES (?1, ?2)",
        params![tt.id.to_string(), tt.label],
    )?;
    Ok(())
}

pub fn get_treatment_type(conn: &Connection, id: &Uuid) -> Result<Option<TreatmentType>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, label FROM treatment_types WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id.to_string()], treatment_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

/// Case-insensitive label lookup; `exclude` skips one id so updates can
/// check uniqueness against everything but themselves.
pub fn find_treatment_type_by_label(
    conn: &Connection,
    label: &str,
    exclude: Option<&Uuid>,
) -> Result<Option<TreatmentType>, DatabaseError> {
    let excluded = exclude.map(|id| id.to_string()).unwrap_or_default();
    let mut stmt = conn.prepare(
        "SELECT id, label FROM treatment_types
         WHERE label = ?1 COLLATE NOCASE AND id != ?2",
    )?;
    let mut rows = stmt.query_map(params![label, excluded], treatment_from_row)?;
    rows.next().transpose().map_err(DatabaseError::from)
}

pub fn list_treatment_types(conn: &Connection) -> Result<Vec<TreatmentType>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, label FROM treatment_types ORDER BY label ASC")?;
    let rows = stmt.query_map([], treatment_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// id → label map for report grouping; loaded once per generation.
pub fn treatment_label_map(conn: &Connection) -> Result<HashMap<Uuid, String>, DatabaseError> {
    let mut map = HashMap::new();
    for tt in list_treatment_types(conn)? {
        map.insert(tt.id, tt.label);
    }
    Ok(map)
}

pub fn update_treatment_type(conn: &Connection, id: &Uuid, label: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE treatment_types SET label = ?2 WHERE id = ?1",
        params![id.to_string(), label],
    )?;
    Ok(())
}

pub fn delete_treatment_type(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM treatment_types WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

pub fn count_appointments_for_type(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE treatment_type_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_entries_for_type(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM clinical_record_entries WHERE treatment_type_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn treatment_from_row(row: &rusqlite::Row<'_>) -> Result<TreatmentType, rusqlite::Error> {
    let id: String = row.get(0)?;
    Ok(TreatmentType {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        label: row.get(1)?,
    })
}
