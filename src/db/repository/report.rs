use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::ReportType;
use crate::models::{Report, ReportPayload};

pub fn insert_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    let data = serde_json::to_string(&report.payload)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("report payload: {e}")))?;
    conn.execute(
        "INSERT INTO reports (id, type, date, start_date, end_date, total_amount, data, company_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            report.id.to_string(),
            report.report_type.as_str(),
            report.date.to_string(),
            report.start_date.to_string(),
            report.end_date.to_string(),
            report.total_amount,
            data,
            report.company_name,
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, type, date, start_date, end_date, total_amount, data, company_name
         FROM reports WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id.to_string()], |row| Ok(report_row(row)))?;
    match rows.next() {
        Some(row) => Ok(Some(report_from_row(row??)?)),
        None => Ok(None),
    }
}

/// Stored reports, newest first, optionally one type only.
pub fn list_reports(
    conn: &Connection,
    type_filter: Option<ReportType>,
) -> Result<Vec<Report>, DatabaseError> {
    let filter = type_filter.map(|t| t.as_str().to_string());
    let mut stmt = conn.prepare(
        "SELECT id, type, date, start_date, end_date, total_amount, data, company_name
         FROM reports WHERE (?1 IS NULL OR type = ?1) ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![filter], |row| Ok(report_row(row)))?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row??)?);
    }
    Ok(reports)
}

pub fn delete_report(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM reports WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

// Internal row type for Report mapping
struct ReportRow {
    id: String,
    report_type: String,
    date: String,
    start_date: String,
    end_date: String,
    total_amount: f64,
    data: String,
    company_name: Option<String>,
}

fn report_row(row: &rusqlite::Row<'_>) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        report_type: row.get(1)?,
        date: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        total_amount: row.get(5)?,
        data: row.get(6)?,
        company_name: row.get(7)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<Report, DatabaseError> {
    let payload: ReportPayload = serde_json::from_str(&row.data)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("report payload: {e}")))?;
    Ok(Report {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        report_type: ReportType::from_str(&row.report_type)?,
        date: parse_date(&row.date)?,
        start_date: parse_date(&row.start_date)?,
        end_date: parse_date(&row.end_date)?,
        total_amount: row.total_amount,
        payload,
        company_name: row.company_name,
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
