use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReportType;

/// An immutable financial snapshot. Rows are created by the report
/// generator and only ever deleted as a whole, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub report_type: ReportType,
    /// Reference date the report was generated for.
    pub date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: f64,
    pub payload: ReportPayload,
    /// Company filter, payroll reports only.
    pub company_name: Option<String>,
}

/// Report body, one concrete shape per report type. Serialized to JSON in
/// the `data` column; the tag keeps the column self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPayload {
    Period { groups: Vec<TreatmentGroupSummary> },
    Payroll { entries: Vec<PayrollReportEntry> },
}

/// Revenue summary for one treatment type within a period report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentGroupSummary {
    pub treatment_type: String,
    pub count: u32,
    /// Catalog price at generation time; None when the type had no price.
    pub price: Option<f64>,
    pub total: f64,
    pub price_exists: bool,
}

/// One active payroll deduction in an amortization snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollReportEntry {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub company_name: Option<String>,
    pub examination_date: NaiveDate,
    pub treatment_type: String,
    pub total_amount: f64,
    pub monthly_rate: f64,
    pub months_passed: i64,
    pub paid_amount: f64,
    pub remaining_months: i64,
    pub total_months: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_tag_survives_json_round_trip() {
        let payload = ReportPayload::Period {
            groups: vec![TreatmentGroupSummary {
                treatment_type: "Cleaning".into(),
                count: 2,
                price: Some(20.0),
                total: 40.0,
                price_exists: true,
            }],
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"kind\":\"period\""));
        let back: ReportPayload = serde_json::from_str(&json).unwrap();
        match back {
            ReportPayload::Period { groups } => {
                assert_eq!(groups.len(), 1);
                assert_eq!(groups[0].count, 2);
            }
            _ => panic!("wrong payload variant"),
        }
    }
}
