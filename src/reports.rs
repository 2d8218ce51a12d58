//! Financial report generation.
//!
//! Two shapes: period revenue summaries (daily / weekly / monthly) grouping
//! completed appointments by treatment type against the price catalog, and
//! payroll amortization snapshots listing the deductions still being paid
//! off at the reference date. Each generation persists exactly one
//! immutable report row.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::repository::{
    completed_appointments_between, delete_report, get_report, insert_report, list_price_items,
    list_reports, payroll_candidates, treatment_label_map,
};
use crate::error::ClinicError;
use crate::models::enums::ReportType;
use crate::models::{PayrollReportEntry, Report, ReportPayload, TreatmentGroupSummary};

/// Parse a report type from the boundary layer, mapping unknown strings to
/// a business-rule error instead of a storage one.
pub fn parse_report_type(s: &str) -> Result<ReportType, ClinicError> {
    s.parse()
        .map_err(|_| ClinicError::InvalidReportType(s.to_string()))
}

/// Inclusive calendar range a period report covers. Weeks run Monday–Sunday.
pub fn period_bounds(report_type: ReportType, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    match report_type {
        ReportType::Daily => (reference, reference),
        ReportType::Weekly => {
            let monday = reference
                - Days::new(reference.weekday().num_days_from_monday() as u64);
            (monday, monday + Days::new(6))
        }
        ReportType::Monthly => {
            let first = reference.with_day(1).unwrap_or(reference);
            let next_month = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            };
            let last = next_month
                .map(|d| d - Days::new(1))
                .unwrap_or(reference);
            (first, last)
        }
        // Payroll snapshots are a point in time, not a range.
        ReportType::PayrollDeduction => (reference, reference),
    }
}

/// Whole calendar months elapsed from `from` to `to`, clamped at zero.
/// A month counts only once the day-of-month has been reached again.
pub fn whole_months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let mut months = (to.year() as i64 - from.year() as i64) * 12
        + (to.month() as i64 - from.month() as i64);
    if months > 0 && to.day() < from.day() {
        months -= 1;
    }
    months.max(0)
}

pub fn create(
    conn: &Connection,
    clock: &dyn Clock,
    report_type: ReportType,
    date: Option<NaiveDate>,
    company_name: Option<String>,
) -> Result<Report, ClinicError> {
    let reference = date.unwrap_or_else(|| clock.today());
    let report = match report_type {
        ReportType::PayrollDeduction => payroll_report(conn, reference, company_name)?,
        period => period_report(conn, period, reference)?,
    };
    insert_report(conn, &report)?;
    tracing::info!(
        id = %report.id,
        report_type = report.report_type.as_str(),
        total = report.total_amount,
        "report generated"
    );
    Ok(report)
}

pub fn remove(conn: &Connection, id: &Uuid) -> Result<(), ClinicError> {
    get_report(conn, id)?.ok_or(ClinicError::ReportNotFound)?;
    delete_report(conn, id)?;
    Ok(())
}

pub fn by_id(conn: &Connection, id: &Uuid) -> Result<Report, ClinicError> {
    get_report(conn, id)?.ok_or(ClinicError::ReportNotFound)
}

/// Stored reports, newest first, optionally filtered by type.
pub fn list(conn: &Connection, type_filter: Option<ReportType>) -> Result<Vec<Report>, ClinicError> {
    Ok(list_reports(conn, type_filter)?)
}

fn period_report(
    conn: &Connection,
    report_type: ReportType,
    reference: NaiveDate,
) -> Result<Report, ClinicError> {
    let (start, end) = period_bounds(report_type, reference);
    let appointments = completed_appointments_between(conn, start, end)?;
    let labels = treatment_label_map(conn)?;
    let prices: HashMap<Uuid, f64> = list_price_items(conn)?
        .into_iter()
        .map(|item| (item.treatment_type_id, item.price))
        .collect();

    // Groups keep encounter order; a type without a price still shows up,
    // contributing zero to the totals.
    let mut groups: Vec<TreatmentGroupSummary> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut total_amount = 0.0;

    for appt in &appointments {
        let price = prices.get(&appt.treatment_type_id).copied();
        let slot = *index.entry(appt.treatment_type_id).or_insert_with(|| {
            groups.push(TreatmentGroupSummary {
                treatment_type: labels
                    .get(&appt.treatment_type_id)
                    .cloned()
                    .unwrap_or_default(),
                count: 0,
                price,
                total: 0.0,
                price_exists: price.is_some(),
            });
            groups.len() - 1
        });
        groups[slot].count += 1;
        groups[slot].total += price.unwrap_or(0.0);
        total_amount += price.unwrap_or(0.0);
    }

    Ok(Report {
        id: Uuid::new_v4(),
        report_type,
        date: reference,
        start_date: start,
        end_date: end,
        total_amount,
        payload: ReportPayload::Period { groups },
        company_name: None,
    })
}

fn payroll_report(
    conn: &Connection,
    reference: NaiveDate,
    company_filter: Option<String>,
) -> Result<Report, ClinicError> {
    let candidates = payroll_candidates(conn, reference)?;
    let labels = treatment_label_map(conn)?;

    let mut entries: Vec<PayrollReportEntry> = Vec::new();
    // "Amount due this period": the sum of monthly rates of active
    // deductions, not the outstanding balance.
    let mut total_amount = 0.0;

    for candidate in candidates {
        let appt = candidate.appointment;
        let Some(months) = appt.payroll_deduction_months.filter(|m| *m >= 1) else {
            continue;
        };
        let Some(patient_id) = appt.patient_id else {
            continue;
        };
        if let Some(filter) = &company_filter {
            if candidate.company_name.as_deref() != Some(filter.as_str()) {
                continue;
            }
        }

        let amount = appt.payroll_deduction_amount.unwrap_or(0.0);
        let monthly_rate = amount / f64::from(months);
        let months_passed = whole_months_between(appt.date, reference);
        let paid_amount = (monthly_rate * months_passed as f64).min(amount);
        let remaining_months = i64::from(months) - months_passed;

        // Fully amortized deductions are no longer active.
        if remaining_months <= 0 {
            continue;
        }

        entries.push(PayrollReportEntry {
            patient_id,
            patient_name: candidate.patient_name,
            company_name: candidate.company_name,
            examination_date: appt.date,
            treatment_type: labels
                .get(&appt.treatment_type_id)
                .cloned()
                .unwrap_or_default(),
            total_amount: amount,
            monthly_rate,
            months_passed,
            paid_amount,
            remaining_months,
            total_months: months,
        });
        total_amount += monthly_rate;
    }

    Ok(Report {
        id: Uuid::new_v4(),
        report_type: ReportType::PayrollDeduction,
        date: reference,
        start_date: reference,
        end_date: reference,
        total_amount,
        payload: ReportPayload::Payroll { entries },
        company_name: company_filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::{self, NewAppointment};
    use crate::clock::FixedClock;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::AppointmentStatus;
    use crate::patients::{self, NewPatient};
    use crate::pricing;
    use crate::treatments;
    use chrono::NaiveTime;

    fn seed_patient(conn: &Connection, company: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        patients::create(conn, NewPatient {
            first_name: "Marta".into(),
            last_name: "Vidic".into(),
            phone: "555-0104".into(),
            email: format!("{id}@example.com"),
            address: None,
            date_of_birth: NaiveDate::from_ymd_opt(1983, 5, 9).unwrap(),
            has_payroll_deduction: company.is_some(),
            company_name: company.map(str::to_string),
        })
        .unwrap()
        .id
    }

    fn completed(
        conn: &Connection,
        patient: Uuid,
        treatment: Uuid,
        date: NaiveDate,
        payroll: Option<(i32, f64)>,
    ) {
        appointments::create(conn, NewAppointment {
            patient_id: Some(patient),
            treatment_type_id: treatment,
            date,
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status: AppointmentStatus::Completed,
            notes: None,
            payroll_deduction_months: payroll.map(|(m, _)| m),
            payroll_deduction_amount: payroll.map(|(_, a)| a),
        })
        .unwrap();
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_bounds_run_monday_to_sunday() {
        // 2025-06-11 is a Wednesday.
        let (start, end) = period_bounds(ReportType::Weekly, d(2025, 6, 11));
        assert_eq!(start, d(2025, 6, 9));
        assert_eq!(end, d(2025, 6, 15));

        // A Monday is its own week start.
        let (start, end) = period_bounds(ReportType::Weekly, d(2025, 6, 9));
        assert_eq!(start, d(2025, 6, 9));
        assert_eq!(end, d(2025, 6, 15));
    }

    #[test]
    fn monthly_bounds_cover_the_calendar_month() {
        let (start, end) = period_bounds(ReportType::Monthly, d(2025, 2, 14));
        assert_eq!(start, d(2025, 2, 1));
        assert_eq!(end, d(2025, 2, 28));

        let (start, end) = period_bounds(ReportType::Monthly, d(2024, 12, 31));
        assert_eq!(start, d(2024, 12, 1));
        assert_eq!(end, d(2024, 12, 31));
    }

    #[test]
    fn whole_months_counts_completed_months_only() {
        assert_eq!(whole_months_between(d(2025, 1, 10), d(2025, 6, 10)), 5);
        assert_eq!(whole_months_between(d(2025, 1, 10), d(2025, 6, 9)), 4);
        assert_eq!(whole_months_between(d(2025, 1, 10), d(2025, 1, 25)), 0);
        assert_eq!(whole_months_between(d(2024, 11, 5), d(2025, 1, 5)), 2);
        // Same day is zero, and the clamp never goes negative.
        assert_eq!(whole_months_between(d(2025, 3, 1), d(2025, 3, 1)), 0);
    }

    #[test]
    fn daily_report_groups_by_treatment_with_prices() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, None);
        let cleaning = treatments::create(&conn, "Cleaning").unwrap();
        let filling = treatments::create(&conn, "Filling").unwrap();
        pricing::create(&conn, &cleaning.id, 20.0).unwrap();
        pricing::create(&conn, &filling.id, 50.0).unwrap();

        let day = d(2025, 3, 10);
        completed(&conn, pid, cleaning.id, day, None);
        completed(&conn, pid, cleaning.id, day, None);
        completed(&conn, pid, filling.id, day, None);

        let clock = FixedClock(day);
        let report = create(&conn, &clock, ReportType::Daily, Some(day), None).unwrap();

        assert_eq!(report.total_amount, 90.0);
        let ReportPayload::Period { groups } = report.payload else {
            panic!("expected period payload");
        };
        assert_eq!(groups, vec![
            TreatmentGroupSummary {
                treatment_type: "Cleaning".into(),
                count: 2,
                price: Some(20.0),
                total: 40.0,
                price_exists: true,
            },
            TreatmentGroupSummary {
                treatment_type: "Filling".into(),
                count: 1,
                price: Some(50.0),
                total: 50.0,
                price_exists: true,
            },
        ]);
    }

    #[test]
    fn unpriced_treatment_still_appears_with_zero_total() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, None);
        let consult = treatments::create(&conn, "Consultation").unwrap();
        let day = d(2025, 3, 10);
        completed(&conn, pid, consult.id, day, None);

        let report =
            create(&conn, &FixedClock(day), ReportType::Daily, Some(day), None).unwrap();
        assert_eq!(report.total_amount, 0.0);
        let ReportPayload::Period { groups } = report.payload else {
            panic!("expected period payload");
        };
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].price_exists);
        assert_eq!(groups[0].price, None);
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].total, 0.0);
    }

    #[test]
    fn weekly_report_excludes_appointments_outside_the_week() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, None);
        let cleaning = treatments::create(&conn, "Cleaning").unwrap();
        pricing::create(&conn, &cleaning.id, 20.0).unwrap();

        // Week of 2025-06-09 .. 2025-06-15.
        completed(&conn, pid, cleaning.id, d(2025, 6, 9), None);
        completed(&conn, pid, cleaning.id, d(2025, 6, 15), None);
        completed(&conn, pid, cleaning.id, d(2025, 6, 16), None);

        let reference = d(2025, 6, 11);
        let report =
            create(&conn, &FixedClock(reference), ReportType::Weekly, Some(reference), None)
                .unwrap();
        assert_eq!(report.total_amount, 40.0);
        assert_eq!(report.start_date, d(2025, 6, 9));
        assert_eq!(report.end_date, d(2025, 6, 15));
    }

    #[test]
    fn payroll_snapshot_amortizes_active_deductions() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, Some("Acme d.o.o."));
        let crown = treatments::create(&conn, "Crown").unwrap();

        let reference = d(2025, 7, 1);
        // 5 whole months before the reference date, 600 over 6 months.
        completed(&conn, pid, crown.id, d(2025, 2, 1), Some((6, 600.0)));

        let report = create(
            &conn,
            &FixedClock(reference),
            ReportType::PayrollDeduction,
            Some(reference),
            None,
        )
        .unwrap();

        assert_eq!(report.total_amount, 100.0);
        let ReportPayload::Payroll { entries } = report.payload else {
            panic!("expected payroll payload");
        };
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.monthly_rate, 100.0);
        assert_eq!(entry.months_passed, 5);
        assert_eq!(entry.paid_amount, 500.0);
        assert_eq!(entry.remaining_months, 1);
        assert_eq!(entry.total_months, 6);
        assert_eq!(entry.company_name.as_deref(), Some("Acme d.o.o."));
        assert_eq!(entry.treatment_type, "Crown");
    }

    #[test]
    fn fully_amortized_deductions_are_excluded() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, Some("Acme d.o.o."));
        let crown = treatments::create(&conn, "Crown").unwrap();

        // 6 whole months passed on a 6-month plan: no longer active.
        completed(&conn, pid, crown.id, d(2025, 1, 1), Some((6, 600.0)));

        let reference = d(2025, 7, 1);
        let report = create(
            &conn,
            &FixedClock(reference),
            ReportType::PayrollDeduction,
            Some(reference),
            None,
        )
        .unwrap();

        assert_eq!(report.total_amount, 0.0);
        let ReportPayload::Payroll { entries } = report.payload else {
            panic!("expected payroll payload");
        };
        assert!(entries.is_empty());
    }

    #[test]
    fn company_filter_narrows_the_snapshot() {
        let conn = open_memory_database().unwrap();
        let acme = seed_patient(&conn, Some("Acme d.o.o."));
        let globex = seed_patient(&conn, Some("Globex"));
        let crown = treatments::create(&conn, "Crown").unwrap();

        completed(&conn, acme, crown.id, d(2025, 5, 1), Some((6, 600.0)));
        completed(&conn, globex, crown.id, d(2025, 5, 1), Some((12, 1200.0)));

        let reference = d(2025, 7, 1);
        let report = create(
            &conn,
            &FixedClock(reference),
            ReportType::PayrollDeduction,
            Some(reference),
            Some("Globex".into()),
        )
        .unwrap();

        assert_eq!(report.company_name.as_deref(), Some("Globex"));
        let ReportPayload::Payroll { entries } = report.payload else {
            panic!("expected payroll payload");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].company_name.as_deref(), Some("Globex"));
        assert_eq!(entries[0].monthly_rate, 100.0);
    }

    #[test]
    fn future_dated_deductions_are_not_selected() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn, Some("Acme d.o.o."));
        let crown = treatments::create(&conn, "Crown").unwrap();

        completed(&conn, pid, crown.id, d(2025, 9, 1), Some((6, 600.0)));

        let reference = d(2025, 7, 1);
        let report = create(
            &conn,
            &FixedClock(reference),
            ReportType::PayrollDeduction,
            Some(reference),
            None,
        )
        .unwrap();
        let ReportPayload::Payroll { entries } = report.payload else {
            panic!("expected payroll payload");
        };
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_reference_date_falls_back_to_the_clock() {
        let conn = open_memory_database().unwrap();
        let today = d(2025, 8, 24);
        let report =
            create(&conn, &FixedClock(today), ReportType::Daily, None, None).unwrap();
        assert_eq!(report.date, today);
        assert_eq!(report.start_date, today);
        assert_eq!(report.end_date, today);
    }

    #[test]
    fn reports_are_immutable_snapshots_listed_newest_first() {
        let conn = open_memory_database().unwrap();
        let day = d(2025, 3, 10);
        let clock = FixedClock(day);
        let daily = create(&conn, &clock, ReportType::Daily, Some(day), None).unwrap();
        let payroll =
            create(&conn, &clock, ReportType::PayrollDeduction, Some(day), None).unwrap();

        let all = list(&conn, None).unwrap();
        assert_eq!(all.len(), 2);

        let only_payroll = list(&conn, Some(ReportType::PayrollDeduction)).unwrap();
        assert_eq!(only_payroll.len(), 1);
        assert_eq!(only_payroll[0].id, payroll.id);

        remove(&conn, &daily.id).unwrap();
        assert!(matches!(remove(&conn, &daily.id), Err(ClinicError::ReportNotFound)));
        assert_eq!(list(&conn, None).unwrap().len(), 1);
    }

    #[test]
    fn unknown_report_type_string_is_a_business_error() {
        assert!(parse_report_type("daily").is_ok());
        assert!(parse_report_type("payrollDeduction").is_ok());
        assert!(matches!(
            parse_report_type("quarterly"),
            Err(ClinicError::InvalidReportType(_))
        ));
    }
}
