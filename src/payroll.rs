//! Payroll deduction validation.
//!
//! Pure check of the deduction parameters supplied when completing an
//! appointment for a patient whose billing profile amortizes treatment
//! costs through their employer. No side effects.

use crate::error::ClinicError;

pub fn validate_deduction(months: Option<i32>, amount: Option<f64>) -> Result<(), ClinicError> {
    match months {
        Some(m) if m >= 1 => {}
        _ => return Err(ClinicError::PayrollMonthsRequired),
    }
    match amount {
        Some(a) if a.is_finite() && a > 0.0 => {}
        _ => return Err(ClinicError::PayrollAmountRequired),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_deduction() {
        assert!(validate_deduction(Some(6), Some(600.0)).is_ok());
        assert!(validate_deduction(Some(1), Some(0.01)).is_ok());
    }

    #[test]
    fn missing_or_low_months_rejected() {
        assert!(matches!(
            validate_deduction(None, Some(100.0)),
            Err(ClinicError::PayrollMonthsRequired)
        ));
        assert!(matches!(
            validate_deduction(Some(0), Some(100.0)),
            Err(ClinicError::PayrollMonthsRequired)
        ));
        assert!(matches!(
            validate_deduction(Some(-3), Some(100.0)),
            Err(ClinicError::PayrollMonthsRequired)
        ));
    }

    #[test]
    fn missing_zero_or_non_finite_amount_rejected() {
        for amount in [None, Some(0.0), Some(-50.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert!(matches!(
                validate_deduction(Some(6), amount),
                Err(ClinicError::PayrollAmountRequired)
            ));
        }
    }

    #[test]
    fn months_checked_before_amount() {
        assert!(matches!(
            validate_deduction(None, None),
            Err(ClinicError::PayrollMonthsRequired)
        ));
    }
}
