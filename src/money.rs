//! Decimal helpers shared by ledger, sales and payroll arithmetic.
//!
//! Rounding is banker's rounding (`round_dp`), matching NUMERIC quantization.

use crate::error::ValidationError;
use rust_decimal::Decimal;

/// Ledger and payment amounts
pub const CURRENCY_SCALE: u32 = 2;
/// Sales document amounts
pub const DOCUMENT_SCALE: u32 = 6;

pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp(CURRENCY_SCALE)
}

pub fn round_document(amount: Decimal) -> Decimal {
    amount.round_dp(DOCUMENT_SCALE)
}

/// `percent` of `base`, e.g. `percentage_of(50000, 10) == 5000`
pub fn percentage_of(base: Decimal, percent: Decimal) -> Decimal {
    base * percent / Decimal::ONE_HUNDRED
}

/// `|left - right| < tolerance`
pub fn within_tolerance(left: Decimal, right: Decimal, tolerance: Decimal) -> bool {
    (left - right).abs() < tolerance
}

/// Normalizes and checks an ISO-4217 style code (three ASCII letters).
pub fn currency_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ValidationError::field(
            "currency",
            format!("{code:?} is not a three-letter currency code"),
        ))
    }
}

pub fn non_negative(field: &'static str, amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(ValidationError::field(field, "must not be negative"))
    } else {
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_rounding_is_bankers() {
        assert_eq!(round_currency(d("2.345")), d("2.34"));
        assert_eq!(round_currency(d("2.355")), d("2.36"));
        assert_eq!(round_document(d("1.0000005")), d("1.000000"));
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(d("50000"), d("10")), d("5000"));
        assert_eq!(percentage_of(d("55000"), d("5")), d("2750"));
    }

    #[test]
    fn test_within_tolerance_is_strict() {
        let tol = d("0.01");
        assert!(within_tolerance(d("15000.00"), d("15000.00"), tol));
        assert!(within_tolerance(d("15000.00"), d("14999.995"), tol));
        assert!(!within_tolerance(d("15000.00"), d("14999.99"), tol));
        assert!(!within_tolerance(d("15000.00"), d("14999.98"), tol));
        assert!(!within_tolerance(d("15000.00"), d("14998.00"), tol));
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(currency_code(" usd ").unwrap(), "USD");
        assert!(currency_code("US").is_err());
        assert!(currency_code("U5D").is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(non_negative("amount", d("-0.01")).is_err());
        assert!(non_negative("amount", d("0")).is_ok());
        assert!(non_negative("amount", d("-0")).is_ok());
    }
}
