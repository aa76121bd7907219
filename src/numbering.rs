//! Sequential document numbers such as `JE-000042`, `PAY-000007` or `SO-2024-0003`.

use crate::error::ValidationError;
use regex::Regex;

pub const JOURNAL_PREFIX: &str = "JE";
pub const PAYMENT_PREFIX: &str = "PAY";
pub const SEQUENCE_WIDTH: usize = 6;
pub const SALES_ORDER_WIDTH: usize = 4;

/// Next number after the highest numeric suffix among `existing` that carry `prefix`.
///
/// Numbers with a foreign prefix or a non-numeric suffix are ignored, so manually
/// entered numbers such as `JE-OPENING` never break the sequence.
pub fn next_document_number<I, S>(
    prefix: &str,
    existing: I,
    width: usize,
) -> Result<String, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if prefix.is_empty() {
        return Err(ValidationError::new("document prefix must not be empty"));
    }
    let pattern = Regex::new(&format!(r"^{}-(\d+)$", regex::escape(prefix)))
        .map_err(|e| ValidationError::new(format!("invalid document prefix {prefix:?}: {e}")))?;

    let highest = existing
        .into_iter()
        .filter_map(|number| {
            pattern
                .captures(number.as_ref())
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
        })
        .max()
        .unwrap_or(0);

    Ok(format!("{prefix}-{:0width$}", highest + 1, width = width))
}

pub fn sales_order_prefix(year: i32) -> String {
    format!("SO-{year}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number() {
        let none: [&str; 0] = [];
        assert_eq!(
            next_document_number(JOURNAL_PREFIX, none, SEQUENCE_WIDTH).unwrap(),
            "JE-000001"
        );
    }

    #[test]
    fn test_unpadded_payment_numbers_continue_padded() {
        let existing = ["PAY-7", "PAY-12", "PAY-000003"];
        assert_eq!(
            next_document_number(PAYMENT_PREFIX, existing, SEQUENCE_WIDTH).unwrap(),
            "PAY-000013"
        );
    }

    #[test]
    fn test_skips_foreign_and_manual_numbers() {
        let existing = ["JE-000009", "JE-000010", "JE-OPENING", "PAY-000500", "JEX-000900"];
        assert_eq!(
            next_document_number(JOURNAL_PREFIX, existing, SEQUENCE_WIDTH).unwrap(),
            "JE-000011"
        );
    }

    #[test]
    fn test_sales_order_numbers_are_per_year() {
        let existing = ["SO-2023-0041", "SO-2024-0002"];
        let prefix = sales_order_prefix(2024);
        assert_eq!(
            next_document_number(&prefix, existing, SALES_ORDER_WIDTH).unwrap(),
            "SO-2024-0003"
        );
        let prefix = sales_order_prefix(2025);
        assert_eq!(
            next_document_number(&prefix, existing, SALES_ORDER_WIDTH).unwrap(),
            "SO-2025-0001"
        );
    }

    #[test]
    fn test_width_overflow_keeps_digits() {
        assert_eq!(
            next_document_number("PAY", ["PAY-999999"], SEQUENCE_WIDTH).unwrap(),
            "PAY-1000000"
        );
    }

    #[test]
    fn test_empty_prefix_rejected() {
        assert!(next_document_number("", ["X-1"], 3).is_err());
    }
}
