//! Human-readable order numbers for externally created ERP orders.
//!
//! Format: `<prefix>-<YYYYMMDD>-N<4 digits>`, e.g. `EXTERN-20261019-N0421`.
//! The prefix marks the order as created outside the ERP client.

use chrono::NaiveDate;

use crate::constants::ORDER_NUMBER_SUFFIX_MARKER;

/// Builds an order number from its parts. `suffix` is reduced modulo 10 000.
#[must_use]
pub fn format_order_number(prefix: &str, date: NaiveDate, suffix: u16) -> String {
    format!(
        "{prefix}-{}-{ORDER_NUMBER_SUFFIX_MARKER}{:04}",
        date.format("%Y%m%d"),
        suffix % 10_000
    )
}

/// Returns true when `value` has the shape produced by [`format_order_number`].
#[must_use]
pub fn is_order_number(prefix: &str, value: &str) -> bool {
    let Some(rest) = value.strip_prefix(prefix).and_then(|r| r.strip_prefix('-')) else {
        return false;
    };
    let Some((date, suffix)) = rest.split_once('-') else {
        return false;
    };
    let Some(digits) = suffix.strip_prefix(ORDER_NUMBER_SUFFIX_MARKER) else {
        return false;
    };

    NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
        && date.len() == 8
        && digits.len() == 4
        && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn pads_suffix_to_four_digits() {
        assert_eq!(format_order_number("EXTERN", date(), 7), "EXTERN-20261019-N0007");
        assert_eq!(format_order_number("EXTERN", date(), 9999), "EXTERN-20261019-N9999");
    }

    #[test]
    fn suffix_wraps_at_ten_thousand() {
        assert_eq!(format_order_number("CRM", date(), 10_042), "CRM-20261019-N0042");
    }

    #[test]
    fn recognizes_generated_numbers_only() {
        assert!(is_order_number("EXTERN", "EXTERN-20261019-N0421"));
        assert!(!is_order_number("EXTERN", "EXTERN-20261019-0421"));
        assert!(!is_order_number("EXTERN", "EXTERN-20261319-N0421"));
        assert!(!is_order_number("EXTERN", "EXTERN-20261019-N42"));
        assert!(!is_order_number("EXTERN", "AU-20261019-N0421"));
    }
}
