//! Currency and number formatting shared by every export path
//!
//! Amounts render the way an `en-IN` INR currency formatter with zero
//! fraction digits renders them: `₹` prefix, lakh/crore digit grouping and
//! half-away-from-zero rounding. Exported documents are compared textually
//! downstream, so this output has to stay stable.

use crate::constants::RUPEE_SYMBOL;

/// Format an amount as Indian Rupees with no decimal places.
///
/// ```
/// use report_exporter::currency::format_currency;
/// assert_eq!(format_currency(1234.0), "₹1,234");
/// assert_eq!(format_currency(1234567.0), "₹12,34,567");
/// ```
pub fn format_currency(amount: f64) -> String {
    if amount.is_nan() {
        return format!("{RUPEE_SYMBOL}NaN");
    }

    let sign = if amount.is_sign_negative() { "-" } else { "" };

    if amount.is_infinite() {
        return format!("{sign}{RUPEE_SYMBOL}∞");
    }

    // f64::round rounds half away from zero
    let digits = format!("{:.0}", amount.abs().round());
    format!("{sign}{RUPEE_SYMBOL}{}", group_indian(&digits))
}

/// Format a percentage value the way string interpolation of a number does:
/// shortest form, no trailing `.0`, followed by `%`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value))
}

/// Shortest display form of a number, matching JavaScript's number to
/// string conversion: `2` not `2.0`, `-0` shown as `0`, and exponent form
/// (`1e+21`, `1e-7`) from 1e21 upwards and below 1e-6.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        // `{:e}` omits the `+` on positive exponents
        let exponent = format!("{value:e}");
        return match exponent.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exponent,
        };
    }
    value.to_string()
}

/// Group an unsigned digit string as 12,34,56,789
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::with_capacity(head.len() / 2 + 1);
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
