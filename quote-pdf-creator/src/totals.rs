//! Quote arithmetic
//!
//! Form values arrive as free text. They are parsed into exact fixed-point
//! amounts so that sums of cent values do not drift, and rounded to two
//! decimals only when displayed.

use crate::quote::QuoteSnapshot;
use log::warn;
use std::fmt;
use std::ops::Add;

const NANOS_PER_UNIT: i128 = 1_000_000_000;
const NANOS_PER_CENT: i128 = 10_000_000;

/// Decimal amount stored in billionths of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount {
    nanos: i128,
}

impl Amount {
    pub const ZERO: Amount = Amount { nanos: 0 };

    pub fn from_cents(cents: i64) -> Self {
        Self { nanos: cents as i128 * NANOS_PER_CENT }
    }

    /// `self * percent / 100`, truncated to nano precision
    pub fn percent_of(&self, percent: Amount) -> Amount {
        match self.nanos.checked_mul(percent.nanos) {
            Some(product) => Amount { nanos: product / (NANOS_PER_UNIT * 100) },
            None => {
                warn!("percentage of {} overflowed, treating as zero", self);
                Amount::ZERO
            }
        }
    }

    /// Round half away from zero to cents
    pub fn round_to_cents(&self) -> i128 {
        let magnitude = (self.nanos.abs() + NANOS_PER_CENT / 2) / NANOS_PER_CENT;
        if self.nanos < 0 { -magnitude } else { magnitude }
    }

    /// Two-decimal display string, e.g. `30.01`
    pub fn to_fixed_2(&self) -> String {
        let cents = self.round_to_cents();
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.abs();
        format!("{}{}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount { nanos: self.nanos.saturating_add(rhs.nanos) }
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fixed_2())
    }
}

/// Parse the leading number of `text` the way a browser number field is read.
///
/// Leading whitespace is skipped, then an optional sign, digits, an optional
/// fraction and an optional exponent are consumed. Anything after that is
/// ignored (`"12abc"` is 12). Text without a leading number is zero.
pub fn parse_amount(text: &str) -> Amount {
    let bytes = text.trim_start().as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut digits: Vec<u8> = Vec::new();
    let mut fraction_len: i32 = 0;
    let mut seen_digit = false;

    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        digits.push(b - b'0');
        seen_digit = true;
        pos += 1;
    }
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        while let Some(&b) = bytes.get(pos) {
            if !b.is_ascii_digit() {
                break;
            }
            digits.push(b - b'0');
            fraction_len += 1;
            seen_digit = true;
            pos += 1;
        }
    }
    if !seen_digit {
        return Amount::ZERO;
    }

    let exponent = parse_exponent(&bytes[pos..]);
    let shift = exponent.saturating_sub(fraction_len).saturating_add(9);

    match digits_to_nanos(&digits, shift) {
        Some(nanos) => Amount { nanos: if negative { -nanos } else { nanos } },
        None => {
            warn!("amount {:?} is out of range, treating as zero", text);
            Amount::ZERO
        }
    }
}

fn parse_exponent(rest: &[u8]) -> i32 {
    if !matches!(rest.first(), Some(b'e') | Some(b'E')) {
        return 0;
    }
    let mut pos = 1;
    let negative = match rest.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let mut value: i32 = 0;
    let mut seen = false;
    while let Some(&b) = rest.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as i32);
        seen = true;
        pos += 1;
    }
    match (seen, negative) {
        (false, _) => 0,
        (true, true) => -value,
        (true, false) => value,
    }
}

/// Interpret `digits` as an integer scaled by `10^shift`, truncating below one nano.
fn digits_to_nanos(digits: &[u8], shift: i32) -> Option<i128> {
    let kept = if shift < 0 {
        let drop = (-shift) as usize;
        if drop >= digits.len() {
            return Some(0);
        }
        &digits[..digits.len() - drop]
    } else {
        digits
    };

    let mut value: i128 = 0;
    for &d in kept {
        value = value.checked_mul(10)?.checked_add(d as i128)?;
    }
    for _ in 0..shift.max(0) {
        if value == 0 {
            break;
        }
        value = value.checked_mul(10)?;
    }
    Some(value)
}

/// Dollar display used in the items table, e.g. `$12.50`
pub fn format_currency(amount: Amount) -> String {
    let fixed = amount.to_fixed_2();
    match fixed.strip_prefix('-') {
        Some(unsigned) => format!("-${}", unsigned),
        None => format!("${}", fixed),
    }
}

/// Figures shown under the items table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteTotals {
    pub subtotal: Amount,
    pub tax_percentage: Amount,
    pub tax_amount: Amount,
    pub grand_total: Amount,
}

impl QuoteTotals {
    pub fn from_snapshot(snapshot: &QuoteSnapshot) -> Self {
        let subtotal: Amount = snapshot
            .line_items
            .iter()
            .map(|item| parse_amount(&item.total))
            .sum();
        let tax_percentage = snapshot
            .tax_percentage
            .as_deref()
            .map(parse_amount)
            .unwrap_or(Amount::ZERO);
        let tax_amount = subtotal.percent_of(tax_percentage);

        Self {
            subtotal,
            tax_percentage,
            tax_amount,
            grand_total: subtotal + tax_amount,
        }
    }

    pub fn has_tax(&self) -> bool {
        self.tax_percentage != Amount::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::LineItem;

    fn item_with_total(total: &str) -> LineItem {
        LineItem { total: total.to_string(), ..LineItem::default() }
    }

    #[test]
    fn parses_plain_and_prefixed_numbers() {
        assert_eq!(parse_amount("10.00"), Amount::from_cents(1000));
        assert_eq!(parse_amount("  7.5"), Amount::from_cents(750));
        assert_eq!(parse_amount("12abc"), Amount::from_cents(1200));
        assert_eq!(parse_amount("-3.25"), Amount::from_cents(-325));
        assert_eq!(parse_amount(".5"), Amount::from_cents(50));
        assert_eq!(parse_amount("1e2"), Amount::from_cents(10000));
        assert_eq!(parse_amount("2.5E-1"), Amount::from_cents(25));
    }

    #[test]
    fn non_numeric_text_is_zero() {
        for text in ["", "abc", "-", ".", "$5", "  "] {
            assert_eq!(parse_amount(text), Amount::ZERO, "{:?}", text);
        }
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(parse_amount("30.005").to_fixed_2(), "30.01");
        assert_eq!(parse_amount("3.0005").to_fixed_2(), "3.00");
        assert_eq!(parse_amount("-1.005").to_fixed_2(), "-1.01");
        assert_eq!(parse_amount("-0.001").to_fixed_2(), "0.00");
        assert_eq!(parse_amount("1234").to_fixed_2(), "1234.00");
    }

    #[test]
    fn totals_round_each_displayed_field() {
        let snapshot = QuoteSnapshot {
            tax_percentage: Some("10".to_string()),
            line_items: vec![item_with_total("10.00"), item_with_total("20.005")],
            ..QuoteSnapshot::default()
        };
        let totals = QuoteTotals::from_snapshot(&snapshot);

        assert_eq!(totals.subtotal, parse_amount("30.005"));
        assert_eq!(totals.subtotal.to_fixed_2(), "30.01");
        assert_eq!(totals.tax_amount, parse_amount("3.0005"));
        assert_eq!(totals.tax_amount.to_fixed_2(), "3.00");
        // 33.0055 before display rounding
        assert_eq!(totals.grand_total, parse_amount("33.0055"));
        assert_eq!(totals.grand_total.to_fixed_2(), "33.01");
    }

    #[test]
    fn missing_tax_means_no_tax() {
        let snapshot = QuoteSnapshot {
            tax_percentage: None,
            line_items: vec![item_with_total("99.99"), item_with_total("n/a")],
            ..QuoteSnapshot::default()
        };
        let totals = QuoteTotals::from_snapshot(&snapshot);
        assert!(!totals.has_tax());
        assert_eq!(totals.tax_amount, Amount::ZERO);
        assert_eq!(totals.grand_total.to_fixed_2(), "99.99");
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(parse_amount("12.5")), "$12.50");
        assert_eq!(format_currency(parse_amount("")), "$0.00");
        assert_eq!(format_currency(parse_amount("-4")), "-$4.00");
    }
}
