//! Leading-digit classification.

use core::fmt::Write;

use conform_types::{DigitHistogram, LeadingDigit};

/// Returns the most significant nonzero decimal digit of `value`.
///
/// Returns `None` for zero, NaN and infinities. The value is rendered in
/// plain decimal (Rust's `Display` for `f64` never switches to scientific
/// notation), so `0.0042` classifies as 4 and `6.02e23` as 6.
pub fn leading_digit(value: f64) -> Option<LeadingDigit> {
    if !value.is_finite() || value == 0.0 {
        return None;
    }

    let mut rendered = String::with_capacity(32);
    write!(rendered, "{}", value.abs()).ok()?;

    rendered
        .bytes()
        .filter(|b| b.is_ascii_digit())
        .find(|&b| b != b'0')
        .and_then(LeadingDigit::from_ascii)
}

/// Classifies every value and counts the digits.
///
/// Values without a leading digit are skipped, so the histogram total is the
/// number of values that classified.
pub fn histogram<I>(values: I) -> DigitHistogram
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().filter_map(leading_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit(value: f64) -> Option<u8> {
        leading_digit(value).map(LeadingDigit::get)
    }

    #[test]
    fn integers() {
        assert_eq!(digit(10.0), Some(1));
        assert_eq!(digit(5000.0), Some(5));
        assert_eq!(digit(9.0), Some(9));
    }

    #[test]
    fn negative_uses_magnitude() {
        assert_eq!(digit(-42.0), Some(4));
        assert_eq!(digit(-1000.0), Some(1));
    }

    #[test]
    fn fractions_skip_leading_zeros() {
        assert_eq!(digit(0.023), Some(2));
        assert_eq!(digit(0.0000071), Some(7));
    }

    #[test]
    fn large_and_tiny_magnitudes() {
        assert_eq!(digit(6.02e23), Some(6));
        assert_eq!(digit(3.5e-12), Some(3));
        assert_eq!(digit(f64::MAX), Some(1));
        assert_eq!(digit(f64::MIN_POSITIVE), Some(2));
    }

    #[test]
    fn no_digit() {
        assert_eq!(digit(0.0), None);
        assert_eq!(digit(-0.0), None);
        assert_eq!(digit(f64::NAN), None);
        assert_eq!(digit(f64::INFINITY), None);
        assert_eq!(digit(f64::NEG_INFINITY), None);
    }

    #[test]
    fn histogram_of_scenario_values() {
        let hist = histogram([10.0, 20.0, 30.0, 400.0, 5000.0]);
        assert_eq!(hist.counts(), &[1, 1, 1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(hist.total(), 5);
    }

    #[test]
    fn histogram_skips_zero() {
        let hist = histogram([0.0, 9.0]);
        assert_eq!(hist.total(), 1);
        assert_eq!(hist.count(LeadingDigit::new(9).unwrap()), 1);
    }
}
