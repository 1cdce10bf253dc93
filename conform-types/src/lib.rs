//! Core types for the conformance engine.
//!
//! This crate holds the value objects shared between the analysis core and
//! its callers: extracted numeric tokens, digit histograms, the two report
//! types, the error taxonomy and the interpretation policy. Keeping them in a
//! separate crate means dashboards, exporters and batch jobs can consume
//! reports without pulling in the extraction machinery.
//!
//! - **Immutable results**: reports are plain data, created fresh per call
//! - **No I/O**: nothing here reads files or the environment
//! - **Serializable**: every report derives `Serialize` so consumers pick the format

#![warn(missing_docs)]

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of leading-digit categories (1 through 9).
pub const DIGIT_CATEGORIES: usize = 9;

/// Degrees of freedom of the Benford chi-square test.
pub const BENFORD_DEGREES_OF_FREEDOM: u32 = (DIGIT_CATEGORIES - 1) as u32;

/// A numeric value extracted from free text.
///
/// `start..end` is the byte span of the raw match in the source text. For a
/// parenthesized negative such as `(1,000)` the span covers `1,000` only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericToken {
    /// Parsed value after normalization.
    pub value: f64,
    /// Byte offset where the raw match starts.
    pub start: usize,
    /// Byte offset one past the end of the raw match.
    pub end: usize,
}

impl NumericToken {
    /// Creates a new token.
    #[inline(always)]
    pub const fn new(value: f64, start: usize, end: usize) -> Self {
        Self { value, start, end }
    }

    /// Returns the byte span as a range, for slicing the source text.
    #[inline(always)]
    pub const fn span(&self) -> core::ops::Range<usize> {
        self.start..self.end
    }
}

/// A leading significant decimal digit, always in `1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(transparent)]
pub struct LeadingDigit(u8);

impl LeadingDigit {
    /// Creates a digit, returning `None` outside `1..=9`.
    #[inline(always)]
    pub const fn new(digit: u8) -> Option<Self> {
        if digit >= 1 && digit <= 9 {
            Some(Self(digit))
        } else {
            None
        }
    }

    /// Creates a digit from an ASCII byte `b'1'..=b'9'`.
    #[inline(always)]
    pub const fn from_ascii(byte: u8) -> Option<Self> {
        Self::new(byte.wrapping_sub(b'0'))
    }

    /// Returns the digit value.
    #[inline(always)]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based histogram slot for this digit.
    #[inline(always)]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// All nine digits in ascending order.
    pub fn all() -> impl Iterator<Item = LeadingDigit> {
        (1..=9u8).map(LeadingDigit)
    }
}

impl TryFrom<u8> for LeadingDigit {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl From<LeadingDigit> for u8 {
    #[inline(always)]
    fn from(d: LeadingDigit) -> Self {
        d.0
    }
}

impl fmt::Display for LeadingDigit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Theoretical Benford probability `log10(1 + 1/d)` for a leading digit.
#[inline]
pub fn benford_proportion(digit: LeadingDigit) -> f64 {
    (1.0 + 1.0 / f64::from(digit.get())).log10()
}

/// Counts of leading digits 1 through 9.
///
/// Every digit is always present; unseen digits count zero. The total is the
/// number of digits recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigitHistogram {
    counts: [u64; DIGIT_CATEGORIES],
}

impl DigitHistogram {
    /// Creates an empty histogram.
    pub const fn new() -> Self {
        Self {
            counts: [0; DIGIT_CATEGORIES],
        }
    }

    /// Creates a histogram from raw counts, index 0 holding digit 1.
    pub const fn from_counts(counts: [u64; DIGIT_CATEGORIES]) -> Self {
        Self { counts }
    }

    /// Records one occurrence of `digit`.
    #[inline(always)]
    pub fn record(&mut self, digit: LeadingDigit) {
        self.counts[digit.index()] += 1;
    }

    /// Returns the count for `digit`.
    #[inline(always)]
    pub const fn count(&self, digit: LeadingDigit) -> u64 {
        self.counts[digit.index()]
    }

    /// Raw counts, index 0 holding digit 1.
    #[inline(always)]
    pub const fn counts(&self) -> &[u64; DIGIT_CATEGORIES] {
        &self.counts
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(&mut self, other: &DigitHistogram) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }

    /// Iterates `(digit, count)` pairs in ascending digit order.
    pub fn iter(&self) -> impl Iterator<Item = (LeadingDigit, u64)> + '_ {
        LeadingDigit::all().map(move |d| (d, self.count(d)))
    }

    /// Resets all counts to zero.
    pub fn clear(&mut self) {
        self.counts = [0; DIGIT_CATEGORIES];
    }
}

impl FromIterator<LeadingDigit> for DigitHistogram {
    fn from_iter<I: IntoIterator<Item = LeadingDigit>>(iter: I) -> Self {
        let mut hist = Self::new();
        hist.extend(iter);
        hist
    }
}

impl Extend<LeadingDigit> for DigitHistogram {
    fn extend<I: IntoIterator<Item = LeadingDigit>>(&mut self, iter: I) {
        for digit in iter {
            self.record(digit);
        }
    }
}

/// Which conformance test produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestKind {
    /// Leading-digit (Benford) test.
    Benford,
    /// Rank-frequency (Zipf) test.
    Zipf,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Benford => f.write_str("benford"),
            TestKind::Zipf => f.write_str("zipf"),
        }
    }
}

/// Errors surfaced by the conformance tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Not enough numeric tokens or distinct word types to compute a statistic.
    #[error("insufficient data for {test} test: need at least {required}, found {found}")]
    InsufficientData {
        /// The test that could not run.
        test: TestKind,
        /// Minimum number of items the test needs.
        required: usize,
        /// Number of items actually available.
        found: usize,
    },
}

/// Statistical reliability of a Benford report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reliability {
    /// Enough observations for the chi-square approximation to hold.
    Reliable,
    /// Fewer observations than the configured minimum; expected cell counts
    /// are too small for the chi-square approximation.
    LowSample {
        /// Observations in the report.
        total: u64,
        /// Configured minimum.
        minimum: u64,
    },
}

impl Reliability {
    /// Classifies `total` against `minimum`.
    pub const fn assess(total: u64, minimum: u64) -> Self {
        if total < minimum {
            Reliability::LowSample { total, minimum }
        } else {
            Reliability::Reliable
        }
    }

    /// Returns `true` for [`Reliability::Reliable`].
    pub const fn is_reliable(&self) -> bool {
        matches!(self, Reliability::Reliable)
    }
}

/// Result of the leading-digit goodness-of-fit test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BenfordReport {
    /// Pearson chi-square statistic, never negative.
    pub chi_square: f64,
    /// Upper-tail probability with 8 degrees of freedom, in `[0, 1]`.
    pub p_value: f64,
    /// Observed leading-digit counts.
    pub observed: DigitHistogram,
    /// Expected counts `total * log10(1 + 1/d)`, index 0 holding digit 1.
    pub expected: [f64; DIGIT_CATEGORIES],
    /// Whether the sample is large enough to trust the statistic.
    pub reliability: Reliability,
}

impl BenfordReport {
    /// Number of classified digits in the report.
    pub fn total(&self) -> u64 {
        self.observed.total()
    }
}

impl fmt::Display for BenfordReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} chi2={:.3} p={:.4}",
            self.total(),
            self.chi_square,
            self.p_value
        )?;
        if let Reliability::LowSample { minimum, .. } = self.reliability {
            write!(f, " (low sample, minimum {})", minimum)?;
        }
        Ok(())
    }
}

/// Result of the rank-frequency power-law fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipfReport {
    /// Ranks `1..=N`.
    pub ranks: Vec<u32>,
    /// Token frequencies aligned with `ranks`, non-increasing.
    pub frequencies: Vec<u64>,
    /// Slope of `ln(frequency)` against `ln(rank)`; natural text sits near -1.
    pub slope: f64,
    /// Intercept of the log-log fit.
    pub intercept: f64,
    /// Coefficient of determination in `[0, 1]`.
    pub r_squared: f64,
    /// Total number of tokens counted.
    pub total_tokens: u64,
    /// `true` when every frequency is equal and R² was defined as zero.
    pub degenerate: bool,
}

impl ZipfReport {
    /// Number of distinct token types.
    pub fn distinct_tokens(&self) -> usize {
        self.frequencies.len()
    }
}

impl fmt::Display for ZipfReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tokens={} types={} slope={:.3} r2={:.3}",
            self.total_tokens,
            self.distinct_tokens(),
            self.slope,
            self.r_squared
        )
    }
}

/// Thresholds used to interpret reports.
///
/// These are presentation heuristics, not statistical truths; callers tune
/// them per corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPolicy {
    /// Benford reports below this many digits are flagged as low-sample.
    /// Default: 50
    pub benford_min_sample: u64,
    /// p-value below which a Benford report counts as a deviation.
    /// Default: 0.05
    pub significance_level: f64,
    /// Zipf reports below this many tokens are inconclusive.
    /// Default: 500
    pub zipf_min_tokens: u64,
    /// Minimum R² for the corpus to count as power-law distributed.
    /// Default: 0.90
    pub zipf_min_r_squared: f64,
    /// Slopes above (flatter than) this suggest an unnaturally uniform vocabulary.
    /// Default: -0.8
    pub zipf_flat_slope: f64,
    /// Slopes below (steeper than) this suggest repetition.
    /// Default: -1.2
    pub zipf_steep_slope: f64,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            benford_min_sample: 50,
            significance_level: 0.05,
            zipf_min_tokens: 500,
            zipf_min_r_squared: 0.90,
            zipf_flat_slope: -0.8,
            zipf_steep_slope: -1.2,
        }
    }
}

impl AnalysisPolicy {
    /// Larger samples and a tighter fit before anything is called conformant.
    pub const fn strict() -> Self {
        Self {
            benford_min_sample: 100,
            significance_level: 0.01,
            zipf_min_tokens: 1_000,
            zipf_min_r_squared: 0.95,
            zipf_flat_slope: -0.85,
            zipf_steep_slope: -1.15,
        }
    }

    /// Accepts short responses; useful for single-answer spot checks.
    pub const fn lenient() -> Self {
        Self {
            benford_min_sample: 20,
            significance_level: 0.05,
            zipf_min_tokens: 100,
            zipf_min_r_squared: 0.80,
            zipf_flat_slope: -0.7,
            zipf_steep_slope: -1.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_digit_bounds() {
        assert!(LeadingDigit::new(0).is_none());
        assert!(LeadingDigit::new(10).is_none());
        assert_eq!(LeadingDigit::new(9).map(LeadingDigit::get), Some(9));
        assert_eq!(LeadingDigit::from_ascii(b'7').map(LeadingDigit::get), Some(7));
        assert!(LeadingDigit::from_ascii(b'0').is_none());
        assert!(LeadingDigit::from_ascii(b'a').is_none());
    }

    #[test]
    fn leading_digit_is_one_byte() {
        assert_eq!(core::mem::size_of::<LeadingDigit>(), 1);
    }

    #[test]
    fn all_digits_in_order() {
        let digits: Vec<u8> = LeadingDigit::all().map(u8::from).collect();
        assert_eq!(digits, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn benford_proportions_sum_to_one() {
        let sum: f64 = LeadingDigit::all().map(benford_proportion).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn benford_proportion_of_one() {
        let one = LeadingDigit::new(1).unwrap();
        assert!((benford_proportion(one) - 0.30103).abs() < 1e-5);
    }

    #[test]
    fn histogram_zero_filled() {
        let hist = DigitHistogram::new();
        assert_eq!(hist.iter().count(), 9);
        assert!(hist.iter().all(|(_, c)| c == 0));
        assert!(hist.is_empty());
    }

    #[test]
    fn histogram_single_nine() {
        let nine = LeadingDigit::new(9).unwrap();
        let hist: DigitHistogram = [nine].into_iter().collect();
        assert_eq!(hist.count(nine), 1);
        assert_eq!(hist.total(), 1);
        assert_eq!(hist.counts()[..8], [0; 8]);
    }

    #[test]
    fn histogram_merge() {
        let mut a = DigitHistogram::from_counts([1, 0, 0, 0, 0, 0, 0, 0, 2]);
        let b = DigitHistogram::from_counts([3, 1, 0, 0, 0, 0, 0, 0, 0]);
        a.merge(&b);
        assert_eq!(a.counts(), &[4, 1, 0, 0, 0, 0, 0, 0, 2]);
        a.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn reliability_threshold() {
        assert_eq!(
            Reliability::assess(49, 50),
            Reliability::LowSample {
                total: 49,
                minimum: 50
            }
        );
        assert!(Reliability::assess(50, 50).is_reliable());
    }

    #[test]
    fn insufficient_data_message() {
        let err = AnalysisError::InsufficientData {
            test: TestKind::Zipf,
            required: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for zipf test: need at least 2, found 1"
        );
    }

    #[test]
    fn policy_defaults() {
        let policy = AnalysisPolicy::default();
        assert_eq!(policy.benford_min_sample, 50);
        assert_eq!(policy.zipf_min_tokens, 500);
        assert_eq!(policy.zipf_min_r_squared, 0.90);
        assert!(policy.zipf_steep_slope < policy.zipf_flat_slope);
    }

    #[test]
    fn policy_partial_deserialize_keeps_defaults() {
        let policy: AnalysisPolicy =
            serde_json::from_str(r#"{"benford_min_sample": 10}"#).unwrap();
        assert_eq!(policy.benford_min_sample, 10);
        assert_eq!(policy.significance_level, 0.05);
    }

    #[test]
    fn benford_report_display_flags_low_sample() {
        let report = BenfordReport {
            chi_square: 1.5,
            p_value: 0.99,
            observed: DigitHistogram::from_counts([1, 1, 0, 0, 0, 0, 0, 0, 0]),
            expected: [0.0; 9],
            reliability: Reliability::assess(2, 50),
        };
        let text = report.to_string();
        assert!(text.starts_with("n=2 "));
        assert!(text.contains("low sample"));
    }

    #[test]
    fn reliability_serializes_tagged() {
        let json = serde_json::to_string(&Reliability::Reliable).unwrap();
        assert_eq!(json, r#"{"kind":"reliable"}"#);
    }
}
