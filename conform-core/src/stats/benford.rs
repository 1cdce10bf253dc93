//! Leading-digit goodness-of-fit test.
//!
//! Compares observed leading-digit counts against the Benford distribution
//! `P(d) = log10(1 + 1/d)` with a Pearson chi-square statistic and an
//! upper-tail p-value on 8 degrees of freedom. The p-value is delegated to
//! aprender's goodness-of-fit test.
//!
//! ```rust
//! use conform_core::stats::benford::BenfordTest;
//!
//! let report = BenfordTest::default()
//!     .run_values([10.0, 20.0, 30.0, 400.0, 5000.0])
//!     .unwrap();
//! assert_eq!(report.total(), 5);
//! assert!(!report.reliability.is_reliable());
//! ```

use aprender::stats::hypothesis::chisquare;
use conform_types::{
    benford_proportion, AnalysisError, AnalysisPolicy, BenfordReport, DigitHistogram,
    LeadingDigit, Reliability, TestKind, BENFORD_DEGREES_OF_FREEDOM, DIGIT_CATEGORIES,
};
use tracing::{debug, trace, warn};

use crate::stats::digits;

/// Beyond this statistic the 8-df tail is below 1e-17 and aprender's
/// single-precision series no longer converges.
const TAIL_CUTOFF: f64 = 100.0;

/// Expected Benford counts for a sample of `total` digits, index 0 holding digit 1.
pub fn expected_counts(total: u64) -> [f64; DIGIT_CATEGORIES] {
    let n = total as f64;
    let mut expected = [0.0; DIGIT_CATEGORIES];
    for digit in LeadingDigit::all() {
        expected[digit.index()] = n * benford_proportion(digit);
    }
    expected
}

/// Pearson statistic `Σ (O - E)² / E`.
///
/// Cells with a non-positive expectation are skipped.
pub fn chi_square(observed: &DigitHistogram, expected: &[f64; DIGIT_CATEGORIES]) -> f64 {
    observed
        .counts()
        .iter()
        .zip(expected.iter())
        .filter(|&(_, &e)| e > 0.0)
        .map(|(&o, &e)| {
            let diff = o as f64 - e;
            diff * diff / e
        })
        .sum()
}

/// Upper-tail probability of the Pearson statistic of `observed` against `expected`.
///
/// Always within `[0, 1]`. Statistics past the representable tail report 0.
pub fn p_value(observed: &[f64; DIGIT_CATEGORIES], expected: &[f64; DIGIT_CATEGORIES]) -> f64 {
    let observed = observed.map(|o| o as f32);
    let expected = expected.map(|e| e as f32);

    match chisquare(&observed, &expected) {
        Ok(result) if f64::from(result.statistic) > TAIL_CUTOFF => 0.0,
        Ok(result) if result.pvalue.is_finite() => f64::from(result.pvalue).clamp(0.0, 1.0),
        Ok(result) => {
            trace!(statistic = result.statistic, "non-finite tail probability");
            0.0
        }
        Err(err) => {
            trace!(%err, "chi-square test rejected its input");
            1.0
        }
    }
}

/// Configured Benford test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenfordTest {
    min_reliable_sample: u64,
}

impl Default for BenfordTest {
    fn default() -> Self {
        Self::new(AnalysisPolicy::default().benford_min_sample)
    }
}

impl BenfordTest {
    /// Creates a test that flags samples below `min_reliable_sample`.
    pub const fn new(min_reliable_sample: u64) -> Self {
        Self {
            min_reliable_sample,
        }
    }

    /// Creates a test using the policy's minimum sample.
    pub const fn from_policy(policy: &AnalysisPolicy) -> Self {
        Self::new(policy.benford_min_sample)
    }

    /// Minimum sample below which reports are flagged.
    pub const fn min_reliable_sample(&self) -> u64 {
        self.min_reliable_sample
    }

    /// Runs the test on a stream of leading digits.
    pub fn run<I>(&self, digits: I) -> Result<BenfordReport, AnalysisError>
    where
        I: IntoIterator<Item = LeadingDigit>,
    {
        let observed: DigitHistogram = digits.into_iter().collect();
        self.run_histogram(&observed)
    }

    /// Runs the test on raw values, classifying each by its leading digit.
    ///
    /// Zero, NaN and infinite values are dropped before counting.
    pub fn run_values<I>(&self, values: I) -> Result<BenfordReport, AnalysisError>
    where
        I: IntoIterator<Item = f64>,
    {
        self.run_histogram(&digits::histogram(values))
    }

    /// Runs the test on an accumulated histogram.
    ///
    /// # Errors
    /// - [`AnalysisError::InsufficientData`] when the histogram is empty.
    pub fn run_histogram(&self, observed: &DigitHistogram) -> Result<BenfordReport, AnalysisError> {
        let total = observed.total();
        if total == 0 {
            return Err(AnalysisError::InsufficientData {
                test: TestKind::Benford,
                required: 1,
                found: 0,
            });
        }

        let expected = expected_counts(total);
        let statistic = chi_square(observed, &expected);
        let p_value = p_value(&observed.counts().map(|c| c as f64), &expected);
        let reliability = Reliability::assess(total, self.min_reliable_sample);

        if !reliability.is_reliable() {
            warn!(
                total,
                minimum = self.min_reliable_sample,
                "benford sample below reliable minimum"
            );
        }
        debug!(
            total,
            chi_square = statistic,
            p_value,
            df = BENFORD_DEGREES_OF_FREEDOM,
            "benford test"
        );

        Ok(BenfordReport {
            chi_square: statistic,
            p_value,
            observed: *observed,
            expected,
            reliability,
        })
    }
}
