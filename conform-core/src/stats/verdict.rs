//! Interpretation of reports against an [`AnalysisPolicy`].
//!
//! The testers never judge; these functions do. Checks run in a fixed order
//! and the first that applies wins.

use core::fmt;

use conform_types::{AnalysisPolicy, BenfordReport, ZipfReport};
use serde::Serialize;

/// Reading of a [`BenfordReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BenfordVerdict {
    /// Too few digits for the chi-square approximation.
    SmallSample,
    /// p-value below the significance level.
    Deviates,
    /// No significant deviation detected.
    Conforms,
}

impl BenfordVerdict {
    /// Checks, in order: sample size, then significance.
    pub fn assess(report: &BenfordReport, policy: &AnalysisPolicy) -> Self {
        if report.total() < policy.benford_min_sample {
            BenfordVerdict::SmallSample
        } else if report.p_value < policy.significance_level {
            BenfordVerdict::Deviates
        } else {
            BenfordVerdict::Conforms
        }
    }

    /// Machine name, as serialized.
    pub const fn as_str(self) -> &'static str {
        match self {
            BenfordVerdict::SmallSample => "small_sample",
            BenfordVerdict::Deviates => "deviates",
            BenfordVerdict::Conforms => "conforms",
        }
    }

    /// Short description for tables.
    pub const fn describe(self) -> &'static str {
        match self {
            BenfordVerdict::SmallSample => "sample too small to judge",
            BenfordVerdict::Deviates => "significant deviation from Benford",
            BenfordVerdict::Conforms => "consistent with Benford",
        }
    }
}

impl fmt::Display for BenfordVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Reading of a [`ZipfReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZipfVerdict {
    /// Fewer tokens than the policy minimum; numbers are not meaningful.
    Inconclusive,
    /// R² under the minimum; not power-law distributed.
    WeakFit,
    /// Slope flatter than the policy bound; unusually uniform vocabulary.
    FlatSlope,
    /// Slope steeper than the policy bound; heavy repetition.
    SteepSlope,
    /// Within every bound.
    Natural,
}

impl ZipfVerdict {
    /// Checks, in order: token count, fit quality, flat slope, steep slope.
    pub fn assess(report: &ZipfReport, policy: &AnalysisPolicy) -> Self {
        if report.total_tokens < policy.zipf_min_tokens {
            ZipfVerdict::Inconclusive
        } else if report.r_squared < policy.zipf_min_r_squared {
            ZipfVerdict::WeakFit
        } else if report.slope > policy.zipf_flat_slope {
            ZipfVerdict::FlatSlope
        } else if report.slope < policy.zipf_steep_slope {
            ZipfVerdict::SteepSlope
        } else {
            ZipfVerdict::Natural
        }
    }

    /// Machine name, as serialized.
    pub const fn as_str(self) -> &'static str {
        match self {
            ZipfVerdict::Inconclusive => "inconclusive",
            ZipfVerdict::WeakFit => "weak_fit",
            ZipfVerdict::FlatSlope => "flat_slope",
            ZipfVerdict::SteepSlope => "steep_slope",
            ZipfVerdict::Natural => "natural",
        }
    }

    /// Short description for tables.
    pub const fn describe(self) -> &'static str {
        match self {
            ZipfVerdict::Inconclusive => "too few tokens to judge",
            ZipfVerdict::WeakFit => "not power-law distributed",
            ZipfVerdict::FlatSlope => "unnaturally uniform vocabulary",
            ZipfVerdict::SteepSlope => "heavy repetition",
            ZipfVerdict::Natural => "consistent with Zipf",
        }
    }
}

impl fmt::Display for ZipfVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_types::{DigitHistogram, Reliability};

    fn benford(total: u64, p_value: f64) -> BenfordReport {
        let mut counts = [0; 9];
        counts[0] = total;
        BenfordReport {
            chi_square: 0.0,
            p_value,
            observed: DigitHistogram::from_counts(counts),
            expected: [0.0; 9],
            reliability: Reliability::assess(total, 50),
        }
    }

    fn zipf(total_tokens: u64, slope: f64, r_squared: f64) -> ZipfReport {
        ZipfReport {
            ranks: vec![1, 2],
            frequencies: vec![2, 1],
            slope,
            intercept: 0.0,
            r_squared,
            total_tokens,
            degenerate: false,
        }
    }

    #[test]
    fn benford_order() {
        let policy = AnalysisPolicy::default();
        assert_eq!(
            BenfordVerdict::assess(&benford(10, 0.0001), &policy),
            BenfordVerdict::SmallSample
        );
        assert_eq!(
            BenfordVerdict::assess(&benford(100, 0.01), &policy),
            BenfordVerdict::Deviates
        );
        assert_eq!(
            BenfordVerdict::assess(&benford(100, 0.5), &policy),
            BenfordVerdict::Conforms
        );
    }

    #[test]
    fn benford_boundary_values() {
        let policy = AnalysisPolicy::default();
        assert_eq!(
            BenfordVerdict::assess(&benford(50, 0.05), &policy),
            BenfordVerdict::Conforms
        );
    }

    #[test]
    fn zipf_order() {
        let policy = AnalysisPolicy::default();
        let cases = [
            (zipf(100, -3.0, 0.1), ZipfVerdict::Inconclusive),
            (zipf(1_000, -1.0, 0.5), ZipfVerdict::WeakFit),
            (zipf(1_000, -0.5, 0.95), ZipfVerdict::FlatSlope),
            (zipf(1_000, -1.5, 0.95), ZipfVerdict::SteepSlope),
            (zipf(1_000, -1.0, 0.95), ZipfVerdict::Natural),
        ];
        for (report, want) in cases {
            assert_eq!(ZipfVerdict::assess(&report, &policy), want, "{}", report);
        }
    }

    #[test]
    fn zipf_bounds_inclusive() {
        let policy = AnalysisPolicy::default();
        assert_eq!(
            ZipfVerdict::assess(&zipf(500, -0.8, 0.90), &policy),
            ZipfVerdict::Natural
        );
        assert_eq!(
            ZipfVerdict::assess(&zipf(500, -1.2, 0.90), &policy),
            ZipfVerdict::Natural
        );
    }

    #[test]
    fn strict_policy_is_harsher() {
        let report = zipf(800, -1.0, 0.92);
        assert_eq!(
            ZipfVerdict::assess(&report, &AnalysisPolicy::default()),
            ZipfVerdict::Natural
        );
        assert_eq!(
            ZipfVerdict::assess(&report, &AnalysisPolicy::strict()),
            ZipfVerdict::Inconclusive
        );
    }

    #[test]
    fn verdicts_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&ZipfVerdict::SteepSlope).unwrap(),
            "\"steep_slope\""
        );
        assert_eq!(
            serde_json::to_string(&BenfordVerdict::SmallSample).unwrap(),
            "\"small_sample\""
        );
    }

    #[test]
    fn names_match_serialized_form() {
        for v in [
            BenfordVerdict::SmallSample,
            BenfordVerdict::Deviates,
            BenfordVerdict::Conforms,
        ] {
            assert_eq!(serde_json::to_string(&v).unwrap(), format!("\"{}\"", v.as_str()));
        }
        for v in [
            ZipfVerdict::Inconclusive,
            ZipfVerdict::WeakFit,
            ZipfVerdict::FlatSlope,
            ZipfVerdict::SteepSlope,
            ZipfVerdict::Natural,
        ] {
            assert_eq!(serde_json::to_string(&v).unwrap(), format!("\"{}\"", v.as_str()));
        }
    }
}
