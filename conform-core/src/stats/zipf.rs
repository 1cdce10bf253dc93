//! Rank-frequency power-law test.
//!
//! Tokens from every input text are merged into one [`FrequencyTable`],
//! ranked by descending count and fitted as
//! `ln(frequency) = slope * ln(rank) + intercept`.
//!
//! Natural-language corpora land near slope -1 with a high R². How far off
//! is "too far" is a policy question, see [`verdict`](crate::stats::verdict).

use conform_types::{AnalysisError, TestKind, ZipfReport};
use tracing::debug;

use crate::analyzer::tokenizer::Tokenizer;
use crate::stats::frequency::FrequencyTable;
use crate::stats::regression;

/// Fewest distinct tokens for which the log-log fit is defined.
pub const MIN_DISTINCT_TOKENS: usize = 2;

/// Zipf test over word tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipfTest {
    tokenizer: Tokenizer,
}

impl ZipfTest {
    /// Creates a test with the default tokenizer.
    pub const fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
        }
    }

    /// Tokenizes every text, merges the counts and fits the power law.
    ///
    /// Texts are expected to be cleaned already (numbers and dates removed);
    /// digits act as separators either way.
    pub fn run<I, S>(&self, texts: I) -> Result<ZipfReport, AnalysisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = FrequencyTable::new();
        for text in texts {
            table.extend_from_text(&self.tokenizer, text.as_ref());
        }
        self.run_table(&table)
    }

    /// Fits the power law to an accumulated table.
    ///
    /// # Errors
    /// - [`AnalysisError::InsufficientData`] with fewer than two distinct tokens.
    pub fn run_table(&self, table: &FrequencyTable) -> Result<ZipfReport, AnalysisError> {
        let distinct = table.len();
        if distinct < MIN_DISTINCT_TOKENS {
            return Err(insufficient(distinct));
        }

        let frequencies = table.ranked_counts();
        let ranks: Vec<u32> = (1..=distinct as u32).collect();

        let xs: Vec<f64> = ranks.iter().map(|&r| f64::from(r).ln()).collect();
        let ys: Vec<f64> = frequencies.iter().map(|&f| (f as f64).ln()).collect();

        // ln(rank) is strictly increasing, so the fit exists for n >= 2
        let fit = regression::fit(&xs, &ys).ok_or_else(|| insufficient(distinct))?;

        debug!(
            tokens = table.total(),
            distinct,
            slope = fit.slope,
            r_squared = fit.r_squared,
            "zipf test"
        );

        Ok(ZipfReport {
            ranks,
            frequencies,
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            total_tokens: table.total(),
            degenerate: fit.degenerate,
        })
    }
}

fn insufficient(found: usize) -> AnalysisError {
    AnalysisError::InsufficientData {
        test: TestKind::Zipf,
        required: MIN_DISTINCT_TOKENS,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fruit_counts() {
        let report = ZipfTest::new()
            .run(["apple banana apple", "orange banana apple"])
            .unwrap();
        assert_eq!(report.ranks, vec![1, 2, 3]);
        assert_eq!(report.frequencies, vec![3, 2, 1]);
        assert_eq!(report.total_tokens, 6);
        assert!(report.slope < 0.0);
        assert!((0.0..=1.0).contains(&report.r_squared));
        assert!(!report.degenerate);
    }

    #[test]
    fn perfect_zipf_fits_exactly() {
        // counts 12/6/4/3 are 12/r
        let mut text = String::new();
        for (word, n) in [("a", 12), ("b", 6), ("c", 4), ("d", 3)] {
            for _ in 0..n {
                text.push_str(word);
                text.push(' ');
            }
        }
        let report = ZipfTest::new().run([text]).unwrap();
        assert!((report.slope + 1.0).abs() < 1e-9);
        assert!((report.intercept - 12f64.ln()).abs() < 1e-9);
        assert!((report.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn frequencies_non_increasing() {
        let report = ZipfTest::new()
            .run(["the cat and the dog and the bird saw a cat"])
            .unwrap();
        for pair in report.frequencies.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_eq!(report.ranks.len(), report.frequencies.len());
    }

    #[test]
    fn equal_frequencies_are_degenerate() {
        let report = ZipfTest::new().run(["alpha beta gamma delta"]).unwrap();
        assert!(report.degenerate);
        assert_eq!(report.r_squared, 0.0);
        assert_eq!(report.slope, 0.0);
    }

    #[test]
    fn single_distinct_token_is_insufficient() {
        let err = ZipfTest::new().run(["echo echo ECHO"]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                test: TestKind::Zipf,
                required: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn empty_input_is_insufficient() {
        let none: [&str; 0] = [];
        assert!(ZipfTest::new().run(none).is_err());
        assert!(ZipfTest::new().run(["42 17 ..."]).is_err());
    }

    #[test]
    fn texts_merge_into_one_table() {
        let split = ZipfTest::new().run(["one two", "two three"]).unwrap();
        let joined = ZipfTest::new().run(["one two two three"]).unwrap();
        assert_eq!(split, joined);
    }
}
