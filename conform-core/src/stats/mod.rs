//! Conformance statistics.
//!
//! - **Digits**: leading-digit classification and histograms
//! - **Benford**: chi-square goodness of fit on leading digits
//! - **Frequency**: token counts with deterministic ranking
//! - **Regression**: least squares used by the Zipf fit
//! - **Zipf**: log-log rank-frequency fit
//! - **Verdict**: policy readings of both reports

pub mod benford;
pub mod digits;
pub mod frequency;
pub mod regression;
pub mod verdict;
pub mod zipf;

pub use benford::BenfordTest;
pub use digits::leading_digit;
pub use frequency::FrequencyTable;
pub use verdict::{BenfordVerdict, ZipfVerdict};
pub use zipf::ZipfTest;
