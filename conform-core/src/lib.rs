//! Benford and Zipf conformance analysis for model-generated text.
//!
//! Two independent pipelines run over the same input:
//!
//! ```text
//! raw text ─┬─> numeric extractor ─> leading digits ─> Benford chi-square
//!           └─> cleaned text ──────> tokenizer ──────> Zipf log-log fit
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: number extraction, text cleaning, word tokenization
//! - [`stats`]: leading digits, both conformance tests and their verdicts
//! - [`corpus`]: incremental and grouped accumulation over many texts
//! - [`classify`]: rule-based prompt grouping
//!
//! ## Example
//!
//! ```rust
//! use conform_core::corpus::Corpus;
//!
//! let mut corpus = Corpus::new();
//! corpus.add("Revenue rose to $1,234.56 from (1,000) last quarter.");
//! corpus.add("On 2025-09-23 the value 3.14 was noted.");
//!
//! let benford = corpus.benford().unwrap();
//! assert_eq!(benford.total(), 3);
//! ```
//!
//! The library never installs a `tracing` subscriber; binaries do.

pub mod analyzer;
pub mod classify;
pub mod corpus;
pub mod stats;

pub use conform_types::{
    AnalysisError, AnalysisPolicy, BenfordReport, DigitHistogram, LeadingDigit, NumericToken,
    Reliability, TestKind, ZipfReport,
};
