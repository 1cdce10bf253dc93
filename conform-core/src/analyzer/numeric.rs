//! Numeric token extraction.
//!
//! Pulls numeric values out of noisy model output and produces a cleaned copy
//! of the text with every number, date, clock time and serial code blanked.
//!
//! ## What Counts as a Number
//!
//! A candidate is an optional sign, an optional currency symbol (with at most
//! one whitespace character after it), then either a thousands-grouped
//! integer or a plain digit run, an optional fraction, an optional exponent
//! and an optional trailing percent sign:
//!
//! ```text
//! "$1,234.56"  ->  1234.56
//! "(1,000)"    -> -1000.0      parenthesized amounts are negative
//! "-42"        ->  -42.0
//! "12.5%"      ->  12.5
//! "6.02e23"    ->  6.02e23
//! ```
//!
//! ## What Does Not
//!
//! - `2025-09-23` and `12:34:56(.fff)` are dropped from the number stream
//! - `ABC-12345-678` style serial codes are dropped too
//! - the tail of a broken grouping such as `1,2345` is dropped whole
//!
//! All of these are still blanked from the cleaned text so the tokenizer
//! never sees them.
//!
//! ## Hyphens Versus Signs
//!
//! A `-` glued to a preceding letter or digit joins words (`10-20`,
//! `covid-19`) rather than negating, so the value stays positive.
//!
//! ## Matching Engine
//!
//! Patterns are compiled once per process. The `regex` crate runs in linear
//! time with no backtracking, so adversarial input cannot blow up the scan.

use core::ops::Range;

use conform_types::NumericToken;
use lazy_static::lazy_static;
use regex::{CaptureMatches, Regex};
use tracing::trace;

use crate::analyzer::cleaner::{blank_into, excluded_spans, overlaps_sorted, Spans};

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(concat!(
        r"(?P<sign>[-+])?",
        r"(?:(?P<currency>[$€£¥₹])\s?)?",
        r"(?P<int>[0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)",
        r"(?P<frac>\.[0-9]+)?",
        r"(?P<exp>[eE][-+]?[0-9]+)?",
        r"%?",
    ))
    .expect("number pattern is valid");
}

/// Why a candidate yields no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Overlaps a date, clock time or serial code.
    Excluded,
    /// Starts or ends flush against another digit.
    SplitRun,
}

/// A raw numeric match, not yet parsed.
///
/// Parsing is deferred to [`Candidate::value`], which returns `None` for
/// anything malformed; callers filter the candidate stream rather than
/// handling failures.
#[derive(Debug, Clone)]
pub struct Candidate<'t> {
    span: Range<usize>,
    raw: &'t str,
    negative: bool,
    parenthesized: bool,
    integer: &'t str,
    fraction: &'t str,
    exponent: &'t str,
    rejection: Option<Rejection>,
}

impl<'t> Candidate<'t> {
    /// Byte span of the match in the source text.
    #[inline(always)]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// The matched text, exactly as it appears in the source.
    #[inline(always)]
    pub fn raw(&self) -> &'t str {
        self.raw
    }

    /// Why this candidate is not a number, if it is not.
    #[inline(always)]
    pub fn rejection(&self) -> Option<Rejection> {
        self.rejection
    }

    /// Canonical `[-]digits[.digits][e±digits]` form with grouping removed.
    fn normalized(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        if self.negative {
            out.push('-');
        }
        out.extend(self.integer.chars().filter(|&c| c != ','));
        out.push_str(self.fraction);
        out.push_str(self.exponent);
        out
    }

    /// Last resort: keep only digits, signs, the decimal point and exponent
    /// markers from the raw match.
    fn stripped(&self) -> String {
        self.raw
            .chars()
            .filter(|c| matches!(c, '0'..='9' | '-' | '+' | '.' | 'e' | 'E'))
            .collect()
    }

    /// Parses the candidate into a finite value.
    ///
    /// Returns `None` for rejected candidates and for anything that fails to
    /// parse even after stripping.
    pub fn value(&self) -> Option<f64> {
        if let Some(reason) = self.rejection {
            trace!(raw = self.raw, ?reason, "numeric candidate rejected");
            return None;
        }

        let parsed = self
            .normalized()
            .parse::<f64>()
            .or_else(|_| self.stripped().parse::<f64>())
            .ok()
            .filter(|v| v.is_finite());

        match parsed {
            Some(v) if self.parenthesized => Some(-v),
            Some(v) => Some(v),
            None => {
                trace!(raw = self.raw, "malformed numeric candidate dropped");
                None
            }
        }
    }

    /// Parses into a [`NumericToken`] carrying the source span.
    pub fn token(&self) -> Option<NumericToken> {
        self.value()
            .map(|v| NumericToken::new(v, self.span.start, self.span.end))
    }
}

/// Lazy stream of numeric candidates in scan order.
///
/// Matches never overlap; the leftmost match wins and scanning resumes after
/// it.
pub struct Candidates<'t> {
    text: &'t str,
    matches: CaptureMatches<'static, 't>,
    excluded: Spans,
    cursor: usize,
}

impl<'t> Candidates<'t> {
    /// Scans `text`.
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            matches: NUMBER_RE.captures_iter(text),
            excluded: excluded_spans(text),
            cursor: 0,
        }
    }

    /// Date, time and serial spans found in the text.
    pub fn excluded(&self) -> &[Range<usize>] {
        &self.excluded
    }
}

impl<'t> Iterator for Candidates<'t> {
    type Item = Candidate<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.matches.next()?;
        let whole = caps.get(0)?;
        let span = whole.range();
        let bytes = self.text.as_bytes();

        let prev = self.text[..span.start].chars().next_back();
        let glued = prev.is_some_and(char::is_alphanumeric);
        let sign = caps.name("sign").map(|m| m.as_str());
        let prefixed = sign.is_some() || caps.name("currency").is_some();

        let rejection = if overlaps_sorted(&self.excluded, &mut self.cursor, &span) {
            Some(Rejection::Excluded)
        } else if !prefixed && prev.is_some_and(|c| c.is_ascii_digit()) {
            Some(Rejection::SplitRun)
        } else if bytes.get(span.end).is_some_and(u8::is_ascii_digit) {
            Some(Rejection::SplitRun)
        } else {
            None
        };

        let parenthesized = span.start > 0
            && bytes[span.start - 1] == b'('
            && bytes.get(span.end) == Some(&b')');

        Some(Candidate {
            raw: whole.as_str(),
            negative: sign == Some("-") && !glued,
            parenthesized,
            integer: caps.name("int").map_or("", |m| m.as_str()),
            fraction: caps.name("frac").map_or("", |m| m.as_str()),
            exponent: caps.name("exp").map_or("", |m| m.as_str()),
            rejection,
            span,
        })
    }
}

/// Numbers and cleaned text from one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Parsed numeric tokens in source order.
    pub tokens: Vec<NumericToken>,
    /// Input with numbers, dates, times and serials blanked, whitespace collapsed.
    pub cleaned: String,
}

impl Extraction {
    /// Just the values, in source order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.tokens.iter().map(|t| t.value)
    }
}

/// Reusable extractor.
///
/// Holds the span buffer between calls so repeated extraction over a corpus
/// does not reallocate it. Not shared between threads; give each worker its
/// own.
#[derive(Debug, Default, Clone)]
pub struct NumberExtractor {
    blanked: Vec<Range<usize>>,
}

impl NumberExtractor {
    /// Creates an extractor with an empty span buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends tokens found in `text` to `tokens` and writes the cleaned text
    /// into `cleaned` (cleared first).
    pub fn extract_into(
        &mut self,
        text: &str,
        tokens: &mut Vec<NumericToken>,
        cleaned: &mut String,
    ) {
        self.blanked.clear();

        let mut candidates = Candidates::new(text);
        for candidate in candidates.by_ref() {
            self.blanked.push(candidate.span());
            tokens.extend(candidate.token());
        }
        self.blanked.extend(candidates.excluded().iter().cloned());

        blank_into(text, &self.blanked, cleaned);
    }

    /// Extracts tokens and cleaned text from `text`.
    pub fn extract(&mut self, text: &str) -> Extraction {
        let mut out = Extraction::default();
        self.extract_into(text, &mut out.tokens, &mut out.cleaned);
        out
    }
}

/// Numeric tokens found in `text`, in source order.
pub fn extract_numbers(text: &str) -> Vec<NumericToken> {
    Candidates::new(text)
        .filter_map(|c| c.token())
        .collect()
}

/// Numeric tokens plus the cleaned text, in one pass.
pub fn split_numbers_and_text(text: &str) -> Extraction {
    NumberExtractor::new().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(text: &str) -> Vec<f64> {
        extract_numbers(text).into_iter().map(|t| t.value).collect()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn empty_input() {
        let out = split_numbers_and_text("");
        assert!(out.tokens.is_empty());
        assert!(out.cleaned.is_empty());
    }

    #[test]
    fn currency_and_thousands_separator() {
        let out = split_numbers_and_text("Total: $1,234.56 was charged.");
        assert_close(&out.values().collect::<Vec<_>>(), &[1234.56]);
        assert!(!out.cleaned.contains("1,234.56"));
        assert_eq!(out.cleaned, "Total: was charged.");
    }

    #[test]
    fn negative_and_parentheses() {
        let v = values("Adjustment: -42 and (1,000) recorded.");
        assert_close(&v, &[-42.0, -1000.0]);
    }

    #[test]
    fn parenthesized_currency() {
        assert_close(&values("loss of ($2,500.00) this quarter"), &[-2500.0]);
    }

    #[test]
    fn one_sided_parenthesis_is_not_negative() {
        assert_close(&values("(about 12 items"), &[12.0]);
        assert_close(&values("(12 items)"), &[12.0]);
    }

    #[test]
    fn date_time_and_serial_excluded() {
        let text = "On 2025-09-23 at 12:34:56 the value 3.14 was noted. Serial ABC-12345-678";
        let out = split_numbers_and_text(text);
        assert_close(&out.values().collect::<Vec<_>>(), &[3.14]);
        assert!(!out.cleaned.contains("2025-09-23"));
        assert!(!out.cleaned.contains("12:34:56"));
        assert!(!out.cleaned.contains("ABC-12345-678"));
        assert_eq!(out.cleaned, "On at the value was noted. Serial");
    }

    #[test]
    fn list_of_values() {
        assert_close(
            &values("Values: 10, 20, 30, 400, 5000"),
            &[10.0, 20.0, 30.0, 400.0, 5000.0],
        );
    }

    #[test]
    fn grouped_millions() {
        assert_close(&values("revenue 1,000,000 units"), &[1_000_000.0]);
    }

    #[test]
    fn plain_long_integer_not_split() {
        assert_close(&values("id 12345 ok"), &[12345.0]);
    }

    #[test]
    fn broken_grouping_dropped() {
        let out = split_numbers_and_text("odd 1,2345 value");
        assert!(out.tokens.is_empty());
        assert_eq!(out.cleaned, "odd value");
    }

    #[test]
    fn percent_and_exponent() {
        assert_close(&values("rate 12.5% and 6.02e23 atoms"), &[12.5, 6.02e23]);
        assert_close(&values("tiny 1.5E-3"), &[0.0015]);
    }

    #[test]
    fn other_currencies() {
        assert_close(&values("€ 99 or £5 or ¥1,000"), &[99.0, 5.0, 1000.0]);
    }

    #[test]
    fn only_currency_symbols() {
        let out = split_numbers_and_text("$ € £ ¥");
        assert!(out.tokens.is_empty());
        assert_eq!(out.cleaned, "$ € £ ¥");
    }

    #[test]
    fn hyphen_between_numbers_is_not_a_sign() {
        assert_close(&values("pages 10-20"), &[10.0, 20.0]);
    }

    #[test]
    fn hyphen_after_word_is_not_a_sign() {
        assert_close(&values("the x-5 model"), &[5.0]);
    }

    #[test]
    fn explicit_plus_sign() {
        assert_close(&values("delta +7"), &[7.0]);
    }

    #[test]
    fn overflow_is_dropped() {
        assert!(values("huge 1e999 value").is_empty());
    }

    #[test]
    fn spans_point_at_source() {
        let text = "pay $1,234 now";
        let tokens = extract_numbers(text);
        assert_eq!(tokens.len(), 1);
        assert_eq!(&text[tokens[0].span()], "$1,234");
    }

    #[test]
    fn non_ascii_digits_ignored() {
        assert!(values("٣٤٥").is_empty());
    }

    #[test]
    fn cleaned_text_has_no_numbers_left() {
        let out = split_numbers_and_text("a 1 b 2.5 c $3 d (4) e 2024-01-01");
        assert!(extract_numbers(&out.cleaned).is_empty());
        assert_eq!(out.cleaned, "a b c d ( ) e");
    }

    #[test]
    fn candidates_report_rejections() {
        let text = "on 2025-09-23 we paid 5";
        let rejections: Vec<_> = Candidates::new(text)
            .map(|c| (c.raw(), c.rejection()))
            .collect();
        assert_eq!(rejections[0], ("2025", Some(Rejection::Excluded)));
        assert_eq!(rejections.last(), Some(&("5", None)));
    }

    #[test]
    fn extractor_reuse_clears_state() {
        let mut ex = NumberExtractor::new();
        let first = ex.extract("one 1 two 22");
        let second = ex.extract("three");
        assert_eq!(first.tokens.len(), 2);
        assert!(second.tokens.is_empty());
        assert_eq!(second.cleaned, "three");
    }
}
