//! Text cleaning shared by both pipelines.
//!
//! Two jobs:
//! - find the spans that never count as numbers (ISO dates, clock times,
//!   uppercase serial codes)
//! - rebuild a text with a set of spans blanked out, collapsing whitespace
//!
//! The cleaned text is what the tokenizer sees, so anything left here ends up
//! in the Zipf frequency table.

use core::ops::Range;

use lazy_static::lazy_static;
use memchr::memchr2;
use regex::Regex;
use smallvec::SmallVec;

/// Byte spans found in a single text. Most responses carry only a handful.
pub type Spans = SmallVec<[Range<usize>; 8]>;

lazy_static! {
    // One alternation so spans come back non-overlapping in scan order.
    // Dates and times are bounded by word boundaries; serials are not, so
    // "XAB-123" still loses its code.
    static ref EXCLUDED_RE: Regex = Regex::new(concat!(
        r"\b[0-9]{4}-[0-9]{2}-[0-9]{2}\b",
        r"|\b[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?\b",
        r"|[A-Z]{2,}-[0-9][-A-Z0-9]+",
    ))
    .expect("exclusion pattern is valid");
}

/// Returns the date, time and serial spans of `text` in ascending order.
///
/// Every excluded form contains `-` or `:`, so text without either is skipped
/// without running the pattern.
pub fn excluded_spans(text: &str) -> Spans {
    if memchr2(b'-', b':', text.as_bytes()).is_none() {
        return Spans::new();
    }
    EXCLUDED_RE.find_iter(text).map(|m| m.range()).collect()
}

/// Returns `true` if `span` overlaps any of the sorted, disjoint `sorted`
/// spans at or after `*cursor`. Advances the cursor past spans that end
/// before `span` starts, so a forward scan over ascending spans is linear.
#[inline]
pub(crate) fn overlaps_sorted(
    sorted: &[Range<usize>],
    cursor: &mut usize,
    span: &Range<usize>,
) -> bool {
    while *cursor < sorted.len() && sorted[*cursor].end <= span.start {
        *cursor += 1;
    }
    sorted.get(*cursor).is_some_and(|s| s.start < span.end)
}

/// Rebuilds `input` into `out` with every byte inside `blanked` replaced by
/// whitespace, then collapses whitespace runs to one ASCII space and trims
/// both ends.
///
/// `blanked` may be unsorted and overlapping; spans must lie on char
/// boundaries.
pub fn blank_into(input: &str, blanked: &[Range<usize>], out: &mut String) {
    out.clear();
    out.reserve(input.len());

    let mut spans: Spans = blanked.iter().cloned().collect();
    spans.sort_unstable_by_key(|s| s.start);

    let mut prev_space = true;
    let mut next = 0usize;

    for (i, ch) in input.char_indices() {
        while next < spans.len() && spans[next].end <= i {
            next += 1;
        }
        let hidden = spans[next..]
            .iter()
            .take_while(|s| s.start <= i)
            .any(|s| i < s.end);

        if hidden || ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }

    if out.ends_with(' ') {
        out.pop();
    }
}

/// Allocating variant of [`blank_into`].
pub fn blank(input: &str, blanked: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(input.len());
    blank_into(input, blanked, &mut out);
    out
}
