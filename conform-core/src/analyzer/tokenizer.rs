//! Word Tokenizer Module
//!
//! Splits cleaned text into lowercase word tokens for rank-frequency analysis.
//! It is the last stage before the Zipf frequency table: numbers, dates and
//! serial codes are expected to be gone already (see
//! [`numeric`](crate::analyzer::numeric)).
//!
//! ## What a Token Is
//!
//! A token is a maximal run of Unicode letters (`\p{L}`) and ASCII
//! apostrophes. Everything else, digits included, separates tokens:
//!
//! ```text
//! "Don't PANIC, it's 42!"  ->  "don't", "panic", "it's"
//! ```
//!
//! Letter-like numerals (`Ⅻ`), enclosed symbols (`Ⓐ`) and combining marks
//! are not letters, so a Devanagari vowel sign splits its word.
//!
//! ## Key Features
//!
//! - **Lazy**: [`Tokenizer::tokens`] returns an iterator, nothing is collected
//! - **Borrowing**: tokens already in lowercase are slices of the input
//! - **Restartable**: the tokenizer holds no state, call it again for a fresh pass
//! - **Finite**: at most one token per input character
//!
//! ## Usage
//!
//! ```rust
//! use conform_core::analyzer::tokenizer::Tokenizer;
//!
//! let words: Vec<_> = Tokenizer::new().tokens("Hello hello world").collect();
//! assert_eq!(words, ["hello", "hello", "world"]);
//! ```

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Matches, Regex};

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[\p{L}']+").expect("word pattern is valid");
}

/// Returns `true` if lowercasing `s` would leave it unchanged.
#[inline]
fn is_already_lower(s: &str) -> bool {
    s.chars().all(|c| {
        let mut lowered = c.to_lowercase();
        lowered.next() == Some(c) && lowered.next().is_none()
    })
}

/// Stateless word tokenizer.
///
/// ## Example
///
/// ```
/// use conform_core::analyzer::tokenizer::Tokenizer;
///
/// let tokenizer = Tokenizer::new();
///
/// assert_eq!(tokenizer.tokens("the quick brown fox").count(), 4);
/// assert_eq!(tokenizer.count("The Quick, brown fox"), 4);
/// ```
#[derive(Debug, Copy, Clone, Default)]
pub struct Tokenizer;

impl Tokenizer {
    /// Creates a tokenizer.
    #[inline]
    pub const fn new() -> Self {
        Self
    }

    /// Lazy iterator over the lowercase tokens of `text`.
    #[inline]
    pub fn tokens<'a>(&self, text: &'a str) -> Tokens<'a> {
        Tokens {
            matches: WORD_RE.find_iter(text),
        }
    }

    /// Counts tokens without lowercasing them.
    pub fn count(&self, text: &str) -> usize {
        WORD_RE.find_iter(text).count()
    }
}

/// Iterator returned by [`Tokenizer::tokens`].
#[derive(Debug)]
pub struct Tokens<'a> {
    matches: Matches<'static, 'a>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        let word = self.matches.next()?.as_str();
        if is_already_lower(word) {
            Some(Cow::Borrowed(word))
        } else {
            Some(Cow::Owned(word.to_lowercase()))
        }
    }
}

impl core::iter::FusedIterator for Tokens<'_> {}
