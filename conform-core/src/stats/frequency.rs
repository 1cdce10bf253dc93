//! Token frequency table.

use rustc_hash::FxHashMap;

use crate::analyzer::tokenizer::Tokenizer;

/// Counts of word tokens, remembering first-seen order.
///
/// Ranking is by descending count; tokens with equal counts keep the order in
/// which they were first seen, so ranks are deterministic for a given input.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    index: FxHashMap<Box<str>, usize>,
    entries: Vec<(Box<str>, u64)>,
    total: u64,
}

impl FrequencyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of `token`.
    pub fn add(&mut self, token: &str) {
        self.add_n(token, 1);
    }

    /// Counts `n` occurrences of `token`.
    pub fn add_n(&mut self, token: &str, n: u64) {
        if n == 0 {
            return;
        }
        match self.index.get(token) {
            Some(&slot) => self.entries[slot].1 += n,
            None => {
                let key: Box<str> = token.into();
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, n));
            }
        }
        self.total += n;
    }

    /// Tokenizes `text` and counts every token. Returns the number counted.
    pub fn extend_from_text(&mut self, tokenizer: &Tokenizer, text: &str) -> u64 {
        let before = self.total;
        for token in tokenizer.tokens(text) {
            self.add(&token);
        }
        self.total - before
    }

    /// Adds every count of `other` into `self`.
    ///
    /// Tokens new to `self` are appended in `other`'s first-seen order.
    pub fn merge(&mut self, other: &FrequencyTable) {
        for (token, count) in &other.entries {
            self.add_n(token, *count);
        }
    }

    /// Number of distinct tokens.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been counted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of tokens counted.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Count for `token`, zero if unseen.
    pub fn get(&self, token: &str) -> u64 {
        self.index
            .get(token)
            .map_or(0, |&slot| self.entries[slot].1)
    }

    /// `(token, count)` pairs sorted by descending count, ties in first-seen order.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .entries
            .iter()
            .map(|(token, count)| (&**token, *count))
            .collect();
        // stable: equal counts stay in first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Counts in rank order, without the tokens.
    pub fn ranked_counts(&self) -> Vec<u64> {
        let mut counts: Vec<u64> = self.entries.iter().map(|(_, c)| *c).collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        counts
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
        self.total = 0;
    }
}

impl<'a> Extend<&'a str> for FrequencyTable {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for token in iter {
            self.add(token);
        }
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}
