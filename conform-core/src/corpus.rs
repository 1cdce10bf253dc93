//! Corpus accumulation.
//!
//! A [`Corpus`] ingests texts one at a time, keeping only a digit histogram
//! and a token frequency table, so memory grows with the vocabulary rather
//! than with the input. Reports are computed on demand from those two
//! aggregates and are identical to running the testers on all texts at once.
//!
//! [`GroupedCorpus`] keeps one corpus per group tag (model name, prompt type).

use conform_types::{
    AnalysisError, AnalysisPolicy, BenfordReport, DigitHistogram, NumericToken, ZipfReport,
};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::analyzer::numeric::NumberExtractor;
use crate::analyzer::tokenizer::Tokenizer;
use crate::stats::benford::BenfordTest;
use crate::stats::digits::leading_digit;
use crate::stats::frequency::FrequencyTable;
use crate::stats::verdict::{BenfordVerdict, ZipfVerdict};
use crate::stats::zipf::ZipfTest;

/// Counters describing what a corpus has ingested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusMetrics {
    /// Texts added.
    pub texts: u64,
    /// Bytes of text added.
    pub bytes: u64,
    /// Numeric tokens extracted.
    pub numbers: u64,
    /// Numeric tokens that produced a leading digit.
    pub digits: u64,
    /// Word tokens counted.
    pub tokens: u64,
    /// Distinct word tokens.
    pub distinct_tokens: usize,
}

/// Both reports for a corpus plus their policy readings.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusReport {
    /// Number of texts the reports cover.
    pub texts: u64,
    /// Leading-digit test result.
    pub benford: Result<BenfordReport, AnalysisError>,
    /// Rank-frequency test result.
    pub zipf: Result<ZipfReport, AnalysisError>,
    /// Reading of `benford`, when it succeeded.
    pub benford_verdict: Option<BenfordVerdict>,
    /// Reading of `zipf`, when it succeeded.
    pub zipf_verdict: Option<ZipfVerdict>,
}

/// Incremental accumulator for the Benford and Zipf tests.
#[derive(Debug, Clone)]
pub struct Corpus {
    extractor: NumberExtractor,
    tokenizer: Tokenizer,
    digits: DigitHistogram,
    words: FrequencyTable,
    policy: AnalysisPolicy,
    metrics: CorpusMetrics,
    /// Reusable buffer for extracted numbers (avoids allocation per text)
    number_buf: Vec<NumericToken>,
    /// Reusable buffer for cleaned text
    cleaned_buf: String,
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

impl Corpus {
    /// Creates an empty corpus with the default policy.
    pub fn new() -> Self {
        Self::with_policy(AnalysisPolicy::default())
    }

    /// Creates an empty corpus with a custom policy.
    pub fn with_policy(policy: AnalysisPolicy) -> Self {
        Self {
            extractor: NumberExtractor::new(),
            tokenizer: Tokenizer::new(),
            digits: DigitHistogram::new(),
            words: FrequencyTable::new(),
            policy,
            metrics: CorpusMetrics::default(),
            number_buf: Vec::with_capacity(64),
            cleaned_buf: String::with_capacity(256),
        }
    }

    /// Policy used by [`report`](Self::report).
    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    /// Extracts numbers and word tokens from `text`.
    pub fn add(&mut self, text: &str) {
        self.number_buf.clear();
        self.extractor
            .extract_into(text, &mut self.number_buf, &mut self.cleaned_buf);

        let before = self.digits.total();
        self.digits
            .extend(self.number_buf.iter().filter_map(|t| leading_digit(t.value)));
        let digits = self.digits.total() - before;

        let tokens = self
            .words
            .extend_from_text(&self.tokenizer, &self.cleaned_buf);

        self.metrics.texts += 1;
        self.metrics.bytes += text.len() as u64;
        self.metrics.numbers += self.number_buf.len() as u64;
        self.metrics.digits += digits;
        self.metrics.tokens += tokens;
    }

    /// Adds every text, returning how many were added.
    pub fn add_batch<I, S>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for text in texts {
            self.add(text.as_ref());
            added += 1;
        }
        debug!(added, total = self.metrics.texts, "corpus batch ingested");
        added
    }

    /// Folds another corpus into this one. The policy of `self` is kept.
    pub fn merge(&mut self, other: &Corpus) {
        self.digits.merge(&other.digits);
        self.words.merge(&other.words);
        self.metrics.texts += other.metrics.texts;
        self.metrics.bytes += other.metrics.bytes;
        self.metrics.numbers += other.metrics.numbers;
        self.metrics.digits += other.metrics.digits;
        self.metrics.tokens += other.metrics.tokens;
    }

    /// Number of texts added.
    #[inline]
    pub fn len(&self) -> usize {
        self.metrics.texts as usize
    }

    /// Returns `true` if no text has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metrics.texts == 0
    }

    /// Drops everything ingested. Buffers keep their capacity.
    pub fn clear(&mut self) {
        self.digits.clear();
        self.words.clear();
        self.metrics = CorpusMetrics::default();
    }

    /// Snapshot of the ingest counters.
    pub fn metrics(&self) -> CorpusMetrics {
        CorpusMetrics {
            distinct_tokens: self.words.len(),
            ..self.metrics
        }
    }

    /// Accumulated leading digits.
    pub fn digits(&self) -> &DigitHistogram {
        &self.digits
    }

    /// Accumulated word counts.
    pub fn words(&self) -> &FrequencyTable {
        &self.words
    }

    /// Runs the Benford test on everything added so far.
    pub fn benford(&self) -> Result<BenfordReport, AnalysisError> {
        BenfordTest::from_policy(&self.policy).run_histogram(&self.digits)
    }

    /// Runs the Zipf test on everything added so far.
    pub fn zipf(&self) -> Result<ZipfReport, AnalysisError> {
        ZipfTest::new().run_table(&self.words)
    }

    /// Runs both tests and reads them against the policy.
    pub fn report(&self) -> CorpusReport {
        let benford = self.benford();
        let zipf = self.zipf();

        let benford_verdict = benford
            .as_ref()
            .ok()
            .map(|r| BenfordVerdict::assess(r, &self.policy));
        let zipf_verdict = zipf
            .as_ref()
            .ok()
            .map(|r| ZipfVerdict::assess(r, &self.policy));

        debug!(
            texts = self.metrics.texts,
            digits = self.digits.total(),
            tokens = self.words.total(),
            ?benford_verdict,
            ?zipf_verdict,
            "corpus report"
        );

        CorpusReport {
            texts: self.metrics.texts,
            benford,
            zipf,
            benford_verdict,
            zipf_verdict,
        }
    }
}

/// Corpora keyed by group tag, iterated in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GroupedCorpus {
    policy: AnalysisPolicy,
    index: FxHashMap<String, usize>,
    groups: Vec<(String, Corpus)>,
}

impl GroupedCorpus {
    /// Creates an empty collection with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection whose groups use `policy`.
    pub fn with_policy(policy: AnalysisPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Adds `text` to the corpus for `tag`, creating it on first use.
    pub fn add(&mut self, tag: &str, text: &str) {
        self.group_mut(tag).add(text);
    }

    /// Corpus for `tag`, created empty if missing.
    pub fn group_mut(&mut self, tag: &str) -> &mut Corpus {
        let slot = match self.index.get(tag) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.index.insert(tag.to_owned(), slot);
                self.groups
                    .push((tag.to_owned(), Corpus::with_policy(self.policy)));
                debug!(tag, "new corpus group");
                slot
            }
        };
        &mut self.groups[slot].1
    }

    /// Corpus for `tag`, if any text was added under it.
    pub fn get(&self, tag: &str) -> Option<&Corpus> {
        self.index.get(tag).map(|&slot| &self.groups[slot].1)
    }

    /// `(tag, corpus)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Corpus)> + '_ {
        self.groups.iter().map(|(tag, corpus)| (tag.as_str(), corpus))
    }

    /// Reports for every group, in first-seen order.
    pub fn reports(&self) -> Vec<(&str, CorpusReport)> {
        self.iter()
            .map(|(tag, corpus)| (tag, corpus.report()))
            .collect()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::numeric::split_numbers_and_text;
    use conform_types::TestKind;

    #[test]
    fn empty_corpus_reports_insufficient_data() {
        let report = Corpus::new().report();
        assert_eq!(report.texts, 0);
        assert!(matches!(
            report.benford,
            Err(AnalysisError::InsufficientData {
                test: TestKind::Benford,
                ..
            })
        ));
        assert!(matches!(
            report.zipf,
            Err(AnalysisError::InsufficientData {
                test: TestKind::Zipf,
                ..
            })
        ));
        assert!(report.benford_verdict.is_none());
        assert!(report.zipf_verdict.is_none());
    }

    #[test]
    fn add_counts_numbers_and_words() {
        let mut corpus = Corpus::new();
        corpus.add("Values: 10, 20, 30, 400, 5000");
        let metrics = corpus.metrics();
        assert_eq!(metrics.texts, 1);
        assert_eq!(metrics.numbers, 5);
        assert_eq!(metrics.digits, 5);
        assert_eq!(metrics.tokens, 1);
        assert_eq!(corpus.digits().counts(), &[1, 1, 1, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn dates_never_reach_either_test() {
        let mut corpus = Corpus::new();
        corpus.add("On 2025-09-23 at 12:34:56 the value 3.14 was noted. Serial ABC-12345-678");
        assert_eq!(corpus.digits().total(), 1);
        assert_eq!(corpus.words().get("abc"), 0);
        assert_eq!(corpus.words().get("serial"), 1);
    }

    #[test]
    fn matches_batch_testers() {
        let texts = [
            "Revenue was $1,234.56 and costs (1,000) in Q3.",
            "The the the cat sat on 3 mats and 17 hats.",
            "Total: 250 items, 99 returned, 4.5% margin.",
        ];

        let mut corpus = Corpus::new();
        assert_eq!(corpus.add_batch(texts), 3);

        let extracted: Vec<_> = texts.iter().map(|t| split_numbers_and_text(t)).collect();
        let benford = BenfordTest::default()
            .run_values(extracted.iter().flat_map(|e| e.values()))
            .unwrap();
        let zipf = ZipfTest::new()
            .run(extracted.iter().map(|e| e.cleaned.as_str()))
            .unwrap();

        assert_eq!(corpus.benford().unwrap(), benford);
        assert_eq!(corpus.zipf().unwrap(), zipf);
    }

    #[test]
    fn report_attaches_verdicts() {
        let mut corpus = Corpus::with_policy(AnalysisPolicy::lenient());
        corpus.add("alpha beta alpha gamma 12 345");
        let report = corpus.report();
        assert_eq!(report.benford_verdict, Some(BenfordVerdict::SmallSample));
        assert_eq!(report.zipf_verdict, Some(ZipfVerdict::Inconclusive));
    }

    #[test]
    fn clear_resets() {
        let mut corpus = Corpus::new();
        corpus.add("one two 3");
        corpus.clear();
        assert!(corpus.is_empty());
        assert_eq!(corpus.metrics(), CorpusMetrics::default());
        assert!(corpus.benford().is_err());
    }

    #[test]
    fn merge_equals_sequential() {
        let mut a = Corpus::new();
        let mut b = Corpus::new();
        a.add("red green 12 blue");
        b.add("green blue 7 blue 81");

        let mut whole = Corpus::new();
        whole.add("red green 12 blue");
        whole.add("green blue 7 blue 81");

        a.merge(&b);
        assert_eq!(a.metrics(), whole.metrics());
        assert_eq!(a.benford(), whole.benford());
        assert_eq!(a.zipf(), whole.zipf());
    }

    #[test]
    fn groups_in_first_seen_order() {
        let mut grouped = GroupedCorpus::new();
        grouped.add("model-b", "x y 1");
        grouped.add("model-a", "x 2");
        grouped.add("model-b", "z 3");

        let tags: Vec<&str> = grouped.iter().map(|(tag, _)| tag).collect();
        assert_eq!(tags, vec!["model-b", "model-a"]);
        assert_eq!(grouped.get("model-b").map(Corpus::len), Some(2));
        assert!(grouped.get("model-c").is_none());
        assert_eq!(grouped.reports().len(), 2);
    }

    #[test]
    fn grouped_policy_applies_to_groups() {
        let mut grouped = GroupedCorpus::with_policy(AnalysisPolicy::strict());
        grouped.add("g", "text");
        assert_eq!(
            grouped.get("g").map(|c| *c.policy()),
            Some(AnalysisPolicy::strict())
        );
    }

    #[test]
    fn types_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Corpus>();
        assert_send_sync::<GroupedCorpus>();
        assert_send_sync::<CorpusReport>();
    }

    #[test]
    fn parallel_workers_merge() {
        let chunks: Vec<Vec<String>> = (0..4)
            .map(|w| {
                (0..25)
                    .map(|i| format!("worker {} line {} costs {} units", w, i, (w + 1) * 100 + i))
                    .collect()
            })
            .collect();

        let partials: Vec<Corpus> = std::thread::scope(|s| {
            let handles: Vec<_> = chunks
                .iter()
                .map(|chunk| {
                    s.spawn(move || {
                        let mut corpus = Corpus::new();
                        corpus.add_batch(chunk);
                        corpus
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut merged = Corpus::new();
        for part in &partials {
            merged.merge(part);
        }

        let mut sequential = Corpus::new();
        for chunk in &chunks {
            sequential.add_batch(chunk);
        }

        assert_eq!(merged.len(), 100);
        assert_eq!(merged.benford(), sequential.benford());
        assert_eq!(merged.zipf(), sequential.zipf());
    }
}
