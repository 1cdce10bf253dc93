//! Prompt grouping rules.
//!
//! A [`RuleSet`] maps a prompt to a group tag so responses can be analyzed
//! per prompt type. Rules are tried in order and the first match wins; a
//! prompt no rule matches gets the fallback tag.
//!
//! Rule files are JSON in one of two shapes:
//!
//! ```json
//! {"List the prices of ten items": "receipt"}
//! ```
//!
//! ```json
//! [
//!   {"pattern": "invoice|receipt", "type": "receipt", "regex": true, "flags": "i"},
//!   {"pattern": "Describe a sensor log", "type": "sensor"}
//! ]
//! ```
//!
//! Prompts are trimmed before matching. Exact rules compare the whole
//! trimmed prompt; regex rules match anywhere in it.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Tag assigned when no rule matches.
pub const DEFAULT_FALLBACK: &str = "other";

/// Errors building a [`RuleSet`].
#[derive(Error, Debug)]
pub enum RuleError {
    /// A regex rule failed to compile.
    #[error("rule {index}: invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// Position of the rule in the file.
        index: usize,
        /// The offending pattern.
        pattern: String,
        /// Compiler error.
        #[source]
        source: regex::Error,
    },

    /// A regex rule named a flag other than `i`, `m`, `s` or `x`.
    #[error("rule {index}: unknown regex flag {flag:?}")]
    UnknownFlag {
        /// Position of the rule in the file.
        index: usize,
        /// The unrecognized flag character.
        flag: char,
    },

    /// The rule file is not valid JSON in either accepted shape.
    #[error("invalid rule file: {0}")]
    Json(#[from] serde_json::Error),
}

/// One classification rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Matches when the trimmed prompt equals `pattern`.
    Exact {
        /// Prompt text to compare against.
        pattern: String,
        /// Group tag on match.
        tag: String,
    },
    /// Matches when `regex` finds a match anywhere in the trimmed prompt.
    Pattern {
        /// Compiled pattern.
        regex: Regex,
        /// Group tag on match.
        tag: String,
    },
}

impl Rule {
    /// Exact-match rule.
    pub fn exact(pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        Rule::Exact {
            pattern: pattern.into(),
            tag: tag.into(),
        }
    }

    /// Regex rule with flags from `"imsx"`.
    pub fn pattern(pattern: &str, flags: &str, tag: impl Into<String>) -> Result<Self, RuleError> {
        let spec = RuleSpec {
            pattern: pattern.to_owned(),
            tag: tag.into(),
            regex: true,
            flags: Some(flags.to_owned()),
        };
        spec.compile(0)
    }

    /// Group tag this rule assigns.
    pub fn tag(&self) -> &str {
        match self {
            Rule::Exact { tag, .. } | Rule::Pattern { tag, .. } => tag,
        }
    }

    /// Returns `true` if the rule matches an already-trimmed prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        match self {
            Rule::Exact { pattern, .. } => prompt == pattern,
            Rule::Pattern { regex, .. } => regex.is_match(prompt),
        }
    }
}

/// Entry of the list-shaped rule file.
#[derive(Debug, Clone, Deserialize)]
struct RuleSpec {
    pattern: String,
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    regex: bool,
    #[serde(default)]
    flags: Option<String>,
}

impl RuleSpec {
    fn compile(self, index: usize) -> Result<Rule, RuleError> {
        if !self.regex {
            return Ok(Rule::Exact {
                pattern: self.pattern,
                tag: self.tag,
            });
        }

        let mut builder = RegexBuilder::new(&self.pattern);
        for flag in self.flags.as_deref().unwrap_or("").chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => return Err(RuleError::UnknownFlag { index, flag: other }),
            };
        }

        let regex = builder.build().map_err(|source| RuleError::InvalidPattern {
            index,
            pattern: self.pattern.clone(),
            source,
        })?;

        Ok(Rule::Pattern {
            regex,
            tag: self.tag,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Map(BTreeMap<String, String>),
    List(Vec<RuleSpec>),
}

/// Ordered rules plus a fallback tag.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    fallback: String,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK)
    }
}

impl RuleSet {
    /// Creates an empty set; every prompt gets `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Appends a rule. Earlier rules take precedence.
    pub fn push(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Parses a rule file in the map or list shape.
    ///
    /// # Errors
    /// - [`RuleError::Json`] if the document fits neither shape.
    /// - [`RuleError::InvalidPattern`] / [`RuleError::UnknownFlag`] for a bad regex rule.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let file: RuleFile = serde_json::from_str(json)?;
        let mut set = Self::default();

        match file {
            RuleFile::Map(map) => {
                for (pattern, tag) in map {
                    set.rules.push(Rule::Exact { pattern, tag });
                }
            }
            RuleFile::List(specs) => {
                for (index, spec) in specs.into_iter().enumerate() {
                    set.rules.push(spec.compile(index)?);
                }
            }
        }

        debug!(rules = set.rules.len(), "loaded prompt rules");
        Ok(set)
    }

    /// Replaces the fallback tag.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Tag for `prompt`: the first matching rule's, or the fallback.
    pub fn classify(&self, prompt: &str) -> &str {
        let prompt = prompt.trim();
        self.rules
            .iter()
            .find(|rule| rule.matches(prompt))
            .map_or(self.fallback.as_str(), Rule::tag)
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
