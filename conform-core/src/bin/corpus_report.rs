//! Corpus Conformance Report
//!
//! Reads collected model responses from a JSONL file, groups them and prints
//! Benford and Zipf statistics per group.
//!
//! ## Input
//!
//! One JSON object per record with optional `prompt`, `response` and `model`
//! fields. Several objects on one line and objects spanning lines are both
//! accepted; reading stops at the first malformed object.
//!
//! ```json
//! {"prompt": "Write a grocery receipt", "response": "Milk $3.49 ...", "model": "m1"}
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # One row per model
//! ./target/release/corpus_report responses.jsonl
//!
//! # One row per prompt type, using a rule file
//! ./target/release/corpus_report responses.jsonl --group-by prompt --rules prompts_meta.json
//!
//! # Whole file as one corpus, JSON lines out, stricter thresholds
//! ./target/release/corpus_report responses.jsonl --group-by none --format json --policy strict.toml
//!
//! # Spreadsheet-friendly summary
//! ./target/release/corpus_report responses.jsonl --format csv > stats_summary.csv
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use conform_core::classify::RuleSet;
use conform_core::corpus::{CorpusReport, GroupedCorpus};
use conform_core::stats::{BenfordVerdict, ZipfVerdict};
use conform_core::AnalysisPolicy;

/// How responses are grouped into corpora
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupBy {
    /// One corpus per `model` field
    Model,
    /// One corpus per prompt type, via `--rules`
    Prompt,
    /// Everything in one corpus
    None,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned table
    Text,
    /// One JSON object per group
    Json,
    /// Header plus one comma-separated row per group
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "corpus_report")]
#[command(version)]
#[command(about = "Benford and Zipf conformance of collected model responses", long_about = None)]
struct Cli {
    /// JSONL file of {prompt, response, model} records
    input: PathBuf,

    /// Grouping key
    #[arg(long = "group-by", value_enum, default_value = "model")]
    group_by: GroupBy,

    /// Prompt rule file (exact map or rule list); used with --group-by prompt
    #[arg(long = "rules", value_name = "FILE")]
    rules: Option<PathBuf>,

    /// TOML file overriding interpretation thresholds
    #[arg(long = "policy", value_name = "FILE")]
    policy: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log pipeline internals to stderr
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Record {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

/// One output row. Missing statistics stay `None` rather than zero.
#[derive(Debug, Serialize)]
struct Row<'a> {
    group: &'a str,
    n_responses: u64,
    benford_n: u64,
    benford_chi2: Option<f64>,
    benford_p: Option<f64>,
    benford_verdict: Option<BenfordVerdict>,
    zipf_tokens: Option<u64>,
    zipf_types: Option<usize>,
    zipf_slope: Option<f64>,
    zipf_r2: Option<f64>,
    zipf_verdict: Option<ZipfVerdict>,
}

impl<'a> Row<'a> {
    fn new(group: &'a str, report: &CorpusReport) -> Self {
        let benford = report.benford.as_ref().ok();
        let zipf = report.zipf.as_ref().ok();
        Self {
            group,
            n_responses: report.texts,
            benford_n: benford.map_or(0, |b| b.total()),
            benford_chi2: benford.map(|b| b.chi_square),
            benford_p: benford.map(|b| b.p_value),
            benford_verdict: report.benford_verdict,
            zipf_tokens: zipf.map(|z| z.total_tokens),
            zipf_types: zipf.map(|z| z.distinct_tokens()),
            zipf_slope: zipf.map(|z| z.slope),
            zipf_r2: zipf.map(|z| z.r_squared),
            zipf_verdict: report.zipf_verdict,
        }
    }
}

fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_policy(path: Option<&Path>) -> Result<AnalysisPolicy> {
    let Some(path) = path else {
        return Ok(AnalysisPolicy::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading policy file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing policy file {}", path.display()))
}

fn load_rules(path: Option<&Path>) -> Result<RuleSet> {
    let Some(path) = path else {
        return Ok(RuleSet::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading rule file {}", path.display()))?;
    RuleSet::from_json(&text).with_context(|| format!("parsing rule file {}", path.display()))
}

/// Groups records into corpora, returning the number of records skipped
/// for a missing or empty response.
fn group_records(
    records: &[Record],
    group_by: GroupBy,
    rules: &RuleSet,
    policy: AnalysisPolicy,
) -> (GroupedCorpus, usize) {
    let mut grouped = GroupedCorpus::with_policy(policy);
    let mut skipped = 0usize;
    for record in records {
        let Some(response) = record.response.as_deref().filter(|r| !r.is_empty()) else {
            skipped += 1;
            continue;
        };
        let tag = match group_by {
            GroupBy::Model => record.model.as_deref().unwrap_or("unknown"),
            GroupBy::Prompt => rules.classify(record.prompt.as_deref().unwrap_or("")),
            GroupBy::None => "all",
        };
        grouped.add(tag, response);
    }
    (grouped, skipped)
}

/// Parses every well-formed record, stopping at the first error.
fn read_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    for item in serde_json::Deserializer::from_str(text).into_iter::<Record>() {
        match item {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(line = err.line(), column = err.column(), %err, "stopping at malformed record");
                break;
            }
        }
    }
    records
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{:.*}", precision, v))
}

fn print_text(rows: &[Row<'_>]) {
    let width = rows.iter().map(|r| r.group.len()).max().unwrap_or(0).max(5);

    println!(
        "{:<width$}  {:>7}  {:>6}  {:>10}  {:>8}  {:>8}  {:>6}  {:>8}  {:>6}",
        "group", "texts", "digits", "chi2", "p", "tokens", "types", "slope", "r2",
    );
    println!("{}", "-".repeat(width + 78));

    for row in rows {
        println!(
            "{:<width$}  {:>7}  {:>6}  {:>10}  {:>8}  {:>8}  {:>6}  {:>8}  {:>6}",
            row.group,
            row.n_responses,
            row.benford_n,
            fmt_opt(row.benford_chi2, 3),
            fmt_opt(row.benford_p, 4),
            row.zipf_tokens.map_or_else(|| "-".to_owned(), |t| t.to_string()),
            row.zipf_types.map_or_else(|| "-".to_owned(), |t| t.to_string()),
            fmt_opt(row.zipf_slope, 3),
            fmt_opt(row.zipf_r2, 3),
        );
        let benford = row.benford_verdict.map_or("no numbers", BenfordVerdict::describe);
        let zipf = row.zipf_verdict.map_or("too few word types", ZipfVerdict::describe);
        println!("{:<width$}  benford: {}; zipf: {}", "", benford, zipf);
    }
}

fn print_json(rows: &[Row<'_>]) -> Result<()> {
    for row in rows {
        println!("{}", serde_json::to_string(row).context("serializing report row")?);
    }
    Ok(())
}

const CSV_HEADER: &str = "group,n_responses,benford_n,benford_chi2,benford_p,benford_verdict,\
zipf_tokens,zipf_types,zipf_slope,zipf_r2,zipf_verdict";

/// Quotes a field holding a comma, quote or line break, doubling inner quotes.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

/// Empty cell for a missing value.
fn cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

fn format_csv_row(row: &Row<'_>) -> String {
    [
        escape_field(row.group),
        row.n_responses.to_string(),
        row.benford_n.to_string(),
        cell(row.benford_chi2),
        cell(row.benford_p),
        cell(row.benford_verdict.map(BenfordVerdict::as_str)),
        cell(row.zipf_tokens),
        cell(row.zipf_types),
        cell(row.zipf_slope),
        cell(row.zipf_r2),
        cell(row.zipf_verdict.map(ZipfVerdict::as_str)),
    ]
    .join(",")
}

fn to_csv(rows: &[Row<'_>]) -> String {
    let mut output = String::from(CSV_HEADER);
    output.push('\n');
    for row in rows {
        output.push_str(&format_csv_row(row));
        output.push('\n');
    }
    output
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let policy = load_policy(args.policy.as_deref())?;
    let rules = load_rules(args.rules.as_deref())?;
    if args.group_by == GroupBy::Prompt && rules.is_empty() {
        warn!("grouping by prompt without rules; every record falls back to '{}'", rules.classify(""));
    }

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let records = read_records(&text);
    debug!(records = records.len(), "records loaded");

    let (grouped, skipped) = group_records(&records, args.group_by, &rules, policy);
    if skipped > 0 {
        warn!(skipped, "records with a missing or empty response were skipped");
    }

    let reports = grouped.reports();
    let rows: Vec<Row<'_>> = reports
        .iter()
        .map(|(group, report)| Row::new(group, report))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&rows),
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Csv => print!("{}", to_csv(&rows)),
    }

    Ok(())
}
