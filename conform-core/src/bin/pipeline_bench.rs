//! Pipeline Throughput Benchmark
//!
//! Measures how fast the analysis pipeline chews through a large text file,
//! for example a dump of collected model responses or a plain-text corpus.
//!
//! ## Stages
//!
//! 1. **Extract**: numeric token extraction plus cleaned-text output
//! 2. **Tokenize**: word tokenization of the raw input
//! 3. **Pipeline**: extraction, leading digits and word counting per line,
//!    through [`Corpus`], then both reports
//!
//! ## Usage
//!
//! ```bash
//! ./target/release/pipeline_bench /path/to/responses.txt
//! ./target/release/pipeline_bench /path/to/responses.txt --mode extract
//! ```
//!
//! ## Example Output
//!
//! ```text
//! --------------------------------
//! Stage       : Pipeline
//! Elapsed     : 0.812 s
//! Throughput  : 0.241 GiB/s
//! Numbers     : 4_120_339
//! Tokens      : 38_402_117
//! Tokens/sec  : 47_293_247
//! --------------------------------
//! ```
//!
//! Build with `--release`; use inputs of 100MB or more for stable numbers.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use conform_core::analyzer::numeric::NumberExtractor;
use conform_core::analyzer::tokenizer::Tokenizer;
use conform_core::corpus::Corpus;

const WARMUP_RUNS: usize = 1;
const MEASURE_RUNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Extract,
    Tokenize,
    Pipeline,
    All,
}

#[derive(Parser, Debug)]
#[command(name = "pipeline_bench")]
#[command(about = "Throughput of number extraction, tokenization and the full pipeline", long_about = None)]
struct Cli {
    /// UTF-8 text file
    path: PathBuf,

    /// Stage to measure
    #[arg(long, value_enum, default_value = "all")]
    mode: Mode,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    numbers: u64,
    tokens: u64,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    println!("Loading file...");
    let input = fs::read_to_string(&args.path)
        .with_context(|| format!("reading {} as UTF-8", args.path.display()))?;

    println!("File size: {}", fmt_bytes(input.len() as u64));
    println!("Lines:     {}\n", fmt_count(input.lines().count() as u64));

    if matches!(args.mode, Mode::Extract | Mode::All) {
        bench_extract(&input);
    }
    if matches!(args.mode, Mode::Tokenize | Mode::All) {
        bench_tokenize(&input);
    }
    if matches!(args.mode, Mode::Pipeline | Mode::All) {
        bench_pipeline(&input);
    }

    Ok(())
}

fn bench_extract(input: &str) {
    let mut extractor = NumberExtractor::new();
    let mut numbers = Vec::new();
    let mut cleaned = String::with_capacity(input.len());

    println!("=== Extract ===");

    let mut run = || {
        numbers.clear();
        extractor.extract_into(input, &mut numbers, &mut cleaned);
        std::hint::black_box(cleaned.len());
        numbers.len() as u64
    };

    warmup(|| {
        run();
    });

    let mut counts = Counts::default();
    let elapsed = measure(|| {
        counts.numbers = run();
    });

    print_perf("Extract", input.len(), elapsed, counts);
}

fn bench_tokenize(input: &str) {
    let tokenizer = Tokenizer::new();

    println!("=== Tokenize ===");

    warmup(|| {
        std::hint::black_box(tokenizer.tokens(input).count());
    });

    let mut counts = Counts::default();
    let elapsed = measure(|| {
        let mut local = 0u64;
        for token in tokenizer.tokens(input) {
            std::hint::black_box(token);
            local += 1;
        }
        counts.tokens = local;
    });

    print_perf("Tokenize", input.len(), elapsed, counts);
}

fn bench_pipeline(input: &str) {
    println!("=== Pipeline ===");

    let run = || {
        let mut corpus = Corpus::new();
        corpus.add_batch(input.lines());
        std::hint::black_box(corpus.report());
        corpus.metrics()
    };

    warmup(|| {
        run();
    });

    let mut counts = Counts::default();
    let elapsed = measure(|| {
        let metrics = run();
        counts = Counts {
            numbers: metrics.numbers,
            tokens: metrics.tokens,
        };
    });

    print_perf("Pipeline", input.len(), elapsed, counts);
}

fn warmup<F: FnMut()>(mut f: F) {
    for _ in 0..WARMUP_RUNS {
        f();
    }
}

fn measure<F: FnMut()>(mut f: F) -> Duration {
    let mut total = Duration::ZERO;

    for _ in 0..MEASURE_RUNS {
        let start = Instant::now();
        f();
        total += start.elapsed();
    }

    total / MEASURE_RUNS as u32
}

fn print_perf(stage: &str, input_bytes: usize, elapsed: Duration, counts: Counts) {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    let gib = input_bytes as f64 / (1024.0 * 1024.0 * 1024.0);

    println!("--------------------------------");
    println!("Stage       : {}", stage);
    println!("Elapsed     : {:.3} s", secs);
    println!("Throughput  : {:.3} GiB/s", gib / secs);

    if counts.numbers > 0 {
        println!("Numbers     : {}", fmt_count(counts.numbers));
    }
    if counts.tokens > 0 {
        println!("Tokens      : {}", fmt_count(counts.tokens));
        println!(
            "Tokens/sec  : {}",
            fmt_count((counts.tokens as f64 / secs) as u64)
        );
    }

    println!("--------------------------------\n");
}

fn fmt_bytes(b: u64) -> String {
    const UNITS: [(&str, u64); 3] = [("GiB", 1 << 30), ("MiB", 1 << 20), ("KiB", 1 << 10)];
    UNITS
        .iter()
        .find(|(_, size)| b >= *size)
        .map_or_else(
            || format!("{} B", b),
            |(unit, size)| format!("{:.2} {}", b as f64 / *size as f64, unit),
        )
}

/// `1234567` -> `1_234_567`
fn fmt_count(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.char_indices() {
        if i > 0 && (i + 3 - head) % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }
    out
}
