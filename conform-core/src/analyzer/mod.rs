//! Text analysis pipeline.
//!
//! This module provides the text processing components:
//! - **Cleaner**: Finds date/time/serial spans and blanks spans out of text
//! - **Numeric**: Extracts numeric tokens and the cleaned text
//! - **Tokenizer**: Splits cleaned text into lowercase word tokens

pub mod cleaner;
pub mod numeric;
pub mod tokenizer;

pub use numeric::{extract_numbers, split_numbers_and_text, Extraction, NumberExtractor};
pub use tokenizer::Tokenizer;
