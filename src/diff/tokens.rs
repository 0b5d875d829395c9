//! Tokenisation of text into alignment units.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Unit of comparison used when aligning two texts.
///
/// Character and word granularity produce materially different change
/// ratios for the same pair of texts, so a deployment picks one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Compare user-perceived characters (extended grapheme clusters).
    #[default]
    Character,
    /// Compare words, whitespace runs, and punctuation as separate tokens.
    Word,
}

impl Granularity {
    /// Human-readable label used in output and configuration.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Word => "word",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Parse error for [`Granularity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported diff granularity '{value}': valid options are 'character' or 'word'")]
pub struct GranularityParseError {
    value: String,
}

impl FromStr for Granularity {
    type Err = GranularityParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "character" | "char" => Ok(Self::Character),
            "word" => Ok(Self::Word),
            _ => Err(GranularityParseError {
                value: value.to_owned(),
            }),
        }
    }
}

/// Text split into tokens together with the byte offset of every boundary.
///
/// Tokens are contiguous, so `offsets` has one more entry than `tokens` and
/// concatenating the tokens reproduces the text exactly.
#[derive(Debug, Clone)]
pub(crate) struct Tokenized<'a> {
    text: &'a str,
    tokens: Vec<&'a str>,
    offsets: Vec<usize>,
}

impl<'a> Tokenized<'a> {
    pub(crate) fn new(text: &'a str, granularity: Granularity) -> Self {
        let tokens = tokenize(text, granularity);
        let mut offsets = Vec::with_capacity(tokens.len() + 1);
        let mut position = 0;
        offsets.push(position);
        for token in &tokens {
            position += token.len();
            offsets.push(position);
        }

        Self {
            text,
            tokens,
            offsets,
        }
    }

    pub(crate) fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    pub(crate) const fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns the text covered by a range of token indices.
    pub(crate) fn slice(&self, range: &Range<usize>) -> &'a str {
        let start = self.offsets.get(range.start).copied();
        let end = self.offsets.get(range.end).copied();
        match (start, end) {
            (Some(from), Some(to)) => self.text.get(from..to).unwrap_or_default(),
            _ => "",
        }
    }
}

/// Splits `text` into tokens whose concatenation is exactly `text`.
///
/// Word tokens follow Unicode word boundaries, so scripts written without
/// spaces (such as Chinese) still split into one token per ideograph.
#[must_use]
pub fn tokenize(text: &str, granularity: Granularity) -> Vec<&str> {
    match granularity {
        Granularity::Character => text.graphemes(true).collect(),
        Granularity::Word => text.split_word_bounds().collect(),
    }
}
