//! Longest-common-subsequence alignment between two token sequences.
//!
//! The aligner fills a full suffix table, so time and memory are both
//! O(n·m) in the token counts. That is comfortable for sentence-length input
//! (a few hundred characters) but is not suitable for paragraph-scale text;
//! larger inputs need a windowed or hash-based diff instead.

use std::ops::Range;

use super::error::DiffError;
use super::tokens::{Granularity, Tokenized};

/// Kind of edit represented by a [`TextSpan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Both sides carry the same tokens.
    Equal,
    /// Source tokens were replaced by different target tokens.
    Replace,
    /// Tokens exist only in the target.
    Insert,
    /// Tokens exist only in the source.
    Delete,
}

/// One unit of an alignment.
///
/// Ranges are token indices, not byte offsets. An `Insert` span has an empty
/// source range positioned where the insertion happens, and a `Delete` span
/// has an empty target range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// Edit classification.
    pub kind: SpanKind,
    /// Covered source token indices.
    pub source: Range<usize>,
    /// Covered target token indices.
    pub target: Range<usize>,
}

/// Text of one span on both sides of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Edit classification.
    pub kind: SpanKind,
    /// Source text covered by the span.
    pub source: &'a str,
    /// Target text covered by the span.
    pub target: &'a str,
}

/// Ordered spans covering a source and a target sequence completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    spans: Vec<TextSpan>,
    source_len: usize,
    target_len: usize,
    granularity: Granularity,
}

impl Alignment {
    /// Aligns two texts at the requested granularity.
    #[must_use]
    pub fn between(source: &str, target: &str, granularity: Granularity) -> Self {
        let source_tokens = Tokenized::new(source, granularity);
        let target_tokens = Tokenized::new(target, granularity);
        Self::from_tokenized(&source_tokens, &target_tokens, granularity)
    }

    pub(crate) fn from_tokenized(
        source: &Tokenized<'_>,
        target: &Tokenized<'_>,
        granularity: Granularity,
    ) -> Self {
        Self {
            spans: align(source.tokens(), target.tokens()),
            source_len: source.len(),
            target_len: target.len(),
            granularity,
        }
    }

    /// Spans in sequence order.
    #[must_use]
    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// Number of source tokens.
    #[must_use]
    pub const fn source_len(&self) -> usize {
        self.source_len
    }

    /// Number of target tokens.
    #[must_use]
    pub const fn target_len(&self) -> usize {
        self.target_len
    }

    /// Granularity the alignment was computed at.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Total number of tokens covered by `Equal` spans.
    #[must_use]
    pub fn equal_len(&self) -> usize {
        self.spans
            .iter()
            .filter(|span| span.kind == SpanKind::Equal)
            .map(|span| span.source.len())
            .sum()
    }

    /// Resolves every span to the text it covers on both sides.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::TextMismatch`] when either text does not
    /// tokenise to the length this alignment was computed for.
    pub fn segments<'a>(
        &self,
        source: &'a str,
        target: &'a str,
    ) -> Result<Vec<Segment<'a>>, DiffError> {
        let source_tokens = Tokenized::new(source, self.granularity);
        let target_tokens = Tokenized::new(target, self.granularity);

        if source_tokens.len() != self.source_len || target_tokens.len() != self.target_len {
            return Err(DiffError::TextMismatch {
                expected_source: self.source_len,
                actual_source: source_tokens.len(),
                expected_target: self.target_len,
                actual_target: target_tokens.len(),
            });
        }

        Ok(self.segments_of(&source_tokens, &target_tokens))
    }

    pub(crate) fn segments_of<'a>(
        &self,
        source: &Tokenized<'a>,
        target: &Tokenized<'a>,
    ) -> Vec<Segment<'a>> {
        self.spans
            .iter()
            .map(|span| Segment {
                kind: span.kind,
                source: source.slice(&span.source),
                target: target.slice(&span.target),
            })
            .collect()
    }
}

/// Computes a minimal-edit alignment between two sequences.
///
/// Equal spans cover a longest common subsequence. Unmatched gaps become
/// `Replace` when both sides have tokens, otherwise `Insert` or `Delete`.
/// When several alignments share the same cost, the earliest matching tokens
/// win, so identical inputs always produce identical spans.
#[must_use]
pub fn align<T: PartialEq>(source: &[T], target: &[T]) -> Vec<TextSpan> {
    let table = SuffixTable::build(source, target);
    let mut builder = SpanBuilder::default();
    let mut source_index = 0;
    let mut target_index = 0;

    while source_index < source.len() && target_index < target.len() {
        if source.get(source_index) == target.get(target_index) {
            builder.push(EditOp::Equal);
            source_index += 1;
            target_index += 1;
        } else if table.at(source_index + 1, target_index)
            >= table.at(source_index, target_index + 1)
        {
            builder.push(EditOp::Delete);
            source_index += 1;
        } else {
            builder.push(EditOp::Insert);
            target_index += 1;
        }
    }

    for _ in source_index..source.len() {
        builder.push(EditOp::Delete);
    }
    for _ in target_index..target.len() {
        builder.push(EditOp::Insert);
    }

    builder.finish()
}

/// LCS lengths of every pair of suffixes, stored row-major.
struct SuffixTable {
    cells: Vec<usize>,
    width: usize,
}

impl SuffixTable {
    fn build<T: PartialEq>(source: &[T], target: &[T]) -> Self {
        let width = target.len() + 1;
        let mut table = Self {
            cells: vec![0; (source.len() + 1) * width],
            width,
        };

        for (row, source_item) in source.iter().enumerate().rev() {
            for (column, target_item) in target.iter().enumerate().rev() {
                let value = if source_item == target_item {
                    table.at(row + 1, column + 1) + 1
                } else {
                    table.at(row + 1, column).max(table.at(row, column + 1))
                };
                table.set(row, column, value);
            }
        }

        table
    }

    fn at(&self, row: usize, column: usize) -> usize {
        self.cells
            .get(row * self.width + column)
            .copied()
            .unwrap_or(0)
    }

    fn set(&mut self, row: usize, column: usize, value: usize) {
        if let Some(cell) = self.cells.get_mut(row * self.width + column) {
            *cell = value;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditOp {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    equal: bool,
    source_start: usize,
    target_start: usize,
}

/// Folds single-token edit operations into maximal spans.
#[derive(Debug, Default)]
struct SpanBuilder {
    spans: Vec<TextSpan>,
    source_position: usize,
    target_position: usize,
    run: Option<Run>,
}

impl SpanBuilder {
    fn push(&mut self, op: EditOp) {
        let equal = op == EditOp::Equal;
        if self.run.is_some_and(|run| run.equal != equal) {
            self.flush();
        }
        if self.run.is_none() {
            self.run = Some(Run {
                equal,
                source_start: self.source_position,
                target_start: self.target_position,
            });
        }

        match op {
            EditOp::Equal => {
                self.source_position += 1;
                self.target_position += 1;
            }
            EditOp::Delete => self.source_position += 1,
            EditOp::Insert => self.target_position += 1,
        }
    }

    fn flush(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };

        let source = run.source_start..self.source_position;
        let target = run.target_start..self.target_position;
        let kind = if run.equal {
            SpanKind::Equal
        } else if source.is_empty() {
            SpanKind::Insert
        } else if target.is_empty() {
            SpanKind::Delete
        } else {
            SpanKind::Replace
        };

        self.spans.push(TextSpan {
            kind,
            source,
            target,
        });
    }

    fn finish(mut self) -> Vec<TextSpan> {
        self.flush();
        self.spans
    }
}
