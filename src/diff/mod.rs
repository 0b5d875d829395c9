//! Alignment, change measurement, and highlighted rendering of text pairs.
//!
//! The engine compares an original sentence with its rewrite:
//!
//! - [`align`] computes an LCS-based [`Alignment`] over character or word
//!   tokens.
//! - [`change_ratio`] and [`ChangeReport`] measure how much was changed.
//! - [`DiffRenderer`] produces escaped, marked-up text for both sides.

mod align;
mod error;
mod metric;
mod render;
mod tokens;

pub use align::{Alignment, Segment, SpanKind, TextSpan, align};
pub use error::DiffError;
pub use metric::{ChangeReport, change_ratio, percent_changed};
pub use render::{
    DiffRenderer, MarkedDiff, MarkupFormat, MarkupFormatParseError, escape_control, render,
};
pub use tokens::{Granularity, GranularityParseError, tokenize};

use tokens::Tokenized;

/// Aligns, measures, and renders a pair of texts in one pass.
///
/// Tokenisation happens once and the same tokens feed every step, so unlike
/// [`render`] this cannot fail with [`DiffError::TextMismatch`].
#[must_use]
pub fn compare(
    source: &str,
    target: &str,
    granularity: Granularity,
    renderer: &DiffRenderer,
) -> (ChangeReport, MarkedDiff) {
    let source_tokens = Tokenized::new(source, granularity);
    let target_tokens = Tokenized::new(target, granularity);
    let alignment = Alignment::from_tokenized(&source_tokens, &target_tokens, granularity);
    let marked = renderer.render_segments(&alignment.segments_of(&source_tokens, &target_tokens));

    (ChangeReport::from_alignment(alignment), marked)
}
