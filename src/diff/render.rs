//! Marked-up rendering of alignments for presentation.
//!
//! Both sides are rendered independently: removed text is highlighted on the
//! source side and added text on the target side. Every character from the
//! inputs is escaped for the chosen markup so provider output cannot inject
//! markup or terminal control sequences.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::align::{Alignment, Segment, SpanKind};
use super::error::DiffError;

const HTML_REMOVED_OPEN: &str = r#"<span class="diff-removed">"#;
const HTML_ADDED_OPEN: &str = r#"<span class="diff-added">"#;
const HTML_CLOSE: &str = "</span>";

const ANSI_REMOVED_OPEN: &str = "\u{1b}[9;31m";
const ANSI_ADDED_OPEN: &str = "\u{1b}[4;32m";
const ANSI_RESET: &str = "\u{1b}[0m";

/// Output markup used by [`DiffRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkupFormat {
    /// HTML `span` elements with `diff-removed` / `diff-added` classes.
    #[default]
    Html,
    /// ANSI colour sequences for terminal output.
    Terminal,
}

impl MarkupFormat {
    /// Human-readable label used in configuration.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Terminal => "terminal",
        }
    }

    const fn removed_open(self) -> &'static str {
        match self {
            Self::Html => HTML_REMOVED_OPEN,
            Self::Terminal => ANSI_REMOVED_OPEN,
        }
    }

    const fn added_open(self) -> &'static str {
        match self {
            Self::Html => HTML_ADDED_OPEN,
            Self::Terminal => ANSI_ADDED_OPEN,
        }
    }

    const fn close(self) -> &'static str {
        match self {
            Self::Html => HTML_CLOSE,
            Self::Terminal => ANSI_RESET,
        }
    }

    fn escape_into(self, output: &mut String, text: &str) {
        match self {
            Self::Html => escape_html(output, text),
            Self::Terminal => escape_terminal(output, text),
        }
    }
}

impl fmt::Display for MarkupFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Parse error for [`MarkupFormat`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported markup format '{value}': valid options are 'html' or 'terminal'")]
pub struct MarkupFormatParseError {
    value: String,
}

impl FromStr for MarkupFormat {
    type Err = MarkupFormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "terminal" | "ansi" => Ok(Self::Terminal),
            _ => Err(MarkupFormatParseError {
                value: value.to_owned(),
            }),
        }
    }
}

/// Marked-up source and target text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkedDiff {
    /// Source text with removed spans highlighted.
    pub source_marked: String,
    /// Target text with added spans highlighted.
    pub target_marked: String,
}

/// Renders alignments into a markup format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffRenderer {
    format: MarkupFormat,
}

impl DiffRenderer {
    /// Creates a renderer for the given format.
    #[must_use]
    pub const fn new(format: MarkupFormat) -> Self {
        Self { format }
    }

    /// Markup produced by this renderer.
    #[must_use]
    pub const fn format(&self) -> MarkupFormat {
        self.format
    }

    /// Renders `alignment` against the texts it was computed from.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::TextMismatch`] when the texts do not match the
    /// alignment.
    pub fn render(
        &self,
        alignment: &Alignment,
        source: &str,
        target: &str,
    ) -> Result<MarkedDiff, DiffError> {
        let segments = alignment.segments(source, target)?;
        Ok(self.render_segments(&segments))
    }

    /// Renders already-resolved segments.
    #[must_use]
    pub fn render_segments(&self, segments: &[Segment<'_>]) -> MarkedDiff {
        let mut marked = MarkedDiff::default();

        for segment in segments {
            match segment.kind {
                SpanKind::Equal => {
                    self.format
                        .escape_into(&mut marked.source_marked, segment.source);
                    self.format
                        .escape_into(&mut marked.target_marked, segment.target);
                }
                SpanKind::Replace => {
                    self.wrap_removed(&mut marked.source_marked, segment.source);
                    self.wrap_added(&mut marked.target_marked, segment.target);
                }
                SpanKind::Insert => self.wrap_added(&mut marked.target_marked, segment.target),
                SpanKind::Delete => self.wrap_removed(&mut marked.source_marked, segment.source),
            }
        }

        marked
    }

    fn wrap_removed(&self, output: &mut String, text: &str) {
        output.push_str(self.format.removed_open());
        self.format.escape_into(output, text);
        output.push_str(self.format.close());
    }

    fn wrap_added(&self, output: &mut String, text: &str) {
        output.push_str(self.format.added_open());
        self.format.escape_into(output, text);
        output.push_str(self.format.close());
    }
}

/// Renders `alignment` as HTML.
///
/// # Errors
///
/// Returns [`DiffError::TextMismatch`] when the texts do not match the
/// alignment.
pub fn render(alignment: &Alignment, source: &str, target: &str) -> Result<MarkedDiff, DiffError> {
    DiffRenderer::default().render(alignment, source, target)
}

fn escape_html(output: &mut String, text: &str) {
    for character in text.chars() {
        match character {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            other => push_visible(output, other),
        }
    }
}

fn escape_terminal(output: &mut String, text: &str) {
    for character in text.chars() {
        push_visible(output, character);
    }
}

fn push_visible(output: &mut String, character: char) {
    if character.is_control() && character != '\n' && character != '\t' {
        output.extend(character.escape_unicode());
    } else {
        output.push(character);
    }
}

/// Replaces control characters other than newline and tab with their
/// `\u{..}` escapes so the text is inert on a terminal.
///
/// ```
/// use panopticon::diff::escape_control;
///
/// assert_eq!(escape_control("ok\u{1b}[2J"), "ok\\u{1b}[2J");
/// ```
#[must_use]
pub fn escape_control(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    escape_terminal(&mut output, text);
    output
}
