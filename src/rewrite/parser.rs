//! Fallback ladder that turns provider output into a [`RewriteResult`].
//!
//! Providers are asked to answer with a rewritten sentence and an explanation
//! but follow no guaranteed delimiter. Rules are tried in order and the first
//! match wins:
//!
//! 1. a rewritten or explanation label splits the output;
//! 2. with two or more non-empty lines, the first is the rewrite and the rest
//!    the explanation;
//! 3. the whole trimmed output is the rewrite.
//!
//! Trimming is applied after splitting. Whenever a rule yields an empty
//! sentence the original text is kept, so the parser never returns an empty
//! rewrite and never fails.

use super::model::{ParseRule, RawOutput, RewriteResult};

const DEFAULT_REWRITTEN_LABELS: [&str; 3] = ["改寫：", "改寫:", "Rewritten:"];
const DEFAULT_EXPLANATION_LABELS: [&str; 3] = ["解釋：", "解釋:", "Explanation:"];
const PARAGRAPH_BREAKS: [&str; 2] = ["\n\n", "\r\n\r\n"];

/// Parses free-form provider output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseParser {
    rewritten_labels: Vec<String>,
    explanation_labels: Vec<String>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(
            DEFAULT_REWRITTEN_LABELS.iter().map(|label| (*label).to_owned()),
            DEFAULT_EXPLANATION_LABELS.iter().map(|label| (*label).to_owned()),
        )
    }
}

impl ResponseParser {
    /// Creates a parser with explicit label sets. Blank labels are ignored.
    #[must_use]
    pub fn new(
        rewritten_labels: impl IntoIterator<Item = String>,
        explanation_labels: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            rewritten_labels: non_blank(rewritten_labels),
            explanation_labels: non_blank(explanation_labels),
        }
    }

    /// Adds a label marking the rewritten sentence.
    #[must_use]
    pub fn with_rewritten_label(mut self, label: impl Into<String>) -> Self {
        push_label(&mut self.rewritten_labels, label.into());
        self
    }

    /// Adds a label marking the explanation.
    #[must_use]
    pub fn with_explanation_label(mut self, label: impl Into<String>) -> Self {
        push_label(&mut self.explanation_labels, label.into());
        self
    }

    /// Interprets backend output, keeping `original` when it is unusable.
    #[must_use]
    pub fn interpret(&self, output: &RawOutput, original: &str) -> RewriteResult {
        match output {
            RawOutput::Text(raw) => self.parse(raw, original),
            RawOutput::Structured {
                rewritten,
                explanation,
                body,
            } => {
                let sentence = rewritten.trim();
                if sentence.is_empty() {
                    return RewriteResult::original(original, body.as_str());
                }
                RewriteResult {
                    rewritten_text: sentence.to_owned(),
                    explanation: explanation.as_deref().and_then(non_empty),
                    raw: body.clone(),
                    rule: ParseRule::Structured,
                }
            }
            RawOutput::Missing { body } => RewriteResult::original(original, body.as_str()),
        }
    }

    /// Applies the fallback ladder to `raw`.
    #[must_use]
    pub fn parse(&self, raw: &str, original: &str) -> RewriteResult {
        if raw.trim().is_empty() {
            return RewriteResult::original(original, raw);
        }

        let (sentence, explanation, rule) = self
            .split_labelled(raw)
            .map(|(sentence, explanation)| (sentence, explanation, ParseRule::Labelled))
            .or_else(|| {
                split_lines(raw)
                    .map(|(sentence, explanation)| (sentence, explanation, ParseRule::MultiLine))
            })
            .unwrap_or_else(|| (raw.trim().to_owned(), None, ParseRule::WholeText));

        if sentence.is_empty() {
            tracing::debug!(rule = rule.label(), "parsed rewrite was empty; keeping original");
            return RewriteResult::original(original, raw);
        }

        RewriteResult {
            rewritten_text: sentence,
            explanation,
            raw: raw.to_owned(),
            rule,
        }
    }

    fn split_labelled(&self, raw: &str) -> Option<(String, Option<String>)> {
        if let Some((start, label)) = earliest(raw, &self.rewritten_labels) {
            let (_, labelled) = raw.split_at(start);
            let after = labelled.strip_prefix(label).unwrap_or(labelled);

            let paragraph = earliest(after, PARAGRAPH_BREAKS.iter().copied());
            let explained = earliest(after, &self.explanation_labels);
            let end = [paragraph, explained]
                .into_iter()
                .flatten()
                .map(|(position, _)| position)
                .min()
                .unwrap_or(after.len());

            let (sentence, remainder) = after.split_at(end);
            let explanation = earliest(remainder, &self.explanation_labels).map_or_else(
                || non_empty(remainder),
                |(position, found)| without_label(remainder, position, found),
            );
            return Some((sentence.trim().to_owned(), explanation));
        }

        let (start, label) = earliest(raw, &self.explanation_labels)?;
        let (sentence, labelled) = raw.split_at(start);
        let explanation = labelled.strip_prefix(label).and_then(non_empty);
        Some((sentence.trim().to_owned(), explanation))
    }
}

fn split_lines(raw: &str) -> Option<(String, Option<String>)> {
    let mut lines = raw.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = lines.next()?;
    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return None;
    }
    Some((first.to_owned(), Some(rest.join("\n"))))
}

/// Earliest occurrence of any of `labels`, preferring the longest label when
/// several start at the same position.
fn earliest<'label, I, L>(text: &str, labels: I) -> Option<(usize, &'label str)>
where
    I: IntoIterator<Item = &'label L>,
    L: AsRef<str> + ?Sized + 'label,
{
    labels
        .into_iter()
        .map(|label: &'label L| -> &'label str { label.as_ref() })
        .filter_map(|label| text.find(label).map(|position| (position, label)))
        .min_by(|(left_pos, left), (right_pos, right)| {
            left_pos
                .cmp(right_pos)
                .then_with(|| right.len().cmp(&left.len()))
        })
}

/// Text around the label at `position`, joined by a newline.
fn without_label(text: &str, position: usize, label: &str) -> Option<String> {
    let (before, labelled) = text.split_at(position);
    let after = labelled.strip_prefix(label).unwrap_or(labelled);
    let parts: Vec<&str> = [before.trim(), after.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn non_blank(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    labels
        .into_iter()
        .filter(|label| !label.trim().is_empty())
        .collect()
}

fn push_label(labels: &mut Vec<String>, label: String) {
    if !label.trim().is_empty() && !labels.contains(&label) {
        labels.push(label);
    }
}
