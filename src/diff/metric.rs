//! Change ratio derived from an alignment.

use super::align::Alignment;
use super::tokens::Granularity;

/// Fraction of content not preserved as `Equal` spans, in `[0, 1]`.
///
/// Defined as `1 - equal / max(source, target)` over token counts. Two empty
/// sequences are identical, so the ratio is `0` rather than a division by
/// zero.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the change ratio is inherently fractional"
)]
pub fn change_ratio(alignment: &Alignment) -> f64 {
    let longest = alignment.source_len().max(alignment.target_len());
    if longest == 0 {
        return 0.0;
    }

    let ratio = 1.0 - count_as_f64(alignment.equal_len()) / count_as_f64(longest);
    ratio.clamp(0.0, 1.0)
}

/// Change ratio as a percentage rounded to two decimal places.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "ratio to percentage scaling")]
pub fn percent_changed(alignment: &Alignment) -> f64 {
    round_to_hundredths(change_ratio(alignment) * 100.0)
}

#[expect(
    clippy::float_arithmetic,
    reason = "rounding for display requires float scaling"
)]
fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn count_as_f64(count: usize) -> f64 {
    u32::try_from(count).map_or(f64::from(u32::MAX), f64::from)
}

/// Percentage of change between two texts plus the alignment behind it.
///
/// Recomputed for every request; nothing here is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeReport {
    /// Percent changed in `[0, 100]`, rounded to two decimals.
    pub percent_changed: f64,
    /// Alignment the percentage was derived from.
    pub alignment: Alignment,
}

impl ChangeReport {
    /// Builds a report from an existing alignment.
    #[must_use]
    pub fn from_alignment(alignment: Alignment) -> Self {
        Self {
            percent_changed: percent_changed(&alignment),
            alignment,
        }
    }

    /// Aligns two texts and measures how much changed.
    #[must_use]
    pub fn measure(source: &str, target: &str, granularity: Granularity) -> Self {
        Self::from_alignment(Alignment::between(source, target, granularity))
    }

    /// Granularity the percentage was measured at.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.alignment.granularity()
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "ratio assertions compare within a tolerance"
)]
mod tests {
    use rstest::rstest;

    use super::{ChangeReport, change_ratio, percent_changed};
    use crate::diff::{Alignment, Granularity};

    #[rstest]
    #[case("")]
    #[case("unchanged")]
    #[case("我討厭你")]
    fn identical_texts_have_zero_ratio(#[case] text: &str) {
        let alignment = Alignment::between(text, text, Granularity::Character);

        assert!(change_ratio(&alignment).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(Granularity::Character)]
    #[case(Granularity::Word)]
    fn deleting_everything_is_a_full_change(#[case] granularity: Granularity) {
        let alignment = Alignment::between("some text", "", granularity);

        assert!((change_ratio(&alignment) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn replaced_word_changes_three_of_eleven_characters() {
        let alignment = Alignment::between("The cat sat", "The dog sat", Granularity::Character);

        assert!((change_ratio(&alignment) - 3.0 / 11.0).abs() < 1e-9);
        assert!((percent_changed(&alignment) - 27.27).abs() < 1e-9);
    }

    #[test]
    fn word_granularity_measures_tokens() {
        let report = ChangeReport::measure("The cat sat", "The dog sat", Granularity::Word);

        assert!((report.percent_changed - 20.0).abs() < 1e-9);
        assert_eq!(report.granularity(), Granularity::Word);
    }

    #[test]
    fn ratio_uses_the_longer_side() {
        let alignment = Alignment::between("ab", "abcd", Granularity::Character);

        assert!((change_ratio(&alignment) - 0.5).abs() < 1e-9);
    }
}
