//! Color grade inference from title keywords.

use reelsmith_timeline::ColorGrade;

use crate::era::{decade_of, words};

const WAR_WORDS: &[&str] = &["war", "wars", "wwi", "wwii", "ww1", "ww2", "wartime"];
const SEPIA_WORDS: &[&str] = &["vintage", "retro", "fifties", "sixties", "seventies"];
const VINTAGE_WORDS: &[&str] = &["eighties", "nineties"];

/// Pick a grade for a title when none was given explicitly.
///
/// Keyword classes are checked in priority order: war and the 1930s/40s map
/// to grayscale, the 1950s–70s (or "vintage"/"retro") to sepia, the 1980s/90s
/// to vintage. Without a keyword hit, a `historical` style forces grayscale;
/// otherwise the result is no grade, or grayscale under `historical_bias`.
pub fn infer_color_grade(title: &str, style: Option<&str>, historical_bias: bool) -> ColorGrade {
    let tokens = words(title);
    let decades: Vec<u32> = tokens.iter().filter_map(|t| decade_of(t)).collect();
    let has_word = |set: &[&str]| tokens.iter().any(|t| set.contains(&t.as_str()));

    if has_word(WAR_WORDS) || decades.iter().any(|d| matches!(d, 1930 | 1940)) {
        return ColorGrade::Grayscale;
    }
    if has_word(SEPIA_WORDS) || decades.iter().any(|d| (1950..=1970).contains(d)) {
        return ColorGrade::Sepia;
    }
    if has_word(VINTAGE_WORDS) || decades.iter().any(|d| matches!(d, 1980 | 1990)) {
        return ColorGrade::Vintage;
    }

    let historical_style = style
        .map(|s| s.trim().eq_ignore_ascii_case("historical"))
        .unwrap_or(false);
    if historical_style || historical_bias {
        ColorGrade::Grayscale
    } else {
        ColorGrade::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_war_keywords_win() {
        assert_eq!(
            infer_color_grade("The Cold War in Color", None, false),
            ColorGrade::Grayscale
        );
        assert_eq!(
            infer_color_grade("London, 1944", None, false),
            ColorGrade::Grayscale
        );
    }

    #[test]
    fn test_keyword_priority_order() {
        // war beats the 1960s decade
        assert_eq!(
            infer_color_grade("Vietnam War: the 1960s", None, false),
            ColorGrade::Grayscale
        );
        // sepia beats vintage
        assert_eq!(
            infer_color_grade("Retro fashion of the 1980s", None, false),
            ColorGrade::Sepia
        );
    }

    #[test]
    fn test_decade_classes() {
        assert_eq!(infer_color_grade("Summer of 1967", None, false), ColorGrade::Sepia);
        assert_eq!(infer_color_grade("The 1990s", None, false), ColorGrade::Vintage);
        assert_eq!(infer_color_grade("Nineties kids", None, false), ColorGrade::Vintage);
    }

    #[test]
    fn test_award_is_not_war() {
        assert_eq!(
            infer_color_grade("An award winning bakery", None, false),
            ColorGrade::None
        );
    }

    #[test]
    fn test_style_and_bias_fallbacks() {
        assert_eq!(
            infer_color_grade("Bakeries", Some("Historical"), false),
            ColorGrade::Grayscale
        );
        assert_eq!(infer_color_grade("Bakeries", None, true), ColorGrade::Grayscale);
        assert_eq!(infer_color_grade("Bakeries", Some("modern"), false), ColorGrade::None);
    }
}
