//! Year and era detection for the opening splash and short titles.

/// Known era phrases as lowercase word sequences, with the label shown.
const ERA_PHRASES: &[(&[&str], &str)] = &[
    (&["world", "war", "ii"], "1939-1945"),
    (&["world", "war", "2"], "1939-1945"),
    (&["wwii"], "1939-1945"),
    (&["ww2"], "1939-1945"),
    (&["world", "war", "i"], "1914-1918"),
    (&["world", "war", "1"], "1914-1918"),
    (&["wwi"], "1914-1918"),
    (&["ww1"], "1914-1918"),
    (&["great", "war"], "1914-1918"),
    (&["cold", "war"], "1947-1991"),
    (&["great", "depression"], "1929-1939"),
    (&["vietnam", "war"], "1955-1975"),
    (&["civil", "rights"], "1954-1968"),
    (&["space", "race"], "1955-1975"),
    (&["roaring", "twenties"], "1920-1929"),
];

/// Lowercase alphanumeric words of `text`, in order.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A four-digit year in 1900–2099, optionally written as a decade (`1960s`).
pub(crate) fn year_of(word: &str) -> Option<u32> {
    let digits = word.strip_suffix('s').unwrap_or(word);
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits
        .parse::<u32>()
        .ok()
        .filter(|year| (1900..=2099).contains(year))
}

/// The decade a year word falls in (`1944` and `1940s` both give 1940).
pub(crate) fn decade_of(word: &str) -> Option<u32> {
    year_of(word).map(|year| year - year % 10)
}

/// First year mentioned in `text`.
pub fn find_year(text: &str) -> Option<u32> {
    words(text).iter().find_map(|w| year_of(w))
}

/// Date label for the opening splash.
///
/// An explicit year wins over a named era; phrases match on whole words so
/// "award" never reads as "war".
pub fn detect_era(text: &str) -> Option<String> {
    let tokens = words(text);
    if let Some(year) = tokens.iter().find_map(|w| year_of(w)) {
        return Some(year.to_string());
    }

    ERA_PHRASES
        .iter()
        .find(|(phrase, _)| {
            tokens
                .windows(phrase.len())
                .any(|window| window.iter().zip(phrase.iter()).all(|(a, b)| a == b))
        })
        .map(|(_, label)| label.to_string())
}
