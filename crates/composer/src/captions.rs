//! Narration text helpers: caption chunking, sentences, quotes.

/// Split narration into caption groups of at most `words_per_group` words.
pub fn caption_groups(narration: &str, words_per_group: usize) -> Vec<String> {
    let words: Vec<&str> = narration.split_whitespace().collect();
    words
        .chunks(words_per_group.max(1))
        .map(|chunk| chunk.join(" "))
        .filter(|group| !group.is_empty())
        .collect()
}

/// First sentence of `text`, terminator included, trimmed.
pub fn first_sentence(text: &str) -> Option<&str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Pull-quote text for a quote card, or `None` when nothing is quotable.
///
/// Takes the first sentence longer than `min_chars`; sentences longer than
/// `max_chars` are cut to `cut_chars` characters plus an ellipsis.
pub fn pull_quote(narration: &str, min_chars: usize, max_chars: usize, cut_chars: usize) -> Option<String> {
    let sentence = narration
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .find(|s| s.chars().count() > min_chars)?;
    let len = sentence.chars().count();
    let body = if len > max_chars {
        let cut: String = sentence.chars().take(cut_chars).collect();
        format!("{}...", cut.trim_end())
    } else {
        sentence.to_string()
    };
    Some(format!("\u{201c}{body}\u{201d}"))
}
