//! Small string helpers shared across the pipeline

use ruff_text_size::TextSize;

/// One-based line number of a byte offset within `source`
pub fn line_number(source: &str, offset: TextSize) -> usize {
    let end = usize::from(offset).min(source.len());
    source.get(..end).unwrap_or(source).matches('\n').count() + 1
}

/// Convert a camel-case identifier to kebab-case
///
/// Runs of capitals are treated as one word, so `FBWFeeContainer` becomes
/// `fbw-fee-container` rather than `f-b-w-fee-container`.
pub fn camel_to_kebab(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut kebab = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            let starts_word = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if starts_word && !kebab.ends_with('-') {
                kebab.push('-');
            }
        }
        if ch == '_' || ch == ' ' {
            if !kebab.is_empty() && !kebab.ends_with('-') {
                kebab.push('-');
            }
            continue;
        }
        kebab.push(ch.to_ascii_lowercase());
    }

    kebab
}
