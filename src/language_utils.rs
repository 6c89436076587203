use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for target language names
///
/// The translation service takes English language names ("Spanish",
/// "French") rather than ISO codes, so validation goes through the ISO 639
/// English name table.
/// Look up a language by its English name, ignoring case and surrounding whitespace
pub fn find_language(name: &str) -> Option<Language> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }

    Language::from_name(trimmed).or_else(|| Language::from_name(&capitalize(trimmed)))
}

/// Validate that `name` is a known English language name
pub fn validate_language_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("Language name must not be empty"));
    }

    find_language(name)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Unknown language name: {}", name))
}

/// Check whether two language names refer to the same language
pub fn language_names_match(a: &str, b: &str) -> bool {
    match (find_language(a), find_language(b)) {
        (Some(lang_a), Some(lang_b)) => lang_a == lang_b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

fn capitalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
