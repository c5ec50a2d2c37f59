//! Text folding helpers for accent- and case-insensitive matching
//!
//! Portuguese input arrives with inconsistent accents ("previsão" vs
//! "previsao"), so every comparison in the intent pipeline runs over folded
//! text.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Lowercase, strip diacritics (canonical decomposition without combining
/// marks) and trim surrounding whitespace.
pub fn fold_accents(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// File-name key for a city: folded, with everything that is not an ASCII
/// letter or digit removed ("São Paulo" -> "saopaulo").
pub fn image_key(city: &str) -> String {
    fold_accents(city)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
