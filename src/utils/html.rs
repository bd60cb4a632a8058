use ammonia;

use crate::error::{AppError, AppResult};

/// Clean admin-authored text using the ammonia whitelist sanitizer.
///
/// Safe inline tags (like <b>, <p>) survive; <script>, <iframe> and event
/// attributes are stripped. Canonical answers must never go through here:
/// scoring compares them byte for byte with what participants submit.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Cleans `input` and checks the result still fits its column.
///
/// Escaping can grow text past the limit the raw input passed (`&` becomes
/// `&amp;`) and stripping can leave nothing behind, so the request-level
/// checks are repeated on the cleaned value.
pub fn clean_field(field: &str, input: &str, max_chars: usize) -> AppResult<String> {
    let cleaned = clean_html(input);
    if cleaned.trim().is_empty() || cleaned.chars().count() > max_chars {
        return Err(AppError::Validation(vec![format!("{} is length", field)]));
    }
    Ok(cleaned)
}
