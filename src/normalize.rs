//! Title normalization
//!
//! Comment lines mention movies with all kinds of decoration (bold markers,
//! quotes, stray whitespace). The catalog index is keyed on the cleaned form,
//! so both sides of the match go through the same function.

/// Canonicalize a free-text movie title into a matchable key.
///
/// Lowercases, trims surrounding whitespace, and strips every `*` and `"`.
/// Total and idempotent; an empty input yields an empty output.
pub fn normalize_title(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['*', '"'], "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markup_and_case() {
        assert_eq!(normalize_title("  *Inception*  "), "inception");
        assert_eq!(normalize_title("\"The Matrix\""), "the matrix");
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("   "), "");
        assert_eq!(normalize_title("**\"\"**"), "");
    }

    #[test]
    fn test_interior_whitespace_preserved() {
        assert_eq!(normalize_title("Mad Max: Fury Road"), "mad max: fury road");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["  *Inception*  ", "Alien", "\" la haine \"", "", "one*two"] {
            let once = normalize_title(raw);
            assert_eq!(normalize_title(&once), once);
        }
    }
}
