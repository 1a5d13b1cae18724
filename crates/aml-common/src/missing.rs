//! Missing-value token recognition.

/// Cell contents treated as missing when reading tabular data.
///
/// Matching is exact after trimming surrounding whitespace.
pub const MISSING_TOKENS: &[&str] = &[
    "", "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "NULL", "null", "None", "#N/A",
];

/// Returns true when a raw cell should be read as a missing value.
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_TOKENS.contains(&trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing_tokens() {
        assert!(is_missing(""));
        assert!(is_missing("   "));
        assert!(is_missing("NaN"));
        assert!(is_missing(" NA "));
        assert!(is_missing("#N/A"));
    }

    #[test]
    fn test_is_missing_rejects_values() {
        assert!(!is_missing("0"));
        assert!(!is_missing("nope"));
        assert!(!is_missing("Nan bread"));
    }
}
