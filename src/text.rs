//! Name matching shared by both backends
//!
//! The relational `contains_ci` function and the document `Contains`
//! predicate compile the same pattern, so a name needle selects the same
//! persons on either side regardless of script or accents.

use regex::{Regex, RegexBuilder};

/// Literal, Unicode case-insensitive substring pattern for `needle`
pub fn needle_pattern(needle: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .unicode(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_non_ascii_case() {
        let pattern = needle_pattern("émile").unwrap();
        assert!(pattern.is_match("Émile Zola"));
        assert!(needle_pattern("CRUZ").unwrap().is_match("Penélope Cruz"));
        assert!(needle_pattern("PENÉLOPE").unwrap().is_match("Penélope Cruz"));
    }

    #[test]
    fn test_wildcards_are_literal() {
        assert!(!needle_pattern("T_m%").unwrap().is_match("Tom Hanks"));
        assert!(!needle_pattern("T.m").unwrap().is_match("Tom Hanks"));
        assert!(needle_pattern("50%_off").unwrap().is_match("Save 50%_OFF"));
    }
}
