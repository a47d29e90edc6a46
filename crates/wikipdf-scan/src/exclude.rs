//! Page exclusion patterns.

use regex::{Regex, RegexBuilder};

/// Case-insensitive patterns matched anywhere in a page's wiki-relative path.
///
/// Patterns are regular expressions, so `In-.+Section` matches
/// `/Mentioned-Section/In-Mentioned-Section.md`. A pattern that fails to
/// compile is matched literally instead.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    rules: Vec<Regex>,
}

impl ExcludeFilter {
    /// Compile exclusion patterns.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .filter(|p| !p.as_ref().is_empty())
            .filter_map(|p| compile(p.as_ref()))
            .collect();
        Self { rules }
    }

    /// Whether no patterns are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check whether a wiki-relative path matches any pattern.
    ///
    /// Backslashes are normalized to `/` before matching.
    #[must_use]
    pub fn is_excluded(&self, wiki_relative_path: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let normalized = wiki_relative_path.replace('\\', "/");
        self.rules.iter().any(|rule| rule.is_match(&normalized))
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid exclude pattern, matching literally");
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
                .ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_excludes_nothing() {
        let filter = ExcludeFilter::default();

        assert!(filter.is_empty());
        assert!(!filter.is_excluded("/Start-Page.md"));
    }

    #[test]
    fn test_substring_match_case_insensitive() {
        let filter = ExcludeFilter::new(["home"]);

        assert!(filter.is_excluded("/Mentioned-Section-No-Home/In-Mentioned-Section-No-Home.md"));
        assert!(!filter.is_excluded("/Start-Page.md"));
    }

    #[test]
    fn test_regex_pattern() {
        let filter = ExcludeFilter::new(["In-.+Section", "Start"]);

        assert!(filter.is_excluded("/Mentioned-Section/In-Mentioned-Section.md"));
        assert!(filter.is_excluded("/Start-Page.md"));
        assert!(!filter.is_excluded("/Mentioned-Section.md"));
    }

    #[test]
    fn test_backslashes_normalized() {
        let filter = ExcludeFilter::new(["Section/In"]);

        assert!(filter.is_excluded("\\Mentioned-Section\\In-Mentioned-Section.md"));
    }

    #[test]
    fn test_invalid_pattern_matches_literally() {
        let filter = ExcludeFilter::new(["Draft("]);

        assert!(filter.is_excluded("/Draft(old).md"));
        assert!(!filter.is_excluded("/Draft.md"));
    }

    #[test]
    fn test_blank_patterns_ignored() {
        let filter = ExcludeFilter::new([""]);

        assert!(filter.is_empty());
    }
}
