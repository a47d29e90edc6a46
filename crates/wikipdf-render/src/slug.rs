//! Heading text to fragment id conversion.

/// Convert text to a URL-safe fragment id.
///
/// Letters and digits are lowercased and kept, runs of whitespace, `-` and
/// `_` collapse into one dash, everything else is dropped. With `ascii_only`
/// non-ASCII letters are dropped as well. Leading and trailing dashes are
/// removed.
#[must_use]
pub fn slugify(text: &str, ascii_only: bool) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        let keep = if ascii_only {
            c.is_ascii_alphanumeric()
        } else {
            c.is_alphanumeric()
        };
        if keep {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World", true), "hello-world");
        assert_eq!(slugify("Setup-Getting Started", true), "setup-getting-started");
    }

    #[test]
    fn test_slugify_punctuation_dropped() {
        assert_eq!(slugify("What's new? (v2.0)", true), "whats-new-v20");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  a  --  b__c  ", true), "a-b-c");
    }

    #[test]
    fn test_slugify_ascii_only_drops_unicode() {
        assert_eq!(slugify("Über Café", true), "ber-caf");
        assert_eq!(slugify("Über Café", false), "über-café");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("!!!", true), "");
        assert_eq!(slugify("", true), "");
    }
}
