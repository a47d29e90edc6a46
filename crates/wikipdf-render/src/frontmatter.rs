//! YAML front matter and tag filtering.

use serde_yaml::Value;

use crate::RenderError;

/// Extract the YAML front matter block at the top of a page.
///
/// The block starts with a `---` line and ends with a `---` or `...` line.
#[must_use]
pub fn extract(markdown: &str) -> Option<&str> {
    let mut lines = markdown.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim() != "---" {
        return None;
    }

    let start = first.len();
    let mut end = start;
    for line in lines {
        let trimmed = line.trim();
        if trimmed == "---" || trimmed == "..." {
            return Some(&markdown[start..end]);
        }
        end += line.len();
    }
    None
}

/// Page filter on front matter tags, e.g. `tags:published,owner:docs`.
///
/// A page passes when any `key:value` entry equals one of its front matter
/// tags, ignoring case. Pages without front matter never pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    entries: Vec<(String, String)>,
}

impl TagFilter {
    /// Parse a comma-separated filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidFilter`] for an entry without a key
    /// or without a `:`.
    pub fn parse(expression: &str) -> Result<Self, RenderError> {
        let entries = expression
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry
                    .split_once(':')
                    .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_lowercase()))
                    .filter(|(key, _)| !key.is_empty())
                    .ok_or_else(|| RenderError::InvalidFilter(entry.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Check whether a page's front matter satisfies the filter.
    #[must_use]
    pub fn matches(&self, markdown: &str) -> bool {
        let Some(yaml) = extract(markdown) else {
            tracing::info!("Page has no front matter tags");
            return false;
        };
        let tags = match serde_yaml::from_str::<Value>(yaml) {
            Ok(value) => collect_tags(&value),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed front matter");
                return false;
            }
        };
        self.entries.iter().any(|entry| tags.contains(entry))
    }
}

/// Flatten a front matter mapping into lowercase `(key, value)` pairs.
fn collect_tags(value: &Value) -> Vec<(String, String)> {
    let Value::Mapping(mapping) = value else {
        return Vec::new();
    };

    let mut tags = Vec::new();
    for (key, value) in mapping {
        let Some(key) = scalar(key) else {
            continue;
        };
        match value {
            Value::Sequence(items) => {
                tags.extend(items.iter().filter_map(scalar).map(|v| (key.clone(), v)));
            }
            other => {
                if let Some(v) = scalar(other) {
                    tags.push((key.clone(), v));
                }
            }
        }
    }
    tags
}

fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    Some(text.to_lowercase())
}
