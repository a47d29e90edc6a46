//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Strings without `${` are returned unchanged, so a bare `$` in a path is
/// left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Expand an optional configuration string.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(raw) = value.as_deref() {
        *value = Some(expand_env(raw, field)?);
    }
    Ok(())
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WIKIPDF_TEST_SIMPLE", "wiki");
        }
        let result = expand_env("${WIKIPDF_TEST_SIMPLE}", "export.path").unwrap();
        assert_eq!(result, "wiki");
        unsafe {
            std::env::remove_var("WIKIPDF_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("WIKIPDF_TEST_UNSET");
        }
        let result = expand_env("${WIKIPDF_TEST_UNSET:-out.pdf}", "pdf.output").unwrap();
        assert_eq!(result, "out.pdf");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("WIKIPDF_TEST_MISSING");
        }
        let err = expand_env("${WIKIPDF_TEST_MISSING}/wiki", "export.path").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("WIKIPDF_TEST_MISSING"));
        assert!(err.to_string().contains("export.path"));
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WIKIPDF_TEST_HOME", "/home/docs");
        }
        let result = expand_env("${WIKIPDF_TEST_HOME}/wiki/.attachments", "x").unwrap();
        assert_eq!(result, "/home/docs/wiki/.attachments");
        unsafe {
            std::env::remove_var("WIKIPDF_TEST_HOME");
        }
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("reports/$draft.pdf", "pdf.output").unwrap();
        assert_eq!(result, "reports/$draft.pdf");
    }

    #[test]
    fn test_expand_opt_none() {
        let mut value = None;
        expand_opt(&mut value, "export.single").unwrap();
        assert_eq!(value, None);
    }
}
