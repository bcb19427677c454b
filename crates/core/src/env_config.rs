//! Environment variable parsing with warn-level logging for invalid values.

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

/// Read a string variable, treating unset and blank values alike.
#[must_use]
pub fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_valid_value() {
        let var_name = "SHIRT_TRACKER_TEST_PARSE_VALID_41871";
        unsafe { std::env::set_var(var_name, "2400") };
        let result: u64 = env_parse_with_default(var_name, 1200);
        assert_eq!(result, 2400);
        unsafe { std::env::remove_var(var_name) };
    }

    #[test]
    fn test_env_parse_invalid_value() {
        let var_name = "SHIRT_TRACKER_TEST_PARSE_INVALID_41872";
        unsafe { std::env::set_var(var_name, "soon") };
        let result: u64 = env_parse_with_default(var_name, 1200);
        assert_eq!(result, 1200);
        unsafe { std::env::remove_var(var_name) };
    }

    #[test]
    fn test_env_parse_missing_var() {
        let var_name = "SHIRT_TRACKER_TEST_PARSE_MISSING_41873";
        unsafe { std::env::remove_var(var_name) };
        let result: u32 = env_parse_with_default(var_name, 4);
        assert_eq!(result, 4);
    }

    #[test]
    fn test_env_non_empty_blank_is_none() {
        let var_name = "SHIRT_TRACKER_TEST_NON_EMPTY_41874";
        unsafe { std::env::set_var(var_name, "   ") };
        assert_eq!(env_non_empty(var_name), None);
        unsafe { std::env::set_var(var_name, " https://example.supabase.co ") };
        assert_eq!(env_non_empty(var_name).as_deref(), Some("https://example.supabase.co"));
        unsafe { std::env::remove_var(var_name) };
    }
}
