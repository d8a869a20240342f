//! Environment variable helpers
//!
//! Every activation is configured from its environment. Required variables
//! treat an empty value the same as an unset one.

use crate::error::{Result, SdlError};
use std::str::FromStr;

/// Read a variable that must be present and non-empty.
pub fn required_var(name: &str) -> Result<String> {
    optional_var(name).ok_or_else(|| SdlError::MissingVar(name.to_string()))
}

/// Read a variable, returning `None` when it is unset or blank.
pub fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse an optional variable, falling back to `default` when it is unset.
///
/// A value that is present but does not parse is an error rather than a
/// silent fallback.
pub fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| SdlError::InvalidVar {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Check a group of required variables at once, reporting every missing name.
pub fn require_all(names: &[&str]) -> Result<Vec<String>> {
    let mut values = Vec::with_capacity(names.len());
    let mut missing = Vec::new();

    for name in names {
        match optional_var(name) {
            Some(value) => values.push(value),
            None => missing.push(*name),
        }
    }

    if missing.is_empty() {
        Ok(values)
    } else {
        Err(SdlError::MissingVar(missing.join(", ")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_required_var_rejects_blank() {
        std::env::set_var("SDL_TEST_BLANK", "   ");
        let err = required_var("SDL_TEST_BLANK").unwrap_err();
        assert!(matches!(err, SdlError::MissingVar(name) if name == "SDL_TEST_BLANK"));
        std::env::remove_var("SDL_TEST_BLANK");
    }

    #[test]
    #[serial]
    fn test_parse_var_default_and_invalid() {
        std::env::remove_var("SDL_TEST_NUM");
        assert_eq!(parse_var("SDL_TEST_NUM", 10u64).unwrap(), 10);

        std::env::set_var("SDL_TEST_NUM", "25");
        assert_eq!(parse_var("SDL_TEST_NUM", 10u64).unwrap(), 25);

        std::env::set_var("SDL_TEST_NUM", "ten");
        assert!(matches!(
            parse_var("SDL_TEST_NUM", 10u64),
            Err(SdlError::InvalidVar { .. })
        ));
        std::env::remove_var("SDL_TEST_NUM");
    }

    #[test]
    #[serial]
    fn test_require_all_lists_every_missing_name() {
        std::env::set_var("SDL_TEST_A", "a");
        std::env::remove_var("SDL_TEST_B");
        std::env::remove_var("SDL_TEST_C");

        let err = require_all(&["SDL_TEST_A", "SDL_TEST_B", "SDL_TEST_C"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: SDL_TEST_B, SDL_TEST_C"
        );

        std::env::remove_var("SDL_TEST_A");
    }
}
