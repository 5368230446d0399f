//! # Configuration
//!
//! Loads the process-wide configuration from environment-style key/value pairs.
//! The configuration is built once at startup and passed by reference into the
//! components; nothing here is mutable after load.

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::time::Duration;

pub const DEFAULT_MATCH_PATTERN: &str = r"^/run\s+.+";
pub const DEFAULT_SCRIPT_TIMEOUT_SEC: u64 = 7200;

/// Main application configuration structure.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub trigger: TriggerConfig,
    pub matrix: MatrixConfig,
}

/// Settings for the trigger-match-execute pipeline.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Compiled pattern applied (as a search) to incoming group message text.
    pub pattern: Regex,
    /// Shell command line executed verbatim when a message matches.
    pub script_command: String,
    /// Upper bound on script execution time.
    pub script_timeout: Duration,
}

/// Credentials for the Matrix service.
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub username: String,
    pub password: String,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value lookup. An unset key and an empty
    /// value are treated the same way, matching `.env`-style deployments.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let required = [
            "MATRIX_HOMESERVER",
            "MATRIX_USERNAME",
            "MATRIX_PASSWORD",
            "SCRIPT_COMMAND",
        ];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let pattern_raw = get("MATCH_PATTERN").unwrap_or_else(|| DEFAULT_MATCH_PATTERN.to_string());
        let pattern = Regex::new(&pattern_raw)
            .with_context(|| format!("Invalid MATCH_PATTERN regex: {pattern_raw}"))?;

        let timeout_secs = match get("SCRIPT_TIMEOUT_SEC") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("Invalid SCRIPT_TIMEOUT_SEC value: {raw}"))?,
            None => DEFAULT_SCRIPT_TIMEOUT_SEC,
        };

        Ok(Self {
            trigger: TriggerConfig {
                pattern,
                // Required keys are checked above, so these cannot be empty here.
                script_command: get("SCRIPT_COMMAND").unwrap_or_default(),
                script_timeout: Duration::from_secs(timeout_secs),
            },
            matrix: MatrixConfig {
                homeserver: get("MATRIX_HOMESERVER").unwrap_or_default(),
                username: get("MATRIX_USERNAME").unwrap_or_default(),
                password: get("MATRIX_PASSWORD").unwrap_or_default(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("MATRIX_HOMESERVER", "https://matrix.example.org"),
            ("MATRIX_USERNAME", "tripwire"),
            ("MATRIX_PASSWORD", "hunter2"),
            ("SCRIPT_COMMAND", "./update.sh"),
        ])
    }

    fn load(env: &HashMap<&str, &str>) -> Result<AppConfig> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.trigger.pattern.as_str(), DEFAULT_MATCH_PATTERN);
        assert_eq!(config.trigger.script_timeout, Duration::from_secs(7200));
        assert_eq!(config.trigger.script_command, "./update.sh");
    }

    #[test]
    fn test_all_missing_keys_reported_together() {
        let mut env = full_env();
        env.remove("SCRIPT_COMMAND");
        env.remove("MATRIX_PASSWORD");
        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("SCRIPT_COMMAND"));
        assert!(err.contains("MATRIX_PASSWORD"));
        assert!(!err.contains("MATRIX_USERNAME"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("SCRIPT_COMMAND", "");
        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("SCRIPT_COMMAND"));
    }

    #[test]
    fn test_custom_pattern_and_timeout() {
        let mut env = full_env();
        env.insert("MATCH_PATTERN", "deploy");
        env.insert("SCRIPT_TIMEOUT_SEC", "30");
        let config = load(&env).unwrap();
        assert!(config.trigger.pattern.is_match("please deploy now"));
        assert_eq!(config.trigger.script_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut env = full_env();
        env.insert("MATCH_PATTERN", "(unclosed");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut env = full_env();
        env.insert("SCRIPT_TIMEOUT_SEC", "soon");
        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("SCRIPT_TIMEOUT_SEC"));
    }
}
