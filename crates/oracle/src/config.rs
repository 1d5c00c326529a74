use std::time::Duration;

/// Default model for whisper generation.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Text-generation client configuration.
///
/// Read once at startup; there is no rotation or per-call override.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    /// API credential. `None` makes every request fail fast.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Overall request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
    /// Deliberation budget sent with each request; 0 disables thinking.
    pub thinking_budget: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            thinking_budget: 0,
        }
    }
}

impl OracleConfig {
    /// Build the configuration from the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `API_KEY` (then `GEMINI_API_KEY`) | credential |
    /// | `SKYREALM_MODEL` | model override |
    /// | `SKYREALM_GEMINI_BASE_URL` | endpoint override |
    /// | `SKYREALM_HTTP_TIMEOUT_SECS` | request timeout |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout = non_empty("SKYREALM_HTTP_TIMEOUT_SECS").and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid SKYREALM_HTTP_TIMEOUT_SECS");
                    None
                }
            }
        });

        Self {
            api_key: non_empty("API_KEY").or_else(|| non_empty("GEMINI_API_KEY")),
            model: non_empty("SKYREALM_MODEL").unwrap_or(defaults.model),
            base_url: non_empty("SKYREALM_GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout,
            thinking_budget: defaults.thinking_budget,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = OracleConfig::from_lookup(lookup(&[]));
        assert_eq!(config, OracleConfig::default());
        assert!(!config.has_api_key());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.thinking_budget, 0);
    }

    #[test]
    fn api_key_prefers_api_key_over_gemini_key() {
        let config = OracleConfig::from_lookup(lookup(&[
            ("API_KEY", "primary"),
            ("GEMINI_API_KEY", "secondary"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("primary"));

        let config = OracleConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "secondary")]));
        assert_eq!(config.api_key.as_deref(), Some("secondary"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = OracleConfig::from_lookup(lookup(&[("API_KEY", "  "), ("SKYREALM_MODEL", "")]));
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn overrides_are_applied() {
        let config = OracleConfig::from_lookup(lookup(&[
            ("SKYREALM_MODEL", "gemini-2.0-flash"),
            ("SKYREALM_GEMINI_BASE_URL", "http://localhost:8080/v1beta/"),
            ("SKYREALM_HTTP_TIMEOUT_SECS", "12"),
        ]));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "http://localhost:8080/v1beta");
        assert_eq!(config.timeout, Some(Duration::from_secs(12)));
    }

    #[test]
    fn invalid_timeout_is_ignored() {
        for raw in ["soon", "0", "-3"] {
            let config = OracleConfig::from_lookup(lookup(&[("SKYREALM_HTTP_TIMEOUT_SECS", raw)]));
            assert_eq!(config.timeout, None, "{raw} should be ignored");
        }
    }
}
