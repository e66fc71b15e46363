use std::env;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_THINKING_BUDGET: u32 = 32768;

const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Per-call options. Only extended reasoning is recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    pub extended_reasoning: bool,
}

impl GenerationOptions {
    pub fn with_extended_reasoning(extended_reasoning: bool) -> Self {
        Self { extended_reasoning }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: Option<String>,
    pub thinking_budget: u32,
    pub request_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: None,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            request_timeout: None,
        }
    }
}

impl GatewayConfig {
    /// Reads `GEMINI_API_KEY` (or `GOOGLE_API_KEY`, `API_KEY`), `GEMINI_API_BASE`,
    /// `NAWADER_MODEL`, `NAWADER_THINKING_BUDGET` and `NAWADER_REQUEST_TIMEOUT_S`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = API_KEY_VARS.iter().find_map(|key| read(*key));
        let api_base = read("GEMINI_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let thinking_budget = match read("NAWADER_THINKING_BUDGET") {
            Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring invalid NAWADER_THINKING_BUDGET");
                DEFAULT_THINKING_BUDGET
            }),
            None => DEFAULT_THINKING_BUDGET,
        };
        let request_timeout = read("NAWADER_REQUEST_TIMEOUT_S").and_then(|raw| {
            match raw.parse::<f64>() {
                Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
                    Some(Duration::from_secs_f64(seconds))
                }
                _ => {
                    warn!(value = %raw, "ignoring invalid NAWADER_REQUEST_TIMEOUT_S");
                    None
                }
            }
        });

        Self {
            api_key,
            api_base,
            model: read("NAWADER_MODEL"),
            thinking_budget,
            request_timeout,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub(crate) fn missing_credentials_message() -> String {
        format!("{} not set", API_KEY_VARS.join(" or "))
    }
}
