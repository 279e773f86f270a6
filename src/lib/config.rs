//! Build-time configuration for the API endpoint and the verification handshake,
//! with an optional runtime override. The runtime config is read from
//! `window.JACS_CONFIG` (if present) so static deployments can change endpoints
//! and timings without rebuilding. Configuration values are public; do not store
//! secrets here.

use crate::features::verification::poller::PollPolicy;
use tracing::Level;

/// Broadcast channel shared by every tab of the same browser profile.
pub const DEFAULT_VERIFICATION_CHANNEL: &str = "jacs_verification";
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 3_000;
/// 100 polls at 3 s is roughly five minutes of waiting.
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_POLL_LOG_EVERY: u32 = 10;
pub const DEFAULT_BROADCAST_CLOSE_DELAY_MS: u32 = 2_000;
pub const DEFAULT_COMPLETION_DELAY_MS: u32 = 1_500;

/// Frontend configuration derived from build-time environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub verification_channel: String,
    pub poll_interval_ms: u32,
    pub poll_max_attempts: u32,
    pub poll_log_every: u32,
    pub broadcast_close_delay_ms: u32,
    pub completion_delay_ms: u32,
    pub log_level: Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            verification_channel: DEFAULT_VERIFICATION_CHANNEL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            poll_log_every: DEFAULT_POLL_LOG_EVERY,
            broadcast_close_delay_ms: DEFAULT_BROADCAST_CLOSE_DELAY_MS,
            completion_delay_ms: DEFAULT_COMPLETION_DELAY_MS,
            log_level: Level::WARN,
        }
    }
}

impl AppConfig {
    /// Loads config from build-time environment variables and applies runtime overrides.
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(value) = option_env!("JACS_API_BASE_URL").and_then(normalize_runtime_value) {
            config.api_base_url = value;
        }
        if let Some(level) = option_env!("JACS_LOG_LEVEL").and_then(parse_log_level) {
            config.log_level = level;
        }

        if let Some(runtime) = runtime_config() {
            apply_runtime_overrides(&mut config, runtime);
        }

        config
    }

    /// Poll cadence and ceiling for the pending-verification screen.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval_ms: self.poll_interval_ms,
            max_attempts: self.poll_max_attempts,
            log_every: self.poll_log_every,
        }
    }
}

#[derive(Default)]
struct RuntimeConfig {
    api_base_url: Option<String>,
    verification_channel: Option<String>,
    poll_interval_ms: Option<String>,
    poll_max_attempts: Option<String>,
    log_level: Option<String>,
}

fn apply_runtime_overrides(config: &mut AppConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = runtime.verification_channel {
        config.verification_channel = value;
    }
    if let Some(value) = runtime.poll_interval_ms.as_deref().and_then(parse_positive) {
        config.poll_interval_ms = value;
    }
    if let Some(value) = runtime.poll_max_attempts.as_deref().and_then(parse_positive) {
        config.poll_max_attempts = value;
    }
    if let Some(level) = runtime.log_level.as_deref().and_then(parse_log_level) {
        config.log_level = level;
    }
}

#[cfg(target_arch = "wasm32")]
fn runtime_config() -> Option<RuntimeConfig> {
    use js_sys::{Object, Reflect};
    use wasm_bindgen::JsValue;

    let window = web_sys::window()?;
    let config = Reflect::get(&window, &JsValue::from_str("JACS_CONFIG")).ok()?;
    if config.is_null() || config.is_undefined() {
        return None;
    }
    let object = Object::from(config);

    Some(RuntimeConfig {
        api_base_url: read_runtime_value(&object, "api_base_url"),
        verification_channel: read_runtime_value(&object, "verification_channel"),
        poll_interval_ms: read_runtime_value(&object, "poll_interval_ms"),
        poll_max_attempts: read_runtime_value(&object, "poll_max_attempts"),
        log_level: read_runtime_value(&object, "log_level"),
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn runtime_config() -> Option<RuntimeConfig> {
    None
}

/// Reads a string or numeric property; numbers are rendered as integers.
#[cfg(target_arch = "wasm32")]
fn read_runtime_value(object: &js_sys::Object, key: &str) -> Option<String> {
    let value = js_sys::Reflect::get(object, &wasm_bindgen::JsValue::from_str(key)).ok()?;
    if let Some(number) = value.as_f64() {
        if number.is_finite() && number >= 0.0 {
            return Some(format!("{}", number.trunc()));
        }
        return None;
    }
    normalize_runtime_value(&value.as_string()?)
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|parsed| *parsed > 0)
}

/// Accepts level names or the numeric verbosity scale (`0` = error .. `4`+ = trace).
pub(crate) fn parse_log_level(value: &str) -> Option<Level> {
    let value = value.trim();
    if let Ok(parsed) = value.parse::<u8>() {
        return match parsed {
            0 => Some(Level::ERROR),
            1 => Some(Level::WARN),
            2 => Some(Level::INFO),
            3 => Some(Level::DEBUG),
            4 | 5 => Some(Level::TRACE),
            _ => None,
        };
    }

    match value.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, DEFAULT_VERIFICATION_CHANNEL, RuntimeConfig, apply_runtime_overrides,
        normalize_runtime_value, parse_log_level,
    };
    use tracing::Level;

    #[test]
    fn normalize_runtime_value_trims_and_rejects_empty() {
        assert_eq!(normalize_runtime_value(""), None);
        assert_eq!(normalize_runtime_value("   "), None);
        assert_eq!(
            normalize_runtime_value("  https://api.jacs.app "),
            Some("https://api.jacs.app".to_string())
        );
    }

    #[test]
    fn defaults_match_the_handshake_timings() {
        let config = AppConfig::default();
        assert_eq!(config.verification_channel, DEFAULT_VERIFICATION_CHANNEL);
        let policy = config.poll_policy();
        assert_eq!(policy.interval_ms, 3_000);
        assert_eq!(policy.max_attempts, 100);
        assert_eq!(policy.log_every, 10);
        assert_eq!(config.broadcast_close_delay_ms, 2_000);
        assert_eq!(config.completion_delay_ms, 1_500);
    }

    #[test]
    fn apply_runtime_overrides_ignores_empty_and_invalid_values() {
        let mut config = AppConfig {
            api_base_url: "https://api.default".to_string(),
            ..AppConfig::default()
        };
        let runtime = RuntimeConfig {
            api_base_url: normalize_runtime_value(""),
            verification_channel: normalize_runtime_value("  "),
            poll_interval_ms: Some("0".to_string()),
            poll_max_attempts: Some("many".to_string()),
            log_level: Some("verbose".to_string()),
        };

        apply_runtime_overrides(&mut config, runtime);

        assert_eq!(config.api_base_url, "https://api.default");
        assert_eq!(config.verification_channel, DEFAULT_VERIFICATION_CHANNEL);
        assert_eq!(config.poll_interval_ms, 3_000);
        assert_eq!(config.poll_max_attempts, 100);
        assert_eq!(config.log_level, Level::WARN);
    }

    #[test]
    fn apply_runtime_overrides_overwrites_when_present() {
        let mut config = AppConfig::default();
        let runtime = RuntimeConfig {
            api_base_url: normalize_runtime_value("https://api.override"),
            verification_channel: normalize_runtime_value("jacs_verification_staging"),
            poll_interval_ms: Some("50".to_string()),
            poll_max_attempts: Some("3".to_string()),
            log_level: Some("debug".to_string()),
        };

        apply_runtime_overrides(&mut config, runtime);

        assert_eq!(config.api_base_url, "https://api.override");
        assert_eq!(config.verification_channel, "jacs_verification_staging");
        assert_eq!(config.poll_policy().interval_ms, 50);
        assert_eq!(config.poll_policy().max_attempts, 3);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn parse_log_level_accepts_names_and_verbosity() {
        assert_eq!(parse_log_level("0"), Some(Level::ERROR));
        assert_eq!(parse_log_level("2"), Some(Level::INFO));
        assert_eq!(parse_log_level("5"), Some(Level::TRACE));
        assert_eq!(parse_log_level("6"), None);
        assert_eq!(parse_log_level(" WARN "), Some(Level::WARN));
        assert_eq!(parse_log_level("loud"), None);
    }
}
