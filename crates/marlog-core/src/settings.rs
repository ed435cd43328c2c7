//! Resolved logging policy
//!
//! `Settings` is built once at startup from loosely typed options and is
//! read-only afterwards; share it behind an `Arc`. Building never fails:
//! every rejected value is reported as a diagnostic and replaced by its
//! default.
//!
//! # Options
//!
//! | key | accepts | default |
//! |---|---|---|
//! | `app_name` | string | `app` |
//! | `env` | string | `production` |
//! | `log_path` | string | `<tmp>/marlog` |
//! | `display_errors` | bool-ish | dev-like env |
//! | `accept_user_logs` | bool-ish | dev-like env |
//! | `sensitive_keys` | list or comma separated string | built-in list |
//! | `max_log_bytes` | integer or `10MB`, `512k`, ... | 10 MiB |
//! | `min_production_level` | level name | `error` |
//! | `log_format` | `json`, `json_pretty`, `human` | `json` |
//! | `channel` | string | `app` |

use crate::filter::DEFAULT_SENSITIVE_KEYS;
use crate::formatter::LogFormat;
use marlog_core_types::Level;
use marlog_errors::ConfigError;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_APP_NAME: &str = "app";
pub const DEFAULT_ENV: &str = "production";
pub const DEFAULT_CHANNEL: &str = "app";

/// Prefix of the environment variables read by `Settings::from_env`
pub const ENV_PREFIX: &str = "MARLOG_";

const DEV_ENVS: &[&str] = &["local", "dev", "development"];

/// `local`, `dev` and `development` (any case) are dev-like
pub fn is_dev_env(env: &str) -> bool {
    let env = env.trim();
    DEV_ENVS.iter().any(|d| d.eq_ignore_ascii_case(env))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    app_name: String,
    env: String,
    log_path: PathBuf,
    display_errors: bool,
    accept_user_logs: bool,
    sensitive_keys: BTreeSet<String>,
    max_log_bytes: u64,
    min_production_level: Level,
    log_format: LogFormat,
    channel: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::make(&Map::new())
    }
}

impl Settings {
    /// Build settings from an options map (keys are case-insensitive)
    pub fn make(options: &Map<String, JsonValue>) -> Self {
        let opts: Map<String, JsonValue> = options
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
            .collect();

        let env = text_option(&opts, "env").unwrap_or_else(|| DEFAULT_ENV.to_string());
        let dev = is_dev_env(&env);

        let log_path = text_option(&opts, "log_path")
            .map(|p| PathBuf::from(p.trim_end_matches('/')))
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(default_log_path);

        Self {
            app_name: text_option(&opts, "app_name")
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            log_path,
            display_errors: bool_option(&opts, "display_errors").unwrap_or(dev),
            accept_user_logs: bool_option(&opts, "accept_user_logs").unwrap_or(dev),
            sensitive_keys: sensitive_keys_option(&opts),
            max_log_bytes: bytes_option(&opts),
            min_production_level: level_option(&opts),
            log_format: format_option(&opts),
            channel: text_option(&opts, "channel").unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            env,
        }
    }

    /// Build settings from `(key, value)` string pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let options = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), JsonValue::String(v.into())))
            .collect();
        Self::make(&options)
    }

    /// Build settings from `MARLOG_*` environment variables
    ///
    /// `MARLOG_ENV=staging` sets `env`, `MARLOG_MAX_LOG_BYTES=5MB` sets
    /// `max_log_bytes`, and so on.
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars().filter_map(|(k, v)| {
            k.strip_prefix(ENV_PREFIX).map(|key| (key.to_lowercase(), v))
        }))
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn display_errors(&self) -> bool {
        self.display_errors
    }

    pub fn accept_user_logs(&self) -> bool {
        self.accept_user_logs
    }

    /// Lowercased, deduplicated
    pub fn sensitive_keys(&self) -> &BTreeSet<String> {
        &self.sensitive_keys
    }

    pub fn max_log_bytes(&self) -> u64 {
        self.max_log_bytes
    }

    pub fn min_production_level(&self) -> Level {
        self.min_production_level
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_dev_like(&self) -> bool {
        is_dev_env(&self.env)
    }

    pub fn is_production_like(&self) -> bool {
        !self.is_dev_like()
    }
}

fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("marlog")
}

fn rejected(key: &str, err: &ConfigError) {
    crate::diagnostic!(
        warn,
        "settings",
        "config_value_rejected",
        key = key,
        error = %err,
    );
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Scalar option as trimmed text; blank counts as unset
fn text_option(opts: &Map<String, JsonValue>, key: &str) -> Option<String> {
    let text = match opts.get(key)? {
        JsonValue::Null => return None,
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        other => {
            rejected(
                key,
                &ConfigError::UnsupportedType {
                    key: key.to_string(),
                    found: json_type(other),
                },
            );
            return None;
        }
    };
    (!text.is_empty()).then_some(text)
}

fn bool_option(opts: &Map<String, JsonValue>, key: &str) -> Option<bool> {
    match opts.get(key)? {
        JsonValue::Bool(b) => Some(*b),
        _ => {
            let raw = text_option(opts, key)?;
            let parsed = parse_bool(&raw);
            if parsed.is_none() {
                rejected(key, &ConfigError::InvalidBool { value: raw });
            }
            parsed
        }
    }
}

fn sensitive_keys_option(opts: &Map<String, JsonValue>) -> BTreeSet<String> {
    let raw: Vec<String> = match opts.get("sensitive_keys") {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(JsonValue::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(JsonValue::Null) | None => Vec::new(),
        Some(other) => {
            rejected(
                "sensitive_keys",
                &ConfigError::UnsupportedType {
                    key: "sensitive_keys".to_string(),
                    found: json_type(other),
                },
            );
            Vec::new()
        }
    };

    let keys: BTreeSet<String> = raw
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    if keys.is_empty() {
        DEFAULT_SENSITIVE_KEYS.iter().map(|k| k.to_string()).collect()
    } else {
        keys
    }
}

fn bytes_option(opts: &Map<String, JsonValue>) -> u64 {
    let parsed = match opts.get("max_log_bytes") {
        None | Some(JsonValue::Null) => return DEFAULT_MAX_LOG_BYTES,
        Some(JsonValue::Number(n)) => match n.as_u64() {
            Some(0) | None => Err(ConfigError::NonPositiveByteSize {
                value: n.to_string(),
            }),
            Some(v) => Ok(v),
        },
        Some(JsonValue::String(s)) => parse_byte_size(s),
        Some(other) => Err(ConfigError::UnsupportedType {
            key: "max_log_bytes".to_string(),
            found: json_type(other),
        }),
    };

    parsed.unwrap_or_else(|err| {
        rejected("max_log_bytes", &err);
        DEFAULT_MAX_LOG_BYTES
    })
}

fn level_option(opts: &Map<String, JsonValue>) -> Level {
    let Some(raw) = text_option(opts, "min_production_level") else {
        return Level::Error;
    };
    raw.parse().unwrap_or_else(|_| {
        rejected(
            "min_production_level",
            &ConfigError::InvalidLevel { value: raw },
        );
        Level::Error
    })
}

fn format_option(opts: &Map<String, JsonValue>) -> LogFormat {
    let Some(raw) = text_option(opts, "log_format") else {
        return LogFormat::default();
    };
    raw.parse().unwrap_or_else(|err| {
        rejected("log_format", &err);
        LogFormat::default()
    })
}

/// Parse `1/true/yes/on` and `0/false/no/off` (any case)
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a byte size such as `10485760`, `10MB`, `5m`, `512 kb`
///
/// Digits, optional whitespace, then an optional `k`/`m`/`g`/`t` unit
/// with an optional trailing `b` (any case). Units are powers of 1024.
///
/// # Errors
///
/// Malformed input, zero, or a value that overflows `u64`.
pub fn parse_byte_size(raw: &str) -> Result<u64, ConfigError> {
    let s = raw.trim();
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(digits_end);

    let invalid = || ConfigError::InvalidByteSize {
        value: raw.to_string(),
    };
    if digits.is_empty() {
        return Err(invalid());
    }

    let shift = match unit.trim_start().to_lowercase().as_str() {
        "" | "b" => 0,
        "k" | "kb" => 10,
        "m" | "mb" => 20,
        "g" | "gb" => 30,
        "t" | "tb" => 40,
        _ => return Err(invalid()),
    };

    let overflow = || ConfigError::ByteSizeOverflow {
        value: raw.to_string(),
    };
    let number: u64 = digits.parse().map_err(|_| overflow())?;
    let bytes = number.checked_mul(1u64 << shift).ok_or_else(overflow)?;

    if bytes == 0 {
        return Err(ConfigError::NonPositiveByteSize {
            value: raw.to_string(),
        });
    }
    Ok(bytes)
}
