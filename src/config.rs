//! Runtime configuration
//!
//! Read once at startup from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::nutrition::ReportTimezone;

pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROXY_ADDR: &str = "127.0.0.1:3001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_path: PathBuf,
    pub api_key: Option<SecretString>,
    pub api_base_url: String,
    pub model: String,
    pub temperature: f64,
    pub request_timeout: Duration,
    pub proxy_addr: SocketAddr,
    pub report_timezone: ReportTimezone,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Same as `from_env`, reading values through `get` so tests never touch
    /// the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let database_path = get("NUTRILENS_DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let api_key = get("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.into()));

        let api_base_url = get("NUTRILENS_API_BASE_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let model = get("NUTRILENS_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.into());

        let temperature = match get("NUTRILENS_TEMPERATURE") {
            Some(raw) => {
                let value: f64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "NUTRILENS_TEMPERATURE",
                    value: raw.clone(),
                    reason: "expected a number".into(),
                })?;
                if !(0.0..=2.0).contains(&value) {
                    return Err(ConfigError::Invalid {
                        key: "NUTRILENS_TEMPERATURE",
                        value: raw,
                        reason: "must be between 0 and 2".into(),
                    });
                }
                value
            }
            None => DEFAULT_TEMPERATURE,
        };

        let timeout_secs = match get("NUTRILENS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "NUTRILENS_REQUEST_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive whole number of seconds".into(),
                    })
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let proxy_raw = get("NUTRILENS_PROXY_ADDR").unwrap_or_else(|| DEFAULT_PROXY_ADDR.into());
        let proxy_addr = proxy_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "NUTRILENS_PROXY_ADDR",
            value: proxy_raw.clone(),
            reason: "expected host:port".into(),
        })?;

        let report_timezone = match get("NUTRILENS_REPORT_TZ") {
            Some(raw) => ReportTimezone::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "NUTRILENS_REPORT_TZ",
                value: raw.clone(),
                reason: "expected local, utc, or an offset like +05:30".into(),
            })?,
            None => ReportTimezone::Local,
        };

        Ok(Self {
            database_path,
            api_key,
            api_base_url,
            model,
            temperature,
            request_timeout: Duration::from_secs(timeout_secs),
            proxy_addr,
            report_timezone,
        })
    }
}

/// `<project>/data/nutrilens.db`, found relative to the running executable
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("nutrilens.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use secrecy::ExposeSecret;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl FnMut(&str) -> Option<String> {
        move |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = Config::from_env_with(|_| None).expect("cfg");
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.proxy_addr.port(), 3001);
        assert_eq!(cfg.report_timezone, ReportTimezone::Local);
        assert!(cfg.database_path.ends_with("data/nutrilens.db"));
    }

    #[test]
    fn reads_values() {
        let cfg = Config::from_env_with(env(&[
            ("NUTRILENS_DATABASE_PATH", "/tmp/n.db"),
            ("OPENAI_API_KEY", " sk-test "),
            ("NUTRILENS_API_BASE_URL", "http://localhost:9000/"),
            ("NUTRILENS_MODEL", "gpt-test"),
            ("NUTRILENS_TEMPERATURE", "0.2"),
            ("NUTRILENS_REQUEST_TIMEOUT_SECS", "5"),
            ("NUTRILENS_PROXY_ADDR", "0.0.0.0:8080"),
            ("NUTRILENS_REPORT_TZ", "+05:30"),
        ]))
        .expect("cfg");

        assert_eq!(cfg.database_path, PathBuf::from("/tmp/n.db"));
        assert_eq!(cfg.api_key.as_ref().map(|k| k.expose_secret()), Some("sk-test"));
        assert_eq!(cfg.api_base_url, "http://localhost:9000");
        assert_eq!(cfg.model, "gpt-test");
        assert_eq!(cfg.temperature, 0.2);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.proxy_addr.port(), 8080);
        assert_eq!(
            cfg.report_timezone,
            ReportTimezone::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
        );
    }

    #[test]
    fn blank_api_key_is_missing() {
        let cfg = Config::from_env_with(env(&[("OPENAI_API_KEY", "   ")])).expect("cfg");
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Config::from_env_with(env(&[("NUTRILENS_TEMPERATURE", "warm")])).is_err());
        assert!(Config::from_env_with(env(&[("NUTRILENS_TEMPERATURE", "3")])).is_err());
        assert!(Config::from_env_with(env(&[("NUTRILENS_REQUEST_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_env_with(env(&[("NUTRILENS_PROXY_ADDR", "nowhere")])).is_err());
        let err = Config::from_env_with(env(&[("NUTRILENS_REPORT_TZ", "Mars/Olympus")]))
            .unwrap_err();
        assert!(err.to_string().contains("NUTRILENS_REPORT_TZ"));
    }
}
