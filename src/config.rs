//! Service configuration from environment variables.
//!
//! Read once at startup. `from_lookup` takes any `Fn(&str) -> Option<String>`
//! so parsing can be tested without touching the process environment.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const PORT_ENV: &str = "PORT";
pub const STUNTGUARD_PORT_ENV: &str = "STUNTGUARD_PORT";
pub const HOST_ENV: &str = "STUNTGUARD_HOST";
pub const ARTIFACT_DIR_ENV: &str = "STUNTGUARD_ARTIFACT_DIR";
pub const REQUIRE_SIGNED_ENV: &str = "STUNTGUARD_REQUIRE_SIGNED_ARTIFACTS";
pub const PUBKEY_FILE_ENV: &str = "STUNTGUARD_SIGNING_PUBKEY_B64_FILE";
pub const CORS_ORIGINS_ENV: &str = "STUNTGUARD_CORS_ORIGINS";
pub const LOG_MODE_ENV: &str = "STUNTGUARD_LOG_MODE";
pub const LOG_FILE_ENV: &str = "STUNTGUARD_LOG_FILE";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_ARTIFACT_DIR: &str = "artifacts";
const DEFAULT_LOG_FILE: &str = "stuntguard.log";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

fn invalid(name: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File(PathBuf),
}

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub artifact_dir: PathBuf,
    pub require_signed: bool,
    /// File holding the base64 Ed25519 verifying key
    pub pubkey_file: Option<PathBuf>,
    pub cors: CorsOrigins,
    pub log_mode: LogMode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            require_signed: false,
            pubkey_file: None,
            cors: CorsOrigins::Any,
            log_mode: LogMode::Stdout,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` for a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    /// Returns `ConfigError` for a value that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        // STUNTGUARD_PORT wins over the platform-provided PORT.
        let port_var = get(STUNTGUARD_PORT_ENV)
            .map(|v| (STUNTGUARD_PORT_ENV, v))
            .or_else(|| get(PORT_ENV).map(|v| (PORT_ENV, v)));
        let port = match port_var {
            Some((name, v)) => v.parse::<u16>().map_err(|e| invalid(name, &v, e))?,
            None => DEFAULT_PORT,
        };
        let host_str = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host_str
            .parse()
            .map_err(|e| invalid(HOST_ENV, &host_str, e))?;

        let require_signed = match get(REQUIRE_SIGNED_ENV) {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| invalid(REQUIRE_SIGNED_ENV, &v, "expected a boolean"))?,
            None => false,
        };

        let cors = match get(CORS_ORIGINS_ENV) {
            Some(v) if v != "*" => {
                let origins: Vec<String> = v
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect();
                if origins.is_empty() {
                    CorsOrigins::Any
                } else {
                    CorsOrigins::List(origins)
                }
            }
            _ => CorsOrigins::Any,
        };

        let log_mode = match get(LOG_MODE_ENV).as_deref() {
            None | Some("stdout") => LogMode::Stdout,
            Some("file") => LogMode::File(PathBuf::from(
                get(LOG_FILE_ENV).unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            )),
            Some(other) => return Err(invalid(LOG_MODE_ENV, other, "expected 'stdout' or 'file'")),
        };

        Ok(Self {
            bind: SocketAddr::new(host, port),
            artifact_dir: get(ARTIFACT_DIR_ENV)
                .map_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR), PathBuf::from),
            require_signed,
            pubkey_file: get(PUBKEY_FILE_ENV).map(PathBuf::from),
            cors,
            log_mode,
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.bind.port(), 5000);
    }

    #[test]
    fn test_port_precedence() {
        assert_eq!(config(&[("PORT", "8080")]).unwrap().bind.port(), 8080);
        let cfg = config(&[("PORT", "8080"), ("STUNTGUARD_PORT", "9090")]).unwrap();
        assert_eq!(cfg.bind.port(), 9090);
        assert!(config(&[("PORT", "http")]).is_err());
    }

    #[test]
    fn test_signing_and_artifacts() {
        let cfg = config(&[
            ("STUNTGUARD_ARTIFACT_DIR", "/srv/models"),
            ("STUNTGUARD_REQUIRE_SIGNED_ARTIFACTS", "yes"),
            ("STUNTGUARD_SIGNING_PUBKEY_B64_FILE", "/run/secrets/pub"),
        ])
        .unwrap();
        assert_eq!(cfg.artifact_dir, PathBuf::from("/srv/models"));
        assert!(cfg.require_signed);
        assert_eq!(cfg.pubkey_file, Some(PathBuf::from("/run/secrets/pub")));
        assert!(config(&[("STUNTGUARD_REQUIRE_SIGNED_ARTIFACTS", "maybe")]).is_err());
    }

    #[test]
    fn test_cors_list() {
        let cfg = config(&[(
            "STUNTGUARD_CORS_ORIGINS",
            "https://a.example, https://b.example,",
        )])
        .unwrap();
        assert_eq!(
            cfg.cors,
            CorsOrigins::List(vec!["https://a.example".into(), "https://b.example".into()])
        );
        assert_eq!(
            config(&[("STUNTGUARD_CORS_ORIGINS", "*")]).unwrap().cors,
            CorsOrigins::Any
        );
    }

    #[test]
    fn test_log_mode() {
        let cfg = config(&[
            ("STUNTGUARD_LOG_MODE", "file"),
            ("STUNTGUARD_LOG_FILE", "/var/log/sg.log"),
        ])
        .unwrap();
        assert_eq!(cfg.log_mode, LogMode::File(PathBuf::from("/var/log/sg.log")));
        assert!(config(&[("STUNTGUARD_LOG_MODE", "syslog")]).is_err());
    }
}
