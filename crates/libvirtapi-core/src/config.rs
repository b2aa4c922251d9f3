//! Provider configuration
//!
//! The host tool hands the provider a declared configuration block whose
//! values may be null (not set), unknown (computed later in the plan) or
//! known. [`ProviderConfig::resolve`] merges it with the environment and
//! produces the [`ClientSettings`] a remote API client is built from.
//!
//! ## Environment
//!
//! - `LIBVIRTAPI_HOST`: base URL of the libvirtApi service
//! - `LIBVIRTAPI_USERNAME`: API user
//! - `LIBVIRTAPI_PASSWORD`: API password
//!
//! Declared values take precedence over the environment when they are set
//! and known.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the API base URL
pub const ENV_HOST: &str = "LIBVIRTAPI_HOST";
/// Environment variable holding the API user
pub const ENV_USERNAME: &str = "LIBVIRTAPI_USERNAME";
/// Environment variable holding the API password
pub const ENV_PASSWORD: &str = "LIBVIRTAPI_PASSWORD";

/// Default HTTP timeout for API requests (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A declared attribute value as the host tool sees it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ConfigValue<T> {
    /// Not set in configuration
    #[default]
    Null,
    /// Set, but not known until apply time
    Unknown,
    /// Set and known
    Known(T),
}

impl<T> ConfigValue<T> {
    /// Whether the value is unknown
    pub fn is_unknown(&self) -> bool {
        matches!(self, ConfigValue::Unknown)
    }

    /// The known value, if any
    pub fn known(&self) -> Option<&T> {
        match self {
            ConfigValue::Known(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for ConfigValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => ConfigValue::Known(value),
            None => ConfigValue::Null,
        }
    }
}

/// Declared provider configuration block
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the libvirtApi service
    #[serde(default)]
    pub hostname: ConfigValue<String>,

    /// API user
    #[serde(default)]
    pub username: ConfigValue<String>,

    /// API password
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub password: ConfigValue<String>,

    /// Per-request timeout in seconds (defaults to 10)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Create an empty configuration (everything comes from the environment)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hostname
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = ConfigValue::Known(hostname.into());
        self
    }

    /// Set the username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = ConfigValue::Known(username.into());
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = ConfigValue::Known(password.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<ClientSettings> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup
    ///
    /// All problems are collected and reported together so the user can fix
    /// the whole block in one pass.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ClientSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();

        for (attribute, value) in [
            ("hostname", &self.hostname),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.is_unknown() {
                problems.push(format!(
                    "{} is unknown; the provider cannot be configured from a value computed \
                     at apply time",
                    attribute
                ));
            }
        }

        if !problems.is_empty() {
            return Err(Error::config(problems.join("; ")));
        }

        let pick = |declared: &ConfigValue<String>, env_key: &str| {
            declared
                .known()
                .cloned()
                .or_else(|| lookup(env_key))
                .unwrap_or_default()
        };

        let host = pick(&self.hostname, ENV_HOST);
        let username = pick(&self.username, ENV_USERNAME);
        let password = pick(&self.password, ENV_PASSWORD);

        for (attribute, value, env_key) in [
            ("hostname", &host, ENV_HOST),
            ("username", &username, ENV_USERNAME),
            ("password", &password, ENV_PASSWORD),
        ] {
            if value.is_empty() {
                problems.push(format!(
                    "missing libvirtApi {}: set it in the provider block or via {}",
                    attribute, env_key
                ));
            }
        }

        if !problems.is_empty() {
            return Err(Error::config(problems.join("; ")));
        }

        let settings = ClientSettings {
            host: host.trim_end_matches('/').to_string(),
            username,
            password,
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        };
        settings.validate()?;

        tracing::debug!(
            host = %settings.host,
            username = %settings.username,
            "Resolved libvirtApi settings"
        );
        Ok(settings)
    }
}

/// Fully resolved settings for a remote API client
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL without trailing slash
    pub host: String,
    /// API user
    pub username: String,
    /// API password
    pub password: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            return Err(Error::config(format!(
                "libvirtApi hostname must use the http or https scheme. Got: {}",
                self.host
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::config("libvirtApi timeout must be > 0"));
        }

        Ok(())
    }
}
