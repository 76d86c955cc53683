//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use `__` as separator, e.g. `OIDC__CLIENT_ID` or `SESSION__COOKIE_KEY`.
//!
//! See [`OidcConfig`](stickers_platform_access::OidcConfig) for
//! OIDC authentication configuration.

use axum_extra::extract::cookie::Key;
use base64::Engine;
use chrono::{TimeDelta, Utc};
use serde::Deserialize;
use stickers_platform_access::{AllowList, OidcConfig};

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Semicolon-delimited identities permitted to sign in.
    /// Absent means nobody is permitted.
    #[serde(default)]
    pub valid_upns: AllowList,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// OIDC authentication configuration.
    pub oidc: OidcConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Base64-encoded key (at least 64 bytes) used to encrypt cookies.
    /// When absent a random key is generated and sessions do not survive a restart.
    #[serde(default)]
    pub cookie_key: Option<String>,
}

fn default_session_duration_minutes() -> i64 {
    480
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            secure_cookies: default_secure_cookies(),
            cookie_key: None,
        }
    }
}

impl SessionConfig {
    /// Returns the checked session lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_minutes` is not positive or too large to
    /// compute an expiry from the current time.
    pub fn duration(&self) -> Result<TimeDelta, config::ConfigError> {
        let minutes = self.duration_minutes;
        if minutes <= 0 {
            return Err(config::ConfigError::Message(format!(
                "session.duration_minutes must be positive, got {minutes}"
            )));
        }

        TimeDelta::try_minutes(minutes)
            .filter(|duration| Utc::now().checked_add_signed(*duration).is_some())
            .ok_or_else(|| {
                config::ConfigError::Message(format!(
                    "session.duration_minutes is out of range, got {minutes}"
                ))
            })
    }

    /// Returns the key used to encrypt the session and auth state cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured key is not valid base64 or is
    /// shorter than 64 bytes.
    pub fn cookie_key(&self) -> Result<Key, config::ConfigError> {
        let Some(encoded) = self.cookie_key.as_deref() else {
            tracing::warn!("SESSION__COOKIE_KEY not set; generating an ephemeral cookie key");
            return Ok(Key::generate());
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| {
                config::ConfigError::Message(format!("session.cookie_key is not base64: {e}"))
            })?;

        Key::try_from(bytes.as_slice()).map_err(|_| {
            config::ConfigError::Message(format!(
                "session.cookie_key must decode to at least 64 bytes, got {}",
                bytes.len()
            ))
        })
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> config::ConfigBuilder<config::builder::DefaultState> {
        config::Config::builder()
            .set_override("oidc.client_id", "client-id")
            .expect("override")
            .set_override("oidc.instance", "https://login.microsoftonline.com/")
            .expect("override")
            .set_override("oidc.tenant_id", "contoso.onmicrosoft.com")
            .expect("override")
            .set_override("oidc.redirect_uri", "https://app.example.com/auth/callback")
            .expect("override")
            .set_override("oidc.post_logout_redirect_uri", "https://app.example.com/")
            .expect("override")
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.duration_minutes, 480);
        assert!(config.secure_cookies);
        assert!(config.cookie_key.is_none());
    }

    #[test]
    fn server_config_defaults() {
        let config: ServerConfig = base_builder()
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert!(config.valid_upns.is_empty());
        assert_eq!(config.session.duration_minutes, 480);
        assert_eq!(
            config.oidc.authority(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com"
        );
    }

    #[test]
    fn server_config_parses_allow_list() {
        let config: ServerConfig = base_builder()
            .set_override("valid_upns", "alice@contoso.com; ;bob@contoso.com ")
            .expect("override")
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(
            config.valid_upns.entries(),
            ["alice@contoso.com", "bob@contoso.com"]
        );
    }

    #[test]
    fn server_config_requires_oidc() {
        let result = config::Config::builder()
            .build()
            .expect("build")
            .try_deserialize::<ServerConfig>();
        assert!(result.is_err());
    }

    fn with_duration(duration_minutes: i64) -> SessionConfig {
        SessionConfig {
            duration_minutes,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn duration_defaults_to_eight_hours() {
        let duration = SessionConfig::default().duration().expect("duration");
        assert_eq!(duration, TimeDelta::hours(8));
    }

    #[test]
    fn duration_rejects_zero_and_negative_minutes() {
        assert!(with_duration(0).duration().is_err());
        assert!(with_duration(-1).duration().is_err());
    }

    #[test]
    fn duration_rejects_out_of_range_minutes() {
        assert!(with_duration(i64::MAX).duration().is_err());
        assert!(with_duration(i64::MAX / 2).duration().is_err());
    }

    #[test]
    fn duration_from_environment_is_checked() {
        let config: ServerConfig = base_builder()
            .set_override("session.duration_minutes", -5_i64)
            .expect("override")
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert!(config.session.duration().is_err());
    }

    #[test]
    fn cookie_key_generated_when_absent() {
        assert!(SessionConfig::default().cookie_key().is_ok());
    }

    #[test]
    fn cookie_key_decodes_configured_value() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([7u8; 64]);
        let config = SessionConfig {
            cookie_key: Some(encoded),
            ..SessionConfig::default()
        };
        let key = config.cookie_key().expect("key");
        assert_eq!(key.master(), Key::from(&[7u8; 64]).master());
    }

    #[test]
    fn cookie_key_rejects_short_or_invalid_values() {
        let short = SessionConfig {
            cookie_key: Some(base64::engine::general_purpose::STANDARD.encode([1u8; 16])),
            ..SessionConfig::default()
        };
        assert!(short.cookie_key().is_err());

        let invalid = SessionConfig {
            cookie_key: Some("not base64!".to_string()),
            ..SessionConfig::default()
        };
        assert!(invalid.cookie_key().is_err());
    }
}
