// ============================================
// File: crates/efris-client/src/config.rs
// ============================================
//! # Client Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the EFRIS client, loaded from a
//! TOML file with defaults for every field.
//!
//! ## Main Functionality
//! - `ClientConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Conversions into the core types (`DeviceProfile`, `TenantId`,
//!   `CredentialStore`)
//!
//! ## Configuration Sections
//! - `gateway`: server URL, device identity, timeouts
//! - `tenant`: default TIN and device number
//! - `credential`: PKCS#12 archive and password
//! - `key_cache`: cache key prefix, TTL, unwrap scheme order
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [gateway]
//! server_url = "https://efristest.ura.go.ug/efrisws/ws/taapp/getInformation"
//! device_mac = "B47720524158"
//! handshake_timeout_secs = 30
//! request_timeout_secs = 60
//!
//! [tenant]
//! tin = "1000023516"
//! device_no = "TCS9e0df01728335239"
//!
//! [credential]
//! archive_path = "/etc/efris/device.pfx"
//!
//! [key_cache]
//! ttl_secs = 86400
//! unwrap_schemes = ["pkcs1v15", "oaep-sha1"]
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `EFRIS_PFX_PASSWORD` overrides `credential.password` when set
//! - The password is never serialized back out by `to_toml`
//! - An empty `[tenant]` is valid; commands then need `--tin`/`--device-no`
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use efris_common::TenantId;
use efris_core::{CredentialStore, DeviceProfile, PaddingScheme};

use crate::error::{ClientError, Result};

/// Environment variable that overrides `credential.password`.
pub const PASSWORD_ENV: &str = "EFRIS_PFX_PASSWORD";

// ============================================
// ClientConfig
// ============================================

/// Main client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Gateway endpoint and device identity.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Default tenant.
    #[serde(default)]
    pub tenant: TenantConfig,

    /// Credential archive.
    #[serde(default)]
    pub credential: CredentialConfig,

    /// Session key cache.
    #[serde(default)]
    pub key_cache: KeyCacheConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClientError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ClientError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ClientError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.gateway.validate()?;
        self.tenant.validate()?;
        self.credential.validate()?;
        self.key_cache.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Device identity stamped into every request.
    #[must_use]
    pub fn device_profile(&self) -> DeviceProfile {
        let g = &self.gateway;
        DeviceProfile {
            app_id: g.app_id.clone(),
            version: g.version.clone(),
            device_mac: g.device_mac.clone(),
            user_name: g.user_name.clone(),
            taxpayer_id: g.taxpayer_id.clone(),
            longitude: g.longitude.clone(),
            latitude: g.latitude.clone(),
            agent_type: g.agent_type.clone(),
            brn: self.tenant.brn.clone(),
            operator_name: g.operator_name.clone(),
        }
    }

    /// Resolves the tenant, preferring the explicit overrides.
    ///
    /// # Errors
    /// Returns `Config` if neither the override nor the config names a TIN
    /// or device number.
    pub fn tenant_id(&self, tin: Option<&str>, device_no: Option<&str>) -> Result<TenantId> {
        let tin = tin.unwrap_or(&self.tenant.tin);
        let device_no = device_no.unwrap_or(&self.tenant.device_no);

        if tin.trim().is_empty() {
            return Err(ClientError::config("tenant.tin", "not configured"));
        }
        if device_no.trim().is_empty() {
            return Err(ClientError::config("tenant.device_no", "not configured"));
        }

        Ok(TenantId::parse(tin, device_no)?)
    }

    /// Credential store for the configured archive, honoring
    /// `EFRIS_PFX_PASSWORD`.
    #[must_use]
    pub fn credential_store(&self) -> CredentialStore {
        let password = resolve_password(&self.credential.password, std::env::var(PASSWORD_ENV).ok());
        CredentialStore::new(&self.credential.archive_path, password)
    }

    /// Timeout for the key exchange.
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.handshake_timeout_secs)
    }

    /// Timeout for envelope calls.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.request_timeout_secs)
    }

    /// Lifetime of a fetched session key.
    #[must_use]
    pub const fn key_ttl(&self) -> Duration {
        Duration::from_secs(self.key_cache.ttl_secs)
    }
}

fn resolve_password(configured: &str, from_env: Option<String>) -> String {
    match from_env {
        Some(password) if !password.is_empty() => password,
        _ => configured.to_string(),
    }
}

// ============================================
// GatewayConfig
// ============================================

/// Gateway endpoint and device identity section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// The gateway's single informational endpoint.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_app_id")]
    pub app_id: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// MAC-like device identifier registered with the gateway.
    #[serde(default = "default_device_mac")]
    pub device_mac: String,

    #[serde(default = "default_user_name")]
    pub user_name: String,

    #[serde(default = "default_taxpayer_id")]
    pub taxpayer_id: String,

    #[serde(default = "default_longitude")]
    pub longitude: String,

    #[serde(default = "default_latitude")]
    pub latitude: String,

    #[serde(default = "default_agent_type")]
    pub agent_type: String,

    #[serde(default = "default_operator_name")]
    pub operator_name: String,

    /// Key exchange timeout in seconds.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Envelope call timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_server_url() -> String {
    "https://efristest.ura.go.ug/efrisws/ws/taapp/getInformation".to_string()
}

fn default_app_id() -> String {
    DeviceProfile::default().app_id
}

fn default_version() -> String {
    DeviceProfile::default().version
}

fn default_device_mac() -> String {
    DeviceProfile::default().device_mac
}

fn default_user_name() -> String {
    DeviceProfile::default().user_name
}

fn default_taxpayer_id() -> String {
    DeviceProfile::default().taxpayer_id
}

fn default_longitude() -> String {
    DeviceProfile::default().longitude
}

fn default_latitude() -> String {
    DeviceProfile::default().latitude
}

fn default_agent_type() -> String {
    DeviceProfile::default().agent_type
}

fn default_operator_name() -> String {
    DeviceProfile::default().operator_name
}

fn default_handshake_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

impl GatewayConfig {
    fn validate(&self) -> Result<()> {
        let url = self.server_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ClientError::config(
                "gateway.server_url",
                "must be an http(s) URL",
            ));
        }

        if self.device_mac.trim().is_empty() {
            return Err(ClientError::config("gateway.device_mac", "cannot be empty"));
        }

        if self.handshake_timeout_secs == 0 {
            return Err(ClientError::config(
                "gateway.handshake_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ClientError::config(
                "gateway.request_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            app_id: default_app_id(),
            version: default_version(),
            device_mac: default_device_mac(),
            user_name: default_user_name(),
            taxpayer_id: default_taxpayer_id(),
            longitude: default_longitude(),
            latitude: default_latitude(),
            agent_type: default_agent_type(),
            operator_name: default_operator_name(),
            handshake_timeout_secs: default_handshake_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// ============================================
// TenantConfig
// ============================================

/// Default tenant section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Taxpayer identification number.
    #[serde(default)]
    pub tin: String,

    /// Fiscal device number.
    #[serde(default)]
    pub device_no: String,

    /// Business registration number.
    #[serde(default)]
    pub brn: String,
}

impl TenantConfig {
    fn validate(&self) -> Result<()> {
        // Both or neither
        if self.tin.trim().is_empty() != self.device_no.trim().is_empty() {
            return Err(ClientError::config(
                "tenant",
                "tin and device_no must be set together",
            ));
        }
        Ok(())
    }
}

// ============================================
// CredentialConfig
// ============================================

/// Credential archive section.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Path to the PKCS#12 archive.
    #[serde(default = "default_archive_path")]
    pub archive_path: PathBuf,

    /// Archive password.
    #[serde(default, skip_serializing)]
    pub password: String,
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("/etc/efris/device.pfx")
}

impl CredentialConfig {
    fn validate(&self) -> Result<()> {
        if self.archive_path.as_os_str().is_empty() {
            return Err(ClientError::config(
                "credential.archive_path",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            archive_path: default_archive_path(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("archive_path", &self.archive_path)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// ============================================
// KeyCacheConfig
// ============================================

/// Session key cache section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyCacheConfig {
    /// Prefix of the per-tenant cache key.
    #[serde(default = "default_cache_key_prefix")]
    pub cache_key_prefix: String,

    /// Session key lifetime in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Padding schemes tried, in order, when unwrapping the session key.
    #[serde(default = "default_unwrap_schemes")]
    pub unwrap_schemes: Vec<PaddingScheme>,
}

fn default_cache_key_prefix() -> String {
    "efris_cached_aes_key".to_string()
}

fn default_ttl_secs() -> u64 {
    86_400
}

fn default_unwrap_schemes() -> Vec<PaddingScheme> {
    PaddingScheme::DEFAULT_ORDER.to_vec()
}

impl KeyCacheConfig {
    fn validate(&self) -> Result<()> {
        if self.cache_key_prefix.trim().is_empty() {
            return Err(ClientError::config(
                "key_cache.cache_key_prefix",
                "cannot be empty",
            ));
        }

        if self.ttl_secs == 0 {
            return Err(ClientError::config(
                "key_cache.ttl_secs",
                "must be greater than 0",
            ));
        }

        if self.unwrap_schemes.is_empty() {
            return Err(ClientError::config(
                "key_cache.unwrap_schemes",
                "at least one scheme is required",
            ));
        }

        Ok(())
    }
}

impl Default for KeyCacheConfig {
    fn default() -> Self {
        Self {
            cache_key_prefix: default_cache_key_prefix(),
            ttl_secs: default_ttl_secs(),
            unwrap_schemes: default_unwrap_schemes(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.handshake_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.key_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.key_cache.cache_key_prefix, "efris_cached_aes_key");
        assert_eq!(
            config.key_cache.unwrap_schemes,
            vec![PaddingScheme::Pkcs1v15, PaddingScheme::OaepSha1]
        );
    }

    #[test]
    fn test_parse_full_config() {
        let config = ClientConfig::from_str(
            r#"
            [gateway]
            server_url = "https://gw.example/getInformation"
            device_mac = "AABBCCDDEEFF"
            handshake_timeout_secs = 10

            [tenant]
            tin = "1000023516"
            device_no = "TCS9e0df01728335239"
            brn = "80020001234567"

            [credential]
            archive_path = "/tmp/device.pfx"
            password = "secret"

            [key_cache]
            ttl_secs = 3600
            unwrap_schemes = ["oaep-sha1"]

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.server_url, "https://gw.example/getInformation");
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(config.key_cache.unwrap_schemes, vec![PaddingScheme::OaepSha1]);
        assert_eq!(config.logging.level, "debug");

        let profile = config.device_profile();
        assert_eq!(profile.device_mac, "AABBCCDDEEFF");
        assert_eq!(profile.brn, "80020001234567");
        assert_eq!(profile.app_id, "AP04");

        let tenant = config.tenant_id(None, None).unwrap();
        assert_eq!(tenant.tin.as_str(), "1000023516");
        assert_eq!(tenant.device_no.as_str(), "TCS9e0df01728335239");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ClientConfig::from_str("[gateway]\nserver_url = \"ftp://x\"").is_err());
        assert!(ClientConfig::from_str("[gateway]\nhandshake_timeout_secs = 0").is_err());
        assert!(ClientConfig::from_str("[key_cache]\nunwrap_schemes = []").is_err());
        assert!(ClientConfig::from_str("[key_cache]\nunwrap_schemes = [\"rot13\"]").is_err());
        assert!(ClientConfig::from_str("[tenant]\ntin = \"1000023516\"").is_err());
    }

    #[test]
    fn test_tenant_overrides() {
        let config = ClientConfig::default();
        assert!(config.tenant_id(None, None).unwrap_err().is_config_error());

        let tenant = config.tenant_id(Some("1000023516"), Some("DEV1")).unwrap();
        assert_eq!(tenant.to_string(), "1000023516/DEV1");
    }

    #[test]
    fn test_password_resolution() {
        assert_eq!(resolve_password("file", None), "file");
        assert_eq!(resolve_password("file", Some(String::new())), "file");
        assert_eq!(resolve_password("file", Some("env".into())), "env");
    }

    #[test]
    fn test_password_not_serialized() {
        let mut config = ClientConfig::default();
        config.credential.password = "hunter2".into();

        assert!(!config.to_toml().contains("hunter2"));
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
