//! Configuration management for email-gateway
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Legacy `EMAIL_*` environment variables (highest priority, mapped onto `[smtp]`)
//! 2. `GATEWAY_` prefixed environment variables, `__` for nesting
//! 3. `./config.toml` (development)
//! 4. `~/.config/email-gateway/config.toml` (user config, XDG)
//! 5. `/etc/email-gateway/config.toml` (system config)
//! 6. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [server]
//! port = 3000
//! uploads_dir = "./uploads"
//!
//! [smtp]
//! host = "smtp.gmail.com"
//! port = 587
//! secure = false
//! user = "sender@example.com"
//! pass = "app-password"
//!
//! [attachments]
//! max_files = 5
//! max_file_size = 10485760
//! test_pdf_path = "./test.pdf"
//! ```
//!
//! The flat variables `EMAIL_HOST`, `EMAIL_PORT`, `EMAIL_SECURE`, `EMAIL_USER`
//! and `EMAIL_PASS` keep working and override everything else.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variables recognized without the `GATEWAY_` prefix
const LEGACY_SMTP_KEYS: [&str; 5] = ["host", "port", "secure", "user", "pass"];

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Upper bound for a single request, in seconds
    pub request_timeout_secs: u64,

    /// Directory uploaded attachments are staged in
    pub uploads_dir: PathBuf,

    /// Verify the SMTP connection once the listener is up
    pub verify_on_startup: bool,

    /// Allow cross-origin requests from browser form clients
    pub cors_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            uploads_dir: PathBuf::from("./uploads"),
            verify_on_startup: true,
            cors_enabled: true,
        }
    }
}

impl ServerSettings {
    /// Socket address string suitable for `TcpListener::bind`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Which mail transport backs the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportBackend {
    /// Deliver through an SMTP relay (default)
    #[default]
    Smtp,
    /// Log envelopes instead of delivering them
    Console,
}

/// SMTP relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// Transport implementation
    pub backend: TransportBackend,

    /// Relay hostname
    pub host: String,

    /// Relay port (587 for STARTTLS, 465 for implicit TLS)
    pub port: u16,

    /// Use implicit TLS from the first byte; only the literal `true` enables it
    #[serde(deserialize_with = "deserialize_flag")]
    pub secure: bool,

    /// Login user, also the default sender address
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub user: Option<String>,

    /// Login password
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub pass: Option<String>,

    /// Sender address override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Skip certificate verification (development relays only)
    pub accept_invalid_certs: bool,

    /// SMTP command timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            backend: TransportBackend::Smtp,
            host: "smtp.gmail.com".to_string(),
            port: 587,
            secure: false,
            user: None,
            pass: None,
            from: None,
            accept_invalid_certs: false,
            timeout_secs: 30,
        }
    }
}

impl SmtpSettings {
    /// Address messages are sent from: the explicit `from`, else the login user
    #[must_use]
    pub fn sender(&self) -> Option<&str> {
        self.from
            .as_deref()
            .or(self.user.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// SMTP command timeout as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Attachment limits and fixed assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentSettings {
    /// Maximum number of files per request
    pub max_files: usize,

    /// Maximum size of a single file in bytes
    pub max_file_size: usize,

    /// File sent by `/api/send-test-pdf`
    pub test_pdf_path: PathBuf,
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_size: 10 * 1024 * 1024,
            test_pdf_path: PathBuf::from("./test.pdf"),
        }
    }
}

impl AttachmentSettings {
    /// Body limit for multipart uploads: every file at full size plus form overhead
    #[must_use]
    pub const fn body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size)
            .saturating_add(1024 * 1024)
    }

    /// Human readable per-file limit, e.g. `10MB`
    #[must_use]
    pub fn max_file_size_label(&self) -> String {
        let mb = self.max_file_size / (1024 * 1024);
        if mb > 0 && self.max_file_size % (1024 * 1024) == 0 {
            format!("{mb}MB")
        } else {
            format!("{} bytes", self.max_file_size)
        }
    }
}

/// Complete gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// SMTP relay settings
    #[serde(default)]
    pub smtp: SmtpSettings,

    /// Attachment limits
    #[serde(default)]
    pub attachments: AttachmentSettings,
}

impl GatewayConfig {
    /// Load configuration for a specific service
    ///
    /// Searches XDG-compliant locations, then layers environment variables on top.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file cannot be read or parsed
    /// - A value fails type conversion (e.g. a non-numeric `EMAIL_PORT`)
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        let system_config = PathBuf::from("/etc")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        let config = Self::with_env(figment).extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file falls back to defaults; environment variables still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or a value fails
    /// type conversion.
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let figment = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path));

        let config = Self::with_env(figment).extract()?;
        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// ```rust
    /// use email_gateway::config::GatewayConfig;
    ///
    /// let path = GatewayConfig::recommended_path("email-gateway");
    /// // Returns: ~/.config/email-gateway/config.toml
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| config_dir.join(service_name).join("config.toml"),
        )
    }

    fn with_env(figment: Figment) -> Figment {
        figment
            .merge(Env::prefixed("GATEWAY_").split("__").lowercase(true))
            .merge(
                Env::prefixed("EMAIL_")
                    .only(&LEGACY_SMTP_KEYS)
                    .map(|key| format!("smtp.{}", key.as_str().to_ascii_lowercase()).into()),
            )
    }
}

/// Accepts booleans, and treats any string other than `true` as false
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        #[allow(dead_code)]
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(_) => false,
        Flag::Text(text) => text == "true",
    })
}

/// Accepts any scalar as text; environment values such as `123456` arrive as numbers
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
    }

    Ok(Some(match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Int(value) => value.to_string(),
        Scalar::UInt(value) => value.to_string(),
        Scalar::Float(value) => value.to_string(),
        Scalar::Bool(value) => value.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.uploads_dir, PathBuf::from("./uploads"));
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert!(!config.smtp.secure);
        assert_eq!(config.attachments.max_files, 5);
        assert_eq!(config.attachments.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_sender_prefers_explicit_from() {
        let mut smtp = SmtpSettings {
            user: Some("login@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(smtp.sender(), Some("login@example.com"));

        smtp.from = Some("noreply@example.com".to_string());
        assert_eq!(smtp.sender(), Some("noreply@example.com"));

        smtp.from = None;
        smtp.user = None;
        assert_eq!(smtp.sender(), None);
    }

    #[test]
    fn test_size_label() {
        assert_eq!(AttachmentSettings::default().max_file_size_label(), "10MB");

        let odd = AttachmentSettings {
            max_file_size: 1500,
            ..Default::default()
        };
        assert_eq!(odd.max_file_size_label(), "1500 bytes");
    }

    #[test]
    fn test_recommended_path() {
        let path = GatewayConfig::recommended_path("test-gateway");
        let path = path.to_str().unwrap();
        assert!(path.contains("test-gateway"));
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_legacy_email_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("EMAIL_HOST", "mail.example.com");
            jail.set_env("EMAIL_PORT", "465");
            jail.set_env("EMAIL_SECURE", "true");
            jail.set_env("EMAIL_USER", "sender@example.com");
            jail.set_env("EMAIL_PASS", "hunter2");

            let config = GatewayConfig::load_from("missing.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.smtp.host, "mail.example.com");
            assert_eq!(config.smtp.port, 465);
            assert!(config.smtp.secure);
            assert_eq!(config.smtp.user.as_deref(), Some("sender@example.com"));
            assert_eq!(config.smtp.pass.as_deref(), Some("hunter2"));
            Ok(())
        });
    }

    #[test]
    fn test_numeric_credentials_stay_text() {
        Jail::expect_with(|jail| {
            jail.set_env("EMAIL_USER", "12345");
            jail.set_env("EMAIL_PASS", "123456");

            let config = GatewayConfig::load_from("missing.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.smtp.user.as_deref(), Some("12345"));
            assert_eq!(config.smtp.pass.as_deref(), Some("123456"));

            jail.set_env("EMAIL_PASS", "true");
            let config = GatewayConfig::load_from("missing.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.smtp.pass.as_deref(), Some("true"));
            Ok(())
        });
    }

    #[test]
    fn test_secure_only_for_literal_true() {
        Jail::expect_with(|jail| {
            jail.set_env("EMAIL_SECURE", "yes");
            let config = GatewayConfig::load_from("missing.toml").map_err(|e| e.to_string())?;
            assert!(!config.smtp.secure);

            jail.set_env("EMAIL_SECURE", "1");
            let config = GatewayConfig::load_from("missing.toml").map_err(|e| e.to_string())?;
            assert!(!config.smtp.secure);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "gateway.toml",
                r#"
[server]
port = 8080
uploads_dir = "/tmp/gateway-uploads"

[smtp]
backend = "console"
host = "relay.internal"

[attachments]
max_files = 2
"#,
            )?;

            let config = GatewayConfig::load_from("gateway.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.server.uploads_dir, PathBuf::from("/tmp/gateway-uploads"));
            assert_eq!(config.smtp.backend, TransportBackend::Console);
            assert_eq!(config.smtp.host, "relay.internal");
            assert_eq!(config.attachments.max_files, 2);
            assert_eq!(config.attachments.max_file_size, 10 * 1024 * 1024);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[smtp]\nhost = \"from-file\"\n")?;
            jail.set_env("GATEWAY_SERVER__PORT", "9000");
            jail.set_env("EMAIL_HOST", "from-env");

            let config = GatewayConfig::load_for_service("email-gateway-test")
                .map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.smtp.host, "from-env");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("EMAIL_PORT", "not-a-port");
            assert!(GatewayConfig::load_from("missing.toml").is_err());
            Ok(())
        });
    }
}
