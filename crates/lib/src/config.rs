//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.ares/config.json`) and environment.
//! Every section has serde defaults, so `{}` is a valid config.

use crate::classifier::RegistryConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat transport settings (WhatsApp Cloud API).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Where replies for new tickets are delivered.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Ticket store location.
    #[serde(default)]
    pub tickets: TicketsConfig,

    /// Known clients and equipment for entity extraction.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Gateway bind, port, and auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 15151).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Auth for the API routes (/classify, /tickets). Webhooks use the WhatsApp verify token instead.
    #[serde(default)]
    pub auth: GatewayAuthConfig,
}

/// Gateway auth: bearer token or none (loopback-only when none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthConfig {
    #[serde(default)]
    pub mode: GatewayAuthMode,

    /// Bearer token for API routes. Overridden by ARES_GATEWAY_TOKEN env.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayAuthMode {
    /// No auth; allowed only when bind is loopback.
    #[default]
    None,

    /// Require `Authorization: Bearer <token>`.
    Token,
}

fn default_gateway_port() -> u16 {
    15151
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            auth: GatewayAuthConfig::default(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub whatsapp: WhatsAppChannelConfig,
}

/// WhatsApp Cloud API config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppChannelConfig {
    /// Graph API access token. Overridden by WHATSAPP_ACCESS_TOKEN env.
    pub access_token: Option<String>,
    /// Sender phone number id from the WhatsApp Business dashboard.
    pub phone_number_id: Option<String>,
    /// Token Meta echoes during webhook verification. Overridden by WHATSAPP_VERIFY_TOKEN env.
    pub verify_token: Option<String>,
    /// App secret used to check `X-Hub-Signature-256` on webhook POSTs. Overridden by WHATSAPP_APP_SECRET env.
    pub app_secret: Option<String>,
    /// API base (default https://graph.facebook.com). Useful for tests and proxies.
    pub api_base: Option<String>,
    /// Graph API version segment (default "v19.0").
    pub api_version: Option<String>,
}

/// Delivery targets for ticket replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyConfig {
    /// Chat that receives the short acknowledgment. When unset, the acknowledgment goes back to the sender's chat.
    pub group_chat_id: Option<String>,
    /// Chat of the on-call technician. When unset, no technician notification is sent.
    pub technician_chat_id: Option<String>,
    /// Include the sender's phone number in the group acknowledgment (default true).
    #[serde(default = "default_true")]
    pub include_phone_in_group: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            group_chat_id: None,
            technician_chat_id: None,
            include_phone_in_group: true,
        }
    }
}

/// Ticket store config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketsConfig {
    /// Path of the tickets JSON file. Relative paths are resolved against the config file's parent.
    /// Default: `tickets.json` next to the config file.
    pub path: Option<PathBuf>,
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the gateway token: env ARES_GATEWAY_TOKEN overrides config.
pub fn resolve_gateway_token(config: &Config) -> Option<String> {
    env_non_empty("ARES_GATEWAY_TOKEN").or_else(|| trimmed(&config.gateway.auth.token))
}

/// Resolve the WhatsApp access token: env WHATSAPP_ACCESS_TOKEN overrides config.
pub fn resolve_whatsapp_token(config: &Config) -> Option<String> {
    env_non_empty("WHATSAPP_ACCESS_TOKEN").or_else(|| trimmed(&config.channels.whatsapp.access_token))
}

/// Resolve the webhook verify token: env WHATSAPP_VERIFY_TOKEN overrides config.
pub fn resolve_whatsapp_verify_token(config: &Config) -> Option<String> {
    env_non_empty("WHATSAPP_VERIFY_TOKEN").or_else(|| trimmed(&config.channels.whatsapp.verify_token))
}

/// Resolve the webhook app secret: env WHATSAPP_APP_SECRET overrides config.
pub fn resolve_whatsapp_app_secret(config: &Config) -> Option<String> {
    env_non_empty("WHATSAPP_APP_SECRET").or_else(|| trimmed(&config.channels.whatsapp.app_secret))
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("ARES_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".ares").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or ARES_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the config directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Resolve the tickets file: `tickets.path` if set (relative to the config file's parent), otherwise `tickets.json` beside the config.
pub fn resolve_tickets_path(config: &Config, config_path: &Path) -> PathBuf {
    match &config.tickets.path {
        Some(p) if !p.as_os_str().is_empty() => {
            if p.is_absolute() {
                p.clone()
            } else {
                config_parent(config_path).join(p)
            }
        }
        _ => config_parent(config_path).join("tickets.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 15151);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn empty_json_is_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gateway.port, 15151);
        assert!(config.notify.include_phone_in_group);
        assert!(!config.registry.clients.is_empty());
        assert!(!config.registry.equipment.is_empty());
    }

    #[test]
    fn parses_camel_case_sections() {
        let json = r#"{
            "gateway": { "port": 8080, "auth": { "mode": "token", "token": " s3cret " } },
            "channels": { "whatsapp": { "phoneNumberId": "1234", "verifyToken": "v", "appSecret": "abc" } },
            "notify": { "groupChatId": "120363@g.us", "includePhoneInGroup": false },
            "tickets": { "path": "data/tickets.json" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.bind, "127.0.0.1");
        assert_eq!(config.gateway.auth.mode, GatewayAuthMode::Token);
        assert_eq!(config.channels.whatsapp.phone_number_id.as_deref(), Some("1234"));
        assert_eq!(config.channels.whatsapp.app_secret.as_deref(), Some("abc"));
        assert_eq!(config.notify.group_chat_id.as_deref(), Some("120363@g.us"));
        assert!(!config.notify.include_phone_in_group);
        assert_eq!(trimmed(&config.gateway.auth.token).as_deref(), Some("s3cret"));
    }

    #[test]
    fn resolve_tickets_path_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.ares/config.json");
        assert_eq!(
            resolve_tickets_path(&config, path),
            PathBuf::from("/home/user/.ares/tickets.json")
        );
    }

    #[test]
    fn resolve_tickets_path_override_relative() {
        let mut config = Config::default();
        config.tickets.path = Some(PathBuf::from("data/tickets.json"));
        let path = Path::new("/home/user/.ares/config.json");
        assert_eq!(
            resolve_tickets_path(&config, path),
            PathBuf::from("/home/user/.ares/data/tickets.json")
        );
    }

    #[test]
    fn resolve_tickets_path_override_absolute() {
        let mut config = Config::default();
        config.tickets.path = Some(PathBuf::from("/var/lib/ares/tickets.json"));
        let path = Path::new("config.json");
        assert_eq!(
            resolve_tickets_path(&config, path),
            PathBuf::from("/var/lib/ares/tickets.json")
        );
    }

    #[test]
    fn loopback_binds() {
        assert!(is_loopback_bind("127.0.0.1"));
        assert!(is_loopback_bind(" localhost "));
        assert!(!is_loopback_bind("0.0.0.0"));
    }
}
