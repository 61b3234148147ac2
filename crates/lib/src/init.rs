//! Initialize the configuration directory: create ~/.ares, the default config, and an empty ticket store.
//!
//! The default config is written in full (including the client and equipment registry)
//! so deployments can edit the tables in place.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;

/// Ensure the configuration directory has been initialized (config file exists).
pub fn require_initialized(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `ares init` first (config file not found: {})",
            config_path.display()
        );
    }
    Ok(())
}

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with every default section if missing.
/// - Creates the tickets file (`[]`) at the resolved tickets path if missing.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let default_config = serde_json::to_string_pretty(&config::Config::default())
            .context("serializing default config")?;
        std::fs::write(config_path, default_config)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    let (config, _) = config::load_config(Some(config_path.to_path_buf()))?;
    let tickets_path = config::resolve_tickets_path(&config, config_path);
    if !tickets_path.exists() {
        if let Some(parent) = tickets_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating tickets directory {}", parent.display()))?;
        }
        std::fs::write(&tickets_path, b"[]")
            .with_context(|| format!("writing empty ticket store to {}", tickets_path.display()))?;
        log::info!("created ticket store at {}", tickets_path.display());
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_config_and_ticket_store() {
        let dir = std::env::temp_dir().join(format!("ares-init-{}", uuid::Uuid::new_v4()));
        let config_path = dir.join("config.json");
        assert!(require_initialized(&config_path).is_err());

        let out = init_config_dir(&config_path).unwrap();
        assert_eq!(out, dir);
        require_initialized(&config_path).unwrap();

        let (config, _) = config::load_config(Some(config_path.clone())).unwrap();
        assert_eq!(config.gateway.port, 15151);
        assert!(config
            .registry
            .clients
            .iter()
            .any(|c| c.name == "Clínica San Roque"));
        assert_eq!(std::fs::read_to_string(dir.join("tickets.json")).unwrap(), "[]");

        // Second run leaves edited files alone.
        std::fs::write(&config_path, r#"{ "gateway": { "port": 9000 } }"#).unwrap();
        init_config_dir(&config_path).unwrap();
        let (config, _) = config::load_config(Some(config_path)).unwrap();
        assert_eq!(config.gateway.port, 9000);
        let _ = std::fs::remove_dir_all(dir);
    }
}
