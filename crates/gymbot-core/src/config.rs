//! Runtime configuration: defaults, then an optional TOML file, then `GYMBOT__*` env vars.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default config file stem (the `config` crate resolves `config/gymbot.toml`).
pub const DEFAULT_CONFIG_PATH: &str = "config/gymbot";

#[derive(Debug, Clone, Deserialize)]
pub struct GymBotConfig {
    pub app_name: String,
    /// Socket address the gateway binds, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// Sled directory holding the `profiles` and `exercises` trees.
    pub storage_path: String,
    /// Upper bound for each store call, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_seed")]
    pub seed_catalog_on_boot: bool,
}

fn default_store_timeout_ms() -> u64 {
    3000
}

fn default_seed() -> bool {
    true
}

impl GymBotConfig {
    /// Load config from file and environment. Precedence: env `GYMBOT__*` > file at
    /// `GYMBOT_CONFIG` (default `config/gymbot`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("GYMBOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("app_name", "GymBot")?
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("storage_path", "./data/gymbot")?
            .set_default("store_timeout_ms", 3000_i64)?
            .set_default("seed_catalog_on_boot", true)?;

        let path = Path::new(config_path);
        let with_ext = path.with_extension("toml");
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else if with_ext.exists() {
            builder.add_source(config::File::from(with_ext.as_path()))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("GYMBOT").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gymbot.toml");
        std::fs::write(
            &path,
            "app_name = \"Test Bot\"\nstore_timeout_ms = 250\nseed_catalog_on_boot = false\n",
        )
        .unwrap();

        let cfg = GymBotConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.app_name, "Test Bot");
        assert_eq!(cfg.store_timeout(), Duration::from_millis(250));
        assert!(!cfg.seed_catalog_on_boot);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = GymBotConfig::load_from("/nonexistent/gymbot-config").unwrap();
        assert_eq!(cfg.store_timeout_ms, 3000);
        assert!(cfg.seed_catalog_on_boot);
    }
}
