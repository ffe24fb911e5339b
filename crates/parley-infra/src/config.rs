//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` by default) and
//! deserializes it into [`ParleyConfig`]. Falls back to defaults when the
//! file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use parley_types::config::ParleyConfig;

/// Environment variable selecting the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";

/// Resolve the data directory: `$PARLEY_DATA_DIR`, else `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parley")
}

/// Load configuration from `{data_dir}/config.toml` plus process environment.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: logs a warning, defaults.
/// - `DATABASE_URL`, `REDIS_URL`, `OPENAI_API_KEY`, `PORT`, `CORS_ORIGINS`
///   override the file.
pub async fn load_config(data_dir: &Path) -> ParleyConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

async fn load_config_file(data_dir: &Path) -> ParleyConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
    };

    match toml::from_str::<ParleyConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ParleyConfig::default()
        }
    }
}

/// Apply environment overrides using `var` as the lookup.
///
/// Empty values are ignored. An unparsable `PORT` is logged and ignored.
pub fn apply_env_overrides(config: &mut ParleyConfig, var: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(url) = var("REDIS_URL") {
        config.cache.redis_url = Some(url);
    }
    if let Some(key) = var("OPENAI_API_KEY") {
        config.generator.api_key = Some(key);
    }
    if let Some(port) = var("PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(err) => tracing::warn!("Ignoring invalid PORT {port:?}: {err}"),
        }
    }
    if let Some(origins) = var("CORS_ORIGINS") {
        config.server.cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.chat.cache_window, 20);
        assert_eq!(config.server.port, 8080);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[chat]
cache_window = 10
generate_timeout_secs = 5

[server]
port = 9000
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.chat.cache_window, 10);
        assert_eq!(config.chat.generate_timeout_secs, 5);
        assert_eq!(config.chat.cache_ttl_secs, 3600);
        assert_eq!(config.server.port, 9000);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.chat.cache_window, 20);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = ParleyConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("DATABASE_URL", "sqlite:///tmp/x.db"),
                ("REDIS_URL", "redis://cache:6379"),
                ("OPENAI_API_KEY", "sk-env"),
                ("PORT", "3000"),
                ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ]),
        );

        assert_eq!(config.database.url.as_deref(), Some("sqlite:///tmp/x.db"));
        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.generator.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn env_overrides_ignore_empty_and_invalid() {
        let mut config = ParleyConfig::default();
        apply_env_overrides(&mut config, env(&[("OPENAI_API_KEY", ""), ("PORT", "not-a-port")]));

        assert!(config.generator.api_key.is_none());
        assert_eq!(config.server.port, 8080);
    }
}
