//! Configuration loader.
//!
//! Reads `hamlet.toml` from the data directory and deserializes it into
//! [`OrchestratorConfig`]. Falls back to defaults when the file is missing
//! or malformed; a broken config file should never keep the village quiet.

use std::path::Path;

use hamlet_types::config::OrchestratorConfig;

/// Load orchestrator configuration from `{data_dir}/hamlet.toml`.
///
/// - Missing file: returns [`OrchestratorConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - Otherwise: the parsed config (unset fields take their defaults).
pub async fn load_config(data_dir: &Path) -> OrchestratorConfig {
    let config_path = data_dir.join("hamlet.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No hamlet.toml at {}, using defaults", config_path.display());
            return OrchestratorConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return OrchestratorConfig::default();
        }
    };

    match toml::from_str::<OrchestratorConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            OrchestratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.max_concurrent_replies, 3);
        assert_eq!(config.reply_cooldown_ms, 5_000);
    }

    #[tokio::test]
    async fn valid_toml_overrides_fields() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("hamlet.toml"),
            r#"
max_concurrent_replies = 6
reply_cooldown_ms = 2500
staleness_threshold_secs = 600
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.max_concurrent_replies, 6);
        assert_eq!(config.reply_cooldown_ms, 2_500);
        assert_eq!(config.staleness_threshold_secs, 600);
        // Unset fields keep their defaults.
        assert_eq!(config.response_cache_ttl_ms, 10_000);
    }

    #[tokio::test]
    async fn invalid_toml_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("hamlet.toml"), "not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.max_concurrent_replies, 3);
    }
}
