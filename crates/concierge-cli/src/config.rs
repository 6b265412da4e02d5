use anyhow::{Context, Result};
use concierge_core::{ClassifierConfig, CoordinatorConfig, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when neither --debug nor RUST_LOG is given
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

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".concierge")
}

impl ConciergeConfig {
    /// Load from `custom_path`, or from the default location when none is
    /// given. A missing default file yields the built-in defaults; a missing
    /// explicit path is an error.
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from(path),
            None => {
                let path = config_dir().join("config.toml");
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;

        // Expand environment variables before parsing
        let expanded = expand_env_vars(&content);

        let config: Self = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;

        config
            .coordinator
            .validate()
            .with_context(|| format!("Invalid [coordinator] section in {}", path.display()))?;

        Ok(config)
    }
}

/// Variables that may be referenced as `${VAR}` in config files
const ALLOWED_ENV_VARS: &[&str] = &["OLLAMA_HOST", "CONCIERGE_MODEL", "HOME"];

fn expand_env_vars(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        let name = &after[..end];
        if ALLOWED_ENV_VARS.contains(&name) {
            output.push_str(&std::env::var(name).unwrap_or_default());
        } else {
            warn!(
                "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                name
            );
            output.push_str(&rest[start..start + end + 3]);
        }
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::Domain;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_bundled_default_parses() {
        let file = write_config(include_str!("../../../config/default.toml"));
        let config = ConciergeConfig::load_from(file.path()).unwrap();

        assert_eq!(config.classifier.fallback, Domain::Hello);
        assert_eq!(config.coordinator, CoordinatorConfig::default());
        assert_eq!(config.model, ModelConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.classifier.keywords.len(), 4);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = write_config(
            "[coordinator]\nparallel_dispatch = true\n\n[model]\nmodel = \"qwen2.5\"\n",
        );
        let config = ConciergeConfig::load_from(file.path()).unwrap();

        assert!(config.coordinator.parallel_dispatch);
        assert_eq!(config.coordinator.collaboration_threshold, 0.5);
        assert_eq!(config.model.model, "qwen2.5");
        assert_eq!(config.model.base_url, "http://localhost:11434");
        assert_eq!(
            config.classifier.keywords,
            concierge_core::classifier::default_keywords()
        );
    }

    #[test]
    fn test_domain_aliases_in_config() {
        let file = write_config("[classifier]\nfallback = \"general\"\n");
        let config = ConciergeConfig::load_from(file.path()).unwrap();
        assert_eq!(config.classifier.fallback, Domain::Hello);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let file = write_config("[coordinator]\ncollaboration_threshold = 1.5\n");
        let err = ConciergeConfig::load_from(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("collaboration_threshold"));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(ConciergeConfig::load(&Some(path)).is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let file = write_config("[coordinator\n");
        let err = ConciergeConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn test_expand_allowed_var() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(expand_env_vars("dir = \"${HOME}/x\""), format!("dir = \"{}/x\"", home));
    }

    #[test]
    fn test_unlisted_var_left_verbatim() {
        assert_eq!(
            expand_env_vars("key = \"${SECRET_TOKEN}\" and ${HOME"),
            "key = \"${SECRET_TOKEN}\" and ${HOME"
        );
        assert_eq!(expand_env_vars("no vars here"), "no vars here");
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = ConciergeConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ConciergeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.coordinator, config.coordinator);
        assert_eq!(parsed.classifier, config.classifier);
    }
}
