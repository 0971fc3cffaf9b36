//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{defaults, paths, schema::Config};
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Keys whose lists accumulate across layers instead of being replaced
const ACCUMULATED_KEYS: [&str; 2] = ["excludeResources", "excludeClusters"];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Explicit config file (`--config`), which must exist
    /// 3. Root config file
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let root_path = paths::root_config_path();
        let mut files = Vec::new();
        if root_path.exists() {
            files.push(root_path.as_path());
        }
        files.extend(explicit);

        let config = Self::apply_env_overrides(Self::merge_files(&files)?);
        Self::validate(&config)?;

        Ok(config)
    }

    /// Merge config files over the defaults, later files taking precedence
    ///
    /// Only the keys a file sets override earlier layers.
    pub fn merge_files<P: AsRef<Path>>(files: &[P]) -> Result<Config> {
        let mut merged = match serde_yaml::to_value(Self::load_defaults())
            .context("Failed to serialize default configuration")?
        {
            Value::Mapping(mapping) => mapping,
            _ => Mapping::new(),
        };

        for path in files {
            Self::merge_layer(&mut merged, Self::load_layer(path.as_ref())?);
        }

        serde_yaml::from_value(Value::Mapping(merged)).context("Invalid merged configuration")
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        Self::merge_files(&[path])
    }

    /// Read one file as a partial configuration
    fn load_layer(path: &Path) -> Result<Mapping> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let layer = match serde_yaml::from_str::<Value>(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => {
                return Err(anyhow::anyhow!(
                    "Config file is not a mapping: {}",
                    path.display()
                ));
            }
        };

        tracing::debug!("Loaded config {} with {} keys", path.display(), layer.len());
        Ok(layer)
    }

    /// Merge `layer` into `base`
    ///
    /// Exclusion lists accumulate; every other key set in `layer` replaces the base value.
    fn merge_layer(base: &mut Mapping, layer: Mapping) {
        for (key, value) in layer {
            let accumulate = key
                .as_str()
                .is_some_and(|key| ACCUMULATED_KEYS.contains(&key));

            match value {
                Value::Sequence(more) if accumulate => match base.get_mut(&key) {
                    Some(Value::Sequence(existing)) => existing.extend(more),
                    _ => {
                        base.insert(key, Value::Sequence(more));
                    }
                },
                value => {
                    base.insert(key, value);
                }
            }
        }
    }

    /// Check values serde can not reject on its own
    pub fn validate(config: &Config) -> Result<()> {
        if config.channel_capacity == 0 {
            return Err(anyhow::anyhow!("channelCapacity must be at least 1"));
        }

        if let Some(index) = config
            .exclude_resources
            .iter()
            .position(|rule| !rule.has_selector())
        {
            return Err(anyhow::anyhow!(
                "excludeResources[{}] selects nothing: set apiVersion, kind, name, namespace, labels or annotations",
                index
            ));
        }

        config.label_selector().context("Invalid labelSelector")?;

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        // FLUX_ZOMBIES_FAIL override
        if let Ok(fail) = std::env::var("FLUX_ZOMBIES_FAIL") {
            match fail.parse::<bool>() {
                Ok(val) => config.fail = val,
                Err(_) => tracing::warn!("Ignoring invalid FLUX_ZOMBIES_FAIL value: {}", fail),
            }
        }

        // FLUX_ZOMBIES_NO_STREAM override
        if let Ok(no_stream) = std::env::var("FLUX_ZOMBIES_NO_STREAM") {
            match no_stream.parse::<bool>() {
                Ok(val) => config.no_stream = val,
                Err(_) => {
                    tracing::warn!("Ignoring invalid FLUX_ZOMBIES_NO_STREAM value: {}", no_stream)
                }
            }
        }

        // FLUX_ZOMBIES_OUTPUT override
        if let Ok(output) = std::env::var("FLUX_ZOMBIES_OUTPUT") {
            match output.parse() {
                Ok(format) => config.output = format,
                Err(e) => tracing::warn!("Ignoring FLUX_ZOMBIES_OUTPUT: {}", e),
            }
        }

        // FLUX_ZOMBIES_LABEL_SELECTOR override
        if let Ok(selector) = std::env::var("FLUX_ZOMBIES_LABEL_SELECTOR") {
            config.label_selector = Some(selector);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ExcludeRule, OutputFormat};

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "fail: true\nexcludeResources:\n  - kind: ConfigMap\n    name: kube-root-ca.crt\n",
        )
        .unwrap();

        let config = ConfigLoader::load_file(&path).unwrap();
        assert!(config.fail);
        assert_eq!(config.exclude_resources.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_file(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_merge_keeps_values_the_upper_file_omits() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(
            &dir,
            "root.yaml",
            "fail: true\noutput: json\nchannelCapacity: 8\nexcludeClusters: [staging]\nexcludeResources:\n  - kind: ConfigMap\n",
        );
        let explicit = write(
            &dir,
            "explicit.yaml",
            "excludeResources:\n  - kind: Secret\nexcludeClusters: [sandbox]\nlabelSelector: team=platform\n",
        );

        let merged = ConfigLoader::merge_files(&[&root, &explicit]).unwrap();
        assert!(merged.fail);
        assert_eq!(merged.output, OutputFormat::Json);
        assert_eq!(merged.channel_capacity, 8);
        assert_eq!(merged.label_selector.as_deref(), Some("team=platform"));
        assert_eq!(merged.exclude_clusters, vec!["staging", "sandbox"]);

        let kinds: Vec<_> = merged
            .exclude_resources
            .iter()
            .map(|rule| rule.kind.as_deref())
            .collect();
        assert_eq!(kinds, vec![Some("ConfigMap"), Some("Secret")]);
    }

    #[test]
    fn test_merge_upper_file_overrides_set_values() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(&dir, "root.yaml", "fail: true\noutput: json\n");
        let explicit = write(&dir, "explicit.yaml", "fail: false\nnoStream: true\n");

        let merged = ConfigLoader::merge_files(&[&root, &explicit]).unwrap();
        assert!(!merged.fail);
        assert!(merged.no_stream);
        assert_eq!(merged.output, OutputFormat::Json);
    }

    #[test]
    fn test_merge_without_files_is_default() {
        let merged = ConfigLoader::merge_files::<&Path>(&[]).unwrap();
        assert_eq!(merged, Config::default());
    }

    #[test]
    fn test_empty_and_scalar_files() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write(&dir, "empty.yaml", "");
        assert_eq!(ConfigLoader::load_file(&empty).unwrap(), Config::default());

        let scalar = write(&dir, "scalar.yaml", "just a string\n");
        let err = ConfigLoader::load_file(&scalar).unwrap_err();
        assert!(err.to_string().contains("not a mapping"));
    }

    #[test]
    fn test_validate_rejects_bad_label_selector() {
        let config = Config {
            label_selector: Some("app in ()".to_string()),
            ..Default::default()
        };
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(err.to_string().contains("labelSelector"));
    }

    #[test]
    fn test_validate_rejects_empty_rule() {
        let config = Config {
            exclude_resources: vec![ExcludeRule {
                cluster: Some("prod".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(err.to_string().contains("excludeResources[0]"));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = Config {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(ConfigLoader::validate(&config).is_err());
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: set_var is unsafe in Rust 2024 due to potential data races.
        // No other test in this crate reads these variables.
        unsafe {
            std::env::set_var("FLUX_ZOMBIES_FAIL", "true");
            std::env::set_var("FLUX_ZOMBIES_OUTPUT", "json");
        }

        let config = ConfigLoader::apply_env_overrides(Config::default());

        assert!(config.fail);
        assert_eq!(config.output, OutputFormat::Json);

        // SAFETY: see above.
        unsafe {
            std::env::remove_var("FLUX_ZOMBIES_FAIL");
            std::env::remove_var("FLUX_ZOMBIES_OUTPUT");
        }
    }
}
