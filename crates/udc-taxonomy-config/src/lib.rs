use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that replaces `data_dir` from the config file
pub const DATA_DIR_ENV: &str = "DATA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_canonical_file")]
    pub canonical_file: String,
    #[serde(default = "default_journal_file")]
    pub journal_file: String,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub crawl: CrawlSettings,
}

/// The `[crawl]` table. Durations are whole seconds or milliseconds so the
/// file stays plain TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_depth: usize,
    pub retry_attempts: u32,
    pub retry_step_ms: u64,
    pub polite_delay_min_ms: u64,
    pub polite_delay_max_ms: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            base_url: "https://udcsummary.info/php/index.php?lang=en".to_string(),
            timeout_secs: 30 * 60,
            max_depth: 10,
            retry_attempts: 3,
            retry_step_ms: 1000,
            polite_delay_min_ms: 500,
            polite_delay_max_ms: 1300,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_canonical_file() -> String {
    "udc_full.yaml".to_string()
}

fn default_journal_file() -> String {
    "udc_scraper_state.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            canonical_file: default_canonical_file(),
            journal_file: default_journal_file(),
            verbose: false,
            crawl: CrawlSettings::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded data path
        config.data_dir = Self::expand_path(&config.data_dir).unwrap_or(config.data_dir);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// The config file if there is one, otherwise defaults, with the
    /// `DATA_DIR` environment override applied.
    pub fn resolve() -> Result<Self, ConfigError> {
        let config = Self::load()?.unwrap_or_default();
        Ok(config.with_data_dir_override(std::env::var(DATA_DIR_ENV).ok()))
    }

    /// Replaces `data_dir` with a non-empty override value.
    pub fn with_data_dir_override(mut self, data_dir: Option<String>) -> Self {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            let dir = PathBuf::from(dir);
            self.data_dir = Self::expand_path(&dir).unwrap_or(dir);
        }
        self
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/udc-taxonomy");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn canonical_path(&self) -> PathBuf {
        self.data_dir.join(&self.canonical_file)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join(&self.journal_file)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/udc-taxonomy/config.toml"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.canonical_path(), PathBuf::from("data/udc_full.yaml"));
        assert_eq!(
            config.journal_path(),
            PathBuf::from("data/udc_scraper_state.json")
        );
        assert!(!config.verbose);
        assert_eq!(config.crawl.max_depth, 10);
        assert_eq!(config.crawl.retry_attempts, 3);
        assert_eq!(config.crawl.timeout_secs, 1800);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_crawl_table_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
verbose = true

[crawl]
max_depth = 4
polite_delay_min_ms = 0
"#,
        )
        .unwrap();

        assert!(config.verbose);
        assert_eq!(config.crawl.max_depth, 4);
        assert_eq!(config.crawl.polite_delay_min_ms, 0);
        assert_eq!(config.crawl.polite_delay_max_ms, 1300);
        assert_eq!(config.canonical_file, "udc_full.yaml");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            data_dir: PathBuf::from("/tmp/udc-data"),
            verbose: true,
            ..Config::default()
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("UDC_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$UDC_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("UDC_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_relative_path() {
        let path = PathBuf::from("relative/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config::default().with_data_dir_override(Some("/srv/udc".to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/srv/udc"));

        let unchanged = Config::default().with_data_dir_override(Some("  ".to_string()));
        assert_eq!(unchanged.data_dir, PathBuf::from("data"));

        let unset = Config::default().with_data_dir_override(None);
        assert_eq!(unset.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_malformed_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "data_dir = [").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            data_dir: PathBuf::from("/tmp/udc-data"),
            canonical_file: "classification.yaml".to_string(),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_tilde_in_data_dir_is_expanded_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "data_dir = \"~/udc/data\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        let data_dir = config.data_dir.to_string_lossy();
        assert!(!data_dir.starts_with('~'));
        assert!(data_dir.ends_with("udc/data"));
    }
}
