use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for privlens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub keywords: KeywordConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Text beyond this many bytes is not scanned
    #[serde(default = "default_max_scan_bytes")]
    pub max_scan_bytes: usize,

    /// Extensions treated as text regardless of media type
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
}

/// Substrings matched against tag field names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default = "default_sensitive_keywords")]
    pub sensitive: Vec<String>,

    #[serde(default = "default_warning_keywords")]
    pub warning: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_true")]
    pub tag_penalties: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_scan_bytes: default_max_scan_bytes(),
            text_extensions: default_text_extensions(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            sensitive: default_sensitive_keywords(),
            warning: default_warning_keywords(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tag_penalties: default_true(),
        }
    }
}

fn default_max_scan_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_text_extensions() -> Vec<String> {
    strings(&[
        "txt", "md", "json", "xml", "csv", "log", "html", "htm", "js", "ts", "css", "yaml", "yml",
        "ini", "conf",
    ])
}

fn default_sensitive_keywords() -> Vec<String> {
    strings(&["GPS", "Latitude", "Longitude", "Altitude", "Location"])
}

fn default_warning_keywords() -> Vec<String> {
    strings(&[
        "Make",
        "Model",
        "Software",
        "SerialNumber",
        "LensSerialNumber",
        "CameraSerialNumber",
    ])
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there when it does not exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "privlens", "privlens") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.privlens/config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.max_scan_bytes, 2 * 1024 * 1024);
        assert!(config.scoring.tag_penalties);
        assert!(config.keywords.sensitive.contains(&"GPS".to_string()));
        assert!(config.scan.text_extensions.contains(&"csv".to_string()));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scan.max_scan_bytes, config.scan.max_scan_bytes);
        assert_eq!(parsed.keywords.warning, config.keywords.warning);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str("[scan]\nmax_scan_bytes = 1024\n").unwrap();
        assert_eq!(parsed.scan.max_scan_bytes, 1024);
        assert!(!parsed.scan.text_extensions.is_empty());
        assert!(parsed.scoring.tag_penalties);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.keywords.sensitive.len(), 5);

        std::fs::write(&path, "[scoring]\ntag_penalties = false\n").unwrap();
        assert!(!Config::load_from(&path).unwrap().scoring.tag_penalties);

        std::fs::write(&path, "scan = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
