use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Feed polling configuration
    #[serde(default)]
    pub feed: FeedConfig,
    /// Severity classification configuration
    #[serde(default)]
    pub classification: ClassificationConfig,
    /// Allowed CORS origins. Required unless cors_permissive is true.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only). Defaults to false.
    #[serde(default)]
    pub cors_permissive: bool,
}

/// Configuration for the polling-place feed fetch cycle
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the ArcGIS feature service layer
    #[serde(default = "FeedConfig::default_url")]
    pub url: String,
    /// Interval in milliseconds between fetch cycles (default: 30000)
    #[serde(default = "FeedConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "FeedConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl FeedConfig {
    fn default_url() -> String {
        "https://services6.arcgis.com/wkbq75VVf2MvUvs7/ArcGIS/rest/services/lookup_view_polling_places_2024_11/FeatureServer/0".to_string()
    }
    fn default_poll_interval_ms() -> u64 {
        30_000
    }
    fn default_timeout_secs() -> u64 {
        30
    }
}

/// Configuration for the wait-count severity classifier
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationConfig {
    /// Number of severity classes (3 or 4)
    #[serde(default = "ClassificationConfig::default_classes")]
    pub classes: usize,
    /// Ordered color palette, one entry per class, lowest severity first
    #[serde(default = "ClassificationConfig::default_palette")]
    pub palette: Vec<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            classes: Self::default_classes(),
            palette: Self::default_palette(),
        }
    }
}

impl ClassificationConfig {
    fn default_classes() -> usize {
        3
    }
    fn default_palette() -> Vec<String> {
        vec![
            "#1a9641".to_string(),
            "#f6f63f".to_string(),
            "#d7191c".to_string(),
        ]
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate cross-field constraints the serde layer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(3..=4).contains(&self.classification.classes) {
            return Err(ConfigError::InvalidValue(format!(
                "classification.classes must be 3 or 4, got {}",
                self.classification.classes
            )));
        }
        if self.classification.palette.len() != self.classification.classes {
            return Err(ConfigError::InvalidValue(format!(
                "classification.palette must have {} entries, got {}",
                self.classification.classes,
                self.classification.palette.len()
            )));
        }
        if self.feed.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "feed.poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
