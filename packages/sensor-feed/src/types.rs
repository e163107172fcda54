use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FeedError, Result};
use crate::quantize::QuantParams;

/// Geometry and quantisation of a dispenser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispenserConfig {
    pub path: PathBuf,
    pub columns: usize,
    pub rows: usize,
    #[serde(default, alias = "quantization")]
    pub quantisation: QuantParams,
}

impl DispenserConfig {
    pub fn new(path: impl Into<PathBuf>, columns: usize, rows: usize) -> Self {
        Self {
            path: path.into(),
            columns,
            rows,
            quantisation: QuantParams::default(),
        }
    }

    pub fn with_quantisation(mut self, quantisation: QuantParams) -> Self {
        self.quantisation = quantisation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 {
            return Err(FeedError::Config("columns must be at least 1".to_string()));
        }
        if self.rows == 0 {
            return Err(FeedError::Config("rows must be at least 1".to_string()));
        }
        self.quantisation
            .validate()
            .map_err(|e| FeedError::Config(e.to_string()))
    }

    /// Number of elements in one channel-major window
    pub fn window_len(&self) -> usize {
        self.columns * self.rows
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            FeedError::Config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Options for a feature pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Skip rows that fail to parse instead of aborting
    #[serde(default)]
    pub skip_malformed: bool,
    /// Stop after this many complete windows
    #[serde(default)]
    pub max_windows: Option<usize>,
}

/// Aggregate feature vector produced by a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PooledFeatures {
    pub id: String,
    pub source: String,
    pub windows: usize,
    pub rows_streamed: usize,
    pub rows_skipped: usize,
    pub features: Vec<f32>,
    pub created_at: String,
}

impl PooledFeatures {
    pub fn new(
        source: String,
        windows: usize,
        rows_streamed: usize,
        rows_skipped: usize,
        features: Vec<f32>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            windows,
            rows_streamed,
            rows_skipped,
            features,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Value range and mean of one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub label: String,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// Result of inspecting a CSV source against an expected column count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    pub columns: usize,
    pub header: Vec<String>,
    pub data_rows: usize,
    pub malformed_rows: usize,
    pub first_error: Option<String>,
    pub channels: Vec<ChannelStats>,
    /// uint8 quantisation covering every observed value, if any row parsed
    pub suggested_quantisation: Option<QuantParams>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_json_defaults_quantisation() {
        let config: DispenserConfig =
            serde_json::from_str(r#"{"path": "imu.csv", "columns": 6, "rows": 128}"#).unwrap();
        assert_eq!(config.quantisation, QuantParams::default());
        assert_eq!(config.window_len(), 768);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_accepts_us_spelling() {
        let config: DispenserConfig = serde_json::from_str(
            r#"{"path": "a.csv", "columns": 1, "rows": 1,
                "quantization": {"scale": 0.5, "zero_point": 7}}"#,
        )
        .unwrap();
        assert_eq!(config.quantisation.zero_point, 7);
    }

    #[test]
    fn test_config_validation() {
        assert!(DispenserConfig::new("a.csv", 0, 4).validate().is_err());
        assert!(DispenserConfig::new("a.csv", 3, 0).validate().is_err());
        let bad = DispenserConfig::new("a.csv", 3, 4).with_quantisation(QuantParams {
            scale: -1.0,
            zero_point: 0,
        });
        assert!(matches!(bad.validate(), Err(FeedError::Config(_))));
    }

    #[test]
    fn test_config_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, r#"{"path": "x.csv", "columns": 2, "rows": 3}"#).unwrap();
        let config = DispenserConfig::from_json_file(&path).unwrap();
        assert_eq!(config.columns, 2);

        std::fs::write(&path, "{not json").unwrap();
        assert!(DispenserConfig::from_json_file(&path).is_err());
    }

    #[test]
    fn test_pooled_features_metadata() {
        let result = PooledFeatures::new("a.csv".to_string(), 2, 8, 1, vec![0.5]);
        assert!(!result.id.is_empty());
        assert!(!result.created_at.is_empty());
        assert_eq!(result.rows_skipped, 1);
    }
}
