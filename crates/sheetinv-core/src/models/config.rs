//! Configuration structures for the conversion pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SheetinvError};

/// Main configuration for the sheetinv pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetinvConfig {
    /// Column mapping configuration.
    pub mapping: MappingConfig,

    /// Format and relationship detection configuration.
    pub detection: DetectionConfig,

    /// Row to invoice transformation configuration.
    pub transform: TransformConfig,
}

/// Column mapper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Lowest fuzzy-match confidence (0-100) accepted for a mapping.
    pub min_confidence: u8,

    /// Number of leading rows inspected for sample values.
    pub sample_rows: usize,

    /// Maximum distinct sample values kept per column.
    pub max_sample_values: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            min_confidence: 65,
            sample_rows: 10,
            max_sample_values: 5,
        }
    }
}

/// Format and relationship detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Distinct/total invoice number ratio below which rows are grouped.
    pub multi_row_ratio: f64,

    /// Minimum value overlap (0-100) for a sheet relationship.
    pub relationship_min_confidence: u8,

    /// Number of leading rows inspected by the format detector.
    pub format_sample_rows: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            multi_row_ratio: 0.8,
            relationship_min_confidence: 50,
            format_sample_rows: 10,
        }
    }
}

/// How a raw discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountMode {
    /// Values above 100 are fixed amounts, the rest are percentages.
    ///
    /// A 150% discount cannot be told apart from a 150.00 fixed discount.
    #[default]
    Heuristic,
    /// Always a percentage.
    Percentage,
    /// Always a fixed amount.
    Fixed,
}

/// Transformation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Currency code used when the source has no currency column.
    pub default_currency: String,

    /// Discount interpretation.
    pub discount_mode: DiscountMode,

    /// Warn when an explicit invoice total disagrees with the computed one.
    /// The explicit total still wins.
    pub warn_on_total_mismatch: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            default_currency: crate::models::invoice::DEFAULT_CURRENCY.to_string(),
            discount_mode: DiscountMode::Heuristic,
            warn_on_total_mismatch: false,
        }
    }
}

impl SheetinvConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| SheetinvError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.mapping.min_confidence > 100 {
            return Err(SheetinvError::Config(format!(
                "mapping.min_confidence must be at most 100, got {}",
                self.mapping.min_confidence
            )));
        }
        if self.detection.relationship_min_confidence > 100 {
            return Err(SheetinvError::Config(format!(
                "detection.relationship_min_confidence must be at most 100, got {}",
                self.detection.relationship_min_confidence
            )));
        }
        if !(self.detection.multi_row_ratio > 0.0 && self.detection.multi_row_ratio <= 1.0) {
            return Err(SheetinvError::Config(format!(
                "detection.multi_row_ratio must be in (0, 1], got {}",
                self.detection.multi_row_ratio
            )));
        }
        if self.transform.default_currency.trim().is_empty() {
            return Err(SheetinvError::Config(
                "transform.default_currency must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SheetinvError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
