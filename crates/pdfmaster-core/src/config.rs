//! Configuration for exports and plan limits
//!
//! Defaults match the hosted product. Hosts can override them from the
//! environment or pass a JSON document across the WASM boundary.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MB: u64 = 1024 * 1024;

/// Free-plan watermark stamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WatermarkConfig {
    pub text: String,
    /// Horizontal offset of the text start from the page center, in points
    pub center_offset: f64,
    /// Baseline height above the bottom edge, in points
    pub baseline: f64,
    pub font_size: f64,
    pub opacity: f64,
    /// Gray level, 0 is black
    pub gray: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: "Edited with PDFMaster Pro Free".to_string(),
            center_offset: -100.0,
            baseline: 20.0,
            font_size: 12.0,
            opacity: 0.4,
            gray: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileConfig {
    pub watermark: WatermarkConfig,
    /// Flate-compress uncompressed streams before saving
    pub compress: bool,
}

/// Per-plan file size and usage limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct QuotaLimits {
    pub free_max_bytes: u64,
    pub pro_max_bytes: u64,
    pub free_daily_exports: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            free_max_bytes: 20 * MB,
            pro_max_bytes: 500 * MB,
            free_daily_exports: 5,
        }
    }
}

impl QuotaLimits {
    pub fn free_max_mb(&self) -> u64 {
        self.free_max_bytes / MB
    }

    pub fn pro_max_mb(&self) -> u64 {
        self.pro_max_bytes / MB
    }
}

/// Everything a host configures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub compile: CompileConfig,
    pub quota: QuotaLimits,
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}

fn megabytes(key: &'static str, mb: u64) -> Result<u64, ConfigError> {
    mb.checked_mul(MB).ok_or_else(|| ConfigError::InvalidValue {
        key,
        value: mb.to_string(),
    })
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables (all optional):
    /// - PDFMASTER_WATERMARK_TEXT: stamp text for free exports
    /// - PDFMASTER_WATERMARK_OPACITY: 0.0-1.0
    /// - PDFMASTER_COMPRESS: "true" or "false"
    /// - PDFMASTER_FREE_MAX_MB / PDFMASTER_PRO_MAX_MB: per-file size limits
    /// - PDFMASTER_FREE_DAILY_EXPORTS: free exports per day
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(text) = std::env::var("PDFMASTER_WATERMARK_TEXT") {
            config.compile.watermark.text = text;
        }
        if let Some(opacity) = parse_env::<f64>("PDFMASTER_WATERMARK_OPACITY")? {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(ConfigError::InvalidValue {
                    key: "PDFMASTER_WATERMARK_OPACITY",
                    value: opacity.to_string(),
                });
            }
            config.compile.watermark.opacity = opacity;
        }
        if let Some(compress) = parse_env::<bool>("PDFMASTER_COMPRESS")? {
            config.compile.compress = compress;
        }
        if let Some(mb) = parse_env::<u64>("PDFMASTER_FREE_MAX_MB")? {
            config.quota.free_max_bytes = megabytes("PDFMASTER_FREE_MAX_MB", mb)?;
        }
        if let Some(mb) = parse_env::<u64>("PDFMASTER_PRO_MAX_MB")? {
            config.quota.pro_max_bytes = megabytes("PDFMASTER_PRO_MAX_MB", mb)?;
        }
        if let Some(count) = parse_env::<u32>("PDFMASTER_FREE_DAILY_EXPORTS")? {
            config.quota.free_daily_exports = count;
        }

        Ok(config)
    }
}
