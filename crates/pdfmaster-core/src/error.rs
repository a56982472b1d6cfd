use thiserror::Error;

use crate::plan::Tool;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Failed to parse PDF: {0}")]
    Load(String),

    #[error("PDF is encrypted or password protected")]
    Encrypted,

    #[error("Page operation failed: {0}")]
    Page(String),

    #[error("Cannot encode character {ch:?} (U+{code:04X}) with WinAnsiEncoding")]
    Encoding { ch: char, code: u32 },

    #[error("Failed to save PDF: {0}")]
    Save(String),
}

/// Failures while embedding an image annotation. These never escape
/// `compile`: the renderer logs them and drops the image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Malformed data URL: {0}")]
    DataUrl(String),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PNG decode failed: {0}")]
    Png(#[from] png::DecodingError),

    #[error("JPEG header unreadable: {0}")]
    Jpeg(#[from] image::ImageError),

    #[error("Unsupported image: {0}")]
    Unsupported(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    #[error("Daily limit reached ({limit} files). Upgrade to Pro for unlimited access!")]
    DailyLimit { limit: u32 },

    #[error("Free plan limit is {limit_mb}MB. Upgrade to Pro for up to {pro_limit_mb}MB!")]
    FreeFileTooLarge { limit_mb: u64, pro_limit_mb: u64 },

    #[error("Pro plan limit is {limit_mb}MB per file.")]
    ProFileTooLarge { limit_mb: u64 },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The {0} tool requires a Pro plan")]
    UpgradeRequired(Tool),

    #[error("No document loaded")]
    NoDocument,

    #[error("Annotation not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error("Invalid PDF: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Export failed: {0}")]
    Compile(#[from] CompileError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too small to be a valid PDF")]
    TooSmall,

    #[error("Not a valid PDF file (missing %PDF- header)")]
    MissingHeader,

    #[error("PDF appears truncated (missing %%EOF marker)")]
    Truncated,

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF has no pages")]
    NoPages,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
