use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub const MAX_THUMBNAIL_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;
pub const THUMBNAIL_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select board, standard and subject")]
    IncompleteSelection,
    #[error("Title is required")]
    MissingTitle,
    #[error("PDF file is required")]
    MissingPdf,
    #[error("Please select a valid PDF file")]
    NotPdf,
    #[error("File size must be less than 10MB")]
    PdfTooLarge,
    #[error("Thumbnail is required")]
    MissingThumbnail,
    #[error("Please select a valid image file (JPG, PNG, or GIF)")]
    NotImage,
    #[error("File size must be less than 5MB")]
    ThumbnailTooLarge,
    #[error("Video URL is required")]
    MissingVideoUrl,
    #[error("Please enter a valid YouTube URL")]
    InvalidVideoUrl,
    #[error("Duration is required for video resources")]
    MissingDuration,
    #[error("Duration must be a positive number")]
    InvalidDuration,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Valid price is required")]
    InvalidPrice,
    #[error("Unknown payment status: {0}")]
    UnknownStatus(String),
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// A file on the local disk that the shell picked for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
    pub size: u64,
}

impl LocalFile {
    /// Reads size from disk. The shell may pass the MIME type it saw; without
    /// one it is guessed from the extension.
    pub fn inspect(path: &Path, mime: Option<&str>) -> Result<Self, ValidationError> {
        let meta = std::fs::metadata(path).map_err(|e| ValidationError::Unreadable {
            path: path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
        if !meta.is_file() {
            return Err(ValidationError::Unreadable {
                path: path.to_string_lossy().to_string(),
                reason: "not a regular file".to_string(),
            });
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| mime_from_extension(path).to_string());
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime,
            size: meta.len(),
        })
    }
}

pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => PDF_MIME_TYPE,
        _ => "application/octet-stream",
    }
}

pub fn validate_thumbnail(file: &LocalFile) -> Result<(), ValidationError> {
    if !THUMBNAIL_MIME_TYPES.contains(&file.mime.as_str()) {
        return Err(ValidationError::NotImage);
    }
    if file.size > MAX_THUMBNAIL_BYTES {
        return Err(ValidationError::ThumbnailTooLarge);
    }
    Ok(())
}

pub fn validate_pdf(file: &LocalFile) -> Result<(), ValidationError> {
    if file.mime != PDF_MIME_TYPE {
        return Err(ValidationError::NotPdf);
    }
    if file.size > MAX_PDF_BYTES {
        return Err(ValidationError::PdfTooLarge);
    }
    Ok(())
}

fn youtube_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$")
            .expect("static youtube pattern")
    })
}

pub fn validate_video_url(url: &str) -> Result<(), ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::MissingVideoUrl);
    }
    if !youtube_pattern().is_match(url) {
        return Err(ValidationError::InvalidVideoUrl);
    }
    Ok(())
}

/// Drops everything but ASCII digits, the way the duration input filters keystrokes.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn parse_duration_minutes(raw: &str) -> Result<u32, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingDuration);
    }
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(ValidationError::InvalidDuration),
        Ok(minutes) => Ok(minutes),
    }
}

/// Whole minutes rendered as `MM:00`; three-digit minute counts are kept as is.
pub fn format_duration(minutes: u32) -> String {
    format!("{minutes:02}:00")
}

pub fn require_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(v.to_string())
}
