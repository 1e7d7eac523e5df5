use std::{path::Path, sync::LazyLock};

use regex::Regex;
use url::Url;

use crate::error::ClientError;

static REPORT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://[^\s]+").expect("report url pattern"));

/// A clinic report picked for upload. Only images and PDFs are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ReportFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ClientError> {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name)
            .ok_or_else(|| ClientError::UnsupportedReport(file_name.clone()))?;
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Reject by name before reading anything.
        mime_for(&file_name).ok_or_else(|| ClientError::UnsupportedReport(file_name.clone()))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::ReadReport {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(file_name, bytes)
    }
}

fn mime_for(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()?
        .to_string_lossy()
        .to_ascii_lowercase();
    let mime = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime)
}

/// The upload endpoint answers with a human-readable message that embeds the
/// stored file's https URL.
pub(crate) fn extract_report_url(message: &str) -> Option<Url> {
    REPORT_URL
        .find_iter(message)
        .find_map(|found| Url::parse(found.as_str()).ok())
}
