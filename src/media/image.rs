use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ApiError;
use crate::validate::ValidationErrors;

/// Decoded `data:image/<ext>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

fn invalid_image(message: &str) -> ApiError {
    let mut errors = ValidationErrors::default();
    errors.push("image", message);
    ApiError::Validation(errors)
}

pub fn decode_data_url(data_url: &str) -> Result<DecodedImage, ApiError> {
    let rest = data_url
        .strip_prefix("data:image/")
        .ok_or_else(|| invalid_image("Expected a data:image/...;base64,... URL"))?;

    let (extension, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| invalid_image("Expected a base64-encoded payload"))?;

    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid_image("Unrecognized image format"));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| invalid_image("Malformed base64 payload"))?;
    if bytes.is_empty() {
        return Err(invalid_image("Must not be empty"));
    }

    Ok(DecodedImage {
        extension: extension.to_string(),
        bytes,
    })
}

/// Decodes the data URL and writes the image beneath `media_root`, returning
/// the stored path relative to the media root.
pub fn save_image(data_url: &str, media_root: &Path) -> Result<String, ApiError> {
    let image = decode_data_url(data_url)?;

    let relative = format!("recipes/{}.{}", uuid::Uuid::new_v4(), image.extension);
    let full: PathBuf = media_root.join(&relative);

    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ApiError::Database(format!("Failed to create media dir: {e}")))?;
    }
    fs::write(&full, &image.bytes)
        .map_err(|e| ApiError::Database(format!("Failed to store image: {e}")))?;

    Ok(relative)
}

/// Removes a previously stored image. Failures are logged and swallowed;
/// callers use this to roll back file writes when a later step fails.
pub fn remove_image(relative: &str, media_root: &Path) {
    if let Err(e) = fs::remove_file(media_root.join(relative)) {
        log::warn!("failed to remove stored image {relative}: {e}");
    }
}
