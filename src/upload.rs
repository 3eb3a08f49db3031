//! Validation of uploaded source images.

use std::io::Cursor;

use base64::{Engine, engine::general_purpose};
use image::ImageReader;

use crate::prelude::*;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MIN_IMAGE_SIDE: u32 = 64;
pub const MAX_IMAGE_SIDE: u32 = 4096;

/// An upload that passed [`validate_image`].
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Mime type of the detected format.
    pub mime: String,
}

impl ValidatedImage {
    /// Inline `data:` URL of the image, as accepted by the provider.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Checks the declared type, size and pixel dimensions of an upload.
pub fn validate_image(content_type: Option<&str>, bytes: Vec<u8>) -> Result<ValidatedImage> {
    let content_type = content_type.unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(Error::InvalidUpload(String::from("File must be an image")));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::InvalidUpload(String::from(
            "Image too large (max 10MB)",
        )));
    }

    let invalid = |reason: String| Error::InvalidUpload(format!("Invalid image file: {reason}"));
    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|err| invalid(err.to_string()))?;
    let mime = match reader.format() {
        Some(format) => String::from(format.to_mime_type()),
        None => return Err(invalid(String::from("unrecognised image format"))),
    };
    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| invalid(err.to_string()))?;

    if width < MIN_IMAGE_SIDE || height < MIN_IMAGE_SIDE {
        return Err(Error::InvalidUpload(String::from(
            "Image too small (min 64x64 pixels)",
        )));
    }
    if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        return Err(Error::InvalidUpload(String::from(
            "Image too large (max 4096x4096 pixels)",
        )));
    }

    Ok(ValidatedImage {
        bytes,
        width,
        height,
        mime,
    })
}
