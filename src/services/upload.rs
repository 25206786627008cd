//! Multipart extraction for resize uploads

use actix_multipart::{Field, Multipart};
use actix_web::web::Bytes;
use futures_util::TryStreamExt;
use tracing::debug;

use crate::{
    config::ResizeConfig,
    error::{ResizerError, ResizerResult},
    services::resize::types::UploadedImage,
};

pub const IMAGES_FIELD: &str = "images";
pub const WIDTHS_FIELD: &str = "widths";

const WIDTHS_FIELD_LIMIT: usize = 64 * 1024;

/// Raw upload handed to the resize service
#[derive(Debug, Default)]
pub struct ResizeUpload {
    pub images: Vec<UploadedImage>,
    pub widths: Vec<String>,
}

/// Reads images and width tokens out of a multipart form
pub struct UploadExtractor<'a> {
    config: &'a ResizeConfig,
}

impl<'a> UploadExtractor<'a> {
    pub fn new(config: &'a ResizeConfig) -> Self {
        Self { config }
    }

    pub async fn extract(&self, mut payload: Multipart) -> ResizerResult<ResizeUpload> {
        let mut upload = ResizeUpload::default();

        while let Some(mut field) = payload.try_next().await? {
            let field_name = field.name().unwrap_or_default().to_string();

            match field_name.as_str() {
                IMAGES_FIELD => {
                    if let Some(image) = self.read_image(&mut field).await? {
                        upload.images.push(image);
                    }
                }
                WIDTHS_FIELD => {
                    let data = read_limited(&mut field, WIDTHS_FIELD_LIMIT, "Width list").await?;
                    let text = String::from_utf8(data).map_err(|_| {
                        ResizerError::ValidationFailed("Widths must be UTF-8 text".to_string())
                    })?;
                    upload.widths.extend(parse_widths_field(&text)?);
                }
                other => {
                    debug!("Skipping unexpected form field {:?}", other);
                    while field.try_next().await?.is_some() {}
                }
            }
        }

        debug!(
            "Extracted {} images and {} width tokens",
            upload.images.len(),
            upload.widths.len()
        );

        Ok(upload)
    }

    async fn read_image(&self, field: &mut Field) -> ResizerResult<Option<UploadedImage>> {
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        if !is_valid_image_type(content_type.as_deref()) {
            return Err(ResizerError::ValidationFailed(format!(
                "Invalid file type for {:?}: {}",
                filename,
                content_type.unwrap_or_default()
            )));
        }

        let label = if filename.is_empty() {
            "Image".to_string()
        } else {
            format!("Image {:?}", filename)
        };
        let data = read_limited(field, self.config.max_file_size, &label).await?;

        // Browsers send an empty part when no file was chosen
        if data.is_empty() && filename.is_empty() {
            return Ok(None);
        }

        Ok(Some(UploadedImage {
            name: filename,
            bytes: Bytes::from(data),
        }))
    }
}

/// Image parts must be `image/*`; untyped or octet-stream parts are left to the decoder
pub fn is_valid_image_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.starts_with("image/") || ct == "application/octet-stream"
        }
    }
}

/// Split a widths field into tokens.
///
/// Accepts a JSON array of strings or numbers (what the web client sends)
/// or a comma separated list.
pub fn parse_widths_field(text: &str) -> ResizerResult<Vec<String>> {
    let text = text.trim();

    if text.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
        return values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => Ok(s),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                other => Err(ResizerError::ValidationFailed(format!(
                    "Invalid width value: {}",
                    other
                ))),
            })
            .collect();
    }

    Ok(text
        .split(',')
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect())
}

async fn read_limited(field: &mut Field, limit: usize, label: &str) -> ResizerResult<Vec<u8>> {
    let mut data = Vec::new();

    while let Some(chunk) = field.try_next().await? {
        if data.len() + chunk.len() > limit {
            return Err(ResizerError::PayloadTooLarge(format!(
                "{} exceeds the {} byte limit",
                label, limit
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(data)
}
