use config::ConfigError;
use image::imageops::FilterType;

use super::env_or;
use crate::services::resize::archive::ArchiveCompression;

/// Limits and tuning for the resize pipeline, passed into each request's services
#[derive(Debug, Clone)]
pub struct ResizeConfig {
    pub max_file_size: usize,
    pub max_files: usize,
    pub max_widths: usize,
    pub max_width: u32,
    /// Tallest output a resize may produce
    pub max_height: u32,
    /// Pixel budget for one resize, counting the intermediate resampling pass
    pub max_output_pixels: u64,
    pub width_concurrency: usize,
    pub image_concurrency: usize,
    pub compression: ArchiveCompression,
    pub filter: FilterType,
    pub archive_name: String,
}

impl ResizeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let compression = match std::env::var("APP_RESIZE__COMPRESSION") {
            Ok(value) => value.parse::<ArchiveCompression>().map_err(|e| {
                ConfigError::Message(format!("Invalid APP_RESIZE__COMPRESSION: {}", e))
            })?,
            Err(_) => defaults.compression,
        };

        let filter = match std::env::var("APP_RESIZE__FILTER") {
            Ok(value) => parse_filter(&value).ok_or_else(|| {
                ConfigError::Message(format!("Invalid APP_RESIZE__FILTER: {}", value))
            })?,
            Err(_) => defaults.filter,
        };

        let config = Self {
            max_file_size: env_or("APP_RESIZE__MAX_FILE_SIZE", defaults.max_file_size)?,
            max_files: env_or("APP_RESIZE__MAX_FILES", defaults.max_files)?,
            max_widths: env_or("APP_RESIZE__MAX_WIDTHS", defaults.max_widths)?,
            max_width: env_or("APP_RESIZE__MAX_WIDTH", defaults.max_width)?,
            max_height: env_or("APP_RESIZE__MAX_HEIGHT", defaults.max_height)?,
            max_output_pixels: env_or("APP_RESIZE__MAX_OUTPUT_PIXELS", defaults.max_output_pixels)?,
            width_concurrency: env_or("APP_RESIZE__WIDTH_CONCURRENCY", defaults.width_concurrency)?,
            image_concurrency: env_or("APP_RESIZE__IMAGE_CONCURRENCY", defaults.image_concurrency)?,
            compression,
            filter,
            archive_name: std::env::var("APP_RESIZE__ARCHIVE_NAME")
                .unwrap_or(defaults.archive_name),
        };

        if config.width_concurrency == 0 || config.image_concurrency == 0 {
            return Err(ConfigError::Message(
                "Resize concurrency limits must be at least 1".into(),
            ));
        }

        if config.max_height == 0 || config.max_output_pixels == 0 {
            return Err(ConfigError::Message(
                "Resize output limits must be at least 1".into(),
            ));
        }

        log::debug!("Resize configuration loaded: {:?}", config);
        Ok(config)
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_files: 50,
            max_widths: 20,
            max_width: 10_000,
            max_height: 10_000,
            max_output_pixels: 25_000_000,
            width_concurrency: 4,
            image_concurrency: 1,
            compression: ArchiveCompression::Deflate,
            filter: FilterType::Lanczos3,
            archive_name: "resized-images.zip".to_string(),
        }
    }
}

fn parse_filter(value: &str) -> Option<FilterType> {
    match value.trim().to_ascii_lowercase().as_str() {
        "nearest" => Some(FilterType::Nearest),
        "triangle" | "bilinear" => Some(FilterType::Triangle),
        "catmullrom" | "bicubic" => Some(FilterType::CatmullRom),
        "gaussian" => Some(FilterType::Gaussian),
        "lanczos3" | "lanczos" => Some(FilterType::Lanczos3),
        _ => None,
    }
}
