//! Request validation and per-request pipeline wiring

use std::sync::Arc;
use tracing::info;

use super::assembler::ArchiveAssembler;
use super::fan_out::FanOut;
use super::naming::{source_stem, NameAllocator};
use super::resizer::Resizer;
use super::types::{ArchiveBundle, ResizeJob, ResizeRequest, UploadedImage};
use super::widths::effective_widths;
use crate::config::ResizeConfig;
use crate::error::{ResizerError, ResizerResult};

/// Entry point of the resize pipeline.
///
/// Validates the upload, builds the request and runs a fresh fan-out and
/// assembler for it; nothing is shared between requests except the
/// stateless resizer.
#[derive(Clone)]
pub struct ResizeService {
    config: ResizeConfig,
    resizer: Arc<dyn Resizer>,
}

impl ResizeService {
    pub fn new(config: ResizeConfig, resizer: Arc<dyn Resizer>) -> Self {
        Self { config, resizer }
    }

    pub fn config(&self) -> &ResizeConfig {
        &self.config
    }

    pub async fn handle_resize_request(
        &self,
        images: Vec<UploadedImage>,
        widths: Vec<String>,
    ) -> ResizerResult<ArchiveBundle> {
        let request = self.build_request(images, &widths)?;

        let fan_out = FanOut::new(Arc::clone(&self.resizer), self.config.width_concurrency);
        let assembler = ArchiveAssembler::new(fan_out, &self.config);

        assembler.assemble(request).await
    }

    /// Validate the upload and turn it into one job per image
    pub fn build_request(
        &self,
        images: Vec<UploadedImage>,
        widths: &[String],
    ) -> ResizerResult<ResizeRequest> {
        if images.is_empty() {
            return Err(ResizerError::ValidationFailed(
                "Please select at least one image.".to_string(),
            ));
        }
        if images.len() > self.config.max_files {
            return Err(ResizerError::ValidationFailed(format!(
                "Too many images: {} uploaded, at most {} allowed.",
                images.len(),
                self.config.max_files
            )));
        }
        if widths.iter().all(|w| w.trim().is_empty()) {
            return Err(ResizerError::ValidationFailed(
                "Please enter at least one width.".to_string(),
            ));
        }

        let widths = effective_widths(widths, self.config.max_width);
        if widths.is_empty() {
            return Err(ResizerError::ValidationFailed(format!(
                "No valid widths: expected positive whole numbers up to {}.",
                self.config.max_width
            )));
        }
        if widths.len() > self.config.max_widths {
            return Err(ResizerError::ValidationFailed(format!(
                "Too many widths: {} given, at most {} allowed.",
                widths.len(),
                self.config.max_widths
            )));
        }

        let mut names = NameAllocator::new();
        let jobs: Vec<ResizeJob> = images
            .into_iter()
            .map(|image| ResizeJob {
                source_name: names.allocate(&source_stem(&image.name)),
                source_bytes: image.bytes,
                widths: widths.clone(),
            })
            .collect();

        info!(
            "Resize request: {} images x widths {:?}",
            jobs.len(),
            widths
        );

        Ok(ResizeRequest { jobs })
    }
}
