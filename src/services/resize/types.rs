//! Request-scoped types flowing through the resize pipeline

use actix_web::web::Bytes;
use serde::Serialize;
use std::fmt;

/// Extension of the canonical output encoding
pub const OUTPUT_EXTENSION: &str = "png";

/// Media type of the produced archive
pub const ARCHIVE_MEDIA_TYPE: &str = "application/zip";

/// One uploaded image as delivered by the transport layer
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub name: String,
    pub bytes: Bytes,
}

/// One image plus every width it must be resized to
#[derive(Debug, Clone)]
pub struct ResizeJob {
    pub source_name: String,
    pub source_bytes: Bytes,
    pub widths: Vec<u32>,
}

impl ResizeJob {
    pub fn output_name(&self, width: u32) -> String {
        format!("{}-{}.{}", self.source_name, width, OUTPUT_EXTENSION)
    }
}

#[derive(Debug, Clone)]
pub struct ResizeRequest {
    pub jobs: Vec<ResizeJob>,
}

impl ResizeRequest {
    pub fn pairing_count(&self) -> usize {
        self.jobs.iter().map(|job| job.widths.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct ResizedImage {
    pub output_name: String,
    pub width: u32,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFailureKind {
    DecodeFailure,
    EncodeFailure,
    OutputTooLarge,
    Aborted,
}

impl fmt::Display for ResizeFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ResizeFailureKind::DecodeFailure => "decode failure",
            ResizeFailureKind::EncodeFailure => "encode failure",
            ResizeFailureKind::OutputTooLarge => "output too large",
            ResizeFailureKind::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Diagnostic for one failed (image, width) pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeFailure {
    pub source_name: String,
    pub width: u32,
    pub kind: ResizeFailureKind,
    pub detail: String,
}

impl fmt::Display for ResizeFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at width {}: {} ({})",
            self.source_name, self.width, self.kind, self.detail
        )
    }
}

pub type ResizeResult = Result<ResizedImage, ResizeFailure>;

/// Finished archive plus the descriptor the transport needs to send it
#[derive(Debug, Clone)]
pub struct ArchiveBundle {
    pub bytes: Bytes,
    pub media_type: &'static str,
    pub filename: String,
    pub entries: Vec<String>,
    pub diagnostics: Vec<ResizeFailure>,
}
