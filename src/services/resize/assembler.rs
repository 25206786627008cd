//! Builds the response archive from a request's fan-out results

use actix_web::web::Bytes;
use futures_util::{stream, StreamExt};
use tracing::{info, warn};

use super::archive::{ArchiveCompression, ArchiveWriter};
use super::fan_out::FanOut;
use super::types::{ArchiveBundle, ResizeRequest, ResizedImage, ARCHIVE_MEDIA_TYPE};
use crate::config::ResizeConfig;
use crate::error::{ResizerError, ResizerResult};

/// Sole writer of one request's archive.
///
/// Jobs are fanned out at most `image_concurrency` at a time and their
/// results are consumed in job order, so entry order only depends on the
/// request. Resized buffers are written and dropped once their image is done.
pub struct ArchiveAssembler {
    fan_out: FanOut,
    compression: ArchiveCompression,
    image_concurrency: usize,
    archive_name: String,
}

impl ArchiveAssembler {
    pub fn new(fan_out: FanOut, config: &ResizeConfig) -> Self {
        Self {
            fan_out,
            compression: config.compression,
            image_concurrency: config.image_concurrency.max(1),
            archive_name: config.archive_name.clone(),
        }
    }

    pub async fn assemble(&self, request: ResizeRequest) -> ResizerResult<ArchiveBundle> {
        let pairings = request.pairing_count();
        if pairings == 0 {
            return Err(ResizerError::ValidationFailed(
                "Nothing to resize: no images or widths".to_string(),
            ));
        }

        info!(
            "Assembling archive for {} images ({} resizes)",
            request.jobs.len(),
            pairings
        );

        let mut writer = ArchiveWriter::new(self.compression);
        let mut diagnostics = Vec::new();

        let mut per_image = stream::iter(request.jobs.iter())
            .map(|job| self.fan_out.resize_all(job))
            .buffered(self.image_concurrency);

        while let Some(results) = per_image.next().await {
            let mut resized = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(image) => resized.push(image),
                    Err(failure) => diagnostics.push(failure),
                }
            }

            if !resized.is_empty() {
                writer = write_entries(writer, resized).await?;
            }
        }

        if writer.entry_count() == 0 {
            warn!("All {} resizes failed, no archive produced", pairings);
            return Err(ResizerError::RequestFailed { diagnostics });
        }

        let (bytes, entries) = tokio::task::spawn_blocking(move || writer.finish()).await??;

        if diagnostics.is_empty() {
            info!("Archive ready: {} entries, {} bytes", entries.len(), bytes.len());
        } else {
            warn!(
                "Archive ready with partial failures: {} entries, {} failed resizes, {} bytes",
                entries.len(),
                diagnostics.len(),
                bytes.len()
            );
        }

        Ok(ArchiveBundle {
            bytes: Bytes::from(bytes),
            media_type: ARCHIVE_MEDIA_TYPE,
            filename: self.archive_name.clone(),
            entries,
            diagnostics,
        })
    }
}

/// Compress one image's outputs into the archive off the async runtime
async fn write_entries(
    mut writer: ArchiveWriter,
    images: Vec<ResizedImage>,
) -> ResizerResult<ArchiveWriter> {
    let (writer, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = images
            .iter()
            .try_for_each(|image| writer.add_entry(&image.output_name, &image.bytes));
        (writer, outcome)
    })
    .await?;

    outcome?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resize::resizer::{ResizeError, Resizer};
    use crate::services::resize::types::{ResizeFailureKind, ResizeJob};
    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use zip::ZipArchive;

    /// Rejects sources starting with "corrupt", otherwise tags the bytes with the width
    struct FakeResizer;

    impl Resizer for FakeResizer {
        fn resize(&self, source: &[u8], width: u32) -> Result<Vec<u8>, ResizeError> {
            if source.starts_with(b"corrupt") {
                return Err(ResizeError::Decode("bad header".to_string()));
            }
            let mut out = source.to_vec();
            out.extend_from_slice(format!("@{}", width).as_bytes());
            Ok(out)
        }
    }

    fn assembler(image_concurrency: usize) -> ArchiveAssembler {
        let config = ResizeConfig {
            image_concurrency,
            ..ResizeConfig::default()
        };
        ArchiveAssembler::new(FanOut::new(Arc::new(FakeResizer), 2), &config)
    }

    fn job(name: &str, bytes: &'static [u8], widths: &[u32]) -> ResizeJob {
        ResizeJob {
            source_name: name.to_string(),
            source_bytes: Bytes::from_static(bytes),
            widths: widths.to_vec(),
        }
    }

    fn entry_names(bytes: &Bytes) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[actix_web::test]
    async fn test_entries_follow_job_then_width_order() {
        let request = ResizeRequest {
            jobs: vec![
                job("cat", b"cat", &[200, 100]),
                job("dog", b"dog", &[50]),
                job("owl", b"owl", &[10, 20]),
            ],
        };

        let bundle = assembler(3).assemble(request).await.unwrap();

        let expected = vec![
            "cat-200.png",
            "cat-100.png",
            "dog-50.png",
            "owl-10.png",
            "owl-20.png",
        ];
        assert_eq!(bundle.entries, expected);
        assert_eq!(bundle.media_type, "application/zip");
        assert_eq!(bundle.filename, "resized-images.zip");
        assert!(bundle.diagnostics.is_empty());

        let mut archive = ZipArchive::new(Cursor::new(bundle.bytes.to_vec())).unwrap();
        assert_eq!(archive.len(), 5);
        let mut content = String::new();
        archive
            .by_name("dog-50.png")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "dog@50");
    }

    #[actix_web::test]
    async fn test_partial_failure_keeps_valid_image() {
        let request = ResizeRequest {
            jobs: vec![
                job("good", b"good", &[100, 200]),
                job("broken", b"corrupt!", &[100, 200]),
            ],
        };

        let bundle = assembler(1).assemble(request).await.unwrap();

        assert_eq!(bundle.entries, vec!["good-100.png", "good-200.png"]);
        assert_eq!(entry_names(&bundle.bytes), bundle.entries);
        assert_eq!(bundle.diagnostics.len(), 2);
        assert!(bundle
            .diagnostics
            .iter()
            .all(|d| d.source_name == "broken" && d.kind == ResizeFailureKind::DecodeFailure));
        let widths: Vec<u32> = bundle.diagnostics.iter().map(|d| d.width).collect();
        assert_eq!(widths, vec![100, 200]);
    }

    #[actix_web::test]
    async fn test_total_failure_produces_no_archive() {
        let request = ResizeRequest {
            jobs: vec![job("broken", b"corrupt", &[100, 200])],
        };

        match assembler(1).assemble(request).await {
            Err(ResizerError::RequestFailed { diagnostics }) => {
                assert_eq!(diagnostics.len(), 2);
                assert_eq!(diagnostics[0].width, 100);
                assert_eq!(diagnostics[1].width, 200);
            }
            other => panic!("expected request failure, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn test_repeated_requests_are_byte_identical() {
        let request = ResizeRequest {
            jobs: vec![job("cat", b"cat", &[100, 200]), job("dog", b"dog", &[100])],
        };

        let first = assembler(2).assemble(request.clone()).await.unwrap();
        let second = assembler(2).assemble(request).await.unwrap();

        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.entries, second.entries);
    }

    #[actix_web::test]
    async fn test_empty_request_is_rejected() {
        let result = assembler(1).assemble(ResizeRequest { jobs: vec![] }).await;
        assert!(matches!(result, Err(ResizerError::ValidationFailed(_))));
    }
}
