use actix_multipart::Multipart;
use actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    post, web, HttpResponse,
};
use std::time::Instant;
use tracing::info;

use crate::{
    error::ResizerResult,
    services::{ResizeService, UploadExtractor},
};

pub const ENTRIES_HEADER: &str = "X-Resize-Entries";
pub const FAILURES_HEADER: &str = "X-Resize-Failures";

#[post("/resize")]
pub async fn resize_images(
    service: web::Data<ResizeService>,
    payload: Multipart,
) -> ResizerResult<HttpResponse> {
    let start = Instant::now();

    let upload = UploadExtractor::new(service.config())
        .extract(payload)
        .await?;

    let bundle = service
        .handle_resize_request(upload.images, upload.widths)
        .await?;

    info!(
        "Resize finished in {}ms: {} entries, {} failed",
        start.elapsed().as_millis(),
        bundle.entries.len(),
        bundle.diagnostics.len()
    );

    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(bundle.filename.clone())],
    };

    Ok(HttpResponse::Ok()
        .content_type(bundle.media_type)
        .insert_header(disposition)
        .insert_header((ENTRIES_HEADER, bundle.entries.len().to_string()))
        .insert_header((FAILURES_HEADER, bundle.diagnostics.len().to_string()))
        .body(bundle.bytes))
}
