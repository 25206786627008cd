use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::services::ResizeService;

#[get("/health")]
pub async fn health_check(service: web::Data<ResizeService>) -> HttpResponse {
    let config = service.config();

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "resize-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "limits": {
            "max_file_size": config.max_file_size,
            "max_files": config.max_files,
            "max_widths": config.max_widths,
            "max_width": config.max_width,
            "max_height": config.max_height,
            "max_output_pixels": config.max_output_pixels,
            "width_concurrency": config.width_concurrency,
            "image_concurrency": config.image_concurrency
        }
    }))
}
