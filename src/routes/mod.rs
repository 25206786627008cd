use actix_web::{get, web, HttpResponse, Responder};

pub mod health;
pub mod resize;

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Image resize service: POST /api/resize")
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(
        web::scope("/api")
            .service(resize::resize_images)
            .service(health::health_check),
    );
}
