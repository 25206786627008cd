use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, web::Data, App, HttpServer};
use dotenv::dotenv;
use resize_api::{
    middleware::LoggingMiddleware,
    routes::{self, resize::{ENTRIES_HEADER, FAILURES_HEADER}},
    services::{ImageResizer, ResizeService},
    AppConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::new()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let resizer = Arc::new(ImageResizer::from_config(&config.resize));
    let service = Data::new(ResizeService::new(config.resize.clone(), resizer));

    info!(
        "Server is running on http://{}:{} ({})",
        config.host, config.port, config.environment
    );

    let frontend_url = config.frontend_url.clone();
    let development = config.is_development();

    HttpServer::new(move || {
        let cors = if development {
            Cors::permissive()
        } else {
            Cors::default()
                .allowed_origin(&frontend_url)
                .allowed_methods(vec!["GET", "POST"])
                .allowed_headers(vec![http::header::ACCEPT])
                .allowed_header(http::header::CONTENT_TYPE)
                .expose_headers(vec![
                    http::header::CONTENT_DISPOSITION.as_str(),
                    ENTRIES_HEADER,
                    FAILURES_HEADER,
                ])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .wrap(LoggingMiddleware::new())
            .app_data(service.clone())
            .configure(routes::config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
