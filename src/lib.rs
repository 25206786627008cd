pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;

pub use crate::config::AppConfig;
pub use error::{ResizerError, ResizerResult};
