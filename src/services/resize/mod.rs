//! Resize-and-archive pipeline

pub mod archive;
pub mod assembler;
pub mod fan_out;
pub mod naming;
pub mod resizer;
pub mod service;
pub mod types;
pub mod widths;

pub use resizer::{ImageResizer, Resizer};
pub use service::ResizeService;
