pub mod resize;
pub mod upload;

pub use resize::{ImageResizer, ResizeService, Resizer};
pub use upload::UploadExtractor;
