pub mod image;
pub mod metadata;
pub mod request;

pub use image::{ImageFormat, ValidatedImage};
pub use metadata::{ExtractedMetadata, MetaField, NOT_FOUND};
pub use request::{ExtractionRequest, MediaKind};
