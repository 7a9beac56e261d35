//! Blob storage and media handling
//!
//! - `media`: S3-compatible blob gateway
//! - `naming`: content-addressed file names
//! - `probe`: image format sniffing

mod media;
pub mod naming;
pub mod probe;

pub use media::{MediaFile, MediaStorage};
