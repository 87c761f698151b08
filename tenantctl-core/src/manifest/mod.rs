//! Manifest decoding and server-side apply

pub mod apply;
pub mod document;

pub use apply::{apply_batch, AppliedObject, ApplyOptions, ApplyReport, ConflictPolicy};
pub use document::{decode, ManifestBatch, ManifestDocument};
