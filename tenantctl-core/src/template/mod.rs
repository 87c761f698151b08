//! Tenant configuration and manifest templating

pub mod config;
pub mod engine;
pub mod filters;
pub mod source;

pub use config::TenantConfig;
pub use engine::generate;
pub use source::{DocumentSource, FileSource};
