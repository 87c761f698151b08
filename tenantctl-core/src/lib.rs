//! Tenant provisioning for a shared Kubernetes cluster
//!
//! Provides:
//! - Quantity normalization for cluster resource lists
//! - Per-tenant quota lookup and cluster-wide usage aggregation
//! - Concurrent retrieval of a tenant's effective provisioning spec
//! - Manifest templating from default values and tenant overrides
//! - Multi-document manifest decoding and server-side apply

pub mod client;
pub mod cluster;
pub mod error;
pub mod manager;
pub mod manifest;
pub mod quantity;
pub mod resources;
pub mod template;
pub mod tenants;

#[cfg(test)]
pub(crate) mod fake;

pub use client::K8sClient;
pub use cluster::ClusterApi;
pub use error::{TenantError, TenantResult};
pub use manager::{TenantManager, TenantUsage};
pub use manifest::{ApplyOptions, ApplyReport, ConflictPolicy, ManifestBatch, ManifestDocument};
pub use template::{DocumentSource, FileSource, TenantConfig};
pub use tenants::Tenant;

/// Field manager recorded on every server-side apply
pub const FIELD_MANAGER: &str = "tenantctl";
