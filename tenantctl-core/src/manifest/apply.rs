//! Server-side apply of decoded manifests

use serde::Serialize;
use tracing::{debug, info};

use super::document::{ManifestBatch, ManifestDocument};
use crate::cluster::ClusterApi;
use crate::error::TenantResult;
use crate::FIELD_MANAGER;

/// How field ownership conflicts are resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Take ownership of conflicting fields
    #[default]
    Force,
    /// Fail with `ApplyConflict`
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    pub field_manager: String,
    pub conflict: ConflictPolicy,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            field_manager: FIELD_MANAGER.to_string(),
            conflict: ConflictPolicy::Force,
        }
    }
}

impl ApplyOptions {
    pub fn with_field_manager(mut self, field_manager: impl Into<String>) -> Self {
        self.field_manager = field_manager.into();
        self
    }

    pub fn with_conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedObject {
    pub kind: String,
    pub name: String,
}

/// Outcome of a successful batch apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub applied: Vec<AppliedObject>,
    pub skipped: Vec<String>,
}

/// Apply every document of `batch` in order.
///
/// Stops at the first failure. Documents applied before it stay applied.
pub async fn apply_batch(
    cluster: &dyn ClusterApi,
    namespace: &str,
    batch: &ManifestBatch,
    options: &ApplyOptions,
) -> TenantResult<ApplyReport> {
    let mut report = ApplyReport {
        skipped: batch.skipped.clone(),
        ..Default::default()
    };

    for document in &batch.documents {
        let mut document: ManifestDocument = document.clone();
        document.set_namespace(namespace);

        let applied = AppliedObject {
            kind: document.kind().to_string(),
            name: document.name().unwrap_or_default().to_string(),
        };

        cluster.apply(namespace, &document, options).await?;

        debug!(kind = %applied.kind, name = %applied.name, namespace = %namespace, "Applied");
        report.applied.push(applied);
    }

    info!(
        namespace = %namespace,
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        field_manager = %options.field_manager,
        "Applied manifest"
    );

    Ok(report)
}
