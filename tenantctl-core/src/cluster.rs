//! Cluster state API
//!
//! The narrow set of cluster operations tenant management needs. `K8sClient`
//! implements it against a live API server.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    LimitRange, Namespace, Node, PersistentVolumeClaim, ResourceQuota,
};

use crate::error::TenantResult;
use crate::manifest::{ApplyOptions, ManifestDocument};

#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_namespaces(&self) -> TenantResult<Vec<Namespace>>;

    async fn list_resource_quotas(&self, namespace: &str) -> TenantResult<Vec<ResourceQuota>>;

    async fn list_limit_ranges(&self, namespace: &str) -> TenantResult<Vec<LimitRange>>;

    async fn list_persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> TenantResult<Vec<PersistentVolumeClaim>>;

    /// Get a deployment by name. A missing deployment is `ObjectNotFound`.
    async fn get_deployment(&self, namespace: &str, name: &str) -> TenantResult<Deployment>;

    async fn list_nodes(&self) -> TenantResult<Vec<Node>>;

    /// Server-side apply one document. Namespaced documents land in
    /// `namespace`.
    async fn apply(
        &self,
        namespace: &str,
        document: &ManifestDocument,
        options: &ApplyOptions,
    ) -> TenantResult<()>;

    /// Delete a namespace immediately, cascading to everything in it.
    async fn delete_namespace(&self, name: &str) -> TenantResult<()>;
}
