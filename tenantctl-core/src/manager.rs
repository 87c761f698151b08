//! Tenant manager
//!
//! Entry point for tenant operations. Holds the cluster handle and the apply
//! options every write uses.

use std::sync::Arc;

use tenantctl_common::{validate, Metadata, Quota, ResourceSummary, Spec};
use tracing::info;

use crate::cluster::ClusterApi;
use crate::error::{TenantError, TenantResult};
use crate::manifest::{self, ApplyOptions, ApplyReport, ManifestBatch};
use crate::resources;
use crate::template::{self, DocumentSource, TenantConfig};
use crate::tenants::{self, Tenant};

/// A tenant together with its quota snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantUsage {
    pub tenant: Tenant,
    pub quota: Quota,
}

#[derive(Clone)]
pub struct TenantManager {
    cluster: Arc<dyn ClusterApi>,
    options: ApplyOptions,
    email_domain: Option<String>,
}

impl TenantManager {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self {
            cluster,
            options: ApplyOptions::default(),
            email_domain: None,
        }
    }

    pub fn with_apply_options(mut self, options: ApplyOptions) -> Self {
        self.options = options;
        self
    }

    /// Tenants without an email annotation report `<username>@<domain>`.
    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Self {
        self.email_domain = Some(domain.into());
        self
    }

    fn fill_email(&self, tenant: Tenant) -> Tenant {
        match &self.email_domain {
            Some(domain) => tenant.with_default_email(domain),
            None => tenant,
        }
    }

    pub async fn list(&self) -> TenantResult<Vec<Tenant>> {
        let tenants = tenants::list_tenants(self.cluster.as_ref()).await?;
        Ok(tenants.into_iter().map(|t| self.fill_email(t)).collect())
    }

    pub async fn get(&self, username: &str) -> TenantResult<Tenant> {
        let tenant = tenants::get_tenant(self.cluster.as_ref(), username).await?;
        Ok(self.fill_email(tenant))
    }

    pub async fn exists(&self, username: &str) -> TenantResult<bool> {
        tenants::exists(self.cluster.as_ref(), username).await
    }

    pub async fn quota(&self, username: &str) -> TenantResult<Quota> {
        validate::username(username)?;
        resources::quota(self.cluster.as_ref(), username).await
    }

    /// Every tenant with its quota, sorted by username.
    pub async fn list_usage(&self) -> TenantResult<Vec<TenantUsage>> {
        let mut usage = Vec::new();
        for tenant in self.list().await? {
            let quota = resources::quota(self.cluster.as_ref(), &tenant.username).await?;
            usage.push(TenantUsage { tenant, quota });
        }
        Ok(usage)
    }

    /// Total cluster GPUs against the GPUs in use by `tenants`.
    pub async fn cluster_gpus(&self, tenants: &[Quota]) -> TenantResult<ResourceSummary> {
        let nodes = self.cluster.list_nodes().await?;
        resources::cluster_gpu_summary(&nodes, tenants)
    }

    /// The provisioning spec currently in effect for `username`.
    pub async fn spec(&self, username: &str) -> TenantResult<Spec> {
        validate::username(username)?;
        resources::fetch_spec(self.cluster.clone(), username).await
    }

    /// Decode `manifest` and apply it into the tenant namespace.
    pub async fn apply_manifest(&self, username: &str, manifest: &str) -> TenantResult<ApplyReport> {
        validate::username(username)?;
        let batch = manifest::decode(manifest)?;
        self.apply_batch(username, &batch).await
    }

    pub async fn apply_batch(&self, username: &str, batch: &ManifestBatch) -> TenantResult<ApplyReport> {
        manifest::apply_batch(self.cluster.as_ref(), username, batch, &self.options).await
    }

    /// Render the template at `template_path` for `config` and apply it.
    pub async fn provision(
        &self,
        config: &TenantConfig,
        template_path: &str,
        source: &dyn DocumentSource,
    ) -> TenantResult<ApplyReport> {
        validate::username(&config.username)?;

        let rendered = template::generate(template_path, source, config).await?;
        let text = String::from_utf8(rendered)
            .map_err(|e| TenantError::DecodeError(format!("rendered manifest: {}", e)))?;

        let report = self.apply_manifest(&config.username, &text).await?;
        info!(username = %config.username, applied = report.applied.len(), "Provisioned tenant");
        Ok(report)
    }

    /// Replace the descriptive metadata on an existing tenant.
    ///
    /// Fields left unset in `metadata` keep their current values. The
    /// namespace is applied as `<field manager>-metadata`, so fields owned by
    /// the provisioning apply are never pruned.
    pub async fn update_metadata(&self, username: &str, metadata: &Metadata) -> TenantResult<ApplyReport> {
        let current = self.get(username).await?;

        let mut metadata = metadata.clone();
        metadata.fill_from(&current.metadata());

        let batch = ManifestBatch {
            documents: vec![tenants::metadata_document(username, &metadata)],
            skipped: Vec::new(),
        };
        let options = self
            .options
            .clone()
            .with_field_manager(format!("{}-metadata", self.options.field_manager));

        manifest::apply_batch(self.cluster.as_ref(), username, &batch, &options).await
    }

    /// Delete the tenant namespace and everything in it.
    pub async fn delete(&self, username: &str) -> TenantResult<()> {
        self.get(username).await?;
        self.cluster.delete_namespace(username).await?;
        info!(username = %username, "Deleted tenant");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{namespace, FakeCluster};
    use crate::manifest::ConflictPolicy;

    fn manager(cluster: FakeCluster) -> (Arc<FakeCluster>, TenantManager) {
        let cluster = Arc::new(cluster);
        let manager = TenantManager::new(cluster.clone());
        (cluster, manager)
    }

    #[tokio::test]
    async fn test_list_usage() {
        let (_, manager) = manager(FakeCluster::with_tenant("foo123"));

        let usage = manager.list_usage().await.unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].tenant.username, "foo123");
        assert_eq!(usage[0].quota.gpu, ResourceSummary::new(2, 1));

        let quotas: Vec<Quota> = usage.iter().map(|u| u.quota).collect();
        let gpus = manager.cluster_gpus(&quotas).await.unwrap();
        assert_eq!(gpus, ResourceSummary::new(8, 1));
    }

    #[tokio::test]
    async fn test_update_metadata_applies_namespace() {
        let (cluster, manager) = manager(FakeCluster::with_tenant("foo123"));

        let report = manager
            .update_metadata(
                "foo123",
                &Metadata {
                    fullname: Some("Grace Hopper".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(report.applied.len(), 1);
        let applied = cluster.applied();
        assert_eq!(applied[0].1.kind(), "Namespace");
        assert_eq!(applied[0].1.name(), Some("foo123"));

        let meta = applied[0].1.metadata();
        let annotations = meta.annotations.as_ref().unwrap();
        assert_eq!(
            annotations.get(tenants::FULLNAME_ANNOTATION).map(String::as_str),
            Some("Grace Hopper")
        );
        assert_eq!(
            annotations.get(tenants::EMAIL_ANNOTATION).map(String::as_str),
            Some("ada@example.com")
        );
        assert_eq!(
            meta.labels.as_ref().unwrap().get(tenants::USERTYPE_LABEL).map(String::as_str),
            Some("student")
        );

        let options = cluster.applied_options();
        assert_eq!(options[0].field_manager, "tenantctl-metadata");
        assert_eq!(options[0].conflict, ConflictPolicy::Force);
    }

    #[tokio::test]
    async fn test_update_metadata_keeps_conflict_policy() {
        let cluster = Arc::new(FakeCluster::with_tenant("foo123"));
        let manager = TenantManager::new(cluster.clone()).with_apply_options(
            ApplyOptions::default()
                .with_field_manager("ops")
                .with_conflict(ConflictPolicy::Reject),
        );

        manager
            .update_metadata("foo123", &Metadata::default())
            .await
            .unwrap();

        let options = cluster.applied_options();
        assert_eq!(options[0].field_manager, "ops-metadata");
        assert_eq!(options[0].conflict, ConflictPolicy::Reject);
    }

    #[tokio::test]
    async fn test_provision_options_used_for_manifests() {
        let cluster = Arc::new(FakeCluster::default());
        let manager = TenantManager::new(cluster.clone())
            .with_apply_options(ApplyOptions::default().with_field_manager("ops"));

        manager
            .apply_manifest("foo123", "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: foo123\n")
            .await
            .unwrap();

        assert_eq!(cluster.applied_options()[0].field_manager, "ops");
    }

    #[tokio::test]
    async fn test_email_domain_default() {
        let mut fake = FakeCluster::default();
        fake.namespaces.push(namespace("foo123", None, None, None));
        let cluster = Arc::new(fake);
        let manager = TenantManager::new(cluster).with_email_domain("example.org");

        assert_eq!(manager.get("foo123").await.unwrap().email, "foo123@example.org");
        assert_eq!(manager.list().await.unwrap()[0].email, "foo123@example.org");
    }

    #[tokio::test]
    async fn test_delete_unknown_tenant() {
        let (cluster, manager) = manager(FakeCluster::default());

        let err = manager.delete("foo123").await.unwrap_err();
        assert!(matches!(err, TenantError::UserNotFound(_)));
        assert!(cluster.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let mut fake = FakeCluster::default();
        fake.namespaces.push(namespace("foo123", None, None, None));
        let (cluster, manager) = manager(fake);

        manager.delete("foo123").await.unwrap();
        assert_eq!(cluster.deleted(), vec!["foo123".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_username_rejected() {
        let (_, manager) = manager(FakeCluster::default());

        let err = manager.spec("kube-system").await.unwrap_err();
        assert!(matches!(err, TenantError::InvalidUsername(_)));
    }
}
