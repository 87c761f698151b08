//! Per-tenant quota snapshot

use tenantctl_common::{Quota, ResourceSummary};
use tracing::debug;

use crate::cluster::ClusterApi;
use crate::error::{TenantError, TenantResult};
use crate::quantity::{self, ResourceList};

pub const QUOTA_GPU: &str = "requests.nvidia.com/gpu";
pub const QUOTA_CPU: &str = "requests.cpu";
pub const QUOTA_MEMORY: &str = "requests.memory";
pub const STORAGE: &str = "storage";

/// Hard limits and usage from the tenant's ResourceQuota, plus the storage
/// requested by its volume claim.
///
/// A namespace without any ResourceQuota is not a provisioned tenant and
/// yields `UserNotFound`.
pub async fn quota(cluster: &dyn ClusterApi, namespace: &str) -> TenantResult<Quota> {
    let quota = cluster
        .list_resource_quotas(namespace)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TenantError::UserNotFound(namespace.to_string()))?;

    let hard = quota.spec.and_then(|s| s.hard).unwrap_or_default();
    let used = quota.status.and_then(|s| s.used).unwrap_or_default();

    let names = [QUOTA_GPU, QUOTA_CPU, QUOTA_MEMORY];
    let max = quantity::normalize(&hard, &names)?;
    let used = quantity::normalize(&used, &names)?;

    let storage = storage_request(cluster, namespace).await?;

    debug!(namespace = %namespace, "Read quota");

    Ok(Quota {
        gpu: ResourceSummary::new(max[QUOTA_GPU], used[QUOTA_GPU]),
        cpu: ResourceSummary::new(max[QUOTA_CPU], used[QUOTA_CPU]),
        memory: ResourceSummary::new(max[QUOTA_MEMORY], used[QUOTA_MEMORY]),
        storage,
    })
}

/// Storage requested by the first volume claim in `namespace`, in bytes.
pub async fn storage_request(cluster: &dyn ClusterApi, namespace: &str) -> TenantResult<i64> {
    let claim = cluster
        .list_persistent_volume_claims(namespace)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TenantError::object_not_found("PersistentVolumeClaim", namespace))?;

    let requests: ResourceList = claim
        .spec
        .and_then(|s| s.resources)
        .and_then(|r| r.requests)
        .unwrap_or_default();

    quantity::normalize_one(&requests, STORAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCluster;

    #[tokio::test]
    async fn test_quota_fixture() {
        let cluster = FakeCluster::with_tenant("foo123");

        let got = quota(&cluster, "foo123").await.unwrap();

        let memory = (16 * 1024 + 256) * 1024 * 1024;
        let expected = Quota {
            cpu: ResourceSummary::new(4500, 2250),
            gpu: ResourceSummary::new(2, 1),
            memory: ResourceSummary::new(memory, memory / 2),
            storage: 500 * 1024 * 1024 * 1024,
        };
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_quota_unknown_user() {
        let cluster = FakeCluster::with_tenant("foo123");

        let err = quota(&cluster, "bar456").await.unwrap_err();
        assert!(matches!(err, TenantError::UserNotFound(ref name) if name == "bar456"));
    }

    #[tokio::test]
    async fn test_quota_without_claim() {
        let mut cluster = FakeCluster::with_tenant("foo123");
        cluster.claims.clear();

        let err = quota(&cluster, "foo123").await.unwrap_err();
        assert!(matches!(err, TenantError::ObjectNotFound { ref kind, .. } if kind == "PersistentVolumeClaim"));
    }
}
