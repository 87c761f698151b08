//! Effective provisioning spec of a tenant
//!
//! The spec is reassembled from four cluster objects the tenant owns. They are
//! queried concurrently and joined in completion order; the first failure
//! aborts the remaining queries.

use std::sync::Arc;

use tenantctl_common::Spec;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cluster::ClusterApi;
use crate::error::{TenantError, TenantResult};
use crate::quantity::{self, bytes_to_gib, bytes_to_mib, ResourceList};
use crate::resources::aggregate::per_gpu;
use crate::resources::quota::{storage_request, QUOTA_GPU, QUOTA_MEMORY};

/// Name of the per-tenant storage proxy deployment
pub const STORAGE_PROXY: &str = "storage-proxy";

const GPU: &str = "nvidia.com/gpu";
const CPU: &str = "cpu";
const MEMORY: &str = "memory";

/// Result of one sub-query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecPart {
    Compute {
        gpu: i64,
        memory: i64,
    },
    Defaults {
        gpu: i64,
        cpu: i64,
        memory: i64,
    },
    Storage {
        bytes: i64,
    },
    StorageProxy {
        cpu_request: i64,
        cpu_limit: i64,
        memory: i64,
    },
}

impl SpecPart {
    fn merge_into(self, spec: &mut Spec) {
        match self {
            SpecPart::Compute { gpu, memory } => {
                spec.gpu = Some(gpu);
                spec.maxmemoryperjob = Some(bytes_to_gib(per_gpu(memory, gpu)));
            }
            SpecPart::Defaults { gpu, cpu, memory } => {
                spec.gpuperjob = Some(gpu);
                spec.cpuperjob = Some(cpu / 1000);
                spec.defaultmemoryperjob = Some(bytes_to_gib(memory));
            }
            SpecPart::Storage { bytes } => {
                spec.storagesize = Some(bytes_to_gib(bytes));
            }
            SpecPart::StorageProxy {
                cpu_request,
                cpu_limit,
                memory,
            } => {
                spec.storageproxycpurequest = Some(cpu_request);
                spec.storageproxycpulimit = Some(cpu_limit);
                spec.storageproxymemory = Some(bytes_to_mib(memory));
            }
        }
    }
}

/// Fetch the provisioning spec currently in effect for `namespace`.
pub async fn fetch_spec(cluster: Arc<dyn ClusterApi>, namespace: &str) -> TenantResult<Spec> {
    let mut tasks = JoinSet::new();
    tasks.spawn(compute_quota(cluster.clone(), namespace.to_string()));
    tasks.spawn(default_limits(cluster.clone(), namespace.to_string()));
    tasks.spawn(storage(cluster.clone(), namespace.to_string()));
    tasks.spawn(storage_proxy(cluster, namespace.to_string()));

    let mut spec = Spec::default();

    while let Some(joined) = tasks.join_next().await {
        let part = match joined {
            Ok(Ok(part)) => part,
            Ok(Err(e)) => {
                warn!(namespace = %namespace, error = %e, "Spec query failed, aborting remaining queries");
                tasks.abort_all();
                return Err(e);
            }
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "Spec task did not complete, aborting remaining queries");
                tasks.abort_all();
                return Err(TenantError::Internal(format!("spec query task failed: {}", e)));
            }
        };

        debug!(namespace = %namespace, part = ?part, "Spec query completed");
        part.merge_into(&mut spec);
    }

    Ok(spec)
}

async fn compute_quota(cluster: Arc<dyn ClusterApi>, namespace: String) -> TenantResult<SpecPart> {
    let quota = cluster
        .list_resource_quotas(&namespace)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TenantError::object_not_found("ResourceQuota", &namespace))?;

    let hard = quota.spec.and_then(|s| s.hard).unwrap_or_default();
    let values = quantity::normalize(&hard, &[QUOTA_GPU, QUOTA_MEMORY])?;

    Ok(SpecPart::Compute {
        gpu: values[QUOTA_GPU],
        memory: values[QUOTA_MEMORY],
    })
}

async fn default_limits(cluster: Arc<dyn ClusterApi>, namespace: String) -> TenantResult<SpecPart> {
    let item = cluster
        .list_limit_ranges(&namespace)
        .await?
        .into_iter()
        .next()
        .and_then(|lr| lr.spec)
        .and_then(|spec| spec.limits.into_iter().next())
        .ok_or_else(|| TenantError::object_not_found("LimitRange", &namespace))?;

    let defaults = item.default_request.unwrap_or_default();
    let values = quantity::normalize(&defaults, &[GPU, CPU, MEMORY])?;

    Ok(SpecPart::Defaults {
        gpu: values[GPU],
        cpu: values[CPU],
        memory: values[MEMORY],
    })
}

async fn storage(cluster: Arc<dyn ClusterApi>, namespace: String) -> TenantResult<SpecPart> {
    let bytes = storage_request(cluster.as_ref(), &namespace).await?;
    Ok(SpecPart::Storage { bytes })
}

async fn storage_proxy(cluster: Arc<dyn ClusterApi>, namespace: String) -> TenantResult<SpecPart> {
    let deployment = cluster.get_deployment(&namespace, STORAGE_PROXY).await?;

    let resources = deployment
        .spec
        .and_then(|s| s.template.spec)
        .and_then(|pod| pod.containers.into_iter().next())
        .and_then(|c| c.resources)
        .ok_or_else(|| TenantError::object_not_found("storage-proxy container", &namespace))?;

    let requests: ResourceList = resources.requests.unwrap_or_default();
    let limits: ResourceList = resources.limits.unwrap_or_default();

    let cpu_request = quantity::normalize_one(&requests, CPU)?;
    let limits = quantity::normalize(&limits, &[CPU, MEMORY])?;

    Ok(SpecPart::StorageProxy {
        cpu_request,
        cpu_limit: limits[CPU],
        memory: limits[MEMORY],
    })
}
