//! Cluster-wide aggregation of tenant quotas

use k8s_openapi::api::core::v1::Node;
use tenantctl_common::{Quota, ResourceSummary, UsageSummary};

use crate::error::TenantResult;
use crate::quantity;

/// Extended resource advertised by GPU nodes
pub const GPU_RESOURCE: &str = "nvidia.com/gpu";

/// Memory allotted per GPU in bytes, 0 when the tenant has no GPUs.
pub fn memory_per_gpu(quota: &Quota) -> i64 {
    per_gpu(quota.memory.max, quota.gpu.max)
}

/// `memory / gpus`, 0 when `gpus` is 0
pub fn per_gpu(memory: i64, gpus: i64) -> i64 {
    if gpus == 0 {
        0
    } else {
        memory / gpus
    }
}

/// Sum usage across tenants.
pub fn aggregate_usage(tenants: &[Quota]) -> UsageSummary {
    tenants
        .iter()
        .fold(UsageSummary::default(), |mut total, quota| {
            total.gpu += quota.gpu.used;
            total.cpu += quota.cpu.used;
            total.memory += quota.memory.used;
            total.storage += quota.storage;
            total
        })
}

/// GPU capacity of all schedulable nodes.
pub fn total_gpus(nodes: &[Node]) -> TenantResult<i64> {
    let mut total = 0;

    for node in nodes {
        let unschedulable = node
            .spec
            .as_ref()
            .and_then(|s| s.unschedulable)
            .unwrap_or(false);
        if unschedulable {
            continue;
        }

        let Some(capacity) = node.status.as_ref().and_then(|s| s.capacity.as_ref()) else {
            continue;
        };
        if capacity.contains_key(GPU_RESOURCE) {
            total += quantity::normalize_one(capacity, GPU_RESOURCE)?;
        }
    }

    Ok(total)
}

/// Cluster GPU capacity against the GPUs tenants currently use.
pub fn cluster_gpu_summary(nodes: &[Node], tenants: &[Quota]) -> TenantResult<ResourceSummary> {
    Ok(ResourceSummary::new(
        total_gpus(nodes)?,
        aggregate_usage(tenants).gpu,
    ))
}
