use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use tenantctl_common::{Quota, ResourceSummary, UsageSummary};
use tenantctl_core::resources::{aggregate_usage, memory_per_gpu};
use tenantctl_core::Tenant;

use super::Context;
use crate::output::{self, format_bytes, format_cpu, OutputFormat};

#[derive(Tabled)]
struct TenantRow {
    #[tabled(rename = "USERNAME")]
    username: String,
    #[tabled(rename = "FULL NAME")]
    fullname: String,
    #[tabled(rename = "E-MAIL")]
    email: String,
    #[tabled(rename = "TYPE")]
    usertype: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

impl From<&Tenant> for TenantRow {
    fn from(tenant: &Tenant) -> Self {
        Self {
            username: tenant.username.clone(),
            fullname: tenant.fullname.clone(),
            email: tenant.email.clone(),
            usertype: tenant.usertype.clone(),
            status: tenant.status.clone(),
        }
    }
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "USERNAME")]
    username: String,
    #[tabled(rename = "GPU")]
    gpu: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "MEMORY/GPU")]
    memory_per_gpu: String,
    #[tabled(rename = "STORAGE")]
    storage: String,
}

#[derive(Serialize)]
struct TenantResources {
    #[serde(flatten)]
    tenant: Tenant,
    quota: Quota,
    memory_per_gpu: i64,
}

#[derive(Serialize)]
struct ResourceListing {
    tenants: Vec<TenantResources>,
    usage: UsageSummary,
    cluster_gpus: ResourceSummary,
}

pub async fn handle_list_command(ctx: &Context, resources: bool) -> Result<()> {
    if !resources {
        let tenants = ctx.manager.list().await?;
        let rows = tenants.iter().map(TenantRow::from).collect();
        return output::print_output(rows, &tenants, ctx.format);
    }

    let usage = ctx.manager.list_usage().await?;
    let quotas: Vec<Quota> = usage.iter().map(|u| u.quota).collect();
    let totals = aggregate_usage(&quotas);
    let cluster_gpus = ctx.manager.cluster_gpus(&quotas).await?;

    let listing = ResourceListing {
        tenants: usage
            .into_iter()
            .map(|u| TenantResources {
                memory_per_gpu: memory_per_gpu(&u.quota),
                tenant: u.tenant,
                quota: u.quota,
            })
            .collect(),
        usage: totals,
        cluster_gpus,
    };

    let rows = listing.tenants.iter().map(resource_row).collect();
    output::print_output(rows, &listing, ctx.format)?;

    if ctx.format == OutputFormat::Table {
        output::print_info(&format!(
            "GPUs in use: {}/{}, CPU requested: {}, memory requested: {}, storage: {}",
            cluster_gpus.used,
            cluster_gpus.max,
            format_cpu(totals.cpu),
            format_bytes(totals.memory),
            format_bytes(totals.storage),
        ));
    }

    Ok(())
}

fn resource_row(entry: &TenantResources) -> ResourceRow {
    let quota = &entry.quota;
    ResourceRow {
        username: entry.tenant.username.clone(),
        gpu: format!("{}/{}", quota.gpu.used, quota.gpu.max),
        cpu: format!("{}/{}", format_cpu(quota.cpu.used), format_cpu(quota.cpu.max)),
        memory_per_gpu: format_bytes(entry.memory_per_gpu),
        storage: format_bytes(quota.storage),
    }
}
