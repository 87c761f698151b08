use anyhow::{bail, Result};
use tenantctl_common::{validate, Metadata};
use tenantctl_core::TenantConfig;
use tracing::info;

use super::Context;
use crate::output;

pub async fn handle_new_command(ctx: &Context, username: &str, metadata: Metadata) -> Result<()> {
    validate::username(username)?;

    if ctx.manager.exists(username).await? {
        bail!("User '{}' already exists", username);
    }

    let source = ctx.source()?;

    let mut config = TenantConfig::new(username);
    config.metadata = metadata;
    config
        .populate(&ctx.config.values_path(), source.as_ref())
        .await?;
    info!(username = %username, "Populated tenant defaults");

    let report = ctx
        .manager
        .provision(&config, &ctx.config.template_path(), source.as_ref())
        .await?;

    output::print_success(&format!(
        "User '{}' created ({} objects applied)",
        username,
        report.applied.len()
    ));
    if !report.skipped.is_empty() {
        output::print_warning(&format!("Skipped unsupported kinds: {}", report.skipped.join(", ")));
    }

    Ok(())
}
