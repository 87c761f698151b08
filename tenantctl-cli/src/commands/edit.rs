use anyhow::Result;
use dialoguer::Editor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tenantctl_common::{Metadata, Spec};
use tenantctl_core::TenantConfig;

use super::Context;
use crate::output;
use crate::EditCommands;

pub async fn handle_edit_command(ctx: &Context, command: EditCommands) -> Result<()> {
    match command {
        EditCommands::Meta { username } => {
            let tenant = ctx.manager.get(&username).await?;

            let Some(metadata) = edit_yaml::<Metadata>(&tenant.metadata())? else {
                output::print_info("No changes");
                return Ok(());
            };

            ctx.manager.update_metadata(&username, &metadata).await?;
            output::print_success(&format!("Metadata updated for user '{}'", username));
        }
        EditCommands::Quota { username } => {
            let tenant = ctx.manager.get(&username).await?;
            let mut spec = ctx.manager.spec(&username).await?;

            let Some(edited) = edit_yaml::<Spec>(&spec.editable())? else {
                output::print_info("No changes");
                return Ok(());
            };
            spec.apply_edits(&edited.editable());

            let source = ctx.source()?;
            let mut config = TenantConfig {
                username: username.clone(),
                metadata: tenant.metadata(),
                resourcespec: spec,
            };
            config
                .populate(&ctx.config.values_path(), source.as_ref())
                .await?;

            ctx.manager
                .provision(&config, &ctx.config.template_path(), source.as_ref())
                .await?;
            output::print_success(&format!("Quota updated for user '{}'", username));
        }
    }
    Ok(())
}

/// Open `value` as YAML in the user's editor. `None` if the editor was closed
/// without saving.
fn edit_yaml<T: Serialize + DeserializeOwned>(value: &T) -> Result<Option<T>> {
    let yaml = serde_yaml::to_string(value)?;

    match Editor::new().extension(".yaml").edit(&yaml)? {
        Some(edited) => Ok(Some(serde_yaml::from_str(&edited)?)),
        None => Ok(None),
    }
}
