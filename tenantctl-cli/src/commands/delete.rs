use anyhow::Result;
use dialoguer::Confirm;

use super::Context;
use crate::output;

pub async fn handle_delete_command(ctx: &Context, username: &str, yes: bool) -> Result<()> {
    // Fail on unknown tenants before prompting
    ctx.manager.get(username).await?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete user '{}' and everything in its namespace?",
                username
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            output::print_info("Cancelled");
            return Ok(());
        }
    }

    ctx.manager.delete(username).await?;
    output::print_success(&format!("User '{}' deleted", username));
    Ok(())
}
