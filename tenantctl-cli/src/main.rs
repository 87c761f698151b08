//! tenantctl
//!
//! Command-line interface for provisioning and managing cluster tenants

mod commands;
mod config;
mod logging;
mod output;
mod source;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format (table, json, yaml)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Give up after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tenants
    Ls {
        /// Show quota and usage for every tenant
        #[arg(short, long)]
        resources: bool,
    },
    /// Provision a new tenant
    New {
        username: String,
        #[arg(long)]
        fullname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Tenant type label (defaults from the values document)
        #[arg(long)]
        usertype: Option<String>,
    },
    /// Edit an existing tenant
    Edit {
        #[command(subcommand)]
        command: EditCommands,
    },
    /// Delete a tenant and everything in its namespace
    Rm {
        username: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum EditCommands {
    /// Edit name, e-mail and tenant type
    Meta { username: String },
    /// Edit GPU count and memory per job
    Quota { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        output,
        context,
        timeout,
        verbose,
        command,
    } = Cli::parse();

    let _guard = logging::LoggingConfig::from_verbosity(verbose).init()?;

    if let Commands::Completions { shell } = command {
        generate_completions(shell);
        return Ok(());
    }

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Could not load config, using defaults");
            config::Config::default()
        }
    };

    let format = output::OutputFormat::parse(output.as_deref().unwrap_or(&config.default_output));
    let context = context.or_else(|| config.context.clone());

    let run = async move {
        let ctx = commands::Context::connect(config, context.as_deref(), format).await?;
        match command {
            Commands::Ls { resources } => commands::list::handle_list_command(&ctx, resources).await,
            Commands::New {
                username,
                fullname,
                email,
                usertype,
            } => {
                let metadata = tenantctl_common::Metadata {
                    fullname,
                    email,
                    usertype,
                };
                commands::new::handle_new_command(&ctx, &username, metadata).await
            }
            Commands::Edit { command } => commands::edit::handle_edit_command(&ctx, command).await,
            Commands::Rm { username, yes } => {
                commands::delete::handle_delete_command(&ctx, &username, yes).await
            }
            Commands::Completions { .. } => Ok(()),
        }
    };

    match timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
            .await
            .map_err(|_| anyhow::anyhow!("Timed out after {}s", secs))?,
        None => run.await,
    }
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
