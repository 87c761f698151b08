//! Command handlers

pub mod delete;
pub mod edit;
pub mod list;
pub mod new;

use std::sync::Arc;

use anyhow::{bail, Result};
use tenantctl_core::{DocumentSource, FileSource, K8sClient, TenantManager};

use crate::config::Config;
use crate::output::OutputFormat;
use crate::source::GithubSource;

/// Everything a command handler needs
pub struct Context {
    pub manager: TenantManager,
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    pub async fn connect(config: Config, context: Option<&str>, format: OutputFormat) -> Result<Self> {
        let client = K8sClient::connect(context).await?;
        let mut manager =
            TenantManager::new(Arc::new(client)).with_apply_options(config.apply_options());
        if let Some(domain) = &config.email_domain {
            manager = manager.with_email_domain(domain.clone());
        }

        Ok(Self {
            manager,
            config,
            format,
        })
    }

    /// Document source for templates and defaults
    pub fn source(&self) -> Result<Box<dyn DocumentSource>> {
        document_source(&self.config)
    }
}

pub fn document_source(config: &Config) -> Result<Box<dyn DocumentSource>> {
    if let Some(dir) = &config.local_dir {
        return Ok(Box::new(FileSource::new(dir.clone())));
    }

    let Some(repo) = &config.github_repo else {
        bail!("No document source configured: set github_repo or local_dir in the config file");
    };

    Ok(Box::new(GithubSource::new(
        config.github_user.clone().unwrap_or_default(),
        config.github_token.clone().unwrap_or_default(),
        repo.clone(),
    )))
}
