//! Tenant configuration: the values a manifest template is rendered with

use serde::{Deserialize, Serialize};
use tenantctl_common::{Metadata, Spec};
use tracing::debug;

use super::source::DocumentSource;
use crate::error::{TenantError, TenantResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub username: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub resourcespec: Spec,
}

/// Layout of a defaults document. Its username, if any, is ignored.
#[derive(Debug, Default, Deserialize)]
struct Defaults {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    resourcespec: Spec,
}

impl TenantConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// Fill every unset field from the defaults document at `path`.
    pub async fn populate(&mut self, path: &str, source: &dyn DocumentSource) -> TenantResult<()> {
        let raw = source.read(path).await?;

        let defaults: Defaults = if raw.iter().all(u8::is_ascii_whitespace) {
            Defaults::default()
        } else {
            serde_yaml::from_slice(&raw)
                .map_err(|e| TenantError::DecodeError(format!("{}: {}", path, e)))?
        };

        self.metadata.fill_from(&defaults.metadata);
        self.resourcespec.fill_from(&defaults.resourcespec);

        debug!(username = %self.username, path = %path, "Populated tenant config from defaults");
        Ok(())
    }
}
