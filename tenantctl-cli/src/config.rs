//! CLI configuration management
//!
//! Read from `$HOME/.config/tenantctl/config.toml`, then overridden by
//! `TENANTCTL_*` environment variables.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tenantctl_core::{ApplyOptions, ConflictPolicy};

const ENV_PREFIX: &str = "TENANTCTL_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github_user: Option<String>,
    pub github_token: Option<String>,
    /// `owner/repo` holding templates and defaults
    pub github_repo: Option<String>,
    /// Directory of the manifest template
    pub github_config_dir: String,
    /// Directory of the defaults document
    pub github_value_dir: String,
    /// Read documents from this local directory instead of GitHub
    pub local_dir: Option<PathBuf>,
    pub context: Option<String>,
    pub field_manager: String,
    /// Fail on field ownership conflicts instead of taking the fields over
    pub reject_conflicts: bool,
    /// Domain for the email of tenants without one
    pub email_domain: Option<String>,
    pub template_file: String,
    pub values_file: String,
    pub default_output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_user: None,
            github_token: None,
            github_repo: None,
            github_config_dir: String::new(),
            github_value_dir: String::new(),
            local_dir: None,
            context: None,
            field_manager: tenantctl_core::FIELD_MANAGER.to_string(),
            reject_conflicts: false,
            email_domain: None,
            template_file: "default-user.yaml".to_string(),
            values_file: "values.yaml".to_string(),
            default_output: "table".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Override fields from environment variables looked up with `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.is_empty());

        if let Some(v) = var("GITHUB_USER") {
            self.github_user = Some(v);
        }
        if let Some(v) = var("GITHUB_TOKEN") {
            self.github_token = Some(v);
        }
        if let Some(v) = var("GITHUB_REPO") {
            self.github_repo = Some(v);
        }
        if let Some(v) = var("GITHUB_CONFIG_DIR") {
            self.github_config_dir = v;
        }
        if let Some(v) = var("GITHUB_VALUE_DIR") {
            self.github_value_dir = v;
        }
        if let Some(v) = var("LOCAL_DIR") {
            self.local_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("CONTEXT") {
            self.context = Some(v);
        }
        if let Some(v) = var("FIELD_MANAGER") {
            self.field_manager = v;
        }
        if let Some(v) = var("REJECT_CONFLICTS") {
            self.reject_conflicts = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = var("EMAIL_DOMAIN") {
            self.email_domain = Some(v);
        }
        if let Some(v) = var("TEMPLATE_FILE") {
            self.template_file = v;
        }
        if let Some(v) = var("VALUES_FILE") {
            self.values_file = v;
        }
        if let Some(v) = var("OUTPUT") {
            self.default_output = v;
        }
    }

    pub fn apply_options(&self) -> ApplyOptions {
        let conflict = if self.reject_conflicts {
            ConflictPolicy::Reject
        } else {
            ConflictPolicy::Force
        };
        ApplyOptions::default()
            .with_field_manager(self.field_manager.clone())
            .with_conflict(conflict)
    }

    pub fn template_path(&self) -> String {
        join_path(&self.github_config_dir, &self.template_file)
    }

    pub fn values_path(&self) -> String {
        join_path(&self.github_value_dir, &self.values_file)
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config/tenantctl/config.toml"))
    }
}

fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "github_repo = \"acme/tenants\"\ngithub_config_dir = \"manifests/\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.github_repo.as_deref(), Some("acme/tenants"));
        assert_eq!(config.template_path(), "manifests/default-user.yaml");
        assert_eq!(config.values_path(), "values.yaml");
        assert_eq!(config.field_manager, "tenantctl");
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("TENANTCTL_GITHUB_USER", "octocat"),
            ("TENANTCTL_CONTEXT", "prod"),
            ("TENANTCTL_VALUES_FILE", "defaults.yaml"),
            ("TENANTCTL_FIELD_MANAGER", ""),
        ]);

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.github_user.as_deref(), Some("octocat"));
        assert_eq!(config.context.as_deref(), Some("prod"));
        assert_eq!(config.values_file, "defaults.yaml");
        assert_eq!(config.field_manager, "tenantctl");
    }

    #[test]
    fn test_apply_options() {
        let options = Config::default().apply_options();
        assert_eq!(options.field_manager, "tenantctl");
        assert_eq!(options.conflict, ConflictPolicy::Force);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "field_manager = \"ops\"\nreject_conflicts = true\nemail_domain = \"example.org\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.email_domain.as_deref(), Some("example.org"));
        let options = config.apply_options();
        assert_eq!(options.field_manager, "ops");
        assert_eq!(options.conflict, ConflictPolicy::Reject);
    }

    #[test]
    fn test_env_reject_conflicts() {
        let env = HashMap::from([
            ("TENANTCTL_REJECT_CONFLICTS", "true"),
            ("TENANTCTL_EMAIL_DOMAIN", "example.org"),
        ]);

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert!(config.reject_conflicts);
        assert_eq!(config.email_domain.as_deref(), Some("example.org"));
        assert_eq!(config.apply_options().conflict, ConflictPolicy::Reject);
    }
}
