//! Tenant namespaces
//!
//! A tenant is a namespace named after a valid username. Descriptive metadata
//! is kept on the namespace as annotations and a label.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use tenantctl_common::validate;
use tenantctl_common::Metadata;

use crate::cluster::ClusterApi;
use crate::error::{TenantError, TenantResult};
use crate::manifest::ManifestDocument;

pub const FULLNAME_ANNOTATION: &str = "tenantctl.io/fullname";
pub const EMAIL_ANNOTATION: &str = "tenantctl.io/email";
pub const USERTYPE_LABEL: &str = "tenantctl.io/tenant-type";

pub const DEFAULT_USERTYPE: &str = "student";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub usertype: String,
    /// Namespace phase, e.g. `Active` or `Terminating`
    pub status: String,
}

impl Tenant {
    /// Read tenant details from its namespace. `None` unless the namespace is
    /// named after a valid username.
    pub fn from_namespace(namespace: &Namespace) -> Option<Self> {
        let username = namespace.metadata.name.as_deref()?;
        if !validate::is_username(username) {
            return None;
        }

        let annotation = |key: &str| {
            namespace
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(key))
                .cloned()
                .unwrap_or_default()
        };

        let usertype = namespace
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(USERTYPE_LABEL))
            .map(String::as_str)
            .unwrap_or_default();

        Some(Self {
            username: username.to_string(),
            fullname: annotation(FULLNAME_ANNOTATION),
            email: annotation(EMAIL_ANNOTATION),
            usertype: validate::default_if_empty(usertype, DEFAULT_USERTYPE).to_string(),
            status: namespace
                .status
                .as_ref()
                .and_then(|s| s.phase.clone())
                .unwrap_or_default(),
        })
    }

    /// Fill an empty email with `<username>@<domain>`.
    pub fn with_default_email(mut self, domain: &str) -> Self {
        let default = format!("{}@{}", self.username, domain);
        self.email = validate::default_if_empty(&self.email, &default).to_string();
        self
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            fullname: Some(self.fullname.clone()),
            email: Some(self.email.clone()),
            usertype: Some(self.usertype.clone()),
        }
    }
}

/// All tenants, sorted by username.
pub async fn list_tenants(cluster: &dyn ClusterApi) -> TenantResult<Vec<Tenant>> {
    let mut tenants: Vec<Tenant> = cluster
        .list_namespaces()
        .await?
        .iter()
        .filter_map(Tenant::from_namespace)
        .collect();

    tenants.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(tenants)
}

pub async fn get_tenant(cluster: &dyn ClusterApi, username: &str) -> TenantResult<Tenant> {
    validate::username(username)?;

    list_tenants(cluster)
        .await?
        .into_iter()
        .find(|t| t.username == username)
        .ok_or_else(|| TenantError::UserNotFound(username.to_string()))
}

pub async fn exists(cluster: &dyn ClusterApi, username: &str) -> TenantResult<bool> {
    match get_tenant(cluster, username).await {
        Ok(_) => Ok(true),
        Err(TenantError::UserNotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Namespace document carrying `metadata` for `username`. Only set fields
/// are written; a field manager that applied a field before and leaves it
/// out here gives it up, and the server prunes it.
pub fn metadata_document(username: &str, metadata: &Metadata) -> ManifestDocument {
    let mut annotations = BTreeMap::new();
    if let Some(fullname) = &metadata.fullname {
        annotations.insert(FULLNAME_ANNOTATION.to_string(), fullname.clone());
    }
    if let Some(email) = &metadata.email {
        annotations.insert(EMAIL_ANNOTATION.to_string(), email.clone());
    }

    let labels = metadata.usertype.as_ref().map(|usertype| {
        BTreeMap::from([(USERTYPE_LABEL.to_string(), usertype.clone())])
    });

    ManifestDocument::Namespace(Namespace {
        metadata: ObjectMeta {
            name: Some(username.to_string()),
            annotations: (!annotations.is_empty()).then_some(annotations),
            labels,
            ..Default::default()
        },
        ..Default::default()
    })
}
