//! Typed manifest documents
//!
//! A rendered manifest is a multi-document YAML stream. Each document is
//! classified by its `kind` and decoded into the matching k8s-openapi type.
//! Kinds the tenant layout does not use are skipped.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    LimitRange, Namespace, PersistentVolumeClaim, ResourceQuota, Service,
};
use k8s_openapi::api::rbac::v1::RoleBinding;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{TenantError, TenantResult};

/// One decoded cluster object
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestDocument {
    Namespace(Namespace),
    RoleBinding(RoleBinding),
    ResourceQuota(ResourceQuota),
    LimitRange(LimitRange),
    PersistentVolumeClaim(PersistentVolumeClaim),
    Deployment(Deployment),
    Service(Service),
}

impl ManifestDocument {
    pub fn kind(&self) -> &'static str {
        match self {
            ManifestDocument::Namespace(_) => "Namespace",
            ManifestDocument::RoleBinding(_) => "RoleBinding",
            ManifestDocument::ResourceQuota(_) => "ResourceQuota",
            ManifestDocument::LimitRange(_) => "LimitRange",
            ManifestDocument::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
            ManifestDocument::Deployment(_) => "Deployment",
            ManifestDocument::Service(_) => "Service",
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ManifestDocument::Namespace(o) => &o.metadata,
            ManifestDocument::RoleBinding(o) => &o.metadata,
            ManifestDocument::ResourceQuota(o) => &o.metadata,
            ManifestDocument::LimitRange(o) => &o.metadata,
            ManifestDocument::PersistentVolumeClaim(o) => &o.metadata,
            ManifestDocument::Deployment(o) => &o.metadata,
            ManifestDocument::Service(o) => &o.metadata,
        }
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ManifestDocument::Namespace(o) => &mut o.metadata,
            ManifestDocument::RoleBinding(o) => &mut o.metadata,
            ManifestDocument::ResourceQuota(o) => &mut o.metadata,
            ManifestDocument::LimitRange(o) => &mut o.metadata,
            ManifestDocument::PersistentVolumeClaim(o) => &mut o.metadata,
            ManifestDocument::Deployment(o) => &mut o.metadata,
            ManifestDocument::Service(o) => &mut o.metadata,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata().name.as_deref()
    }

    /// Everything but the Namespace itself lives inside the tenant namespace.
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, ManifestDocument::Namespace(_))
    }

    /// Place a namespaced document into `namespace`, replacing whatever the
    /// template said.
    pub fn set_namespace(&mut self, namespace: &str) {
        if self.is_namespaced() {
            self.metadata_mut().namespace = Some(namespace.to_string());
        }
    }
}

/// Decoded documents in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestBatch {
    pub documents: Vec<ManifestDocument>,
    /// Kinds that were skipped, in source order
    pub skipped: Vec<String>,
}

impl ManifestBatch {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Minimal envelope used to classify a document before decoding it
#[derive(Debug, Deserialize)]
struct TypeMeta {
    #[serde(rename = "apiVersion", default)]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Decode a multi-document manifest.
pub fn decode(text: &str) -> TenantResult<ManifestBatch> {
    let mut batch = ManifestBatch::default();

    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| TenantError::DecodeError(format!("document {}: {}", index, e)))?;

        if value.is_null() {
            continue;
        }

        let type_meta: TypeMeta = serde_yaml::from_value(value.clone())
            .map_err(|e| TenantError::DecodeError(format!("document {}: {}", index, e)))?;

        let decoded = match type_meta.kind.as_deref() {
            Some("Namespace") => ManifestDocument::Namespace(typed(index, value)?),
            Some("RoleBinding") => ManifestDocument::RoleBinding(typed(index, value)?),
            Some("ResourceQuota") => ManifestDocument::ResourceQuota(typed(index, value)?),
            Some("LimitRange") => ManifestDocument::LimitRange(typed(index, value)?),
            Some("PersistentVolumeClaim") => {
                ManifestDocument::PersistentVolumeClaim(typed(index, value)?)
            }
            Some("Deployment") => ManifestDocument::Deployment(typed(index, value)?),
            Some("Service") => ManifestDocument::Service(typed(index, value)?),
            other => {
                let kind = other.unwrap_or("<none>").to_string();
                debug!(
                    index,
                    kind = %kind,
                    api_version = ?type_meta.api_version,
                    "Skipping unsupported manifest document"
                );
                batch.skipped.push(kind);
                continue;
            }
        };

        if decoded.name().map_or(true, str::is_empty) {
            return Err(TenantError::DecodeError(format!(
                "document {}: {} has no metadata.name",
                index,
                decoded.kind()
            )));
        }

        batch.documents.push(decoded);
    }

    Ok(batch)
}

fn typed<T: DeserializeOwned>(index: usize, value: serde_yaml::Value) -> TenantResult<T> {
    serde_yaml::from_value(value)
        .map_err(|e| TenantError::DecodeError(format!("document {}: {}", index, e)))
}
