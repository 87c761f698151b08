//! Kubernetes client wrapper
//!
//! Implements `ClusterApi` over a kube-rs `Client`.

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    LimitRange, Namespace, Node, PersistentVolumeClaim, ResourceQuota,
};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PropagationPolicy};
use kube::config::KubeConfigOptions;
use kube::{Client, Config, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cluster::ClusterApi;
use crate::error::{TenantError, TenantResult};
use crate::manifest::{ApplyOptions, ConflictPolicy, ManifestDocument};

#[derive(Clone)]
pub struct K8sClient {
    inner: Client,
}

impl K8sClient {
    pub fn new(client: Client) -> Self {
        Self { inner: client }
    }

    /// Connect using the local kubeconfig, optionally selecting `context`.
    /// Without a context, falls back to in-cluster configuration when no
    /// kubeconfig is present.
    pub async fn connect(context: Option<&str>) -> TenantResult<Self> {
        let client = match context {
            Some(context) => {
                let config = Config::from_kubeconfig(&KubeConfigOptions {
                    context: Some(context.to_string()),
                    ..Default::default()
                })
                .await
                .map_err(|e| TenantError::Kubeconfig(e.to_string()))?;
                Client::try_from(config)?
            }
            None => Client::try_default().await?,
        };

        Ok(Self::new(client))
    }

    async fn apply_object<K>(
        &self,
        api: Api<K>,
        object: &K,
        options: &ApplyOptions,
    ) -> TenantResult<()>
    where
        K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned + Serialize,
    {
        let kind = K::kind(&()).to_string();
        let name = object
            .meta()
            .name
            .clone()
            .ok_or_else(|| TenantError::DecodeError(format!("{} has no metadata.name", kind)))?;

        let mut params = PatchParams::apply(&options.field_manager);
        if options.conflict == ConflictPolicy::Force {
            params = params.force();
        }

        match api.patch(&name, &params, &Patch::Apply(object)).await {
            Ok(_) => {
                debug!(kind = %kind, name = %name, "Server-side apply succeeded");
                Ok(())
            }
            Err(e) => Err(apply_error(kind, name, e)),
        }
    }
}

/// A 409 from an apply means another field manager owns a field we set.
fn apply_error(kind: String, name: String, err: kube::Error) -> TenantError {
    match err {
        kube::Error::Api(response) if response.code == 409 => TenantError::ApplyConflict {
            kind,
            name,
            message: response.message,
        },
        e => e.into(),
    }
}

#[async_trait]
impl ClusterApi for K8sClient {
    async fn list_namespaces(&self) -> TenantResult<Vec<Namespace>> {
        let api: Api<Namespace> = Api::all(self.inner.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_resource_quotas(&self, namespace: &str) -> TenantResult<Vec<ResourceQuota>> {
        let api: Api<ResourceQuota> = Api::namespaced(self.inner.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_limit_ranges(&self, namespace: &str) -> TenantResult<Vec<LimitRange>> {
        let api: Api<LimitRange> = Api::namespaced(self.inner.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> TenantResult<Vec<PersistentVolumeClaim>> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.inner.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> TenantResult<Deployment> {
        let api: Api<Deployment> = Api::namespaced(self.inner.clone(), namespace);
        api.get_opt(name)
            .await?
            .ok_or_else(|| TenantError::object_not_found(format!("Deployment {}", name), namespace))
    }

    async fn list_nodes(&self) -> TenantResult<Vec<Node>> {
        let api: Api<Node> = Api::all(self.inner.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn apply(
        &self,
        namespace: &str,
        document: &ManifestDocument,
        options: &ApplyOptions,
    ) -> TenantResult<()> {
        let client = self.inner.clone();
        match document {
            ManifestDocument::Namespace(o) => self.apply_object(Api::all(client), o, options).await,
            ManifestDocument::RoleBinding(o) => {
                self.apply_object(Api::namespaced(client, namespace), o, options)
                    .await
            }
            ManifestDocument::ResourceQuota(o) => {
                self.apply_object(Api::namespaced(client, namespace), o, options)
                    .await
            }
            ManifestDocument::LimitRange(o) => {
                self.apply_object(Api::namespaced(client, namespace), o, options)
                    .await
            }
            ManifestDocument::PersistentVolumeClaim(o) => {
                self.apply_object(Api::namespaced(client, namespace), o, options)
                    .await
            }
            ManifestDocument::Deployment(o) => {
                self.apply_object(Api::namespaced(client, namespace), o, options)
                    .await
            }
            ManifestDocument::Service(o) => {
                self.apply_object(Api::namespaced(client, namespace), o, options)
                    .await
            }
        }
    }

    async fn delete_namespace(&self, name: &str) -> TenantResult<()> {
        let api: Api<Namespace> = Api::all(self.inner.clone());
        let params = DeleteParams {
            grace_period_seconds: Some(0),
            propagation_policy: Some(PropagationPolicy::Foreground),
            ..Default::default()
        };
        api.delete(name, &params).await?;
        debug!(namespace = %name, "Namespace deletion requested");
        Ok(())
    }
}
