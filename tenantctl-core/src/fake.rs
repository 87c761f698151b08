//! In-memory `ClusterApi` for tests
//!
//! Fixtures are built from the same JSON the API server returns.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    LimitRange, Namespace, Node, PersistentVolumeClaim, ResourceQuota,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde_json::json;

use crate::cluster::ClusterApi;
use crate::error::{TenantError, TenantResult};
use crate::manifest::{ApplyOptions, ManifestDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListNamespaces,
    ListResourceQuotas,
    ListLimitRanges,
    ListPersistentVolumeClaims,
    GetDeployment,
    ListNodes,
    Apply,
    DeleteNamespace,
}

#[derive(Default)]
pub struct FakeCluster {
    pub namespaces: Vec<Namespace>,
    pub quotas: HashMap<String, Vec<ResourceQuota>>,
    pub limit_ranges: HashMap<String, Vec<LimitRange>>,
    pub claims: HashMap<String, Vec<PersistentVolumeClaim>>,
    pub deployments: HashMap<(String, String), Deployment>,
    pub nodes: Vec<Node>,
    failures: HashSet<Operation>,
    delays: HashMap<Operation, Duration>,
    fail_apply_on: Option<usize>,
    apply_attempts: AtomicUsize,
    applied: Mutex<Vec<(String, ManifestDocument)>>,
    applied_options: Mutex<Vec<ApplyOptions>>,
    deleted: Mutex<Vec<String>>,
    completed: Mutex<Vec<Operation>>,
}

impl FakeCluster {
    /// A cluster with one fully provisioned tenant and three nodes
    /// (8 schedulable GPUs).
    pub fn with_tenant(username: &str) -> Self {
        let mut cluster = Self::default();

        cluster
            .namespaces
            .push(namespace(username, Some("Ada Lovelace"), Some("ada@example.com"), None));
        cluster
            .quotas
            .insert(username.to_string(), vec![resource_quota(username)]);
        cluster
            .limit_ranges
            .insert(username.to_string(), vec![limit_range(username)]);
        cluster
            .claims
            .insert(username.to_string(), vec![claim(username, "500Gi")]);
        cluster.deployments.insert(
            (username.to_string(), "storage-proxy".to_string()),
            storage_proxy(username),
        );
        cluster.nodes = vec![
            node("cpu-1", None, false),
            node("gpu-1", Some("8"), false),
            node("gpu-2", Some("7"), true),
        ];

        cluster
    }

    pub fn with_failure(mut self, op: Operation) -> Self {
        self.failures.insert(op);
        self
    }

    pub fn with_delay(mut self, op: Operation, delay: Duration) -> Self {
        self.delays.insert(op, delay);
        self
    }

    /// Fail the `attempt`-th apply call (1-based).
    pub fn fail_apply_on(mut self, attempt: usize) -> Self {
        self.fail_apply_on = Some(attempt);
        self
    }

    pub fn set_quota_hard(&mut self, namespace: &str, name: &str, value: &str) {
        for quota in self.quotas.get_mut(namespace).into_iter().flatten() {
            if let Some(hard) = quota.spec.as_mut().and_then(|s| s.hard.as_mut()) {
                hard.insert(name.to_string(), Quantity(value.to_string()));
            }
        }
    }

    pub fn applied(&self) -> Vec<(String, ManifestDocument)> {
        self.applied.lock().unwrap().clone()
    }

    /// Options passed to each successful apply, in apply order
    pub fn applied_options(&self) -> Vec<ApplyOptions> {
        self.applied_options.lock().unwrap().clone()
    }

    pub fn apply_attempts(&self) -> usize {
        self.apply_attempts.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Operations that ran to completion, in completion order
    pub fn completed(&self) -> Vec<Operation> {
        self.completed.lock().unwrap().clone()
    }

    async fn run(&self, op: Operation) -> TenantResult<()> {
        if let Some(delay) = self.delays.get(&op) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(op);

        if self.failures.contains(&op) {
            return Err(TenantError::Internal(format!("{:?} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_namespaces(&self) -> TenantResult<Vec<Namespace>> {
        self.run(Operation::ListNamespaces).await?;
        Ok(self.namespaces.clone())
    }

    async fn list_resource_quotas(&self, namespace: &str) -> TenantResult<Vec<ResourceQuota>> {
        self.run(Operation::ListResourceQuotas).await?;
        Ok(self.quotas.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_limit_ranges(&self, namespace: &str) -> TenantResult<Vec<LimitRange>> {
        self.run(Operation::ListLimitRanges).await?;
        Ok(self.limit_ranges.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> TenantResult<Vec<PersistentVolumeClaim>> {
        self.run(Operation::ListPersistentVolumeClaims).await?;
        Ok(self.claims.get(namespace).cloned().unwrap_or_default())
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> TenantResult<Deployment> {
        self.run(Operation::GetDeployment).await?;
        self.deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| TenantError::object_not_found(format!("Deployment {}", name), namespace))
    }

    async fn list_nodes(&self) -> TenantResult<Vec<Node>> {
        self.run(Operation::ListNodes).await?;
        Ok(self.nodes.clone())
    }

    async fn apply(
        &self,
        namespace: &str,
        document: &ManifestDocument,
        options: &ApplyOptions,
    ) -> TenantResult<()> {
        let attempt = self.apply_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.run(Operation::Apply).await?;

        if self.fail_apply_on == Some(attempt) {
            return Err(TenantError::Internal(format!(
                "apply of {} rejected",
                document.kind()
            )));
        }

        self.applied
            .lock()
            .unwrap()
            .push((namespace.to_string(), document.clone()));
        self.applied_options.lock().unwrap().push(options.clone());
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> TenantResult<()> {
        self.run(Operation::DeleteNamespace).await?;
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

pub fn namespace(
    name: &str,
    fullname: Option<&str>,
    email: Option<&str>,
    usertype: Option<&str>,
) -> Namespace {
    let mut annotations = serde_json::Map::new();
    if let Some(fullname) = fullname {
        annotations.insert("tenantctl.io/fullname".into(), json!(fullname));
    }
    if let Some(email) = email {
        annotations.insert("tenantctl.io/email".into(), json!(email));
    }
    let mut labels = serde_json::Map::new();
    if let Some(usertype) = usertype {
        labels.insert("tenantctl.io/tenant-type".into(), json!(usertype));
    }

    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "annotations": annotations,
            "labels": labels,
        },
        "status": { "phase": "Active" },
    }))
    .unwrap()
}

pub fn node(name: &str, gpus: Option<&str>, unschedulable: bool) -> Node {
    let mut capacity = serde_json::Map::new();
    capacity.insert("cpu".into(), json!("64"));
    capacity.insert("memory".into(), json!("512Gi"));
    if let Some(gpus) = gpus {
        capacity.insert("nvidia.com/gpu".into(), json!(gpus));
    }

    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Node",
        "metadata": { "name": name },
        "spec": { "unschedulable": unschedulable },
        "status": { "capacity": capacity },
    }))
    .unwrap()
}

pub fn resource_quota(namespace: &str) -> ResourceQuota {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "ResourceQuota",
        "metadata": { "name": "compute-resources", "namespace": namespace },
        "spec": {
            "hard": {
                "requests.cpu": "4500m",
                "requests.nvidia.com/gpu": "2",
                "requests.memory": "16640Mi",
            },
        },
        "status": {
            "hard": {
                "requests.cpu": "4500m",
                "requests.nvidia.com/gpu": "2",
                "requests.memory": "16640Mi",
            },
            "used": {
                "requests.cpu": "2250m",
                "requests.nvidia.com/gpu": "1",
                "requests.memory": "8320Mi",
            },
        },
    }))
    .unwrap()
}

pub fn limit_range(namespace: &str) -> LimitRange {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "LimitRange",
        "metadata": { "name": "defaults", "namespace": namespace },
        "spec": {
            "limits": [{
                "type": "Container",
                "defaultRequest": {
                    "nvidia.com/gpu": "1",
                    "cpu": "4",
                    "memory": "12Gi",
                },
            }],
        },
    }))
    .unwrap()
}

pub fn claim(namespace: &str, storage: &str) -> PersistentVolumeClaim {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "PersistentVolumeClaim",
        "metadata": { "name": "home", "namespace": namespace },
        "spec": {
            "accessModes": ["ReadWriteOnce"],
            "resources": { "requests": { "storage": storage } },
        },
    }))
    .unwrap()
}

pub fn storage_proxy(namespace: &str) -> Deployment {
    serde_json::from_value(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": "storage-proxy", "namespace": namespace },
        "spec": {
            "selector": { "matchLabels": { "app": "storage-proxy" } },
            "template": {
                "metadata": { "labels": { "app": "storage-proxy" } },
                "spec": {
                    "containers": [{
                        "name": "proxy",
                        "image": "storage-proxy:latest",
                        "resources": {
                            "requests": { "cpu": "250m", "memory": "512Mi" },
                            "limits": { "cpu": "1", "memory": "512Mi" },
                        },
                    }],
                },
            },
        },
    }))
    .unwrap()
}
