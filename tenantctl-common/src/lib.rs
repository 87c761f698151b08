//! Common types shared between tenantctl-core and the tenantctl CLI
//!
//! All resource values are plain integers in canonical base units:
//! milli-cores for CPU, bytes for memory and storage, a count for GPUs.

pub mod validate;

use serde::{Deserialize, Serialize};

/// Hard limit and current usage of one resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub max: i64,
    pub used: i64,
}

impl ResourceSummary {
    pub fn new(max: i64, used: i64) -> Self {
        Self { max, used }
    }
}

/// Snapshot of a tenant's compute quota and storage allotment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub gpu: ResourceSummary,
    pub cpu: ResourceSummary,
    pub memory: ResourceSummary,
    /// Requested storage in bytes
    pub storage: i64,
}

/// Cluster-wide usage totals across tenants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub gpu: i64,
    pub cpu: i64,
    pub memory: i64,
    pub storage: i64,
}

/// Tenant provisioning parameters
///
/// Every field is optional: `None` means "no value requested", which is
/// different from an explicit zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpuperjob: Option<i64>,
    /// GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmemoryperjob: Option<i64>,
    /// GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaultmemoryperjob: Option<i64>,
    /// Whole cores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpuperjob: Option<i64>,
    /// Milli-cores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storageproxycpurequest: Option<i64>,
    /// Milli-cores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storageproxycpulimit: Option<i64>,
    /// MiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storageproxymemory: Option<i64>,
    /// GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storagesize: Option<i64>,
}

impl Spec {
    /// Fill every unset field from `defaults`, keeping fields already set.
    pub fn fill_from(&mut self, defaults: &Spec) {
        self.gpu = self.gpu.or(defaults.gpu);
        self.gpuperjob = self.gpuperjob.or(defaults.gpuperjob);
        self.maxmemoryperjob = self.maxmemoryperjob.or(defaults.maxmemoryperjob);
        self.defaultmemoryperjob = self.defaultmemoryperjob.or(defaults.defaultmemoryperjob);
        self.cpuperjob = self.cpuperjob.or(defaults.cpuperjob);
        self.storageproxycpurequest = self
            .storageproxycpurequest
            .or(defaults.storageproxycpurequest);
        self.storageproxycpulimit = self.storageproxycpulimit.or(defaults.storageproxycpulimit);
        self.storageproxymemory = self.storageproxymemory.or(defaults.storageproxymemory);
        self.storagesize = self.storagesize.or(defaults.storagesize);
    }

    /// The subset of fields an operator may edit on an existing tenant.
    pub fn editable(&self) -> Spec {
        Spec {
            gpu: self.gpu,
            maxmemoryperjob: self.maxmemoryperjob,
            defaultmemoryperjob: self.defaultmemoryperjob,
            ..Default::default()
        }
    }

    /// Overwrite fields with every value set in `edited`.
    pub fn apply_edits(&mut self, edited: &Spec) {
        let mut merged = edited.clone();
        merged.fill_from(self);
        *self = merged;
    }
}

/// Descriptive tenant metadata stored on the namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usertype: Option<String>,
}

impl Metadata {
    pub fn fill_from(&mut self, defaults: &Metadata) {
        if self.fullname.is_none() {
            self.fullname = defaults.fullname.clone();
        }
        if self.email.is_none() {
            self.email = defaults.email.clone();
        }
        if self.usertype.is_none() {
            self.usertype = defaults.usertype.clone();
        }
    }
}
