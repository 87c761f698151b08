//! Resource accounting
//!
//! Per-tenant quota snapshots, cluster-wide aggregation and the tenant's
//! effective provisioning spec.

pub mod aggregate;
pub mod quota;
pub mod spec;

pub use aggregate::{aggregate_usage, cluster_gpu_summary, memory_per_gpu, total_gpus};
pub use quota::quota;
pub use spec::fetch_spec;
