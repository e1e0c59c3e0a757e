//! Resolution and synthesis engine for CoherenceCluster roles
//!
//! Roles are resolved against the cluster defaults, turned into Kubernetes
//! manifests, and gated by the scaling and start quorum policies before the
//! manifests are applied.

pub mod apply;
mod env;
#[cfg(test)]
mod env_test;
mod logging;
#[cfg(test)]
mod logging_test;
pub mod merge;
pub mod naming;
#[cfg(test)]
mod naming_test;
pub mod probe;
#[cfg(test)]
mod probe_test;
pub mod quorum;
pub mod resolver;
pub mod resources;
pub mod scaling;
#[cfg(test)]
mod scaling_test;
pub mod services;
#[cfg(test)]
mod services_test;

pub use apply::{apply_role_resources, FIELD_MANAGER};
pub use logging::{build_fluentd_config_map, render_fluentd_config};
pub use probe::{StatusHaProbe, StatusHaProber};
pub use quorum::{is_satisfied, quorum_status};
pub use resolver::{resolve_cluster_roles, resolve_role, ClusterContext, ResolvedRole};
pub use resources::{build_role_resources, RoleResources};
pub use scaling::{next_scale_step, plan_scaling, ScaleStep, ScalingPlan};

use crate::crd::CoherenceCluster;
use crate::error::Result;

/// Resolve every role of a cluster and synthesize its resources, in role order
pub fn synthesize_cluster(cluster: &CoherenceCluster) -> Result<Vec<(ResolvedRole, RoleResources)>> {
    let context = ClusterContext::from_cluster(cluster);
    resolve_cluster_roles(cluster)?
        .into_iter()
        .map(|role| {
            let resources = build_role_resources(&context, &role)?;
            Ok((role, resources))
        })
        .collect()
}
