//! Custom Resource Definitions for the Coherence operator
//!
//! This module defines the CoherenceCluster CRD and the configuration
//! sections that make up a role specification.

mod coherence_cluster;
pub mod types;


pub use coherence_cluster::{
    CoherenceCluster, CoherenceClusterSpec, CoherenceClusterStatus, CoherenceRoleSpec, RoleStatus,
};
pub use types::*;
