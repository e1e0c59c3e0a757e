//! CoherenceCluster Custom Resource Definition
//!
//! A CoherenceCluster is made of one or more roles. Each role is a pool of
//! identically configured cluster members that is deployed as its own
//! StatefulSet. The role spec inlined into the cluster spec provides the
//! defaults every declared role is resolved against; when no roles are
//! declared it describes the single implicit role.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, EnvVar, LocalObjectReference, PersistentVolumeClaim, PodSecurityContext,
    ResourceRequirements, Toleration, Volume, VolumeMount,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    ApplicationSpec, CoherenceSpec, ImageSpec, JvmSpec, LoggingSpec, NamedPortSpec, NetworkSpec,
    ProbeSpec, ScalingSpec, StartQuorum, StartQuorumStatus,
};

#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "coherence.oracle.com",
    version = "v1",
    kind = "CoherenceCluster",
    namespaced,
    status = "CoherenceClusterStatus",
    shortname = "coh",
    printcolumn = r#"{"name":"Roles","type":"integer","jsonPath":".status.roles.length"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceClusterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,

    /// Service account the pods run as (the namespace default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automount_service_account_token: Option<bool>,

    /// Seconds a member waits for the operator when fetching site and rack information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_request_timeout: Option<i32>,

    /// Name of the well-known-address service, defaults to `<cluster>-wka`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wka_service: Option<String>,

    /// Defaults shared by all roles, or the single role when `roles` is empty
    #[serde(flatten)]
    pub role: CoherenceRoleSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<CoherenceRoleSpec>>,
}

/// The configuration of one role
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceRoleSpec {
    /// Role name, `storage` when blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Desired number of members, 3 when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence: Option<CoherenceSpec>,

    /// Image of the utilities init container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence_utils: Option<ImageSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jvm: Option<JvmSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<NamedPortSpec>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub env: Option<Vec<EnvVar>>,

    /// Port of the health endpoint, 6676 when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<ProbeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<ProbeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ScalingSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub resources: Option<ResourceRequirements>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub volumes: Option<Vec<Volume>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub volume_claim_templates: Option<Vec<PersistentVolumeClaim>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub volume_mounts: Option<Vec<VolumeMount>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub affinity: Option<Affinity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub tolerations: Option<Vec<Toleration>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub security_context: Option<PodSecurityContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_process_namespace: Option<bool>,

    #[serde(rename = "hostIPC", default, skip_serializing_if = "Option::is_none")]
    pub host_ipc: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSpec>,

    /// Roles that must be ready before this role is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_quorum: Option<Vec<StartQuorum>>,
}

/// Observed state of a CoherenceCluster
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceClusterStatus {
    #[serde(default)]
    pub roles: Vec<RoleStatus>,
}

/// Observed state of one role
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleStatus {
    pub role: String,

    #[serde(default)]
    pub replicas: i32,

    #[serde(default)]
    pub ready_replicas: i32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start_quorum: Vec<StartQuorumStatus>,
}

impl CoherenceCluster {
    /// Parse a CoherenceCluster manifest from YAML (JSON is accepted too)
    pub fn from_yaml(manifest: &str) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_str(manifest)?)
    }

    /// Read a CoherenceCluster manifest from a file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let manifest = std::fs::read_to_string(path)?;
        Self::from_yaml(&manifest)
    }

    /// Resolve every role against the cluster defaults, in declaration order
    pub fn resolved_roles(&self) -> crate::error::Result<Vec<crate::controller::ResolvedRole>> {
        crate::controller::resolve_cluster_roles(self)
    }
}
