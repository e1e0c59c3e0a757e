//! Shared configuration sections for Coherence role specifications
//!
//! Every scalar field is an `Option` so that "not specified" stays distinct
//! from an explicitly empty or zero value when a role is resolved against the
//! cluster defaults. Lists follow the same rule: `None` means never configured,
//! `Some(vec![])` means configured as empty.
//!
//! # Type Hierarchy
//!
//! - [`ImageSpec`] - image reference and pull policy shared by several sections
//! - [`ApplicationSpec`] - optional application image copied into the pod
//! - [`CoherenceSpec`] - storage, persistence, management and metrics settings
//! - [`JvmSpec`] - JVM arguments, debug, GC, memory and JMXMP settings
//! - [`LoggingSpec`] / [`FluentdSpec`] - logging configuration and log shipping side-car
//! - [`NetworkSpec`] - DNS and host networking settings of the pod
//! - [`NamedPortSpec`] / [`ServiceSpec`] - additional ports and the services exposing them
//! - [`ScalingSpec`] / [`ScalingProbe`] - safe scaling policy and Status-HA probe
//! - [`ProbeSpec`] - readiness and liveness probe overrides
//! - [`StartQuorum`] - ordered start-up dependencies between roles

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ExecAction, HTTPGetAction, HostAlias, PersistentVolumeClaimSpec, PodDNSConfigOption,
    SessionAffinityConfig, TCPSocketAction, VolumeSource,
};
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Image reference and pull policy
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// One of `Always`, `Never` or `IfNotPresent`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,
}

impl ImageSpec {
    /// The configured image, treating an empty string as unset
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.is_empty())
    }
}

// ============================================================================
// Application
// ============================================================================

/// Application image and launch settings
///
/// When an image is configured an init container copies the application
/// artifacts from the image into the shared application directory before the
/// Coherence container starts.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Application type passed to the start script, e.g. `java` or `node`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// Main class to run instead of the default Coherence server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(flatten)]
    pub image_spec: ImageSpec,

    /// Directory inside the application image holding the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lib_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,
}

// ============================================================================
// Coherence
// ============================================================================

/// Coherence runtime configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceSpec {
    #[serde(flatten)]
    pub image_spec: ImageSpec,

    /// Whether members of this role store cache data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_config: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_config: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<i32>,

    /// Active persistence storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistentStorageSpec>,

    /// Snapshot storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PersistentStorageSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management: Option<PortSpecWithSsl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PortSpecWithSsl>,

    /// Exclude the members of this role from the well-known-address list
    #[serde(
        rename = "excludeFromWKA",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub exclude_from_wka: Option<bool>,
}

/// Persistent storage used for active persistence or snapshots
///
/// A raw `volume` and a `persistentVolumeClaim` are mutually exclusive; when
/// both are set the raw volume wins and no claim template is produced.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistentStorageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub volume: Option<VolumeSource>,
}

impl PersistentStorageSpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

/// An optional endpoint (management or metrics) that may be secured with SSL
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortSpecWithSsl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<SslSpec>,
}

impl PortSpecWithSsl {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

/// SSL settings of an HTTP endpoint
///
/// `secrets` names a Secret that is mounted into the container; the store and
/// password file names are resolved relative to that mount.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SslSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store_password_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_password_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_store_password_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_store_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_store_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_store_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_client_cert: Option<bool>,
}

// ============================================================================
// JVM
// ============================================================================

/// JVM configuration of the Coherence container
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JvmSpec {
    /// Extra JVM arguments, appended after any cluster-wide arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<JvmDebugSpec>,

    /// Let the JVM size itself from the container limits (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_container_limits: Option<bool>,

    /// Enable Java Flight Recorder (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_recorder: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc: Option<JvmGarbageCollectorSpec>,

    /// Volume used for heap dumps and other JVM diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub diagnostics_volume: Option<VolumeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<JvmMemorySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jmxmp: Option<JvmJmxmpSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JvmDebugSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
    /// Address of a debugger to attach to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JvmGarbageCollectorSpec {
    /// Collector name, e.g. `G1`, `CMS` or `Parallel`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JvmMemorySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metaspace_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_memory_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_memory_tracking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_out_of_memory: Option<JvmOutOfMemorySpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JvmOutOfMemorySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap_dump: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JvmJmxmpSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

// ============================================================================
// Logging
// ============================================================================

/// Logging configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSpec {
    /// Logging configuration file name
    ///
    /// Resolved inside `configMapName` when that is set, otherwise inside the
    /// application configuration directory when an application image is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,

    /// ConfigMap holding the logging configuration file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluentd: Option<FluentdSpec>,
}

/// Fluentd log shipping side-car
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FluentdSpec {
    #[serde(flatten)]
    pub image_spec: ImageSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Extra fluentd configuration included into the generated configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,

    /// Tag of application logs shipped in addition to the Coherence logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl FluentdSpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

// ============================================================================
// Network
// ============================================================================

/// Pod networking configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_config: Option<PodDnsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub host_aliases: Option<Vec<HostAlias>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_network: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodDnsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searches: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub options: Option<Vec<PodDNSConfigOption>>,
}

// ============================================================================
// Ports and Services
// ============================================================================

/// An additional named container port, optionally exposed by a Service
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedPortSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    /// `TCP` (default), `UDP` or `SCTP`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,

    #[serde(rename = "hostIP", default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
}

impl NamedPortSpec {
    pub fn protocol(&self) -> String {
        self.protocol.clone().unwrap_or_else(|| "TCP".to_string())
    }

    /// The port exposed by the Service: the service override, else the container port
    pub fn service_port(&self) -> i32 {
        self.service
            .as_ref()
            .and_then(|service| service.port)
            .or(self.port)
            .unwrap_or(0)
    }

    /// A port gets a Service unless the service is explicitly disabled
    pub fn is_service_enabled(&self) -> bool {
        self.service
            .as_ref()
            .and_then(|service| service.enabled)
            .unwrap_or(true)
    }
}

/// Service exposing a named port
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Service name, defaults to `<cluster>-<role>-<port>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(
        rename = "externalIPs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub external_ips: Option<Vec<String>>,

    #[serde(rename = "clusterIP", default, skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,

    #[serde(
        rename = "loadBalancerIP",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub load_balancer_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_source_ranges: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_traffic_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_node_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_not_ready_addresses: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub session_affinity_config: Option<SessionAffinityConfig>,

    /// `IPv4` or `IPv6`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_family: Option<String>,
}

// ============================================================================
// Scaling and probes
// ============================================================================

/// How the replicas of a role are scaled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ScalingPolicy {
    /// Scale up and down one member at a time, waiting for Status-HA between steps
    Safe,
    /// Scale up and down in a single step
    Parallel,
    /// Scale up in a single step, scale down safely
    ParallelUpSafeDown,
}

impl std::fmt::Display for ScalingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingPolicy::Safe => write!(f, "Safe"),
            ScalingPolicy::Parallel => write!(f, "Parallel"),
            ScalingPolicy::ParallelUpSafeDown => write!(f, "ParallelUpSafeDown"),
        }
    }
}

/// Safe scaling configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScalingSpec {
    /// Defaults from the storage-enabled flag when not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ScalingPolicy>,

    /// Probe deciding whether the role is Status-HA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<ScalingProbe>,
}

/// The action a probe performs
///
/// Serialized inline using the platform field names, so a probe reads
/// `httpGet: {...}`, `tcpSocket: {...}` or `exec: {...}`. Exactly one action
/// can be configured.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProbeAction {
    HttpGet(HTTPGetAction),
    TcpSocket(TCPSocketAction),
    Exec(ExecAction),
}

impl JsonSchema for ProbeAction {
    fn schema_name() -> String {
        "ProbeAction".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        let mut schema = SchemaObject {
            instance_type: Some(InstanceType::Object.into()),
            ..Default::default()
        };
        let object = schema.object();
        for key in ["exec", "httpGet", "tcpSocket"] {
            object
                .properties
                .insert(key.to_string(), gen.subschema_for::<serde_json::Value>());
        }
        Schema::Object(schema)
    }
}

/// Status-HA probe
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScalingProbe {
    #[serde(flatten)]
    pub action: Option<ProbeAction>,

    /// Seconds after which the probe times out, minimum 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i32>,
}

/// Readiness or liveness probe override
///
/// Any field left unset falls back to the operator defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    #[serde(flatten)]
    pub action: Option<ProbeAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<i32>,
}

// ============================================================================
// Start quorum
// ============================================================================

/// A role that must have `podCount` ready members before this role starts
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartQuorum {
    pub role: String,

    #[serde(default)]
    pub pod_count: i32,
}

/// A start quorum entry together with whether it is currently met
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartQuorumStatus {
    #[serde(flatten)]
    pub quorum: StartQuorum,

    pub ready: bool,
}
