//! Kubernetes resource builders for a resolved Coherence role
//!
//! Every builder is a pure function of the cluster context and the resolved
//! role, so repeated synthesis yields identical manifests. The reconciler
//! diffs these against live state.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec, StatefulSetUpdateStrategy};
use k8s_openapi::api::core::v1::{
    Affinity, ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource,
    EnvVar, HTTPGetAction, PersistentVolumeClaim, PodAffinityTerm, PodAntiAffinity, PodDNSConfig,
    PodSpec, PodTemplateSpec, Probe, ResourceRequirements, SecretVolumeSource, Service, Volume,
    VolumeMount, VolumeSource, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, LabelSelectorRequirement, ObjectMeta,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tracing::{debug, instrument};

use super::env::{
    application_env, coherence_env, core_env, endpoints_env, env_var, jvm_env, merge_user_env,
    persistence_env,
};
use super::logging::{
    build_fluentd_config_map, build_fluentd_container, enabled_fluentd, fluentd_config_volume,
    logging_config_env, logging_config_volume,
};
use super::naming::{
    component_labels, full_role_name, pod_selector_labels, COMPONENT_STATEFULSET,
    COMPONENT_VOLUME, LABEL_CLUSTER, LABEL_ROLE, LABEL_WKA_MEMBER,
};
use super::resolver::{ClusterContext, ResolvedRole};
use super::services::{build_headless_service, build_port_services};
use crate::crd::{PersistentStorageSpec, PortSpecWithSsl, ProbeAction, ProbeSpec};
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

pub const CONTAINER_COHERENCE: &str = "coherence";
pub const CONTAINER_UTILS: &str = "coherence-k8s-utils";
pub const CONTAINER_APPLICATION: &str = "application";
pub const CONTAINER_FLUENTD: &str = "fluentd";

pub const VOLUME_PERSISTENCE: &str = "persistence-volume";
pub const VOLUME_SNAPSHOT: &str = "snapshot-volume";
pub const VOLUME_LOGS: &str = "log-dir";
pub const VOLUME_UTILS: &str = "utils-dir";
pub const VOLUME_APPLICATION: &str = "application-dir";
pub const VOLUME_JVM: &str = "jvm";
pub const VOLUME_SCRIPTS: &str = "coherence-scripts";
pub const VOLUME_FLUENTD_CONFIG: &str = "fluentd-coherence-conf";
pub const VOLUME_MANAGEMENT_SSL: &str = "management-ssl-config";
pub const VOLUME_METRICS_SSL: &str = "metrics-ssl-config";
pub const VOLUME_LOGGING_CONFIG: &str = "logging-config";

pub const MOUNT_PATH_PERSISTENCE: &str = "/persistence";
pub const MOUNT_PATH_SNAPSHOT: &str = "/snapshot";
pub const MOUNT_PATH_UTILS: &str = "/utils";
pub const MOUNT_PATH_JVM: &str = "/jvm";
pub const MOUNT_PATH_LOGS: &str = "/logs";
pub const MOUNT_PATH_SCRIPTS: &str = "/scripts";
pub const MOUNT_PATH_LOGGING_CONFIG: &str = "/loggingconfig";
pub const MOUNT_PATH_MANAGEMENT_CERTS: &str = "/coherence/certs/management";
pub const MOUNT_PATH_METRICS_CERTS: &str = "/coherence/certs/metrics";

/// Directory the application init container copies artifacts into
pub const EXTERNAL_APP_DIR: &str = "/u01/oracle/oracle_home/coherence/app";
pub const EXTERNAL_LIB_DIR: &str = "/u01/oracle/oracle_home/coherence/app/lib";
pub const EXTERNAL_CONF_DIR: &str = "/u01/oracle/oracle_home/coherence/app/conf";
pub const DEFAULT_APP_DIR: &str = "/app";
pub const DEFAULT_LIB_DIR: &str = "/app/lib";
pub const DEFAULT_CONF_DIR: &str = "/app/conf";

pub const DEFAULT_DEBUG_PORT: i32 = 5005;
pub const DEFAULT_MANAGEMENT_PORT: i32 = 30000;
pub const DEFAULT_METRICS_PORT: i32 = 9612;
pub const DEFAULT_JMXMP_PORT: i32 = 9099;
/// Cluster port of the Coherence member, also exposed by the headless Service
pub const COHERENCE_PORT: i32 = 7;
pub const PORT_NAME_COHERENCE: &str = "coherence";
pub const PORT_NAME_DEBUG: &str = "debug-port";
pub const PORT_NAME_HEALTH: &str = "health";

pub const OPERATOR_CONFIG_NAME: &str = "coherence-operator-config";
pub const OPERATOR_CONFIG_HOST_KEY: &str = "operatorhost";
pub const SCRIPTS_CONFIG_MAP: &str = "coherence-operator-scripts";
pub const MONITORING_CONFIG_NAME: &str = "coherence-monitoring-config";
pub const DEFAULT_FLUENTD_IMAGE: &str = "fluent/fluentd-kubernetes-daemonset:v1.3.3-debian-elasticsearch-1.3";
pub const DEFAULT_LOGGING_CONFIG: &str = "/scripts/logging.properties";

pub const READY_PATH: &str = "/ready";
pub const HEALTHZ_PATH: &str = "/healthz";
pub const ZONE_TOPOLOGY_KEY: &str = "failure-domain.beta.kubernetes.io/zone";

const REVISION_HISTORY_LIMIT: i32 = 5;
const MODE_EXECUTABLE: i32 = 0o777;

const START_COMMAND: [&str; 4] = ["/bin/sh", "-x", "/scripts/startCoherence.sh", "server"];
const UTILS_INIT_COMMAND: &str = "/files/utils-init";
const APPLICATION_COPY_COMMAND: &str = "/utils/copy";

/// Timing defaults of a generated probe
struct ProbeDefaults {
    path: &'static str,
    initial_delay_seconds: i32,
    period_seconds: i32,
    timeout_seconds: i32,
    success_threshold: i32,
    failure_threshold: i32,
}

const READINESS_DEFAULTS: ProbeDefaults = ProbeDefaults {
    path: READY_PATH,
    initial_delay_seconds: 30,
    period_seconds: 60,
    timeout_seconds: 30,
    success_threshold: 1,
    failure_threshold: 50,
};

const LIVENESS_DEFAULTS: ProbeDefaults = ProbeDefaults {
    path: HEALTHZ_PATH,
    initial_delay_seconds: 60,
    period_seconds: 60,
    timeout_seconds: 30,
    success_threshold: 1,
    failure_threshold: 5,
};

// ============================================================================
// Role resources
// ============================================================================

/// Every manifest synthesized for one role
#[derive(Clone, Debug, PartialEq)]
pub struct RoleResources {
    pub config_map: Option<ConfigMap>,
    pub headless_service: Service,
    pub stateful_set: StatefulSet,
    pub services: Vec<Service>,
}

impl RoleResources {
    /// The manifests in dependency order, as JSON values
    pub fn manifests(&self) -> Result<Vec<serde_json::Value>> {
        let mut manifests = Vec::with_capacity(self.services.len() + 3);
        if let Some(config_map) = &self.config_map {
            manifests.push(typed_manifest(config_map)?);
        }
        manifests.push(typed_manifest(&self.headless_service)?);
        manifests.push(typed_manifest(&self.stateful_set)?);
        for service in &self.services {
            manifests.push(typed_manifest(service)?);
        }
        Ok(manifests)
    }
}

/// Serialize a resource; k8s-openapi emits `apiVersion` and `kind` itself
fn typed_manifest<K>(resource: &K) -> Result<serde_json::Value>
where
    K: k8s_openapi::Resource + serde::Serialize,
{
    Ok(serde_json::to_value(resource)?)
}

/// Synthesize every manifest of a role
#[instrument(skip_all, fields(cluster = %cluster.name, role = %role.role_name()))]
pub fn build_role_resources(cluster: &ClusterContext, role: &ResolvedRole) -> Result<RoleResources> {
    let resources = RoleResources {
        config_map: build_fluentd_config_map(cluster, role),
        headless_service: build_headless_service(cluster, role),
        stateful_set: build_statefulset(cluster, role)?,
        services: build_port_services(cluster, role),
    };
    debug!(
        services = resources.services.len(),
        fluentd = resources.config_map.is_some(),
        "Synthesized role resources"
    );
    Ok(resources)
}

// ============================================================================
// StatefulSet
// ============================================================================

pub fn build_statefulset(cluster: &ClusterContext, role: &ResolvedRole) -> Result<StatefulSet> {
    let role_name = role.role_name();
    let name = full_role_name(&cluster.name, role_name);

    let mut claim_templates = role
        .spec()
        .volume_claim_templates
        .clone()
        .unwrap_or_default();
    claim_templates.extend(persistence_claims(cluster, role));

    Ok(StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            labels: Some(component_labels(
                &cluster.name,
                role_name,
                COMPONENT_STATEFULSET,
            )),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(role.replicas()),
            pod_management_policy: Some("Parallel".to_string()),
            update_strategy: Some(StatefulSetUpdateStrategy {
                type_: Some("RollingUpdate".to_string()),
                ..Default::default()
            }),
            revision_history_limit: Some(REVISION_HISTORY_LIMIT),
            service_name: name.clone(),
            selector: LabelSelector {
                match_labels: Some(pod_selector_labels(&cluster.name, role_name)),
                ..Default::default()
            },
            template: build_pod_template(cluster, role, &name)?,
            volume_claim_templates: (!claim_templates.is_empty()).then_some(claim_templates),
            ..Default::default()
        }),
        status: None,
    })
}

fn pod_labels(cluster: &ClusterContext, role: &ResolvedRole) -> BTreeMap<String, String> {
    let mut labels = pod_selector_labels(&cluster.name, role.role_name());
    let excluded = role
        .spec()
        .coherence
        .as_ref()
        .and_then(|c| c.exclude_from_wka)
        .unwrap_or(false);
    labels.insert(LABEL_WKA_MEMBER.to_string(), (!excluded).to_string());
    if let Some(user) = &role.spec().labels {
        labels.extend(user.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    labels
}

fn build_pod_template(
    cluster: &ClusterContext,
    role: &ResolvedRole,
    statefulset_name: &str,
) -> Result<PodTemplateSpec> {
    let spec = role.spec();
    let network = spec.network.clone().unwrap_or_default();

    let mut init_containers = vec![build_utils_container(cluster, role)?];
    init_containers.extend(build_application_container(role));

    let mut containers = vec![build_coherence_container(cluster, role)?];
    containers.extend(enabled_fluentd(role).map(build_fluentd_container));

    Ok(PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(pod_labels(cluster, role)),
            annotations: spec.annotations.clone(),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            image_pull_secrets: cluster.image_pull_secrets.clone(),
            service_account_name: cluster.service_account_name.clone(),
            automount_service_account_token: cluster.automount_service_account_token,
            security_context: spec.security_context.clone(),
            share_process_namespace: spec.share_process_namespace,
            host_ipc: Some(spec.host_ipc.unwrap_or(false)),
            tolerations: spec.tolerations.clone(),
            affinity: Some(
                spec.affinity
                    .clone()
                    .unwrap_or_else(|| default_affinity(&cluster.name, role.role_name())),
            ),
            node_selector: spec.node_selector.clone(),
            init_containers: Some(init_containers),
            containers,
            volumes: Some(build_volumes(role, statefulset_name)?),
            dns_config: network.dns_config.as_ref().and_then(|dns| {
                let config = PodDNSConfig {
                    nameservers: dns.nameservers.clone().filter(|v| !v.is_empty()),
                    searches: dns.searches.clone().filter(|v| !v.is_empty()),
                    options: dns.options.clone().filter(|v| !v.is_empty()),
                };
                (config != PodDNSConfig::default()).then_some(config)
            }),
            dns_policy: network.dns_policy.clone(),
            host_aliases: network.host_aliases.clone(),
            host_network: Some(network.host_network.unwrap_or(false)),
            hostname: network.hostname.clone(),
            ..Default::default()
        }),
    })
}

/// Prefer spreading the members of a role across zones
fn default_affinity(cluster: &str, role: &str) -> Affinity {
    let requirement = |key: &str, value: &str| LabelSelectorRequirement {
        key: key.to_string(),
        operator: "In".to_string(),
        values: Some(vec![value.to_string()]),
    };

    Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            preferred_during_scheduling_ignored_during_execution: Some(vec![
                WeightedPodAffinityTerm {
                    weight: 1,
                    pod_affinity_term: PodAffinityTerm {
                        topology_key: ZONE_TOPOLOGY_KEY.to_string(),
                        label_selector: Some(LabelSelector {
                            match_expressions: Some(vec![
                                requirement(LABEL_CLUSTER, cluster),
                                requirement(LABEL_ROLE, role),
                            ]),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// ============================================================================
// Volumes
// ============================================================================

fn empty_dir_volume(name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }
}

fn mount(name: &str, path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: path.to_string(),
        ..Default::default()
    }
}

/// A volume named `name` backed by an arbitrary volume source
fn named_volume(name: &str, source: &VolumeSource) -> Result<Volume> {
    let mut value = serde_json::to_value(source)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("name".to_string(), name.into());
    }
    Ok(serde_json::from_value(value)?)
}

/// Enabled persistence and snapshot storage, with their volume and mount names
fn enabled_storage(role: &ResolvedRole) -> Vec<(&'static str, &'static str, &PersistentStorageSpec)> {
    let Some(coherence) = role.spec().coherence.as_ref() else {
        return Vec::new();
    };
    [
        (VOLUME_PERSISTENCE, MOUNT_PATH_PERSISTENCE, &coherence.persistence),
        (VOLUME_SNAPSHOT, MOUNT_PATH_SNAPSHOT, &coherence.snapshot),
    ]
    .into_iter()
    .filter_map(|(volume, path, storage)| {
        storage
            .as_ref()
            .filter(|s| s.is_enabled())
            .map(|s| (volume, path, s))
    })
    .collect()
}

fn storage_mounts(role: &ResolvedRole) -> Vec<VolumeMount> {
    enabled_storage(role)
        .into_iter()
        .map(|(volume, path, _)| mount(volume, path))
        .collect()
}

/// Enabled management and metrics endpoints that mount an SSL secret
fn ssl_secrets(role: &ResolvedRole) -> Vec<(&'static str, &'static str, String)> {
    let Some(coherence) = role.spec().coherence.as_ref() else {
        return Vec::new();
    };
    let secret = |spec: &Option<PortSpecWithSsl>| {
        spec.as_ref()
            .filter(|s| s.is_enabled())
            .and_then(|s| s.ssl.as_ref())
            .filter(|ssl| ssl.enabled == Some(true))
            .and_then(|ssl| ssl.secrets.clone())
            .filter(|secrets| !secrets.is_empty())
    };
    [
        (VOLUME_MANAGEMENT_SSL, MOUNT_PATH_MANAGEMENT_CERTS, secret(&coherence.management)),
        (VOLUME_METRICS_SSL, MOUNT_PATH_METRICS_CERTS, secret(&coherence.metrics)),
    ]
    .into_iter()
    .filter_map(|(volume, path, secret)| secret.map(|s| (volume, path, s)))
    .collect()
}

fn build_volumes(role: &ResolvedRole, statefulset_name: &str) -> Result<Vec<Volume>> {
    let spec = role.spec();

    let mut volumes = vec![
        empty_dir_volume(VOLUME_LOGS),
        empty_dir_volume(VOLUME_UTILS),
        empty_dir_volume(VOLUME_APPLICATION),
        Volume {
            name: VOLUME_SCRIPTS.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: Some(SCRIPTS_CONFIG_MAP.to_string()),
                default_mode: Some(MODE_EXECUTABLE),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    match spec.jvm.as_ref().and_then(|jvm| jvm.diagnostics_volume.as_ref()) {
        Some(source) => volumes.push(named_volume(VOLUME_JVM, source)?),
        None => volumes.push(empty_dir_volume(VOLUME_JVM)),
    }

    for (name, _, secret) in ssl_secrets(role) {
        volumes.push(Volume {
            name: name.to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret),
                default_mode: Some(MODE_EXECUTABLE),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    // a raw volume replaces the claim template
    for (name, _, storage) in enabled_storage(role) {
        if let Some(source) = &storage.volume {
            volumes.push(named_volume(name, source)?);
        }
    }

    if let Some((volume, _)) = logging_config_volume(spec.logging.as_ref()) {
        volumes.push(volume);
    }

    if enabled_fluentd(role).is_some() {
        volumes.push(fluentd_config_volume(statefulset_name));
    }

    volumes.extend(spec.volumes.clone().unwrap_or_default());
    Ok(volumes)
}

/// Claim templates for enabled persistence and snapshot storage without a raw volume
fn persistence_claims(cluster: &ClusterContext, role: &ResolvedRole) -> Vec<PersistentVolumeClaim> {
    enabled_storage(role)
        .into_iter()
        .filter(|(_, _, storage)| storage.volume.is_none())
        .map(|(name, _, storage)| PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(component_labels(
                    &cluster.name,
                    role.role_name(),
                    COMPONENT_VOLUME,
                )),
                ..Default::default()
            },
            spec: Some(storage.persistent_volume_claim.clone().unwrap_or_default()),
            status: None,
        })
        .collect()
}

// ============================================================================
// Containers
// ============================================================================

fn build_utils_container(cluster: &ClusterContext, role: &ResolvedRole) -> Result<Container> {
    let utils = role.spec().coherence_utils.as_ref();
    let image = utils
        .and_then(|u| u.image())
        .ok_or_else(|| Error::MissingImage {
            role: role.role_name().to_string(),
            container: CONTAINER_UTILS.to_string(),
        })?;

    let mut volume_mounts = vec![mount(VOLUME_UTILS, MOUNT_PATH_UTILS)];
    volume_mounts.extend(storage_mounts(role));

    Ok(Container {
        name: CONTAINER_UTILS.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: utils.and_then(|u| u.image_pull_policy.clone()),
        command: Some(vec![UTILS_INIT_COMMAND.to_string()]),
        env: Some(vec![
            env_var("COH_UTIL_DIR", MOUNT_PATH_UTILS),
            env_var("COH_CLUSTER_NAME", cluster.name.clone()),
        ]),
        volume_mounts: Some(volume_mounts),
        ..Default::default()
    })
}

/// The artifact copying init container, only when an application image is set
fn build_application_container(role: &ResolvedRole) -> Option<Container> {
    let application = role.spec().application.as_ref()?;
    let image = application.image_spec.image()?;
    let dir = |value: &Option<String>, default: &str| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    Some(Container {
        name: CONTAINER_APPLICATION.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: application.image_spec.image_pull_policy.clone(),
        command: Some(vec![APPLICATION_COPY_COMMAND.to_string()]),
        env: Some(vec![
            env_var("EXTERNAL_APP_DIR", EXTERNAL_APP_DIR),
            env_var("APP_DIR", dir(&application.app_dir, DEFAULT_APP_DIR)),
            env_var("EXTERNAL_LIB_DIR", EXTERNAL_LIB_DIR),
            env_var("LIB_DIR", dir(&application.lib_dir, DEFAULT_LIB_DIR)),
            env_var("EXTERNAL_CONF_DIR", EXTERNAL_CONF_DIR),
            env_var("CONF_DIR", dir(&application.config_dir, DEFAULT_CONF_DIR)),
        ]),
        volume_mounts: Some(vec![
            mount(VOLUME_UTILS, MOUNT_PATH_UTILS),
            mount(VOLUME_APPLICATION, EXTERNAL_APP_DIR),
        ]),
        ..Default::default()
    })
}

fn has_application_image(role: &ResolvedRole) -> bool {
    role.spec()
        .application
        .as_ref()
        .and_then(|app| app.image_spec.image())
        .is_some()
}

fn build_coherence_container(cluster: &ClusterContext, role: &ResolvedRole) -> Result<Container> {
    let spec = role.spec();
    let coherence = spec.coherence.as_ref();
    let image = coherence
        .and_then(|c| c.image_spec.image())
        .ok_or_else(|| Error::MissingImage {
            role: role.role_name().to_string(),
            container: CONTAINER_COHERENCE.to_string(),
        })?;

    Ok(Container {
        name: CONTAINER_COHERENCE.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: coherence.and_then(|c| c.image_spec.image_pull_policy.clone()),
        command: Some(START_COMMAND.iter().map(|s| s.to_string()).collect()),
        ports: Some(build_container_ports(role)),
        env: Some(build_coherence_env(cluster, role)),
        volume_mounts: Some(build_coherence_mounts(role)),
        resources: Some(spec.resources.clone().unwrap_or_else(default_resources)),
        readiness_probe: Some(build_probe(
            spec.readiness_probe.as_ref(),
            &READINESS_DEFAULTS,
            role.health_port(),
        )),
        liveness_probe: Some(build_probe(
            spec.liveness_probe.as_ref(),
            &LIVENESS_DEFAULTS,
            role.health_port(),
        )),
        ..Default::default()
    })
}

fn build_container_ports(role: &ResolvedRole) -> Vec<ContainerPort> {
    let mut ports = vec![
        ContainerPort {
            name: Some(PORT_NAME_COHERENCE.to_string()),
            container_port: COHERENCE_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        },
        ContainerPort {
            name: Some(PORT_NAME_HEALTH.to_string()),
            container_port: role.health_port(),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        },
    ];

    if let Some(debug) = role
        .spec()
        .jvm
        .as_ref()
        .and_then(|jvm| jvm.debug.as_ref())
        .filter(|debug| debug.enabled == Some(true))
    {
        ports.push(ContainerPort {
            name: Some(PORT_NAME_DEBUG.to_string()),
            container_port: debug.port.unwrap_or(DEFAULT_DEBUG_PORT),
            ..Default::default()
        });
    }

    for port in role.spec().ports.iter().flatten() {
        ports.push(ContainerPort {
            name: Some(port.name.clone()),
            container_port: port.service_port(),
            protocol: Some(port.protocol()),
            host_port: port.host_port,
            host_ip: port.host_ip.clone(),
        });
    }
    ports
}

fn build_coherence_env(cluster: &ClusterContext, role: &ResolvedRole) -> Vec<EnvVar> {
    let spec = role.spec();

    let mut env = core_env(cluster, role);
    env.extend(application_env(spec.application.as_ref()));
    env.extend(jvm_env(spec.jvm.as_ref()));
    env.push(logging_config_env(
        spec.logging.as_ref(),
        has_application_image(role),
    ));
    if let Some(coherence) = &spec.coherence {
        env.extend(coherence_env(coherence));
        env.extend(endpoints_env(coherence));
        env.extend(persistence_env(coherence));
    }

    merge_user_env(env, spec.env.as_deref())
}

fn build_coherence_mounts(role: &ResolvedRole) -> Vec<VolumeMount> {
    let spec = role.spec();

    let mut mounts = vec![
        mount(VOLUME_LOGS, MOUNT_PATH_LOGS),
        mount(VOLUME_UTILS, MOUNT_PATH_UTILS),
        mount(VOLUME_APPLICATION, EXTERNAL_APP_DIR),
        mount(VOLUME_JVM, MOUNT_PATH_JVM),
        mount(VOLUME_SCRIPTS, MOUNT_PATH_SCRIPTS),
    ];
    for (name, path, _) in ssl_secrets(role) {
        mounts.push(VolumeMount {
            read_only: Some(true),
            ..mount(name, path)
        });
    }
    mounts.extend(storage_mounts(role));
    if let Some((_, logging_mount)) = logging_config_volume(spec.logging.as_ref()) {
        mounts.push(logging_mount);
    }
    mounts.extend(spec.volume_mounts.clone().unwrap_or_default());
    mounts
}

/// No CPU reserved, visible CPUs capped at 32
fn default_resources() -> ResourceRequirements {
    let cpu = |value: &str| {
        let mut quantities = BTreeMap::new();
        quantities.insert("cpu".to_string(), Quantity(value.to_string()));
        Some(quantities)
    };
    ResourceRequirements {
        limits: cpu("32"),
        requests: cpu("0"),
        ..Default::default()
    }
}

fn build_probe(user: Option<&ProbeSpec>, defaults: &ProbeDefaults, health_port: i32) -> Probe {
    let mut probe = Probe {
        initial_delay_seconds: Some(defaults.initial_delay_seconds),
        period_seconds: Some(defaults.period_seconds),
        timeout_seconds: Some(defaults.timeout_seconds),
        success_threshold: Some(defaults.success_threshold),
        failure_threshold: Some(defaults.failure_threshold),
        ..Default::default()
    };

    match user.and_then(|u| u.action.clone()) {
        Some(ProbeAction::HttpGet(http)) => probe.http_get = Some(http),
        Some(ProbeAction::TcpSocket(tcp)) => probe.tcp_socket = Some(tcp),
        Some(ProbeAction::Exec(exec)) => probe.exec = Some(exec),
        None => {
            probe.http_get = Some(HTTPGetAction {
                path: Some(defaults.path.to_string()),
                port: IntOrString::Int(health_port),
                scheme: Some("HTTP".to_string()),
                ..Default::default()
            })
        }
    }

    if let Some(user) = user {
        let overrides = [
            (&mut probe.initial_delay_seconds, user.initial_delay_seconds),
            (&mut probe.period_seconds, user.period_seconds),
            (&mut probe.timeout_seconds, user.timeout_seconds),
            (&mut probe.success_threshold, user.success_threshold),
            (&mut probe.failure_threshold, user.failure_threshold),
        ];
        for (field, value) in overrides {
            if value.is_some() {
                *field = value;
            }
        }
    }
    probe
}
