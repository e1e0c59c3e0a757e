//! Layered resolution of role specifications
//!
//! A role's own settings take precedence over the cluster defaults, which in
//! turn take precedence over the constants applied by [`ResolvedRole`].
//! Resolution never mutates its inputs: every pass builds a fresh
//! [`ResolvedRole`].

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::LocalObjectReference;
use kube::ResourceExt;
use tracing::{debug, instrument};

use super::merge::{
    concat_lists, merge_atomic_list, merge_map, merge_named_list, merge_scalar, merge_string_set,
    resolve_section, Resolve,
};
use super::naming::{wka_service_name, DEFAULT_ROLE_NAME};
use crate::crd::{
    ApplicationSpec, CoherenceCluster, CoherenceRoleSpec, CoherenceSpec, FluentdSpec, ImageSpec,
    JvmDebugSpec, JvmGarbageCollectorSpec, JvmJmxmpSpec, JvmMemorySpec, JvmOutOfMemorySpec,
    JvmSpec, LoggingSpec, NamedPortSpec, NetworkSpec, PersistentStorageSpec, PodDnsConfig,
    PortSpecWithSsl, ProbeSpec, ScalingProbe, ScalingSpec, ServiceSpec, SslSpec, StartQuorum,
};
use crate::error::{Error, Result};

pub const DEFAULT_REPLICAS: i32 = 3;
pub const DEFAULT_HEALTH_PORT: i32 = 6676;
pub const DEFAULT_OPERATOR_REQUEST_TIMEOUT: i32 = 120;

/// Cluster-wide identity and pod settings shared by all roles
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterContext {
    pub name: String,
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,
    pub service_account_name: Option<String>,
    pub automount_service_account_token: Option<bool>,
    pub operator_request_timeout: i32,
    pub wka_service: String,
}

impl ClusterContext {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            wka_service: wka_service_name(&name),
            name,
            image_pull_secrets: None,
            service_account_name: None,
            automount_service_account_token: None,
            operator_request_timeout: DEFAULT_OPERATOR_REQUEST_TIMEOUT,
        }
    }

    pub fn from_cluster(cluster: &CoherenceCluster) -> Self {
        let spec = &cluster.spec;
        let mut context = Self::new(cluster.name_any());
        context.image_pull_secrets = spec.image_pull_secrets.clone();
        context.service_account_name = spec.service_account_name.clone();
        context.automount_service_account_token = spec.automount_service_account_token;
        if let Some(timeout) = spec.operator_request_timeout {
            context.operator_request_timeout = timeout;
        }
        if let Some(wka) = spec.wka_service.as_ref().filter(|wka| !wka.is_empty()) {
            context.wka_service = wka.clone();
        }
        context
    }
}

/// A fully resolved role configuration
///
/// The wrapped spec holds the merged role and cluster settings; the accessors
/// apply the documented constants for anything still unset.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRole {
    spec: CoherenceRoleSpec,
}

impl ResolvedRole {
    pub fn spec(&self) -> &CoherenceRoleSpec {
        &self.spec
    }

    pub fn role_name(&self) -> &str {
        self.spec
            .role
            .as_deref()
            .filter(|role| !role.trim().is_empty())
            .unwrap_or(DEFAULT_ROLE_NAME)
    }

    pub fn replicas(&self) -> i32 {
        self.spec.replicas.unwrap_or(DEFAULT_REPLICAS)
    }

    /// The health port, replacing unset or non-positive values with the default
    pub fn health_port(&self) -> i32 {
        self.spec
            .health_port
            .filter(|port| *port > 0)
            .unwrap_or(DEFAULT_HEALTH_PORT)
    }

    pub fn storage_enabled(&self) -> Option<bool> {
        self.spec.coherence.as_ref().and_then(|c| c.storage_enabled)
    }

    pub fn start_quorum(&self) -> &[StartQuorum] {
        self.spec.start_quorum.as_deref().unwrap_or_default()
    }
}

/// Resolve a role against the cluster defaults
#[instrument(skip_all, fields(role = role.role.as_deref().unwrap_or(DEFAULT_ROLE_NAME)))]
pub fn resolve_role(role: &CoherenceRoleSpec, defaults: Option<&CoherenceRoleSpec>) -> ResolvedRole {
    let spec = match defaults {
        Some(defaults) => role.resolve_with(defaults),
        None => role.clone(),
    };
    debug!("Resolved role configuration");
    ResolvedRole { spec }
}

/// Resolve every role of a cluster, in declaration order
///
/// When the cluster declares no roles the inlined role spec is the single
/// role. Otherwise it supplies the defaults of each declared role.
pub fn resolve_cluster_roles(cluster: &CoherenceCluster) -> Result<Vec<ResolvedRole>> {
    let defaults = &cluster.spec.role;
    let resolved: Vec<ResolvedRole> = match cluster.spec.roles.as_ref().filter(|r| !r.is_empty()) {
        None => vec![resolve_role(defaults, None)],
        Some(roles) => roles
            .iter()
            .map(|role| resolve_role(role, Some(defaults)))
            .collect(),
    };

    let mut seen = BTreeSet::new();
    for role in &resolved {
        if !seen.insert(role.role_name().to_string()) {
            return Err(Error::DuplicateRole(role.role_name().to_string()));
        }
    }
    Ok(resolved)
}

// ============================================================================
// Section resolution
// ============================================================================

impl Resolve for CoherenceRoleSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        CoherenceRoleSpec {
            role: merge_scalar(
                &self.role.clone().filter(|role| !role.trim().is_empty()),
                &fallback.role,
            ),
            replicas: merge_scalar(&self.replicas, &fallback.replicas),
            application: resolve_section(&self.application, &fallback.application),
            coherence: resolve_section(&self.coherence, &fallback.coherence),
            coherence_utils: resolve_section(&self.coherence_utils, &fallback.coherence_utils),
            logging: resolve_section(&self.logging, &fallback.logging),
            jvm: resolve_section(&self.jvm, &fallback.jvm),
            ports: merge_named_list(&self.ports, &fallback.ports, |p, f| p.resolve_with(f)),
            env: merge_atomic_list(&self.env, &fallback.env),
            health_port: merge_scalar(&self.health_port, &fallback.health_port),
            readiness_probe: resolve_section(&self.readiness_probe, &fallback.readiness_probe),
            liveness_probe: resolve_section(&self.liveness_probe, &fallback.liveness_probe),
            scaling: resolve_section(&self.scaling, &fallback.scaling),
            resources: merge_scalar(&self.resources, &fallback.resources),
            annotations: merge_map(&self.annotations, &fallback.annotations),
            labels: merge_map(&self.labels, &fallback.labels),
            volumes: merge_atomic_list(&self.volumes, &fallback.volumes),
            volume_claim_templates: merge_atomic_list(
                &self.volume_claim_templates,
                &fallback.volume_claim_templates,
            ),
            volume_mounts: merge_atomic_list(&self.volume_mounts, &fallback.volume_mounts),
            affinity: merge_scalar(&self.affinity, &fallback.affinity),
            node_selector: merge_scalar(&self.node_selector, &fallback.node_selector),
            tolerations: merge_atomic_list(&self.tolerations, &fallback.tolerations),
            security_context: merge_scalar(&self.security_context, &fallback.security_context),
            share_process_namespace: merge_scalar(
                &self.share_process_namespace,
                &fallback.share_process_namespace,
            ),
            host_ipc: merge_scalar(&self.host_ipc, &fallback.host_ipc),
            network: resolve_section(&self.network, &fallback.network),
            // start ordering is topology specific and never inherited
            start_quorum: self.start_quorum.clone(),
        }
    }
}

impl Resolve for ImageSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        ImageSpec {
            image: merge_scalar(&self.image, &fallback.image),
            image_pull_policy: merge_scalar(&self.image_pull_policy, &fallback.image_pull_policy),
        }
    }
}

impl Resolve for ApplicationSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        ApplicationSpec {
            type_: merge_scalar(&self.type_, &fallback.type_),
            main: merge_scalar(&self.main, &fallback.main),
            args: merge_scalar(&self.args, &fallback.args),
            image_spec: self.image_spec.resolve_with(&fallback.image_spec),
            app_dir: merge_scalar(&self.app_dir, &fallback.app_dir),
            lib_dir: merge_scalar(&self.lib_dir, &fallback.lib_dir),
            config_dir: merge_scalar(&self.config_dir, &fallback.config_dir),
        }
    }
}

impl Resolve for CoherenceSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        CoherenceSpec {
            image_spec: self.image_spec.resolve_with(&fallback.image_spec),
            storage_enabled: merge_scalar(&self.storage_enabled, &fallback.storage_enabled),
            cache_config: merge_scalar(&self.cache_config, &fallback.cache_config),
            override_config: merge_scalar(&self.override_config, &fallback.override_config),
            log_level: merge_scalar(&self.log_level, &fallback.log_level),
            persistence: resolve_section(&self.persistence, &fallback.persistence),
            snapshot: resolve_section(&self.snapshot, &fallback.snapshot),
            management: resolve_section(&self.management, &fallback.management),
            metrics: resolve_section(&self.metrics, &fallback.metrics),
            exclude_from_wka: merge_scalar(&self.exclude_from_wka, &fallback.exclude_from_wka),
        }
    }
}

impl Resolve for PersistentStorageSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        PersistentStorageSpec {
            enabled: merge_scalar(&self.enabled, &fallback.enabled),
            persistent_volume_claim: merge_scalar(
                &self.persistent_volume_claim,
                &fallback.persistent_volume_claim,
            ),
            volume: merge_scalar(&self.volume, &fallback.volume),
        }
    }
}

impl Resolve for PortSpecWithSsl {
    fn resolve_with(&self, fallback: &Self) -> Self {
        PortSpecWithSsl {
            enabled: merge_scalar(&self.enabled, &fallback.enabled),
            port: merge_scalar(&self.port, &fallback.port),
            ssl: resolve_section(&self.ssl, &fallback.ssl),
        }
    }
}

impl Resolve for SslSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        SslSpec {
            enabled: merge_scalar(&self.enabled, &fallback.enabled),
            secrets: merge_scalar(&self.secrets, &fallback.secrets),
            key_store: merge_scalar(&self.key_store, &fallback.key_store),
            key_store_password_file: merge_scalar(
                &self.key_store_password_file,
                &fallback.key_store_password_file,
            ),
            key_password_file: merge_scalar(&self.key_password_file, &fallback.key_password_file),
            key_store_algorithm: merge_scalar(
                &self.key_store_algorithm,
                &fallback.key_store_algorithm,
            ),
            key_store_provider: merge_scalar(&self.key_store_provider, &fallback.key_store_provider),
            key_store_type: merge_scalar(&self.key_store_type, &fallback.key_store_type),
            trust_store: merge_scalar(&self.trust_store, &fallback.trust_store),
            trust_store_password_file: merge_scalar(
                &self.trust_store_password_file,
                &fallback.trust_store_password_file,
            ),
            trust_store_algorithm: merge_scalar(
                &self.trust_store_algorithm,
                &fallback.trust_store_algorithm,
            ),
            trust_store_provider: merge_scalar(
                &self.trust_store_provider,
                &fallback.trust_store_provider,
            ),
            trust_store_type: merge_scalar(&self.trust_store_type, &fallback.trust_store_type),
            require_client_cert: merge_scalar(
                &self.require_client_cert,
                &fallback.require_client_cert,
            ),
        }
    }
}

impl Resolve for JvmSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        JvmSpec {
            args: concat_lists(&self.args, &fallback.args),
            debug: resolve_section(&self.debug, &fallback.debug),
            use_container_limits: merge_scalar(
                &self.use_container_limits,
                &fallback.use_container_limits,
            ),
            flight_recorder: merge_scalar(&self.flight_recorder, &fallback.flight_recorder),
            gc: resolve_section(&self.gc, &fallback.gc),
            diagnostics_volume: merge_scalar(&self.diagnostics_volume, &fallback.diagnostics_volume),
            memory: resolve_section(&self.memory, &fallback.memory),
            jmxmp: resolve_section(&self.jmxmp, &fallback.jmxmp),
        }
    }
}

impl Resolve for JvmDebugSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        JvmDebugSpec {
            enabled: merge_scalar(&self.enabled, &fallback.enabled),
            suspend: merge_scalar(&self.suspend, &fallback.suspend),
            attach: merge_scalar(&self.attach, &fallback.attach),
            port: merge_scalar(&self.port, &fallback.port),
        }
    }
}

impl Resolve for JvmGarbageCollectorSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        JvmGarbageCollectorSpec {
            collector: merge_scalar(&self.collector, &fallback.collector),
            args: merge_scalar(&self.args, &fallback.args),
            logging: merge_scalar(&self.logging, &fallback.logging),
        }
    }
}

impl Resolve for JvmMemorySpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        JvmMemorySpec {
            heap_size: merge_scalar(&self.heap_size, &fallback.heap_size),
            stack_size: merge_scalar(&self.stack_size, &fallback.stack_size),
            metaspace_size: merge_scalar(&self.metaspace_size, &fallback.metaspace_size),
            direct_memory_size: merge_scalar(&self.direct_memory_size, &fallback.direct_memory_size),
            native_memory_tracking: merge_scalar(
                &self.native_memory_tracking,
                &fallback.native_memory_tracking,
            ),
            on_out_of_memory: resolve_section(&self.on_out_of_memory, &fallback.on_out_of_memory),
        }
    }
}

impl Resolve for JvmOutOfMemorySpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        JvmOutOfMemorySpec {
            exit: merge_scalar(&self.exit, &fallback.exit),
            heap_dump: merge_scalar(&self.heap_dump, &fallback.heap_dump),
        }
    }
}

impl Resolve for JvmJmxmpSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        JvmJmxmpSpec {
            enabled: merge_scalar(&self.enabled, &fallback.enabled),
            port: merge_scalar(&self.port, &fallback.port),
        }
    }
}

impl Resolve for LoggingSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        LoggingSpec {
            config_file: merge_scalar(&self.config_file, &fallback.config_file),
            config_map_name: merge_scalar(&self.config_map_name, &fallback.config_map_name),
            fluentd: resolve_section(&self.fluentd, &fallback.fluentd),
        }
    }
}

impl Resolve for FluentdSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        FluentdSpec {
            image_spec: self.image_spec.resolve_with(&fallback.image_spec),
            enabled: merge_scalar(&self.enabled, &fallback.enabled),
            config_file: merge_scalar(&self.config_file, &fallback.config_file),
            tag: merge_scalar(&self.tag, &fallback.tag),
        }
    }
}

impl Resolve for NetworkSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        NetworkSpec {
            dns_config: resolve_section(&self.dns_config, &fallback.dns_config),
            dns_policy: merge_scalar(&self.dns_policy, &fallback.dns_policy),
            host_aliases: merge_atomic_list(&self.host_aliases, &fallback.host_aliases),
            host_network: merge_scalar(&self.host_network, &fallback.host_network),
            hostname: merge_scalar(&self.hostname, &fallback.hostname),
        }
    }
}

impl Resolve for PodDnsConfig {
    fn resolve_with(&self, fallback: &Self) -> Self {
        PodDnsConfig {
            nameservers: concat_lists(&self.nameservers, &fallback.nameservers),
            searches: concat_lists(&self.searches, &fallback.searches),
            options: merge_atomic_list(&self.options, &fallback.options),
        }
    }
}

impl Resolve for NamedPortSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        NamedPortSpec {
            name: if self.name.is_empty() {
                fallback.name.clone()
            } else {
                self.name.clone()
            },
            port: merge_scalar(&self.port, &fallback.port),
            protocol: merge_scalar(&self.protocol, &fallback.protocol),
            service: resolve_section(&self.service, &fallback.service),
            node_port: merge_scalar(&self.node_port, &fallback.node_port),
            host_port: merge_scalar(&self.host_port, &fallback.host_port),
            host_ip: merge_scalar(&self.host_ip, &fallback.host_ip),
        }
    }
}

impl Resolve for ServiceSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        ServiceSpec {
            enabled: merge_scalar(&self.enabled, &fallback.enabled),
            name: merge_scalar(&self.name, &fallback.name),
            port: merge_scalar(&self.port, &fallback.port),
            type_: merge_scalar(&self.type_, &fallback.type_),
            external_ips: merge_string_set(&self.external_ips, &fallback.external_ips),
            cluster_ip: merge_scalar(&self.cluster_ip, &fallback.cluster_ip),
            load_balancer_ip: merge_scalar(&self.load_balancer_ip, &fallback.load_balancer_ip),
            labels: merge_map(&self.labels, &fallback.labels),
            annotations: merge_map(&self.annotations, &fallback.annotations),
            session_affinity: merge_scalar(&self.session_affinity, &fallback.session_affinity),
            load_balancer_source_ranges: merge_scalar(
                &self.load_balancer_source_ranges,
                &fallback.load_balancer_source_ranges,
            ),
            external_name: merge_scalar(&self.external_name, &fallback.external_name),
            external_traffic_policy: merge_scalar(
                &self.external_traffic_policy,
                &fallback.external_traffic_policy,
            ),
            health_check_node_port: merge_scalar(
                &self.health_check_node_port,
                &fallback.health_check_node_port,
            ),
            publish_not_ready_addresses: merge_scalar(
                &self.publish_not_ready_addresses,
                &fallback.publish_not_ready_addresses,
            ),
            session_affinity_config: merge_scalar(
                &self.session_affinity_config,
                &fallback.session_affinity_config,
            ),
            ip_family: merge_scalar(&self.ip_family, &fallback.ip_family),
        }
    }
}

impl Resolve for ScalingSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        ScalingSpec {
            policy: merge_scalar(&self.policy, &fallback.policy),
            probe: resolve_section(&self.probe, &fallback.probe),
        }
    }
}

impl Resolve for ScalingProbe {
    fn resolve_with(&self, fallback: &Self) -> Self {
        ScalingProbe {
            action: merge_scalar(&self.action, &fallback.action),
            timeout_seconds: merge_scalar(&self.timeout_seconds, &fallback.timeout_seconds),
        }
    }
}

impl Resolve for ProbeSpec {
    fn resolve_with(&self, fallback: &Self) -> Self {
        ProbeSpec {
            action: merge_scalar(&self.action, &fallback.action),
            initial_delay_seconds: merge_scalar(
                &self.initial_delay_seconds,
                &fallback.initial_delay_seconds,
            ),
            timeout_seconds: merge_scalar(&self.timeout_seconds, &fallback.timeout_seconds),
            period_seconds: merge_scalar(&self.period_seconds, &fallback.period_seconds),
            success_threshold: merge_scalar(&self.success_threshold, &fallback.success_threshold),
            failure_threshold: merge_scalar(&self.failure_threshold, &fallback.failure_threshold),
        }
    }
}
