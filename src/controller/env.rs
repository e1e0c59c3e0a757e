//! Environment variables of the Coherence container
//!
//! The container start script reads these names, so they must stay stable.
//! Blocks are appended in a fixed order; user-declared variables are merged
//! last and replace any generated variable of the same name.

use k8s_openapi::api::core::v1::{
    EnvVar, EnvVarSource, ObjectFieldSelector, SecretKeySelector,
};

use super::resolver::{ClusterContext, ResolvedRole};
use super::resources::{
    DEFAULT_DEBUG_PORT, DEFAULT_JMXMP_PORT, DEFAULT_MANAGEMENT_PORT, DEFAULT_METRICS_PORT,
    EXTERNAL_APP_DIR, EXTERNAL_CONF_DIR, EXTERNAL_LIB_DIR, MOUNT_PATH_MANAGEMENT_CERTS,
    MOUNT_PATH_METRICS_CERTS, MOUNT_PATH_UTILS, OPERATOR_CONFIG_HOST_KEY, OPERATOR_CONFIG_NAME,
};
use crate::crd::{ApplicationSpec, CoherenceSpec, JvmSpec, PortSpecWithSsl, SslSpec};

pub(crate) fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

pub(crate) fn field_ref_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
    }
}

pub(crate) fn secret_key_env(name: &str, secret: &str, key: &str, optional: bool) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(secret.to_string()),
                key: key.to_string(),
                optional: optional.then_some(true),
            }),
            ..Default::default()
        }),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Identity, discovery and operator callback variables
pub(crate) fn core_env(cluster: &ClusterContext, role: &ResolvedRole) -> Vec<EnvVar> {
    vec![
        env_var("COH_WKA", cluster.wka_service.clone()),
        env_var("COH_APP_DIR", EXTERNAL_APP_DIR),
        env_var(
            "COH_EXTRA_CLASSPATH",
            format!("{EXTERNAL_LIB_DIR}/*:{EXTERNAL_CONF_DIR}"),
        ),
        field_ref_env("COH_MACHINE_NAME", "spec.nodeName"),
        field_ref_env("COH_MEMBER_NAME", "metadata.name"),
        field_ref_env("COH_POD_UID", "metadata.uid"),
        secret_key_env(
            "OPERATOR_HOST",
            OPERATOR_CONFIG_NAME,
            OPERATOR_CONFIG_HOST_KEY,
            true,
        ),
        env_var(
            "COH_SITE_INFO_LOCATION",
            "http://$(OPERATOR_HOST)/site/$(COH_MACHINE_NAME)",
        ),
        env_var(
            "COH_RACK_INFO_LOCATION",
            "http://$(OPERATOR_HOST)/rack/$(COH_MACHINE_NAME)",
        ),
        env_var("COH_CLUSTER_NAME", cluster.name.clone()),
        env_var("COH_ROLE", role.role_name()),
        env_var("COH_UTIL_DIR", MOUNT_PATH_UTILS),
        env_var(
            "OPERATOR_REQUEST_TIMEOUT",
            cluster.operator_request_timeout.to_string(),
        ),
        env_var("COH_HEALTH_PORT", role.health_port().to_string()),
    ]
}

pub(crate) fn application_env(application: Option<&ApplicationSpec>) -> Vec<EnvVar> {
    let mut env = Vec::new();
    let Some(application) = application else {
        return env;
    };

    if let Some(type_) = &application.type_ {
        env.push(env_var("APP_TYPE", type_.clone()));
    }
    if let Some(main) = &application.main {
        env.push(env_var("COH_MAIN_CLASS", main.clone()));
    }
    if let Some(args) = application.args.as_ref().filter(|args| !args.is_empty()) {
        env.push(env_var("COH_MAIN_ARGS", args.join(" ")));
    }
    env
}

/// JVM variables: debug, args, memory, JMXMP, GC, then container limits and flight recorder
pub(crate) fn jvm_env(jvm: Option<&JvmSpec>) -> Vec<EnvVar> {
    let mut env = Vec::new();

    if let Some(debug) = jvm
        .and_then(|jvm| jvm.debug.as_ref())
        .filter(|debug| debug.enabled == Some(true))
    {
        env.push(env_var("JVM_DEBUG_ENABLED", "true"));
        env.push(env_var(
            "JVM_DEBUG_PORT",
            debug.port.unwrap_or(DEFAULT_DEBUG_PORT).to_string(),
        ));
        if debug.suspend == Some(true) {
            env.push(env_var("JVM_DEBUG_SUSPEND", "true"));
        }
        if let Some(attach) = &debug.attach {
            env.push(env_var("JVM_DEBUG_ATTACH", attach.clone()));
        }
    }

    if let Some(args) = jvm
        .and_then(|jvm| jvm.args.as_ref())
        .filter(|args| !args.is_empty())
    {
        env.push(env_var("JVM_ARGS", args.join(" ")));
    }

    if let Some(memory) = jvm.and_then(|jvm| jvm.memory.as_ref()) {
        let sizes = [
            ("JVM_HEAP_SIZE", &memory.heap_size),
            ("JVM_DIRECT_MEMORY_SIZE", &memory.direct_memory_size),
            ("JVM_STACK_SIZE", &memory.stack_size),
            ("JVM_METASPACE_SIZE", &memory.metaspace_size),
            ("JVM_NATIVE_MEMORY_TRACKING", &memory.native_memory_tracking),
        ];
        for (name, value) in sizes {
            if let Some(value) = non_empty(value) {
                env.push(env_var(name, value));
            }
        }
        if let Some(oom) = &memory.on_out_of_memory {
            if let Some(exit) = oom.exit {
                env.push(env_var("JVM_OOM_EXIT", exit.to_string()));
            }
            if let Some(heap_dump) = oom.heap_dump {
                env.push(env_var("JVM_OOM_HEAP_DUMP", heap_dump.to_string()));
            }
        }
    }

    if let Some(jmxmp) = jvm.and_then(|jvm| jvm.jmxmp.as_ref()) {
        env.push(env_var(
            "JVM_JMXMP_ENABLED",
            jmxmp.enabled.unwrap_or(false).to_string(),
        ));
        env.push(env_var(
            "JVM_JMXMP_PORT",
            jmxmp.port.unwrap_or(DEFAULT_JMXMP_PORT).to_string(),
        ));
    }

    let gc = jvm.and_then(|jvm| jvm.gc.as_ref());
    if let Some(args) = gc
        .and_then(|gc| gc.args.as_ref())
        .filter(|args| !args.is_empty())
    {
        env.push(env_var("JVM_GC_ARGS", args.join(" ")));
    }
    if let Some(collector) = gc.and_then(|gc| non_empty(&gc.collector)) {
        env.push(env_var("JVM_GC_COLLECTOR", collector));
    }
    env.push(env_var(
        "JVM_GC_LOGGING",
        gc.and_then(|gc| gc.logging).unwrap_or(true).to_string(),
    ));

    env.push(env_var(
        "JVM_USE_CONTAINER_LIMITS",
        jvm.and_then(|jvm| jvm.use_container_limits)
            .unwrap_or(true)
            .to_string(),
    ));
    env.push(env_var(
        "JVM_FLIGHT_RECORDER",
        jvm.and_then(|jvm| jvm.flight_recorder)
            .unwrap_or(true)
            .to_string(),
    ));

    env
}

/// Cache configuration, override file, log level and storage flag
pub(crate) fn coherence_env(coherence: &CoherenceSpec) -> Vec<EnvVar> {
    let mut env = Vec::new();
    if let Some(cache_config) = non_empty(&coherence.cache_config) {
        env.push(env_var("COH_CACHE_CONFIG", cache_config));
    }
    if let Some(override_config) = non_empty(&coherence.override_config) {
        env.push(env_var("COH_OVERRIDE_CONFIG", override_config));
    }
    if let Some(log_level) = coherence.log_level {
        env.push(env_var("COH_LOG_LEVEL", log_level.to_string()));
    }
    if let Some(storage_enabled) = coherence.storage_enabled {
        env.push(env_var("COH_STORAGE_ENABLED", storage_enabled.to_string()));
    }
    env
}

/// Management and metrics endpoint blocks
pub(crate) fn endpoints_env(coherence: &CoherenceSpec) -> Vec<EnvVar> {
    let mut env = port_with_ssl_env(
        "COH_MGMT",
        coherence.management.as_ref(),
        MOUNT_PATH_MANAGEMENT_CERTS,
        DEFAULT_MANAGEMENT_PORT,
    );
    env.extend(port_with_ssl_env(
        "COH_METRICS",
        coherence.metrics.as_ref(),
        MOUNT_PATH_METRICS_CERTS,
        DEFAULT_METRICS_PORT,
    ));
    env
}

pub(crate) fn persistence_env(coherence: &CoherenceSpec) -> Vec<EnvVar> {
    let mut env = Vec::new();
    if coherence
        .persistence
        .as_ref()
        .is_some_and(|p| p.is_enabled())
    {
        env.push(env_var("COH_PERSISTENCE_ENABLED", "true"));
    }
    if coherence.snapshot.as_ref().is_some_and(|s| s.is_enabled()) {
        env.push(env_var("COH_SNAPSHOT_ENABLED", "true"));
    }
    env
}

/// `<prefix>_ENABLED`, the SSL block and `<prefix>_PORT` of an endpoint
pub(crate) fn port_with_ssl_env(
    prefix: &str,
    spec: Option<&PortSpecWithSsl>,
    certs_path: &str,
    default_port: i32,
) -> Vec<EnvVar> {
    let Some(spec) = spec.filter(|spec| spec.is_enabled()) else {
        return vec![env_var(&format!("{prefix}_ENABLED"), "false")];
    };

    let mut env = vec![env_var(&format!("{prefix}_ENABLED"), "true")];
    if let Some(ssl) = &spec.ssl {
        env.extend(ssl_env(prefix, ssl, certs_path));
    }
    env.push(env_var(
        &format!("{prefix}_PORT"),
        spec.port.unwrap_or(default_port).to_string(),
    ));
    env
}

fn ssl_env(prefix: &str, ssl: &SslSpec, certs_path: &str) -> Vec<EnvVar> {
    let mut env = Vec::new();
    if ssl.enabled == Some(true) {
        env.push(env_var(&format!("{prefix}_SSL_ENABLED"), "true"));
    }
    if non_empty(&ssl.secrets).is_some() {
        env.push(env_var(&format!("{prefix}_SSL_CERTS"), certs_path));
    }

    let settings = [
        ("KEYSTORE", &ssl.key_store),
        ("KEYSTORE_PASSWORD_FILE", &ssl.key_store_password_file),
        ("KEY_PASSWORD_FILE", &ssl.key_password_file),
        ("KEYSTORE_ALGORITHM", &ssl.key_store_algorithm),
        ("KEYSTORE_PROVIDER", &ssl.key_store_provider),
        ("KEYSTORE_TYPE", &ssl.key_store_type),
        ("TRUSTSTORE", &ssl.trust_store),
        ("TRUSTSTORE_PASSWORD_FILE", &ssl.trust_store_password_file),
        ("TRUSTSTORE_ALGORITHM", &ssl.trust_store_algorithm),
        ("TRUSTSTORE_PROVIDER", &ssl.trust_store_provider),
        ("TRUSTSTORE_TYPE", &ssl.trust_store_type),
    ];
    for (suffix, value) in settings {
        if let Some(value) = non_empty(value) {
            env.push(env_var(&format!("{prefix}_SSL_{suffix}"), value));
        }
    }

    if ssl.require_client_cert == Some(true) {
        env.push(env_var(&format!("{prefix}_SSL_REQUIRE_CLIENT_CERT"), "true"));
    }
    env
}

/// Merge user variables into the generated ones
///
/// A user variable replaces the generated variable of the same name in place;
/// other user variables are appended in their declared order.
pub(crate) fn merge_user_env(mut generated: Vec<EnvVar>, user: Option<&[EnvVar]>) -> Vec<EnvVar> {
    for var in user.unwrap_or_default() {
        match generated.iter_mut().find(|existing| existing.name == var.name) {
            Some(existing) => *existing = var.clone(),
            None => generated.push(var.clone()),
        }
    }
    generated
}
