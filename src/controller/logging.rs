//! Logging configuration and the fluentd log shipping side-car

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, ConfigMapVolumeSource, Container, EnvVar, Volume, VolumeMount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::env::{env_var, field_ref_env, secret_key_env};
use super::naming::{component_labels, efk_config_map_name, full_role_name, COMPONENT_EFK_CONFIG};
use super::resolver::{ClusterContext, ResolvedRole};
use super::resources::{
    CONTAINER_FLUENTD, DEFAULT_FLUENTD_IMAGE, DEFAULT_LOGGING_CONFIG, EXTERNAL_CONF_DIR,
    MONITORING_CONFIG_NAME, MOUNT_PATH_LOGGING_CONFIG, MOUNT_PATH_LOGS, VOLUME_FLUENTD_CONFIG,
    VOLUME_LOGGING_CONFIG, VOLUME_LOGS,
};
use crate::crd::{FluentdSpec, LoggingSpec};

/// Key of the rendered configuration inside the fluentd ConfigMap
pub const FLUENTD_CONFIG_FILE: &str = "fluentd-coherence.conf";
pub const FLUENTD_CONFIG_MOUNT_PATH: &str = "/fluentd/etc/fluentd-coherence.conf";

/// `COH_LOGGING_CONFIG` for the Coherence container
///
/// A configured file is looked up in the logging ConfigMap mount when a
/// ConfigMap is named, in the application configuration directory when the
/// role has an application image, and otherwise used as given.
pub(crate) fn logging_config_env(logging: Option<&LoggingSpec>, has_application: bool) -> EnvVar {
    let config_file = logging.and_then(|l| l.config_file.as_deref().filter(|f| !f.is_empty()));
    let value = match (config_file, logging.and_then(config_map_name)) {
        (None, _) => DEFAULT_LOGGING_CONFIG.to_string(),
        (Some(file), Some(_)) => format!("{MOUNT_PATH_LOGGING_CONFIG}/{file}"),
        (Some(file), None) if has_application => format!("{EXTERNAL_CONF_DIR}/{file}"),
        (Some(file), None) => file.to_string(),
    };
    env_var("COH_LOGGING_CONFIG", value)
}

fn config_map_name(logging: &LoggingSpec) -> Option<&str> {
    logging
        .config_map_name
        .as_deref()
        .filter(|name| !name.is_empty())
}

/// Volume and mount for a user supplied logging ConfigMap
pub(crate) fn logging_config_volume(logging: Option<&LoggingSpec>) -> Option<(Volume, VolumeMount)> {
    let name = logging.and_then(config_map_name)?;
    let volume = Volume {
        name: VOLUME_LOGGING_CONFIG.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(name.to_string()),
            default_mode: Some(0o777),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mount = VolumeMount {
        name: VOLUME_LOGGING_CONFIG.to_string(),
        mount_path: MOUNT_PATH_LOGGING_CONFIG.to_string(),
        ..Default::default()
    };
    Some((volume, mount))
}

/// The fluentd settings of a role when the side-car is enabled
pub(crate) fn enabled_fluentd(role: &ResolvedRole) -> Option<&FluentdSpec> {
    role.spec()
        .logging
        .as_ref()
        .and_then(|logging| logging.fluentd.as_ref())
        .filter(|fluentd| fluentd.is_enabled())
}

pub(crate) fn build_fluentd_container(fluentd: &FluentdSpec) -> Container {
    let image = fluentd
        .image_spec
        .image()
        .unwrap_or(DEFAULT_FLUENTD_IMAGE)
        .to_string();
    let pull_policy = fluentd
        .image_spec
        .image_pull_policy
        .clone()
        .unwrap_or_else(|| "IfNotPresent".to_string());

    Container {
        name: CONTAINER_FLUENTD.to_string(),
        image: Some(image),
        image_pull_policy: Some(pull_policy),
        args: Some(vec!["-c".to_string(), "/etc/fluent.conf".to_string()]),
        env: Some(vec![
            field_ref_env("COHERENCE_POD_ID", "metadata.uid"),
            env_var("FLUENTD_CONF", FLUENTD_CONFIG_FILE),
            env_var("FLUENT_ELASTICSEARCH_SED_DISABLE", "true"),
            secret_key_env("ELASTICSEARCH_HOST", MONITORING_CONFIG_NAME, "elasticsearchhost", false),
            secret_key_env("ELASTICSEARCH_PORT", MONITORING_CONFIG_NAME, "elasticsearchport", false),
            secret_key_env("ELASTICSEARCH_USER", MONITORING_CONFIG_NAME, "elasticsearchuser", false),
            secret_key_env(
                "ELASTICSEARCH_PASSWORD",
                MONITORING_CONFIG_NAME,
                "elasticsearchpassword",
                false,
            ),
        ]),
        volume_mounts: Some(vec![
            VolumeMount {
                name: VOLUME_FLUENTD_CONFIG.to_string(),
                mount_path: FLUENTD_CONFIG_MOUNT_PATH.to_string(),
                sub_path: Some(FLUENTD_CONFIG_FILE.to_string()),
                ..Default::default()
            },
            VolumeMount {
                name: VOLUME_LOGS.to_string(),
                mount_path: MOUNT_PATH_LOGS.to_string(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    }
}

/// Pod volume holding the rendered fluentd configuration
pub(crate) fn fluentd_config_volume(statefulset_name: &str) -> Volume {
    Volume {
        name: VOLUME_FLUENTD_CONFIG.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(efk_config_map_name(statefulset_name)),
            default_mode: Some(420),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build the fluentd ConfigMap, or `None` when the side-car is disabled
pub fn build_fluentd_config_map(cluster: &ClusterContext, role: &ResolvedRole) -> Option<ConfigMap> {
    let fluentd = enabled_fluentd(role)?;
    let role_name = role.role_name();

    let mut data = BTreeMap::new();
    data.insert(
        FLUENTD_CONFIG_FILE.to_string(),
        render_fluentd_config(&cluster.name, role_name, fluentd),
    );

    Some(ConfigMap {
        metadata: ObjectMeta {
            name: Some(efk_config_map_name(&full_role_name(&cluster.name, role_name))),
            labels: Some(component_labels(&cluster.name, role_name, COMPONENT_EFK_CONFIG)),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    })
}

/// Render the fluentd configuration shipping Coherence logs to Elasticsearch
///
/// An optional `configFile` is included at the top. An optional `tag` adds a
/// second Elasticsearch match for application logs with that tag.
pub fn render_fluentd_config(cluster_name: &str, role_name: &str, fluentd: &FluentdSpec) -> String {
    let mut config = String::from("# Coherence fluentd configuration\n");

    if let Some(include) = fluentd.config_file.as_deref().filter(|f| !f.is_empty()) {
        config.push_str(&format!("@include {include}\n"));
    }

    config.push_str(
        r#"
# Ignore fluentd messages
<match fluent.**>
  @type null
</match>

# Coherence Logs
<source>
  @type tail
  path /logs/coherence-*.log
  pos_file /tmp/cohrence.log.pos
  read_from_head true
  tag coherence-cluster
  multiline_flush_interval 20s
  <parse>
    @type multiline
    format_firstline /^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}.\d{3}/
    format1 /^(?<time>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}.\d{3})\/(?<uptime>[0-9\.]+) (?<product>.+) <(?<level>[^\s]+)> \(thread=(?<thread>.+), member=(?<member>.+)\):[\S\s](?<log>.*)/
  </parse>
</source>
"#,
    );

    config.push_str(&format!(
        r##"
<filter coherence-cluster>
  @type record_transformer
  <record>
    cluster "{cluster_name}"
    role "{role_name}"
    host "#{{ENV['HOSTNAME']}}"
    pod-uid "#{{ENV['COHERENCE_POD_ID']}}"
  </record>
</filter>
"##
    ));

    config.push_str(&elasticsearch_match("coherence-cluster", "coherence-cluster"));

    if let Some(tag) = fluentd.tag.as_deref().filter(|t| !t.is_empty()) {
        config.push_str(&elasticsearch_match(&format!("{tag} "), tag));
    }

    config
}

fn elasticsearch_match(pattern: &str, prefix: &str) -> String {
    format!(
        r##"
<match {pattern}>
  @type elasticsearch
  host "#{{ENV['ELASTICSEARCH_HOST']}}"
  port "#{{ENV['ELASTICSEARCH_PORT']}}"
  user "#{{ENV['ELASTICSEARCH_USER']}}"
  password "#{{ENV['ELASTICSEARCH_PASSWORD']}}"
  logstash_format true
  logstash_prefix {prefix}
</match>
"##
    )
}
