//! Unit tests for logging configuration and the fluentd side-car.

#[cfg(test)]
mod tests {
    use crate::controller::logging::*;
    use crate::controller::resolver::{resolve_role, ClusterContext};
    use crate::crd::{CoherenceRoleSpec, FluentdSpec, ImageSpec, LoggingSpec};

    fn logging(config_file: Option<&str>, config_map_name: Option<&str>) -> LoggingSpec {
        LoggingSpec {
            config_file: config_file.map(str::to_string),
            config_map_name: config_map_name.map(str::to_string),
            fluentd: None,
        }
    }

    fn fluentd(enabled: bool) -> FluentdSpec {
        FluentdSpec {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // COH_LOGGING_CONFIG
    // -----------------------------------------------------------------------

    #[test]
    fn test_logging_config_default() {
        let env = logging_config_env(None, false);
        assert_eq!(env.name, "COH_LOGGING_CONFIG");
        assert_eq!(env.value.as_deref(), Some("/scripts/logging.properties"));

        let env = logging_config_env(Some(&logging(None, Some("log-cm"))), true);
        assert_eq!(env.value.as_deref(), Some("/scripts/logging.properties"));
    }

    #[test]
    fn test_logging_config_from_config_map() {
        let env = logging_config_env(Some(&logging(Some("logging.properties"), Some("log-cm"))), true);
        assert_eq!(env.value.as_deref(), Some("/loggingconfig/logging.properties"));
    }

    #[test]
    fn test_logging_config_from_application() {
        let env = logging_config_env(Some(&logging(Some("logging.properties"), None)), true);
        assert_eq!(
            env.value.as_deref(),
            Some("/u01/oracle/oracle_home/coherence/app/conf/logging.properties")
        );
    }

    #[test]
    fn test_logging_config_used_as_given() {
        let env = logging_config_env(Some(&logging(Some("/etc/logging.properties"), None)), false);
        assert_eq!(env.value.as_deref(), Some("/etc/logging.properties"));
    }

    #[test]
    fn test_logging_config_volume_uses_config_map_name() {
        assert!(logging_config_volume(Some(&logging(Some("x"), None))).is_none());

        let (volume, mount) = logging_config_volume(Some(&logging(None, Some("log-cm")))).unwrap();
        assert_eq!(volume.name, "logging-config");
        assert_eq!(
            volume.config_map.and_then(|cm| cm.name).as_deref(),
            Some("log-cm")
        );
        assert_eq!(mount.mount_path, "/loggingconfig");
    }

    // -----------------------------------------------------------------------
    // Fluentd
    // -----------------------------------------------------------------------

    #[test]
    fn test_fluentd_container_defaults() {
        let container = build_fluentd_container(&fluentd(true));
        assert_eq!(container.name, "fluentd");
        assert_eq!(
            container.image.as_deref(),
            Some("fluent/fluentd-kubernetes-daemonset:v1.3.3-debian-elasticsearch-1.3")
        );
        assert_eq!(container.image_pull_policy.as_deref(), Some("IfNotPresent"));
        assert_eq!(
            container.args,
            Some(vec!["-c".to_string(), "/etc/fluent.conf".to_string()])
        );

        let env = container.env.unwrap();
        assert_eq!(env.len(), 7);
        let password = env.iter().find(|e| e.name == "ELASTICSEARCH_PASSWORD").unwrap();
        let secret = password
            .value_from
            .as_ref()
            .and_then(|s| s.secret_key_ref.as_ref())
            .unwrap();
        assert_eq!(secret.name.as_deref(), Some("coherence-monitoring-config"));
        assert_eq!(secret.key, "elasticsearchpassword");

        let mounts = container.volume_mounts.unwrap();
        assert_eq!(mounts[0].sub_path.as_deref(), Some("fluentd-coherence.conf"));
        assert_eq!(mounts[1].mount_path, "/logs");
    }

    #[test]
    fn test_fluentd_container_custom_image() {
        let spec = FluentdSpec {
            image_spec: ImageSpec {
                image: Some("my/fluentd:1".to_string()),
                image_pull_policy: Some("Always".to_string()),
            },
            ..fluentd(true)
        };
        let container = build_fluentd_container(&spec);
        assert_eq!(container.image.as_deref(), Some("my/fluentd:1"));
        assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));
    }

    #[test]
    fn test_fluentd_config_map_only_when_enabled() {
        let cluster = ClusterContext::new("test-cluster");
        let role = |enabled: bool| CoherenceRoleSpec {
            role: Some("data".to_string()),
            logging: Some(LoggingSpec {
                fluentd: Some(fluentd(enabled)),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(build_fluentd_config_map(&cluster, &resolve_role(&role(false), None)).is_none());

        let config_map = build_fluentd_config_map(&cluster, &resolve_role(&role(true), None)).unwrap();
        assert_eq!(
            config_map.metadata.name.as_deref(),
            Some("test-cluster-data-efk-config")
        );
        let labels = config_map.metadata.labels.unwrap();
        assert_eq!(labels["component"], "coherence-efk-config");
        assert!(config_map.data.unwrap().contains_key("fluentd-coherence.conf"));
    }

    #[test]
    fn test_render_fluentd_config() {
        let config = render_fluentd_config("test-cluster", "data", &fluentd(true));

        assert!(config.starts_with("# Coherence fluentd configuration\n\n# Ignore fluentd messages\n"));
        assert!(!config.contains("@include"));
        assert!(config.contains("  path /logs/coherence-*.log\n"));
        assert!(config.contains("    cluster \"test-cluster\"\n    role \"data\"\n"));
        assert!(config.contains("    host \"#{ENV['HOSTNAME']}\"\n"));
        assert!(config.contains("<match coherence-cluster>\n  @type elasticsearch\n"));
        assert!(config.contains("  logstash_prefix coherence-cluster\n</match>\n"));
        assert_eq!(config.matches("@type elasticsearch").count(), 1);
    }

    #[test]
    fn test_render_fluentd_config_with_include_and_tag() {
        let spec = FluentdSpec {
            config_file: Some("/conf/app-fluentd.conf".to_string()),
            tag: Some("app".to_string()),
            ..fluentd(true)
        };
        let config = render_fluentd_config("c", "r", &spec);

        assert!(config.starts_with(
            "# Coherence fluentd configuration\n@include /conf/app-fluentd.conf\n\n# Ignore"
        ));
        assert!(config.contains("<match app >\n"));
        assert!(config.ends_with("  logstash_prefix app\n</match>\n"));
        assert_eq!(config.matches("@type elasticsearch").count(), 2);
    }
}
