//! Unit tests for the Coherence container environment.

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::EnvVar;

    use crate::controller::env::*;
    use crate::controller::resolver::{resolve_role, ClusterContext};
    use crate::crd::{
        ApplicationSpec, CoherenceRoleSpec, CoherenceSpec, JvmDebugSpec, JvmJmxmpSpec,
        JvmMemorySpec, JvmOutOfMemorySpec, JvmSpec, PersistentStorageSpec, PortSpecWithSsl,
        SslSpec,
    };

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn names(env: &[EnvVar]) -> Vec<&str> {
        env.iter().map(|var| var.name.as_str()).collect()
    }

    fn value<'a>(env: &'a [EnvVar], name: &str) -> Option<&'a str> {
        env.iter()
            .find(|var| var.name == name)
            .and_then(|var| var.value.as_deref())
    }

    // -----------------------------------------------------------------------
    // Core
    // -----------------------------------------------------------------------

    #[test]
    fn test_core_env_order_and_values() {
        let cluster = ClusterContext::new("test-cluster");
        let role = resolve_role(&CoherenceRoleSpec::default(), None);
        let env = core_env(&cluster, &role);

        assert_eq!(
            names(&env),
            vec![
                "COH_WKA",
                "COH_APP_DIR",
                "COH_EXTRA_CLASSPATH",
                "COH_MACHINE_NAME",
                "COH_MEMBER_NAME",
                "COH_POD_UID",
                "OPERATOR_HOST",
                "COH_SITE_INFO_LOCATION",
                "COH_RACK_INFO_LOCATION",
                "COH_CLUSTER_NAME",
                "COH_ROLE",
                "COH_UTIL_DIR",
                "OPERATOR_REQUEST_TIMEOUT",
                "COH_HEALTH_PORT",
            ]
        );
        assert_eq!(value(&env, "COH_WKA"), Some("test-cluster-wka"));
        assert_eq!(value(&env, "COH_ROLE"), Some("storage"));
        assert_eq!(value(&env, "OPERATOR_REQUEST_TIMEOUT"), Some("120"));
        assert_eq!(value(&env, "COH_HEALTH_PORT"), Some("6676"));
        assert_eq!(
            value(&env, "COH_EXTRA_CLASSPATH"),
            Some("/u01/oracle/oracle_home/coherence/app/lib/*:/u01/oracle/oracle_home/coherence/app/conf")
        );

        let host = env.iter().find(|var| var.name == "OPERATOR_HOST").unwrap();
        let secret = host
            .value_from
            .as_ref()
            .and_then(|source| source.secret_key_ref.as_ref())
            .unwrap();
        assert_eq!(secret.name.as_deref(), Some("coherence-operator-config"));
        assert_eq!(secret.key, "operatorhost");
        assert_eq!(secret.optional, Some(true));
    }

    #[test]
    fn test_application_env() {
        assert!(application_env(None).is_empty());

        let env = application_env(Some(&ApplicationSpec {
            type_: Some("java".to_string()),
            main: Some("com.example.Main".to_string()),
            args: Some(vec!["a".to_string(), "b".to_string()]),
            ..Default::default()
        }));
        assert_eq!(names(&env), vec!["APP_TYPE", "COH_MAIN_CLASS", "COH_MAIN_ARGS"]);
        assert_eq!(value(&env, "COH_MAIN_ARGS"), Some("a b"));
    }

    // -----------------------------------------------------------------------
    // JVM
    // -----------------------------------------------------------------------

    #[test]
    fn test_jvm_env_defaults() {
        let env = jvm_env(None);
        assert_eq!(
            names(&env),
            vec!["JVM_GC_LOGGING", "JVM_USE_CONTAINER_LIMITS", "JVM_FLIGHT_RECORDER"]
        );
        assert!(env.iter().all(|var| var.value.as_deref() == Some("true")));
    }

    #[test]
    fn test_jvm_env_full() {
        let jvm = JvmSpec {
            args: Some(vec!["-Dfoo=bar".to_string(), "-Dx=y".to_string()]),
            debug: Some(JvmDebugSpec {
                enabled: Some(true),
                suspend: Some(true),
                attach: None,
                port: None,
            }),
            use_container_limits: Some(false),
            flight_recorder: Some(false),
            memory: Some(JvmMemorySpec {
                heap_size: Some("2g".to_string()),
                on_out_of_memory: Some(JvmOutOfMemorySpec {
                    exit: Some(true),
                    heap_dump: Some(false),
                }),
                ..Default::default()
            }),
            jmxmp: Some(JvmJmxmpSpec {
                enabled: Some(true),
                port: None,
            }),
            ..Default::default()
        };
        let env = jvm_env(Some(&jvm));

        assert_eq!(
            names(&env),
            vec![
                "JVM_DEBUG_ENABLED",
                "JVM_DEBUG_PORT",
                "JVM_DEBUG_SUSPEND",
                "JVM_ARGS",
                "JVM_HEAP_SIZE",
                "JVM_OOM_EXIT",
                "JVM_OOM_HEAP_DUMP",
                "JVM_JMXMP_ENABLED",
                "JVM_JMXMP_PORT",
                "JVM_GC_LOGGING",
                "JVM_USE_CONTAINER_LIMITS",
                "JVM_FLIGHT_RECORDER",
            ]
        );
        assert_eq!(value(&env, "JVM_DEBUG_PORT"), Some("5005"));
        assert_eq!(value(&env, "JVM_ARGS"), Some("-Dfoo=bar -Dx=y"));
        assert_eq!(value(&env, "JVM_JMXMP_PORT"), Some("9099"));
        assert_eq!(value(&env, "JVM_USE_CONTAINER_LIMITS"), Some("false"));
    }

    // -----------------------------------------------------------------------
    // Coherence
    // -----------------------------------------------------------------------

    #[test]
    fn test_disabled_endpoints() {
        let env = endpoints_env(&CoherenceSpec::default());
        assert_eq!(names(&env), vec!["COH_MGMT_ENABLED", "COH_METRICS_ENABLED"]);
        assert!(env.iter().all(|var| var.value.as_deref() == Some("false")));
    }

    #[test]
    fn test_management_with_ssl() {
        let coherence = CoherenceSpec {
            management: Some(PortSpecWithSsl {
                enabled: Some(true),
                port: None,
                ssl: Some(SslSpec {
                    enabled: Some(true),
                    secrets: Some("mgmt-certs".to_string()),
                    key_store: Some("keystore.jks".to_string()),
                    require_client_cert: Some(true),
                    ..Default::default()
                }),
            }),
            metrics: Some(PortSpecWithSsl {
                enabled: Some(true),
                port: Some(9000),
                ssl: None,
            }),
            ..Default::default()
        };
        let env = endpoints_env(&coherence);

        assert_eq!(
            names(&env),
            vec![
                "COH_MGMT_ENABLED",
                "COH_MGMT_SSL_ENABLED",
                "COH_MGMT_SSL_CERTS",
                "COH_MGMT_SSL_KEYSTORE",
                "COH_MGMT_SSL_REQUIRE_CLIENT_CERT",
                "COH_MGMT_PORT",
                "COH_METRICS_ENABLED",
                "COH_METRICS_PORT",
            ]
        );
        assert_eq!(value(&env, "COH_MGMT_SSL_CERTS"), Some("/coherence/certs/management"));
        assert_eq!(value(&env, "COH_MGMT_PORT"), Some("30000"));
        assert_eq!(value(&env, "COH_METRICS_PORT"), Some("9000"));
    }

    #[test]
    fn test_coherence_and_persistence_env() {
        let coherence = CoherenceSpec {
            cache_config: Some("cache-config.xml".to_string()),
            log_level: Some(9),
            storage_enabled: Some(false),
            persistence: Some(PersistentStorageSpec {
                enabled: Some(true),
                ..Default::default()
            }),
            snapshot: Some(PersistentStorageSpec {
                enabled: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let env = coherence_env(&coherence);
        assert_eq!(
            names(&env),
            vec!["COH_CACHE_CONFIG", "COH_LOG_LEVEL", "COH_STORAGE_ENABLED"]
        );
        assert_eq!(value(&env, "COH_STORAGE_ENABLED"), Some("false"));

        let env = persistence_env(&coherence);
        assert_eq!(names(&env), vec!["COH_PERSISTENCE_ENABLED"]);
    }

    // -----------------------------------------------------------------------
    // User overrides
    // -----------------------------------------------------------------------

    #[test]
    fn test_user_env_replaces_in_place_and_appends() {
        let generated = vec![env_var("A", "1"), env_var("B", "2")];
        let user = vec![env_var("B", "user"), env_var("C", "3")];
        let merged = merge_user_env(generated, Some(&user));

        assert_eq!(names(&merged), vec!["A", "B", "C"]);
        assert_eq!(value(&merged, "B"), Some("user"));
    }

    #[test]
    fn test_no_user_env_keeps_generated() {
        let generated = vec![env_var("A", "1")];
        assert_eq!(merge_user_env(generated.clone(), None), generated);
    }
}
