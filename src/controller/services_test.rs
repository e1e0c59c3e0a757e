//! Unit tests for role Services.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    use crate::controller::resolver::{resolve_role, ClusterContext};
    use crate::controller::services::*;
    use crate::crd::{CoherenceRoleSpec, NamedPortSpec, ServiceSpec};

    fn port(name: &str, port: i32, service: Option<ServiceSpec>) -> NamedPortSpec {
        NamedPortSpec {
            name: name.to_string(),
            port: Some(port),
            service,
            ..Default::default()
        }
    }

    #[test]
    fn test_headless_service() {
        let cluster = ClusterContext::new("test-cluster");
        let role = resolve_role(&CoherenceRoleSpec::default(), None);
        let service = build_headless_service(&cluster, &role);

        assert_eq!(service.metadata.name.as_deref(), Some("test-cluster-storage"));
        assert_eq!(
            service.metadata.labels.as_ref().unwrap()["component"],
            "coherence-headless"
        );

        let spec = service.spec.unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("None"));
        assert_eq!(spec.publish_not_ready_addresses, Some(true));
        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some("coherence"));
        assert_eq!(ports[0].port, 7);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(7)));
        assert_eq!(spec.selector.unwrap()["component"], "coherencePod");
    }

    #[test]
    fn test_port_service_defaults() {
        let service = build_port_service("test-cluster", "data", &port("foo", 19, None)).unwrap();

        assert_eq!(service.metadata.name.as_deref(), Some("test-cluster-data-foo"));
        let labels = service.metadata.labels.unwrap();
        assert_eq!(labels["component"], "coherence-service-foo");
        assert_eq!(labels["coherenceRole"], "data");

        let spec = service.spec.unwrap();
        let ports = spec.ports.unwrap();
        assert_eq!(ports[0].name.as_deref(), Some("foo"));
        assert_eq!(ports[0].port, 19);
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
        assert_eq!(ports[0].target_port, Some(IntOrString::String("foo".to_string())));
        assert_eq!(spec.selector.unwrap()["coherenceRole"], "data");
    }

    #[test]
    fn test_port_service_overrides() {
        let mut labels = BTreeMap::new();
        labels.insert("expose".to_string(), "true".to_string());
        let service_spec = ServiceSpec {
            name: Some("extend-lb".to_string()),
            port: Some(9000),
            type_: Some("LoadBalancer".to_string()),
            labels: Some(labels),
            ip_family: Some("IPv6".to_string()),
            ..Default::default()
        };
        let mut named = port("extend", 20000, Some(service_spec));
        named.node_port = Some(30500);

        let service = build_port_service("c", "proxy", &named).unwrap();
        assert_eq!(service.metadata.name.as_deref(), Some("extend-lb"));
        assert_eq!(service.metadata.labels.unwrap()["expose"], "true");

        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("LoadBalancer"));
        assert_eq!(spec.ip_families, Some(vec!["IPv6".to_string()]));
        let ports = spec.ports.unwrap();
        assert_eq!(ports[0].port, 9000, "service port overrides the container port");
        assert_eq!(ports[0].node_port, Some(30500));
    }

    #[test]
    fn test_disabled_service_is_skipped() {
        let cluster = ClusterContext::new("c");
        let role = CoherenceRoleSpec {
            ports: Some(vec![
                port(
                    "internal",
                    1000,
                    Some(ServiceSpec {
                        enabled: Some(false),
                        ..Default::default()
                    }),
                ),
                port("public", 2000, None),
            ]),
            ..Default::default()
        };
        let services = build_port_services(&cluster, &resolve_role(&role, None));
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].metadata.name.as_deref(), Some("c-storage-public"));
    }
}
