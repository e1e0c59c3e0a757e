//! Services of a role: the headless discovery Service and one Service per named port

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec as K8sServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::naming::{
    component_labels, full_role_name, pod_selector_labels, port_service_component,
    port_service_name, COMPONENT_HEADLESS_SERVICE,
};
use super::resolver::{ClusterContext, ResolvedRole};
use super::resources::{COHERENCE_PORT, PORT_NAME_COHERENCE};
use crate::crd::NamedPortSpec;

/// Headless Service that gives every member a stable DNS name
pub fn build_headless_service(cluster: &ClusterContext, role: &ResolvedRole) -> Service {
    let role_name = role.role_name();

    Service {
        metadata: ObjectMeta {
            name: Some(full_role_name(&cluster.name, role_name)),
            labels: Some(component_labels(
                &cluster.name,
                role_name,
                COMPONENT_HEADLESS_SERVICE,
            )),
            ..Default::default()
        },
        spec: Some(K8sServiceSpec {
            cluster_ip: Some("None".to_string()),
            publish_not_ready_addresses: Some(true),
            ports: Some(vec![ServicePort {
                name: Some(PORT_NAME_COHERENCE.to_string()),
                protocol: Some("TCP".to_string()),
                port: COHERENCE_PORT,
                target_port: Some(IntOrString::Int(COHERENCE_PORT)),
                ..Default::default()
            }]),
            selector: Some(pod_selector_labels(&cluster.name, role_name)),
            ..Default::default()
        }),
        status: None,
    }
}

/// Services for every named port whose Service is not disabled, in port order
pub fn build_port_services(cluster: &ClusterContext, role: &ResolvedRole) -> Vec<Service> {
    role.spec()
        .ports
        .iter()
        .flatten()
        .filter_map(|port| build_port_service(&cluster.name, role.role_name(), port))
        .collect()
}

/// Build the Service of a named port, `None` when its Service is disabled
///
/// The Service targets the container port by name, so the service port may
/// differ from the container port.
pub fn build_port_service(cluster: &str, role: &str, port: &NamedPortSpec) -> Option<Service> {
    if !port.is_service_enabled() {
        return None;
    }
    let service = port.service.clone().unwrap_or_default();

    let name = service
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| port_service_name(cluster, role, &port.name));

    let mut labels = component_labels(cluster, role, &port_service_component(&port.name));
    if let Some(extra) = &service.labels {
        labels.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    Some(Service {
        metadata: ObjectMeta {
            name: Some(name),
            labels: Some(labels),
            annotations: service.annotations.clone().filter(|a| !a.is_empty()),
            ..Default::default()
        },
        spec: Some(K8sServiceSpec {
            type_: service.type_.clone(),
            cluster_ip: service.cluster_ip.clone(),
            external_ips: service.external_ips.clone(),
            load_balancer_ip: service.load_balancer_ip.clone(),
            load_balancer_source_ranges: service.load_balancer_source_ranges.clone(),
            session_affinity: service.session_affinity.clone(),
            session_affinity_config: service.session_affinity_config.clone(),
            external_name: service.external_name.clone(),
            external_traffic_policy: service.external_traffic_policy.clone(),
            health_check_node_port: service.health_check_node_port,
            publish_not_ready_addresses: service.publish_not_ready_addresses,
            ip_families: service.ip_family.clone().map(|family| vec![family]),
            ports: Some(vec![ServicePort {
                name: Some(port.name.clone()),
                protocol: Some(port.protocol()),
                port: port.service_port(),
                target_port: Some(IntOrString::String(port.name.clone())),
                node_port: port.node_port,
                ..Default::default()
            }]),
            selector: Some(pod_selector_labels(cluster, role)),
            ..Default::default()
        }),
        status: None,
    })
}
