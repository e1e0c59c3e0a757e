//! Resource names and label sets
//!
//! Names and labels are pure functions of the cluster name, the role name and
//! an optional discriminator. Deployed clusters select on these values, so
//! they must not change.

use std::collections::BTreeMap;

/// Label holding the full role name (`<cluster>-<role>`)
pub const LABEL_DEPLOYMENT: &str = "coherenceDeployment";
pub const LABEL_CLUSTER: &str = "coherenceCluster";
pub const LABEL_ROLE: &str = "coherenceRole";
/// Discriminates the kind of resource a label set belongs to
pub const LABEL_COMPONENT: &str = "component";
/// Whether a pod takes part in well-known-address discovery
pub const LABEL_WKA_MEMBER: &str = "coherenceWKAMember";

pub const COMPONENT_STATEFULSET: &str = "coherence";
pub const COMPONENT_POD: &str = "coherencePod";
pub const COMPONENT_HEADLESS_SERVICE: &str = "coherence-headless";
pub const COMPONENT_VOLUME: &str = "coherence-volume";
pub const COMPONENT_EFK_CONFIG: &str = "coherence-efk-config";

pub const DEFAULT_ROLE_NAME: &str = "storage";
pub const WKA_SERVICE_SUFFIX: &str = "-wka";

/// `<cluster>-<role>`, the name of the StatefulSet and its headless Service
pub fn full_role_name(cluster: &str, role: &str) -> String {
    format!("{cluster}-{role}")
}

/// Default name of the well-known-address Service of a cluster
pub fn wka_service_name(cluster: &str) -> String {
    format!("{cluster}{WKA_SERVICE_SUFFIX}")
}

pub fn efk_config_map_name(full_role_name: &str) -> String {
    format!("{full_role_name}-efk-config")
}

pub fn port_service_name(cluster: &str, role: &str, port: &str) -> String {
    format!("{}-{}", full_role_name(cluster, role), port)
}

pub fn port_service_component(port: &str) -> String {
    format!("coherence-service-{port}")
}

/// Labels shared by every resource of a role
pub fn common_labels(cluster: &str, role: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_DEPLOYMENT.to_string(), full_role_name(cluster, role));
    labels.insert(LABEL_CLUSTER.to_string(), cluster.to_string());
    labels.insert(LABEL_ROLE.to_string(), role.to_string());
    labels
}

/// Common labels plus the component discriminator
pub fn component_labels(cluster: &str, role: &str, component: &str) -> BTreeMap<String, String> {
    let mut labels = common_labels(cluster, role);
    labels.insert(LABEL_COMPONENT.to_string(), component.to_string());
    labels
}

/// Labels selecting the pods of a role
pub fn pod_selector_labels(cluster: &str, role: &str) -> BTreeMap<String, String> {
    component_labels(cluster, role, COMPONENT_POD)
}
