//! Unit tests for resource naming and labels.

#[cfg(test)]
mod tests {
    use crate::controller::naming::*;

    #[test]
    fn test_full_role_name() {
        assert_eq!(full_role_name("test-cluster", "storage"), "test-cluster-storage");
    }

    #[test]
    fn test_wka_service_name() {
        assert_eq!(wka_service_name("test-cluster"), "test-cluster-wka");
    }

    #[test]
    fn test_port_service_name_and_component() {
        assert_eq!(
            port_service_name("test-cluster", "proxy", "extend"),
            "test-cluster-proxy-extend"
        );
        assert_eq!(port_service_component("extend"), "coherence-service-extend");
    }

    #[test]
    fn test_efk_config_map_name() {
        assert_eq!(
            efk_config_map_name("test-cluster-storage"),
            "test-cluster-storage-efk-config"
        );
    }

    #[test]
    fn test_common_labels() {
        let labels = common_labels("test-cluster", "storage");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(LABEL_DEPLOYMENT).unwrap(), "test-cluster-storage");
        assert_eq!(labels.get(LABEL_CLUSTER).unwrap(), "test-cluster");
        assert_eq!(labels.get(LABEL_ROLE).unwrap(), "storage");
        assert!(!labels.contains_key(LABEL_COMPONENT));
    }

    #[test]
    fn test_pod_selector_labels() {
        let labels = pod_selector_labels("test-cluster", "storage");
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.get(LABEL_COMPONENT).unwrap(), COMPONENT_POD);
    }

    #[test]
    fn test_labels_are_deterministic() {
        assert_eq!(
            component_labels("c", "r", COMPONENT_VOLUME),
            component_labels("c", "r", COMPONENT_VOLUME),
            "label sets must be identical across passes"
        );
    }
}
