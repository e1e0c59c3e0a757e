//! Unit tests for the Status-HA probe model.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use k8s_openapi::api::core::v1::{ExecAction, HTTPGetAction, TCPSocketAction};
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    use crate::controller::probe::*;
    use crate::controller::resolver::resolve_role;
    use crate::crd::{CoherenceRoleSpec, ProbeAction, ScalingProbe, ScalingSpec};

    fn role_with_probe(probe: Option<ScalingProbe>, health_port: Option<i32>) -> CoherenceRoleSpec {
        CoherenceRoleSpec {
            health_port,
            scaling: Some(ScalingSpec {
                policy: None,
                probe,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_timeout_floor() {
        let probe = |timeout_seconds| ScalingProbe {
            action: None,
            timeout_seconds,
        };
        assert_eq!(probe(None).timeout(), Duration::from_secs(1));
        assert_eq!(probe(Some(0)).timeout(), Duration::from_secs(1));
        assert_eq!(probe(Some(-5)).timeout(), Duration::from_secs(1));
        assert_eq!(probe(Some(30)).timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_probe() {
        let probe = ScalingProbe::default_status_ha();
        assert_eq!(probe.timeout(), Duration::from_secs(10));
        match probe.action {
            Some(ProbeAction::HttpGet(http)) => {
                assert_eq!(http.path.as_deref(), Some(STATUS_HA_PATH));
                assert_eq!(http.port, IntOrString::String(HEALTH_PORT_NAME.to_string()));
            }
            other => panic!("expected httpGet action, got {other:?}"),
        }
    }

    #[test]
    fn test_status_ha_probe_defaults_bind_health_port() {
        let resolved = resolve_role(&CoherenceRoleSpec::default(), None);
        let probe = resolved.status_ha_probe();

        assert_eq!(probe.timeout, Duration::from_secs(10));
        assert_eq!(
            probe.action,
            ProbeAction::HttpGet(HTTPGetAction {
                path: Some("/ha".to_string()),
                port: IntOrString::Int(6676),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_status_ha_probe_uses_role_health_port() {
        let resolved = resolve_role(&role_with_probe(None, Some(7000)), None);
        match resolved.status_ha_probe().action {
            ProbeAction::HttpGet(http) => assert_eq!(http.port, IntOrString::Int(7000)),
            other => panic!("expected httpGet action, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_tcp_probe_keeps_numeric_port() {
        let probe = ScalingProbe {
            action: Some(ProbeAction::TcpSocket(TCPSocketAction {
                port: IntOrString::Int(9000),
                ..Default::default()
            })),
            timeout_seconds: Some(0),
        };
        let resolved = resolve_role(&role_with_probe(Some(probe), None), None);
        let status_ha = resolved.status_ha_probe();

        assert_eq!(
            status_ha.action,
            ProbeAction::TcpSocket(TCPSocketAction {
                port: IntOrString::Int(9000),
                ..Default::default()
            })
        );
        assert_eq!(status_ha.timeout, MIN_PROBE_TIMEOUT, "zero timeout is clamped");
    }

    #[test]
    fn test_probe_with_only_timeout_keeps_default_action() {
        let probe = ScalingProbe {
            action: None,
            timeout_seconds: Some(3),
        };
        let resolved = resolve_role(&role_with_probe(Some(probe), None), None);
        let status_ha = resolved.status_ha_probe();

        assert!(matches!(status_ha.action, ProbeAction::HttpGet(_)));
        assert_eq!(status_ha.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_exec_probe_is_unchanged() {
        let exec = ProbeAction::Exec(ExecAction {
            command: Some(vec!["/bin/check-ha".to_string()]),
        });
        let probe = ScalingProbe {
            action: Some(exec.clone()),
            timeout_seconds: Some(5),
        };
        let resolved = resolve_role(&role_with_probe(Some(probe), None), None);
        assert_eq!(resolved.status_ha_probe().action, exec);
    }
}
