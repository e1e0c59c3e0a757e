//! Status-HA probe model
//!
//! The operator only resolves which probe to run and how long it may take.
//! Running it is left to a [`StatusHaProber`] supplied by the caller.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::HTTPGetAction;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::resolver::ResolvedRole;
use crate::crd::{ProbeAction, ScalingProbe};
use crate::error::Result;

pub const STATUS_HA_PATH: &str = "/ha";
/// Name of the health container port
pub const HEALTH_PORT_NAME: &str = "health";
pub const DEFAULT_STATUS_HA_TIMEOUT_SECONDS: i32 = 10;
pub const MIN_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

impl ScalingProbe {
    /// `GET /ha` on the health port with a 10 second timeout
    pub fn default_status_ha() -> Self {
        ScalingProbe {
            action: Some(default_status_ha_action()),
            timeout_seconds: Some(DEFAULT_STATUS_HA_TIMEOUT_SECONDS),
        }
    }

    /// The effective timeout; unset or non-positive values become one second
    pub fn timeout(&self) -> Duration {
        match self.timeout_seconds {
            Some(seconds) if seconds > 0 => Duration::from_secs(seconds as u64),
            _ => MIN_PROBE_TIMEOUT,
        }
    }
}

fn default_status_ha_action() -> ProbeAction {
    ProbeAction::HttpGet(HTTPGetAction {
        path: Some(STATUS_HA_PATH.to_string()),
        port: IntOrString::String(HEALTH_PORT_NAME.to_string()),
        ..Default::default()
    })
}

/// A resolved Status-HA probe, ready to be executed against a member
#[derive(Clone, Debug, PartialEq)]
pub struct StatusHaProbe {
    pub action: ProbeAction,
    pub timeout: Duration,
}

impl ResolvedRole {
    /// The probe deciding whether this role is Status-HA
    ///
    /// Ports referenced by the name `health` are replaced with the role's
    /// numeric health port.
    pub fn status_ha_probe(&self) -> StatusHaProbe {
        let probe = self
            .spec()
            .scaling
            .as_ref()
            .and_then(|scaling| scaling.probe.clone())
            .unwrap_or_else(ScalingProbe::default_status_ha);

        let action = probe
            .action
            .clone()
            .unwrap_or_else(default_status_ha_action);

        StatusHaProbe {
            action: bind_health_port(action, self.health_port()),
            timeout: probe.timeout(),
        }
    }
}

fn bind_health_port(action: ProbeAction, health_port: i32) -> ProbeAction {
    let bind = |port: IntOrString| match port {
        IntOrString::String(name) if name == HEALTH_PORT_NAME => IntOrString::Int(health_port),
        other => other,
    };

    match action {
        ProbeAction::HttpGet(mut http) => {
            http.port = bind(http.port);
            ProbeAction::HttpGet(http)
        }
        ProbeAction::TcpSocket(mut tcp) => {
            tcp.port = bind(tcp.port);
            ProbeAction::TcpSocket(tcp)
        }
        exec @ ProbeAction::Exec(_) => exec,
    }
}

/// Executes Status-HA probes against the members of a role
///
/// Implementations own the transport, retries and the timeout carried by
/// the probe.
#[async_trait]
pub trait StatusHaProber: Send + Sync {
    async fn is_status_ha(&self, role: &str, probe: &StatusHaProbe) -> Result<bool>;
}
