//! Safe scaling policy
//!
//! Storage-enabled roles must not lose partitions while shrinking, so by
//! default their scale-down is serialized through the Status-HA probe, one
//! member at a time. Roles without storage scale freely.

use tracing::{info, warn};

use super::probe::{StatusHaProbe, StatusHaProber};
use super::resolver::ResolvedRole;
use crate::crd::{CoherenceRoleSpec, ScalingPolicy};

impl ScalingPolicy {
    /// The effective policy of a role
    ///
    /// An explicit policy always wins. Otherwise a role with storage enabled
    /// (or unspecified) scales `ParallelUpSafeDown` and a role with storage
    /// disabled scales `Parallel`. With no role at all the policy is `Safe`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use coherence_operator::crd::{CoherenceRoleSpec, ScalingPolicy};
    ///
    /// let role = CoherenceRoleSpec::default();
    /// assert_eq!(
    ///     ScalingPolicy::effective_for(Some(&role)),
    ///     ScalingPolicy::ParallelUpSafeDown
    /// );
    /// assert_eq!(ScalingPolicy::effective_for(None), ScalingPolicy::Safe);
    /// ```
    pub fn effective_for(role: Option<&CoherenceRoleSpec>) -> ScalingPolicy {
        let Some(role) = role else {
            return ScalingPolicy::Safe;
        };

        if let Some(policy) = role.scaling.as_ref().and_then(|scaling| scaling.policy) {
            return policy;
        }

        match role.coherence.as_ref().and_then(|c| c.storage_enabled) {
            Some(false) => ScalingPolicy::Parallel,
            _ => ScalingPolicy::ParallelUpSafeDown,
        }
    }
}

impl ResolvedRole {
    pub fn scaling_policy(&self) -> ScalingPolicy {
        ScalingPolicy::effective_for(Some(self.spec()))
    }
}

/// How a replica change must be carried out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalingPlan {
    NoChange,
    /// Go straight to the desired replica count
    Parallel { replicas: i32 },
    /// Move one member at a time towards `replicas`, confirming Status-HA before each step
    OneAtATime { replicas: i32 },
}

/// Plan a change from `current` to `desired` replicas under `policy`
pub fn plan_scaling(policy: ScalingPolicy, current: i32, desired: i32) -> ScalingPlan {
    if current == desired {
        return ScalingPlan::NoChange;
    }

    let scaling_down = desired < current;
    let serialized = match policy {
        ScalingPolicy::Safe => true,
        ScalingPolicy::ParallelUpSafeDown => scaling_down,
        ScalingPolicy::Parallel => false,
    };

    if serialized {
        ScalingPlan::OneAtATime { replicas: desired }
    } else {
        ScalingPlan::Parallel { replicas: desired }
    }
}

/// The next action for the reconciler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleStep {
    /// The role already has the desired replica count
    Done,
    /// Set the replica count to the given value
    ScaleTo(i32),
    /// The role is not Status-HA yet; try again later
    WaitForStatusHa,
}

/// Decide the next scaling step, consulting the Status-HA probe when required
///
/// A serialized change moves by exactly one member and only after the probe
/// confirms Status-HA. A failed probe counts as not Status-HA.
pub async fn next_scale_step<P>(
    prober: &P,
    role: &str,
    probe: &StatusHaProbe,
    policy: ScalingPolicy,
    current: i32,
    desired: i32,
) -> ScaleStep
where
    P: StatusHaProber + ?Sized,
{
    match plan_scaling(policy, current, desired) {
        ScalingPlan::NoChange => ScaleStep::Done,
        ScalingPlan::Parallel { replicas } => {
            info!(role, current, replicas, %policy, "Scaling role in parallel");
            ScaleStep::ScaleTo(replicas)
        }
        ScalingPlan::OneAtATime { replicas } => match prober.is_status_ha(role, probe).await {
            Ok(true) => {
                let next = if replicas < current {
                    current - 1
                } else {
                    current + 1
                };
                info!(role, current, next, target = replicas, %policy, "Role is Status-HA, scaling one member");
                ScaleStep::ScaleTo(next)
            }
            Ok(false) => {
                info!(role, current, target = replicas, "Role is not Status-HA, waiting to scale");
                ScaleStep::WaitForStatusHa
            }
            Err(e) => {
                warn!(role, error = %e, "Status-HA probe failed, waiting to scale");
                ScaleStep::WaitForStatusHa
            }
        },
    }
}
