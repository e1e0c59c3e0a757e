//! Unit tests for scaling policy resolution and safe scaling steps.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::controller::probe::{StatusHaProbe, StatusHaProber};
    use crate::controller::resolver::resolve_role;
    use crate::controller::scaling::{next_scale_step, plan_scaling, ScaleStep, ScalingPlan};
    use crate::crd::{CoherenceRoleSpec, CoherenceSpec, ScalingPolicy, ScalingSpec};
    use crate::error::{Error, Result};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn role(storage_enabled: Option<bool>, policy: Option<ScalingPolicy>) -> CoherenceRoleSpec {
        CoherenceRoleSpec {
            coherence: Some(CoherenceSpec {
                storage_enabled,
                ..Default::default()
            }),
            scaling: policy.map(|policy| ScalingSpec {
                policy: Some(policy),
                probe: None,
            }),
            ..Default::default()
        }
    }

    /// Prober returning a fixed answer and counting invocations
    struct FixedProber {
        answer: Option<bool>,
        calls: AtomicUsize,
    }

    impl FixedProber {
        fn new(answer: Option<bool>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusHaProber for FixedProber {
        async fn is_status_ha(&self, _role: &str, _probe: &StatusHaProbe) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .ok_or_else(|| Error::ProbeError("connection refused".to_string()))
        }
    }

    fn probe() -> StatusHaProbe {
        resolve_role(&CoherenceRoleSpec::default(), None).status_ha_probe()
    }

    // -----------------------------------------------------------------------
    // Effective policy
    // -----------------------------------------------------------------------

    #[test]
    fn test_no_role_is_safe() {
        assert_eq!(ScalingPolicy::effective_for(None), ScalingPolicy::Safe);
    }

    #[test]
    fn test_storage_unset_is_parallel_up_safe_down() {
        assert_eq!(
            ScalingPolicy::effective_for(Some(&role(None, None))),
            ScalingPolicy::ParallelUpSafeDown
        );
        assert_eq!(
            ScalingPolicy::effective_for(Some(&CoherenceRoleSpec::default())),
            ScalingPolicy::ParallelUpSafeDown,
            "a role without a coherence section holds storage"
        );
    }

    #[test]
    fn test_storage_enabled_is_parallel_up_safe_down() {
        assert_eq!(
            ScalingPolicy::effective_for(Some(&role(Some(true), None))),
            ScalingPolicy::ParallelUpSafeDown
        );
    }

    #[test]
    fn test_storage_disabled_is_parallel() {
        assert_eq!(
            ScalingPolicy::effective_for(Some(&role(Some(false), None))),
            ScalingPolicy::Parallel
        );
    }

    #[test]
    fn test_explicit_policy_always_wins() {
        for storage in [None, Some(true), Some(false)] {
            for policy in [
                ScalingPolicy::Safe,
                ScalingPolicy::Parallel,
                ScalingPolicy::ParallelUpSafeDown,
            ] {
                assert_eq!(
                    ScalingPolicy::effective_for(Some(&role(storage, Some(policy)))),
                    policy,
                    "explicit {policy} with storage {storage:?}"
                );
            }
        }
    }

    #[test]
    fn test_resolved_role_policy_uses_defaults() {
        let defaults = role(Some(false), None);
        let resolved = resolve_role(&CoherenceRoleSpec::default(), Some(&defaults));
        assert_eq!(resolved.scaling_policy(), ScalingPolicy::Parallel);
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(
            ScalingPolicy::ParallelUpSafeDown.to_string(),
            "ParallelUpSafeDown"
        );
    }

    // -----------------------------------------------------------------------
    // Plans
    // -----------------------------------------------------------------------

    #[test]
    fn test_plan_no_change() {
        assert_eq!(
            plan_scaling(ScalingPolicy::Safe, 3, 3),
            ScalingPlan::NoChange
        );
    }

    #[test]
    fn test_plan_parallel_up_safe_down() {
        assert_eq!(
            plan_scaling(ScalingPolicy::ParallelUpSafeDown, 3, 6),
            ScalingPlan::Parallel { replicas: 6 }
        );
        assert_eq!(
            plan_scaling(ScalingPolicy::ParallelUpSafeDown, 6, 3),
            ScalingPlan::OneAtATime { replicas: 3 }
        );
    }

    #[test]
    fn test_plan_safe_serializes_both_directions() {
        assert_eq!(
            plan_scaling(ScalingPolicy::Safe, 3, 6),
            ScalingPlan::OneAtATime { replicas: 6 }
        );
        assert_eq!(
            plan_scaling(ScalingPolicy::Safe, 6, 3),
            ScalingPlan::OneAtATime { replicas: 3 }
        );
    }

    #[test]
    fn test_plan_parallel_never_serializes() {
        assert_eq!(
            plan_scaling(ScalingPolicy::Parallel, 6, 1),
            ScalingPlan::Parallel { replicas: 1 }
        );
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_safe_scale_down_removes_one_member_when_status_ha() {
        let prober = FixedProber::new(Some(true));
        let step = next_scale_step(
            &prober,
            "storage",
            &probe(),
            ScalingPolicy::ParallelUpSafeDown,
            6,
            3,
        )
        .await;
        assert_eq!(step, ScaleStep::ScaleTo(5));
        assert_eq!(prober.calls(), 1);
    }

    #[tokio::test]
    async fn test_safe_scale_down_waits_when_not_status_ha() {
        let prober = FixedProber::new(Some(false));
        let step = next_scale_step(&prober, "storage", &probe(), ScalingPolicy::Safe, 6, 3).await;
        assert_eq!(step, ScaleStep::WaitForStatusHa);
    }

    #[test]
    fn test_probe_failure_waits() {
        let prober = FixedProber::new(None);
        let step = tokio_test::block_on(next_scale_step(
            &prober,
            "storage",
            &probe(),
            ScalingPolicy::Safe,
            6,
            3,
        ));
        assert_eq!(step, ScaleStep::WaitForStatusHa);
        assert_eq!(prober.calls(), 1);
    }

    #[test]
    fn test_safe_scale_up_adds_one_member() {
        let prober = FixedProber::new(Some(true));
        let step = tokio_test::block_on(next_scale_step(
            &prober,
            "storage",
            &probe(),
            ScalingPolicy::Safe,
            3,
            6,
        ));
        assert_eq!(step, ScaleStep::ScaleTo(4));
    }

    #[tokio::test]
    async fn test_parallel_scaling_skips_probe() {
        let prober = FixedProber::new(Some(false));
        let step = next_scale_step(
            &prober,
            "proxy",
            &probe(),
            ScalingPolicy::ParallelUpSafeDown,
            3,
            6,
        )
        .await;
        assert_eq!(step, ScaleStep::ScaleTo(6));
        assert_eq!(prober.calls(), 0, "parallel scale-up must not probe");
    }

    #[test]
    fn test_done_when_at_desired_replicas() {
        let prober = FixedProber::new(Some(true));
        let step = tokio_test::block_on(next_scale_step(
            &prober,
            "storage",
            &probe(),
            ScalingPolicy::Safe,
            3,
            3,
        ));
        assert_eq!(step, ScaleStep::Done);
        assert_eq!(prober.calls(), 0);
    }
}
