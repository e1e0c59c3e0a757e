//! Start quorum evaluation
//!
//! A role with start quorum entries is only created once every dependency
//! role reports at least the configured number of ready members. Ready counts
//! are supplied by the caller; a role missing from them has no ready members.

use std::collections::BTreeMap;

use crate::crd::{StartQuorum, StartQuorumStatus};

fn ready_count(ready: &BTreeMap<String, i32>, role: &str) -> i32 {
    ready.get(role).copied().unwrap_or(0)
}

fn is_met(entry: &StartQuorum, ready: &BTreeMap<String, i32>) -> bool {
    ready_count(ready, &entry.role) >= entry.pod_count
}

/// True when every entry is met; no entries means no dependency
pub fn is_satisfied(entries: &[StartQuorum], ready: &BTreeMap<String, i32>) -> bool {
    entries.iter().all(|entry| is_met(entry, ready))
}

/// The state of each entry, in declaration order
pub fn quorum_status(
    entries: &[StartQuorum],
    ready: &BTreeMap<String, i32>,
) -> Vec<StartQuorumStatus> {
    entries
        .iter()
        .map(|entry| StartQuorumStatus {
            quorum: entry.clone(),
            ready: is_met(entry, ready),
        })
        .collect()
}
