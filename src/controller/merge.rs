//! Generic merge rules for optional configuration values
//!
//! In every function the first argument is the primary value (the role's own
//! setting) and the second the fallback (the cluster default). A `None` result
//! means the value was never configured on either side; merging never turns an
//! absent value into an empty one or the other way round.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    EnvVar, HostAlias, PersistentVolumeClaim, PodDNSConfigOption, Toleration, Volume, VolumeMount,
};

use crate::crd::NamedPortSpec;

/// A configuration section that can be completed from a fallback of the same type
///
/// Implementations copy every field set on `self` and take the remaining ones
/// from `fallback`, recursing into nested sections.
pub trait Resolve: Clone {
    fn resolve_with(&self, fallback: &Self) -> Self;
}

/// Resolve an optional section against an optional fallback section
///
/// A missing primary section defers entirely to a copy of the fallback.
pub fn resolve_section<T: Resolve>(primary: &Option<T>, fallback: &Option<T>) -> Option<T> {
    match (primary, fallback) {
        (None, None) => None,
        (Some(primary), None) => Some(primary.clone()),
        (None, Some(fallback)) => Some(fallback.clone()),
        (Some(primary), Some(fallback)) => Some(primary.resolve_with(fallback)),
    }
}

pub fn merge_scalar<T: Clone>(primary: &Option<T>, fallback: &Option<T>) -> Option<T> {
    primary.clone().or_else(|| fallback.clone())
}

/// Merge two string maps, primary entries winning
///
/// An empty value in the primary map removes the key from the result even
/// when the fallback defines it. Empty values in the fallback are dropped.
pub fn merge_map(
    primary: &Option<BTreeMap<String, String>>,
    fallback: &Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    if primary.is_none() && fallback.is_none() {
        return None;
    }

    let mut merged = BTreeMap::new();
    if let Some(fallback) = fallback {
        for (key, value) in fallback.iter().filter(|(_, value)| !value.is_empty()) {
            merged.insert(key.clone(), value.clone());
        }
    }
    if let Some(primary) = primary {
        for (key, value) in primary {
            if value.is_empty() {
                merged.remove(key);
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Some(merged)
}

/// Elements of a list that is merged by key
pub trait Named {
    fn merge_key(&self) -> String;
}

/// Merge two lists keyed by name
///
/// The result is the primary list in its original order, with elements whose
/// key also appears in the fallback combined through `combine(primary, fallback)`,
/// followed by the fallback-only elements in their original order.
pub fn merge_named_list<T, F>(
    primary: &Option<Vec<T>>,
    fallback: &Option<Vec<T>>,
    combine: F,
) -> Option<Vec<T>>
where
    T: Named + Clone,
    F: Fn(&T, &T) -> T,
{
    match (primary, fallback) {
        (None, None) => None,
        (Some(primary), None) => Some(primary.clone()),
        (None, Some(fallback)) => Some(fallback.clone()),
        (Some(primary), Some(fallback)) => {
            let mut merged = primary.clone();
            for item in fallback {
                let key = item.merge_key();
                match primary.iter().position(|p| p.merge_key() == key) {
                    Some(index) => merged[index] = combine(&merged[index], item),
                    None => merged.push(item.clone()),
                }
            }
            Some(merged)
        }
    }
}

/// Merge a named list of platform objects, a primary element replacing its fallback whole
pub fn merge_atomic_list<T: Named + Clone>(
    primary: &Option<Vec<T>>,
    fallback: &Option<Vec<T>>,
) -> Option<Vec<T>> {
    merge_named_list(primary, fallback, |primary, _| primary.clone())
}

/// Union of two string lists: primary entries first, then unseen fallback entries
pub fn merge_string_set(
    primary: &Option<Vec<String>>,
    fallback: &Option<Vec<String>>,
) -> Option<Vec<String>> {
    match (primary, fallback) {
        (None, None) => None,
        (Some(primary), None) => Some(primary.clone()),
        (None, Some(fallback)) => Some(fallback.clone()),
        (Some(primary), Some(fallback)) => {
            let mut merged = primary.clone();
            for value in fallback {
                if !merged.contains(value) {
                    merged.push(value.clone());
                }
            }
            Some(merged)
        }
    }
}

/// Fallback values followed by primary values, e.g. cluster JVM args then role JVM args
pub fn concat_lists<T: Clone>(primary: &Option<Vec<T>>, fallback: &Option<Vec<T>>) -> Option<Vec<T>> {
    match (primary, fallback) {
        (None, None) => None,
        (Some(primary), None) => Some(primary.clone()),
        (None, Some(fallback)) => Some(fallback.clone()),
        (Some(primary), Some(fallback)) => {
            Some(fallback.iter().chain(primary.iter()).cloned().collect())
        }
    }
}

impl Named for NamedPortSpec {
    fn merge_key(&self) -> String {
        self.name.clone()
    }
}

impl Named for EnvVar {
    fn merge_key(&self) -> String {
        self.name.clone()
    }
}

impl Named for Volume {
    fn merge_key(&self) -> String {
        self.name.clone()
    }
}

impl Named for VolumeMount {
    fn merge_key(&self) -> String {
        self.name.clone()
    }
}

impl Named for PersistentVolumeClaim {
    fn merge_key(&self) -> String {
        self.metadata.name.clone().unwrap_or_default()
    }
}

impl Named for Toleration {
    fn merge_key(&self) -> String {
        format!(
            "{}:{}",
            self.key.as_deref().unwrap_or_default(),
            self.effect.as_deref().unwrap_or_default()
        )
    }
}

impl Named for HostAlias {
    fn merge_key(&self) -> String {
        self.ip.clone().unwrap_or_default()
    }
}

impl Named for PodDNSConfigOption {
    fn merge_key(&self) -> String {
        self.name.clone().unwrap_or_default()
    }
}
