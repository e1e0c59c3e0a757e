//! Coherence Operator: Kubernetes operator core for Coherence data-grid clusters
//!
//! This crate resolves CoherenceCluster role specifications against their
//! cluster defaults, synthesizes the Kubernetes resources of every role, and
//! decides how roles may be started and scaled safely.

pub mod controller;
pub mod crd;
pub mod error;

pub use crate::error::{Error, Result};
