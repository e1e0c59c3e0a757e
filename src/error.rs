//! Error types for the Coherence operator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// YAML parse or render error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid operator or cluster configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A container that must run has no image configured
    #[error("No image configured for container {container} in role {role}")]
    MissingImage { role: String, container: String },

    /// Two roles in one cluster resolve to the same name
    #[error("Duplicate role {0} in cluster")]
    DuplicateRole(String),

    /// The Status-HA probe could not be executed
    #[error("Status-HA probe failed: {0}")]
    ProbeError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
