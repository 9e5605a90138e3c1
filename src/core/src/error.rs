use thiserror::Error;

/// krar error types
#[derive(Error, Debug)]
pub enum KrarError {
    /// Invalid or incomplete run configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required external capability is unavailable
    #[error("Capability error: {0}")]
    Capability(String),

    /// Kubernetes API error
    #[error("Cluster error: {0}")]
    Cluster(String),

    /// Container registry error
    #[error("Registry error: {registry}: {message}")]
    Registry {
        registry: String,
        message: String,
    },

    /// Malformed resource or image reference
    #[error("Invalid reference '{reference}': {message}")]
    InvalidReference {
        reference: String,
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for KrarError {
    fn from(err: serde_json::Error) -> Self {
        KrarError::Serialization(err.to_string())
    }
}

impl KrarError {
    /// Whether this error must terminate the run with a non-zero exit.
    ///
    /// Only configuration and capability errors are fatal; everything else
    /// is recovered per item so the run can make forward progress.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KrarError::InvalidConfig(_) | KrarError::Capability(_)
        )
    }
}

/// Result type alias for krar operations
pub type Result<T> = std::result::Result<T, KrarError>;
