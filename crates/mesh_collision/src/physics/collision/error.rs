//! Collision mesh errors
//!
//! Every variant here degrades to "no collision" at the gameplay boundary;
//! only the builder and configuration APIs surface them directly.

use crate::config::ConfigError;

/// Errors produced while building or configuring collision meshes
#[derive(thiserror::Error, Debug)]
pub enum CollisionError {
    /// The plane pool has no free slots left
    #[error("plane pool is full ({limit} planes)")]
    CapacityExceeded {
        /// Configured pool capacity
        limit: usize,
    },

    /// A build finished without a single usable facet
    #[error("collision mesh '{name}' has no usable facets")]
    EmptyMesh {
        /// Debug name given to the build
        name: String,
    },

    /// Triangle with (near) zero area
    #[error("degenerate triangle")]
    DegenerateTriangle,

    /// Plane normal with zero length or non-finite components
    #[error("degenerate plane normal")]
    DegeneratePlane,

    /// A configuration value is out of range
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Loading or saving configuration failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CollisionError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias for collision mesh operations
pub type CollisionResult<T> = Result<T, CollisionError>;
