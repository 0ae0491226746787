//! # Core Module
//!
//! Shared settings used by every collision subsystem.
//!
//! ## Organization
//!
//! - **Config**: limits and tolerances for plane pooling, facet building,
//!   the area tree and the pose cache

pub mod config;

pub use config::{
    CollisionConfig,
    MAX_PLANES,
    MAX_FACET_PLANES,
    AREA_DEPTH,
    AREA_NODES,
};
