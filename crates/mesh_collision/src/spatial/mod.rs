//! Spatial partitioning data structures
//!
//! Provides the shallow area tree used to prune sweep and point queries
//! against a collision mesh's facets.

mod area_tree;

pub use area_tree::{AreaNode, AreaSplit, AreaTree, AreaTreeLimits, AreaWalk};
