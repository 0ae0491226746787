//! # Collision Configuration
//!
//! Limits and tolerances for collision mesh construction and caching.
//!
//! Limits travel with the builder instead of living in globals, so a test or
//! a tool can shrink the plane pool or the area tree locally. The defaults
//! are the constants below.
//!
//! ```rust,no_run
//! use mesh_collision::config::Config;
//! use mesh_collision::core::CollisionConfig;
//!
//! let config = CollisionConfig::load_from_file("collision.toml")
//!     .unwrap_or_default()
//!     .with_area_depth(3);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::physics::collision::{CollisionError, CollisionResult};

/// Hard ceiling on pooled planes per mesh
pub const MAX_PLANES: usize = 65536;

/// Maximum number of bounding planes on a single facet
pub const MAX_FACET_PLANES: usize = 32;

/// Maximum depth of the area tree
pub const AREA_DEPTH: usize = 4;

/// Node budget of the area tree
pub const AREA_NODES: usize = 32;

/// Planes emitted for one triangle: surface, back cap, three edge walls
pub const PLANES_PER_TRIANGLE: usize = 5;

/// # Collision Configuration
///
/// Explicit limits and float tolerances used by the plane pool, facet
/// builder, area tree and mesh cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Plane pool capacity
    pub max_planes: usize,
    /// Per-facet plane cap
    pub max_facet_planes: usize,
    /// Maximum area tree depth (root is depth 0)
    pub area_depth: usize,
    /// Maximum number of area tree nodes
    pub area_nodes: usize,
    /// Nodes holding this many facets or fewer are not split further
    pub area_leaf_facets: usize,
    /// Per-component normal tolerance when deduplicating planes
    pub plane_normal_epsilon: f32,
    /// Distance tolerance when deduplicating planes
    pub plane_dist_epsilon: f32,
    /// Depth of the back cap behind each triangle
    pub facet_thickness: f32,
    /// Outward offset applied to the edge wall planes
    pub edge_bevel_offset: f32,
    /// Triangles whose area is below this are skipped
    pub degenerate_area_epsilon: f32,
    /// Origin tolerance for cache validity
    pub pose_origin_epsilon: f32,
    /// Angle tolerance in degrees for cache validity
    pub pose_angle_epsilon: f32,
}

impl CollisionConfig {
    /// Create a configuration with the default limits and tolerances
    pub fn new() -> Self {
        Self {
            max_planes: MAX_PLANES,
            max_facet_planes: MAX_FACET_PLANES,
            area_depth: AREA_DEPTH,
            area_nodes: AREA_NODES,
            area_leaf_facets: 4,
            plane_normal_epsilon: 1e-4,
            plane_dist_epsilon: 0.01,
            facet_thickness: 0.125,
            edge_bevel_offset: 0.031_25,
            degenerate_area_epsilon: 1e-6,
            pose_origin_epsilon: 1e-3,
            pose_angle_epsilon: 1e-2,
        }
    }

    /// Set the plane pool capacity
    pub fn with_max_planes(mut self, max_planes: usize) -> Self {
        self.max_planes = max_planes;
        self
    }

    /// Set the maximum area tree depth
    pub fn with_area_depth(mut self, depth: usize) -> Self {
        self.area_depth = depth;
        self
    }

    /// Set the area tree node budget
    pub fn with_area_nodes(mut self, nodes: usize) -> Self {
        self.area_nodes = nodes;
        self
    }

    /// Set how many facets a node may hold before it is split
    pub fn with_area_leaf_facets(mut self, facets: usize) -> Self {
        self.area_leaf_facets = facets;
        self
    }

    /// Set the plane deduplication tolerances
    pub fn with_plane_epsilons(mut self, normal_epsilon: f32, dist_epsilon: f32) -> Self {
        self.plane_normal_epsilon = normal_epsilon;
        self.plane_dist_epsilon = dist_epsilon;
        self
    }

    /// Set the facet back-cap thickness
    pub fn with_facet_thickness(mut self, thickness: f32) -> Self {
        self.facet_thickness = thickness;
        self
    }

    /// Set the outward offset of the edge wall planes
    pub fn with_edge_bevel_offset(mut self, offset: f32) -> Self {
        self.edge_bevel_offset = offset;
        self
    }

    /// Set the area below which triangles are skipped as degenerate
    pub fn with_degenerate_area_epsilon(mut self, epsilon: f32) -> Self {
        self.degenerate_area_epsilon = epsilon;
        self
    }

    /// Set the pose cache tolerances
    pub fn with_pose_epsilons(mut self, origin_epsilon: f32, angle_epsilon: f32) -> Self {
        self.pose_origin_epsilon = origin_epsilon;
        self.pose_angle_epsilon = angle_epsilon;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> CollisionResult<()> {
        if self.max_planes == 0 {
            return Err(CollisionError::invalid_config("max_planes", "must be at least 1"));
        }

        if self.max_planes > MAX_PLANES {
            return Err(CollisionError::invalid_config(
                "max_planes",
                format!("must not exceed {MAX_PLANES}"),
            ));
        }

        if self.max_facet_planes < PLANES_PER_TRIANGLE {
            return Err(CollisionError::invalid_config(
                "max_facet_planes",
                format!("a triangle facet needs {PLANES_PER_TRIANGLE} planes"),
            ));
        }

        if self.area_nodes == 0 {
            return Err(CollisionError::invalid_config("area_nodes", "must be at least 1"));
        }

        let tolerances = [
            ("plane_normal_epsilon", self.plane_normal_epsilon),
            ("plane_dist_epsilon", self.plane_dist_epsilon),
            ("facet_thickness", self.facet_thickness),
            ("edge_bevel_offset", self.edge_bevel_offset),
            ("degenerate_area_epsilon", self.degenerate_area_epsilon),
            ("pose_origin_epsilon", self.pose_origin_epsilon),
            ("pose_angle_epsilon", self.pose_angle_epsilon),
        ];
        for (field, value) in tolerances {
            if !value.is_finite() || value <= 0.0 {
                return Err(CollisionError::invalid_config(
                    field,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }

        Ok(())
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for CollisionConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mesh_collision_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_defaults_match_engine_constants() {
        let config = CollisionConfig::default();
        assert_eq!(config.max_planes, 65536);
        assert_eq!(config.max_facet_planes, 32);
        assert_eq!(config.area_depth, 4);
        assert_eq!(config.area_nodes, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CollisionConfig::default().with_max_planes(0);
        assert!(matches!(
            config.validate(),
            Err(CollisionError::InvalidConfig { field: "max_planes", .. })
        ));

        let config = CollisionConfig::default().with_max_planes(MAX_PLANES + 1);
        assert!(config.validate().is_err());

        let config = CollisionConfig::default().with_plane_epsilons(0.0, 0.01);
        assert!(matches!(
            config.validate(),
            Err(CollisionError::InvalidConfig { field: "plane_normal_epsilon", .. })
        ));

        let config = CollisionConfig::default().with_facet_thickness(f32::NAN);
        assert!(config.validate().is_err());

        let mut config = CollisionConfig::default();
        config.max_facet_planes = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bevel_and_area_setters() {
        let config = CollisionConfig::default()
            .with_edge_bevel_offset(0.5)
            .with_degenerate_area_epsilon(1e-3);
        assert_relative_eq!(config.edge_bevel_offset, 0.5);
        assert_relative_eq!(config.degenerate_area_epsilon, 1e-3);
        assert!(config.validate().is_ok());

        let config = CollisionConfig::default().with_edge_bevel_offset(-0.1);
        assert!(matches!(
            config.validate(),
            Err(CollisionError::InvalidConfig { field: "edge_bevel_offset", .. })
        ));

        let config = CollisionConfig::default().with_degenerate_area_epsilon(0.0);
        assert!(matches!(
            config.validate(),
            Err(CollisionError::InvalidConfig { field: "degenerate_area_epsilon", .. })
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_path("config.toml");
        let config = CollisionConfig::default().with_area_depth(2).with_max_planes(128);
        config.save_to_file(&path).unwrap();

        let loaded = CollisionConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_round_trip() {
        let path = temp_path("config.ron");
        let config = CollisionConfig::default().with_pose_epsilons(0.5, 2.0);
        config.save_to_file(&path).unwrap();

        let loaded = CollisionConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let path = temp_path("partial.toml");
        std::fs::write(&path, "area_depth = 2\n").unwrap();

        let loaded = CollisionConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.area_depth, 2);
        assert_eq!(loaded.max_planes, MAX_PLANES);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = CollisionConfig::load_from_file(temp_path("config.yaml"));
        assert!(result.is_err());
    }
}
