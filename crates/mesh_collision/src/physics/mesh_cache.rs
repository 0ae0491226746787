//! Pose-keyed mesh cache
//!
//! Building a posed collision mesh is far more expensive than tracing it,
//! so each entity keeps the last mesh it built together with the pose it
//! was built for. The mesh is handed out only while the entity still sits
//! at that pose; any movement beyond the configured tolerance makes the
//! cache miss and the caller rebuilds.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::CollisionConfig;
use crate::foundation::math::{angle_delta, rotation_from_angles, Mat3, Vec3};
use crate::physics::collision::CollisionMesh;

/// Position and orientation of an entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// World-space origin
    pub origin: Vec3,
    /// `(pitch, yaw, roll)` in degrees
    pub angles: Vec3,
}

impl Pose {
    /// Create a pose from an origin and Euler angles
    pub fn new(origin: Vec3, angles: Vec3) -> Self {
        Self { origin, angles }
    }

    /// Unrotated pose at `origin`
    pub fn at(origin: Vec3) -> Self {
        Self::new(origin, Vec3::zeros())
    }

    /// Rotation matrix for the angles
    pub fn rotation(&self) -> Mat3 {
        rotation_from_angles(self.angles)
    }

    /// Transform a model-space point into world space
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.rotation() * point + self.origin
    }
}

/// Tolerant pose comparison used as the cache key check.
///
/// Origins compare per component within `origin_epsilon`. Angles compare per
/// component within `angle_epsilon` degrees after wrapping, so 359.999 and
/// -0.001 are the same heading.
pub fn poses_match(a: &Pose, b: &Pose, origin_epsilon: f32, angle_epsilon: f32) -> bool {
    let origin_close = (0..3).all(|i| (a.origin[i] - b.origin[i]).abs() <= origin_epsilon);
    let angles_close = (0..3).all(|i| angle_delta(a.angles[i], b.angles[i]).abs() <= angle_epsilon);
    origin_close && angles_close
}

/// One entity's cached mesh and the pose it was built for
#[derive(Debug)]
pub struct CachedMesh {
    entry: Option<(Pose, CollisionMesh)>,
    build_count: u32,
    origin_epsilon: f32,
    angle_epsilon: f32,
}

impl CachedMesh {
    /// Empty cache entry using the pose tolerances from `config`
    pub fn new(config: &CollisionConfig) -> Self {
        Self::with_tolerance(config.pose_origin_epsilon, config.pose_angle_epsilon)
    }

    /// Empty cache entry with explicit pose tolerances
    pub fn with_tolerance(origin_epsilon: f32, angle_epsilon: f32) -> Self {
        Self {
            entry: None,
            build_count: 0,
            origin_epsilon,
            angle_epsilon,
        }
    }

    /// Cached mesh if it was built for this pose, otherwise `None`
    pub fn check_mesh(&self, origin: &Vec3, angles: &Vec3) -> Option<&CollisionMesh> {
        let (cached_pose, mesh) = self.entry.as_ref()?;
        let pose = Pose::new(*origin, *angles);

        if poses_match(cached_pose, &pose, self.origin_epsilon, self.angle_epsilon) {
            Some(mesh)
        } else {
            debug!(
                "Pose changed for collision mesh '{}' (origin {:?} -> {:?}), rebuild needed",
                mesh.name(),
                cached_pose.origin,
                pose.origin
            );
            None
        }
    }

    /// Store a freshly built mesh for the given pose, replacing the old one
    pub fn commit_mesh(&mut self, mesh: CollisionMesh, origin: Vec3, angles: Vec3) -> &CollisionMesh {
        self.build_count += 1;
        let (_, mesh) = self.entry.insert((Pose::new(origin, angles), mesh));
        mesh
    }

    /// Release the cached mesh
    pub fn free_mesh(&mut self) {
        self.entry = None;
    }

    /// Cached mesh regardless of pose
    pub fn mesh(&self) -> Option<&CollisionMesh> {
        self.entry.as_ref().map(|(_, mesh)| mesh)
    }

    /// Pose the cached mesh was built for
    pub fn pose(&self) -> Option<Pose> {
        self.entry.as_ref().map(|(pose, _)| *pose)
    }

    /// Number of meshes committed so far
    pub fn build_count(&self) -> u32 {
        self.build_count
    }
}

impl Default for CachedMesh {
    fn default() -> Self {
        Self::new(&CollisionConfig::default())
    }
}
