//! Triangle sources
//!
//! The mesh cache never poses geometry itself. Whatever owns an entity's
//! skeleton or brush data implements [`TriangleSource`] and hands over
//! world-space triangles on demand.

use log::warn;

use crate::foundation::math::{rotation_from_angles, Vec3};
use crate::physics::mesh_cache::Pose;
use super::primitives::{Aabb, Triangle};

/// Supplier of posed world-space triangles for one entity
pub trait TriangleSource {
    /// Current pose; the cached mesh is rebuilt whenever it changes
    fn pose(&self) -> Pose;

    /// Move the source to a new pose
    fn set_pose(&mut self, pose: Pose);

    /// Expected number of triangles, used to size build storage
    fn triangle_count_hint(&self) -> usize {
        0
    }

    /// Append the posed triangles to `out`
    fn collect_triangles(&self, out: &mut Vec<Triangle>);
}

/// Rigid model-space triangles placed in the world by a pose
#[derive(Debug, Clone, Default)]
pub struct StaticTriangleSource {
    local_triangles: Vec<Triangle>,
    pose: Pose,
}

impl StaticTriangleSource {
    /// Create a source from model-space triangles at the identity pose
    pub fn new(local_triangles: Vec<Triangle>) -> Self {
        Self {
            local_triangles,
            pose: Pose::default(),
        }
    }

    /// Create a source from an indexed triangle list.
    ///
    /// A trailing partial triangle is ignored, as is any triangle that
    /// references a vertex out of range.
    pub fn from_indexed(vertices: &[Vec3], indices: &[u32]) -> Self {
        let mut triangles = Vec::with_capacity(indices.len() / 3);
        let mut out_of_range = 0usize;

        for chunk in indices.chunks_exact(3) {
            let corners = (
                vertices.get(chunk[0] as usize),
                vertices.get(chunk[1] as usize),
                vertices.get(chunk[2] as usize),
            );
            match corners {
                (Some(v0), Some(v1), Some(v2)) => triangles.push(Triangle::new(*v0, *v1, *v2)),
                _ => out_of_range += 1,
            }
        }

        if out_of_range > 0 {
            warn!(
                "Dropped {} triangles with out-of-range indices ({} vertices)",
                out_of_range,
                vertices.len()
            );
        }

        Self::new(triangles)
    }

    /// Axis-aligned box centred on the model origin, faces wound outward
    pub fn cuboid(half_extents: Vec3) -> Self {
        let vertices: Vec<Vec3> = (0..8u32)
            .map(|corner| {
                Vec3::new(
                    if corner & 1 == 0 { -half_extents.x } else { half_extents.x },
                    if corner & 2 == 0 { -half_extents.y } else { half_extents.y },
                    if corner & 4 == 0 { -half_extents.z } else { half_extents.z },
                )
            })
            .collect();

        let indices = [
            4, 5, 7, 4, 7, 6, // +Z
            0, 2, 3, 0, 3, 1, // -Z
            1, 3, 7, 1, 7, 5, // +X
            0, 4, 6, 0, 6, 2, // -X
            2, 6, 7, 2, 7, 3, // +Y
            0, 1, 5, 0, 5, 4, // -Y
        ];

        Self::from_indexed(&vertices, &indices)
    }

    /// Same source placed at `pose`
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Model-space triangles
    pub fn local_triangles(&self) -> &[Triangle] {
        &self.local_triangles
    }

    /// Model-space bounds of the triangles
    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.local_triangles.iter().flat_map(|tri| [&tri.v0, &tri.v1, &tri.v2]))
    }
}

impl TriangleSource for StaticTriangleSource {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn triangle_count_hint(&self) -> usize {
        self.local_triangles.len()
    }

    fn collect_triangles(&self, out: &mut Vec<Triangle>) {
        let rotation = rotation_from_angles(self.pose.angles);
        out.extend(
            self.local_triangles
                .iter()
                .map(|tri| tri.transformed(&rotation, &self.pose.origin)),
        );
    }
}
