//! Facet construction
//!
//! Turns posed world-space triangles into convex facets that reference
//! pooled planes. Each triangle becomes a thin prism bounded by:
//!
//! - the surface plane, facing along the triangle normal
//! - a back cap, facing the other way, `facet_thickness` behind the surface
//! - one wall per edge, perpendicular to the surface, pushed outward by
//!   `edge_bevel_offset`
//! - bevel planes: the axial faces of the facet bounds, and planes through
//!   each prism edge crossed with each axis, where not already covered
//!
//! The thickness makes the facet a closed solid, so sweeps approaching from
//! behind stop on the back cap instead of tunnelling through a zero-width
//! sheet. The bevels keep box sweeps from catching on the empty space past
//! the prism's corners.

use log::{debug, warn};

use crate::core::config::PLANES_PER_TRIANGLE;
use crate::core::CollisionConfig;
use crate::foundation::math::Vec3;
use crate::spatial::{AreaTree, AreaTreeLimits};
use super::error::{CollisionError, CollisionResult};
use super::mesh::{CollisionMesh, MeshStats};
use super::plane_pool::PlanePool;
use super::primitives::{Aabb, Triangle};

/// Corner pairs of a facet solid: the triangle edges, then the edges joining
/// each vertex to its back cap copy. Back cap edges repeat the triangle edge
/// directions.
const SOLID_EDGES: [(usize, usize); 6] = [(0, 1), (1, 2), (2, 0), (0, 3), (1, 4), (2, 5)];

/// One convex collision primitive
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    /// Box enclosing the whole facet solid
    pub bounds: Aabb,
    plane_indices: Vec<u32>,
}

impl Facet {
    /// Create a facet from its bounds and plane indices
    pub fn new(bounds: Aabb, plane_indices: Vec<u32>) -> Self {
        Self { bounds, plane_indices }
    }

    /// Indices into the owning mesh's plane array
    pub fn plane_indices(&self) -> &[u32] {
        &self.plane_indices
    }

    /// Number of bounding planes
    pub fn num_planes(&self) -> usize {
        self.plane_indices.len()
    }

    /// A facet without planes encloses nothing and is never indexed
    pub fn is_valid(&self) -> bool {
        !self.plane_indices.is_empty()
    }
}

/// Per-build bookkeeping
#[derive(Debug, Clone, Copy, Default)]
struct BuildCounters {
    triangles: usize,
    degenerate: usize,
    capacity_failures: usize,
}

/// Incremental collision mesh builder
///
/// ```rust
/// use mesh_collision::core::CollisionConfig;
/// use mesh_collision::foundation::math::Vec3;
/// use mesh_collision::physics::collision::MeshBuilder;
///
/// let config = CollisionConfig::default();
/// let mut builder = MeshBuilder::begin("floor", 1, &config);
/// builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y());
/// let mesh = builder.finish().unwrap();
/// assert_eq!(mesh.facets().len(), 1);
/// ```
#[derive(Debug)]
pub struct MeshBuilder {
    name: String,
    config: CollisionConfig,
    pool: PlanePool,
    facets: Vec<Facet>,
    counters: BuildCounters,
}

impl MeshBuilder {
    /// Start a build, reserving room for `triangle_count_hint` facets
    pub fn begin(name: impl Into<String>, triangle_count_hint: usize, config: &CollisionConfig) -> Self {
        Self {
            name: name.into(),
            config: config.clone(),
            pool: PlanePool::new(config),
            facets: Vec::with_capacity(triangle_count_hint),
            counters: BuildCounters::default(),
        }
    }

    /// Debug name of the mesh being built
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Facets accepted so far
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// Distinct planes pooled so far
    pub fn plane_count(&self) -> usize {
        self.pool.len()
    }

    /// Add one triangle. Returns `false` if it was skipped.
    ///
    /// Triangles with near-zero area are skipped silently. When the plane
    /// pool is full the triangle's missing planes fall back to plane 0 and
    /// the build carries on; the first such failure is logged.
    pub fn add_triangle(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
        self.counters.triangles += 1;

        match self.build_facet(&Triangle::new(v0, v1, v2)) {
            Ok(facet) => {
                self.facets.push(facet);
                true
            }
            // Already counted and logged when the pool refused the plane
            Err(CollisionError::CapacityExceeded { .. }) => false,
            Err(_) => {
                self.counters.degenerate += 1;
                false
            }
        }
    }

    /// Add every triangle from an iterator
    pub fn add_triangles<I>(&mut self, triangles: I) -> usize
    where
        I: IntoIterator<Item = Triangle>,
    {
        triangles
            .into_iter()
            .filter(|tri| self.add_triangle(tri.v0, tri.v1, tri.v2))
            .count()
    }

    fn build_facet(&mut self, triangle: &Triangle) -> CollisionResult<Facet> {
        let vertices = triangle.vertices();
        if vertices.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(CollisionError::DegenerateTriangle);
        }
        let normal = triangle
            .normal(self.config.degenerate_area_epsilon)
            .ok_or(CollisionError::DegenerateTriangle)?;

        let surface_distance = normal.dot(&triangle.v0);
        let thickness = self.config.facet_thickness;
        let bevel = self.config.edge_bevel_offset;

        let mut planes = Vec::with_capacity(PLANES_PER_TRIANGLE + 6);
        planes.push((normal, surface_distance));
        planes.push((-normal, thickness - surface_distance));
        for (start, end) in [(0, 1), (1, 2), (2, 0)] {
            let edge = vertices[end] - vertices[start];
            let outward = edge
                .cross(&normal)
                .try_normalize(f32::EPSILON)
                .ok_or(CollisionError::DegenerateTriangle)?;
            planes.push((outward, outward.dot(&vertices[start]) + bevel));
        }

        // Corners of the solid: the triangle and its copy on the back cap
        let back = -normal * thickness;
        let corners = [
            vertices[0],
            vertices[1],
            vertices[2],
            vertices[0] + back,
            vertices[1] + back,
            vertices[2] + back,
        ];
        let bounds = Aabb::from_points(corners.iter()).expanded(bevel);

        self.add_bevels(&mut planes, &corners, &bounds);
        planes.truncate(self.config.max_facet_planes);

        let mut plane_indices = Vec::with_capacity(planes.len());
        for (plane_normal, distance) in planes {
            match self.pool.add_plane(plane_normal, distance) {
                Ok(index) => plane_indices.push(index),
                Err(CollisionError::CapacityExceeded { limit }) => {
                    if self.counters.capacity_failures == 0 {
                        warn!(
                            "Collision mesh '{}': plane pool full ({} planes), falling back to plane 0",
                            self.name, limit
                        );
                    }
                    self.counters.capacity_failures += 1;
                    if self.pool.is_empty() {
                        return Err(CollisionError::CapacityExceeded { limit });
                    }
                    plane_indices.push(0);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Facet::new(bounds, plane_indices))
    }

    /// Close the facet against box sweeps.
    ///
    /// Offsetting the facet planes by a box's extents leaves the solid
    /// sticking out past its corners and edges. Axial planes from the facet
    /// bounds and planes through each solid edge crossed with each axis cut
    /// those regions off. A bevel is skipped when a plane with the same
    /// normal already bounds the facet.
    fn add_bevels(&self, planes: &mut Vec<(Vec3, f32)>, corners: &[Vec3; 6], bounds: &Aabb) {
        let normal_epsilon = self.config.plane_normal_epsilon;
        let bevel = self.config.edge_bevel_offset;
        let has_normal = |planes: &[(Vec3, f32)], candidate: &Vec3| {
            planes
                .iter()
                .any(|(existing, _)| (existing - candidate).amax() < normal_epsilon)
        };

        for axis in 0..3 {
            let mut direction = Vec3::zeros();
            direction[axis] = 1.0;
            if !has_normal(&planes[..], &direction) {
                planes.push((direction, bounds.max[axis]));
            }
            if !has_normal(&planes[..], &-direction) {
                planes.push((-direction, -bounds.min[axis]));
            }
        }

        for (start, end) in SOLID_EDGES {
            let edge = corners[end] - corners[start];
            for axis in 0..3 {
                let Some(candidate) = edge.cross(&Vec3::ith(axis, 1.0)).try_normalize(1e-6) else {
                    continue;
                };
                for candidate in [candidate, -candidate] {
                    if has_normal(&planes[..], &candidate) {
                        continue;
                    }
                    let distance = candidate.dot(&corners[start]);
                    // Only planes with the whole solid behind them are faces of the swept shape
                    let supporting = corners
                        .iter()
                        .all(|corner| candidate.dot(corner) - distance <= bevel * 0.5);
                    if supporting {
                        planes.push((candidate, distance + bevel));
                    }
                }
            }
        }
    }

    /// Finish the build: compact facets, compute bounds and build the area tree.
    ///
    /// Fails with [`CollisionError::EmptyMesh`] when no facet was accepted.
    /// Trace callers treat that as "no collision geometry" and use
    /// [`CollisionMesh::empty`].
    pub fn finish(self) -> CollisionResult<CollisionMesh> {
        let Self { name, config, pool, mut facets, counters } = self;

        facets.retain(Facet::is_valid);
        if facets.is_empty() {
            debug!(
                "Collision mesh '{}' is empty ({} triangles, {} skipped)",
                name, counters.triangles, counters.degenerate
            );
            return Err(CollisionError::EmptyMesh { name });
        }
        facets.shrink_to_fit();

        let bounds = facets
            .iter()
            .fold(Aabb::empty(), |acc, facet| acc.union(&facet.bounds));
        let facet_bounds: Vec<Aabb> = facets.iter().map(|facet| facet.bounds).collect();
        let area_tree = AreaTree::build(&facet_bounds, bounds, AreaTreeLimits::from(&config));

        let plane_requests = pool.requests();
        let planes = pool.into_planes();

        let memory_bytes = facets.capacity() * std::mem::size_of::<Facet>()
            + facets
                .iter()
                .map(|facet| facet.plane_indices.capacity() * std::mem::size_of::<u32>())
                .sum::<usize>()
            + planes.capacity() * std::mem::size_of::<super::Plane>()
            + area_tree.memory_bytes();

        let stats = MeshStats {
            triangles_submitted: counters.triangles,
            facets: facets.len(),
            planes: planes.len(),
            plane_requests,
            degenerate_triangles: counters.degenerate,
            capacity_failures: counters.capacity_failures,
            area_nodes: area_tree.node_count(),
            memory_bytes,
        };

        debug!(
            "Built collision mesh '{}': {} facets, {} planes ({} saved by pooling), {} area nodes, {} degenerate skipped",
            name,
            stats.facets,
            stats.planes,
            stats.planes_saved(),
            stats.area_nodes,
            stats.degenerate_triangles
        );

        Ok(CollisionMesh::from_parts(name, bounds, facets, planes, area_tree, stats))
    }

    /// Abandon the build without producing a mesh
    pub fn discard(self) {
        debug!(
            "Discarded collision mesh build '{}' after {} facets",
            self.name,
            self.facets.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad_grid(cells: usize) -> Vec<Triangle> {
        let mut triangles = Vec::new();
        for x in 0..cells {
            for y in 0..cells {
                let (fx, fy) = (x as f32, y as f32);
                let a = Vec3::new(fx, fy, 0.0);
                let b = Vec3::new(fx + 1.0, fy, 0.0);
                let c = Vec3::new(fx + 1.0, fy + 1.0, 0.0);
                let d = Vec3::new(fx, fy + 1.0, 0.0);
                triangles.push(Triangle::new(a, b, c));
                triangles.push(Triangle::new(a, c, d));
            }
        }
        triangles
    }

    #[test]
    fn test_single_triangle_facet() {
        let config = CollisionConfig::default();
        let mut builder = MeshBuilder::begin("tri", 1, &config);
        assert!(builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y()));
        let mesh = builder.finish().unwrap();

        assert_eq!(mesh.facets().len(), 1);
        let facet = &mesh.facets()[0];
        // Five prism planes plus the +X and +Y axial bevels; the others
        // coincide with walls or caps
        assert_eq!(facet.num_planes(), 7);
        assert!(facet.plane_indices().iter().all(|&i| (i as usize) < mesh.planes().len()));

        let surface = mesh.planes()[facet.plane_indices()[0] as usize];
        assert_relative_eq!(surface.normal, Vec3::z(), epsilon = 1e-6);
        assert_relative_eq!(surface.distance, 0.0, epsilon = 1e-6);

        let back = mesh.planes()[facet.plane_indices()[1] as usize];
        assert_relative_eq!(back.normal, -Vec3::z(), epsilon = 1e-6);
        assert_relative_eq!(back.distance, config.facet_thickness, epsilon = 1e-6);
    }

    #[test]
    fn test_facet_bounds_cover_thickness_and_bevel() {
        let config = CollisionConfig::default();
        let mut builder = MeshBuilder::begin("tri", 1, &config);
        builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y());
        let mesh = builder.finish().unwrap();

        let bounds = mesh.facets()[0].bounds;
        let bevel = config.edge_bevel_offset;
        assert_relative_eq!(bounds.min.z, -config.facet_thickness - bevel, epsilon = 1e-6);
        assert_relative_eq!(bounds.max.z, bevel, epsilon = 1e-6);
        assert_relative_eq!(bounds.max.x, 1.0 + bevel, epsilon = 1e-6);
        assert_eq!(mesh.bounds(), bounds);
    }

    #[test]
    fn test_bevels_never_cut_the_solid() {
        let config = CollisionConfig::default();
        let triangles = [
            Triangle::new(Vec3::zeros(), Vec3::x(), Vec3::y()),
            Triangle::new(Vec3::new(0.3, -1.2, 0.5), Vec3::new(2.0, 0.4, -0.7), Vec3::new(-0.6, 1.1, 1.9)),
            Triangle::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(5.0, 7.0, 6.0), Vec3::new(4.0, 6.0, 8.0)),
        ];

        for triangle in triangles {
            let mut builder = MeshBuilder::begin("bevels", 1, &config);
            assert!(builder.add_triangle(triangle.v0, triangle.v1, triangle.v2));
            let mesh = builder.finish().unwrap();
            let facet = &mesh.facets()[0];
            assert!(facet.num_planes() >= 5 + 2);
            assert!(facet.num_planes() <= config.max_facet_planes);

            let normal = triangle.normal(config.degenerate_area_epsilon).unwrap();
            let back = -normal * config.facet_thickness;
            let mut corners = triangle.vertices().to_vec();
            corners.extend(triangle.vertices().iter().map(|v| v + back));

            for plane in mesh.facet_planes(facet) {
                for corner in &corners {
                    assert!(
                        plane.distance_to(corner) <= 1e-4,
                        "plane {plane:?} cuts corner {corner:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_tilted_triangle_gets_edge_bevels() {
        let config = CollisionConfig::default();
        let mut builder = MeshBuilder::begin("tilted", 1, &config);
        builder.add_triangle(Vec3::new(0.3, -1.2, 0.5), Vec3::new(2.0, 0.4, -0.7), Vec3::new(-0.6, 1.1, 1.9));
        let mesh = builder.finish().unwrap();
        let facet = &mesh.facets()[0];

        let axial = mesh
            .facet_planes(facet)
            .filter(|plane| plane.normal.amax() > 1.0 - 1e-6)
            .count();
        assert_eq!(axial, 6);
        // Edge bevels come on top of the prism and axial planes
        assert!(facet.num_planes() > 5 + 6);
    }

    #[test]
    fn test_degenerate_triangles_skipped() {
        let config = CollisionConfig::default();
        let mut builder = MeshBuilder::begin("mixed", 3, &config);
        assert!(!builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::x() * 2.0));
        assert!(!builder.add_triangle(Vec3::zeros(), Vec3::zeros(), Vec3::zeros()));
        assert!(!builder.add_triangle(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::x(), Vec3::y()));
        assert!(builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y()));

        let mesh = builder.finish().unwrap();
        assert_eq!(mesh.facets().len(), 1);
        assert_eq!(mesh.stats().degenerate_triangles, 3);
        assert_eq!(mesh.stats().triangles_submitted, 4);
    }

    #[test]
    fn test_empty_build_reports_empty_mesh() {
        let config = CollisionConfig::default();
        let builder = MeshBuilder::begin("nothing", 0, &config);
        assert!(matches!(
            builder.finish(),
            Err(CollisionError::EmptyMesh { ref name }) if name == "nothing"
        ));

        let mut builder = MeshBuilder::begin("only degenerate", 1, &config);
        builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::x());
        assert!(matches!(builder.finish(), Err(CollisionError::EmptyMesh { .. })));
    }

    #[test]
    fn test_coplanar_grid_shares_planes() {
        let config = CollisionConfig::default();
        let triangles = quad_grid(8);
        let mut builder = MeshBuilder::begin("grid", triangles.len(), &config);
        assert_eq!(builder.add_triangles(triangles), 128);
        let mesh = builder.finish().unwrap();

        let stats = mesh.stats();
        assert_eq!(stats.facets, 128);
        let requested: usize = mesh.facets().iter().map(Facet::num_planes).sum();
        assert_eq!(stats.plane_requests, requested);
        // One surface, one back cap, and far fewer walls than 3 per triangle
        assert!(stats.planes < 128 * 3, "got {} planes", stats.planes);
        assert!(stats.planes_saved() > 0);
        assert!(stats.area_nodes > 1);
    }

    #[test]
    fn test_capacity_exceeded_falls_back_to_plane_zero() {
        crate::foundation::logging::init();
        let config = CollisionConfig::default().with_max_planes(8);
        let mut builder = MeshBuilder::begin("tight", 2, &config);
        assert!(builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y()));
        // Different plane set entirely; only one slot is left
        assert!(builder.add_triangle(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 1.0, 5.0),
            Vec3::new(0.0, 0.0, 6.0),
        ));
        let mesh = builder.finish().unwrap();

        assert_eq!(mesh.planes().len(), 8);
        assert!(mesh.stats().capacity_failures > 0);
        let second = &mesh.facets()[1];
        assert!(second.plane_indices().contains(&0));
        assert!(second.plane_indices().iter().all(|&i| (i as usize) < mesh.planes().len()));
    }

    #[test]
    fn test_zero_capacity_skips_everything() {
        let config = CollisionConfig::default().with_max_planes(0);
        let mut builder = MeshBuilder::begin("none", 1, &config);
        assert!(!builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y()));
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_discard_drops_build() {
        let config = CollisionConfig::default();
        let mut builder = MeshBuilder::begin("scratch", 1, &config);
        builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y());
        assert_eq!(builder.facet_count(), 1);
        assert_eq!(builder.plane_count(), 7);
        builder.discard();
    }
}
