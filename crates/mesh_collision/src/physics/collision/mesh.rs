//! Built collision meshes
//!
//! A [`CollisionMesh`] owns its facets, its plane array and its area tree
//! exclusively. It is immutable once built; a pose change replaces the whole
//! mesh, so facet and plane indices never outlive the mesh they came from.

use super::facet::Facet;
use super::primitives::{Aabb, Plane};
use crate::spatial::AreaTree;

/// Counters gathered while building a mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Triangles handed to the builder
    pub triangles_submitted: usize,
    /// Facets kept
    pub facets: usize,
    /// Distinct planes after pooling
    pub planes: usize,
    /// Planes requested before pooling
    pub plane_requests: usize,
    /// Triangles skipped for near-zero area or non-finite vertices
    pub degenerate_triangles: usize,
    /// Plane requests refused because the pool was full
    pub capacity_failures: usize,
    /// Area tree nodes
    pub area_nodes: usize,
    /// Approximate heap usage in bytes
    pub memory_bytes: usize,
}

impl MeshStats {
    /// Planes that pooling avoided storing
    pub fn planes_saved(&self) -> usize {
        self.plane_requests.saturating_sub(self.planes)
    }
}

/// A spatially indexed triangle collision mesh
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    name: String,
    bounds: Aabb,
    facets: Vec<Facet>,
    planes: Vec<Plane>,
    area_tree: Option<AreaTree>,
    stats: MeshStats,
}

impl CollisionMesh {
    /// A mesh with no geometry; every query against it misses
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Aabb::empty(),
            facets: Vec::new(),
            planes: Vec::new(),
            area_tree: None,
            stats: MeshStats::default(),
        }
    }

    pub(crate) fn from_parts(
        name: String,
        bounds: Aabb,
        facets: Vec<Facet>,
        planes: Vec<Plane>,
        area_tree: AreaTree,
        stats: MeshStats,
    ) -> Self {
        debug_assert!(facets
            .iter()
            .flat_map(Facet::plane_indices)
            .all(|&index| (index as usize) < planes.len()));

        Self {
            name,
            bounds,
            facets,
            planes,
            area_tree: Some(area_tree),
            stats,
        }
    }

    /// Debug name given at build time
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World-space bounds of all facets
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// All facets
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Facet by index
    pub fn facet(&self, index: usize) -> Option<&Facet> {
        self.facets.get(index)
    }

    /// Pooled plane array shared by all facets
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Planes bounding a facet, in facet order
    pub fn facet_planes<'a>(&'a self, facet: &'a Facet) -> impl Iterator<Item = &'a Plane> + 'a {
        facet
            .plane_indices()
            .iter()
            .map(move |&index| &self.planes[index as usize])
    }

    /// Area tree, `None` for empty meshes
    pub fn area_tree(&self) -> Option<&AreaTree> {
        self.area_tree.as_ref()
    }

    /// Build statistics
    pub fn stats(&self) -> &MeshStats {
        &self.stats
    }

    /// True when the mesh has no collision geometry
    pub fn is_empty(&self) -> bool {
        self.area_tree.is_none() || self.facets.is_empty()
    }
}
