//! Collision mesh construction
//!
//! Posed triangles go in, a traceable [`CollisionMesh`] comes out.
//!
//! # Module Organization
//!
//! - [`primitives`] - Boxes, planes and triangles
//! - [`plane_pool`] - Tolerance-based plane deduplication
//! - [`facet`] - Triangle to convex facet conversion and the mesh builder
//! - [`mesh`] - The finished, immutable mesh
//! - [`source`] - Suppliers of posed triangles
//! - [`error`] - Build and configuration errors
//!
//! # Build Flow
//!
//! [`MeshBuilder::begin`] sizes storage, [`MeshBuilder::add_triangle`] turns
//! each triangle into a [`Facet`] whose planes are pooled through
//! [`PlanePool`], and [`MeshBuilder::finish`] computes the mesh bounds and
//! builds the area tree.

pub mod error;
pub mod facet;
pub mod mesh;
pub mod plane_pool;
pub mod primitives;
pub mod source;

// Re-export commonly used types
pub use error::{CollisionError, CollisionResult};
pub use facet::{Facet, MeshBuilder};
pub use mesh::{CollisionMesh, MeshStats};
pub use plane_pool::PlanePool;
pub use primitives::{Aabb, Plane, Triangle};
pub use source::{StaticTriangleSource, TriangleSource};
