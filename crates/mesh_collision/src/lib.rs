//! # Mesh Collision
//!
//! Cached collision meshes for posed entities, with swept-box tracing.
//!
//! ## Features
//!
//! - **Plane Pooling**: near-identical planes shared across facets
//! - **Thick Facets**: every triangle becomes a closed convex prism
//! - **Area Tree**: shallow AABB partition for pruning sweep candidates
//! - **Pose Caching**: meshes rebuilt only when an entity moves
//! - **Sweep Traces**: box and point traces with startsolid/allsolid reporting
//!
//! ## Quick Start
//!
//! ```rust
//! use mesh_collision::prelude::*;
//!
//! fn main() -> Result<(), CollisionError> {
//!     let mut system = MeshCollisionSystem::new(CollisionConfig::default())?;
//!     let crate_box = system.register_entity(Box::new(
//!         StaticTriangleSource::cuboid(Vec3::new(1.0, 1.0, 1.0)),
//!     ));
//!
//!     let trace = system.sweep_test(
//!         crate_box,
//!         Vec3::new(0.0, 0.0, 10.0),
//!         Vec3::new(-0.5, -0.5, -0.5),
//!         Vec3::new(0.5, 0.5, 0.5),
//!         Vec3::new(0.0, 0.0, -10.0),
//!     );
//!     assert!(trace.fraction < 1.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for collision users
pub mod prelude {
    pub use crate::{
        config::Config,
        core::CollisionConfig,
        foundation::math::Vec3,
        physics::{
            collision::{CollisionError, CollisionMesh, CollisionResult, MeshBuilder, StaticTriangleSource, TriangleSource},
            collision_system::{EntityHandle, MeshCollisionSystem},
            mesh_cache::Pose,
            trace::TraceResult,
        },
    };
}
