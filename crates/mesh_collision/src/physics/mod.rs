//! Physics module for mesh collision queries
//!
//! Builds per-entity collision meshes from posed triangles, caches them
//! against the pose they were built for, and answers swept-box traces.

pub mod collision;
pub mod collision_system;
pub mod mesh_cache;
pub mod trace;

pub use collision::{
    Aabb,
    CollisionError,
    CollisionMesh,
    CollisionResult,
    MeshBuilder,
    Plane,
    StaticTriangleSource,
    Triangle,
    TriangleSource,
};
pub use collision_system::{CacheStats, EntityHandle, MeshCollisionSystem};
pub use mesh_cache::{poses_match, CachedMesh, Pose};
pub use trace::{point_contents, sweep, TraceResult};
