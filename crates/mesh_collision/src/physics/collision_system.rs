//! Entity-facing collision mesh system
//!
//! Gameplay code registers each collidable entity's [`TriangleSource`] and
//! then asks for sweep traces by handle. The system keeps one
//! [`CachedMesh`] per entity, rebuilds it whenever the entity's pose has
//! moved, and runs the trace against the cached mesh.
//!
//! Nothing here fails at trace time: unknown handles and entities without
//! usable geometry simply report no collision.

use log::{debug, info};
use slotmap::{new_key_type, SlotMap};

use crate::core::CollisionConfig;
use crate::foundation::math::Vec3;
use crate::physics::collision::{CollisionMesh, CollisionResult, MeshBuilder, Triangle, TriangleSource};
use crate::physics::mesh_cache::{CachedMesh, Pose};
use crate::physics::trace::{self, TraceResult};

new_key_type! {
    /// Handle to an entity registered with a [`MeshCollisionSystem`]
    pub struct EntityHandle;
}

/// Cache counters across all entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Queries served from an up-to-date cached mesh
    pub hits: u64,
    /// Queries that had to build a new mesh
    pub rebuilds: u64,
    /// Builds that produced no usable geometry
    pub empty_meshes: u64,
}

struct EntityEntry {
    source: Box<dyn TriangleSource>,
    cache: CachedMesh,
}

/// Per-entity collision meshes with pose-keyed caching
pub struct MeshCollisionSystem {
    config: CollisionConfig,
    entities: SlotMap<EntityHandle, EntityEntry>,
    /// Triangle scratch buffer reused across rebuilds
    scratch: Vec<Triangle>,
    stats: CacheStats,
}

impl MeshCollisionSystem {
    /// Create a system, rejecting invalid configuration
    pub fn new(config: CollisionConfig) -> CollisionResult<Self> {
        config.validate()?;
        info!(
            "Mesh collision system ready: {} max planes, area tree depth {} / {} nodes",
            config.max_planes, config.area_depth, config.area_nodes
        );

        Ok(Self {
            config,
            entities: SlotMap::with_key(),
            scratch: Vec::new(),
            stats: CacheStats::default(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Cache counters
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of registered entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Register an entity's geometry. The mesh is built lazily on first trace.
    pub fn register_entity(&mut self, source: Box<dyn TriangleSource>) -> EntityHandle {
        let cache = CachedMesh::new(&self.config);
        self.entities.insert(EntityEntry { source, cache })
    }

    /// Move an entity. Returns `false` for unknown handles.
    pub fn set_pose(&mut self, entity: EntityHandle, pose: Pose) -> bool {
        match self.entities.get_mut(entity) {
            Some(entry) => {
                entry.source.set_pose(pose);
                true
            }
            None => false,
        }
    }

    /// Current pose of an entity
    pub fn pose(&self, entity: EntityHandle) -> Option<Pose> {
        self.entities.get(entity).map(|entry| entry.source.pose())
    }

    /// Drop an entity and its cached mesh
    pub fn remove_entity(&mut self, entity: EntityHandle) -> bool {
        self.entities.remove(entity).is_some()
    }

    /// Force a rebuild on the next query, e.g. after an animation frame
    /// changed the triangles without moving the entity
    pub fn invalidate(&mut self, entity: EntityHandle) -> bool {
        match self.entities.get_mut(entity) {
            Some(entry) => {
                entry.cache.free_mesh();
                true
            }
            None => false,
        }
    }

    /// Currently cached mesh of an entity, without rebuilding
    pub fn mesh(&self, entity: EntityHandle) -> Option<&CollisionMesh> {
        self.entities.get(entity).and_then(|entry| entry.cache.mesh())
    }

    /// How many times an entity's mesh has been built
    pub fn build_count(&self, entity: EntityHandle) -> Option<u32> {
        self.entities.get(entity).map(|entry| entry.cache.build_count())
    }

    /// Sweep a box against one entity
    pub fn sweep_test(
        &mut self,
        entity: EntityHandle,
        start: Vec3,
        mins: Vec3,
        maxs: Vec3,
        end: Vec3,
    ) -> TraceResult {
        let Some(mesh) = self.ensure_mesh(entity) else {
            return TraceResult::miss(end);
        };

        let mut result = trace::sweep(mesh, start, mins, maxs, end);
        if result.hit() {
            result.hit_entity = Some(entity);
        }
        result
    }

    /// Sweep a box against every registered entity and keep the nearest hit
    pub fn sweep_all(&mut self, start: Vec3, mins: Vec3, maxs: Vec3, end: Vec3) -> TraceResult {
        let handles: Vec<EntityHandle> = self.entities.keys().collect();
        let mut best = TraceResult::miss(end);

        for entity in handles {
            let result = self.sweep_test(entity, start, mins, maxs, end);
            if result.allsolid {
                return result;
            }
            let startsolid = best.startsolid || result.startsolid;
            if result.fraction < best.fraction {
                best = result;
            }
            best.startsolid = startsolid;
        }
        best
    }

    /// True when `point` lies inside the entity's collision geometry
    pub fn point_test(&mut self, entity: EntityHandle, point: Vec3) -> bool {
        self.ensure_mesh(entity)
            .and_then(|mesh| trace::point_contents(mesh, point))
            .is_some()
    }

    /// Cached mesh for the entity's current pose, rebuilding if needed
    fn ensure_mesh(&mut self, entity: EntityHandle) -> Option<&CollisionMesh> {
        let entry = self.entities.get_mut(entity)?;
        let pose = entry.source.pose();

        if entry.cache.check_mesh(&pose.origin, &pose.angles).is_some() {
            self.stats.hits += 1;
            return entry.cache.mesh();
        }

        self.stats.rebuilds += 1;
        let name = format!("{entity:?}");
        let mesh = build_mesh(&self.config, &name, entry.source.as_ref(), &mut self.scratch);
        if mesh.is_empty() {
            self.stats.empty_meshes += 1;
        }

        Some(entry.cache.commit_mesh(mesh, pose.origin, pose.angles))
    }
}

/// Build a mesh from a source; an empty result becomes an empty mesh
fn build_mesh(
    config: &CollisionConfig,
    name: &str,
    source: &dyn TriangleSource,
    scratch: &mut Vec<Triangle>,
) -> CollisionMesh {
    scratch.clear();
    source.collect_triangles(scratch);

    let hint = scratch.len().max(source.triangle_count_hint());
    let mut builder = MeshBuilder::begin(name, hint, config);
    builder.add_triangles(scratch.drain(..));

    match builder.finish() {
        Ok(mesh) => mesh,
        Err(err) => {
            debug!("No collision geometry for {}: {}", name, err);
            CollisionMesh::empty(name)
        }
    }
}
