//! Deduplicating plane storage
//!
//! Adjacent triangles of a model share edges and surfaces, so most of the
//! planes a mesh asks for already exist within float tolerance. The pool keeps
//! one copy of each distinct plane in a contiguous arena and hands out indices
//! into it, which keeps plane count proportional to the number of distinct
//! surfaces rather than to triangle count.
//!
//! Lookup hashes a plane by its dominant normal axis and the sign bits of its
//! normal. Normals sitting close to a bucket boundary (a near-zero component,
//! or two components of almost equal magnitude) are looked up in every bucket
//! a within-tolerance neighbour could have been filed under.

use std::collections::HashMap;

use crate::core::CollisionConfig;
use crate::foundation::math::Vec3;
use super::error::{CollisionError, CollisionResult};
use super::primitives::Plane;

/// Hash bucket key: dominant axis plus normal sign bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PlaneBucket {
    axis: u8,
    signbits: u8,
}

impl PlaneBucket {
    /// Bucket a plane with this normal is filed under
    fn canonical(normal: &Vec3, normal_epsilon: f32) -> Self {
        let mut axis = 0;
        for i in 1..3 {
            if normal[i].abs() > normal[axis].abs() {
                axis = i;
            }
        }

        let mut signbits = 0u8;
        for i in 0..3 {
            if normal[i] < -normal_epsilon {
                signbits |= 1 << i;
            }
        }

        Self { axis: axis as u8, signbits }
    }

    /// Every bucket a normal within `normal_epsilon` of this one may live in
    fn candidates(normal: &Vec3, normal_epsilon: f32) -> Vec<Self> {
        let largest = normal.x.abs().max(normal.y.abs()).max(normal.z.abs());

        let mut fixed_bits = 0u8;
        let mut ambiguous_bits = 0u8;
        for i in 0..3 {
            if normal[i].abs() <= 3.0 * normal_epsilon {
                ambiguous_bits |= 1 << i;
            } else if normal[i] < -normal_epsilon {
                fixed_bits |= 1 << i;
            }
        }

        let mut buckets = Vec::with_capacity(4);
        for axis in 0..3u8 {
            if normal[axis as usize].abs() < largest - 2.0 * normal_epsilon {
                continue;
            }
            // Walk every subset of the ambiguous bits
            let mut subset = ambiguous_bits;
            loop {
                let bucket = Self { axis, signbits: fixed_bits | subset };
                if !buckets.contains(&bucket) {
                    buckets.push(bucket);
                }
                if subset == 0 {
                    break;
                }
                subset = (subset - 1) & ambiguous_bits;
            }
        }
        buckets
    }
}

/// Deduplicating plane arena for one mesh build
#[derive(Debug, Clone)]
pub struct PlanePool {
    planes: Vec<Plane>,
    buckets: HashMap<PlaneBucket, Vec<u32>>,
    max_planes: usize,
    normal_epsilon: f32,
    dist_epsilon: f32,
    requests: usize,
}

impl PlanePool {
    /// Create an empty pool using the config's capacity and tolerances
    pub fn new(config: &CollisionConfig) -> Self {
        Self::with_limits(
            config.max_planes,
            config.plane_normal_epsilon,
            config.plane_dist_epsilon,
        )
    }

    /// Create an empty pool with explicit capacity and tolerances
    pub fn with_limits(max_planes: usize, normal_epsilon: f32, dist_epsilon: f32) -> Self {
        Self {
            planes: Vec::new(),
            buckets: HashMap::new(),
            max_planes,
            normal_epsilon,
            dist_epsilon,
            requests: 0,
        }
    }

    /// Return the index of a pooled plane matching `normal`/`distance`,
    /// adding it if no match exists.
    ///
    /// Non-unit normals are normalized (and the distance scaled with them).
    /// Fails with [`CollisionError::CapacityExceeded`] when a new slot is
    /// needed and the pool is full.
    pub fn add_plane(&mut self, normal: Vec3, distance: f32) -> CollisionResult<u32> {
        self.requests += 1;

        let length = normal.magnitude();
        if !length.is_finite() || length <= f32::EPSILON || !distance.is_finite() {
            return Err(CollisionError::DegeneratePlane);
        }
        let plane = Plane::new(normal / length, distance / length);

        if let Some(index) = self.find_plane(&plane) {
            return Ok(index);
        }

        if self.planes.len() >= self.max_planes {
            return Err(CollisionError::CapacityExceeded { limit: self.max_planes });
        }

        let index = self.planes.len() as u32;
        self.planes.push(plane);
        self.buckets
            .entry(PlaneBucket::canonical(&plane.normal, self.normal_epsilon))
            .or_default()
            .push(index);
        Ok(index)
    }

    /// Index of a pooled plane within tolerance of `plane`, if any.
    /// Most recently added planes are checked first.
    pub fn find_plane(&self, plane: &Plane) -> Option<u32> {
        PlaneBucket::candidates(&plane.normal, self.normal_epsilon)
            .into_iter()
            .filter_map(|bucket| self.buckets.get(&bucket))
            .flat_map(|chain| chain.iter().rev())
            .copied()
            .find(|&index| {
                self.planes[index as usize].approx_eq(plane, self.normal_epsilon, self.dist_epsilon)
            })
    }

    /// Plane stored at `index`
    pub fn get(&self, index: u32) -> Option<&Plane> {
        self.planes.get(index as usize)
    }

    /// All pooled planes, indexed by plane index
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Number of distinct planes
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// True when no plane has been added
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Number of `add_plane` calls, including ones served from the pool
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Pool capacity
    pub fn capacity_limit(&self) -> usize {
        self.max_planes
    }

    /// Drop every plane; indices handed out before are no longer valid
    pub fn clear(&mut self) {
        self.planes.clear();
        self.buckets.clear();
        self.requests = 0;
    }

    /// Consume the pool, keeping only the plane arena
    pub fn into_planes(self) -> Vec<Plane> {
        self.planes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pool() -> PlanePool {
        PlanePool::with_limits(64, 1e-4, 0.01)
    }

    #[test]
    fn test_near_identical_planes_share_index() {
        let mut pool = pool();
        let a = pool.add_plane(Vec3::new(0.6, 0.8, 0.0), 3.0).unwrap();
        let b = pool.add_plane(Vec3::new(0.600_02, 0.799_985, 0.0), 3.005).unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.requests(), 2);
    }

    #[test]
    fn test_distinct_planes_get_distinct_indices() {
        let mut pool = pool();
        let a = pool.add_plane(Vec3::z(), 0.0).unwrap();
        let b = pool.add_plane(Vec3::z(), 0.05).unwrap();
        let c = pool.add_plane(Vec3::new(0.0, 0.001, 1.0), 0.0).unwrap();
        let d = pool.add_plane(-Vec3::z(), 0.0).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_dedup_across_sign_boundary() {
        let mut pool = pool();
        // Tiny components of opposite sign must not split an axial plane
        let a = pool.add_plane(Vec3::new(2e-5, -2e-5, 1.0), 1.0).unwrap();
        let b = pool.add_plane(Vec3::new(-3e-5, 4e-5, 1.0), 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedup_across_dominant_axis_boundary() {
        let mut pool = pool();
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let a = pool.add_plane(Vec3::new(half + 2e-5, half - 2e-5, 0.0), 0.0).unwrap();
        let b = pool.add_plane(Vec3::new(half - 2e-5, half + 2e-5, 0.0), 0.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_unit_normal_is_normalized() {
        let mut pool = pool();
        let index = pool.add_plane(Vec3::new(0.0, 0.0, 2.0), 4.0).unwrap();
        let plane = pool.get(index).unwrap();
        assert_relative_eq!(plane.normal, Vec3::z());
        assert_relative_eq!(plane.distance, 2.0);
    }

    #[test]
    fn test_degenerate_normal_rejected() {
        let mut pool = pool();
        assert!(matches!(
            pool.add_plane(Vec3::zeros(), 1.0),
            Err(CollisionError::DegeneratePlane)
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut pool = PlanePool::with_limits(2, 1e-4, 0.01);
        pool.add_plane(Vec3::x(), 0.0).unwrap();
        pool.add_plane(Vec3::y(), 0.0).unwrap();

        // Existing planes are still served when full
        assert_eq!(pool.add_plane(Vec3::x(), 0.0).unwrap(), 0);
        assert!(matches!(
            pool.add_plane(Vec3::z(), 0.0),
            Err(CollisionError::CapacityExceeded { limit: 2 })
        ));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_clear_releases_planes() {
        let mut pool = pool();
        pool.add_plane(Vec3::x(), 1.0).unwrap();
        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.find_plane(&Plane::new(Vec3::x(), 1.0)).is_none());
        assert_eq!(pool.add_plane(Vec3::y(), 1.0).unwrap(), 0);
    }

    #[test]
    fn test_candidate_buckets_cover_canonical() {
        let normals = [
            Vec3::z(),
            Vec3::new(1e-5, -1e-5, -1.0),
            Vec3::new(0.6, -0.8, 0.0),
            Vec3::new(-0.577_35, 0.577_35, 0.577_35),
        ];
        for normal in normals {
            let canonical = PlaneBucket::canonical(&normal, 1e-4);
            assert!(PlaneBucket::candidates(&normal, 1e-4).contains(&canonical));
        }
    }
}
