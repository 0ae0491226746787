//! Primitive collision shapes
//!
//! Boxes, planes and triangles shared by the facet builder, the area tree
//! and the sweep tracer.

use crate::foundation::math::{component_max, component_min, Mat3, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any `add_point` or `union` will replace
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(-f32::MAX),
        }
    }

    /// Smallest box enclosing all the points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        points.into_iter().fold(Self::empty(), |mut aabb, point| {
            aabb.add_point(point);
            aabb
        })
    }

    /// Create a box centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// True when min <= max on every axis
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Grow the box to contain a point
    pub fn add_point(&mut self, point: &Vec3) {
        self.min = component_min(&self.min, point);
        self.max = component_max(&self.max, point);
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: component_min(&self.min, &other.min),
            max: component_max(&self.max, &other.max),
        }
    }

    /// Box grown by `amount` on every side
    pub fn expanded(&self, amount: f32) -> Aabb {
        let grow = Vec3::repeat(amount);
        Aabb {
            min: self.min - grow,
            max: self.max + grow,
        }
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Full size of the box along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Axis (0 = X, 1 = Y, 2 = Z) along which the box is longest
    pub fn largest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this box intersects another box (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

/// A collision plane `normal . p = distance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit-length plane normal
    pub normal: Vec3,
    /// Distance from the origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane from a unit normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Create a plane through a point
    pub fn from_point_normal(point: &Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Signed distance from the plane; positive in front
    pub fn distance_to(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    /// Same plane facing the other way
    pub fn flipped(&self) -> Plane {
        Plane {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Plane pushed `amount` along its own normal
    pub fn offset(&self, amount: f32) -> Plane {
        Plane {
            normal: self.normal,
            distance: self.distance + amount,
        }
    }

    /// True when both planes agree within the given tolerances
    pub fn approx_eq(&self, other: &Plane, normal_epsilon: f32, dist_epsilon: f32) -> bool {
        (self.distance - other.distance).abs() < dist_epsilon
            && (self.normal.x - other.normal.x).abs() < normal_epsilon
            && (self.normal.y - other.normal.y).abs() < normal_epsilon
            && (self.normal.z - other.normal.z).abs() < normal_epsilon
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// The three vertices in winding order
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Unnormalized normal (right-hand rule); its length is twice the area
    pub fn scaled_normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Triangle area
    pub fn area(&self) -> f32 {
        self.scaled_normal().magnitude() * 0.5
    }

    /// Unit normal, or `None` when the area is at or below `area_epsilon`
    pub fn normal(&self, area_epsilon: f32) -> Option<Vec3> {
        let scaled = self.scaled_normal();
        let doubled_area = scaled.magnitude();
        if !doubled_area.is_finite() || doubled_area * 0.5 <= area_epsilon {
            return None;
        }
        Some(scaled / doubled_area)
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Apply a rotation and then a translation to every vertex
    pub fn transformed(&self, rotation: &Mat3, translation: &Vec3) -> Triangle {
        Triangle {
            v0: rotation * self.v0 + translation,
            v1: rotation * self.v1 + translation,
            v2: rotation * self.v2 + translation,
        }
    }
}
