//! Swept-box tracing against collision meshes
//!
//! A sweep moves an axis-aligned box (or a point, when `mins == maxs == 0`)
//! from `start` to `end` and reports the first fraction of the move at which
//! it touches a facet. Each facet is a convex solid, so the move is clipped
//! against every bounding plane of every candidate facet: the box offset is
//! folded into each plane's distance, and the move enters the facet at the
//! latest entering crossing and leaves it at the earliest leaving one.
//!
//! A point lying exactly on a plane counts as outside that plane, so a mover
//! resting on a surface can always slide along it or lift off it.

use crate::foundation::math::{component_max, component_min, Vec3};
use crate::physics::collision::{Aabb, CollisionMesh, Facet, Plane};
use crate::physics::collision_system::EntityHandle;

/// Result of a sweep trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// Portion of the move completed before impact, in `[0, 1]`
    pub fraction: f32,
    /// Final position of the box origin
    pub endpos: Vec3,
    /// Normal of the plane that stopped the move (zero when nothing did)
    pub plane_normal: Vec3,
    /// The start position was inside a facet
    pub startsolid: bool,
    /// The whole move stayed inside a facet
    pub allsolid: bool,
    /// Index of the facet that limited the move
    pub hit_facet: Option<usize>,
    /// Entity whose mesh was hit, filled in by the collision system
    pub hit_entity: Option<EntityHandle>,
}

impl TraceResult {
    /// A trace that travelled the full distance unobstructed
    pub fn miss(end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            endpos: end,
            plane_normal: Vec3::zeros(),
            startsolid: false,
            allsolid: false,
            hit_facet: None,
            hit_entity: None,
        }
    }

    /// True when something limited or enclosed the move
    pub fn hit(&self) -> bool {
        self.fraction < 1.0 || self.startsolid
    }
}

/// Outcome of clipping one move against one facet
#[derive(Debug, Clone, Copy, PartialEq)]
enum FacetClip {
    /// The move never enters the facet
    Miss,
    /// The move enters the facet at `fraction` through `plane`
    Enter { fraction: f32, plane: u32 },
    /// The move starts inside the facet; `exit` is where it first gets out
    StartSolid { exit: Option<(f32, u32)> },
}

/// Box corner lying furthest behind a plane with this normal
fn support_corner(normal: &Vec3, mins: &Vec3, maxs: &Vec3) -> Vec3 {
    Vec3::new(
        if normal.x < 0.0 { maxs.x } else { mins.x },
        if normal.y < 0.0 { maxs.y } else { mins.y },
        if normal.z < 0.0 { maxs.z } else { mins.z },
    )
}

fn clip_box_to_facet(
    planes: &[Plane],
    facet: &Facet,
    start: &Vec3,
    end: &Vec3,
    mins: &Vec3,
    maxs: &Vec3,
) -> FacetClip {
    let mut enter_fraction = -1.0f32;
    let mut leave_fraction = 1.0f32;
    let mut enter_plane = None;
    let mut leave_plane = None;
    let mut start_out = false;
    let mut end_out = false;

    for &index in facet.plane_indices() {
        let plane = &planes[index as usize];
        let corner = support_corner(&plane.normal, mins, maxs);
        let dist = plane.distance - plane.normal.dot(&corner);

        let d1 = plane.normal.dot(start) - dist;
        let d2 = plane.normal.dot(end) - dist;

        if d1 >= 0.0 {
            start_out = true;
        }
        if d2 >= 0.0 {
            end_out = true;
        }

        // Completely in front of this plane for the whole move
        if d1 >= 0.0 && d2 >= 0.0 {
            return FacetClip::Miss;
        }

        // Completely behind it, so it does not clip the move
        if d1 < 0.0 && d2 < 0.0 {
            continue;
        }

        let fraction = d1 / (d1 - d2);
        if d1 >= 0.0 {
            if fraction > enter_fraction {
                enter_fraction = fraction;
                enter_plane = Some(index);
            }
        } else if fraction <= leave_fraction {
            leave_fraction = fraction;
            leave_plane = Some(index);
        }
    }

    if !start_out {
        let exit = if end_out {
            leave_plane.map(|plane| (leave_fraction.clamp(0.0, 1.0), plane))
        } else {
            None
        };
        return FacetClip::StartSolid { exit };
    }

    match enter_plane {
        Some(plane) if enter_fraction <= leave_fraction => FacetClip::Enter {
            fraction: enter_fraction.clamp(0.0, 1.0),
            plane,
        },
        _ => FacetClip::Miss,
    }
}

/// Bounds of everything a box touches moving from `start` to `end`
pub fn swept_bounds(start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3) -> Aabb {
    Aabb::new(component_min(start, end) + mins, component_max(start, end) + maxs)
}

/// Sweep a box from `start` to `end` through a mesh.
///
/// `mins`/`maxs` are the box extents relative to its origin; pass zero
/// vectors for a point trace. An empty mesh never blocks.
pub fn sweep(mesh: &CollisionMesh, start: Vec3, mins: Vec3, maxs: Vec3, end: Vec3) -> TraceResult {
    let mut trace = TraceResult::miss(end);

    let Some(tree) = mesh.area_tree() else {
        return trace;
    };

    let bounds = swept_bounds(&start, &mins, &maxs, &end);
    if !bounds.intersects(&mesh.bounds()) {
        return trace;
    }

    let planes = mesh.planes();
    for facet_index in tree.walk(bounds) {
        let facet = &mesh.facets()[facet_index];
        if !facet.bounds.intersects(&bounds) {
            continue;
        }

        let limit = match clip_box_to_facet(planes, facet, &start, &end, &mins, &maxs) {
            FacetClip::Miss => None,
            FacetClip::Enter { fraction, plane } => Some((fraction, plane)),
            FacetClip::StartSolid { exit } => {
                trace.startsolid = true;
                if exit.is_none() {
                    trace.allsolid = true;
                    trace.fraction = 0.0;
                    trace.plane_normal = Vec3::zeros();
                    trace.hit_facet = Some(facet_index);
                    break;
                }
                exit
            }
        };

        if let Some((fraction, plane)) = limit {
            if fraction < trace.fraction {
                trace.fraction = fraction;
                trace.plane_normal = planes[plane as usize].normal;
                trace.hit_facet = Some(facet_index);
            }
        }
    }

    trace.endpos = if trace.fraction >= 1.0 {
        end
    } else {
        start + (end - start) * trace.fraction
    };
    trace
}

/// Index of the first facet strictly enclosing `point`, if any
pub fn point_contents(mesh: &CollisionMesh, point: Vec3) -> Option<usize> {
    let tree = mesh.area_tree()?;
    let query = Aabb::new(point, point);

    tree.walk(query).find(|&facet_index| {
        let facet = &mesh.facets()[facet_index];
        facet.bounds.contains_point(&point)
            && mesh
                .facet_planes(facet)
                .all(|plane| plane.distance_to(&point) < 0.0)
    })
}
