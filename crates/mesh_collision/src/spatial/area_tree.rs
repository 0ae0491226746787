//! Area tree spatial partitioning structure
//!
//! A small axis-aligned binary tree over a mesh's facet boxes. Each internal
//! node halves its box along the longest axis. A facet is linked into the
//! deepest node whose box holds it on one side of every split above it;
//! facets straddling a split stay on the node that owns the split. Nothing is
//! ever duplicated into both children, so node memory is bounded by the facet
//! count and the walk never yields a facet twice.
//!
//! Trees are sized for per-entity meshes of a few hundred to a few thousand
//! triangles: a handful of levels and a fixed node budget.

use std::collections::VecDeque;

use crate::core::CollisionConfig;
use crate::physics::collision::Aabb;

/// Construction limits for an area tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaTreeLimits {
    /// Maximum depth (root is depth 0)
    pub max_depth: usize,
    /// Maximum number of nodes
    pub max_nodes: usize,
    /// Nodes holding this many facets or fewer stay leaves
    pub leaf_facets: usize,
}

impl From<&CollisionConfig> for AreaTreeLimits {
    fn from(config: &CollisionConfig) -> Self {
        Self {
            max_depth: config.area_depth,
            max_nodes: config.area_nodes,
            leaf_facets: config.area_leaf_facets,
        }
    }
}

impl Default for AreaTreeLimits {
    fn default() -> Self {
        Self::from(&CollisionConfig::default())
    }
}

/// Split plane of an internal node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaSplit {
    /// Axis the node is split along (0 = X, 1 = Y, 2 = Z)
    pub axis: usize,
    /// Position of the split on that axis
    pub distance: f32,
    /// Child node indices: `[below, above]` the split
    pub children: [usize; 2],
}

/// Single node in the area tree
#[derive(Debug, Clone)]
pub struct AreaNode {
    /// Bounds of the region this node covers
    pub bounds: Aabb,
    /// Split plane and children, `None` for leaves
    pub split: Option<AreaSplit>,
    /// Facets linked to this node (straddlers on internal nodes)
    pub facets: Vec<u32>,
    /// Depth in the tree (0 = root)
    pub depth: usize,
}

impl AreaNode {
    fn new(bounds: Aabb, depth: usize) -> Self {
        Self {
            bounds,
            split: None,
            facets: Vec::new(),
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }
}

/// Area tree over a set of facet boxes
#[derive(Debug, Clone)]
pub struct AreaTree {
    nodes: Vec<AreaNode>,
}

impl AreaTree {
    /// Build a tree covering `bounds` over the given facet boxes.
    ///
    /// Facet `i` is referenced by index `i` into `facet_bounds`. Every box
    /// must lie inside `bounds`. Nodes are created breadth first, so a
    /// tight node budget trims the deepest levels evenly rather than
    /// starving one side of the tree.
    pub fn build(facet_bounds: &[Aabb], bounds: Aabb, limits: AreaTreeLimits) -> Self {
        let max_nodes = limits.max_nodes.max(1);
        let mut nodes = vec![AreaNode::new(bounds, 0)];
        let mut pending = VecDeque::new();
        pending.push_back((0usize, (0..facet_bounds.len() as u32).collect::<Vec<_>>()));

        while let Some((index, facets)) = pending.pop_front() {
            let node_bounds = nodes[index].bounds;
            let depth = nodes[index].depth;

            let can_split = depth < limits.max_depth
                && facets.len() > limits.leaf_facets
                && nodes.len() + 2 <= max_nodes;
            if !can_split {
                nodes[index].facets = facets;
                continue;
            }

            let axis = node_bounds.largest_axis();
            let distance = node_bounds.center()[axis];

            let mut below = Vec::new();
            let mut above = Vec::new();
            let mut straddling = Vec::new();
            for facet in facets {
                let facet_box = &facet_bounds[facet as usize];
                if facet_box.max[axis] < distance {
                    below.push(facet);
                } else if facet_box.min[axis] > distance {
                    above.push(facet);
                } else {
                    straddling.push(facet);
                }
            }

            // Everything straddles: splitting would only burn node budget
            if below.is_empty() && above.is_empty() {
                nodes[index].facets = straddling;
                continue;
            }

            let mut below_bounds = node_bounds;
            below_bounds.max[axis] = distance;
            let mut above_bounds = node_bounds;
            above_bounds.min[axis] = distance;

            let below_index = nodes.len();
            nodes.push(AreaNode::new(below_bounds, depth + 1));
            let above_index = nodes.len();
            nodes.push(AreaNode::new(above_bounds, depth + 1));

            let node = &mut nodes[index];
            node.split = Some(AreaSplit {
                axis,
                distance,
                children: [below_index, above_index],
            });
            node.facets = straddling;

            pending.push_back((below_index, below));
            pending.push_back((above_index, above));
        }

        Self { nodes }
    }

    /// Root node
    pub fn root(&self) -> &AreaNode {
        &self.nodes[0]
    }

    /// All nodes; index 0 is the root
    pub fn nodes(&self) -> &[AreaNode] {
        &self.nodes
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Deepest node depth
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Total facet references held by all nodes
    pub fn linked_facet_count(&self) -> usize {
        self.nodes.iter().map(|node| node.facets.len()).sum()
    }

    /// Lazily visit every facet linked to a node whose box overlaps `query`.
    ///
    /// Straddling facets on internal nodes are yielded whenever their node is
    /// visited. No facet index is yielded twice.
    pub fn walk(&self, query: Aabb) -> AreaWalk<'_> {
        let mut stack = Vec::with_capacity(8);
        if self.root().bounds.intersects(&query) {
            stack.push(0);
        }
        AreaWalk {
            tree: self,
            query,
            stack,
            current: [].iter(),
        }
    }

    /// Approximate heap usage in bytes
    pub fn memory_bytes(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<AreaNode>()
            + self
                .nodes
                .iter()
                .map(|node| node.facets.capacity() * std::mem::size_of::<u32>())
                .sum::<usize>()
    }
}

/// Iterator returned by [`AreaTree::walk`]
#[derive(Debug, Clone)]
pub struct AreaWalk<'a> {
    tree: &'a AreaTree,
    query: Aabb,
    stack: Vec<usize>,
    current: std::slice::Iter<'a, u32>,
}

impl Iterator for AreaWalk<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some(&facet) = self.current.next() {
                return Some(facet as usize);
            }

            let tree = self.tree;
            let node = &tree.nodes[self.stack.pop()?];
            if let Some(split) = &node.split {
                for &child in split.children.iter().rev() {
                    if tree.nodes[child].bounds.intersects(&self.query) {
                        self.stack.push(child);
                    }
                }
            }
            self.current = node.facets.iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use std::collections::HashSet;

    fn unit_box_at(x: f32, y: f32, z: f32) -> Aabb {
        Aabb::new(Vec3::new(x, y, z), Vec3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    fn grid_boxes() -> Vec<Aabb> {
        let mut boxes = Vec::new();
        for x in 0..8 {
            for y in 0..8 {
                boxes.push(unit_box_at(x as f32 * 2.0 + 0.25, y as f32 * 2.0 + 0.25, 0.0));
            }
        }
        boxes
    }

    fn bounds_of(boxes: &[Aabb]) -> Aabb {
        boxes.iter().fold(Aabb::empty(), |acc, b| acc.union(b))
    }

    #[test]
    fn test_few_facets_stay_in_root() {
        let boxes = vec![unit_box_at(0.0, 0.0, 0.0), unit_box_at(5.0, 0.0, 0.0)];
        let tree = AreaTree::build(&boxes, bounds_of(&boxes), AreaTreeLimits::default());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().facets.len(), 2);
    }

    #[test]
    fn test_limits_are_respected() {
        let boxes = grid_boxes();
        let limits = AreaTreeLimits { max_depth: 4, max_nodes: 32, leaf_facets: 1 };
        let tree = AreaTree::build(&boxes, bounds_of(&boxes), limits);
        assert!(tree.node_count() <= 32);
        assert!(tree.depth() <= 4);
        assert!(tree.node_count() > 1);

        let tight = AreaTreeLimits { max_depth: 10, max_nodes: 5, leaf_facets: 1 };
        let tree = AreaTree::build(&boxes, bounds_of(&boxes), tight);
        assert!(tree.node_count() <= 5);
    }

    #[test]
    fn test_every_facet_linked_exactly_once() {
        let boxes = grid_boxes();
        let tree = AreaTree::build(&boxes, bounds_of(&boxes), AreaTreeLimits::default());
        assert_eq!(tree.linked_facet_count(), boxes.len());

        let mut seen = HashSet::new();
        for node in tree.nodes() {
            for &facet in &node.facets {
                assert!(seen.insert(facet));
                assert!(boxes[facet as usize].min.x >= node.bounds.min.x);
                assert!(boxes[facet as usize].max.x <= node.bounds.max.x);
            }
        }
    }

    #[test]
    fn test_straddling_facet_stays_on_parent() {
        let mut boxes = vec![
            unit_box_at(0.0, 0.0, 0.0),
            unit_box_at(1.5, 0.0, 0.0),
            unit_box_at(14.0, 0.0, 0.0),
            unit_box_at(12.5, 0.0, 0.0),
        ];
        // Spans the root's X midpoint
        boxes.push(Aabb::new(Vec3::new(6.0, 0.0, 0.0), Vec3::new(9.0, 1.0, 1.0)));
        let limits = AreaTreeLimits { max_depth: 4, max_nodes: 32, leaf_facets: 1 };
        let tree = AreaTree::build(&boxes, bounds_of(&boxes), limits);

        let root = tree.root();
        let split = root.split.expect("root should split");
        assert_eq!(split.axis, 0);
        assert_eq!(root.facets, vec![4]);
    }

    #[test]
    fn test_walk_matches_brute_force() {
        let boxes = grid_boxes();
        let limits = AreaTreeLimits { max_depth: 4, max_nodes: 32, leaf_facets: 2 };
        let tree = AreaTree::build(&boxes, bounds_of(&boxes), limits);

        let queries = [
            Aabb::new(Vec3::new(3.0, 3.0, -1.0), Vec3::new(6.0, 4.0, 1.0)),
            Aabb::new(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(0.5, 0.5, 0.5)),
            Aabb::new(Vec3::new(7.9, -1.0, 0.0), Vec3::new(8.1, 20.0, 0.0)),
        ];
        for query in queries {
            let walked: Vec<usize> = tree.walk(query).collect();
            let unique: HashSet<usize> = walked.iter().copied().collect();
            assert_eq!(unique.len(), walked.len(), "walk yielded a duplicate");

            for (index, facet_box) in boxes.iter().enumerate() {
                if facet_box.intersects(&query) {
                    assert!(unique.contains(&index), "missed facet {index}");
                }
            }
        }
    }

    #[test]
    fn test_walk_outside_yields_nothing() {
        let boxes = grid_boxes();
        let tree = AreaTree::build(&boxes, bounds_of(&boxes), AreaTreeLimits::default());
        let far = Aabb::new(Vec3::repeat(100.0), Vec3::repeat(101.0));
        assert_eq!(tree.walk(far).count(), 0);
    }
}
