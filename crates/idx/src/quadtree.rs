use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use spatium_geom::Point3;

use crate::bounds::Bounds;
use crate::error::{IndexError, Result};
use crate::tree::{NodeId, Tree};

/// Split and depth limits for a [`PointQuadtree`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// A leaf is split into four when it would exceed this many points.
    pub max_points_per_leaf: usize,
    /// Leaves at this depth keep accepting points instead of splitting.
    pub max_depth: usize,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_points_per_leaf: 100,
            max_depth: 32,
        }
    }
}

impl QuadtreeConfig {
    pub fn with_leaf_capacity(max_points_per_leaf: usize) -> Self {
        Self {
            max_points_per_leaf,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_points_per_leaf == 0 {
            return Err(IndexError::InvalidConfig {
                reason: "max_points_per_leaf must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Object stored in every quadtree node: its bounds and, for leaves, its points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointQuadtreeNode {
    bounds: Bounds,
    points: Vec<Point3>,
}

impl PointQuadtreeNode {
    fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            points: Vec::new(),
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }
}

/// Point index that splits space into x/y quadrants.
///
/// Leaves hold points; a subdivided node holds none and has exactly four
/// children, indexed as in [`PointQuadtree::determine_child`].
#[derive(Debug, Clone)]
pub struct PointQuadtree {
    tree: Tree<PointQuadtreeNode>,
    bounds: Bounds,
    config: QuadtreeConfig,
    len: usize,
}

/// Max-heap entry for k-nearest search; the farthest candidate sits on top.
struct Candidate {
    distance_squared: f64,
    point: Point3,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance_squared == other.distance_squared
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared.total_cmp(&other.distance_squared)
    }
}

impl PointQuadtree {
    pub fn new(bounds: Bounds, config: QuadtreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tree: Tree::new(PointQuadtreeNode::new(bounds)),
            bounds,
            config,
            len: 0,
        })
    }

    /// Index `points` in a tree whose x/y bounds are their minimum bounding
    /// square.
    #[instrument(skip(points), fields(count = points.len()))]
    pub fn build_from_points(points: &[Point3], config: QuadtreeConfig) -> Result<Self> {
        let bounds = match Bounds::from_points(points) {
            Some(b) => b.square_xy(),
            None => Bounds::from_min_max(Point3::ORIGIN, Point3::ORIGIN)?,
        };
        let mut tree = Self::new(bounds, config)?;
        for p in points {
            tree.insert(*p)?;
        }
        info!(
            points = tree.len,
            nodes = tree.tree.len(),
            depth = tree.depth(),
            "built point quadtree"
        );
        Ok(tree)
    }

    /// Add a point, splitting the receiving leaf when it is full.
    pub fn insert(&mut self, point: Point3) -> Result<()> {
        if !self.bounds.contains(&point) {
            return Err(IndexError::OutsideBounds {
                x: point.x,
                y: point.y,
                z: point.z,
            });
        }

        let mut id = self.tree.root();
        let mut depth = 0;
        loop {
            let node = self.tree.node(id)?;
            if node.has_children() {
                let (index, _) = Self::determine_child(&node.object().bounds, &point);
                id = self.tree.child(id, index)?;
                depth += 1;
                continue;
            }
            let full = node.object().points.len() + 1 > self.config.max_points_per_leaf;
            if full && depth < self.config.max_depth {
                // Redistribute, then descend into the new children.
                self.create_children(id)?;
                continue;
            }
            self.tree.object_mut(id)?.points.push(point);
            self.len += 1;
            return Ok(());
        }
    }

    /// Give a leaf its four quadrant children and move its points into them.
    #[instrument(level = "debug", skip(self))]
    pub fn create_children(&mut self, node: NodeId) -> Result<()> {
        if self.tree.has_children(node)? {
            return Err(IndexError::AlreadySubdivided);
        }
        let object = self.tree.object_mut(node)?;
        let bounds = object.bounds;
        let points = std::mem::take(&mut object.points);

        let mut children = [node; 4];
        for (i, child) in children.iter_mut().enumerate() {
            *child = self
                .tree
                .add_child(node, PointQuadtreeNode::new(bounds.quadrant(i)?))?;
        }
        let moved = points.len();
        for p in points {
            let (index, _) = Self::determine_child(&bounds, &p);
            self.tree.object_mut(children[index])?.points.push(p);
        }
        debug!(moved, "subdivided quadtree node");
        Ok(())
    }

    pub fn child(&self, node: NodeId, index: usize) -> Result<NodeId> {
        self.tree.child(node, index)
    }

    /// Quadrant of `bounds` that receives `point`, with that quadrant's bounds.
    ///
    /// 0 = x < cx, y < cy; 1 = x ≥ cx, y < cy; 2 = x < cx, y ≥ cy;
    /// 3 = x ≥ cx, y ≥ cy.
    pub fn determine_child(bounds: &Bounds, point: &Point3) -> (usize, Bounds) {
        let c = bounds.center();
        let mut index = 0;
        if point.x >= c.x {
            index |= 1;
        }
        if point.y >= c.y {
            index |= 2;
        }
        // Indices below four always have a quadrant.
        let child = bounds.quadrant(index).unwrap_or(*bounds);
        (index, child)
    }

    /// Every stored point inside `region` (inclusive).
    pub fn query_region(&self, region: &Bounds) -> Vec<Point3> {
        self.collect(
            |bounds| bounds.intersects(region),
            |p| region.contains(p),
        )
    }

    /// Every stored point within `radius` of `center` (inclusive).
    pub fn query_radius(&self, center: &Point3, radius: f64) -> Vec<Point3> {
        if !(radius >= 0.0) {
            return Vec::new();
        }
        let r2 = radius * radius;
        self.collect(
            |bounds| bounds.distance_squared_to(center) <= r2,
            |p| p.distance_squared_to(center) <= r2,
        )
    }

    fn collect(&self, visit: impl Fn(&Bounds) -> bool, keep: impl Fn(&Point3) -> bool) -> Vec<Point3> {
        let mut found = Vec::new();
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            let Ok(node) = self.tree.node(id) else {
                continue;
            };
            if !visit(&node.object().bounds) {
                continue;
            }
            if node.has_children() {
                stack.extend_from_slice(node.children());
            } else {
                found.extend(node.object().points.iter().filter(|p| keep(*p)).copied());
            }
        }
        found
    }

    pub fn nearest(&self, point: &Point3) -> Option<Point3> {
        self.k_nearest(point, 1).into_iter().next()
    }

    /// Up to `k` stored points ordered by distance to `point`, closest first.
    pub fn k_nearest(&self, point: &Point3, k: usize) -> Vec<Point3> {
        if k == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.k_nearest_recursive(self.tree.root(), point, k, &mut heap);
        heap.into_sorted_vec().into_iter().map(|c| c.point).collect()
    }

    fn k_nearest_recursive(&self, id: NodeId, point: &Point3, k: usize, heap: &mut BinaryHeap<Candidate>) {
        let Ok(node) = self.tree.node(id) else {
            return;
        };
        let bound = node.object().bounds.distance_squared_to(point);
        if heap.len() >= k && heap.peek().is_some_and(|worst| bound >= worst.distance_squared) {
            return;
        }

        if !node.has_children() {
            for p in &node.object().points {
                let distance_squared = p.distance_squared_to(point);
                if heap.len() < k {
                    heap.push(Candidate {
                        distance_squared,
                        point: *p,
                    });
                } else if heap.peek().is_some_and(|worst| distance_squared < worst.distance_squared) {
                    heap.pop();
                    heap.push(Candidate {
                        distance_squared,
                        point: *p,
                    });
                }
            }
            return;
        }

        // Visit nearer quadrants first for tighter pruning.
        let mut children: Vec<(f64, NodeId)> = node
            .children()
            .iter()
            .filter_map(|&child| {
                let bounds = self.tree.object(child).ok()?.bounds;
                Some((bounds.distance_squared_to(point), child))
            })
            .collect();
        children.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, child) in children {
            self.k_nearest_recursive(child, point, k, heap);
        }
    }

    /// Remove one stored point equal to `point`; `false` if none is stored.
    ///
    /// Afterwards, four leaf siblings whose points fit in a single leaf are
    /// merged back into their parent.
    pub fn remove(&mut self, point: &Point3) -> bool {
        if !self.bounds.contains(point) {
            return false;
        }

        // Insertion routes points with `determine_child`; follow the same path.
        let mut path = vec![self.tree.root()];
        loop {
            let id = path[path.len() - 1];
            let Ok(node) = self.tree.node(id) else {
                return false;
            };
            if !node.has_children() {
                break;
            }
            let (index, _) = Self::determine_child(&node.object().bounds, point);
            match self.tree.child(id, index) {
                Ok(child) => path.push(child),
                Err(_) => return false,
            }
        }

        let Some(leaf) = path.pop() else {
            return false;
        };
        let Ok(object) = self.tree.object_mut(leaf) else {
            return false;
        };
        let Some(position) = object.points.iter().position(|p| p == point) else {
            return false;
        };
        object.points.swap_remove(position);
        self.len -= 1;

        while let Some(parent) = path.pop() {
            if !self.try_collapse(parent) {
                break;
            }
        }
        true
    }

    // Merge the children of `id` into it when they are all leaves and their
    // points fit in one leaf.
    fn try_collapse(&mut self, id: NodeId) -> bool {
        let Ok(children) = self.tree.children(id) else {
            return false;
        };
        let mut total = 0;
        for &child in children {
            match self.tree.node(child) {
                Ok(node) if !node.has_children() => total += node.object().points.len(),
                _ => return false,
            }
        }
        if total > self.config.max_points_per_leaf {
            return false;
        }

        let Ok(removed) = self.tree.remove_children(id) else {
            return false;
        };
        let merged: Vec<Point3> = removed.into_iter().flat_map(|node| node.points).collect();
        debug!(points = merged.len(), "collapsed quadtree node");
        match self.tree.object_mut(id) {
            Ok(object) => {
                object.points = merged;
                true
            }
            Err(_) => false,
        }
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn config(&self) -> &QuadtreeConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn tree(&self) -> &Tree<PointQuadtreeNode> {
        &self.tree
    }

    /// Depth of the deepest node; a lone root has depth 0.
    pub fn depth(&self) -> usize {
        self.tree.depth_first().map(|(depth, _)| depth).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        self.tree
            .depth_first()
            .filter(|&(_, id)| matches!(self.tree.has_children(id), Ok(false)))
            .count()
    }

    /// All stored points in depth-first order.
    pub fn points(&self) -> Vec<Point3> {
        self.tree
            .depth_first()
            .filter_map(|(_, id)| self.tree.object(id).ok())
            .flat_map(|node| node.points.iter().copied())
            .collect()
    }
}
