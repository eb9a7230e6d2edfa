//! Spatial indexing on top of `spatium-geom`: axis-aligned bounds, a generic
//! arena tree and a point quadtree.

pub mod bounds;
pub mod error;
pub mod quadtree;
pub mod tree;

pub use bounds::Bounds;
pub use error::{IndexError, Result};
pub use quadtree::{PointQuadtree, PointQuadtreeNode, QuadtreeConfig};
pub use tree::{DepthFirst, NodeId, Tree, TreeNode};
