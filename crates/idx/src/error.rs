use spatium_geom::GeomError;
use thiserror::Error;

/// Failures raised by the tree arena and the point quadtree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("Child index {index} out of range (node has {count} children)")]
    ChildOutOfRange { index: usize, count: usize },

    #[error("Node does not belong to this tree")]
    UnknownNode,

    #[error("Node is already subdivided")]
    AlreadySubdivided,

    #[error("Point ({x}, {y}, {z}) lies outside the tree bounds")]
    OutsideBounds { x: f64, y: f64, z: f64 },

    #[error("Invalid quadtree configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Geometry(#[from] GeomError),
}

pub type Result<T> = std::result::Result<T, IndexError>;
