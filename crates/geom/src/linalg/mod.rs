pub mod matrix;
pub mod matrix4;
pub mod point;
pub mod vector;

pub use matrix::Matrix;
pub use matrix4::Matrix4x4;
pub use point::Point3;
pub use vector::Vector3;
