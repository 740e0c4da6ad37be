//! Spatial primitives used throughout the format: a 3-component vector, a
//! Source-engine Euler angle (pitch/yaw/roll, degrees, normalized to
//! `[0, 360)`), and the 3x3 rotation matrix that relates them.

mod angle;
mod matrix;
mod vector;

pub use angle::Angle;
pub use matrix::Matrix;
pub use vector::Vector;
