//! Small fixed-size numeric types.
//!
//! Conventions:
//! - Matrices are stored row-major.
//! - Affine helpers on [`Mat3`] follow the row-vector convention: a point is a
//!   row `(x, y, 1)` multiplied on the left, so the translation lives in the
//!   last row and `a * b` applies `a` first.

mod color;
mod matrix;
mod vector;

pub use color::Color;
pub use matrix::{Mat2, Mat3, Mat4, Matrix};
pub use vector::{Vec2, Vec3, Vec4, Vector};
