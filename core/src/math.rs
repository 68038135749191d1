//! Math type aliases and helper functions.
//!
//! Thin f32 aliases over `nalgebra` so the rest of the engine never
//! spells out the generic types.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 3x3 matrix (f32).
pub type Mat3 = nalgebra::Matrix3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Compute the normal matrix for a model matrix: the inverse-transpose of
/// its upper 3x3 block.
///
/// Returns `None` when the upper 3x3 block is singular (degenerate scale).
pub fn normal_matrix(m: &Mat4) -> Option<Mat3> {
    let upper: Mat3 = m.fixed_view::<3, 3>(0, 0).into_owned();
    upper.try_inverse().map(|inv| inv.transpose())
}
