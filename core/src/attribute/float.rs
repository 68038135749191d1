//! Float-attribute conveniences: construction from geometric vector
//! collections, typed readback, and in-place matrix application.
//!
//! All transforms walk the storage once with a per-iteration scratch
//! value and record a full-extent change, since every item is rewritten.

use crate::math::{Mat3, Mat4, Vec2, Vec3, Vec4};

use super::{AttributeError, BufferAttribute};

impl BufferAttribute<f32> {
    /// Build an `item_size == 2` attribute from 2D vectors (UVs).
    pub fn from_vec2s(vectors: &[Vec2]) -> Self {
        let mut elements = Vec::with_capacity(vectors.len() * 2);
        for v in vectors {
            elements.extend_from_slice(&[v.x, v.y]);
        }
        Self::from_elements_unchecked(elements, 2)
    }

    /// Build an `item_size == 3` attribute from 3D vectors (positions,
    /// normals, colors).
    pub fn from_vec3s(vectors: &[Vec3]) -> Self {
        let mut elements = Vec::with_capacity(vectors.len() * 3);
        for v in vectors {
            elements.extend_from_slice(&[v.x, v.y, v.z]);
        }
        Self::from_elements_unchecked(elements, 3)
    }

    /// Build an `item_size == 4` attribute from 4D vectors (tangents,
    /// RGBA colors).
    pub fn from_vec4s(vectors: &[Vec4]) -> Self {
        let mut elements = Vec::with_capacity(vectors.len() * 4);
        for v in vectors {
            elements.extend_from_slice(&[v.x, v.y, v.z, v.w]);
        }
        Self::from_elements_unchecked(elements, 4)
    }

    fn check_item_size(&self, expected: usize) -> Result<(), AttributeError> {
        if self.item_size() != expected {
            return Err(AttributeError::ItemSizeMismatch {
                expected,
                found: self.item_size(),
            });
        }
        Ok(())
    }

    fn check_item_count(&self, found: usize) -> Result<(), AttributeError> {
        if found != self.item_count() {
            return Err(AttributeError::CountMismatch {
                expected: self.item_count(),
                found,
            });
        }
        Ok(())
    }

    /// Overwrite the whole store from 2D vectors. Full-extent change.
    pub fn copy_vec2s(&mut self, vectors: &[Vec2]) -> Result<(), AttributeError> {
        self.check_item_size(2)?;
        self.check_item_count(vectors.len())?;
        for (item, v) in self.elements_mut().chunks_exact_mut(2).zip(vectors) {
            item[0] = v.x;
            item[1] = v.y;
        }
        self.mark_changed();
        Ok(())
    }

    /// Overwrite the whole store from 3D vectors. Full-extent change.
    pub fn copy_vec3s(&mut self, vectors: &[Vec3]) -> Result<(), AttributeError> {
        self.check_item_size(3)?;
        self.check_item_count(vectors.len())?;
        for (item, v) in self.elements_mut().chunks_exact_mut(3).zip(vectors) {
            item[0] = v.x;
            item[1] = v.y;
            item[2] = v.z;
        }
        self.mark_changed();
        Ok(())
    }

    /// Overwrite the whole store from 4D vectors. Full-extent change.
    pub fn copy_vec4s(&mut self, vectors: &[Vec4]) -> Result<(), AttributeError> {
        self.check_item_size(4)?;
        self.check_item_count(vectors.len())?;
        for (item, v) in self.elements_mut().chunks_exact_mut(4).zip(vectors) {
            item[0] = v.x;
            item[1] = v.y;
            item[2] = v.z;
            item[3] = v.w;
        }
        self.mark_changed();
        Ok(())
    }

    /// Read one item as a 2D vector.
    pub fn vec2(&self, item: usize) -> Result<Vec2, AttributeError> {
        self.check_item_size(2)?;
        let i = self.item(item)?;
        Ok(Vec2::new(i[0], i[1]))
    }

    /// Read one item as a 3D vector.
    pub fn vec3(&self, item: usize) -> Result<Vec3, AttributeError> {
        self.check_item_size(3)?;
        let i = self.item(item)?;
        Ok(Vec3::new(i[0], i[1], i[2]))
    }

    /// Read one item as a 4D vector.
    pub fn vec4(&self, item: usize) -> Result<Vec4, AttributeError> {
        self.check_item_size(4)?;
        let i = self.item(item)?;
        Ok(Vec4::new(i[0], i[1], i[2], i[3]))
    }

    /// Apply a 3x3 matrix to every item.
    ///
    /// `item_size == 2` items are treated as affine 2D points (UV
    /// transforms); `item_size == 3` items are transformed directly.
    /// Full-extent change.
    pub fn apply_matrix3(&mut self, m: &Mat3) -> Result<(), AttributeError> {
        match self.item_size() {
            2 => {
                for item in self.elements_mut().chunks_exact_mut(2) {
                    let v = m * Vec3::new(item[0], item[1], 1.0);
                    item[0] = v.x;
                    item[1] = v.y;
                }
            }
            3 => {
                for item in self.elements_mut().chunks_exact_mut(3) {
                    let v = m * Vec3::new(item[0], item[1], item[2]);
                    item[0] = v.x;
                    item[1] = v.y;
                    item[2] = v.z;
                }
            }
            found => {
                return Err(AttributeError::ItemSizeMismatch { expected: 3, found });
            }
        }
        self.mark_changed();
        Ok(())
    }

    /// Apply a 4x4 matrix to every `item_size == 3` item as a point,
    /// with perspective divide. Full-extent change.
    pub fn apply_matrix4(&mut self, m: &Mat4) -> Result<(), AttributeError> {
        self.check_item_size(3)?;
        for item in self.elements_mut().chunks_exact_mut(3) {
            let v = m * Vec4::new(item[0], item[1], item[2], 1.0);
            let inv_w = if v.w != 0.0 { 1.0 / v.w } else { 1.0 };
            item[0] = v.x * inv_w;
            item[1] = v.y * inv_w;
            item[2] = v.z * inv_w;
        }
        self.mark_changed();
        Ok(())
    }

    /// Apply a normal matrix to every `item_size == 3` item and
    /// renormalize. Full-extent change.
    pub fn apply_normal_matrix(&mut self, m: &Mat3) -> Result<(), AttributeError> {
        self.check_item_size(3)?;
        for item in self.elements_mut().chunks_exact_mut(3) {
            let mut v = m * Vec3::new(item[0], item[1], item[2]);
            let norm = v.norm();
            if norm > 0.0 {
                v /= norm;
            }
            item[0] = v.x;
            item[1] = v.y;
            item[2] = v.z;
        }
        self.mark_changed();
        Ok(())
    }

    /// Rotate every `item_size == 3` item by the upper 3x3 block of a
    /// 4x4 matrix and renormalize (direction vectors ignore
    /// translation). Full-extent change.
    pub fn transform_direction(&mut self, m: &Mat4) -> Result<(), AttributeError> {
        self.check_item_size(3)?;
        let rotation: Mat3 = m.fixed_view::<3, 3>(0, 0).into_owned();
        for item in self.elements_mut().chunks_exact_mut(3) {
            let mut v = rotation * Vec3::new(item[0], item[1], item[2]);
            let norm = v.norm();
            if norm > 0.0 {
                v /= norm;
            }
            item[0] = v.x;
            item[1] = v.y;
            item[2] = v.z;
        }
        self.mark_changed();
        Ok(())
    }
}
