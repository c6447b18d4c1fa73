//! Math types used by uniforms and pipeline state, re-exported from `cgmath`.

pub use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// An axis-aligned integer rectangle in window coordinates, used for
/// viewports and scissor boxes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// A half-open byte range into a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: usize,
    pub len: usize,
}

impl ByteRange {
    #[inline]
    pub fn new(offset: usize, len: usize) -> Self {
        ByteRange { offset, len }
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The smallest range covering both `self` and `other`.
    pub fn union(&self, other: &ByteRange) -> ByteRange {
        use std::cmp::{max, min};
        let offset = min(self.offset, other.offset);
        ByteRange {
            offset,
            len: max(self.end(), other.end()) - offset,
        }
    }
}

/// Absolute-difference comparison for uniform floats; uniform values come
/// from client computations and survive a round-trip through merges, so
/// exact equality is too strict.
#[inline]
pub fn almost_equal(lhs: f32, rhs: f32) -> bool {
    (lhs - rhs).abs() <= 1e-6 * lhs.abs().max(rhs.abs()).max(1.0)
}
