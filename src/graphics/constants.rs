//! Numeric capability values queried from the context, each computed at
//! most once per manager and memoized.

use std::collections::HashMap;
use std::sync::Mutex;

use gl::types::GLenum;

// ES-flavored enums the desktop core registry does not carry.
pub(crate) const GL_ALIASED_POINT_SIZE_RANGE: GLenum = 0x846D;
pub(crate) const GL_MAX_TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FF;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    AliasedLineWidthRange,
    AliasedPointSizeRange,
    MaxClipDistances,
    MaxColorAttachments,
    MaxCombinedTextureImageUnits,
    MaxCubeMapTextureSize,
    MaxDrawBuffers,
    MaxFragmentUniformComponents,
    MaxRenderbufferSize,
    MaxSamples,
    MaxTextureImageUnits,
    MaxTextureMaxAnisotropy,
    MaxTextureSize,
    MaxTransformFeedbackSeparateAttribs,
    MaxUniformBufferBindings,
    MaxVertexAttribs,
    MaxViewportDims,
}

/// A computed constant. The variant is fixed per [`Constant`]; asking for
/// another type yields `None` from the typed getter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Float(f32),
    IntPair([i32; 2]),
    FloatRange([f32; 2]),
}

/// Types a constant can be fetched as.
pub trait FromConstantValue: Sized {
    fn from_constant_value(value: ConstantValue) -> Option<Self>;
}

impl FromConstantValue for i32 {
    fn from_constant_value(value: ConstantValue) -> Option<Self> {
        match value {
            ConstantValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl FromConstantValue for f32 {
    fn from_constant_value(value: ConstantValue) -> Option<Self> {
        match value {
            ConstantValue::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl FromConstantValue for [i32; 2] {
    fn from_constant_value(value: ConstantValue) -> Option<Self> {
        match value {
            ConstantValue::IntPair(v) => Some(v),
            _ => None,
        }
    }
}

impl FromConstantValue for [f32; 2] {
    fn from_constant_value(value: ConstantValue) -> Option<Self> {
        match value {
            ConstantValue::FloatRange(v) => Some(v),
            _ => None,
        }
    }
}

/// The memoization table. The mutex spans computation, so two threads
/// racing on the same constant still issue a single GL query.
#[derive(Default)]
pub struct ConstantCache {
    values: Mutex<HashMap<Constant, ConstantValue>>,
}

impl ConstantCache {
    pub fn new() -> Self {
        ConstantCache::default()
    }

    pub fn get_or_compute<F>(&self, constant: Constant, compute: F) -> ConstantValue
    where
        F: FnOnce() -> ConstantValue,
    {
        let mut values = self.values.lock().unwrap();
        *values.entry(constant).or_insert_with(compute)
    }

    /// Drops every memoized value so the next query recomputes it.
    pub fn clear(&self) {
        self.values.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_at_most_once() {
        let cache = ConstantCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let value = cache.get_or_compute(Constant::MaxTextureSize, || {
                calls += 1;
                ConstantValue::Int(4096)
            });
            assert_eq!(value, ConstantValue::Int(4096));
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn typed_conversion_is_strict() {
        assert_eq!(i32::from_constant_value(ConstantValue::Int(8)), Some(8));
        assert_eq!(f32::from_constant_value(ConstantValue::Int(8)), None);
        assert_eq!(
            <[f32; 2]>::from_constant_value(ConstantValue::FloatRange([1.0, 64.0])),
            Some([1.0, 64.0])
        );
    }
}
