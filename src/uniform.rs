//! Typed uniform values and the merge algorithm the traversal uniform
//! stack is built on.
//!
//! A uniform identifies a declared shader input (registry + index) plus a
//! run of values starting at `array_index`. During traversal, a child
//! node's uniform is merged over its ancestor's: when the child covers the
//! whole ancestor range the child simply wins, otherwise the two runs are
//! combined over the union of their ranges with the child taking
//! precedence wherever both supply a value.

use std::sync::Arc;

use crate::math::{almost_equal, Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};
use crate::registry::ShaderInputRegistryPtr;
use crate::texture::TexturePtr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    UnsignedInt,
    Float,
    FloatVector2,
    FloatVector3,
    FloatVector4,
    IntVector2,
    IntVector3,
    IntVector4,
    UnsignedIntVector2,
    UnsignedIntVector3,
    UnsignedIntVector4,
    Matrix2x2,
    Matrix3x3,
    Matrix4x4,
    Texture,
    CubeMapTexture,
}

/// The payload of a uniform: one vector per representable element type.
/// A run of length one is a plain (non-array) uniform.
#[derive(Clone, Debug)]
pub enum UniformValues {
    Int(Vec<i32>),
    UnsignedInt(Vec<u32>),
    Float(Vec<f32>),
    FloatVector2(Vec<Vector2<f32>>),
    FloatVector3(Vec<Vector3<f32>>),
    FloatVector4(Vec<Vector4<f32>>),
    IntVector2(Vec<Vector2<i32>>),
    IntVector3(Vec<Vector3<i32>>),
    IntVector4(Vec<Vector4<i32>>),
    UnsignedIntVector2(Vec<Vector2<u32>>),
    UnsignedIntVector3(Vec<Vector3<u32>>),
    UnsignedIntVector4(Vec<Vector4<u32>>),
    Matrix2x2(Vec<Matrix2<f32>>),
    Matrix3x3(Vec<Matrix3<f32>>),
    Matrix4x4(Vec<Matrix4<f32>>),
    Texture(Vec<TexturePtr>),
    CubeMapTexture(Vec<TexturePtr>),
}

impl UniformValues {
    pub fn value_type(&self) -> ValueType {
        match self {
            UniformValues::Int(_) => ValueType::Int,
            UniformValues::UnsignedInt(_) => ValueType::UnsignedInt,
            UniformValues::Float(_) => ValueType::Float,
            UniformValues::FloatVector2(_) => ValueType::FloatVector2,
            UniformValues::FloatVector3(_) => ValueType::FloatVector3,
            UniformValues::FloatVector4(_) => ValueType::FloatVector4,
            UniformValues::IntVector2(_) => ValueType::IntVector2,
            UniformValues::IntVector3(_) => ValueType::IntVector3,
            UniformValues::IntVector4(_) => ValueType::IntVector4,
            UniformValues::UnsignedIntVector2(_) => ValueType::UnsignedIntVector2,
            UniformValues::UnsignedIntVector3(_) => ValueType::UnsignedIntVector3,
            UniformValues::UnsignedIntVector4(_) => ValueType::UnsignedIntVector4,
            UniformValues::Matrix2x2(_) => ValueType::Matrix2x2,
            UniformValues::Matrix3x3(_) => ValueType::Matrix3x3,
            UniformValues::Matrix4x4(_) => ValueType::Matrix4x4,
            UniformValues::Texture(_) => ValueType::Texture,
            UniformValues::CubeMapTexture(_) => ValueType::CubeMapTexture,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            UniformValues::Int(v) => v.len(),
            UniformValues::UnsignedInt(v) => v.len(),
            UniformValues::Float(v) => v.len(),
            UniformValues::FloatVector2(v) => v.len(),
            UniformValues::FloatVector3(v) => v.len(),
            UniformValues::FloatVector4(v) => v.len(),
            UniformValues::IntVector2(v) => v.len(),
            UniformValues::IntVector3(v) => v.len(),
            UniformValues::IntVector4(v) => v.len(),
            UniformValues::UnsignedIntVector2(v) => v.len(),
            UniformValues::UnsignedIntVector3(v) => v.len(),
            UniformValues::UnsignedIntVector4(v) => v.len(),
            UniformValues::Matrix2x2(v) => v.len(),
            UniformValues::Matrix3x3(v) => v.len(),
            UniformValues::Matrix4x4(v) => v.len(),
            UniformValues::Texture(v) => v.len(),
            UniformValues::CubeMapTexture(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct Uniform {
    registry: Option<ShaderInputRegistryPtr>,
    index: usize,
    value_type: ValueType,
    array_index: usize,
    values: UniformValues,
}

impl Uniform {
    pub fn new(
        registry: &ShaderInputRegistryPtr,
        index: usize,
        value_type: ValueType,
        array_index: usize,
        values: UniformValues,
    ) -> Self {
        debug_assert!(!values.is_empty());
        debug_assert_eq!(value_type, values.value_type());
        Uniform {
            registry: Some(Arc::clone(registry)),
            index,
            value_type,
            array_index,
            values,
        }
    }

    /// The sentinel an out-of-band lookup returns; merges and comparisons
    /// involving it are no-ops.
    pub fn invalid() -> Self {
        Uniform {
            registry: None,
            index: 0,
            value_type: ValueType::Int,
            array_index: 0,
            values: UniformValues::Int(Vec::new()),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.registry.is_some() && !self.values.is_empty()
    }

    pub fn registry(&self) -> Option<&ShaderInputRegistryPtr> {
        self.registry.as_ref()
    }

    #[inline]
    pub fn registry_index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[inline]
    pub fn array_index(&self) -> usize {
        self.array_index
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &UniformValues {
        &self.values
    }

    /// True when `self` and `other` name the same input: same registry
    /// instance, same index, same type. Values are not compared.
    pub fn refers_to_same_input(&self, other: &Uniform) -> bool {
        match (&self.registry, &other.registry) {
            (Some(a), Some(b)) => {
                Arc::ptr_eq(a, b) && self.index == other.index && self.value_type == other.value_type
            }
            _ => false,
        }
    }

    /// Replaces `self` with the merge of `self` and `replacement`. When no
    /// merge applies the replacement simply wins.
    pub fn merge_values_from(&mut self, replacement: &Uniform) {
        if let Some(merged) = get_merged(self, replacement) {
            *self = merged;
        } else if replacement.is_valid() {
            *self = replacement.clone();
        }
    }
}

impl PartialEq for Uniform {
    fn eq(&self, other: &Self) -> bool {
        if !self.refers_to_same_input(other) || self.array_index != other.array_index {
            return false;
        }
        values_equal(&self.values, &other.values)
    }
}

fn texture_runs_equal(lhs: &[TexturePtr], rhs: &[TexturePtr]) -> bool {
    lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(a, b)| Arc::ptr_eq(a, b))
}

/// Element-wise comparison; float payloads compare approximately because
/// they survive client computation and merge round-trips.
pub fn values_equal(lhs: &UniformValues, rhs: &UniformValues) -> bool {
    use self::UniformValues::*;

    macro_rules! exact {
        ($a:expr, $b:expr) => {
            $a.len() == $b.len() && $a.iter().zip($b.iter()).all(|(x, y)| x == y)
        };
    }
    macro_rules! approx_components {
        ($a:expr, $b:expr, $n:expr) => {
            $a.len() == $b.len()
                && $a.iter().zip($b.iter()).all(|(x, y)| {
                    let x: &[f32; $n] = x.as_ref();
                    let y: &[f32; $n] = y.as_ref();
                    x.iter().zip(y.iter()).all(|(p, q)| almost_equal(*p, *q))
                })
        };
    }

    match (lhs, rhs) {
        (Int(a), Int(b)) => exact!(a, b),
        (UnsignedInt(a), UnsignedInt(b)) => exact!(a, b),
        (Float(a), Float(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| almost_equal(*x, *y))
        }
        (FloatVector2(a), FloatVector2(b)) => approx_components!(a, b, 2),
        (FloatVector3(a), FloatVector3(b)) => approx_components!(a, b, 3),
        (FloatVector4(a), FloatVector4(b)) => approx_components!(a, b, 4),
        (IntVector2(a), IntVector2(b)) => exact!(a, b),
        (IntVector3(a), IntVector3(b)) => exact!(a, b),
        (IntVector4(a), IntVector4(b)) => exact!(a, b),
        (UnsignedIntVector2(a), UnsignedIntVector2(b)) => exact!(a, b),
        (UnsignedIntVector3(a), UnsignedIntVector3(b)) => exact!(a, b),
        (UnsignedIntVector4(a), UnsignedIntVector4(b)) => exact!(a, b),
        (Matrix2x2(a), Matrix2x2(b)) => approx_components!(a, b, 4),
        (Matrix3x3(a), Matrix3x3(b)) => approx_components!(a, b, 9),
        (Matrix4x4(a), Matrix4x4(b)) => approx_components!(a, b, 16),
        (Texture(a), Texture(b)) => texture_runs_equal(a, b),
        (CubeMapTexture(a), CubeMapTexture(b)) => texture_runs_equal(a, b),
        _ => false,
    }
}

/// Computes the merge of `base` and `replacement`, or `None` when no merge
/// is needed and the replacement should be used as-is. That is the case
/// when either input is invalid, when the two name different inputs, and
/// when the replacement's range covers the base's range entirely. Runs that
/// do not touch still merge over the union of their ranges, with
/// zero-valued elements filling the hole between them; texture runs are
/// the exception, since there is no neutral texture to fill with.
pub fn get_merged(base: &Uniform, replacement: &Uniform) -> Option<Uniform> {
    use self::UniformValues::*;

    if !base.is_valid() || !replacement.is_valid() {
        return None;
    }
    if !base.refers_to_same_input(replacement) {
        return None;
    }

    let base_start = base.array_index;
    let base_end = base_start + base.count();
    let rep_start = replacement.array_index;
    let rep_end = rep_start + replacement.count();

    if rep_start <= base_start && rep_end >= base_end {
        return None;
    }
    if rep_start > base_end || base_start > rep_end {
        match base.values {
            Texture(_) | CubeMapTexture(_) => return None,
            _ => {}
        }
    }

    let start = base_start.min(rep_start);
    let end = base_end.max(rep_end);

    macro_rules! combine {
        ($variant:ident, $bvals:expr, $rvals:expr, $hole:expr) => {{
            let mut out = Vec::with_capacity(end - start);
            for i in start..end {
                if i >= rep_start && i < rep_end {
                    out.push($rvals[i - rep_start].clone());
                } else if i >= base_start && i < base_end {
                    out.push($bvals[i - base_start].clone());
                } else {
                    out.push($hole);
                }
            }
            UniformValues::$variant(out)
        }};
    }

    let values = match (&base.values, &replacement.values) {
        (Int(b), Int(r)) => combine!(Int, b, r, 0),
        (UnsignedInt(b), UnsignedInt(r)) => combine!(UnsignedInt, b, r, 0),
        (Float(b), Float(r)) => combine!(Float, b, r, 0.0),
        (FloatVector2(b), FloatVector2(r)) => {
            combine!(FloatVector2, b, r, Vector2::new(0.0, 0.0))
        }
        (FloatVector3(b), FloatVector3(r)) => {
            combine!(FloatVector3, b, r, Vector3::new(0.0, 0.0, 0.0))
        }
        (FloatVector4(b), FloatVector4(r)) => {
            combine!(FloatVector4, b, r, Vector4::new(0.0, 0.0, 0.0, 0.0))
        }
        (IntVector2(b), IntVector2(r)) => combine!(IntVector2, b, r, Vector2::new(0, 0)),
        (IntVector3(b), IntVector3(r)) => combine!(IntVector3, b, r, Vector3::new(0, 0, 0)),
        (IntVector4(b), IntVector4(r)) => combine!(IntVector4, b, r, Vector4::new(0, 0, 0, 0)),
        (UnsignedIntVector2(b), UnsignedIntVector2(r)) => {
            combine!(UnsignedIntVector2, b, r, Vector2::new(0, 0))
        }
        (UnsignedIntVector3(b), UnsignedIntVector3(r)) => {
            combine!(UnsignedIntVector3, b, r, Vector3::new(0, 0, 0))
        }
        (UnsignedIntVector4(b), UnsignedIntVector4(r)) => {
            combine!(UnsignedIntVector4, b, r, Vector4::new(0, 0, 0, 0))
        }
        (Matrix2x2(b), Matrix2x2(r)) => combine!(Matrix2x2, b, r, Matrix2::new(0.0, 0.0, 0.0, 0.0)),
        (Matrix3x3(b), Matrix3x3(r)) => combine!(
            Matrix3x3,
            b,
            r,
            Matrix3::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
        ),
        (Matrix4x4(b), Matrix4x4(r)) => combine!(
            Matrix4x4,
            b,
            r,
            Matrix4::new(
                0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0
            )
        ),
        // Touching texture runs never leave a hole, so the fill element is
        // never constructed.
        (Texture(b), Texture(r)) => combine!(Texture, b, r, unreachable!()),
        (CubeMapTexture(b), CubeMapTexture(r)) => combine!(CubeMapTexture, b, r, unreachable!()),
        _ => return None,
    };

    Some(Uniform {
        registry: base.registry.clone(),
        index: base.index,
        value_type: base.value_type,
        array_index: start,
        values,
    })
}
