//! Named shader-input declarations. Uniforms are created against a
//! registry; two uniforms only merge or compare equal when they come from
//! the same registry instance, so registries double as namespaces.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::uniform::{Uniform, UniformValues, ValueType};

pub type ShaderInputRegistryPtr = Arc<ShaderInputRegistry>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    Uniform,
    Attribute,
}

#[derive(Clone, Debug)]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
    pub value_type: ValueType,
    pub doc: String,
}

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct ShaderInputRegistry {
    id: u64,
    inputs: RwLock<Vec<InputSpec>>,
}

impl ShaderInputRegistry {
    pub fn new() -> ShaderInputRegistryPtr {
        Arc::new(ShaderInputRegistry {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            inputs: RwLock::new(Vec::new()),
        })
    }

    /// Identity of this registry; compared instead of contents.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Declares an input and returns its index. Redeclaring a name logs a
    /// warning and returns the existing index unchanged.
    pub fn add<S: Into<String>, D: Into<String>>(
        &self,
        name: S,
        kind: InputKind,
        value_type: ValueType,
        doc: D,
    ) -> usize {
        let name = name.into();
        let mut inputs = self.inputs.write().unwrap();
        if let Some(index) = inputs.iter().position(|i| i.name == name) {
            warn!("Shader input '{}' is already declared, keeping the first declaration.", name);
            return index;
        }
        inputs.push(InputSpec {
            name,
            kind,
            value_type,
            doc: doc.into(),
        });
        inputs.len() - 1
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.inputs.read().unwrap().iter().position(|i| i.name == name)
    }

    pub fn spec(&self, index: usize) -> Option<InputSpec> {
        self.inputs.read().unwrap().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inputs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.read().unwrap().is_empty()
    }

    /// Builds a uniform for a declared input. Unknown names and values of
    /// the wrong type log a warning and yield `None`.
    pub fn create_uniform(self: &Arc<Self>, name: &str, values: UniformValues) -> Option<Uniform> {
        self.create_array_uniform(name, 0, values)
    }

    /// Like [`create_uniform`](Self::create_uniform) for array uniforms
    /// starting at `array_index`.
    pub fn create_array_uniform(
        self: &Arc<Self>,
        name: &str,
        array_index: usize,
        values: UniformValues,
    ) -> Option<Uniform> {
        let index = match self.find(name) {
            Some(index) => index,
            None => {
                warn!("Shader input '{}' is not declared in this registry.", name);
                return None;
            }
        };
        let spec = self.spec(index).unwrap();
        if spec.kind != InputKind::Uniform {
            warn!("Shader input '{}' is an attribute, not a uniform.", name);
            return None;
        }
        if spec.value_type != values.value_type() {
            warn!(
                "Uniform '{}' expects {:?} values, got {:?}.",
                name,
                spec.value_type,
                values.value_type()
            );
            return None;
        }
        Some(Uniform::new(self, index, spec.value_type, array_index, values))
    }
}

lazy_static! {
    /// The registry every program falls back to; predeclares the inputs
    /// the renderer itself understands.
    pub static ref GLOBAL_REGISTRY: ShaderInputRegistryPtr = {
        let registry = ShaderInputRegistry::new();
        registry.add(
            "uViewportSize",
            InputKind::Uniform,
            ValueType::IntVector2,
            "Replaced with the dimensions of the viewport, in pixels.",
        );
        registry.add(
            "uProjectionMatrix",
            InputKind::Uniform,
            ValueType::Matrix4x4,
            "Projection matrix applied by the default shader.",
        );
        registry.add(
            "uModelviewMatrix",
            InputKind::Uniform,
            ValueType::Matrix4x4,
            "Cumulative modelview matrix applied by the default shader.",
        );
        registry.add(
            "uBaseColor",
            InputKind::Uniform,
            ValueType::FloatVector4,
            "Base color used by the default shader.",
        );
        registry
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaration_keeps_first_index() {
        let registry = ShaderInputRegistry::new();
        let a = registry.add("uColor", InputKind::Uniform, ValueType::FloatVector4, "");
        let b = registry.add("uColor", InputKind::Uniform, ValueType::Float, "");
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.spec(a).unwrap().value_type,
            ValueType::FloatVector4
        );
    }

    #[test]
    fn create_uniform_rejects_wrong_type() {
        let registry = ShaderInputRegistry::new();
        registry.add("uScale", InputKind::Uniform, ValueType::Float, "");
        assert!(registry
            .create_uniform("uScale", UniformValues::Int(vec![3]))
            .is_none());
        assert!(registry
            .create_uniform("uScale", UniformValues::Float(vec![3.0]))
            .is_some());
        assert!(registry
            .create_uniform("uMissing", UniformValues::Float(vec![1.0]))
            .is_none());
    }

    #[test]
    fn global_registry_declares_viewport_size() {
        assert!(GLOBAL_REGISTRY.find("uViewportSize").is_some());
    }
}
