//! Attribute arrays and shapes: what a node draws.

use std::sync::{Arc, RwLock};

use gl::types::GLenum;

use crate::bufferobject::{BufferObjectPtr, IndexBufferPtr};
use crate::holder::ResourceHolder;

pub type AttributeArrayPtr = Arc<RwLock<AttributeArray>>;
pub type ShapePtr = Arc<RwLock<Shape>>;

pub mod change {
    pub const ATTRIBUTES: u32 = 1 << 0;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl From<ComponentType> for GLenum {
    fn from(ty: ComponentType) -> Self {
        match ty {
            ComponentType::Byte => gl::BYTE,
            ComponentType::UnsignedByte => gl::UNSIGNED_BYTE,
            ComponentType::Short => gl::SHORT,
            ComponentType::UnsignedShort => gl::UNSIGNED_SHORT,
            ComponentType::Int => gl::INT,
            ComponentType::UnsignedInt => gl::UNSIGNED_INT,
            ComponentType::Float => gl::FLOAT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleFan,
    TriangleStrip,
}

impl From<PrimitiveType> for GLenum {
    fn from(ty: PrimitiveType) -> Self {
        match ty {
            PrimitiveType::Points => gl::POINTS,
            PrimitiveType::Lines => gl::LINES,
            PrimitiveType::LineLoop => gl::LINE_LOOP,
            PrimitiveType::LineStrip => gl::LINE_STRIP,
            PrimitiveType::Triangles => gl::TRIANGLES,
            PrimitiveType::TriangleFan => gl::TRIANGLE_FAN,
            PrimitiveType::TriangleStrip => gl::TRIANGLE_STRIP,
        }
    }
}

/// One vertex attribute binding inside an attribute array.
#[derive(Clone)]
pub struct VertexAttribute {
    pub buffer: BufferObjectPtr,
    pub component_count: i32,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub stride: usize,
    pub offset: usize,
    /// Instancing divisor; 0 advances per vertex.
    pub divisor: u32,
}

/// The set of attribute bindings a shape draws with; becomes a GL vertex
/// array object when the feature is available.
pub struct AttributeArray {
    holder: ResourceHolder,
    attributes: Vec<VertexAttribute>,
}

impl AttributeArray {
    pub fn new() -> Self {
        AttributeArray {
            holder: ResourceHolder::new(),
            attributes: Vec::new(),
        }
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn add_attribute(&mut self, attribute: VertexAttribute) {
        self.attributes.push(attribute);
        self.holder.on_changed(change::ATTRIBUTES);
    }

    pub fn set_attribute(&mut self, index: usize, attribute: VertexAttribute) {
        if index >= self.attributes.len() {
            warn!("Attribute index {} is out of range, ignoring.", index);
            return;
        }
        self.attributes[index] = attribute;
        self.holder.on_changed(change::ATTRIBUTES);
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Default for AttributeArray {
    fn default() -> Self {
        AttributeArray::new()
    }
}

/// A sub-range of a shape's vertices or indices that can be toggled and
/// drawn with its own instance count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexRange {
    pub start: usize,
    pub count: usize,
    pub enabled: bool,
    /// 0 issues a plain draw call; any other value issues an instanced
    /// draw call with that many instances, including 1.
    pub instance_count: u32,
}

pub struct Shape {
    label: String,
    primitive: PrimitiveType,
    attribute_array: Option<AttributeArrayPtr>,
    index_buffer: Option<IndexBufferPtr>,
    vertex_ranges: Vec<VertexRange>,
    instance_count: u32,
}

impl Shape {
    pub fn new(primitive: PrimitiveType) -> Self {
        Shape {
            label: String::new(),
            primitive,
            attribute_array: None,
            index_buffer: None,
            vertex_ranges: Vec::new(),
            instance_count: 0,
        }
    }

    pub fn set_label<S: Into<String>>(&mut self, label: S) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    pub fn set_primitive(&mut self, primitive: PrimitiveType) {
        self.primitive = primitive;
    }

    pub fn set_attribute_array(&mut self, array: Option<AttributeArrayPtr>) {
        self.attribute_array = array;
    }

    pub fn attribute_array(&self) -> Option<&AttributeArrayPtr> {
        self.attribute_array.as_ref()
    }

    pub fn set_index_buffer(&mut self, buffer: Option<IndexBufferPtr>) {
        self.index_buffer = buffer;
    }

    pub fn index_buffer(&self) -> Option<&IndexBufferPtr> {
        self.index_buffer.as_ref()
    }

    pub fn add_vertex_range(&mut self, range: VertexRange) -> usize {
        self.vertex_ranges.push(range);
        self.vertex_ranges.len() - 1
    }

    pub fn enable_vertex_range(&mut self, index: usize, enabled: bool) {
        match self.vertex_ranges.get_mut(index) {
            Some(range) => range.enabled = enabled,
            None => warn!("Vertex range {} does not exist, ignoring.", index),
        }
    }

    pub fn vertex_ranges(&self) -> &[VertexRange] {
        &self.vertex_ranges
    }

    pub fn clear_vertex_ranges(&mut self) {
        self.vertex_ranges.clear();
    }

    /// Shape-level instance count, used when no vertex ranges are present.
    /// 0 means a plain draw call, any other value an instanced one.
    pub fn set_instance_count(&mut self, count: u32) {
        self.instance_count = count;
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }
}
