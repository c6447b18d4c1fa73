//! Scene graph nodes.
//!
//! A node bundles an optional state override, an optional shader program,
//! uniforms and shapes, plus child nodes. During traversal a node's state
//! table and uniforms apply to its whole subtree and are restored when the
//! subtree has been drawn.

use std::sync::{Arc, RwLock};

use crate::shader::ShaderProgramPtr;
use crate::shape::ShapePtr;
use crate::statetable::StateTable;
use crate::uniform::Uniform;

pub type NodePtr = Arc<RwLock<Node>>;
pub type UniformBlockPtr = Arc<RwLock<UniformBlock>>;

/// A reusable group of uniforms shared between nodes. Blocks apply after
/// the node's own uniforms, so a block value wins over a node value for
/// the same input.
pub struct UniformBlock {
    enabled: bool,
    uniforms: Vec<Uniform>,
}

impl UniformBlock {
    pub fn new() -> Self {
        UniformBlock {
            enabled: true,
            uniforms: Vec::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn add_uniform(&mut self, uniform: Uniform) {
        self.uniforms.push(uniform);
    }

    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    /// Replaces the value of the first uniform naming the same input.
    /// Returns false when none matches.
    pub fn set_uniform_value(&mut self, uniform: &Uniform) -> bool {
        for existing in &mut self.uniforms {
            if existing.refers_to_same_input(uniform) {
                *existing = uniform.clone();
                return true;
            }
        }
        false
    }
}

impl Default for UniformBlock {
    fn default() -> Self {
        UniformBlock::new()
    }
}

pub struct Node {
    label: String,
    enabled: bool,
    state_table: Option<StateTable>,
    shader_program: Option<ShaderProgramPtr>,
    uniforms: Vec<Uniform>,
    uniform_blocks: Vec<UniformBlockPtr>,
    shapes: Vec<ShapePtr>,
    children: Vec<NodePtr>,
}

impl Node {
    pub fn new() -> Self {
        Node {
            label: String::new(),
            enabled: true,
            state_table: None,
            shader_program: None,
            uniforms: Vec::new(),
            uniform_blocks: Vec::new(),
            shapes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn set_label<S: Into<String>>(&mut self, label: S) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A disabled node is skipped entirely, children included.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_state_table(&mut self, table: Option<StateTable>) {
        self.state_table = table;
    }

    pub fn state_table(&self) -> Option<&StateTable> {
        self.state_table.as_ref()
    }

    pub fn state_table_mut(&mut self) -> Option<&mut StateTable> {
        self.state_table.as_mut()
    }

    pub fn set_shader_program(&mut self, program: Option<ShaderProgramPtr>) {
        self.shader_program = program;
    }

    pub fn shader_program(&self) -> Option<&ShaderProgramPtr> {
        self.shader_program.as_ref()
    }

    pub fn add_uniform(&mut self, uniform: Uniform) {
        self.uniforms.push(uniform);
    }

    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    /// Replaces the value of the first uniform naming the same input.
    /// Returns false when none matches.
    pub fn set_uniform_value(&mut self, uniform: &Uniform) -> bool {
        for existing in &mut self.uniforms {
            if existing.refers_to_same_input(uniform) {
                *existing = uniform.clone();
                return true;
            }
        }
        false
    }

    pub fn add_uniform_block(&mut self, block: UniformBlockPtr) {
        self.uniform_blocks.push(block);
    }

    pub fn uniform_blocks(&self) -> &[UniformBlockPtr] {
        &self.uniform_blocks
    }

    pub fn add_shape(&mut self, shape: ShapePtr) {
        self.shapes.push(shape);
    }

    pub fn shapes(&self) -> &[ShapePtr] {
        &self.shapes
    }

    pub fn add_child(&mut self, child: NodePtr) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[NodePtr] {
        &self.children
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::new()
    }
}
