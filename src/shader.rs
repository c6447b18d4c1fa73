//! Shader stage and program data holders. Each stage is change-tracked on
//! its own so editing one source only recompiles that stage.

use std::sync::{Arc, RwLock};

use gl::types::GLenum;

use crate::holder::ResourceHolder;
use crate::registry::ShaderInputRegistryPtr;

pub type ShaderPtr = Arc<RwLock<Shader>>;
pub type ShaderProgramPtr = Arc<RwLock<ShaderProgram>>;

pub mod change {
    pub const SOURCE: u32 = 1 << 0;
}

pub mod program_change {
    pub const VERTEX: u32 = 1 << 0;
    pub const FRAGMENT: u32 = 1 << 1;
    pub const GEOMETRY: u32 = 1 << 2;
    pub const VARYINGS: u32 = 1 << 3;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
}

impl ShaderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
        }
    }
}

impl From<ShaderStage> for GLenum {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
            ShaderStage::Geometry => gl::GEOMETRY_SHADER,
        }
    }
}

pub struct Shader {
    holder: ResourceHolder,
    stage: ShaderStage,
    source: String,
}

impl Shader {
    pub fn new<S: Into<String>>(stage: ShaderStage, source: S) -> Self {
        let shader = Shader {
            holder: ResourceHolder::new(),
            stage,
            source: source.into(),
        };
        shader.holder.on_changed(change::SOURCE);
        shader
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn set_source<S: Into<String>>(&mut self, source: S) {
        self.source = source.into();
        self.holder.on_changed(change::SOURCE);
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

pub struct ShaderProgram {
    holder: ResourceHolder,
    registry: ShaderInputRegistryPtr,
    vertex: Option<ShaderPtr>,
    fragment: Option<ShaderPtr>,
    geometry: Option<ShaderPtr>,
    // Outputs captured during transform feedback, in buffer order.
    capture_varyings: Vec<String>,
}

impl ShaderProgram {
    pub fn new(registry: ShaderInputRegistryPtr) -> Self {
        ShaderProgram {
            holder: ResourceHolder::new(),
            registry,
            vertex: None,
            fragment: None,
            geometry: None,
            capture_varyings: Vec::new(),
        }
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn registry(&self) -> &ShaderInputRegistryPtr {
        &self.registry
    }

    pub fn set_vertex_shader(&mut self, shader: Option<ShaderPtr>) {
        self.vertex = shader;
        self.holder.on_changed(program_change::VERTEX);
    }

    pub fn vertex_shader(&self) -> Option<&ShaderPtr> {
        self.vertex.as_ref()
    }

    pub fn set_fragment_shader(&mut self, shader: Option<ShaderPtr>) {
        self.fragment = shader;
        self.holder.on_changed(program_change::FRAGMENT);
    }

    pub fn fragment_shader(&self) -> Option<&ShaderPtr> {
        self.fragment.as_ref()
    }

    /// Requires the geometry-shader feature at update time.
    pub fn set_geometry_shader(&mut self, shader: Option<ShaderPtr>) {
        self.geometry = shader;
        self.holder.on_changed(program_change::GEOMETRY);
    }

    pub fn geometry_shader(&self) -> Option<&ShaderPtr> {
        self.geometry.as_ref()
    }

    pub fn set_capture_varyings(&mut self, varyings: Vec<String>) {
        self.capture_varyings = varyings;
        self.holder.on_changed(program_change::VARYINGS);
    }

    pub fn capture_varyings(&self) -> &[String] {
        &self.capture_varyings
    }

    pub fn shader(&self, stage: ShaderStage) -> Option<&ShaderPtr> {
        match stage {
            ShaderStage::Vertex => self.vertex.as_ref(),
            ShaderStage::Fragment => self.fragment.as_ref(),
            ShaderStage::Geometry => self.geometry.as_ref(),
        }
    }
}
