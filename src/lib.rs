//! Prism is a retained-mode scene graph renderer core for OpenGL and
//! OpenGL ES. It keeps a mirror of the GL state machine and the GL objects
//! it has created, and on every draw walks a node tree, issuing only the
//! calls whose effect differs from what the context already holds.
//!
//! The crate is split into three layers:
//!
//! - [`statetable`] models the fixed-function pipeline state as a diffable
//!   value, with set-tracking so a table can describe a partial override.
//! - [`graphics`] probes the current context once and answers which named
//!   feature groups (vertex arrays, instanced draws, buffer mapping, ...)
//!   are usable, with optional per-call error checking.
//! - [`renderer`] owns GL objects on behalf of plain data holders
//!   ([`bufferobject`], [`texture`], [`shader`], ...) and draws [`node`]
//!   trees.
//!
//! Context creation and windowing are explicitly out of scope; callers make
//! a context current before touching any entry point here, and tell the
//! renderer via `set_current_context` whenever they switch.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod errors;
pub mod math;

pub mod bufferobject;
pub mod framebuffer;
pub mod graphics;
pub mod holder;
pub mod node;
pub mod registry;
pub mod renderer;
pub mod shader;
pub mod shape;
pub mod statetable;
pub mod texture;
pub mod transformfeedback;
pub mod uniform;

pub mod prelude {
    pub use crate::bufferobject::{BufferObject, BufferObjectPtr, BufferUsage, IndexBuffer};
    pub use crate::framebuffer::{Attachment, FramebufferObject, FramebufferObjectPtr};
    pub use crate::graphics::{Constant, FeatureId, GraphicsManager, GraphicsManagerPtr};
    pub use crate::node::{Node, NodePtr};
    pub use crate::registry::{ShaderInputRegistry, ShaderInputRegistryPtr};
    pub use crate::renderer::{BinderRegistry, ContextChangePolicy, Flags, Renderer};
    pub use crate::shader::{ShaderProgram, ShaderProgramPtr};
    pub use crate::shape::{AttributeArray, PrimitiveType, Shape, ShapePtr};
    pub use crate::statetable::{Capability, StateTable, Value};
    pub use crate::texture::{Sampler, Texture, TexturePtr};
    pub use crate::uniform::{Uniform, UniformValues, ValueType};
}
