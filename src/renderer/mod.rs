//! The renderer: walks node trees and keeps GL objects in sync with the
//! data holders that describe them.
//!
//! A `Renderer` is told which context is current via [`set_current_context`]
//! and from then on owns every GL object it creates for that context,
//! tracked in a per-context [`ResourceBinder`]. [`draw_scene`] walks a node
//! tree depth-first, composing state tables and uniforms on the way down
//! and restoring them on the way up, issuing only the GL calls whose effect
//! differs from the mirrored context state.
//!
//! [`set_current_context`]: Renderer::set_current_context
//! [`draw_scene`]: Renderer::draw_scene

pub mod binder;
mod resource;
mod traversal;

pub use self::binder::{BinderRegistry, ContextId, ResourceBinder};
pub use self::resource::ResourceType;
pub use self::traversal::DrawCall;

use std::sync::{Arc, Mutex};

use gl::types::{GLenum, GLint, GLuint};

use crate::bufferobject::{BufferObjectPtr, MappedBuffer, MappingMode};
use crate::errors::*;
use crate::framebuffer::FramebufferObjectPtr;
use crate::graphics::{FeatureId, GraphicsManager, GraphicsManagerPtr};
use crate::holder::ResourceHolder;
use crate::math::{ByteRange, Rect};
use crate::node::NodePtr;
use crate::shader::ShaderProgramPtr;
use crate::shape::{PrimitiveType, ShapePtr};
use crate::statetable::{StateTable, Value};
use crate::texture::{Image, ImageFormat, TexturePtr};
use crate::transformfeedback::TransformFeedbackPtr;
use crate::uniform::{Uniform, UniformValues};

use self::traversal::{plan_draw_calls, StateStack, UniformStack};

bitflags! {
    /// Controls what [`Renderer::draw_scene`] does around the tree walk.
    ///
    /// `SAVE_*` snapshots a piece of context state before drawing and the
    /// matching `RESTORE_*` puts it back afterwards. `CLEAR_*` unbinds the
    /// named object after drawing so unrelated GL code starts from a clean
    /// slate.
    pub struct Flags: u32 {
        const PROCESS_INFO_REQUESTS = 1 << 0;
        const PROCESS_RELEASES = 1 << 1;

        const CLEAR_ACTIVE_TEXTURE = 1 << 2;
        const CLEAR_ARRAY_BUFFER = 1 << 3;
        const CLEAR_ELEMENT_ARRAY_BUFFER = 1 << 4;
        const CLEAR_FRAMEBUFFER = 1 << 5;
        const CLEAR_SHADER_PROGRAM = 1 << 6;
        const CLEAR_VERTEX_ARRAY = 1 << 7;

        const SAVE_ACTIVE_TEXTURE = 1 << 8;
        const SAVE_ARRAY_BUFFER = 1 << 9;
        const SAVE_ELEMENT_ARRAY_BUFFER = 1 << 10;
        const SAVE_FRAMEBUFFER = 1 << 11;
        const SAVE_SHADER_PROGRAM = 1 << 12;
        const SAVE_STATE_TABLE = 1 << 13;
        const SAVE_VERTEX_ARRAY = 1 << 14;

        const RESTORE_ACTIVE_TEXTURE = 1 << 15;
        const RESTORE_ARRAY_BUFFER = 1 << 16;
        const RESTORE_ELEMENT_ARRAY_BUFFER = 1 << 17;
        const RESTORE_FRAMEBUFFER = 1 << 18;
        const RESTORE_SHADER_PROGRAM = 1 << 19;
        const RESTORE_STATE_TABLE = 1 << 20;
        const RESTORE_VERTEX_ARRAY = 1 << 21;

        const CLEAR_TEXTURES = 1 << 22;
        const CLEAR_SAMPLERS = 1 << 23;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::PROCESS_INFO_REQUESTS | Flags::PROCESS_RELEASES
    }
}

bitflags! {
    /// Buffers selected for a multisample resolve blit.
    pub struct BufferBits: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// What to do when [`Renderer::set_current_context`] observes a switch
/// from one context to a different one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextChangePolicy {
    /// Forget all GL objects tracked for the old context without deleting
    /// them; the old context is assumed gone.
    AbandonResources,
    /// Log and abort the process. The default: a context change the caller
    /// did not plan for leaves every tracked object dangling.
    Abort,
    /// Keep the old binder untouched. The caller guarantees the contexts
    /// share objects.
    Ignore,
}

impl Default for ContextChangePolicy {
    fn default() -> Self {
        ContextChangePolicy::Abort
    }
}

/// Answer to [`Renderer::request_platform_info`].
pub struct PlatformInfo {
    pub renderer: String,
    pub vendor: String,
    pub version_string: String,
    pub extensions: Vec<String>,
    /// Human-readable feature support table.
    pub features: String,
}

/// Per-type resource statistics, answering
/// [`Renderer::request_resource_info`].
#[derive(Copy, Clone, Debug)]
pub struct ResourceInfo {
    pub resource_type: ResourceType,
    pub count: usize,
    pub gpu_bytes: usize,
}

enum InfoRequest {
    Platform(Box<dyn FnOnce(PlatformInfo) + Send>),
    Resources(Box<dyn FnOnce(Vec<ResourceInfo>) + Send>),
}

#[derive(Default)]
struct SavedBindings {
    active_texture: Option<GLint>,
    array_buffer: Option<GLint>,
    element_array_buffer: Option<GLint>,
    framebuffer: Option<GLint>,
    program: Option<GLint>,
    state_table: Option<StateTable>,
    vertex_array: Option<GLint>,
}

pub struct Renderer {
    graphics: GraphicsManagerPtr,
    binders: Arc<BinderRegistry>,
    flags: Flags,
    policy: ContextChangePolicy,
    current_context: Option<ContextId>,
    binder: Option<Arc<Mutex<ResourceBinder>>>,
    initial_uniforms: Vec<Uniform>,
    info_requests: Vec<InfoRequest>,
    default_framebuffer: GLuint,
    current_framebuffer: Option<FramebufferObjectPtr>,
    transform_feedback_active: bool,
}

impl Renderer {
    /// Creates a renderer against a probed context. Renderers of one
    /// embedder share a [`BinderRegistry`] so two renderers on the same
    /// context reuse each other's GL objects.
    pub fn new(graphics: GraphicsManagerPtr, binders: Arc<BinderRegistry>) -> Self {
        Renderer {
            graphics,
            binders,
            flags: Flags::default(),
            policy: ContextChangePolicy::default(),
            current_context: None,
            binder: None,
            initial_uniforms: Vec::new(),
            info_requests: Vec::new(),
            default_framebuffer: 0,
            current_framebuffer: None,
            transform_feedback_active: false,
        }
    }

    pub fn graphics(&self) -> &GraphicsManagerPtr {
        &self.graphics
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    pub fn context_change_policy(&self) -> ContextChangePolicy {
        self.policy
    }

    pub fn set_context_change_policy(&mut self, policy: ContextChangePolicy) {
        self.policy = policy;
    }

    /// Tells the renderer which context the caller has made current.
    /// Switching between two live contexts applies the
    /// [`ContextChangePolicy`].
    pub fn set_current_context(&mut self, context: Option<ContextId>) -> Result<()> {
        if self.current_context == context {
            return Ok(());
        }
        if self.current_context.is_some() && context.is_some() {
            match self.policy {
                ContextChangePolicy::Abort => {
                    error!(
                        "The GL context changed from {:?} to {:?} underneath the renderer, aborting.",
                        self.current_context, context
                    );
                    ::std::process::abort();
                }
                ContextChangePolicy::AbandonResources => {
                    if let Some(binder) = &self.binder {
                        binder.lock().unwrap().abandon_resources();
                    }
                }
                ContextChangePolicy::Ignore => {}
            }
        }
        self.binder = match context {
            Some(id) => Some(self.binders.binder_or_create(id)?),
            None => None,
        };
        self.current_context = context;
        Ok(())
    }

    pub fn current_context(&self) -> Option<ContextId> {
        self.current_context
    }

    fn binder(&self) -> Result<Arc<Mutex<ResourceBinder>>> {
        match &self.binder {
            Some(binder) => Ok(Arc::clone(binder)),
            None => bail!("no context is current; call set_current_context first"),
        }
    }

    // ------------------------------------------------------------------
    // Drawing.
    // ------------------------------------------------------------------

    /// Draws a node tree on the current context.
    ///
    /// Processes pending releases and info requests per the renderer's
    /// [`Flags`], then walks the tree. `None` draws nothing but still runs
    /// the flag-driven work.
    pub unsafe fn draw_scene(&mut self, root: Option<&NodePtr>) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        let gm = Arc::clone(&self.graphics);

        if self.flags.contains(Flags::PROCESS_RELEASES) {
            binder.release_resources(&gm);
        }

        let saved = self.save_bindings(&gm, &binder);

        let mut state = StateStack::new(binder.gl_state().clone());
        let mut uniforms = UniformStack::new();
        for uniform in &self.initial_uniforms {
            uniforms.push(uniform);
        }
        let mut programs: Vec<ShaderProgramPtr> = Vec::new();

        let result = match root {
            Some(root) => {
                self.draw_node(&gm, &mut binder, root, &mut state, &mut uniforms, &mut programs)
            }
            None => Ok(()),
        };

        self.clear_flagged_bindings(&gm, &mut binder);
        self.restore_bindings(&gm, &mut binder, saved);

        if self.flags.contains(Flags::PROCESS_INFO_REQUESTS) {
            self.process_info_requests_locked(&binder);
        }
        result
    }

    unsafe fn draw_node(
        &self,
        gm: &GraphicsManager,
        binder: &mut ResourceBinder,
        node_ptr: &NodePtr,
        state: &mut StateStack,
        uniforms: &mut UniformStack,
        programs: &mut Vec<ShaderProgramPtr>,
    ) -> Result<()> {
        let node = node_ptr.read().unwrap();
        if !node.is_enabled() {
            return Ok(());
        }

        let node_table = node.state_table().cloned();
        if let Some(table) = &node_table {
            state.push(table);
            binder.apply_state_table(gm, table);
            clear_buffers_for(gm, table);
        }

        let pushed_program = match node.shader_program() {
            Some(program) => {
                programs.push(Arc::clone(program));
                true
            }
            None => false,
        };
        let mut program_changed = false;
        if let Some(program) = programs.last() {
            program_changed = binder.bind_program(gm, program)?;
        }

        // Node uniforms first, then enabled blocks; a block value for the
        // same input lands on top and wins.
        let mut pushed: Vec<Uniform> = Vec::new();
        for uniform in node.uniforms() {
            uniforms.push(uniform);
            pushed.push(uniform.clone());
        }
        for block_ptr in node.uniform_blocks() {
            let block = block_ptr.read().unwrap();
            if !block.is_enabled() {
                continue;
            }
            for uniform in block.uniforms() {
                uniforms.push(uniform);
                pushed.push(uniform.clone());
            }
        }

        if program_changed {
            // A fresh program has no uniform state; send every current top.
            let tops: Vec<Uniform> = uniforms.tops().cloned().collect();
            for uniform in &tops {
                binder.send_uniform(gm, uniform);
            }
        } else {
            for uniform in &pushed {
                if let Some(top) = uniforms.current(uniform).cloned() {
                    binder.send_uniform(gm, &top);
                }
            }
        }

        if !node.shapes().is_empty() {
            if programs.is_empty() {
                warn!(
                    "Node '{}' has shapes but no shader program is bound, skipping them.",
                    node.label()
                );
            } else {
                for shape in node.shapes() {
                    self.draw_shape(gm, binder, shape)?;
                }
            }
        }

        for child in node.children() {
            self.draw_node(gm, binder, child, state, uniforms, programs)?;
        }

        // Restore in reverse push order: uniforms, program, state table.
        for uniform in pushed.iter().rev() {
            uniforms.pop(uniform);
            if let Some(top) = uniforms.current(uniform).cloned() {
                binder.send_uniform(gm, &top);
            }
        }
        if pushed_program {
            programs.pop();
            if let Some(program) = programs.last() {
                if binder.bind_program(gm, program)? {
                    let tops: Vec<Uniform> = uniforms.tops().cloned().collect();
                    for uniform in &tops {
                        binder.send_uniform(gm, uniform);
                    }
                }
            }
        }
        if let Some(table) = &node_table {
            state.pop();
            let mut restore = StateTable::default();
            restore.merge_non_clear_values_from(state.current(), table);
            binder.apply_state_table(gm, &restore);
        }
        Ok(())
    }

    unsafe fn draw_shape(
        &self,
        gm: &GraphicsManager,
        binder: &mut ResourceBinder,
        shape_ptr: &ShapePtr,
    ) -> Result<()> {
        let shape = shape_ptr.read().unwrap();
        let array = match shape.attribute_array() {
            Some(array) => Arc::clone(array),
            None => {
                warn!("Shape '{}' has no attribute array, skipping.", shape.label());
                return Ok(());
            }
        };
        binder.bind_attribute_array(gm, &array);

        let mut index_type: GLenum = 0;
        let mut index_byte_size = 0;
        let default_count = match shape.index_buffer() {
            Some(index_buffer) => {
                let id = binder.update_index_buffer_resource(gm, index_buffer);
                binder.bind_element_buffer_id(gm, id);
                let ib = index_buffer.read().unwrap();
                index_type = ib.index_type().into();
                index_byte_size = ib.index_type().byte_size();
                ib.index_count()
            }
            None => {
                // The drawable vertex count is bounded by the smallest
                // attribute buffer.
                let a = array.read().unwrap();
                a.attributes()
                    .iter()
                    .map(|attr| attr.buffer.read().unwrap().count())
                    .min()
                    .unwrap_or(0)
            }
        };

        let instancing = gm.is_feature_available(FeatureId::DrawInstanced);
        let calls = plan_draw_calls(
            shape.vertex_ranges(),
            default_count,
            shape.instance_count(),
            index_byte_size,
            instancing,
        );
        let mode: GLenum = shape.primitive().into();
        for call in calls {
            match call {
                DrawCall::Arrays { first, count } => gm.draw_arrays(mode, first, count),
                DrawCall::ArraysInstanced {
                    first,
                    count,
                    instances,
                } => gm.draw_arrays_instanced(mode, first, count, instances),
                DrawCall::Elements { count, offset } => {
                    gm.draw_elements(mode, count, index_type, offset as *const _)
                }
                DrawCall::ElementsInstanced {
                    count,
                    offset,
                    instances,
                } => gm.draw_elements_instanced(
                    mode,
                    count,
                    index_type,
                    offset as *const _,
                    instances,
                ),
            }
        }
        Ok(())
    }

    unsafe fn save_bindings(&self, gm: &GraphicsManager, binder: &ResourceBinder) -> SavedBindings {
        let mut saved = SavedBindings::default();
        if self.flags.contains(Flags::SAVE_ACTIVE_TEXTURE) {
            saved.active_texture = Some(query_int(gm, gl::ACTIVE_TEXTURE));
        }
        if self.flags.contains(Flags::SAVE_ARRAY_BUFFER) {
            saved.array_buffer = Some(query_int(gm, gl::ARRAY_BUFFER_BINDING));
        }
        if self.flags.contains(Flags::SAVE_ELEMENT_ARRAY_BUFFER) {
            saved.element_array_buffer = Some(query_int(gm, gl::ELEMENT_ARRAY_BUFFER_BINDING));
        }
        if self.flags.contains(Flags::SAVE_FRAMEBUFFER) {
            saved.framebuffer = Some(query_int(gm, gl::FRAMEBUFFER_BINDING));
        }
        if self.flags.contains(Flags::SAVE_SHADER_PROGRAM) {
            saved.program = Some(query_int(gm, gl::CURRENT_PROGRAM));
        }
        if self.flags.contains(Flags::SAVE_STATE_TABLE) {
            saved.state_table = Some(binder.gl_state().clone());
        }
        if self.flags.contains(Flags::SAVE_VERTEX_ARRAY)
            && self.graphics.is_feature_available(FeatureId::VertexArrays)
        {
            saved.vertex_array = Some(query_int(gm, gl::VERTEX_ARRAY_BINDING));
        }
        saved
    }

    unsafe fn restore_bindings(
        &self,
        gm: &GraphicsManager,
        binder: &mut ResourceBinder,
        saved: SavedBindings,
    ) {
        if self.flags.contains(Flags::RESTORE_STATE_TABLE) {
            if let Some(mut table) = saved.state_table {
                table.mark_all_set();
                table.set_enforced(true);
                binder.apply_state_table(gm, &table);
            }
        }
        if self.flags.contains(Flags::RESTORE_SHADER_PROGRAM) {
            if let Some(program) = saved.program {
                binder.bind_program_id(gm, program as GLuint);
            }
        }
        if self.flags.contains(Flags::RESTORE_VERTEX_ARRAY) {
            if let Some(vertex_array) = saved.vertex_array {
                binder.bind_vertex_array_id(gm, vertex_array as GLuint);
            }
        }
        if self.flags.contains(Flags::RESTORE_ARRAY_BUFFER) {
            if let Some(buffer) = saved.array_buffer {
                binder.bind_array_buffer_id(gm, buffer as GLuint);
            }
        }
        if self.flags.contains(Flags::RESTORE_ELEMENT_ARRAY_BUFFER) {
            if let Some(buffer) = saved.element_array_buffer {
                binder.bind_element_buffer_id(gm, buffer as GLuint);
            }
        }
        if self.flags.contains(Flags::RESTORE_FRAMEBUFFER) {
            if let Some(framebuffer) = saved.framebuffer {
                binder.bind_framebuffer_id(gm, framebuffer as GLuint);
            }
        }
        if self.flags.contains(Flags::RESTORE_ACTIVE_TEXTURE) {
            if let Some(unit) = saved.active_texture {
                let unit = (unit as GLenum).saturating_sub(gl::TEXTURE0);
                binder.bind_image_unit(gm, unit as usize);
            }
        }
    }

    unsafe fn clear_flagged_bindings(&self, gm: &GraphicsManager, binder: &mut ResourceBinder) {
        if self.flags.contains(Flags::CLEAR_SHADER_PROGRAM) {
            binder.bind_program_id(gm, 0);
        }
        if self.flags.contains(Flags::CLEAR_VERTEX_ARRAY)
            && self.graphics.is_feature_available(FeatureId::VertexArrays)
        {
            binder.bind_vertex_array_id(gm, 0);
        }
        if self.flags.contains(Flags::CLEAR_ARRAY_BUFFER) {
            binder.bind_array_buffer_id(gm, 0);
        }
        if self.flags.contains(Flags::CLEAR_ELEMENT_ARRAY_BUFFER) {
            binder.bind_element_buffer_id(gm, 0);
        }
        if self.flags.contains(Flags::CLEAR_FRAMEBUFFER) {
            binder.bind_framebuffer_id(gm, self.default_framebuffer);
        }
        if self.flags.contains(Flags::CLEAR_TEXTURES) {
            binder.unbind_textures(gm);
        }
        if self.flags.contains(Flags::CLEAR_SAMPLERS)
            && self.graphics.is_feature_available(FeatureId::SamplerObjects)
        {
            binder.unbind_samplers(gm);
        }
        if self.flags.contains(Flags::CLEAR_ACTIVE_TEXTURE) {
            binder.bind_image_unit(gm, 0);
        }
    }

    // ------------------------------------------------------------------
    // State.
    // ------------------------------------------------------------------

    /// Applies a state table outside of a tree walk and performs the
    /// buffer clears its clear values ask for.
    pub unsafe fn process_state_table(&mut self, table: &StateTable) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        binder.apply_state_table(&self.graphics, table);
        clear_buffers_for(&self.graphics, table);
        Ok(())
    }

    /// Rebuilds the renderer's mirror of the pipeline state by querying
    /// the context. Needed after foreign GL code ran between draws.
    pub unsafe fn update_state_from_open_gl(&mut self, width: i32, height: i32) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        binder.update_state_from_open_gl(&self.graphics, width, height);
        Ok(())
    }

    /// Declares that the context's state equals `table`'s set entries,
    /// without querying GL.
    pub fn update_state_from_state_table(&mut self, table: &StateTable) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc.lock().unwrap().update_state_from_state_table(table);
        Ok(())
    }

    /// Forgets all cached bindings; the next draw re-sends everything.
    pub fn clear_cached_bindings(&mut self) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc.lock().unwrap().clear_cached_bindings();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Uniforms.
    // ------------------------------------------------------------------

    /// Registers a uniform that sits at the bottom of its input's stack in
    /// every draw, replacing an earlier value for the same input.
    pub fn set_initial_uniform_value(&mut self, uniform: Uniform) {
        for existing in &mut self.initial_uniforms {
            if existing.refers_to_same_input(&uniform) {
                *existing = uniform;
                return;
            }
        }
        self.initial_uniforms.push(uniform);
    }

    /// Restricts texture uniforms to image units `[first, first + count)`.
    pub fn set_texture_image_unit_range(&mut self, first: usize, count: usize) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc.lock().unwrap().set_image_unit_range(first, count);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Resources.
    // ------------------------------------------------------------------

    pub unsafe fn create_or_update_buffer_resource(
        &mut self,
        buffer: &BufferObjectPtr,
    ) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc
            .lock()
            .unwrap()
            .update_buffer_resource(&self.graphics, buffer, gl::ARRAY_BUFFER);
        Ok(())
    }

    pub unsafe fn create_or_update_texture_resource(&mut self, texture: &TexturePtr) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc
            .lock()
            .unwrap()
            .update_texture_resource(&self.graphics, texture);
        Ok(())
    }

    pub unsafe fn create_or_update_program_resource(
        &mut self,
        program: &ShaderProgramPtr,
    ) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc
            .lock()
            .unwrap()
            .update_program_resource(&self.graphics, program)?;
        Ok(())
    }

    pub unsafe fn create_or_update_framebuffer_resource(
        &mut self,
        fbo: &FramebufferObjectPtr,
    ) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc
            .lock()
            .unwrap()
            .update_framebuffer_resource(&self.graphics, fbo)?;
        Ok(())
    }

    /// Creates or updates the attribute array, vertex buffers and index
    /// buffer a shape draws with, without drawing it.
    pub unsafe fn create_or_update_shape_resources(&mut self, shape: &ShapePtr) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        let shape = shape.read().unwrap();
        if let Some(array) = shape.attribute_array() {
            binder.bind_attribute_array(&self.graphics, array);
        }
        if let Some(index_buffer) = shape.index_buffer() {
            binder.update_index_buffer_resource(&self.graphics, index_buffer);
        }
        Ok(())
    }

    /// Walks a node tree creating or updating every resource it references:
    /// shader programs, shape buffers and the textures its uniforms name.
    /// Pre-warms GL objects so the first draw does no uploads.
    pub unsafe fn create_or_update_resources(&mut self, node: &NodePtr) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        self.update_node_resources(&mut binder, node)
    }

    unsafe fn update_node_resources(
        &self,
        binder: &mut ResourceBinder,
        node: &NodePtr,
    ) -> Result<()> {
        let node = node.read().unwrap();
        if let Some(program) = node.shader_program() {
            binder.update_program_resource(&self.graphics, program)?;
        }
        for uniform in node.uniforms() {
            self.update_uniform_textures(binder, uniform);
        }
        for block in node.uniform_blocks() {
            let block = block.read().unwrap();
            for uniform in block.uniforms() {
                self.update_uniform_textures(binder, uniform);
            }
        }
        for shape in node.shapes() {
            let shape = shape.read().unwrap();
            if let Some(array) = shape.attribute_array() {
                binder.bind_attribute_array(&self.graphics, array);
            }
            if let Some(index_buffer) = shape.index_buffer() {
                binder.update_index_buffer_resource(&self.graphics, index_buffer);
            }
        }
        for child in node.children() {
            self.update_node_resources(binder, child)?;
        }
        Ok(())
    }

    unsafe fn update_uniform_textures(&self, binder: &mut ResourceBinder, uniform: &Uniform) {
        if let UniformValues::Texture(textures) | UniformValues::CubeMapTexture(textures) =
            uniform.values()
        {
            // Sampler objects ride along inside the texture update.
            for texture in textures {
                binder.update_texture_resource(&self.graphics, texture);
            }
        }
    }

    /// Marks a holder fully modified so its GL object is rebuilt on the
    /// next update, on every renderer tracking it.
    pub fn request_forced_update(&self, holder: &ResourceHolder) {
        holder.on_changed(u32::MAX);
    }

    /// The GL id tracked for a holder on the current context, if any.
    pub fn get_resource_gl_id(&self, holder: &ResourceHolder) -> Option<u32> {
        self.binder
            .as_ref()
            .and_then(|binder| binder.lock().unwrap().resource_gl_id(holder))
    }

    /// Wraps a GL buffer object created outside the renderer. The id is
    /// never deleted by the renderer.
    pub fn create_buffer_with_externally_managed_id(&self, buffer: &BufferObjectPtr, id: u32) {
        let b = buffer.read().unwrap();
        b.holder().set_external_gl_id(id);
        b.holder().on_changed(u32::MAX);
    }

    /// Wraps a GL texture object created outside the renderer. The id is
    /// never deleted by the renderer.
    pub fn create_texture_with_externally_managed_id(&self, texture: &TexturePtr, id: u32) {
        let t = texture.read().unwrap();
        t.holder().set_external_gl_id(id);
        t.holder().on_changed(u32::MAX);
    }

    /// Deletes the GL object tracked for one holder.
    pub unsafe fn clear_resource(&mut self, holder: &ResourceHolder) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc
            .lock()
            .unwrap()
            .delete_resource_by_uid(&self.graphics, holder.uid());
        Ok(())
    }

    /// Deletes every tracked GL object of one type.
    pub unsafe fn clear_typed_resources(&mut self, resource_type: ResourceType) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc
            .lock()
            .unwrap()
            .delete_typed_resources(&self.graphics, resource_type);
        Ok(())
    }

    /// Deletes every tracked GL object. With `force_abandon` nothing is
    /// sent to GL; use it when the context is already destroyed.
    pub unsafe fn clear_all_resources(&mut self, force_abandon: bool) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc
            .lock()
            .unwrap()
            .delete_all_resources(&self.graphics, force_abandon);
        Ok(())
    }

    /// Deletes the GL objects of holders dropped since the last call.
    /// Runs automatically in [`draw_scene`](Self::draw_scene) when
    /// [`Flags::PROCESS_RELEASES`] is set.
    pub unsafe fn release_resources(&mut self) -> Result<()> {
        let binder_arc = self.binder()?;
        binder_arc.lock().unwrap().release_resources(&self.graphics);
        Ok(())
    }

    /// Estimated GPU bytes held by tracked objects of one type.
    pub fn gpu_memory_usage(&self, resource_type: ResourceType) -> usize {
        self.binder
            .as_ref()
            .map(|binder| binder.lock().unwrap().gpu_memory_usage(resource_type))
            .unwrap_or(0)
    }

    pub fn resource_count(&self, resource_type: ResourceType) -> usize {
        self.binder
            .as_ref()
            .map(|binder| binder.lock().unwrap().resource_count(resource_type))
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Framebuffers.
    // ------------------------------------------------------------------

    /// Binds a framebuffer object for subsequent draws, or the default
    /// framebuffer for `None`.
    pub unsafe fn bind_framebuffer(&mut self, fbo: Option<&FramebufferObjectPtr>) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        match fbo {
            Some(fbo) => {
                let id = binder.update_framebuffer_resource(&self.graphics, fbo)?;
                binder.bind_framebuffer_id(&self.graphics, id);
                self.current_framebuffer = Some(Arc::clone(fbo));
            }
            None => {
                binder.bind_framebuffer_id(&self.graphics, self.default_framebuffer);
                self.current_framebuffer = None;
            }
        }
        Ok(())
    }

    pub fn current_framebuffer(&self) -> Option<&FramebufferObjectPtr> {
        self.current_framebuffer.as_ref()
    }

    /// Adopts whatever framebuffer is bound right now as "the default",
    /// for embedders whose system framebuffer is not id 0.
    pub unsafe fn update_default_framebuffer_from_open_gl(&mut self) {
        self.default_framebuffer = query_int(&self.graphics, gl::FRAMEBUFFER_BINDING) as GLuint;
    }

    /// Resolves a multisampled framebuffer into a single-sampled one by
    /// blitting the selected buffers. An empty mask is a no-op.
    pub unsafe fn resolve_multisample_framebuffer(
        &mut self,
        source: &FramebufferObjectPtr,
        destination: &FramebufferObjectPtr,
        mask: BufferBits,
    ) -> Result<()> {
        if mask.is_empty() {
            return Ok(());
        }
        if !self.graphics.is_feature_available(FeatureId::FramebufferBlit) {
            bail!("framebuffer blit is unavailable on this context");
        }
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        let gm = &self.graphics;

        let source_id = binder.update_framebuffer_resource(gm, source)?;
        let destination_id = binder.update_framebuffer_resource(gm, destination)?;
        let (sw, sh) = {
            let f = source.read().unwrap();
            (f.width() as i32, f.height() as i32)
        };
        let (dw, dh) = {
            let f = destination.read().unwrap();
            (f.width() as i32, f.height() as i32)
        };

        let mut gl_mask = 0;
        if mask.contains(BufferBits::COLOR) {
            gl_mask |= gl::COLOR_BUFFER_BIT;
        }
        if mask.contains(BufferBits::DEPTH) {
            gl_mask |= gl::DEPTH_BUFFER_BIT;
        }
        if mask.contains(BufferBits::STENCIL) {
            gl_mask |= gl::STENCIL_BUFFER_BIT;
        }

        gm.bind_framebuffer(gl::READ_FRAMEBUFFER, source_id);
        gm.bind_framebuffer(gl::DRAW_FRAMEBUFFER, destination_id);
        gm.blit_framebuffer(0, 0, sw, sh, 0, 0, dw, dh, gl_mask, gl::NEAREST);
        // READ/DRAW bindings alias FRAMEBUFFER; rebind the cached one.
        let current = binder.active_framebuffer();
        gm.bind_framebuffer(gl::FRAMEBUFFER, current);
        Ok(())
    }

    /// Reads back a rectangle of the bound framebuffer.
    pub unsafe fn read_image(&mut self, rect: Rect, format: ImageFormat) -> Result<Image> {
        self.binder()?;
        let gm = &self.graphics;
        let (_, gl_format, gl_type) = format.to_gl();
        let size = rect.width as usize * rect.height as usize * format.bytes_per_pixel();
        let mut data = vec![0u8; size];
        gm.pixel_storei(gl::PACK_ALIGNMENT, 1);
        gm.read_pixels(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            gl_format,
            gl_type,
            data.as_mut_ptr() as *mut _,
        );
        Ok(Image {
            format,
            width: rect.width as u32,
            height: rect.height as u32,
            data,
        })
    }

    // ------------------------------------------------------------------
    // Transform feedback.
    // ------------------------------------------------------------------

    /// Starts capturing subsequent draws into the transform feedback's
    /// buffer. Only one capture can be active at a time.
    pub unsafe fn begin_transform_feedback(
        &mut self,
        tf: &TransformFeedbackPtr,
        primitive: PrimitiveType,
    ) -> Result<()> {
        if self.transform_feedback_active {
            bail!("a transform feedback capture is already active");
        }
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        let id = binder.update_transform_feedback_resource(&self.graphics, tf)?;
        self.graphics.bind_transform_feedback(gl::TRANSFORM_FEEDBACK, id);
        self.graphics
            .begin_transform_feedback(capture_primitive(primitive));
        self.transform_feedback_active = true;
        Ok(())
    }

    pub unsafe fn end_transform_feedback(&mut self) {
        if self.transform_feedback_active {
            self.graphics.end_transform_feedback();
            self.transform_feedback_active = false;
        } else {
            warn!("No transform feedback capture is active, ignoring.");
        }
    }

    // ------------------------------------------------------------------
    // Buffer mapping.
    // ------------------------------------------------------------------

    /// Maps a buffer's whole data store.
    pub unsafe fn map_buffer_object_data(
        &mut self,
        buffer: &BufferObjectPtr,
        mode: MappingMode,
    ) -> Result<()> {
        let len = buffer.read().unwrap().len();
        self.map_buffer_object_data_range(buffer, mode, ByteRange::new(0, len))
    }

    /// Maps a byte range of a buffer's data store. Prefers a driver
    /// mapping; falls back to CPU shadow memory flushed at unmap time.
    /// Mapping an already-mapped buffer or an out-of-bounds range logs a
    /// warning and leaves the buffer unmapped.
    pub unsafe fn map_buffer_object_data_range(
        &mut self,
        buffer: &BufferObjectPtr,
        mode: MappingMode,
        range: ByteRange,
    ) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        let gm = &self.graphics;

        let id = binder.update_buffer_resource(gm, buffer, gl::ARRAY_BUFFER);
        binder.bind_array_buffer_id(gm, id);

        let mut b = buffer.write().unwrap();
        if b.is_mapped() {
            warn!("Buffer '{}' is already mapped, ignoring.", b.holder().label());
            return Ok(());
        }
        if range.is_empty() || range.end() > b.len() {
            warn!(
                "Cannot map {} bytes at offset {} of buffer '{}' ({} bytes).",
                range.len,
                range.offset,
                b.holder().label(),
                b.len()
            );
            return Ok(());
        }

        let whole = range.offset == 0 && range.len == b.len();
        let ptr = if gm.is_feature_available(FeatureId::MapBufferRange) {
            gm.map_buffer_range(
                gl::ARRAY_BUFFER,
                range.offset as isize,
                range.len as isize,
                mode.access_bits(),
            )
        } else if whole && gm.is_feature_available(FeatureId::MapBuffer) {
            let access = match mode {
                MappingMode::ReadOnly => gl::READ_ONLY,
                MappingMode::WriteOnly => gl::WRITE_ONLY,
                MappingMode::ReadWrite => gl::READ_WRITE,
            };
            gm.map_buffer(gl::ARRAY_BUFFER, access)
        } else {
            ::std::ptr::null_mut()
        };

        if ptr.is_null() {
            let mut shadow = b.data()[range.offset..range.end()].to_vec();
            let shadow_ptr = shadow.as_mut_ptr();
            b.set_mapped(MappedBuffer {
                ptr: shadow_ptr,
                range,
                mode,
                shadow: Some(shadow),
            });
        } else {
            b.set_mapped(MappedBuffer {
                ptr: ptr as *mut u8,
                range,
                mode,
                shadow: None,
            });
        }
        Ok(())
    }

    /// Unmaps a mapped buffer. Shadow-mapped writes are recorded as a
    /// sub-data edit and upload on the next resource update; driver-mapped
    /// writes go straight to GL and leave the client-side copy untouched.
    pub unsafe fn unmap_buffer_object_data(&mut self, buffer: &BufferObjectPtr) -> Result<()> {
        let binder_arc = self.binder()?;
        let mut binder = binder_arc.lock().unwrap();
        let gm = &self.graphics;

        let mut b = buffer.write().unwrap();
        let mapped = match b.take_mapped() {
            Some(mapped) => mapped,
            None => {
                warn!("Buffer '{}' is not mapped, ignoring.", b.holder().label());
                return Ok(());
            }
        };
        match mapped.shadow {
            Some(shadow) => {
                if mapped.mode != MappingMode::ReadOnly {
                    b.set_sub_data(mapped.range, &shadow);
                }
            }
            None => {
                if let Some(id) = binder.resource_gl_id(b.holder()) {
                    binder.bind_array_buffer_id(gm, id);
                }
                if gm.unmap_buffer(gl::ARRAY_BUFFER) == gl::FALSE {
                    warn!(
                        "Data store of buffer '{}' was corrupted while mapped.",
                        b.holder().label()
                    );
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Info requests.
    // ------------------------------------------------------------------

    /// Queues a callback receiving platform strings and the feature table.
    /// Runs on the next [`draw_scene`](Self::draw_scene) or
    /// [`process_info_requests`](Self::process_info_requests).
    pub fn request_platform_info<F>(&mut self, callback: F)
    where
        F: FnOnce(PlatformInfo) + Send + 'static,
    {
        self.info_requests.push(InfoRequest::Platform(Box::new(callback)));
    }

    /// Queues a callback receiving per-type resource counts and GPU sizes.
    pub fn request_resource_info<F>(&mut self, callback: F)
    where
        F: FnOnce(Vec<ResourceInfo>) + Send + 'static,
    {
        self.info_requests.push(InfoRequest::Resources(Box::new(callback)));
    }

    pub fn process_info_requests(&mut self) -> Result<()> {
        let binder_arc = self.binder()?;
        let binder = binder_arc.lock().unwrap();
        self.process_info_requests_locked(&binder);
        Ok(())
    }

    fn process_info_requests_locked(&mut self, binder: &ResourceBinder) {
        for request in self.info_requests.drain(..) {
            match request {
                InfoRequest::Platform(callback) => {
                    let info = self.graphics.info();
                    callback(PlatformInfo {
                        renderer: info.renderer.clone(),
                        vendor: info.vendor.clone(),
                        version_string: info.version_string.clone(),
                        extensions: info.extensions.clone(),
                        features: self.graphics.feature_debug_string(),
                    });
                }
                InfoRequest::Resources(callback) => {
                    let infos = ResourceType::ALL
                        .iter()
                        .map(|&resource_type| ResourceInfo {
                            resource_type,
                            count: binder.resource_count(resource_type),
                            gpu_bytes: binder.gpu_memory_usage(resource_type),
                        })
                        .collect();
                    callback(infos);
                }
            }
        }
    }
}

/// Performs the buffer clears a state table's set clear values ask for.
/// The clear values themselves were already sent by the state apply.
unsafe fn clear_buffers_for(gm: &GraphicsManager, table: &StateTable) {
    let mut mask = 0;
    if table.is_value_set(Value::ClearColor) {
        mask |= gl::COLOR_BUFFER_BIT;
    }
    if table.is_value_set(Value::ClearDepth) {
        mask |= gl::DEPTH_BUFFER_BIT;
    }
    if table.is_value_set(Value::ClearStencil) {
        mask |= gl::STENCIL_BUFFER_BIT;
    }
    if mask != 0 {
        gm.clear(mask);
    }
}

/// Transform feedback captures only the basic primitive classes.
fn capture_primitive(primitive: PrimitiveType) -> GLenum {
    match primitive {
        PrimitiveType::Points => gl::POINTS,
        PrimitiveType::Lines | PrimitiveType::LineLoop | PrimitiveType::LineStrip => gl::LINES,
        PrimitiveType::Triangles | PrimitiveType::TriangleFan | PrimitiveType::TriangleStrip => {
            gl::TRIANGLES
        }
    }
}

unsafe fn query_int(gm: &GraphicsManager, pname: GLenum) -> GLint {
    let mut value = 0;
    gm.get_integerv(pname, &mut value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::testing;
    use crate::registry::ShaderInputRegistry;
    use crate::uniform::{UniformValues, ValueType};

    #[test]
    fn default_flags_process_requests_and_releases() {
        let flags = Flags::default();
        assert!(flags.contains(Flags::PROCESS_INFO_REQUESTS));
        assert!(flags.contains(Flags::PROCESS_RELEASES));
        assert!(!flags.contains(Flags::SAVE_STATE_TABLE));
    }

    #[test]
    fn drawing_without_a_context_fails() {
        let gm = Arc::new(testing::desktop_manager());
        let mut renderer = Renderer::new(gm, BinderRegistry::new());
        let result = unsafe { renderer.draw_scene(None) };
        assert!(result.is_err());
    }

    #[test]
    fn context_switch_with_ignore_policy_keeps_binders() {
        let gm = Arc::new(testing::desktop_manager());
        let registry = BinderRegistry::new();
        let mut renderer = Renderer::new(gm, Arc::clone(&registry));
        renderer.set_context_change_policy(ContextChangePolicy::Ignore);

        renderer.set_current_context(Some(1)).unwrap();
        renderer.set_current_context(Some(2)).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(renderer.current_context(), Some(2));

        // Dropping the context does not consult the policy.
        renderer.set_current_context(None).unwrap();
        assert_eq!(renderer.current_context(), None);
    }

    #[test]
    fn initial_uniform_values_replace_same_input() {
        let gm = Arc::new(testing::desktop_manager());
        let mut renderer = Renderer::new(gm, BinderRegistry::new());

        let registry = ShaderInputRegistry::new();
        registry.add("uScale", crate::registry::InputKind::Uniform, ValueType::Float, "");

        let first = registry
            .create_uniform("uScale", UniformValues::Float(vec![1.0]))
            .unwrap();
        let second = registry
            .create_uniform("uScale", UniformValues::Float(vec![2.0]))
            .unwrap();

        renderer.set_initial_uniform_value(first);
        renderer.set_initial_uniform_value(second.clone());
        assert_eq!(renderer.initial_uniforms.len(), 1);
        assert_eq!(renderer.initial_uniforms[0], second);
    }

    #[test]
    fn info_requests_run_during_draw() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let gm = Arc::new(testing::desktop_manager());
        let mut renderer = Renderer::new(gm, BinderRegistry::new());
        renderer.set_current_context(Some(0)).unwrap();

        static RAN: AtomicBool = AtomicBool::new(false);
        RAN.store(false, Ordering::SeqCst);
        renderer.request_platform_info(|info| {
            assert_eq!(info.renderer, "testbed");
            RAN.store(true, Ordering::SeqCst);
        });

        unsafe { renderer.draw_scene(None).unwrap() };
        assert!(RAN.load(Ordering::SeqCst));
    }
}
