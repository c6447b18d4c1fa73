//! Per-context resource tracking and the GL state mirror.
//!
//! A `ResourceBinder` owns every GL object created for one context (or one
//! share group) together with the caches that make state application
//! cheap: the StateTable mirror of the context, the active
//! program/buffer/framebuffer/vertex-array bindings, and the texture image
//! unit ring. Renderers on different contexts use different binders; a
//! `BinderRegistry` maps opaque context ids to binders so share groups can
//! reuse resources.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gl::types::{GLenum, GLint, GLuint};
use smallvec::SmallVec;

use crate::bufferobject::{BufferObjectPtr, IndexBufferPtr};
use crate::errors::*;
use crate::framebuffer::{Attachment, FramebufferObjectPtr};
use crate::graphics::{FeatureId, GraphicsManager};
use crate::holder::{ReleaseQueue, ResourceHolder, MAX_RESOURCE_INDICES};
use crate::math::Rect;
use crate::shader::{ShaderPtr, ShaderProgramPtr, ShaderStage};
use crate::shape::AttributeArrayPtr;
use crate::statetable::{
    BlendEquation, BlendFunctionFactor, Capability, CompareFunction, CullFaceMode, FrontFaceMode,
    HintMode, HintTarget, StateTable, StencilActions, StencilOperation, StencilSide, Value,
    GL_GENERATE_MIPMAP_HINT,
};
use crate::texture::{SamplerPtr, TexturePtr};
use crate::transformfeedback::TransformFeedbackPtr;
use crate::uniform::{Uniform, UniformValues};
use cgmath::{Vector2, Vector4};

use super::resource::{
    self, ProgramInputs, ResolvedAttachment, Resource, ResourceDetails, ResourceType,
    RESOURCE_TYPE_COUNT,
};

/// Opaque identifier for a GL context (or share group), supplied by the
/// embedder. The crate never creates or inspects contexts itself.
pub type ContextId = usize;

const MAX_IMAGE_UNITS: usize = 32;

/// Maps context ids to binders and hands out the per-binder slot in every
/// holder's modification words. Shared by all renderers of one embedder so
/// two renderers on the same context see the same resources.
#[derive(Default)]
pub struct BinderRegistry {
    binders: Mutex<HashMap<ContextId, Arc<Mutex<ResourceBinder>>>>,
    next_slot: Mutex<usize>,
}

impl BinderRegistry {
    pub fn new() -> Arc<BinderRegistry> {
        Arc::new(BinderRegistry::default())
    }

    pub fn binder(&self, context: ContextId) -> Option<Arc<Mutex<ResourceBinder>>> {
        self.binders.lock().unwrap().get(&context).cloned()
    }

    pub fn len(&self) -> usize {
        self.binders.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.binders.lock().unwrap().is_empty()
    }

    pub(crate) fn binder_or_create(
        &self,
        context: ContextId,
    ) -> Result<Arc<Mutex<ResourceBinder>>> {
        let mut binders = self.binders.lock().unwrap();
        if let Some(binder) = binders.get(&context) {
            return Ok(Arc::clone(binder));
        }
        let mut next_slot = self.next_slot.lock().unwrap();
        if *next_slot >= MAX_RESOURCE_INDICES {
            bail!(
                "all {} renderer resource slots are in use",
                MAX_RESOURCE_INDICES
            );
        }
        let binder = Arc::new(Mutex::new(ResourceBinder::new(*next_slot)));
        *next_slot += 1;
        binders.insert(context, Arc::clone(&binder));
        Ok(binder)
    }
}

#[derive(Copy, Clone, Default)]
struct ImageUnit {
    texture: GLuint,
    sampler: GLuint,
}

pub struct ResourceBinder {
    resource_index: usize,
    resources: HashMap<u64, Resource>,
    release_queue: Arc<ReleaseQueue>,

    // Mirror of the context's pipeline state; values are only sent when
    // they differ from it.
    gl_state: StateTable,
    enforce_next_apply: bool,

    active_program: GLuint,
    current_program_inputs: Option<ProgramInputs>,
    active_vertex_array: GLuint,
    active_array_buffer: GLuint,
    active_element_buffer: GLuint,
    active_framebuffer: GLuint,
    active_image_unit: usize,
    image_units: SmallVec<[ImageUnit; MAX_IMAGE_UNITS]>,
    image_unit_range: (usize, usize),
    next_image_unit: usize,
    // Attribute array last specified against the default vertex array,
    // for contexts without vertex array objects.
    plain_attribute_array: Option<u64>,

    gpu_memory: [usize; RESOURCE_TYPE_COUNT],
}

impl ResourceBinder {
    pub(crate) fn new(resource_index: usize) -> Self {
        debug_assert!(resource_index < MAX_RESOURCE_INDICES);
        let mut image_units = SmallVec::new();
        image_units.resize(MAX_IMAGE_UNITS, ImageUnit::default());
        ResourceBinder {
            resource_index,
            resources: HashMap::new(),
            release_queue: Arc::new(ReleaseQueue::default()),
            gl_state: StateTable::default(),
            enforce_next_apply: true,
            active_program: 0,
            current_program_inputs: None,
            active_vertex_array: 0,
            active_array_buffer: 0,
            active_element_buffer: 0,
            active_framebuffer: 0,
            active_image_unit: 0,
            image_units,
            image_unit_range: (0, MAX_IMAGE_UNITS),
            next_image_unit: 0,
            plain_attribute_array: None,
            gpu_memory: [0; RESOURCE_TYPE_COUNT],
        }
    }

    pub fn resource_index(&self) -> usize {
        self.resource_index
    }

    pub(crate) fn release_queue(&self) -> &Arc<ReleaseQueue> {
        &self.release_queue
    }

    pub fn gpu_memory_usage(&self, resource_type: ResourceType) -> usize {
        self.gpu_memory[Self::type_index(resource_type)]
    }

    pub fn resource_count(&self, resource_type: ResourceType) -> usize {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .count()
    }

    fn type_index(resource_type: ResourceType) -> usize {
        ResourceType::ALL
            .iter()
            .position(|&t| t == resource_type)
            .unwrap_or(0)
    }

    pub(crate) fn resource_gl_id(&self, holder: &ResourceHolder) -> Option<GLuint> {
        self.resources.get(&holder.uid()).map(|r| r.gl_id)
    }

    /// Restricts uniform textures to image units `[first, first + count)`.
    pub fn set_image_unit_range(&mut self, first: usize, count: usize) {
        let first = first.min(MAX_IMAGE_UNITS - 1);
        let count = count.max(1).min(MAX_IMAGE_UNITS - first);
        self.image_unit_range = (first, count);
        self.next_image_unit = first;
    }

    /// Forgets everything cached about the context's bindings and state.
    /// The next apply re-sends all of it.
    pub fn clear_cached_bindings(&mut self) {
        self.active_program = 0;
        self.current_program_inputs = None;
        self.active_vertex_array = 0;
        self.active_array_buffer = 0;
        self.active_element_buffer = 0;
        self.active_framebuffer = 0;
        self.active_image_unit = 0;
        for unit in self.image_units.iter_mut() {
            *unit = ImageUnit::default();
        }
        self.plain_attribute_array = None;
        self.enforce_next_apply = true;
    }

    // ------------------------------------------------------------------
    // Resource lifecycle.
    // ------------------------------------------------------------------

    fn take_resource(
        &mut self,
        holder: &ResourceHolder,
        resource_type: ResourceType,
    ) -> (Resource, u32) {
        holder.register_release_queue(&self.release_queue);
        let bits = holder.take_modified(self.resource_index);
        let mut res = self
            .resources
            .remove(&holder.uid())
            .unwrap_or_else(|| Resource::new(resource_type));
        if res.gl_id == 0 {
            if let Some(id) = holder.external_gl_id() {
                res.gl_id = id;
                res.externally_managed = true;
            }
        }
        (res, bits)
    }

    fn put_resource(&mut self, uid: u64, old_size: usize, res: Resource) {
        let idx = Self::type_index(res.resource_type);
        self.gpu_memory[idx] = self.gpu_memory[idx] + res.gpu_size - old_size;
        self.resources.insert(uid, res);
    }

    pub(crate) unsafe fn update_buffer_resource(
        &mut self,
        gm: &GraphicsManager,
        buffer: &BufferObjectPtr,
        target: GLenum,
    ) -> GLuint {
        let mut b = buffer.write().unwrap();
        let uid = b.holder().uid();
        let (mut res, bits) = self.take_resource(b.holder(), ResourceType::Buffer);
        let old_size = res.gpu_size;
        if bits != 0 || res.gl_id == 0 {
            resource::update_buffer(gm, &mut res, &mut b, bits, target);
            self.note_buffer_binding(target, res.gl_id);
        }
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        id
    }

    pub(crate) unsafe fn update_index_buffer_resource(
        &mut self,
        gm: &GraphicsManager,
        buffer: &IndexBufferPtr,
    ) -> GLuint {
        let mut ib = buffer.write().unwrap();
        let uid = ib.buffer().holder().uid();
        let (mut res, bits) = self.take_resource(ib.buffer().holder(), ResourceType::Buffer);
        let old_size = res.gpu_size;
        if bits != 0 || res.gl_id == 0 {
            resource::update_buffer(
                gm,
                &mut res,
                ib.buffer_mut(),
                bits,
                gl::ELEMENT_ARRAY_BUFFER,
            );
            self.note_buffer_binding(gl::ELEMENT_ARRAY_BUFFER, res.gl_id);
        }
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        id
    }

    fn note_buffer_binding(&mut self, target: GLenum, id: GLuint) {
        match target {
            gl::ARRAY_BUFFER => self.active_array_buffer = id,
            gl::ELEMENT_ARRAY_BUFFER => self.active_element_buffer = id,
            _ => {}
        }
    }

    pub(crate) unsafe fn update_sampler_resource(
        &mut self,
        gm: &GraphicsManager,
        sampler: &SamplerPtr,
    ) -> GLuint {
        let s = sampler.read().unwrap();
        let uid = s.holder().uid();
        let (mut res, bits) = self.take_resource(s.holder(), ResourceType::Sampler);
        let old_size = res.gpu_size;
        let aniso = gm.is_feature_available(FeatureId::TextureFilterAnisotropic);
        let bits = if res.gl_id == 0 {
            bits | crate::texture::sampler_change::PARAMETERS
        } else {
            bits
        };
        resource::update_sampler(gm, &mut res, &s, bits, aniso);
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        id
    }

    pub(crate) unsafe fn update_texture_resource(
        &mut self,
        gm: &GraphicsManager,
        texture: &TexturePtr,
    ) -> GLuint {
        let sampler_objects = gm.is_feature_available(FeatureId::SamplerObjects);
        let aniso = gm.is_feature_available(FeatureId::TextureFilterAnisotropic);

        let sampler_ptr = texture.read().unwrap().sampler().cloned();
        if sampler_objects {
            if let Some(sampler) = &sampler_ptr {
                self.update_sampler_resource(gm, sampler);
            }
        }

        let mut t = texture.write().unwrap();
        let uid = t.holder().uid();
        let (mut res, bits) = self.take_resource(t.holder(), ResourceType::Texture);
        let old_size = res.gpu_size;
        if bits != 0 || res.gl_id == 0 {
            let inline_guard = if sampler_objects {
                None
            } else {
                sampler_ptr.as_ref().map(|s| s.read().unwrap())
            };
            resource::update_texture(
                gm,
                &mut res,
                &mut t,
                bits,
                inline_guard.as_ref().map(|g| &**g),
                aniso,
            );
            // update_texture left the texture bound on the active unit.
            self.image_units[self.active_image_unit].texture = res.gl_id;
        }
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        id
    }

    /// Returns the shader's GL id and whether its source was recompiled.
    unsafe fn update_shader_resource(
        &mut self,
        gm: &GraphicsManager,
        shader: &ShaderPtr,
    ) -> Result<(GLuint, bool)> {
        let s = shader.read().unwrap();
        let uid = s.holder().uid();
        let (mut res, bits) = self.take_resource(s.holder(), ResourceType::Shader);
        let old_size = res.gpu_size;
        let bits = if res.gl_id == 0 {
            bits | crate::shader::change::SOURCE
        } else {
            bits
        };
        let recompiled = bits & crate::shader::change::SOURCE != 0;
        let result = resource::update_shader(gm, &mut res, &s, bits);
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        result?;
        Ok((id, recompiled))
    }

    pub(crate) unsafe fn update_program_resource(
        &mut self,
        gm: &GraphicsManager,
        program: &ShaderProgramPtr,
    ) -> Result<GLuint> {
        let p = program.read().unwrap();

        let mut stage_ids: SmallVec<[(ShaderStage, GLuint); 3]> = SmallVec::new();
        let mut recompiled = false;
        for &stage in &[ShaderStage::Vertex, ShaderStage::Fragment, ShaderStage::Geometry] {
            let shader = match p.shader(stage) {
                Some(shader) => Arc::clone(shader),
                None => continue,
            };
            if stage == ShaderStage::Geometry
                && !gm.is_feature_available(FeatureId::GeometryShader)
            {
                warn!("Geometry shaders are unavailable, ignoring the geometry stage.");
                continue;
            }
            let (id, stage_recompiled) = self.update_shader_resource(gm, &shader)?;
            stage_ids.push((stage, id));
            recompiled |= stage_recompiled;
        }

        let uid = p.holder().uid();
        let (mut res, bits) = self.take_resource(p.holder(), ResourceType::ShaderProgram);
        let old_size = res.gpu_size;
        let result = resource::update_program(gm, &mut res, &p, &stage_ids, bits, recompiled);
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        result?;
        Ok(id)
    }

    pub(crate) unsafe fn update_framebuffer_resource(
        &mut self,
        gm: &GraphicsManager,
        fbo: &FramebufferObjectPtr,
    ) -> Result<GLuint> {
        let (color, depth, stencil) = {
            let f = fbo.read().unwrap();
            let mut color = Vec::new();
            for index in 0..crate::framebuffer::MAX_COLOR_ATTACHMENTS {
                color.push(f.color_attachment(index).clone());
            }
            (color, f.depth_attachment().clone(), f.stencil_attachment().clone())
        };

        let mut resolve = |binder: &mut Self, attachment: &Attachment| -> ResolvedAttachment {
            match attachment {
                Attachment::Unbound => ResolvedAttachment::Unbound,
                Attachment::Texture(texture) => {
                    ResolvedAttachment::Texture(binder.update_texture_resource(gm, texture))
                }
                Attachment::Renderbuffer { format, samples } => ResolvedAttachment::Renderbuffer {
                    format: *format,
                    samples: *samples,
                },
            }
        };
        let resolved_color: Vec<ResolvedAttachment> =
            color.iter().map(|a| resolve(self, a)).collect();
        let resolved_depth = resolve(self, &depth);
        let resolved_stencil = resolve(self, &stencil);

        let f = fbo.read().unwrap();
        let uid = f.holder().uid();
        let (mut res, bits) = self.take_resource(f.holder(), ResourceType::Framebuffer);
        let old_size = res.gpu_size;
        let bits = if res.gl_id == 0 {
            bits | crate::framebuffer::change::DIMENSIONS
                | crate::framebuffer::change::COLOR_ATTACHMENTS
                | crate::framebuffer::change::DEPTH_ATTACHMENT
                | crate::framebuffer::change::STENCIL_ATTACHMENT
        } else {
            bits
        };
        let result = resource::update_framebuffer(
            gm,
            &mut res,
            &f,
            &resolved_color,
            &resolved_depth,
            &resolved_stencil,
            bits,
            gm.is_feature_available(FeatureId::MultipleColorAttachments),
            gm.is_feature_available(FeatureId::RenderbufferMultisample),
        );
        if bits != 0 {
            self.active_framebuffer = res.gl_id;
        }
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        result?;
        Ok(id)
    }

    pub(crate) unsafe fn update_transform_feedback_resource(
        &mut self,
        gm: &GraphicsManager,
        tf: &TransformFeedbackPtr,
    ) -> Result<GLuint> {
        if !gm.is_feature_available(FeatureId::TransformFeedback) {
            bail!("transform feedback is unavailable on this context");
        }
        let capture_id = {
            let t = tf.read().unwrap();
            match t.capture_buffer().cloned() {
                Some(buffer) => self.update_buffer_resource(gm, &buffer, gl::ARRAY_BUFFER),
                None => 0,
            }
        };
        let t = tf.read().unwrap();
        let uid = t.holder().uid();
        let (mut res, bits) = self.take_resource(t.holder(), ResourceType::TransformFeedback);
        let old_size = res.gpu_size;
        let bits = if res.gl_id == 0 {
            bits | crate::transformfeedback::change::CAPTURE_BUFFER
        } else {
            bits
        };
        resource::update_transform_feedback(gm, &mut res, &t, capture_id, bits);
        let id = res.gl_id;
        self.put_resource(uid, old_size, res);
        Ok(id)
    }

    /// Updates and binds the attribute bindings a shape draws with. Uses a
    /// vertex array object when the feature is available, otherwise
    /// re-specifies pointers whenever a different array comes up.
    pub(crate) unsafe fn bind_attribute_array(
        &mut self,
        gm: &GraphicsManager,
        array: &AttributeArrayPtr,
    ) {
        let divisors = gm.is_feature_available(FeatureId::InstancedArrays);
        let vaos = gm.is_feature_available(FeatureId::VertexArrays);

        let attributes = {
            let a = array.read().unwrap();
            a.attributes().to_vec()
        };
        let mut resolved = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let id = self.update_buffer_resource(gm, &attribute.buffer, gl::ARRAY_BUFFER);
            resolved.push((attribute, id));
        }

        let a = array.read().unwrap();
        let uid = a.holder().uid();
        if vaos {
            let (mut res, bits) = self.take_resource(a.holder(), ResourceType::AttributeArray);
            let old_size = res.gpu_size;
            let bits = if res.gl_id == 0 {
                bits | crate::shape::change::ATTRIBUTES
            } else {
                bits
            };
            if bits != 0 {
                // update_attribute_array leaves the array bound.
                resource::update_attribute_array(gm, &mut res, &resolved, bits, divisors);
                self.active_vertex_array = res.gl_id;
                // The element binding is part of the vertex array.
                self.active_element_buffer = 0;
            } else if self.active_vertex_array != res.gl_id {
                gm.bind_vertex_array(res.gl_id);
                self.active_vertex_array = res.gl_id;
                self.active_element_buffer = 0;
            }
            self.put_resource(uid, old_size, res);
        } else {
            a.holder().register_release_queue(&self.release_queue);
            let bits = a.holder().take_modified(self.resource_index);
            if bits != 0 || self.plain_attribute_array != Some(uid) {
                resource::specify_attributes(gm, &resolved, divisors);
                self.plain_attribute_array = Some(uid);
            }
        }
        if let Some(&(_, last_id)) = resolved.last() {
            self.active_array_buffer = last_id;
        }
    }

    // ------------------------------------------------------------------
    // Bindings.
    // ------------------------------------------------------------------

    pub(crate) unsafe fn bind_program_id(&mut self, gm: &GraphicsManager, id: GLuint) -> bool {
        if id == self.active_program {
            return false;
        }
        gm.use_program(id);
        self.active_program = id;
        true
    }

    /// Binds a program holder's GL program and caches its input locations
    /// for uniform sends. Returns true when the active program changed.
    pub(crate) unsafe fn bind_program(
        &mut self,
        gm: &GraphicsManager,
        program: &ShaderProgramPtr,
    ) -> Result<bool> {
        let id = self.update_program_resource(gm, program)?;
        let changed = self.bind_program_id(gm, id);
        if changed || self.current_program_inputs.is_none() {
            let uid = program.read().unwrap().holder().uid();
            self.current_program_inputs = match self.resources.get(&uid).map(|r| &r.details) {
                Some(ResourceDetails::Program(inputs)) => Some(inputs.clone()),
                _ => None,
            };
        }
        Ok(changed)
    }

    pub(crate) unsafe fn bind_framebuffer_id(&mut self, gm: &GraphicsManager, id: GLuint) {
        if id != self.active_framebuffer {
            gm.bind_framebuffer(gl::FRAMEBUFFER, id);
            self.active_framebuffer = id;
        }
    }

    pub(crate) fn active_framebuffer(&self) -> GLuint {
        self.active_framebuffer
    }

    pub(crate) unsafe fn bind_element_buffer_id(&mut self, gm: &GraphicsManager, id: GLuint) {
        if id != self.active_element_buffer {
            gm.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, id);
            self.active_element_buffer = id;
        }
    }

    pub(crate) unsafe fn bind_array_buffer_id(&mut self, gm: &GraphicsManager, id: GLuint) {
        if id != self.active_array_buffer {
            gm.bind_buffer(gl::ARRAY_BUFFER, id);
            self.active_array_buffer = id;
        }
    }

    pub(crate) unsafe fn bind_vertex_array_id(&mut self, gm: &GraphicsManager, id: GLuint) {
        if id != self.active_vertex_array {
            gm.bind_vertex_array(id);
            self.active_vertex_array = id;
            self.active_element_buffer = 0;
        }
    }

    pub(crate) unsafe fn bind_image_unit(&mut self, gm: &GraphicsManager, unit: usize) {
        let unit = unit.min(MAX_IMAGE_UNITS - 1);
        if unit != self.active_image_unit {
            gm.active_texture(gl::TEXTURE0 + unit as GLenum);
            self.active_image_unit = unit;
        }
    }

    /// Unbinds every texture resident on an image unit in the configured
    /// range. The unit a texture sat on is forgotten, so the next texture
    /// uniform re-binds.
    pub(crate) unsafe fn unbind_textures(&mut self, gm: &GraphicsManager) {
        let (first, count) = self.image_unit_range;
        for unit in first..first + count {
            if self.image_units[unit].texture == 0 {
                continue;
            }
            self.bind_image_unit(gm, unit);
            gm.bind_texture(gl::TEXTURE_2D, 0);
            gm.bind_texture(gl::TEXTURE_CUBE_MAP, 0);
            self.image_units[unit].texture = 0;
        }
    }

    /// Unbinds every sampler object resident on an image unit in the
    /// configured range.
    pub(crate) unsafe fn unbind_samplers(&mut self, gm: &GraphicsManager) {
        let (first, count) = self.image_unit_range;
        for unit in first..first + count {
            if self.image_units[unit].sampler != 0 {
                gm.bind_sampler(unit as GLuint, 0);
                self.image_units[unit].sampler = 0;
            }
        }
    }

    /// Binds a texture (and its sampler object, when present) to an image
    /// unit inside the configured range and returns the unit index.
    /// Textures already resident on a unit are reused.
    unsafe fn bind_texture_to_unit(
        &mut self,
        gm: &GraphicsManager,
        target: GLenum,
        texture_id: GLuint,
        sampler_id: GLuint,
    ) -> i32 {
        let (first, count) = self.image_unit_range;
        let existing = (first..first + count)
            .find(|&unit| self.image_units[unit].texture == texture_id && texture_id != 0);
        let unit = match existing {
            Some(unit) => unit,
            None => {
                let unit = self.next_image_unit;
                self.next_image_unit = first + (self.next_image_unit + 1 - first) % count;
                unit
            }
        };

        if self.active_image_unit != unit {
            gm.active_texture(gl::TEXTURE0 + unit as GLenum);
            self.active_image_unit = unit;
        }
        if self.image_units[unit].texture != texture_id {
            gm.bind_texture(target, texture_id);
            self.image_units[unit].texture = texture_id;
        }
        if self.image_units[unit].sampler != sampler_id {
            gm.bind_sampler(unit as GLuint, sampler_id);
            self.image_units[unit].sampler = sampler_id;
        }
        unit as i32
    }

    // ------------------------------------------------------------------
    // Uniform sends.
    // ------------------------------------------------------------------

    /// Sends one merged uniform to the active program. Inputs the program
    /// does not use are skipped silently; texture uniforms update and bind
    /// their textures as a side effect.
    pub(crate) unsafe fn send_uniform(&mut self, gm: &GraphicsManager, uniform: &Uniform) {
        let location = match &self.current_program_inputs {
            Some(inputs) => match inputs.uniform_locations.get(&uniform.registry_index()) {
                Some(&location) if location >= 0 => location,
                _ => return,
            },
            None => return,
        };
        let count = uniform.count() as i32;

        match uniform.values() {
            UniformValues::Int(v) => gm.uniform_1iv(location, count, v.as_ptr()),
            UniformValues::UnsignedInt(v) => gm.uniform_1uiv(location, count, v.as_ptr()),
            UniformValues::Float(v) => gm.uniform_1fv(location, count, v.as_ptr()),
            UniformValues::FloatVector2(v) => {
                gm.uniform_2fv(location, count, v.as_ptr() as *const f32)
            }
            UniformValues::FloatVector3(v) => {
                gm.uniform_3fv(location, count, v.as_ptr() as *const f32)
            }
            UniformValues::FloatVector4(v) => {
                gm.uniform_4fv(location, count, v.as_ptr() as *const f32)
            }
            UniformValues::IntVector2(v) => {
                gm.uniform_2iv(location, count, v.as_ptr() as *const i32)
            }
            UniformValues::IntVector3(v) => {
                gm.uniform_3iv(location, count, v.as_ptr() as *const i32)
            }
            UniformValues::IntVector4(v) => {
                gm.uniform_4iv(location, count, v.as_ptr() as *const i32)
            }
            UniformValues::UnsignedIntVector2(v) => {
                gm.uniform_2uiv(location, count, v.as_ptr() as *const u32)
            }
            UniformValues::UnsignedIntVector3(v) => {
                gm.uniform_3uiv(location, count, v.as_ptr() as *const u32)
            }
            UniformValues::UnsignedIntVector4(v) => {
                gm.uniform_4uiv(location, count, v.as_ptr() as *const u32)
            }
            UniformValues::Matrix2x2(v) => {
                gm.uniform_matrix_2fv(location, count, gl::FALSE, v.as_ptr() as *const f32)
            }
            UniformValues::Matrix3x3(v) => {
                gm.uniform_matrix_3fv(location, count, gl::FALSE, v.as_ptr() as *const f32)
            }
            UniformValues::Matrix4x4(v) => {
                gm.uniform_matrix_4fv(location, count, gl::FALSE, v.as_ptr() as *const f32)
            }
            UniformValues::Texture(textures) | UniformValues::CubeMapTexture(textures) => {
                let mut units: SmallVec<[i32; 8]> = SmallVec::new();
                for texture in textures {
                    let texture_id = self.update_texture_resource(gm, texture);
                    let (target, sampler_ptr) = {
                        let t = texture.read().unwrap();
                        (resource::texture_target(t.kind()), t.sampler().cloned())
                    };
                    let sampler_id = match sampler_ptr {
                        Some(sampler) if gm.is_feature_available(FeatureId::SamplerObjects) => {
                            self.update_sampler_resource(gm, &sampler)
                        }
                        _ => 0,
                    };
                    units.push(self.bind_texture_to_unit(gm, target, texture_id, sampler_id));
                }
                gm.uniform_1iv(location, units.len() as i32, units.as_ptr());
            }
        }
    }

    // ------------------------------------------------------------------
    // State application.
    // ------------------------------------------------------------------

    /// Sends to GL every entry of `st` that is set and differs from the
    /// mirror (or everything set, when `st` is enforced or the mirror is
    /// stale), then folds the entries into the mirror.
    pub(crate) unsafe fn apply_state_table(&mut self, gm: &GraphicsManager, st: &StateTable) {
        let enforce = st.is_enforced() || self.enforce_next_apply;
        self.enforce_next_apply = false;

        for &cap in Capability::ALL.iter() {
            if !st.is_capability_set(cap) || !gm.is_valid_statetable_capability(cap) {
                continue;
            }
            let want = st.is_enabled(cap);
            if enforce || want != self.gl_state.is_enabled(cap) {
                if want {
                    gm.enable(cap.into());
                } else {
                    gm.disable(cap.into());
                }
                self.gl_state.enable(cap, want);
            }
        }

        for &value in Value::ALL.iter() {
            if !st.is_value_set(value) {
                continue;
            }
            if !enforce && st.is_value_equal(&self.gl_state, value) {
                continue;
            }
            self.send_value(gm, st, value);
        }
    }

    unsafe fn send_value(&mut self, gm: &GraphicsManager, st: &StateTable, value: Value) {
        match value {
            Value::BlendColor => {
                let c = st.blend_color();
                gm.blend_color(c.x, c.y, c.z, c.w);
                self.gl_state.set_blend_color(c);
            }
            Value::BlendEquations => {
                let (rgb, alpha) = (st.rgb_blend_equation(), st.alpha_blend_equation());
                gm.blend_equation_separate(rgb.into(), alpha.into());
                self.gl_state.set_blend_equations(rgb, alpha);
            }
            Value::BlendFunctions => {
                let (rgb_src, rgb_dst) = st.rgb_blend_functions();
                let (alpha_src, alpha_dst) = st.alpha_blend_functions();
                gm.blend_func_separate(
                    rgb_src.into(),
                    rgb_dst.into(),
                    alpha_src.into(),
                    alpha_dst.into(),
                );
                self.gl_state
                    .set_blend_functions(rgb_src, rgb_dst, alpha_src, alpha_dst);
            }
            Value::ClearColor => {
                let c = st.clear_color();
                gm.clear_color(c.x, c.y, c.z, c.w);
                self.gl_state.set_clear_color(c);
            }
            Value::ClearDepth => {
                gm.clear_depthf(st.clear_depth());
                self.gl_state.set_clear_depth(st.clear_depth());
            }
            Value::ClearStencil => {
                gm.clear_stencil(st.clear_stencil());
                self.gl_state.set_clear_stencil(st.clear_stencil());
            }
            Value::ColorWriteMasks => {
                let [r, g, b, a] = st.color_write_masks();
                gm.color_mask(r as u8, g as u8, b as u8, a as u8);
                self.gl_state.set_color_write_masks(r, g, b, a);
            }
            Value::CullFaceMode => {
                gm.cull_face(st.cull_face_mode().into());
                self.gl_state.set_cull_face_mode(st.cull_face_mode());
            }
            Value::FrontFaceMode => {
                gm.front_face(st.front_face_mode().into());
                self.gl_state.set_front_face_mode(st.front_face_mode());
            }
            Value::DefaultInnerTessellationLevel => {
                let levels = st.default_inner_tessellation_level();
                if gm.is_feature_available(FeatureId::DefaultTessellationLevels) {
                    gm.patch_parameterfv(gl::PATCH_DEFAULT_INNER_LEVEL, levels.as_ptr());
                }
                self.gl_state.set_default_inner_tessellation_level(levels);
            }
            Value::DefaultOuterTessellationLevel => {
                let levels = st.default_outer_tessellation_level();
                if gm.is_feature_available(FeatureId::DefaultTessellationLevels) {
                    gm.patch_parameterfv(gl::PATCH_DEFAULT_OUTER_LEVEL, levels.as_ptr());
                }
                self.gl_state.set_default_outer_tessellation_level(levels);
            }
            Value::DepthFunction => {
                gm.depth_func(st.depth_function().into());
                self.gl_state.set_depth_function(st.depth_function());
            }
            Value::DepthRange => {
                let range = st.depth_range();
                gm.depth_rangef(range.x, range.y);
                self.gl_state.set_depth_range(range);
            }
            Value::DepthWriteMask => {
                gm.depth_mask(st.depth_write_mask() as u8);
                self.gl_state.set_depth_write_mask(st.depth_write_mask());
            }
            Value::Hints => {
                let mode = st.hint(HintTarget::GenerateMipmap);
                gm.hint(HintTarget::GenerateMipmap.into(), mode.into());
                self.gl_state.set_hint(HintTarget::GenerateMipmap, mode);
            }
            Value::LineWidth => {
                gm.line_width(st.line_width());
                self.gl_state.set_line_width(st.line_width());
            }
            Value::MinSampleShading => {
                if gm.is_feature_available(FeatureId::SampleShading) {
                    gm.min_sample_shading(st.min_sample_shading());
                }
                self.gl_state.set_min_sample_shading(st.min_sample_shading());
            }
            Value::PolygonOffset => {
                let (factor, units) = st.polygon_offset();
                gm.polygon_offset(factor, units);
                self.gl_state.set_polygon_offset(factor, units);
            }
            Value::SampleCoverage => {
                let (coverage, inverted) = st.sample_coverage();
                gm.sample_coverage(coverage, inverted as u8);
                self.gl_state.set_sample_coverage(coverage, inverted);
            }
            Value::ScissorBox => {
                let r = st.scissor_box();
                gm.scissor(r.x, r.y, r.width, r.height);
                self.gl_state.set_scissor_box(r);
            }
            Value::StencilFunctions => {
                let (front, back) = st.stencil_functions();
                gm.stencil_func_separate(
                    gl::FRONT,
                    front.function.into(),
                    front.reference,
                    front.mask,
                );
                gm.stencil_func_separate(gl::BACK, back.function.into(), back.reference, back.mask);
                self.gl_state.set_stencil_functions(front, back);
            }
            Value::StencilOperations => {
                let (front, back) = st.stencil_operations();
                gm.stencil_op_separate(
                    gl::FRONT,
                    front.stencil_fail.into(),
                    front.depth_fail.into(),
                    front.pass.into(),
                );
                gm.stencil_op_separate(
                    gl::BACK,
                    back.stencil_fail.into(),
                    back.depth_fail.into(),
                    back.pass.into(),
                );
                self.gl_state.set_stencil_operations(front, back);
            }
            Value::StencilWriteMasks => {
                let (front, back) = st.stencil_write_masks();
                gm.stencil_mask_separate(gl::FRONT, front);
                gm.stencil_mask_separate(gl::BACK, back);
                self.gl_state.set_stencil_write_masks(front, back);
            }
            Value::Viewport => {
                let r = st.viewport();
                gm.viewport(r.x, r.y, r.width, r.height);
                self.gl_state.set_viewport(r);
            }
        }
    }

    /// Overwrites the mirror with `st`'s set entries, without touching GL.
    /// For callers that mutated the context through the wrapped surface
    /// themselves.
    pub fn update_state_from_state_table(&mut self, st: &StateTable) {
        self.gl_state.merge_values_from(st, st);
    }

    pub(crate) fn gl_state(&self) -> &StateTable {
        &self.gl_state
    }

    /// Rebuilds the mirror by querying the context. `width` and `height`
    /// size the default viewport of the rebuilt table.
    pub(crate) unsafe fn update_state_from_open_gl(
        &mut self,
        gm: &GraphicsManager,
        width: i32,
        height: i32,
    ) {
        let mut st = StateTable::new(width, height);

        for &cap in Capability::ALL.iter() {
            if gm.is_valid_statetable_capability(cap) {
                st.enable(cap, gm.is_enabled(cap.into()) != 0);
            }
        }

        st.set_blend_color(self.query_vec4(gm, gl::BLEND_COLOR));
        st.set_blend_equations(
            query_enum(gm, gl::BLEND_EQUATION_RGB, BlendEquation::from_gl, BlendEquation::Add),
            query_enum(gm, gl::BLEND_EQUATION_ALPHA, BlendEquation::from_gl, BlendEquation::Add),
        );
        st.set_blend_functions(
            query_enum(
                gm,
                gl::BLEND_SRC_RGB,
                BlendFunctionFactor::from_gl,
                BlendFunctionFactor::One,
            ),
            query_enum(
                gm,
                gl::BLEND_DST_RGB,
                BlendFunctionFactor::from_gl,
                BlendFunctionFactor::Zero,
            ),
            query_enum(
                gm,
                gl::BLEND_SRC_ALPHA,
                BlendFunctionFactor::from_gl,
                BlendFunctionFactor::One,
            ),
            query_enum(
                gm,
                gl::BLEND_DST_ALPHA,
                BlendFunctionFactor::from_gl,
                BlendFunctionFactor::Zero,
            ),
        );
        st.set_clear_color(self.query_vec4(gm, gl::COLOR_CLEAR_VALUE));
        st.set_clear_depth(query_float(gm, gl::DEPTH_CLEAR_VALUE));
        st.set_clear_stencil(query_int(gm, gl::STENCIL_CLEAR_VALUE));
        {
            let mut masks = [0; 4];
            gm.get_integerv(gl::COLOR_WRITEMASK, masks.as_mut_ptr());
            st.set_color_write_masks(
                masks[0] != 0,
                masks[1] != 0,
                masks[2] != 0,
                masks[3] != 0,
            );
        }
        st.set_cull_face_mode(query_enum(
            gm,
            gl::CULL_FACE_MODE,
            CullFaceMode::from_gl,
            CullFaceMode::Back,
        ));
        st.set_front_face_mode(query_enum(
            gm,
            gl::FRONT_FACE,
            FrontFaceMode::from_gl,
            FrontFaceMode::CounterClockwise,
        ));
        if gm.is_feature_available(FeatureId::DefaultTessellationLevels) {
            let mut inner = [0.0f32; 2];
            gm.get_floatv(gl::PATCH_DEFAULT_INNER_LEVEL, inner.as_mut_ptr());
            st.set_default_inner_tessellation_level(inner);
            let mut outer = [0.0f32; 4];
            gm.get_floatv(gl::PATCH_DEFAULT_OUTER_LEVEL, outer.as_mut_ptr());
            st.set_default_outer_tessellation_level(outer);
        }
        st.set_depth_function(query_enum(
            gm,
            gl::DEPTH_FUNC,
            CompareFunction::from_gl,
            CompareFunction::Less,
        ));
        {
            let mut range = [0.0f32; 2];
            gm.get_floatv(gl::DEPTH_RANGE, range.as_mut_ptr());
            st.set_depth_range(Vector2::new(range[0], range[1]));
        }
        st.set_depth_write_mask(query_int(gm, gl::DEPTH_WRITEMASK) != 0);
        st.set_hint(
            HintTarget::GenerateMipmap,
            query_enum(gm, GL_GENERATE_MIPMAP_HINT, HintMode::from_gl, HintMode::DontCare),
        );
        st.set_line_width(query_float(gm, gl::LINE_WIDTH));
        if gm.is_feature_available(FeatureId::SampleShading) {
            st.set_min_sample_shading(query_float(gm, gl::MIN_SAMPLE_SHADING_VALUE));
        }
        st.set_polygon_offset(
            query_float(gm, gl::POLYGON_OFFSET_FACTOR),
            query_float(gm, gl::POLYGON_OFFSET_UNITS),
        );
        st.set_sample_coverage(
            query_float(gm, gl::SAMPLE_COVERAGE_VALUE),
            query_int(gm, gl::SAMPLE_COVERAGE_INVERT) != 0,
        );
        st.set_scissor_box(self.query_rect(gm, gl::SCISSOR_BOX));
        st.set_stencil_functions(
            StencilSide {
                function: query_enum(
                    gm,
                    gl::STENCIL_FUNC,
                    CompareFunction::from_gl,
                    CompareFunction::Always,
                ),
                reference: query_int(gm, gl::STENCIL_REF),
                mask: query_int(gm, gl::STENCIL_VALUE_MASK) as u32,
            },
            StencilSide {
                function: query_enum(
                    gm,
                    gl::STENCIL_BACK_FUNC,
                    CompareFunction::from_gl,
                    CompareFunction::Always,
                ),
                reference: query_int(gm, gl::STENCIL_BACK_REF),
                mask: query_int(gm, gl::STENCIL_BACK_VALUE_MASK) as u32,
            },
        );
        st.set_stencil_operations(
            StencilActions {
                stencil_fail: query_enum(
                    gm,
                    gl::STENCIL_FAIL,
                    StencilOperation::from_gl,
                    StencilOperation::Keep,
                ),
                depth_fail: query_enum(
                    gm,
                    gl::STENCIL_PASS_DEPTH_FAIL,
                    StencilOperation::from_gl,
                    StencilOperation::Keep,
                ),
                pass: query_enum(
                    gm,
                    gl::STENCIL_PASS_DEPTH_PASS,
                    StencilOperation::from_gl,
                    StencilOperation::Keep,
                ),
            },
            StencilActions {
                stencil_fail: query_enum(
                    gm,
                    gl::STENCIL_BACK_FAIL,
                    StencilOperation::from_gl,
                    StencilOperation::Keep,
                ),
                depth_fail: query_enum(
                    gm,
                    gl::STENCIL_BACK_PASS_DEPTH_FAIL,
                    StencilOperation::from_gl,
                    StencilOperation::Keep,
                ),
                pass: query_enum(
                    gm,
                    gl::STENCIL_BACK_PASS_DEPTH_PASS,
                    StencilOperation::from_gl,
                    StencilOperation::Keep,
                ),
            },
        );
        st.set_stencil_write_masks(
            query_int(gm, gl::STENCIL_WRITEMASK) as u32,
            query_int(gm, gl::STENCIL_BACK_WRITEMASK) as u32,
        );
        st.set_viewport(self.query_rect(gm, gl::VIEWPORT));

        self.gl_state = st;
        self.enforce_next_apply = false;
    }

    unsafe fn query_vec4(&self, gm: &GraphicsManager, pname: GLenum) -> Vector4<f32> {
        let mut v = [0.0f32; 4];
        gm.get_floatv(pname, v.as_mut_ptr());
        Vector4::new(v[0], v[1], v[2], v[3])
    }

    unsafe fn query_rect(&self, gm: &GraphicsManager, pname: GLenum) -> Rect {
        let mut v = [0i32; 4];
        gm.get_integerv(pname, v.as_mut_ptr());
        Rect::new(v[0], v[1], v[2], v[3])
    }

    // ------------------------------------------------------------------
    // Deletion.
    // ------------------------------------------------------------------

    /// Drains the release queue and deletes the GL objects of dropped
    /// holders. Must run with the binder's context current.
    pub(crate) unsafe fn release_resources(&mut self, gm: &GraphicsManager) {
        for uid in self.release_queue.drain() {
            self.delete_resource_by_uid(gm, uid);
        }
    }

    pub(crate) unsafe fn delete_resource_by_uid(&mut self, gm: &GraphicsManager, uid: u64) {
        if let Some(mut res) = self.resources.remove(&uid) {
            let idx = Self::type_index(res.resource_type);
            self.gpu_memory[idx] -= res.gpu_size;
            res.delete(gm);
        }
    }

    pub(crate) unsafe fn delete_typed_resources(
        &mut self,
        gm: &GraphicsManager,
        resource_type: ResourceType,
    ) {
        let uids: Vec<u64> = self
            .resources
            .iter()
            .filter(|(_, r)| r.resource_type == resource_type)
            .map(|(&uid, _)| uid)
            .collect();
        for uid in uids {
            self.delete_resource_by_uid(gm, uid);
        }
    }

    /// Deletes every tracked GL object. With `force_abandon` the objects
    /// are forgotten without GL calls, for contexts that are already gone.
    pub(crate) unsafe fn delete_all_resources(&mut self, gm: &GraphicsManager, force_abandon: bool) {
        if force_abandon {
            self.abandon_resources();
            return;
        }
        let uids: Vec<u64> = self.resources.keys().cloned().collect();
        for uid in uids {
            self.delete_resource_by_uid(gm, uid);
        }
        self.clear_cached_bindings();
    }

    /// Forgets all resources without touching GL.
    pub(crate) fn abandon_resources(&mut self) {
        self.resources.clear();
        self.gpu_memory = [0; RESOURCE_TYPE_COUNT];
        self.clear_cached_bindings();
    }
}

unsafe fn query_int(gm: &GraphicsManager, pname: GLenum) -> GLint {
    let mut v = 0;
    gm.get_integerv(pname, &mut v);
    v
}

unsafe fn query_float(gm: &GraphicsManager, pname: GLenum) -> f32 {
    let mut v = 0.0;
    gm.get_floatv(pname, &mut v);
    v
}

unsafe fn query_enum<T>(
    gm: &GraphicsManager,
    pname: GLenum,
    convert: fn(GLenum) -> Option<T>,
    fallback: T,
) -> T {
    let raw = query_int(gm, pname) as GLenum;
    match convert(raw) {
        Some(value) => value,
        None => {
            warn!("Unrecognized GL value {:#x} for query {:#x}.", raw, pname);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_hands_out_distinct_slots() {
        let registry = BinderRegistry::new();
        let a = registry.binder_or_create(1).unwrap();
        let b = registry.binder_or_create(2).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(
            a.lock().unwrap().resource_index(),
            b.lock().unwrap().resource_index()
        );

        // The same context maps to the same binder.
        let a2 = registry.binder_or_create(1).unwrap();
        assert!(Arc::ptr_eq(&a, &a2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_slots_are_bounded() {
        let registry = BinderRegistry::new();
        for context in 0..MAX_RESOURCE_INDICES {
            registry.binder_or_create(context).unwrap();
        }
        assert!(registry.binder_or_create(MAX_RESOURCE_INDICES).is_err());
    }

    #[test]
    fn image_unit_range_is_clamped() {
        let mut binder = ResourceBinder::new(0);
        binder.set_image_unit_range(MAX_IMAGE_UNITS + 5, 100);
        let (first, count) = binder.image_unit_range;
        assert_eq!(first, MAX_IMAGE_UNITS - 1);
        assert_eq!(count, 1);
    }
}
