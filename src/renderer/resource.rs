//! GL-side records for data holders and the per-type update routines.
//!
//! A `Resource` pairs a holder uid with the GL object created for it in
//! one context. Update routines consume the holder's change bits and
//! re-specify only what changed. Routines needing other holders' GL ids
//! (framebuffer attachments, attribute buffers) take them pre-resolved;
//! the binder owns that recursion.

use std::os::raw::c_void;
use std::ptr;

use gl::types::{GLchar, GLenum, GLint, GLuint};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::bufferobject::{self, BufferObject};
use crate::errors::*;
use crate::framebuffer::{self, FramebufferObject, RenderbufferFormat, MAX_COLOR_ATTACHMENTS};
use crate::graphics::GraphicsManager;
use crate::registry::InputKind;
use crate::shader::{self, program_change, Shader, ShaderProgram, ShaderStage};
use crate::shape::{self, VertexAttribute};
use crate::texture::{self, sampler_change, Sampler, Texture, TextureKind};
use crate::transformfeedback::{self, TransformFeedback};

// The sampler parameter enum is 4.6/EXT; the limit enum lives in
// graphics::constants.
const GL_TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FE;

/// The GL object categories a holder can own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Buffer,
    Texture,
    Sampler,
    Framebuffer,
    Shader,
    ShaderProgram,
    AttributeArray,
    TransformFeedback,
}

pub const RESOURCE_TYPE_COUNT: usize = 8;

impl ResourceType {
    pub const ALL: [ResourceType; RESOURCE_TYPE_COUNT] = [
        ResourceType::Buffer,
        ResourceType::Texture,
        ResourceType::Sampler,
        ResourceType::Framebuffer,
        ResourceType::Shader,
        ResourceType::ShaderProgram,
        ResourceType::AttributeArray,
        ResourceType::TransformFeedback,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Buffer => "buffer",
            ResourceType::Texture => "texture",
            ResourceType::Sampler => "sampler",
            ResourceType::Framebuffer => "framebuffer",
            ResourceType::Shader => "shader",
            ResourceType::ShaderProgram => "shader program",
            ResourceType::AttributeArray => "attribute array",
            ResourceType::TransformFeedback => "transform feedback",
        }
    }
}

/// Location of one registry input in a linked program. A negative uniform
/// location means the program does not use the input.
#[derive(Clone, Debug)]
pub(crate) struct ProgramInputs {
    pub uniform_locations: HashMap<usize, GLint>,
    pub attribute_locations: HashMap<usize, GLint>,
}

#[derive(Clone, Debug)]
pub(crate) enum ResourceDetails {
    None,
    Texture {
        target: GLenum,
    },
    Program(ProgramInputs),
    /// Renderbuffers created for attachments are owned by the framebuffer
    /// resource and deleted with it.
    Framebuffer {
        renderbuffers: SmallVec<[GLuint; MAX_COLOR_ATTACHMENTS + 2]>,
    },
}

pub(crate) struct Resource {
    pub resource_type: ResourceType,
    pub gl_id: GLuint,
    pub externally_managed: bool,
    pub gpu_size: usize,
    pub details: ResourceDetails,
}

impl Resource {
    pub fn new(resource_type: ResourceType) -> Self {
        Resource {
            resource_type,
            gl_id: 0,
            externally_managed: false,
            gpu_size: 0,
            details: ResourceDetails::None,
        }
    }

    pub fn with_external_id(resource_type: ResourceType, gl_id: GLuint) -> Self {
        Resource {
            resource_type,
            gl_id,
            externally_managed: true,
            gpu_size: 0,
            details: ResourceDetails::None,
        }
    }

    /// Deletes the GL object unless the id is owned by the caller.
    pub unsafe fn delete(&mut self, gm: &GraphicsManager) {
        if let ResourceDetails::Framebuffer { renderbuffers } = &self.details {
            for &rb in renderbuffers.iter() {
                gm.delete_renderbuffers(1, &rb);
            }
        }
        if self.gl_id != 0 && !self.externally_managed {
            match self.resource_type {
                ResourceType::Buffer => gm.delete_buffers(1, &self.gl_id),
                ResourceType::Texture => gm.delete_textures(1, &self.gl_id),
                ResourceType::Sampler => gm.delete_samplers(1, &self.gl_id),
                ResourceType::Framebuffer => gm.delete_framebuffers(1, &self.gl_id),
                ResourceType::Shader => gm.delete_shader(self.gl_id),
                ResourceType::ShaderProgram => gm.delete_program(self.gl_id),
                ResourceType::AttributeArray => gm.delete_vertex_arrays(1, &self.gl_id),
                ResourceType::TransformFeedback => gm.delete_transform_feedbacks(1, &self.gl_id),
            }
        }
        self.gl_id = 0;
        self.gpu_size = 0;
        self.details = ResourceDetails::None;
    }
}

// ----------------------------------------------------------------------
// Buffers.
// ----------------------------------------------------------------------

/// Creates or refreshes the GL buffer behind `buffer`. The binder has
/// already bound `target` to the resource's id (or will bind id 0 first
/// for creation).
pub(crate) unsafe fn update_buffer(
    gm: &GraphicsManager,
    resource: &mut Resource,
    buffer: &mut BufferObject,
    bits: u32,
    target: GLenum,
) {
    if resource.gl_id == 0 {
        gm.gen_buffers(1, &mut resource.gl_id);
    }
    gm.bind_buffer(target, resource.gl_id);

    if bits & bufferobject::change::DATA != 0 {
        gm.buffer_data(
            target,
            buffer.len() as isize,
            buffer.data().as_ptr() as *const c_void,
            buffer.usage().into(),
        );
        resource.gpu_size = buffer.len();
        buffer.clear_sub_ranges();
    } else if bits & bufferobject::change::SUB_DATA != 0 {
        for range in buffer.pending_sub_ranges() {
            gm.buffer_sub_data(
                target,
                range.offset as isize,
                range.len as isize,
                buffer.data()[range.offset..range.end()].as_ptr() as *const c_void,
            );
        }
        buffer.clear_sub_ranges();
    }
}

// ----------------------------------------------------------------------
// Textures and samplers.
// ----------------------------------------------------------------------

pub(crate) fn texture_target(kind: TextureKind) -> GLenum {
    match kind {
        TextureKind::TwoDimensional => gl::TEXTURE_2D,
        TextureKind::CubeMap => gl::TEXTURE_CUBE_MAP,
    }
}

fn face_target(kind: TextureKind, face: usize) -> GLenum {
    match kind {
        TextureKind::TwoDimensional => gl::TEXTURE_2D,
        TextureKind::CubeMap => gl::TEXTURE_CUBE_MAP_POSITIVE_X + face as GLenum,
    }
}

/// Where sampling parameters land: a sampler object when the feature is
/// available, the texture itself otherwise.
pub(crate) enum SamplerSink {
    Object(GLuint),
    Texture(GLenum),
}

pub(crate) unsafe fn apply_sampler_params(
    gm: &GraphicsManager,
    sink: &SamplerSink,
    sampler: &Sampler,
    anisotropy_available: bool,
) {
    let (wrap_s, wrap_t) = sampler.wrap();
    let (min_filter, mag_filter) = sampler.filters();

    macro_rules! parami {
        ($pname:expr, $value:expr) => {
            match *sink {
                SamplerSink::Object(id) => gm.sampler_parameteri(id, $pname, $value),
                SamplerSink::Texture(target) => gm.tex_parameteri(target, $pname, $value),
            }
        };
    }

    parami!(gl::TEXTURE_WRAP_S, GLenum::from(wrap_s) as GLint);
    parami!(gl::TEXTURE_WRAP_T, GLenum::from(wrap_t) as GLint);
    parami!(gl::TEXTURE_MIN_FILTER, GLenum::from(min_filter) as GLint);
    parami!(gl::TEXTURE_MAG_FILTER, GLenum::from(mag_filter) as GLint);

    match sampler.compare_function() {
        Some(function) => {
            parami!(
                gl::TEXTURE_COMPARE_MODE,
                gl::COMPARE_REF_TO_TEXTURE as GLint
            );
            parami!(gl::TEXTURE_COMPARE_FUNC, GLenum::from(function) as GLint);
        }
        None => parami!(gl::TEXTURE_COMPARE_MODE, gl::NONE as GLint),
    }

    if anisotropy_available {
        let value = sampler.max_anisotropy();
        match *sink {
            SamplerSink::Object(id) => {
                gm.sampler_parameterf(id, GL_TEXTURE_MAX_ANISOTROPY, value)
            }
            SamplerSink::Texture(target) => {
                gm.tex_parameterf(target, GL_TEXTURE_MAX_ANISOTROPY, value)
            }
        }
    }
}

pub(crate) unsafe fn update_sampler(
    gm: &GraphicsManager,
    resource: &mut Resource,
    sampler: &Sampler,
    bits: u32,
    anisotropy_available: bool,
) {
    if resource.gl_id == 0 {
        gm.gen_samplers(1, &mut resource.gl_id);
    }
    if bits & sampler_change::PARAMETERS != 0 {
        apply_sampler_params(
            gm,
            &SamplerSink::Object(resource.gl_id),
            sampler,
            anisotropy_available,
        );
    }
}

/// Uploads texture data and parameters. `inline_sampler` carries the
/// sampler to apply as texture parameters when sampler objects are
/// unavailable.
pub(crate) unsafe fn update_texture(
    gm: &GraphicsManager,
    resource: &mut Resource,
    tex: &mut Texture,
    bits: u32,
    inline_sampler: Option<&Sampler>,
    anisotropy_available: bool,
) {
    let target = texture_target(tex.kind());
    if resource.gl_id == 0 {
        gm.gen_textures(1, &mut resource.gl_id);
        resource.details = ResourceDetails::Texture { target };
    }
    gm.bind_texture(target, resource.gl_id);

    if bits & texture::change::IMAGE != 0 {
        gm.pixel_storei(gl::UNPACK_ALIGNMENT, 1);
        for face in 0..tex.kind().face_count() {
            let image = match tex.image(face) {
                Some(image) => image,
                None => continue,
            };
            let (internal, format, component) = image.format.to_gl();
            gm.tex_image_2d(
                face_target(tex.kind(), face),
                0,
                internal as GLint,
                image.width as i32,
                image.height as i32,
                0,
                format,
                component,
                image.data.as_ptr() as *const c_void,
            );
        }
        resource.gpu_size = tex.gpu_size();
    }

    if bits & texture::change::SUB_IMAGE != 0 {
        gm.pixel_storei(gl::UNPACK_ALIGNMENT, 1);
        for sub in tex.pending_sub_images() {
            let (_, format, component) = sub.image.format.to_gl();
            gm.tex_sub_image_2d(
                face_target(tex.kind(), sub.face),
                0,
                sub.x as i32,
                sub.y as i32,
                sub.image.width as i32,
                sub.image.height as i32,
                format,
                component,
                sub.image.data.as_ptr() as *const c_void,
            );
        }
        tex.clear_sub_images();
    }

    if bits & texture::change::MIPMAPS != 0 {
        let (base, max) = tex.mipmap_range();
        gm.tex_parameteri(target, gl::TEXTURE_BASE_LEVEL, base);
        gm.tex_parameteri(target, gl::TEXTURE_MAX_LEVEL, max);
    }
    if tex.generate_mipmaps() && bits & (texture::change::IMAGE | texture::change::MIPMAPS) != 0 {
        gm.generate_mipmap(target);
    }

    if bits & texture::change::SAMPLER != 0 {
        if let Some(sampler) = inline_sampler {
            apply_sampler_params(
                gm,
                &SamplerSink::Texture(target),
                sampler,
                anisotropy_available,
            );
        }
    }
}

// ----------------------------------------------------------------------
// Shaders and programs.
// ----------------------------------------------------------------------

unsafe fn shader_info_log(gm: &GraphicsManager, shader: GLuint) -> String {
    let mut length = 0;
    gm.get_shaderiv(shader, gl::INFO_LOG_LENGTH, &mut length);
    let mut log = vec![0u8; length.max(1) as usize];
    gm.get_shader_info_log(
        shader,
        length,
        ptr::null_mut(),
        log.as_mut_ptr() as *mut GLchar,
    );
    log.pop();
    String::from_utf8_lossy(&log).into_owned()
}

unsafe fn program_info_log(gm: &GraphicsManager, program: GLuint) -> String {
    let mut length = 0;
    gm.get_programiv(program, gl::INFO_LOG_LENGTH, &mut length);
    let mut log = vec![0u8; length.max(1) as usize];
    gm.get_program_info_log(
        program,
        length,
        ptr::null_mut(),
        log.as_mut_ptr() as *mut GLchar,
    );
    log.pop();
    String::from_utf8_lossy(&log).into_owned()
}

pub(crate) unsafe fn update_shader(
    gm: &GraphicsManager,
    resource: &mut Resource,
    shader: &Shader,
    bits: u32,
) -> Result<()> {
    if resource.gl_id == 0 {
        resource.gl_id = gm.create_shader(shader.stage().into());
        if resource.gl_id == 0 {
            bail!("could not create a {} shader object", shader.stage().as_str());
        }
    }
    if bits & shader::change::SOURCE == 0 {
        return Ok(());
    }

    let source = shader.source();
    let src_ptr = source.as_ptr() as *const GLchar;
    let src_len = source.len() as GLint;
    gm.shader_source(resource.gl_id, 1, &src_ptr, &src_len);
    gm.compile_shader(resource.gl_id);

    let mut status = 0;
    gm.get_shaderiv(resource.gl_id, gl::COMPILE_STATUS, &mut status);
    if status == 0 {
        bail!(
            "{} shader failed to compile: {}",
            shader.stage().as_str(),
            shader_info_log(gm, resource.gl_id)
        );
    }
    Ok(())
}

/// Relinks `program` from pre-updated stage shader ids and refreshes the
/// input location table for the program's registry.
pub(crate) unsafe fn update_program(
    gm: &GraphicsManager,
    resource: &mut Resource,
    program: &ShaderProgram,
    stage_ids: &[(ShaderStage, GLuint)],
    bits: u32,
    stages_recompiled: bool,
) -> Result<()> {
    if resource.gl_id == 0 {
        resource.gl_id = gm.create_program();
        if resource.gl_id == 0 {
            bail!("could not create a program object");
        }
    }
    let relink = stages_recompiled
        || bits
            & (program_change::VERTEX
                | program_change::FRAGMENT
                | program_change::GEOMETRY
                | program_change::VARYINGS)
            != 0;
    if !relink && matches!(resource.details, ResourceDetails::Program(_)) {
        return Ok(());
    }

    for &(_, id) in stage_ids {
        gm.attach_shader(resource.gl_id, id);
    }

    let varyings = program.capture_varyings();
    if !varyings.is_empty() {
        let storage: Vec<Vec<u8>> = varyings
            .iter()
            .map(|name| {
                let mut bytes = name.clone().into_bytes();
                bytes.push(0);
                bytes
            })
            .collect();
        let pointers: Vec<*const GLchar> = storage
            .iter()
            .map(|bytes| bytes.as_ptr() as *const GLchar)
            .collect();
        gm.transform_feedback_varyings(
            resource.gl_id,
            pointers.len() as i32,
            pointers.as_ptr(),
            gl::INTERLEAVED_ATTRIBS,
        );
    }

    gm.link_program(resource.gl_id);
    let mut status = 0;
    gm.get_programiv(resource.gl_id, gl::LINK_STATUS, &mut status);
    if status == 0 {
        bail!(
            "program '{}' failed to link: {}",
            program.holder().label(),
            program_info_log(gm, resource.gl_id)
        );
    }

    // Resolve every registry input once per link.
    let registry = program.registry();
    let mut inputs = ProgramInputs {
        uniform_locations: HashMap::new(),
        attribute_locations: HashMap::new(),
    };
    for index in 0..registry.len() {
        let spec = match registry.spec(index) {
            Some(spec) => spec,
            None => continue,
        };
        let mut name = spec.name.clone().into_bytes();
        name.push(0);
        let name_ptr = name.as_ptr() as *const GLchar;
        match spec.kind {
            InputKind::Uniform => {
                let location = gm.get_uniform_location(resource.gl_id, name_ptr);
                inputs.uniform_locations.insert(index, location);
            }
            InputKind::Attribute => {
                let location = gm.get_attrib_location(resource.gl_id, name_ptr);
                inputs.attribute_locations.insert(index, location);
            }
        }
    }
    resource.details = ResourceDetails::Program(inputs);
    Ok(())
}

// ----------------------------------------------------------------------
// Attribute arrays.
// ----------------------------------------------------------------------

/// Specifies the attribute bindings. With vertex arrays available the
/// bindings live in the resource's VAO (bound by the caller); without
/// them, the caller re-runs this on every shape change against the
/// default vertex array.
pub(crate) unsafe fn specify_attributes(
    gm: &GraphicsManager,
    attributes: &[(VertexAttribute, GLuint)],
    divisors_available: bool,
) {
    for (index, (attribute, buffer_id)) in attributes.iter().enumerate() {
        gm.bind_buffer(gl::ARRAY_BUFFER, *buffer_id);
        gm.enable_vertex_attrib_array(index as GLuint);
        gm.vertex_attrib_pointer(
            index as GLuint,
            attribute.component_count,
            attribute.component_type.into(),
            attribute.normalized as u8,
            attribute.stride as i32,
            attribute.offset as *const c_void,
        );
        if attribute.divisor != 0 && !divisors_available {
            warn!("Instanced attribute arrays are unavailable, divisor ignored.");
        } else if divisors_available {
            gm.vertex_attrib_divisor(index as GLuint, attribute.divisor);
        }
    }
}

pub(crate) unsafe fn update_attribute_array(
    gm: &GraphicsManager,
    resource: &mut Resource,
    attributes: &[(VertexAttribute, GLuint)],
    bits: u32,
    divisors_available: bool,
) {
    if resource.gl_id == 0 {
        gm.gen_vertex_arrays(1, &mut resource.gl_id);
    }
    gm.bind_vertex_array(resource.gl_id);
    if bits & shape::change::ATTRIBUTES != 0 {
        specify_attributes(gm, attributes, divisors_available);
    }
}

// ----------------------------------------------------------------------
// Framebuffers.
// ----------------------------------------------------------------------

/// A framebuffer attachment with its dependencies already resolved to GL
/// ids by the binder.
pub(crate) enum ResolvedAttachment {
    Unbound,
    Texture(GLuint),
    Renderbuffer { format: RenderbufferFormat, samples: u32 },
}

unsafe fn attach(
    gm: &GraphicsManager,
    attachment_point: GLenum,
    resolved: &ResolvedAttachment,
    width: i32,
    height: i32,
    renderbuffers: &mut SmallVec<[GLuint; MAX_COLOR_ATTACHMENTS + 2]>,
    multisample_available: bool,
) {
    match resolved {
        ResolvedAttachment::Unbound => {
            gm.framebuffer_texture_2d(gl::FRAMEBUFFER, attachment_point, gl::TEXTURE_2D, 0, 0);
        }
        ResolvedAttachment::Texture(id) => {
            gm.framebuffer_texture_2d(gl::FRAMEBUFFER, attachment_point, gl::TEXTURE_2D, *id, 0);
        }
        ResolvedAttachment::Renderbuffer { format, samples } => {
            let mut rb = 0;
            gm.gen_renderbuffers(1, &mut rb);
            gm.bind_renderbuffer(gl::RENDERBUFFER, rb);
            if *samples > 0 && multisample_available {
                gm.renderbuffer_storage_multisample(
                    gl::RENDERBUFFER,
                    *samples as i32,
                    (*format).into(),
                    width,
                    height,
                );
            } else {
                if *samples > 0 {
                    warn!("Multisampled renderbuffers are unavailable, allocating single-sampled.");
                }
                gm.renderbuffer_storage(gl::RENDERBUFFER, (*format).into(), width, height);
            }
            gm.framebuffer_renderbuffer(gl::FRAMEBUFFER, attachment_point, gl::RENDERBUFFER, rb);
            renderbuffers.push(rb);
        }
    }
}

/// Rebuilds the framebuffer's attachments. Any change, dimensions
/// included, reallocates the renderbuffers, so this always runs the full
/// attachment pass. The caller binds the framebuffer afterwards if it
/// needs a different one.
pub(crate) unsafe fn update_framebuffer(
    gm: &GraphicsManager,
    resource: &mut Resource,
    fbo: &FramebufferObject,
    resolved_color: &[ResolvedAttachment],
    resolved_depth: &ResolvedAttachment,
    resolved_stencil: &ResolvedAttachment,
    bits: u32,
    multiple_attachments_available: bool,
    multisample_available: bool,
) -> Result<()> {
    if resource.gl_id == 0 {
        gm.gen_framebuffers(1, &mut resource.gl_id);
    }
    if bits
        & (framebuffer::change::DIMENSIONS
            | framebuffer::change::COLOR_ATTACHMENTS
            | framebuffer::change::DEPTH_ATTACHMENT
            | framebuffer::change::STENCIL_ATTACHMENT)
        == 0
    {
        return Ok(());
    }

    // Renderbuffers are sized to the framebuffer; drop the old ones.
    let mut renderbuffers: SmallVec<[GLuint; MAX_COLOR_ATTACHMENTS + 2]> = SmallVec::new();
    if let ResourceDetails::Framebuffer {
        renderbuffers: old,
    } = &resource.details
    {
        for &rb in old.iter() {
            gm.delete_renderbuffers(1, &rb);
        }
    }

    gm.bind_framebuffer(gl::FRAMEBUFFER, resource.gl_id);
    let (width, height) = (fbo.width() as i32, fbo.height() as i32);

    for (index, resolved) in resolved_color.iter().enumerate() {
        if index > 0 && !multiple_attachments_available {
            if matches!(
                resolved,
                ResolvedAttachment::Texture(_) | ResolvedAttachment::Renderbuffer { .. }
            ) {
                warn!("Multiple color attachments are unavailable, skipping attachment {}.", index);
            }
            continue;
        }
        attach(
            gm,
            gl::COLOR_ATTACHMENT0 + index as GLenum,
            resolved,
            width,
            height,
            &mut renderbuffers,
            multisample_available,
        );
    }
    attach(
        gm,
        gl::DEPTH_ATTACHMENT,
        resolved_depth,
        width,
        height,
        &mut renderbuffers,
        multisample_available,
    );
    attach(
        gm,
        gl::STENCIL_ATTACHMENT,
        resolved_stencil,
        width,
        height,
        &mut renderbuffers,
        multisample_available,
    );
    resource.details = ResourceDetails::Framebuffer { renderbuffers };

    let status = gm.check_framebuffer_status(gl::FRAMEBUFFER);
    if status != gl::FRAMEBUFFER_COMPLETE {
        bail!(
            "framebuffer '{}' is incomplete (status {:#x})",
            fbo.holder().label(),
            status
        );
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Transform feedback.
// ----------------------------------------------------------------------

pub(crate) unsafe fn update_transform_feedback(
    gm: &GraphicsManager,
    resource: &mut Resource,
    tf: &TransformFeedback,
    capture_buffer_id: GLuint,
    bits: u32,
) {
    if resource.gl_id == 0 {
        gm.gen_transform_feedbacks(1, &mut resource.gl_id);
    }
    gm.bind_transform_feedback(gl::TRANSFORM_FEEDBACK, resource.gl_id);
    if bits & transformfeedback::change::CAPTURE_BUFFER != 0 {
        if capture_buffer_id == 0 {
            warn!(
                "Transform feedback '{}' has no capture buffer.",
                tf.holder().label()
            );
        }
        gm.bind_buffer_base(gl::TRANSFORM_FEEDBACK_BUFFER, 0, capture_buffer_id);
    }
}
