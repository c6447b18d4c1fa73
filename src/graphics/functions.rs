//! The wrapped GL entry points renderers call instead of raw `gl::*`
//! functions. Every wrapper verifies the symbol resolved, forwards the
//! call, and feeds the call name to the error checker.
//!
//! All of these are `unsafe`: the caller must hold the context current on
//! this thread and keep any raw pointers valid for the duration of the
//! call.

use std::os::raw::c_void;

use gl::types::*;

use super::GraphicsManager;

macro_rules! wrap_gl {
    ($($(#[$meta:meta])* $method:ident => $gl:ident($($arg:ident: $ty:ty),*) $(-> $ret:ty)?;)*) => {
        impl GraphicsManager {
            $(
                $(#[$meta])*
                pub unsafe fn $method(&self, $($arg: $ty),*) $(-> $ret)? {
                    if !gl::$gl::is_loaded() {
                        self.report_unloaded(stringify!($gl));
                        return Default::default();
                    }
                    let value = gl::$gl($($arg),*);
                    self.check_call(stringify!($gl));
                    value
                }
            )*
        }
    };
}

wrap_gl! {
    active_texture => ActiveTexture(texture: GLenum);
    attach_shader => AttachShader(program: GLuint, shader: GLuint);
    begin_transform_feedback => BeginTransformFeedback(primitive_mode: GLenum);
    bind_buffer => BindBuffer(target: GLenum, buffer: GLuint);
    bind_buffer_base => BindBufferBase(target: GLenum, index: GLuint, buffer: GLuint);
    bind_framebuffer => BindFramebuffer(target: GLenum, framebuffer: GLuint);
    bind_renderbuffer => BindRenderbuffer(target: GLenum, renderbuffer: GLuint);
    bind_sampler => BindSampler(unit: GLuint, sampler: GLuint);
    bind_texture => BindTexture(target: GLenum, texture: GLuint);
    bind_transform_feedback => BindTransformFeedback(target: GLenum, id: GLuint);
    bind_vertex_array => BindVertexArray(array: GLuint);
    blend_color => BlendColor(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    blend_equation_separate => BlendEquationSeparate(mode_rgb: GLenum, mode_alpha: GLenum);
    blend_func_separate =>
        BlendFuncSeparate(src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    blit_framebuffer => BlitFramebuffer(
        src_x0: GLint, src_y0: GLint, src_x1: GLint, src_y1: GLint,
        dst_x0: GLint, dst_y0: GLint, dst_x1: GLint, dst_y1: GLint,
        mask: GLbitfield, filter: GLenum);
    buffer_data => BufferData(target: GLenum, size: GLsizeiptr, data: *const c_void, usage: GLenum);
    buffer_sub_data =>
        BufferSubData(target: GLenum, offset: GLintptr, size: GLsizeiptr, data: *const c_void);
    check_framebuffer_status => CheckFramebufferStatus(target: GLenum) -> GLenum;
    clear => Clear(mask: GLbitfield);
    clear_color => ClearColor(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    clear_depthf => ClearDepthf(depth: GLfloat);
    clear_stencil => ClearStencil(value: GLint);
    color_mask => ColorMask(red: GLboolean, green: GLboolean, blue: GLboolean, alpha: GLboolean);
    compile_shader => CompileShader(shader: GLuint);
    copy_buffer_sub_data => CopyBufferSubData(
        read_target: GLenum, write_target: GLenum,
        read_offset: GLintptr, write_offset: GLintptr, size: GLsizeiptr);
    create_program => CreateProgram() -> GLuint;
    create_shader => CreateShader(kind: GLenum) -> GLuint;
    cull_face => CullFace(mode: GLenum);
    delete_buffers => DeleteBuffers(n: GLsizei, buffers: *const GLuint);
    delete_framebuffers => DeleteFramebuffers(n: GLsizei, framebuffers: *const GLuint);
    delete_program => DeleteProgram(program: GLuint);
    delete_renderbuffers => DeleteRenderbuffers(n: GLsizei, renderbuffers: *const GLuint);
    delete_samplers => DeleteSamplers(n: GLsizei, samplers: *const GLuint);
    delete_shader => DeleteShader(shader: GLuint);
    delete_textures => DeleteTextures(n: GLsizei, textures: *const GLuint);
    delete_transform_feedbacks => DeleteTransformFeedbacks(n: GLsizei, ids: *const GLuint);
    delete_vertex_arrays => DeleteVertexArrays(n: GLsizei, arrays: *const GLuint);
    depth_func => DepthFunc(func: GLenum);
    depth_mask => DepthMask(flag: GLboolean);
    depth_rangef => DepthRangef(near: GLfloat, far: GLfloat);
    disable => Disable(cap: GLenum);
    disable_vertex_attrib_array => DisableVertexAttribArray(index: GLuint);
    draw_arrays => DrawArrays(mode: GLenum, first: GLint, count: GLsizei);
    draw_arrays_instanced =>
        DrawArraysInstanced(mode: GLenum, first: GLint, count: GLsizei, instance_count: GLsizei);
    draw_buffers => DrawBuffers(n: GLsizei, bufs: *const GLenum);
    draw_elements =>
        DrawElements(mode: GLenum, count: GLsizei, kind: GLenum, indices: *const c_void);
    draw_elements_instanced => DrawElementsInstanced(
        mode: GLenum, count: GLsizei, kind: GLenum, indices: *const c_void,
        instance_count: GLsizei);
    enable => Enable(cap: GLenum);
    enable_vertex_attrib_array => EnableVertexAttribArray(index: GLuint);
    end_transform_feedback => EndTransformFeedback();
    finish => Finish();
    flush => Flush();
    flush_mapped_buffer_range =>
        FlushMappedBufferRange(target: GLenum, offset: GLintptr, length: GLsizeiptr);
    framebuffer_renderbuffer => FramebufferRenderbuffer(
        target: GLenum, attachment: GLenum, renderbuffer_target: GLenum, renderbuffer: GLuint);
    framebuffer_texture_2d => FramebufferTexture2D(
        target: GLenum, attachment: GLenum, tex_target: GLenum, texture: GLuint, level: GLint);
    front_face => FrontFace(mode: GLenum);
    gen_buffers => GenBuffers(n: GLsizei, buffers: *mut GLuint);
    gen_framebuffers => GenFramebuffers(n: GLsizei, framebuffers: *mut GLuint);
    gen_renderbuffers => GenRenderbuffers(n: GLsizei, renderbuffers: *mut GLuint);
    gen_samplers => GenSamplers(n: GLsizei, samplers: *mut GLuint);
    gen_textures => GenTextures(n: GLsizei, textures: *mut GLuint);
    gen_transform_feedbacks => GenTransformFeedbacks(n: GLsizei, ids: *mut GLuint);
    gen_vertex_arrays => GenVertexArrays(n: GLsizei, arrays: *mut GLuint);
    generate_mipmap => GenerateMipmap(target: GLenum);
    get_attrib_location => GetAttribLocation(program: GLuint, name: *const GLchar) -> GLint;
    get_floatv => GetFloatv(pname: GLenum, data: *mut GLfloat);
    get_integerv => GetIntegerv(pname: GLenum, data: *mut GLint);
    get_program_info_log => GetProgramInfoLog(
        program: GLuint, buf_size: GLsizei, length: *mut GLsizei, info_log: *mut GLchar);
    get_programiv => GetProgramiv(program: GLuint, pname: GLenum, params: *mut GLint);
    get_shader_info_log => GetShaderInfoLog(
        shader: GLuint, buf_size: GLsizei, length: *mut GLsizei, info_log: *mut GLchar);
    get_shaderiv => GetShaderiv(shader: GLuint, pname: GLenum, params: *mut GLint);
    get_uniform_location => GetUniformLocation(program: GLuint, name: *const GLchar) -> GLint;
    hint => Hint(target: GLenum, mode: GLenum);
    is_enabled => IsEnabled(cap: GLenum) -> GLboolean;
    line_width => LineWidth(width: GLfloat);
    link_program => LinkProgram(program: GLuint);
    min_sample_shading => MinSampleShading(value: GLfloat);
    patch_parameterfv => PatchParameterfv(pname: GLenum, values: *const GLfloat);
    patch_parameteri => PatchParameteri(pname: GLenum, value: GLint);
    pixel_storei => PixelStorei(pname: GLenum, param: GLint);
    polygon_offset => PolygonOffset(factor: GLfloat, units: GLfloat);
    read_buffer => ReadBuffer(src: GLenum);
    read_pixels => ReadPixels(
        x: GLint, y: GLint, width: GLsizei, height: GLsizei,
        format: GLenum, kind: GLenum, pixels: *mut c_void);
    renderbuffer_storage => RenderbufferStorage(
        target: GLenum, internal_format: GLenum, width: GLsizei, height: GLsizei);
    renderbuffer_storage_multisample => RenderbufferStorageMultisample(
        target: GLenum, samples: GLsizei, internal_format: GLenum,
        width: GLsizei, height: GLsizei);
    sample_coverage => SampleCoverage(value: GLfloat, invert: GLboolean);
    sampler_parameterf => SamplerParameterf(sampler: GLuint, pname: GLenum, param: GLfloat);
    sampler_parameteri => SamplerParameteri(sampler: GLuint, pname: GLenum, param: GLint);
    scissor => Scissor(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    shader_source => ShaderSource(
        shader: GLuint, count: GLsizei, string: *const *const GLchar, length: *const GLint);
    stencil_func_separate =>
        StencilFuncSeparate(face: GLenum, func: GLenum, reference: GLint, mask: GLuint);
    stencil_mask_separate => StencilMaskSeparate(face: GLenum, mask: GLuint);
    stencil_op_separate =>
        StencilOpSeparate(face: GLenum, sfail: GLenum, dpfail: GLenum, dppass: GLenum);
    tex_image_2d => TexImage2D(
        target: GLenum, level: GLint, internal_format: GLint, width: GLsizei, height: GLsizei,
        border: GLint, format: GLenum, kind: GLenum, pixels: *const c_void);
    tex_parameterf => TexParameterf(target: GLenum, pname: GLenum, param: GLfloat);
    tex_parameteri => TexParameteri(target: GLenum, pname: GLenum, param: GLint);
    tex_sub_image_2d => TexSubImage2D(
        target: GLenum, level: GLint, x_offset: GLint, y_offset: GLint,
        width: GLsizei, height: GLsizei, format: GLenum, kind: GLenum, pixels: *const c_void);
    transform_feedback_varyings => TransformFeedbackVaryings(
        program: GLuint, count: GLsizei, varyings: *const *const GLchar, buffer_mode: GLenum);
    uniform_1fv => Uniform1fv(location: GLint, count: GLsizei, value: *const GLfloat);
    uniform_1iv => Uniform1iv(location: GLint, count: GLsizei, value: *const GLint);
    uniform_1uiv => Uniform1uiv(location: GLint, count: GLsizei, value: *const GLuint);
    uniform_2fv => Uniform2fv(location: GLint, count: GLsizei, value: *const GLfloat);
    uniform_2iv => Uniform2iv(location: GLint, count: GLsizei, value: *const GLint);
    uniform_2uiv => Uniform2uiv(location: GLint, count: GLsizei, value: *const GLuint);
    uniform_3fv => Uniform3fv(location: GLint, count: GLsizei, value: *const GLfloat);
    uniform_3iv => Uniform3iv(location: GLint, count: GLsizei, value: *const GLint);
    uniform_3uiv => Uniform3uiv(location: GLint, count: GLsizei, value: *const GLuint);
    uniform_4fv => Uniform4fv(location: GLint, count: GLsizei, value: *const GLfloat);
    uniform_4iv => Uniform4iv(location: GLint, count: GLsizei, value: *const GLint);
    uniform_4uiv => Uniform4uiv(location: GLint, count: GLsizei, value: *const GLuint);
    uniform_matrix_2fv => UniformMatrix2fv(
        location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
    uniform_matrix_3fv => UniformMatrix3fv(
        location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
    uniform_matrix_4fv => UniformMatrix4fv(
        location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
    unmap_buffer => UnmapBuffer(target: GLenum) -> GLboolean;
    use_program => UseProgram(program: GLuint);
    vertex_attrib_divisor => VertexAttribDivisor(index: GLuint, divisor: GLuint);
    vertex_attrib_pointer => VertexAttribPointer(
        index: GLuint, size: GLint, kind: GLenum, normalized: GLboolean,
        stride: GLsizei, pointer: *const c_void);
    viewport => Viewport(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
}

// Pointer-returning entry points cannot use the macro's defaulted return.
impl GraphicsManager {
    pub unsafe fn map_buffer(&self, target: GLenum, access: GLenum) -> *mut c_void {
        if !gl::MapBuffer::is_loaded() {
            self.report_unloaded("MapBuffer");
            return ::std::ptr::null_mut();
        }
        let ptr = gl::MapBuffer(target, access);
        self.check_call("MapBuffer");
        ptr
    }

    pub unsafe fn map_buffer_range(
        &self,
        target: GLenum,
        offset: GLintptr,
        length: GLsizeiptr,
        access: GLbitfield,
    ) -> *mut c_void {
        if !gl::MapBufferRange::is_loaded() {
            self.report_unloaded("MapBufferRange");
            return ::std::ptr::null_mut();
        }
        let ptr = gl::MapBufferRange(target, offset, length, access);
        self.check_call("MapBufferRange");
        ptr
    }
}
