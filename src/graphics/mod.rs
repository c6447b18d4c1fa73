//! The capability layer over a live GL context.
//!
//! `GraphicsManager` is created once per context after the caller makes it
//! current. It probes the API flavor, version and extensions, resolves the
//! entry points every feature group needs, and from then on answers
//! whether a feature may be used, what the context's limits are, and
//! optionally checks every wrapped call for driver errors.

pub mod constants;
pub mod features;
mod functions;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use gl::types::GLenum;

use crate::errors::*;
use crate::statetable::Capability;

pub use self::constants::{Constant, ConstantValue, FromConstantValue};
pub use self::features::{Feature, FeatureId, GlFlavor, GlInfo, GlProfile, GlVersions};

use self::constants::ConstantCache;

pub type GraphicsManagerPtr = Arc<GraphicsManager>;

fn gl_get_error() -> u32 {
    unsafe { gl::GetError() }
}

/// Decodes a `glGetError` code.
pub fn error_string(code: GLenum) -> &'static str {
    match code {
        gl::NO_ERROR => "no error",
        gl::INVALID_ENUM => "invalid enumerant",
        gl::INVALID_VALUE => "invalid value",
        gl::INVALID_OPERATION => "invalid operation",
        gl::INVALID_FRAMEBUFFER_OPERATION => "invalid framebuffer operation",
        gl::OUT_OF_MEMORY => "out of memory",
        gl::STACK_UNDERFLOW => "stack underflow",
        gl::STACK_OVERFLOW => "stack overflow",
        _ => "unknown error",
    }
}

pub struct GraphicsManager {
    info: GlInfo,
    features: RwLock<Vec<Feature>>,
    // Bits follow the statetable Capability order. A capability whose bit
    // is clear is ignored by renderers when applying state.
    valid_statetable_caps: AtomicU32,
    constants: ConstantCache,
    error_checking: AtomicBool,
    // At most one unretrieved error code; NO_ERROR when empty.
    last_error: AtomicU32,
    // Kept as a pointer so tests can script driver errors.
    get_error: fn() -> u32,
}

impl GraphicsManager {
    /// Probes the context current on this thread. The caller must have
    /// loaded GL symbols beforehand.
    pub unsafe fn new() -> Result<GraphicsManagerPtr> {
        let info = GlInfo::parse()?;
        info!(
            "Initializing renderer on {} ({}), {:?} version {}.",
            info.renderer, info.vendor, info.flavor, info.version_string
        );

        let features = FeatureId::ALL
            .iter()
            .map(|id| Feature::new(id.missing_functions()))
            .collect();

        let manager = GraphicsManager {
            info,
            features: RwLock::new(features),
            valid_statetable_caps: AtomicU32::new(crate::statetable::CAPABILITY_MASK),
            constants: ConstantCache::new(),
            error_checking: AtomicBool::new(false),
            last_error: AtomicU32::new(gl::NO_ERROR),
            get_error: gl_get_error,
        };
        manager.probe_features();
        Ok(Arc::new(manager))
    }

    unsafe fn probe_features(&self) {
        // Support probing pokes at entry points that may not exist; never
        // let that surface as a pending error.
        let _silencer = ErrorSilencer::new(self);

        self.apply_support_rules();

        // A context may advertise multiple attachments yet cap the count
        // below what multi-target rendering needs.
        if self.is_feature_supported(FeatureId::MultipleColorAttachments) {
            let mut count = 0;
            gl::GetIntegerv(gl::MAX_COLOR_ATTACHMENTS, &mut count);
            if count < 4 {
                self.set_feature_supported(FeatureId::MultipleColorAttachments, false);
            }
        }
        if self.is_feature_supported(FeatureId::ClipDistance) {
            let mut count = 0;
            gl::GetIntegerv(gl::MAX_CLIP_DISTANCES, &mut count);
            if count < 8 {
                self.set_feature_supported(FeatureId::ClipDistance, false);
            }
        }

        // Some platforms advertise vertex arrays that do not work; trust
        // only a successful allocation.
        if self.is_feature_supported(FeatureId::VertexArrays) {
            let mut id = 0;
            gl::GenVertexArrays(1, &mut id);
            if id != 0 {
                gl::DeleteVertexArrays(1, &id);
            } else {
                self.set_feature_supported(FeatureId::VertexArrays, false);
            }
        }

        for &id in FeatureId::ALL.iter() {
            let supported = self.is_feature_supported(id);
            self.enable_feature(id, supported);
        }
    }

    fn apply_support_rules(&self) {
        use self::FeatureId::*;
        let v = GlVersions::new;

        let rules: &[(FeatureId, GlVersions, &str, &str)] = &[
            (Core, v(10, 20, 10), "", ""),
            (BlendMinMax, v(14, 30, 20), "EXT_blend_minmax", ""),
            (ClipDistance, v(31, 0, 0), "clip_distance,EXT_clip_cull_distance", ""),
            (CopyBufferSubData, v(31, 30, 0), "copy_buffer", ""),
            (DebugOutput, v(43, 32, 0), "ARB_debug_output,KHR_debug,WEBGL_debug", ""),
            (DefaultTessellationLevels, v(40, 0, 0), "ARB_tessellation_shader", ""),
            (DepthTexture, v(14, 0, 0), "depth_texture", ""),
            (DrawBuffers, v(30, 30, 20), "draw_buffers", ""),
            (DrawInstanced, v(33, 30, 20), "draw_instanced,instanced_arrays", ""),
            (ElementIndex32Bit, v(12, 30, 0), "element_index_uint", ""),
            (
                FramebufferBlit,
                v(20, 30, 20),
                "framebuffer_blit,CHROMIUM_framebuffer_multisample",
                "",
            ),
            (GeometryShader, v(32, 32, 0), "ARB_geometry_shader4", ""),
            (GetStringi, v(30, 30, 0), "", ""),
            (InstancedArrays, v(33, 30, 20), "instanced_arrays", ""),
            (
                MapBuffer,
                v(15, 0, 0),
                "mapbuffer,vertex_buffer_object",
                "Vivante GC1000,VideoCore IV HW",
            ),
            (
                MapBufferBase,
                v(15, 30, 0),
                "mapbuffer,vertex_buffer_object",
                "Vivante GC1000,VideoCore IV HW",
            ),
            (
                MapBufferRange,
                v(30, 30, 0),
                "map_buffer_range",
                "Vivante GC1000,VideoCore IV HW",
            ),
            (MultipleColorAttachments, v(31, 30, 20), "NV_fbo_color_attachments", ""),
            (
                MultisampleCapability,
                v(13, 0, 0),
                "ARB_multisample,EXT_multisample_compatibility",
                "",
            ),
            (
                MultisampleFramebufferResolve,
                GlVersions::NONE,
                "APPLE_framebuffer_multisample",
                "",
            ),
            (PointSize, v(10, 0, 0), "", ""),
            (RasterizerDiscardCapability, v(30, 30, 0), "transform_feedback", ""),
            (ReadBuffer, v(10, 30, 20), "", ""),
            (RenderbufferMultisample, v(30, 30, 20), "framebuffer_multisample", ""),
            (SamplerObjects, v(33, 30, 20), "sampler_objects", "Mali ,Mali-,SwiftShader"),
            (SampleShading, v(40, 32, 0), "sample_shading", ""),
            (ShadowSamplers, v(14, 30, 20), "EXT_shadow_samplers", ""),
            (StandardDerivatives, v(20, 30, 0), "OES_standard_derivatives", ""),
            (Sync, v(32, 30, 20), "sync", ""),
            (TessellationShader, v(40, 32, 0), "tessellation_shader", ""),
            (Texture3d, v(13, 30, 20), "texture_3d", ""),
            (TextureFilterAnisotropic, v(46, 0, 0), "EXT_texture_filter_anisotropic", ""),
            (TextureStorage, v(42, 30, 20), "texture_storage", ""),
            (TransformFeedback, v(30, 30, 0), "transform_feedback", ""),
            (VertexArrays, v(30, 30, 20), "vertex_array_object", "Internet Explorer"),
        ];

        for &(id, versions, extensions, blacklist) in rules {
            let supported = self.info.check_support(versions, extensions, blacklist);
            self.set_feature_supported(id, supported);
        }
    }

    pub fn info(&self) -> &GlInfo {
        &self.info
    }

    pub fn is_extension_supported(&self, name: &str) -> bool {
        self.info.is_extension_supported(name)
    }

    // ------------------------------------------------------------------
    // Feature table.
    // ------------------------------------------------------------------

    fn set_feature_supported(&self, id: FeatureId, supported: bool) {
        self.features.write().unwrap()[id as usize].set_supported(supported);
    }

    pub fn is_feature_supported(&self, id: FeatureId) -> bool {
        self.features.read().unwrap()[id as usize].is_supported()
    }

    pub fn is_feature_enabled(&self, id: FeatureId) -> bool {
        self.features.read().unwrap()[id as usize].is_enabled()
    }

    /// The question the renderer asks before every feature use.
    pub fn is_feature_available(&self, id: FeatureId) -> bool {
        self.features.read().unwrap()[id as usize].is_available()
    }

    /// Turns a supported feature on or off. Toggling a feature backed by a
    /// statetable capability also updates which capabilities renderers
    /// will apply.
    pub fn enable_feature(&self, id: FeatureId, enable: bool) {
        let enabled = {
            let mut features = self.features.write().unwrap();
            let feature = &mut features[id as usize];
            feature.set_enabled(enable);
            feature.is_enabled()
        };

        let mask = statetable_caps_for(id);
        if mask != 0 {
            if enabled {
                self.valid_statetable_caps.fetch_or(mask, Ordering::Relaxed);
            } else {
                self.valid_statetable_caps.fetch_and(!mask, Ordering::Relaxed);
            }
        }
    }

    /// False when the capability's backing feature is turned off and
    /// renderers must skip it.
    pub fn is_valid_statetable_capability(&self, cap: Capability) -> bool {
        self.valid_statetable_caps.load(Ordering::Relaxed) & cap.bit() != 0
    }

    pub fn missing_feature_functions(&self, id: FeatureId) -> Vec<&'static str> {
        self.features.read().unwrap()[id as usize]
            .missing_functions()
            .to_vec()
    }

    /// One line per feature, for logs and bug reports.
    pub fn feature_debug_string(&self) -> String {
        use std::fmt::Write;
        let features = self.features.read().unwrap();
        let mut out = String::new();
        for (i, &id) in FeatureId::ALL.iter().enumerate() {
            let f = &features[i];
            let _ = writeln!(
                out,
                "{:<32} available: {:<5} (supported: {}, enabled: {})",
                id.as_str(),
                f.is_available(),
                f.is_supported(),
                f.is_enabled()
            );
        }
        out
    }

    // ------------------------------------------------------------------
    // Constants.
    // ------------------------------------------------------------------

    /// Fetches a context limit, computing it on first use. Requesting the
    /// wrong type logs a warning and yields `None`.
    pub fn get_constant<T: FromConstantValue>(&self, constant: Constant) -> Option<T> {
        let value = self
            .constants
            .get_or_compute(constant, || unsafe { self.compute_constant(constant) });
        match T::from_constant_value(value) {
            Some(v) => Some(v),
            None => {
                warn!(
                    "Constant {:?} holds {:?} and was requested as an incompatible type.",
                    constant, value
                );
                None
            }
        }
    }

    /// Forgets memoized limits; the next query re-asks the context.
    pub fn clear_constant_cache(&self) {
        self.constants.clear();
    }

    unsafe fn compute_constant(&self, constant: Constant) -> ConstantValue {
        use self::constants::{GL_ALIASED_POINT_SIZE_RANGE, GL_MAX_TEXTURE_MAX_ANISOTROPY};
        use self::Constant::*;

        let _silencer = ErrorSilencer::new(self);
        match constant {
            AliasedLineWidthRange => {
                ConstantValue::FloatRange(self.query_float2(gl::ALIASED_LINE_WIDTH_RANGE))
            }
            AliasedPointSizeRange => {
                ConstantValue::FloatRange(self.query_float2(GL_ALIASED_POINT_SIZE_RANGE))
            }
            MaxClipDistances => {
                if self.is_feature_available(FeatureId::ClipDistance) {
                    ConstantValue::Int(self.query_int(gl::MAX_CLIP_DISTANCES))
                } else {
                    ConstantValue::Int(0)
                }
            }
            MaxColorAttachments => {
                if self.is_feature_available(FeatureId::MultipleColorAttachments) {
                    ConstantValue::Int(self.query_int(gl::MAX_COLOR_ATTACHMENTS))
                } else {
                    ConstantValue::Int(1)
                }
            }
            MaxCombinedTextureImageUnits => {
                ConstantValue::Int(self.query_int(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS))
            }
            MaxCubeMapTextureSize => {
                ConstantValue::Int(self.query_int(gl::MAX_CUBE_MAP_TEXTURE_SIZE))
            }
            MaxDrawBuffers => {
                if self.is_feature_available(FeatureId::DrawBuffers) {
                    ConstantValue::Int(self.query_int(gl::MAX_DRAW_BUFFERS))
                } else {
                    ConstantValue::Int(1)
                }
            }
            MaxFragmentUniformComponents => {
                ConstantValue::Int(self.query_int(gl::MAX_FRAGMENT_UNIFORM_COMPONENTS))
            }
            MaxRenderbufferSize => ConstantValue::Int(self.query_int(gl::MAX_RENDERBUFFER_SIZE)),
            MaxSamples => {
                if self.is_feature_available(FeatureId::RenderbufferMultisample) {
                    ConstantValue::Int(self.query_int(gl::MAX_SAMPLES))
                } else {
                    ConstantValue::Int(0)
                }
            }
            MaxTextureImageUnits => {
                ConstantValue::Int(self.query_int(gl::MAX_TEXTURE_IMAGE_UNITS))
            }
            MaxTextureMaxAnisotropy => {
                if self.is_feature_available(FeatureId::TextureFilterAnisotropic) {
                    ConstantValue::Float(self.query_float(GL_MAX_TEXTURE_MAX_ANISOTROPY))
                } else {
                    ConstantValue::Float(1.0)
                }
            }
            MaxTextureSize => ConstantValue::Int(self.query_int(gl::MAX_TEXTURE_SIZE)),
            MaxTransformFeedbackSeparateAttribs => {
                if self.is_feature_available(FeatureId::TransformFeedback) {
                    ConstantValue::Int(
                        self.query_int(gl::MAX_TRANSFORM_FEEDBACK_SEPARATE_ATTRIBS),
                    )
                } else {
                    ConstantValue::Int(0)
                }
            }
            MaxUniformBufferBindings => {
                if self.is_feature_available(FeatureId::MapBufferBase) {
                    ConstantValue::Int(self.query_int(gl::MAX_UNIFORM_BUFFER_BINDINGS))
                } else {
                    ConstantValue::Int(0)
                }
            }
            MaxVertexAttribs => ConstantValue::Int(self.query_int(gl::MAX_VERTEX_ATTRIBS)),
            MaxViewportDims => ConstantValue::IntPair(self.query_int2(gl::MAX_VIEWPORT_DIMS)),
        }
    }

    unsafe fn query_int(&self, pname: GLenum) -> i32 {
        let mut value = 0;
        gl::GetIntegerv(pname, &mut value);
        value
    }

    unsafe fn query_int2(&self, pname: GLenum) -> [i32; 2] {
        let mut value = [0; 2];
        gl::GetIntegerv(pname, value.as_mut_ptr());
        value
    }

    unsafe fn query_float(&self, pname: GLenum) -> f32 {
        let mut value = 0.0;
        gl::GetFloatv(pname, &mut value);
        value
    }

    unsafe fn query_float2(&self, pname: GLenum) -> [f32; 2] {
        let mut value = [0.0; 2];
        gl::GetFloatv(pname, value.as_mut_ptr());
        value
    }

    // ------------------------------------------------------------------
    // Error checking.
    // ------------------------------------------------------------------

    /// Turns per-call error checking on or off. Enabling first moves any
    /// error already pending in the driver into the stash so it is not
    /// attributed to a later call; at most one code is kept.
    pub fn enable_error_checking(&self, enable: bool) {
        if enable && !self.error_checking.load(Ordering::Relaxed) {
            let mut code = (self.get_error)();
            while code != gl::NO_ERROR {
                self.stash_error(code);
                code = (self.get_error)();
            }
        }
        self.error_checking.store(enable, Ordering::Relaxed);
    }

    pub fn is_error_checking_enabled(&self) -> bool {
        self.error_checking.load(Ordering::Relaxed)
    }

    /// Returns the oldest unretrieved error, consulting the stash before
    /// the driver.
    pub fn get_error(&self) -> GLenum {
        let stashed = self.last_error.swap(gl::NO_ERROR, Ordering::Relaxed);
        if stashed != gl::NO_ERROR {
            return stashed;
        }
        (self.get_error)()
    }

    fn stash_error(&self, code: u32) {
        // Keep the first unretrieved code; later ones are dropped, the
        // same way the driver itself latches errors.
        let _ = self.last_error.compare_exchange(
            gl::NO_ERROR,
            code,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    /// Called after every wrapped entry point when checking is enabled.
    pub(crate) fn check_call(&self, name: &'static str) {
        if !self.error_checking.load(Ordering::Relaxed) {
            return;
        }
        let mut code = (self.get_error)();
        while code != gl::NO_ERROR {
            error!("GL error '{}' after {}.", error_string(code), name);
            self.stash_error(code);
            code = (self.get_error)();
        }
    }

    pub(crate) fn report_unloaded(&self, name: &'static str) {
        warn!("{} is not loaded on this context, call ignored.", name);
    }
}

fn statetable_caps_for(id: FeatureId) -> u32 {
    match id {
        FeatureId::ClipDistance => Capability::ALL
            [Capability::ClipDistance0 as usize..=Capability::ClipDistance7 as usize]
            .iter()
            .fold(0, |mask, cap| mask | cap.bit()),
        FeatureId::DebugOutput => Capability::DebugOutputSynchronous.bit(),
        FeatureId::MultisampleCapability => Capability::Multisample.bit(),
        FeatureId::SampleShading => Capability::SampleShading.bit(),
        FeatureId::RasterizerDiscardCapability => Capability::RasterizerDiscard.bit(),
        _ => 0,
    }
}

/// Scoped suppression of error checking. While alive, wrapped calls are
/// not checked; on drop, errors raised inside the scope are drained and
/// the previous checking state is restored.
pub struct ErrorSilencer<'a> {
    manager: &'a GraphicsManager,
    was_enabled: bool,
}

impl<'a> ErrorSilencer<'a> {
    pub fn new(manager: &'a GraphicsManager) -> Self {
        // Preserve an error the application has not retrieved yet.
        if manager.last_error.load(Ordering::Relaxed) == gl::NO_ERROR {
            let code = (manager.get_error)();
            if code != gl::NO_ERROR {
                manager.stash_error(code);
            }
        }
        let was_enabled = manager.error_checking.swap(false, Ordering::Relaxed);
        ErrorSilencer {
            manager,
            was_enabled,
        }
    }
}

impl<'a> Drop for ErrorSilencer<'a> {
    fn drop(&mut self) {
        while (self.manager.get_error)() != gl::NO_ERROR {}
        self.manager
            .error_checking
            .store(self.was_enabled, Ordering::Relaxed);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    lazy_static! {
        static ref SCRIPTED_ERRORS: Mutex<VecDeque<u32>> = Mutex::new(VecDeque::new());
    }

    /// Queues error codes the fake driver will report, oldest first.
    pub fn script_errors(codes: &[u32]) {
        let mut queue = SCRIPTED_ERRORS.lock().unwrap();
        queue.clear();
        queue.extend(codes);
    }

    fn scripted_get_error() -> u32 {
        SCRIPTED_ERRORS
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(gl::NO_ERROR)
    }

    pub fn manager_with_info(info: GlInfo) -> GraphicsManager {
        GraphicsManager {
            info,
            features: RwLock::new(
                FeatureId::ALL
                    .iter()
                    .map(|_| Feature::new(Vec::new()))
                    .collect(),
            ),
            valid_statetable_caps: AtomicU32::new(crate::statetable::CAPABILITY_MASK),
            constants: ConstantCache::new(),
            error_checking: AtomicBool::new(false),
            last_error: AtomicU32::new(gl::NO_ERROR),
            get_error: scripted_get_error,
        }
    }

    pub fn desktop_manager() -> GraphicsManager {
        manager_with_info(GlInfo {
            flavor: GlFlavor::Desktop,
            version: 45,
            version_string: "4.5.0".to_owned(),
            renderer: "testbed".to_owned(),
            vendor: "testbed".to_owned(),
            profile: GlProfile::Core,
            extensions: Vec::new(),
        })
    }

    impl GraphicsManager {
        pub(crate) fn force_feature_supported(&self, id: FeatureId) {
            self.set_feature_supported(id, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    // The scripted error queue is shared process state; keep every test
    // that touches it behind this lock.
    lazy_static! {
        static ref SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    #[test]
    fn feature_enable_requires_support() {
        let _guard = SERIAL.lock().unwrap();
        script_errors(&[]);
        let manager = desktop_manager();

        manager.enable_feature(FeatureId::VertexArrays, true);
        assert!(!manager.is_feature_available(FeatureId::VertexArrays));

        manager.force_feature_supported(FeatureId::VertexArrays);
        manager.enable_feature(FeatureId::VertexArrays, true);
        assert!(manager.is_feature_available(FeatureId::VertexArrays));

        manager.enable_feature(FeatureId::VertexArrays, false);
        assert!(manager.is_feature_supported(FeatureId::VertexArrays));
        assert!(!manager.is_feature_available(FeatureId::VertexArrays));
    }

    #[test]
    fn capability_features_gate_statetable_caps() {
        let _guard = SERIAL.lock().unwrap();
        script_errors(&[]);
        let manager = desktop_manager();
        assert!(manager.is_valid_statetable_capability(Capability::RasterizerDiscard));

        manager.enable_feature(FeatureId::RasterizerDiscardCapability, false);
        assert!(!manager.is_valid_statetable_capability(Capability::RasterizerDiscard));
        assert!(manager.is_valid_statetable_capability(Capability::Blend));

        manager.force_feature_supported(FeatureId::RasterizerDiscardCapability);
        manager.enable_feature(FeatureId::RasterizerDiscardCapability, true);
        assert!(manager.is_valid_statetable_capability(Capability::RasterizerDiscard));
    }

    #[test]
    fn enabling_error_checking_stashes_pending_error() {
        let _guard = SERIAL.lock().unwrap();
        let manager = desktop_manager();
        script_errors(&[gl::INVALID_VALUE, gl::INVALID_ENUM]);

        manager.enable_error_checking(true);
        // The first pending code survives, the rest are dropped.
        assert_eq!(manager.get_error(), gl::INVALID_VALUE);
        assert_eq!(manager.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn error_silencer_restores_state_and_drains() {
        let _guard = SERIAL.lock().unwrap();
        let manager = desktop_manager();
        script_errors(&[]);
        manager.enable_error_checking(true);

        script_errors(&[gl::INVALID_OPERATION]);
        {
            let _silencer = ErrorSilencer::new(&manager);
            assert!(!manager.is_error_checking_enabled());
            // Error raised inside the silenced scope.
            script_errors(&[gl::OUT_OF_MEMORY]);
        }
        assert!(manager.is_error_checking_enabled());
        // The pre-existing error is preserved, the silenced one is gone.
        assert_eq!(manager.get_error(), gl::INVALID_OPERATION);
        assert_eq!(manager.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn wrong_typed_constant_yields_none() {
        let _guard = SERIAL.lock().unwrap();
        script_errors(&[]);
        let manager = desktop_manager();

        // Unavailable features pin their constants without touching GL.
        assert_eq!(
            manager.get_constant::<i32>(Constant::MaxClipDistances),
            Some(0)
        );
        assert_eq!(manager.get_constant::<f32>(Constant::MaxClipDistances), None);
        assert_eq!(
            manager.get_constant::<f32>(Constant::MaxTextureMaxAnisotropy),
            Some(1.0)
        );
        assert_eq!(
            manager.get_constant::<i32>(Constant::MaxUniformBufferBindings),
            Some(0)
        );
        assert_eq!(
            manager.get_constant::<f32>(Constant::MaxUniformBufferBindings),
            None
        );
    }
}
