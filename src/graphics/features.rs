//! Context introspection: API flavor, version, renderer and extension
//! probing, and the support checks the feature table is built from.

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::errors::*;

/// Which OpenGL dialect the context speaks. Version comparisons never
/// cross flavors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GlFlavor {
    Desktop,
    Es,
    Web,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GlProfile {
    Core,
    Compatibility,
    Unknown,
}

/// Minimum versions per flavor, encoded as `10 * major + minor`. A zero
/// entry means the flavor never satisfies the check by version alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GlVersions {
    pub desktop: u32,
    pub es: u32,
    pub web: u32,
}

impl GlVersions {
    pub const NONE: GlVersions = GlVersions {
        desktop: 0,
        es: 0,
        web: 0,
    };

    pub const fn new(desktop: u32, es: u32, web: u32) -> Self {
        GlVersions { desktop, es, web }
    }
}

/// Everything learned from the context at init time.
#[derive(Clone, Debug)]
pub struct GlInfo {
    pub flavor: GlFlavor,
    /// `10 * major + minor`.
    pub version: u32,
    pub version_string: String,
    pub renderer: String,
    pub vendor: String,
    pub profile: GlProfile,
    pub extensions: Vec<String>,
}

// Vendor prefixes an unqualified extension name may match under.
const EXTENSION_PREFIXES: &[&str] = &[
    "GL_ARB_", "GL_EXT_", "GL_OES_", "GL_KHR_", "GL_NV_", "GL_AMD_", "GL_APPLE_", "GL_ANGLE_",
    "GL_QCOM_", "GL_IMG_", "GL_CHROMIUM_", "GL_WEBGL_",
];

impl GlInfo {
    /// Queries the current context. Requires a context to be current and
    /// `gl` symbols to be loaded.
    pub unsafe fn parse() -> Result<GlInfo> {
        let version_string = get_string(gl::VERSION)
            .ok_or_else(|| format_err!("failed to read GL_VERSION from the current context"))?;
        let renderer = get_string(gl::RENDERER).unwrap_or_default();
        let vendor = get_string(gl::VENDOR).unwrap_or_default();

        let (flavor, version) = classify_version(&version_string);

        let profile = if flavor == GlFlavor::Desktop {
            let mut mask = 0;
            gl::GetIntegerv(gl::CONTEXT_PROFILE_MASK, &mut mask);
            // Drivers without real profile support report 0.
            if mask & gl::CONTEXT_CORE_PROFILE_BIT as i32 != 0 {
                GlProfile::Core
            } else if mask & gl::CONTEXT_COMPATIBILITY_PROFILE_BIT as i32 != 0 {
                GlProfile::Compatibility
            } else {
                GlProfile::Unknown
            }
        } else {
            GlProfile::Unknown
        };

        let extensions = parse_extensions();

        Ok(GlInfo {
            flavor,
            version,
            version_string,
            renderer,
            vendor,
            profile,
            extensions,
        })
    }

    /// Membership test for one extension. Fully prefixed names must match
    /// exactly; unqualified names match under any vendor prefix.
    pub fn is_extension_supported(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if name.starts_with("GL_") {
            return self.extensions.iter().any(|e| e == name);
        }
        self.extensions.iter().any(|e| {
            EXTENSION_PREFIXES
                .iter()
                .any(|p| e.len() == p.len() + name.len() && e.starts_with(p) && e.ends_with(name))
        })
    }

    /// Evaluates one support rule. The renderer blacklist is consulted
    /// first and wins outright; then the flavor's version threshold (zero
    /// never passes); then each name in the comma-separated extension
    /// list.
    pub fn check_support(
        &self,
        versions: GlVersions,
        extensions: &str,
        disabled_renderers: &str,
    ) -> bool {
        for fragment in split_csv(disabled_renderers) {
            if self.renderer.contains(fragment) {
                return false;
            }
        }

        let threshold = match self.flavor {
            GlFlavor::Desktop => versions.desktop,
            GlFlavor::Es => versions.es,
            GlFlavor::Web => versions.web,
        };
        if threshold != 0 && self.version >= threshold {
            return true;
        }

        split_csv(extensions).any(|name| self.is_extension_supported(name))
    }
}

fn split_csv(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Classifies a `GL_VERSION` string and extracts `10 * major + minor`.
/// Unparseable strings fall back to version 2.0, the floor every real
/// context satisfies.
pub fn classify_version(version: &str) -> (GlFlavor, u32) {
    let flavor = if version.contains("WebGL") {
        GlFlavor::Web
    } else if version.contains("GL ES") || version.contains("GL/ES") || version.contains("GL / ES")
    {
        GlFlavor::Es
    } else {
        GlFlavor::Desktop
    };

    let bytes = version.as_bytes();
    let mut parsed = None;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'.' && i > 0 {
            let major = bytes[i - 1];
            let minor = bytes.get(i + 1).cloned().unwrap_or(b'0');
            if major.is_ascii_digit() && minor.is_ascii_digit() {
                parsed = Some(u32::from(major - b'0') * 10 + u32::from(minor - b'0'));
                break;
            }
        }
    }

    (flavor, parsed.unwrap_or(20))
}

unsafe fn get_string(name: gl::types::GLenum) -> Option<String> {
    let ptr = gl::GetString(name) as *const c_char;
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Enumerates extensions from the legacy space-separated string, falling
/// back to per-index queries when the string is empty or unavailable.
unsafe fn parse_extensions() -> Vec<String> {
    if let Some(all) = get_string(gl::EXTENSIONS) {
        let list: Vec<String> = all.split_whitespace().map(str::to_owned).collect();
        if !list.is_empty() {
            return list;
        }
    }
    // GetString(GL_EXTENSIONS) is an error on core profiles; clear it
    // before moving on.
    gl::GetError();

    if !gl::GetStringi::is_loaded() {
        return Vec::new();
    }
    let mut count = 0;
    gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut count);
    let mut list = Vec::with_capacity(count.max(0) as usize);
    for i in 0..count.max(0) as u32 {
        let ptr = gl::GetStringi(gl::EXTENSIONS, i) as *const c_char;
        if !ptr.is_null() {
            list.push(CStr::from_ptr(ptr).to_string_lossy().into_owned());
        }
    }
    list
}

/// Named groups of capability the renderer can ask about. Each feature is
/// supported when its entry points resolved and the context passes the
/// version/extension/blacklist rule for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum FeatureId {
    Core,
    BlendMinMax,
    ClipDistance,
    CopyBufferSubData,
    DebugOutput,
    DefaultTessellationLevels,
    DepthTexture,
    DrawBuffers,
    DrawInstanced,
    ElementIndex32Bit,
    FramebufferBlit,
    GeometryShader,
    GetStringi,
    InstancedArrays,
    MapBuffer,
    MapBufferBase,
    MapBufferRange,
    MultipleColorAttachments,
    MultisampleCapability,
    MultisampleFramebufferResolve,
    PointSize,
    RasterizerDiscardCapability,
    ReadBuffer,
    RenderbufferMultisample,
    SamplerObjects,
    SampleShading,
    ShadowSamplers,
    StandardDerivatives,
    Sync,
    TessellationShader,
    Texture3d,
    TextureFilterAnisotropic,
    TextureStorage,
    TransformFeedback,
    VertexArrays,
}

pub const FEATURE_COUNT: usize = 35;

impl FeatureId {
    pub const ALL: [FeatureId; FEATURE_COUNT] = [
        FeatureId::Core,
        FeatureId::BlendMinMax,
        FeatureId::ClipDistance,
        FeatureId::CopyBufferSubData,
        FeatureId::DebugOutput,
        FeatureId::DefaultTessellationLevels,
        FeatureId::DepthTexture,
        FeatureId::DrawBuffers,
        FeatureId::DrawInstanced,
        FeatureId::ElementIndex32Bit,
        FeatureId::FramebufferBlit,
        FeatureId::GeometryShader,
        FeatureId::GetStringi,
        FeatureId::InstancedArrays,
        FeatureId::MapBuffer,
        FeatureId::MapBufferBase,
        FeatureId::MapBufferRange,
        FeatureId::MultipleColorAttachments,
        FeatureId::MultisampleCapability,
        FeatureId::MultisampleFramebufferResolve,
        FeatureId::PointSize,
        FeatureId::RasterizerDiscardCapability,
        FeatureId::ReadBuffer,
        FeatureId::RenderbufferMultisample,
        FeatureId::SamplerObjects,
        FeatureId::SampleShading,
        FeatureId::ShadowSamplers,
        FeatureId::StandardDerivatives,
        FeatureId::Sync,
        FeatureId::TessellationShader,
        FeatureId::Texture3d,
        FeatureId::TextureFilterAnisotropic,
        FeatureId::TextureStorage,
        FeatureId::TransformFeedback,
        FeatureId::VertexArrays,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureId::Core => "Core",
            FeatureId::BlendMinMax => "BlendMinMax",
            FeatureId::ClipDistance => "ClipDistance",
            FeatureId::CopyBufferSubData => "CopyBufferSubData",
            FeatureId::DebugOutput => "DebugOutput",
            FeatureId::DefaultTessellationLevels => "DefaultTessellationLevels",
            FeatureId::DepthTexture => "DepthTexture",
            FeatureId::DrawBuffers => "DrawBuffers",
            FeatureId::DrawInstanced => "DrawInstanced",
            FeatureId::ElementIndex32Bit => "ElementIndex32Bit",
            FeatureId::FramebufferBlit => "FramebufferBlit",
            FeatureId::GeometryShader => "GeometryShader",
            FeatureId::GetStringi => "GetStringi",
            FeatureId::InstancedArrays => "InstancedArrays",
            FeatureId::MapBuffer => "MapBuffer",
            FeatureId::MapBufferBase => "MapBufferBase",
            FeatureId::MapBufferRange => "MapBufferRange",
            FeatureId::MultipleColorAttachments => "MultipleColorAttachments",
            FeatureId::MultisampleCapability => "MultisampleCapability",
            FeatureId::MultisampleFramebufferResolve => "MultisampleFramebufferResolve",
            FeatureId::PointSize => "PointSize",
            FeatureId::RasterizerDiscardCapability => "RasterizerDiscardCapability",
            FeatureId::ReadBuffer => "ReadBuffer",
            FeatureId::RenderbufferMultisample => "RenderbufferMultisample",
            FeatureId::SamplerObjects => "SamplerObjects",
            FeatureId::SampleShading => "SampleShading",
            FeatureId::ShadowSamplers => "ShadowSamplers",
            FeatureId::StandardDerivatives => "StandardDerivatives",
            FeatureId::Sync => "Sync",
            FeatureId::TessellationShader => "TessellationShader",
            FeatureId::Texture3d => "Texture3d",
            FeatureId::TextureFilterAnisotropic => "TextureFilterAnisotropic",
            FeatureId::TextureStorage => "TextureStorage",
            FeatureId::TransformFeedback => "TransformFeedback",
            FeatureId::VertexArrays => "VertexArrays",
        }
    }

    /// Entry points the feature needs that did not resolve in the current
    /// context. A feature with missing functions can never be supported.
    pub fn missing_functions(self) -> Vec<&'static str> {
        macro_rules! require {
            ($($name:ident),*) => {{
                let mut missing = Vec::new();
                $(
                    if !gl::$name::is_loaded() {
                        missing.push(stringify!($name));
                    }
                )*
                missing
            }};
        }

        match self {
            FeatureId::Core => require!(
                ActiveTexture,
                AttachShader,
                BindBuffer,
                BindFramebuffer,
                BindRenderbuffer,
                BindTexture,
                BlendColor,
                BlendEquationSeparate,
                BlendFuncSeparate,
                BufferData,
                BufferSubData,
                CheckFramebufferStatus,
                Clear,
                ClearColor,
                ClearDepthf,
                ClearStencil,
                ColorMask,
                CompileShader,
                CreateProgram,
                CreateShader,
                CullFace,
                DeleteBuffers,
                DeleteFramebuffers,
                DeleteProgram,
                DeleteRenderbuffers,
                DeleteShader,
                DeleteTextures,
                DepthFunc,
                DepthMask,
                DepthRangef,
                Disable,
                DisableVertexAttribArray,
                DrawArrays,
                DrawElements,
                Enable,
                EnableVertexAttribArray,
                Finish,
                Flush,
                FramebufferRenderbuffer,
                FramebufferTexture2D,
                FrontFace,
                GenBuffers,
                GenFramebuffers,
                GenRenderbuffers,
                GenTextures,
                GenerateMipmap,
                GetActiveAttrib,
                GetActiveUniform,
                GetAttribLocation,
                GetError,
                GetFloatv,
                GetIntegerv,
                GetProgramInfoLog,
                GetProgramiv,
                GetShaderInfoLog,
                GetShaderiv,
                GetString,
                GetUniformLocation,
                Hint,
                IsEnabled,
                LineWidth,
                LinkProgram,
                PixelStorei,
                PolygonOffset,
                ReadPixels,
                RenderbufferStorage,
                SampleCoverage,
                Scissor,
                ShaderSource,
                StencilFuncSeparate,
                StencilMaskSeparate,
                StencilOpSeparate,
                TexImage2D,
                TexParameterf,
                TexParameteri,
                TexSubImage2D,
                Uniform1fv,
                Uniform1iv,
                Uniform1uiv,
                Uniform2fv,
                Uniform2iv,
                Uniform2uiv,
                Uniform3fv,
                Uniform3iv,
                Uniform3uiv,
                Uniform4fv,
                Uniform4iv,
                Uniform4uiv,
                UniformMatrix2fv,
                UniformMatrix3fv,
                UniformMatrix4fv,
                UseProgram,
                VertexAttribPointer,
                Viewport
            ),
            FeatureId::DebugOutput => require!(DebugMessageCallback, DebugMessageControl),
            FeatureId::DefaultTessellationLevels => require!(PatchParameterfv),
            FeatureId::DrawBuffers => require!(DrawBuffers),
            FeatureId::DrawInstanced => require!(DrawArraysInstanced, DrawElementsInstanced),
            FeatureId::CopyBufferSubData => require!(CopyBufferSubData),
            FeatureId::FramebufferBlit => require!(BlitFramebuffer),
            FeatureId::GeometryShader => require!(FramebufferTexture),
            FeatureId::GetStringi => require!(GetStringi),
            FeatureId::InstancedArrays => require!(VertexAttribDivisor),
            FeatureId::MapBuffer => require!(MapBuffer),
            FeatureId::MapBufferBase => require!(UnmapBuffer, GetBufferPointerv),
            FeatureId::MapBufferRange => require!(MapBufferRange, FlushMappedBufferRange),
            FeatureId::MultisampleFramebufferResolve => require!(BlitFramebuffer),
            FeatureId::ReadBuffer => require!(ReadBuffer),
            FeatureId::RenderbufferMultisample => require!(RenderbufferStorageMultisample),
            FeatureId::SamplerObjects => require!(
                BindSampler,
                DeleteSamplers,
                GenSamplers,
                SamplerParameterf,
                SamplerParameteri
            ),
            FeatureId::SampleShading => require!(MinSampleShading),
            FeatureId::Sync => require!(ClientWaitSync, DeleteSync, FenceSync),
            FeatureId::TessellationShader => require!(PatchParameteri),
            FeatureId::Texture3d => require!(TexImage3D, TexSubImage3D),
            FeatureId::TextureStorage => require!(TexStorage2D),
            FeatureId::TransformFeedback => require!(
                BeginTransformFeedback,
                BindBufferBase,
                BindTransformFeedback,
                DeleteTransformFeedbacks,
                EndTransformFeedback,
                GenTransformFeedbacks,
                TransformFeedbackVaryings
            ),
            FeatureId::VertexArrays => require!(
                BindVertexArray,
                DeleteVertexArrays,
                GenVertexArrays,
                IsVertexArray
            ),
            // Capability-only features add no entry points of their own.
            FeatureId::BlendMinMax
            | FeatureId::ClipDistance
            | FeatureId::DepthTexture
            | FeatureId::ElementIndex32Bit
            | FeatureId::MultipleColorAttachments
            | FeatureId::MultisampleCapability
            | FeatureId::PointSize
            | FeatureId::RasterizerDiscardCapability
            | FeatureId::ShadowSamplers
            | FeatureId::StandardDerivatives
            | FeatureId::TextureFilterAnisotropic => Vec::new(),
        }
    }
}

/// One row of the feature table.
#[derive(Clone, Debug, Default)]
pub struct Feature {
    supported: bool,
    enabled: bool,
    missing: Vec<&'static str>,
}

impl Feature {
    pub fn new(missing: Vec<&'static str>) -> Self {
        Feature {
            supported: false,
            enabled: false,
            missing,
        }
    }

    #[inline]
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Support requires every entry point to have resolved, whatever the
    /// version and extension checks said.
    pub fn set_supported(&mut self, supported: bool) {
        self.supported = supported && self.missing.is_empty();
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Only supported features can be enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled && self.supported;
    }

    /// The renderer consults this before every use: supported by the
    /// context and not turned off by the application.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.supported && self.enabled
    }

    pub fn missing_functions(&self) -> &[&'static str] {
        &self.missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop_info() -> GlInfo {
        GlInfo {
            flavor: GlFlavor::Desktop,
            version: 33,
            version_string: "3.3.0 NVIDIA 535.86".to_owned(),
            renderer: "NVIDIA GeForce RTX 2070/PCIe/SSE2".to_owned(),
            vendor: "NVIDIA Corporation".to_owned(),
            profile: GlProfile::Core,
            extensions: vec![
                "GL_ARB_vertex_array_object".to_owned(),
                "GL_EXT_texture_filter_anisotropic".to_owned(),
                "GL_KHR_debug".to_owned(),
            ],
        }
    }

    #[test]
    fn version_classification() {
        assert_eq!(
            classify_version("4.5.0 NVIDIA 384.130"),
            (GlFlavor::Desktop, 45)
        );
        assert_eq!(
            classify_version("OpenGL ES 3.2 V@331.0"),
            (GlFlavor::Es, 32)
        );
        assert_eq!(
            classify_version("WebGL 2.0 (OpenGL ES 3.0 Chromium)"),
            (GlFlavor::Web, 20)
        );
        // Unparseable strings fall back to 2.0.
        assert_eq!(classify_version("nonsense"), (GlFlavor::Desktop, 20));
    }

    #[test]
    fn version_threshold_zero_never_passes() {
        let info = desktop_info();
        assert!(!info.check_support(GlVersions::NONE, "", ""));
        assert!(info.check_support(GlVersions::new(30, 30, 20), "", ""));
        assert!(!info.check_support(GlVersions::new(40, 0, 0), "", ""));
    }

    #[test]
    fn blacklist_wins_over_version() {
        let info = desktop_info();
        assert!(!info.check_support(GlVersions::new(10, 0, 0), "", "GeForce RTX"));
        assert!(info.check_support(GlVersions::new(10, 0, 0), "", "SwiftShader,Mali-"));
    }

    #[test]
    fn extensions_match_with_and_without_prefix() {
        let info = desktop_info();
        assert!(info.check_support(GlVersions::NONE, "vertex_array_object", ""));
        assert!(info.check_support(GlVersions::NONE, "GL_KHR_debug", ""));
        assert!(info.check_support(GlVersions::NONE, "missing_thing,debug", ""));
        assert!(!info.check_support(GlVersions::NONE, "missing_thing", ""));
        // A fully qualified name must match exactly, prefix included.
        assert!(!info.check_support(GlVersions::NONE, "GL_ARB_debug", ""));
    }

    #[test]
    fn feature_availability_needs_support_and_enable() {
        let mut feature = Feature::new(Vec::new());
        assert!(!feature.is_available());

        feature.set_enabled(true);
        assert!(!feature.is_available(), "unsupported features stay off");

        feature.set_supported(true);
        feature.set_enabled(true);
        assert!(feature.is_available());

        feature.set_enabled(false);
        assert!(feature.is_supported() && !feature.is_available());
    }

    #[test]
    fn missing_functions_block_support() {
        let mut feature = Feature::new(vec!["MapBuffer"]);
        feature.set_supported(true);
        assert!(!feature.is_supported());
    }
}
