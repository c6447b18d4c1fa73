//! Texture, sampler and image data holders.

use std::sync::{Arc, RwLock};

use gl::types::GLenum;

use crate::holder::ResourceHolder;
use crate::statetable::CompareFunction;

pub type TexturePtr = Arc<RwLock<Texture>>;
pub type SamplerPtr = Arc<RwLock<Sampler>>;

/// Change bits recorded on the holder when a texture mutates.
pub mod change {
    pub const IMAGE: u32 = 1 << 0;
    pub const SUB_IMAGE: u32 = 1 << 1;
    pub const SAMPLER: u32 = 1 << 2;
    pub const MIPMAPS: u32 = 1 << 3;
}

pub mod sampler_change {
    pub const PARAMETERS: u32 = 1 << 0;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    R8,
    Rg8,
    Rgb888,
    Rgba8888,
    DepthComponent16,
    Depth24Stencil8,
}

impl ImageFormat {
    /// (internal format, format, component type) for pixel uploads.
    pub fn to_gl(self) -> (GLenum, GLenum, GLenum) {
        match self {
            ImageFormat::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
            ImageFormat::Rg8 => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
            ImageFormat::Rgb888 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
            ImageFormat::Rgba8888 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
            ImageFormat::DepthComponent16 => (
                gl::DEPTH_COMPONENT16,
                gl::DEPTH_COMPONENT,
                gl::UNSIGNED_SHORT,
            ),
            ImageFormat::Depth24Stencil8 => (
                gl::DEPTH24_STENCIL8,
                gl::DEPTH_STENCIL,
                gl::UNSIGNED_INT_24_8,
            ),
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::R8 => 1,
            ImageFormat::Rg8 => 2,
            ImageFormat::DepthComponent16 => 2,
            ImageFormat::Rgb888 => 3,
            ImageFormat::Rgba8888 => 4,
            ImageFormat::Depth24Stencil8 => 4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Image {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A pending partial upload applied with `TexSubImage2D`.
#[derive(Clone, Debug)]
pub struct SubImage {
    pub x: u32,
    pub y: u32,
    pub image: Image,
    /// Face index for cube maps; always 0 for 2D textures.
    pub face: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    Repeat,
}

impl From<WrapMode> for GLenum {
    fn from(mode: WrapMode) -> Self {
        match mode {
            WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
            WrapMode::MirroredRepeat => gl::MIRRORED_REPEAT,
            WrapMode::Repeat => gl::REPEAT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
    NearestMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapNearest,
    LinearMipmapLinear,
}

impl From<FilterMode> for GLenum {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => gl::NEAREST,
            FilterMode::Linear => gl::LINEAR,
            FilterMode::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            FilterMode::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            FilterMode::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            FilterMode::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }
}

/// Sampling parameters. With the sampler-objects feature available these
/// become a GL sampler object shared between textures; without it they are
/// re-applied as texture parameters.
#[derive(Debug)]
pub struct Sampler {
    holder: ResourceHolder,
    wrap_s: WrapMode,
    wrap_t: WrapMode,
    min_filter: FilterMode,
    mag_filter: FilterMode,
    compare_function: Option<CompareFunction>,
    max_anisotropy: f32,
}

impl Sampler {
    pub fn new() -> Self {
        Sampler {
            holder: ResourceHolder::new(),
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            min_filter: FilterMode::NearestMipmapLinear,
            mag_filter: FilterMode::Linear,
            compare_function: None,
            max_anisotropy: 1.0,
        }
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn set_wrap(&mut self, s: WrapMode, t: WrapMode) {
        self.wrap_s = s;
        self.wrap_t = t;
        self.holder.on_changed(sampler_change::PARAMETERS);
    }

    pub fn wrap(&self) -> (WrapMode, WrapMode) {
        (self.wrap_s, self.wrap_t)
    }

    pub fn set_filters(&mut self, min: FilterMode, mag: FilterMode) {
        self.min_filter = min;
        self.mag_filter = mag;
        self.holder.on_changed(sampler_change::PARAMETERS);
    }

    pub fn filters(&self) -> (FilterMode, FilterMode) {
        (self.min_filter, self.mag_filter)
    }

    /// Enables shadow-sampler comparison against the given function, or
    /// disables it with `None`.
    pub fn set_compare_function(&mut self, function: Option<CompareFunction>) {
        self.compare_function = function;
        self.holder.on_changed(sampler_change::PARAMETERS);
    }

    pub fn compare_function(&self) -> Option<CompareFunction> {
        self.compare_function
    }

    pub fn set_max_anisotropy(&mut self, value: f32) {
        self.max_anisotropy = value.max(1.0);
        self.holder.on_changed(sampler_change::PARAMETERS);
    }

    pub fn max_anisotropy(&self) -> f32 {
        self.max_anisotropy
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Sampler::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextureKind {
    TwoDimensional,
    CubeMap,
}

impl TextureKind {
    pub fn face_count(self) -> usize {
        match self {
            TextureKind::TwoDimensional => 1,
            TextureKind::CubeMap => 6,
        }
    }
}

#[derive(Debug)]
pub struct Texture {
    holder: ResourceHolder,
    kind: TextureKind,
    // One slot for 2D textures, six for cube maps (+X, -X, +Y, -Y, +Z, -Z).
    faces: Vec<Option<Image>>,
    sub_images: Vec<SubImage>,
    sampler: Option<SamplerPtr>,
    generate_mipmaps: bool,
    base_level: i32,
    max_level: i32,
}

impl Texture {
    pub fn new(kind: TextureKind) -> Self {
        Texture {
            holder: ResourceHolder::new(),
            kind,
            faces: vec![None; kind.face_count()],
            sub_images: Vec::new(),
            sampler: None,
            generate_mipmaps: false,
            base_level: 0,
            max_level: 1000,
        }
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn set_image(&mut self, image: Image) {
        self.set_face_image(0, image);
    }

    pub fn set_face_image(&mut self, face: usize, image: Image) {
        if face >= self.faces.len() {
            warn!(
                "Face {} is out of range for a {:?} texture, ignoring image.",
                face, self.kind
            );
            return;
        }
        self.faces[face] = Some(image);
        self.holder.on_changed(change::IMAGE);
    }

    pub fn image(&self, face: usize) -> Option<&Image> {
        self.faces.get(face).and_then(|f| f.as_ref())
    }

    pub fn add_sub_image(&mut self, sub: SubImage) {
        if sub.face >= self.faces.len() {
            warn!(
                "Face {} is out of range for a {:?} texture, ignoring sub-image.",
                sub.face, self.kind
            );
            return;
        }
        self.sub_images.push(sub);
        self.holder.on_changed(change::SUB_IMAGE);
    }

    pub fn pending_sub_images(&self) -> &[SubImage] {
        &self.sub_images
    }

    pub fn clear_sub_images(&mut self) {
        self.sub_images.clear();
    }

    pub fn set_sampler(&mut self, sampler: Option<SamplerPtr>) {
        self.sampler = sampler;
        self.holder.on_changed(change::SAMPLER);
    }

    pub fn sampler(&self) -> Option<&SamplerPtr> {
        self.sampler.as_ref()
    }

    pub fn set_generate_mipmaps(&mut self, generate: bool) {
        self.generate_mipmaps = generate;
        self.holder.on_changed(change::MIPMAPS);
    }

    pub fn generate_mipmaps(&self) -> bool {
        self.generate_mipmaps
    }

    pub fn set_mipmap_range(&mut self, base: i32, max: i32) {
        self.base_level = base;
        self.max_level = max;
        self.holder.on_changed(change::MIPMAPS);
    }

    pub fn mipmap_range(&self) -> (i32, i32) {
        (self.base_level, self.max_level)
    }

    /// Bytes of GPU memory the base images will occupy once uploaded.
    pub fn gpu_size(&self) -> usize {
        self.faces
            .iter()
            .flatten()
            .map(|image| image.data.len())
            .sum()
    }
}
