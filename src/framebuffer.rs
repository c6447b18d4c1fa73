//! Framebuffer object data holders.

use std::sync::{Arc, RwLock};

use gl::types::GLenum;

use crate::holder::ResourceHolder;
use crate::texture::TexturePtr;

pub type FramebufferObjectPtr = Arc<RwLock<FramebufferObject>>;

pub mod change {
    pub const DIMENSIONS: u32 = 1 << 0;
    pub const COLOR_ATTACHMENTS: u32 = 1 << 1;
    pub const DEPTH_ATTACHMENT: u32 = 1 << 2;
    pub const STENCIL_ATTACHMENT: u32 = 1 << 3;
}

pub const MAX_COLOR_ATTACHMENTS: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderbufferFormat {
    Rgba4,
    Rgb565,
    Rgba8,
    DepthComponent16,
    Depth24Stencil8,
    StencilIndex8,
}

impl From<RenderbufferFormat> for GLenum {
    fn from(format: RenderbufferFormat) -> Self {
        match format {
            RenderbufferFormat::Rgba4 => gl::RGBA4,
            RenderbufferFormat::Rgb565 => gl::RGB565,
            RenderbufferFormat::Rgba8 => gl::RGBA8,
            RenderbufferFormat::DepthComponent16 => gl::DEPTH_COMPONENT16,
            RenderbufferFormat::Depth24Stencil8 => gl::DEPTH24_STENCIL8,
            RenderbufferFormat::StencilIndex8 => gl::STENCIL_INDEX8,
        }
    }
}

#[derive(Clone)]
pub enum Attachment {
    /// Nothing attached.
    Unbound,
    /// Render into a texture's base level.
    Texture(TexturePtr),
    /// Render into a renderbuffer, optionally multisampled. A non-zero
    /// sample count requires the renderbuffer-multisample feature.
    Renderbuffer {
        format: RenderbufferFormat,
        samples: u32,
    },
}

impl Attachment {
    pub fn is_bound(&self) -> bool {
        !matches!(self, Attachment::Unbound)
    }
}

pub struct FramebufferObject {
    holder: ResourceHolder,
    width: u32,
    height: u32,
    color: [Attachment; MAX_COLOR_ATTACHMENTS],
    depth: Attachment,
    stencil: Attachment,
}

impl FramebufferObject {
    pub fn new(width: u32, height: u32) -> Self {
        FramebufferObject {
            holder: ResourceHolder::new(),
            width,
            height,
            color: [
                Attachment::Unbound,
                Attachment::Unbound,
                Attachment::Unbound,
                Attachment::Unbound,
            ],
            depth: Attachment::Unbound,
            stencil: Attachment::Unbound,
        }
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.holder.on_changed(change::DIMENSIONS);
    }

    /// Attaches to a color slot. Slots past 0 require the
    /// multiple-color-attachments feature at update time.
    pub fn set_color_attachment(&mut self, index: usize, attachment: Attachment) {
        if index >= MAX_COLOR_ATTACHMENTS {
            warn!("Color attachment {} is out of range, ignoring.", index);
            return;
        }
        self.color[index] = attachment;
        self.holder.on_changed(change::COLOR_ATTACHMENTS);
    }

    pub fn color_attachment(&self, index: usize) -> &Attachment {
        &self.color[index]
    }

    pub fn set_depth_attachment(&mut self, attachment: Attachment) {
        self.depth = attachment;
        self.holder.on_changed(change::DEPTH_ATTACHMENT);
    }

    pub fn depth_attachment(&self) -> &Attachment {
        &self.depth
    }

    pub fn set_stencil_attachment(&mut self, attachment: Attachment) {
        self.stencil = attachment;
        self.holder.on_changed(change::STENCIL_ATTACHMENT);
    }

    pub fn stencil_attachment(&self) -> &Attachment {
        &self.stencil
    }
}
