//! The boundary to the stateful graphics context that owns the actual GPU objects.
//!
//! Nothing in here talks to a GPU. The [`GraphicsContext`] trait is what a host implements
//! on top of its real backend, and the texture types in [`crate::textures`] only ever go
//! through it. Enum discriminants are the GL constant values, so a GL-style backend can
//! forward them without a lookup table.
//!
//! [`RecordingContext`] is a headless implementation that records every call.

mod recording;

pub use recording::*;

use crate::session::ContextLossSignal;
use image::RgbaImage;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::num::NonZeroU32;
use texstore_macros::OrderedIndex;

/// Name of a texture object inside a [`GraphicsContext`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TextureId(NonZeroU32);

impl TextureId {
    pub const fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    /// `0` is the GL "no texture" name and doesn't map to an id.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub const fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Binding point of a texture object.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum TextureTarget {
    Texture2D = 0x0DE1,
    CubeMap = 0x8513,
}

/// Cube-map faces in upload order: +X, -X, +Y, -Y, +Z, -Z.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive, OrderedIndex)]
pub enum CubeFace {
    PositiveX = 0x8515,
    NegativeX = 0x8516,
    PositiveY = 0x8517,
    NegativeY = 0x8518,
    PositiveZ = 0x8519,
    NegativeZ = 0x851A,
}

/// The image slot an upload writes to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ImageTarget {
    Texture2D,
    Face(CubeFace),
}

impl ImageTarget {
    /// The binding point that has to be bound for an upload into this slot.
    pub const fn texture_target(self) -> TextureTarget {
        match self {
            ImageTarget::Texture2D => TextureTarget::Texture2D,
            ImageTarget::Face(_) => TextureTarget::CubeMap,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            ImageTarget::Texture2D => TextureTarget::Texture2D.into(),
            ImageTarget::Face(face) => face.into(),
        }
    }
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum ParameterName {
    MagFilter = 0x2800,
    MinFilter = 0x2801,
    WrapS = 0x2802,
    WrapT = 0x2803,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum ParameterValue {
    Nearest = 0x2600,
    Linear = 0x2601,
    NearestMipmapNearest = 0x2700,
    LinearMipmapNearest = 0x2701,
    NearestMipmapLinear = 0x2702,
    LinearMipmapLinear = 0x2703,
    Repeat = 0x2901,
    ClampToEdge = 0x812F,
    MirroredRepeat = 0x8370,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum PixelFormat {
    DepthComponent = 0x1902,
    Alpha = 0x1906,
    Rgb = 0x1907,
    Rgba = 0x1908,
    Luminance = 0x1909,
    LuminanceAlpha = 0x190A,
}

impl PixelFormat {
    pub const fn components(self) -> usize {
        match self {
            PixelFormat::DepthComponent | PixelFormat::Alpha | PixelFormat::Luminance => 1,
            PixelFormat::LuminanceAlpha => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum PixelType {
    UnsignedByte = 0x1401,
    UnsignedShort = 0x1403,
    UnsignedInt = 0x1405,
    Float = 0x1406,
}

impl PixelType {
    pub const fn bytes(self) -> usize {
        match self {
            PixelType::UnsignedByte => 1,
            PixelType::UnsignedShort => 2,
            PixelType::UnsignedInt | PixelType::Float => 4,
        }
    }
}

/// One `texImage2D` worth of data.
///
/// `pixels: None` allocates storage without initializing it (depth buffers, render targets).
#[derive(Debug, Copy, Clone)]
pub struct ImageUpload<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub ty: PixelType,
    pub pixels: Option<&'a [u8]>,
}

impl<'a> ImageUpload<'a> {
    pub fn rgba(width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba,
            ty: PixelType::UnsignedByte,
            pixels: Some(pixels),
        }
    }

    /// A single RGBA pixel.
    pub fn pixel(color: &'a [u8; 4]) -> Self {
        Self::rgba(1, 1, color)
    }

    pub fn from_image(image: &'a RgbaImage) -> Self {
        Self::rgba(image.width(), image.height(), image.as_raw())
    }

    /// Byte length a tightly packed buffer of this shape must have.
    pub fn expected_len(width: u32, height: u32, format: PixelFormat, ty: PixelType) -> usize {
        width as usize * height as usize * format.components() * ty.bytes()
    }
}

/// Limits queried from the context once per session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Capabilities {
    pub max_texture_size: u32,
    pub max_cube_map_size: u32,
    pub depth_textures: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_texture_size: 4096,
            max_cube_map_size: 4096,
            depth_textures: true,
        }
    }
}

/// A stateful, GL-style rendering context.
///
/// Uploads and parameter changes act on whatever texture is bound to the target on the
/// active unit, exactly like the GL state machine. Callers in this crate always bind
/// before touching state.
pub trait GraphicsContext {
    fn capabilities(&self) -> Capabilities;

    /// Returns `None` if the context can't hand out new names (e.g. it has been lost).
    fn create_texture(&mut self) -> Option<TextureId>;
    fn delete_texture(&mut self, texture: TextureId);

    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>);

    fn tex_image_2d(&mut self, target: ImageTarget, upload: &ImageUpload<'_>);
    fn tex_parameter(&mut self, target: TextureTarget, name: ParameterName, value: ParameterValue);
    fn generate_mipmap(&mut self, target: TextureTarget);

    /// Pixel store flag applied to subsequent uploads.
    fn set_unpack_flip_y(&mut self, flip: bool);

    /// Hooks the signal up to the platform's context-lost event.
    ///
    /// Called once per session. Contexts that can't be lost keep the default.
    fn register_context_lost(&mut self, signal: ContextLossSignal) {
        let _ = signal;
    }
}

impl<C: GraphicsContext + ?Sized> GraphicsContext for Box<C> {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn create_texture(&mut self) -> Option<TextureId> {
        (**self).create_texture()
    }

    fn delete_texture(&mut self, texture: TextureId) {
        (**self).delete_texture(texture)
    }

    fn active_texture(&mut self, unit: u32) {
        (**self).active_texture(unit)
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>) {
        (**self).bind_texture(target, texture)
    }

    fn tex_image_2d(&mut self, target: ImageTarget, upload: &ImageUpload<'_>) {
        (**self).tex_image_2d(target, upload)
    }

    fn tex_parameter(&mut self, target: TextureTarget, name: ParameterName, value: ParameterValue) {
        (**self).tex_parameter(target, name, value)
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        (**self).generate_mipmap(target)
    }

    fn set_unpack_flip_y(&mut self, flip: bool) {
        (**self).set_unpack_flip_y(flip)
    }

    fn register_context_lost(&mut self, signal: ContextLossSignal) {
        (**self).register_context_lost(signal)
    }
}
