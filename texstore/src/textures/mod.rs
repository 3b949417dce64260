//! GPU texture objects and the variants a session can build.
//!
//! Every variant owns exactly one texture name in the [`GraphicsContext`] through its
//! [`TextureBase`] and exposes the shared operations through [`TextureResource`]. The
//! session keeps them in a [`Texture`] enum behind a [`TextureKey`].

mod color;
mod cubemap;
mod depth;
mod external;
mod policy;
mod solid;
pub mod surface;
mod texture_2d;

pub use color::ColorTexture;
pub use cubemap::{CROSS_OFFSETS, CubeLayout, CubeMap, CubeMapConfig, FaceRecord};
pub use depth::DepthTexture;
pub use external::ExternalTexture;
pub use policy::{FilterDecision, MipmapPolicy, is_power_of_two};
pub use solid::SolidTexture;
pub use texture_2d::{LoadState, Texture2D};

use crate::context::{GraphicsContext, ParameterName, ParameterValue, TextureId, TextureTarget};
use crate::error::{CreateFailedErr, Result};
use delegate::delegate;
use slotmap::new_key_type;
use snafu::OptionExt;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use tracing::{trace, warn};

new_key_type! {
    /// Stable handle to a texture owned by a [`GraphicsSession`](crate::session::GraphicsSession).
    pub struct TextureKey;
}

/// Opaque white, shown while a 2D image is still loading.
pub const IMAGE_PLACEHOLDER: [u8; 4] = [255, 255, 255, 255];
/// Light blue, shown on every face of a cube map until all of its faces are in.
pub const CUBE_MAP_PLACEHOLDER: [u8; 4] = [100, 100, 255, 255];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureKind {
    Solid,
    Image,
    Depth,
    Color,
    CubeMap,
    External,
}

impl Display for TextureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TextureKind::Solid => "solid texture",
            TextureKind::Image => "2D image texture",
            TextureKind::Depth => "depth texture",
            TextureKind::Color => "color texture",
            TextureKind::CubeMap => "cube map",
            TextureKind::External => "external texture",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct ParameterEntry {
    value: ParameterValue,
    explicit: bool,
}

/// The part every texture variant shares: its target, its name and its parameter record.
#[derive(Debug)]
pub struct TextureBase {
    target: TextureTarget,
    handle: TextureId,
    params: HashMap<ParameterName, ParameterEntry>,
}

impl TextureBase {
    pub(crate) fn create<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        target: TextureTarget,
    ) -> Result<Self> {
        let handle = ctx.create_texture().context(CreateFailedErr)?;
        trace!("[Texture] Created {target:?} texture {}", handle.raw());

        Ok(Self {
            target,
            handle,
            params: HashMap::new(),
        })
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn handle(&self) -> TextureId {
        self.handle
    }

    /// Last value set for `name`, by the user or by a policy.
    pub fn parameter(&self, name: ParameterName) -> Option<ParameterValue> {
        self.params.get(&name).map(|entry| entry.value)
    }

    pub fn is_explicit(&self, name: ParameterName) -> bool {
        self.params.get(&name).is_some_and(|entry| entry.explicit)
    }

    pub(crate) fn bind<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.bind_texture(self.target, Some(self.handle));
    }

    /// User override. Always reaches the context and wins over later policy values.
    pub(crate) fn set_explicit<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        name: ParameterName,
        value: ParameterValue,
    ) {
        self.bind(ctx);
        ctx.tex_parameter(self.target, name, value);
        self.params.insert(
            name,
            ParameterEntry {
                value,
                explicit: true,
            },
        );
    }

    /// Policy default. Skipped if the user set `name` or if `value` is already in place.
    pub(crate) fn set_if_absent<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        name: ParameterName,
        value: ParameterValue,
    ) -> bool {
        match self.params.get(&name) {
            Some(entry) if entry.explicit || entry.value == value => false,
            _ => {
                self.apply(ctx, name, value, false);
                true
            }
        }
    }

    /// Hardware constraint. Applied even over a user value, keeping its explicit flag.
    pub(crate) fn force<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        name: ParameterName,
        value: ParameterValue,
    ) {
        let explicit = match self.params.get(&name) {
            Some(entry) if entry.value == value => return,
            Some(entry) => entry.explicit,
            None => false,
        };
        self.apply(ctx, name, value, explicit);
    }

    fn apply<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        name: ParameterName,
        value: ParameterValue,
        explicit: bool,
    ) {
        self.bind(ctx);
        ctx.tex_parameter(self.target, name, value);
        self.params.insert(name, ParameterEntry { value, explicit });
    }

    /// Runs the [`MipmapPolicy`] for freshly uploaded content of the given size.
    ///
    /// The texture must hold the new content already.
    pub(crate) fn apply_filtering<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        width: u32,
        height: u32,
    ) {
        if width == 0 || height == 0 {
            warn!(
                "[Texture] Skipping filter setup for {width}x{height} texture {}",
                self.handle.raw()
            );
            return;
        }

        let decision = MipmapPolicy::decide(width, height);
        if let Some(wrap) = decision.wrap_s {
            self.force(ctx, ParameterName::WrapS, wrap);
        }
        if let Some(wrap) = decision.wrap_t {
            self.force(ctx, ParameterName::WrapT, wrap);
        }
        self.set_if_absent(ctx, ParameterName::MinFilter, decision.min_filter);

        if decision.generate_mipmap {
            self.bind(ctx);
            ctx.generate_mipmap(self.target);
        }
    }

    pub(crate) fn release<C: GraphicsContext + ?Sized>(self, ctx: &mut C) {
        ctx.delete_texture(self.handle);
        trace!("[Texture] Deleted {:?} texture {}", self.target, self.handle.raw());
    }
}

/// Operations shared by every texture variant.
pub trait TextureResource {
    fn base(&self) -> &TextureBase;
    fn base_mut(&mut self) -> &mut TextureBase;
    fn into_base(self) -> TextureBase
    where
        Self: Sized;
    fn kind(&self) -> TextureKind;

    fn target(&self) -> TextureTarget {
        self.base().target()
    }

    fn handle(&self) -> TextureId {
        self.base().handle()
    }

    fn parameter(&self, name: ParameterName) -> Option<ParameterValue> {
        self.base().parameter(name)
    }

    /// Makes `unit` the active unit and binds this texture to it.
    fn bind_to_unit<C: GraphicsContext + ?Sized>(&self, ctx: &mut C, unit: u32) {
        ctx.active_texture(unit);
        self.base().bind(ctx);
    }

    fn set_parameter<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        name: ParameterName,
        value: ParameterValue,
    ) {
        self.base_mut().set_explicit(ctx, name, value);
    }

    /// Returns whether the value was applied.
    fn set_parameter_if_absent<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        name: ParameterName,
        value: ParameterValue,
    ) -> bool {
        self.base_mut().set_if_absent(ctx, name, value)
    }

    /// Releases the texture name. Consumes the texture, so it can't be released twice.
    fn destroy<C: GraphicsContext + ?Sized>(self, ctx: &mut C)
    where
        Self: Sized,
    {
        self.into_base().release(ctx);
    }
}

macro_rules! impl_texture_resource {
    ($ty:ty, $kind:expr) => {
        impl $crate::textures::TextureResource for $ty {
            fn base(&self) -> &$crate::textures::TextureBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::textures::TextureBase {
                &mut self.base
            }

            fn into_base(self) -> $crate::textures::TextureBase {
                self.base
            }

            fn kind(&self) -> $crate::textures::TextureKind {
                $kind
            }
        }
    };
}

pub(crate) use impl_texture_resource;

/// Any texture a session owns.
#[derive(Debug)]
pub enum Texture {
    Solid(SolidTexture),
    Image(Texture2D),
    Depth(DepthTexture),
    Color(ColorTexture),
    CubeMap(CubeMap),
    External(ExternalTexture),
}

impl TextureResource for Texture {
    delegate! {
        to match self {
            Texture::Solid(t) => t,
            Texture::Image(t) => t,
            Texture::Depth(t) => t,
            Texture::Color(t) => t,
            Texture::CubeMap(t) => t,
            Texture::External(t) => t,
        } {
            fn base(&self) -> &TextureBase;
            fn base_mut(&mut self) -> &mut TextureBase;
            fn kind(&self) -> TextureKind;
        }
    }

    fn into_base(self) -> TextureBase {
        match self {
            Texture::Solid(t) => t.into_base(),
            Texture::Image(t) => t.into_base(),
            Texture::Depth(t) => t.into_base(),
            Texture::Color(t) => t.into_base(),
            Texture::CubeMap(t) => t.into_base(),
            Texture::External(t) => t.into_base(),
        }
    }
}

impl Texture {
    /// Whether the texture shows its final content.
    ///
    /// Only URL-backed images and cube maps can be pending.
    pub fn is_loaded(&self) -> bool {
        match self {
            Texture::Image(t) => t.is_loaded(),
            Texture::CubeMap(t) => t.all_faces_loaded(),
            Texture::Solid(_) | Texture::Depth(_) | Texture::Color(_) | Texture::External(_) => {
                true
            }
        }
    }

    pub fn as_image(&self) -> Option<&Texture2D> {
        match self {
            Texture::Image(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Texture2D> {
        match self {
            Texture::Image(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_cube_map(&self) -> Option<&CubeMap> {
        match self {
            Texture::CubeMap(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_cube_map_mut(&mut self) -> Option<&mut CubeMap> {
        match self {
            Texture::CubeMap(t) => Some(t),
            _ => None,
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Texture {
                fn from(texture: $ty) -> Self {
                    Texture::$variant(texture)
                }
            }
        )*
    };
}

impl_from_variant!(
    Solid(SolidTexture),
    Image(Texture2D),
    Depth(DepthTexture),
    Color(ColorTexture),
    CubeMap(CubeMap),
    External(ExternalTexture),
);
