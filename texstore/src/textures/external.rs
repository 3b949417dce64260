use crate::context::{GraphicsContext, TextureTarget};
use crate::error::Result;
use crate::textures::{TextureBase, TextureKind, impl_texture_resource};

/// A texture name whose content is managed by someone else, e.g. a render target.
#[derive(Debug)]
pub struct ExternalTexture {
    base: TextureBase,
}

impl_texture_resource!(ExternalTexture, TextureKind::External);

impl ExternalTexture {
    pub fn new<C: GraphicsContext + ?Sized>(ctx: &mut C, target: TextureTarget) -> Result<Self> {
        Ok(Self {
            base: TextureBase::create(ctx, target)?,
        })
    }

    pub fn new_2d<C: GraphicsContext + ?Sized>(ctx: &mut C) -> Result<Self> {
        Self::new(ctx, TextureTarget::Texture2D)
    }
}
