use crate::context::{
    Capabilities, GraphicsContext, ImageTarget, ImageUpload, ParameterName, ParameterValue,
    PixelFormat, PixelType, TextureTarget,
};
use crate::error::{InvalidDescriptorErr, Result, UnsupportedCapabilityErr};
use crate::textures::{TextureBase, TextureKind, impl_texture_resource};
use snafu::ensure;

/// Uninitialized depth storage, typically a shadow map or a depth attachment.
#[derive(Debug)]
pub struct DepthTexture {
    base: TextureBase,
    width: u32,
    height: u32,
}

impl_texture_resource!(DepthTexture, TextureKind::Depth);

impl DepthTexture {
    pub fn new<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        caps: &Capabilities,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        ensure!(
            caps.depth_textures,
            UnsupportedCapabilityErr {
                capability: "depth textures"
            }
        );
        ensure!(
            width > 0 && height > 0,
            InvalidDescriptorErr {
                reason: format!("depth texture can't be {width}x{height}"),
            }
        );

        let mut texture = Self {
            base: TextureBase::create(ctx, TextureTarget::Texture2D)?,
            width,
            height,
        };
        texture.upload(ctx);
        Ok(texture)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn upload<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        self.base.bind(ctx);
        ctx.tex_image_2d(
            ImageTarget::Texture2D,
            &ImageUpload {
                width: self.width,
                height: self.height,
                format: PixelFormat::DepthComponent,
                ty: PixelType::UnsignedInt,
                pixels: None,
            },
        );

        // depth can't be filtered or mipmapped
        for (name, value) in [
            (ParameterName::MinFilter, ParameterValue::Nearest),
            (ParameterName::MagFilter, ParameterValue::Nearest),
            (ParameterName::WrapS, ParameterValue::ClampToEdge),
            (ParameterName::WrapT, ParameterValue::ClampToEdge),
        ] {
            self.base.set_if_absent(ctx, name, value);
        }
    }
}
