use crate::context::{
    GraphicsContext, ImageTarget, ImageUpload, PixelFormat, PixelType, TextureTarget,
};
use crate::error::{InvalidDescriptorErr, Result};
use crate::source::PixelData;
use crate::textures::{TextureBase, TextureKind, impl_texture_resource};
use snafu::ensure;

/// A 2D texture built from raw pixel bytes.
#[derive(Debug)]
pub struct ColorTexture {
    base: TextureBase,
    data: PixelData,
    format: PixelFormat,
    ty: PixelType,
}

impl_texture_resource!(ColorTexture, TextureKind::Color);

impl ColorTexture {
    /// RGBA8 data.
    pub fn new<C: GraphicsContext + ?Sized>(ctx: &mut C, data: PixelData) -> Result<Self> {
        Self::with_format(ctx, data, PixelFormat::Rgba, PixelType::UnsignedByte)
    }

    pub fn with_format<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        data: PixelData,
        format: PixelFormat,
        ty: PixelType,
    ) -> Result<Self> {
        ensure!(
            data.width > 0 && data.height > 0,
            InvalidDescriptorErr {
                reason: format!("color texture can't be {}x{}", data.width, data.height),
            }
        );

        let expected = ImageUpload::expected_len(data.width, data.height, format, ty);
        ensure!(
            data.pixels.len() == expected,
            InvalidDescriptorErr {
                reason: format!(
                    "{}x{} {format:?}/{ty:?} needs {expected} bytes, got {}",
                    data.width,
                    data.height,
                    data.pixels.len()
                ),
            }
        );

        let mut texture = Self {
            base: TextureBase::create(ctx, TextureTarget::Texture2D)?,
            data,
            format,
            ty,
        };
        texture.upload(ctx);
        Ok(texture)
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_type(&self) -> PixelType {
        self.ty
    }

    fn upload<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        self.base.bind(ctx);
        ctx.set_unpack_flip_y(false);
        ctx.tex_image_2d(
            ImageTarget::Texture2D,
            &ImageUpload {
                width: self.data.width,
                height: self.data.height,
                format: self.format,
                ty: self.ty,
                pixels: Some(&self.data.pixels),
            },
        );
        self.base
            .apply_filtering(ctx, self.data.width, self.data.height);
    }
}
