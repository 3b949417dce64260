use crate::context::{GraphicsContext, ImageTarget, ImageUpload, TextureTarget};
use crate::error::Result;
use crate::textures::{TextureBase, TextureKind, impl_texture_resource};

/// A 1×1 texture of a single color.
#[derive(Debug)]
pub struct SolidTexture {
    base: TextureBase,
    color: [u8; 4],
}

impl_texture_resource!(SolidTexture, TextureKind::Solid);

impl SolidTexture {
    pub fn new<C: GraphicsContext + ?Sized>(ctx: &mut C, color: [u8; 4]) -> Result<Self> {
        let texture = Self {
            base: TextureBase::create(ctx, TextureTarget::Texture2D)?,
            color,
        };
        texture.upload(ctx);
        Ok(texture)
    }

    pub fn color(&self) -> [u8; 4] {
        self.color
    }

    fn upload<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        self.base.bind(ctx);
        ctx.tex_image_2d(ImageTarget::Texture2D, &ImageUpload::pixel(&self.color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RecordingContext;
    use crate::textures::TextureResource;

    #[test]
    fn uploads_single_pixel() {
        let mut ctx = RecordingContext::default();
        let texture = SolidTexture::new(&mut ctx, [255, 0, 0, 255]).unwrap();

        let image = ctx.image(texture.handle(), ImageTarget::Texture2D).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.first_pixel(), Some([255, 0, 0, 255]));
        assert_eq!(texture.kind(), TextureKind::Solid);
    }

    #[test]
    fn destroy_releases_the_name() {
        let mut ctx = RecordingContext::default();
        let texture = SolidTexture::new(&mut ctx, [0; 4]).unwrap();
        let id = texture.handle();

        texture.destroy(&mut ctx);

        assert_eq!(ctx.deleted(), &[id]);
        assert_eq!(ctx.live_textures(), 0);
    }
}
