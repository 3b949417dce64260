use crate::context::{GraphicsContext, ImageTarget, ImageUpload, TextureTarget};
use crate::error::Result;
use crate::source::Surface;
use crate::textures::{TextureBase, TextureKind, impl_texture_resource};
use tracing::trace;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadState {
    /// Showing the placeholder, fetch in flight.
    Pending,
    Loaded,
    /// The fetch failed. The placeholder stays.
    Failed,
}

/// A 2D texture showing an image.
#[derive(Debug)]
pub struct Texture2D {
    base: TextureBase,
    image: Option<Surface>,
    flip_y: bool,
    state: LoadState,
    placeholder: [u8; 4],
}

impl_texture_resource!(Texture2D, TextureKind::Image);

impl Texture2D {
    /// A texture for an image that is still being fetched.
    pub fn pending<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        flip_y: bool,
        placeholder: [u8; 4],
    ) -> Result<Self> {
        let texture = Self {
            base: TextureBase::create(ctx, TextureTarget::Texture2D)?,
            image: None,
            flip_y,
            state: LoadState::Pending,
            placeholder,
        };
        texture.upload_placeholder(ctx);
        Ok(texture)
    }

    /// A texture for an image that is already decoded. Loaded right away.
    pub fn from_surface<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        image: Surface,
        flip_y: bool,
    ) -> Result<Self> {
        let mut texture = Self {
            base: TextureBase::create(ctx, TextureTarget::Texture2D)?,
            image: Some(image),
            flip_y,
            state: LoadState::Loaded,
            placeholder: super::IMAGE_PLACEHOLDER,
        };
        texture.upload(ctx);
        Ok(texture)
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn image(&self) -> Option<&Surface> {
        self.image.as_ref()
    }

    /// Applies a finished fetch.
    pub(crate) fn finish_load<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C, image: Surface) {
        self.image = Some(image);
        self.state = LoadState::Loaded;
        self.upload(ctx);
    }

    pub(crate) fn fail_load(&mut self) {
        if self.state == LoadState::Pending {
            self.state = LoadState::Failed;
        }
    }

    /// Replaces the content, e.g. with the next frame of a video.
    pub fn set_image<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C, image: Surface) {
        trace!(
            "[Texture] Replacing image of texture {} with {}x{}",
            self.base.handle().raw(),
            image.width(),
            image.height()
        );
        self.finish_load(ctx, image);
    }

    fn upload<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        let Some(image) = self.image.clone() else {
            self.upload_placeholder(ctx);
            return;
        };

        self.base.bind(ctx);
        ctx.set_unpack_flip_y(self.flip_y);
        ctx.tex_image_2d(ImageTarget::Texture2D, &ImageUpload::from_image(&image));
        self.base.apply_filtering(ctx, image.width(), image.height());
    }

    fn upload_placeholder<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        self.base.bind(ctx);
        ctx.tex_image_2d(ImageTarget::Texture2D, &ImageUpload::pixel(&self.placeholder));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ParameterName, ParameterValue, RecordingContext};
    use crate::textures::{IMAGE_PLACEHOLDER, TextureResource};
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    fn surface(width: u32, height: u32) -> Surface {
        Arc::new(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn pending_shows_white_pixel() {
        let mut ctx = RecordingContext::default();
        let texture = Texture2D::pending(&mut ctx, false, IMAGE_PLACEHOLDER).unwrap();

        let image = ctx.image(texture.handle(), ImageTarget::Texture2D).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.first_pixel(), Some([255, 255, 255, 255]));
        assert_eq!(texture.state(), LoadState::Pending);
    }

    #[test]
    fn surfaces_upload_immediately_with_flip() {
        let mut ctx = RecordingContext::default();
        let texture = Texture2D::from_surface(&mut ctx, surface(64, 32), true).unwrap();
        let id = texture.handle();

        assert!(texture.is_loaded());
        let image = ctx.image(id, ImageTarget::Texture2D).unwrap();
        assert_eq!((image.width, image.height), (64, 32));
        assert!(image.flip_y);
        assert_eq!(image.first_pixel(), Some([10, 20, 30, 255]));
        assert_eq!(ctx.texture(id).unwrap().mipmap_generations, 1);
        assert_eq!(
            ctx.parameter(id, ParameterName::MinFilter),
            Some(ParameterValue::LinearMipmapLinear)
        );
    }

    #[test]
    fn finished_load_replaces_placeholder() {
        let mut ctx = RecordingContext::default();
        let mut texture = Texture2D::pending(&mut ctx, false, IMAGE_PLACEHOLDER).unwrap();

        texture.finish_load(&mut ctx, surface(100, 50));

        let id = texture.handle();
        assert!(texture.is_loaded());
        assert_eq!(ctx.image(id, ImageTarget::Texture2D).unwrap().width, 100);
        assert_eq!(ctx.parameter(id, ParameterName::WrapS), Some(ParameterValue::ClampToEdge));
        assert_eq!(ctx.texture(id).unwrap().mipmap_generations, 0);
    }

    #[test]
    fn failure_keeps_placeholder() {
        let mut ctx = RecordingContext::default();
        let mut texture = Texture2D::pending(&mut ctx, false, IMAGE_PLACEHOLDER).unwrap();

        texture.fail_load();

        assert_eq!(texture.state(), LoadState::Failed);
        let image = ctx.image(texture.handle(), ImageTarget::Texture2D).unwrap();
        assert_eq!(image.first_pixel(), Some(IMAGE_PLACEHOLDER));
    }

    #[test]
    fn set_image_keeps_user_min_filter() {
        let mut ctx = RecordingContext::default();
        let mut texture = Texture2D::from_surface(&mut ctx, surface(4, 4), false).unwrap();
        texture.set_parameter(&mut ctx, ParameterName::MinFilter, ParameterValue::Nearest);

        texture.set_image(&mut ctx, surface(8, 8));

        let id = texture.handle();
        assert_eq!(ctx.parameter(id, ParameterName::MinFilter), Some(ParameterValue::Nearest));
        assert_eq!(ctx.image(id, ImageTarget::Texture2D).unwrap().width, 8);
        assert_eq!(ctx.texture(id).unwrap().mipmap_generations, 2);
    }
}
