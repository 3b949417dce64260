use crate::context::{
    Capabilities, CubeFace, GraphicsContext, ImageTarget, ImageUpload, ParameterName,
    ParameterValue, PixelFormat, PixelType, TextureId, TextureTarget,
};
use crate::session::ContextLossSignal;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// A single call that reached the context, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextCall {
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<TextureId>),
    TexImage2D {
        target: ImageTarget,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    TexParameter {
        target: TextureTarget,
        name: ParameterName,
        value: ParameterValue,
    },
    GenerateMipmap(TextureTarget),
    UnpackFlipY(bool),
    RegisterContextLost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub ty: PixelType,
    pub pixels: Option<Vec<u8>>,
    pub flip_y: bool,
}

impl RecordedImage {
    /// First four bytes of the upload, which is the whole payload for placeholder pixels.
    pub fn first_pixel(&self) -> Option<[u8; 4]> {
        let pixels = self.pixels.as_ref()?;
        pixels.get(..4)?.try_into().ok()
    }
}

/// Everything the context knows about one texture object.
#[derive(Debug, Clone, Default)]
pub struct RecordedTexture {
    pub target: Option<TextureTarget>,
    pub images: HashMap<ImageTarget, RecordedImage>,
    pub parameters: HashMap<ParameterName, ParameterValue>,
    pub mipmap_generations: usize,
    pub uploads: usize,
}

/// Headless [`GraphicsContext`] that keeps the GL object model in memory.
///
/// Every call is appended to a log, and the resulting per-texture state can be inspected.
/// State errors a real driver would flag (uploading with nothing bound, deleting an unknown
/// name) are logged and counted instead of panicking.
#[derive(Debug)]
pub struct RecordingContext {
    capabilities: Capabilities,
    next_id: u32,
    textures: BTreeMap<TextureId, RecordedTexture>,
    deleted: Vec<TextureId>,
    active_unit: u32,
    bindings: HashMap<(u32, TextureTarget), TextureId>,
    flip_y: bool,
    calls: Vec<ContextCall>,
    loss_signals: Vec<ContextLossSignal>,
    failing_creates: usize,
    errors: usize,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}

impl RecordingContext {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            next_id: 1,
            textures: BTreeMap::new(),
            deleted: Vec::new(),
            active_unit: 0,
            bindings: HashMap::new(),
            flip_y: false,
            calls: Vec::new(),
            loss_signals: Vec::new(),
            failing_creates: 0,
            errors: 0,
        }
    }

    /// Fires every registered context-lost listener.
    pub fn lose_context(&mut self) {
        for signal in &self.loss_signals {
            signal.raise();
        }
    }

    /// Makes the next `count` calls to `create_texture` fail.
    pub fn fail_next_creates(&mut self, count: usize) {
        self.failing_creates = count;
    }

    pub fn calls(&self) -> &[ContextCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<ContextCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn texture(&self, id: TextureId) -> Option<&RecordedTexture> {
        self.textures.get(&id)
    }

    pub fn image(&self, id: TextureId, target: ImageTarget) -> Option<&RecordedImage> {
        self.textures.get(&id)?.images.get(&target)
    }

    pub fn face(&self, id: TextureId, face: CubeFace) -> Option<&RecordedImage> {
        self.image(id, ImageTarget::Face(face))
    }

    pub fn parameter(&self, id: TextureId, name: ParameterName) -> Option<ParameterValue> {
        self.textures.get(&id)?.parameters.get(&name).copied()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn deleted(&self) -> &[TextureId] {
        &self.deleted
    }

    pub fn bound(&self, unit: u32, target: TextureTarget) -> Option<TextureId> {
        self.bindings.get(&(unit, target)).copied()
    }

    pub fn active_unit(&self) -> u32 {
        self.active_unit
    }

    pub fn loss_listeners(&self) -> usize {
        self.loss_signals.len()
    }

    /// Number of calls a driver would have rejected.
    pub fn errors(&self) -> usize {
        self.errors
    }

    fn bound_mut(&mut self, target: TextureTarget) -> Option<&mut RecordedTexture> {
        let Some(id) = self.bindings.get(&(self.active_unit, target)).copied() else {
            warn!("[Recording Context] No texture bound to {target:?} on unit {}", self.active_unit);
            self.errors += 1;
            return None;
        };
        self.textures.get_mut(&id)
    }
}

impl GraphicsContext for RecordingContext {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn create_texture(&mut self) -> Option<TextureId> {
        if self.failing_creates > 0 {
            self.failing_creates -= 1;
            return None;
        }

        let id = TextureId::from_raw(self.next_id)?;
        self.next_id += 1;
        self.textures.insert(id, RecordedTexture::default());
        self.calls.push(ContextCall::CreateTexture(id));
        Some(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.calls.push(ContextCall::DeleteTexture(texture));
        if self.textures.remove(&texture).is_none() {
            warn!("[Recording Context] Deleting unknown texture {}", texture.raw());
            self.errors += 1;
            return;
        }
        self.bindings.retain(|_, bound| *bound != texture);
        self.deleted.push(texture);
    }

    fn active_texture(&mut self, unit: u32) {
        self.calls.push(ContextCall::ActiveTexture(unit));
        self.active_unit = unit;
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>) {
        self.calls.push(ContextCall::BindTexture(target, texture));

        let Some(id) = texture else {
            self.bindings.remove(&(self.active_unit, target));
            return;
        };

        let Some(recorded) = self.textures.get_mut(&id) else {
            warn!("[Recording Context] Binding unknown texture {}", id.raw());
            self.errors += 1;
            return;
        };

        match recorded.target {
            Some(existing) if existing != target => {
                warn!(
                    "[Recording Context] Texture {} was created as {existing:?}, bound as {target:?}",
                    id.raw()
                );
                self.errors += 1;
                return;
            }
            Some(_) => {}
            None => recorded.target = Some(target),
        }

        self.bindings.insert((self.active_unit, target), id);
    }

    fn tex_image_2d(&mut self, target: ImageTarget, upload: &ImageUpload<'_>) {
        self.calls.push(ContextCall::TexImage2D {
            target,
            width: upload.width,
            height: upload.height,
            format: upload.format,
        });

        let flip_y = self.flip_y;
        let Some(texture) = self.bound_mut(target.texture_target()) else {
            return;
        };

        texture.uploads += 1;
        texture.images.insert(
            target,
            RecordedImage {
                width: upload.width,
                height: upload.height,
                format: upload.format,
                ty: upload.ty,
                pixels: upload.pixels.map(<[u8]>::to_vec),
                flip_y,
            },
        );
    }

    fn tex_parameter(&mut self, target: TextureTarget, name: ParameterName, value: ParameterValue) {
        self.calls.push(ContextCall::TexParameter {
            target,
            name,
            value,
        });

        if let Some(texture) = self.bound_mut(target) {
            texture.parameters.insert(name, value);
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        self.calls.push(ContextCall::GenerateMipmap(target));

        if let Some(texture) = self.bound_mut(target) {
            texture.mipmap_generations += 1;
        }
    }

    fn set_unpack_flip_y(&mut self, flip: bool) {
        self.calls.push(ContextCall::UnpackFlipY(flip));
        self.flip_y = flip;
    }

    fn register_context_lost(&mut self, signal: ContextLossSignal) {
        self.calls.push(ContextCall::RegisterContextLost);
        self.loss_signals.push(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_land_on_the_bound_texture() {
        let mut ctx = RecordingContext::default();
        let id = ctx.create_texture().unwrap();

        ctx.bind_texture(TextureTarget::Texture2D, Some(id));
        ctx.tex_image_2d(ImageTarget::Texture2D, &ImageUpload::pixel(&[1, 2, 3, 4]));

        let image = ctx.image(id, ImageTarget::Texture2D).unwrap();
        assert_eq!(image.first_pixel(), Some([1, 2, 3, 4]));
        assert_eq!(ctx.errors(), 0);
    }

    #[test]
    fn state_errors_are_counted_not_fatal() {
        let mut ctx = RecordingContext::default();
        ctx.tex_image_2d(ImageTarget::Texture2D, &ImageUpload::pixel(&[0; 4]));

        let id = ctx.create_texture().unwrap();
        ctx.bind_texture(TextureTarget::CubeMap, Some(id));
        ctx.bind_texture(TextureTarget::Texture2D, Some(id));

        ctx.delete_texture(id);
        ctx.delete_texture(id);

        assert_eq!(ctx.errors(), 3);
        assert_eq!(ctx.deleted(), &[id]);
    }

    #[test]
    fn failing_creates_run_out() {
        let mut ctx = RecordingContext::default();
        ctx.fail_next_creates(1);

        assert!(ctx.create_texture().is_none());
        assert!(ctx.create_texture().is_some());
    }
}
