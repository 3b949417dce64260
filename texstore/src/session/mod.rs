//! Per-context texture state.
//!
//! A [`GraphicsSession`] owns everything that belongs to one graphics context: the textures,
//! the identity cache, the in-flight image loads, the context-loss listener and the
//! capability snapshot. Nothing here is global, so several contexts can coexist.

mod cache;
mod context_loss;
mod options;
mod store;

pub use cache::{CacheStats, TextureCache};
pub use context_loss::{ContextLossHandler, ContextLossSignal};
pub use options::{LoadOptions, ReadyCallback, SessionConfig};
pub use store::TextureStore;

use crate::context::{
    Capabilities, GraphicsContext, ParameterName, ParameterValue, PixelFormat, PixelType,
    TextureTarget,
};
use crate::error::{Result, UnknownTextureErr, WrongKindErr};
use crate::loading::{CompletedLoad, ImageFetcher, ImageLoadCoordinator, LoadTarget};
use crate::source::{PixelData, Surface, TextureSource, clamp_color};
use crate::textures::{
    ColorTexture, CubeMap, CubeMapConfig, DepthTexture, ExternalTexture, SolidTexture, Texture,
    Texture2D, TextureKey, TextureKind, TextureResource,
};
use futures::future::poll_fn;
use futures::task::noop_waker_ref;
use once_cell::unsync::OnceCell;
use snafu::OptionExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};
use texstore_utils::debug_panic;
use tracing::{debug, trace, warn};

/// Owner of one graphics context's textures.
pub struct GraphicsSession<C: GraphicsContext> {
    ctx: C,
    config: SessionConfig,
    fetcher: Box<dyn ImageFetcher>,
    capabilities: OnceCell<Capabilities>,
    textures: TextureStore,
    cache: TextureCache,
    loads: ImageLoadCoordinator,
    context_loss: ContextLossHandler,
    ready_callbacks: HashMap<TextureKey, ReadyCallback>,
}

impl<C: GraphicsContext> GraphicsSession<C> {
    pub fn new(ctx: C, fetcher: impl ImageFetcher + 'static) -> Self {
        Self::with_config(ctx, fetcher, SessionConfig::default())
    }

    pub fn with_config(
        ctx: C,
        fetcher: impl ImageFetcher + 'static,
        config: SessionConfig,
    ) -> Self {
        Self {
            ctx,
            config,
            fetcher: Box::new(fetcher),
            capabilities: OnceCell::new(),
            textures: TextureStore::new(),
            cache: TextureCache::new(),
            loads: ImageLoadCoordinator::new(),
            context_loss: ContextLossHandler::default(),
            ready_callbacks: HashMap::new(),
        }
    }

    /// A session that loads images from files under `root`.
    #[cfg(feature = "file-fetcher")]
    pub fn with_files(ctx: C, root: impl Into<std::path::PathBuf>) -> Self {
        Self::new(ctx, crate::loading::FileFetcher::new(root))
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The capability snapshot, taken on first use.
    pub fn capabilities(&mut self) -> Capabilities {
        self.init()
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn loads_in_flight(&self) -> usize {
        self.loads.in_flight()
    }

    /// Signal to raise from wherever the platform reports a lost context.
    pub fn loss_signal(&self) -> ContextLossSignal {
        self.context_loss.signal()
    }

    pub fn context_losses(&self) -> usize {
        self.context_loss.losses()
    }

    /// Queries capabilities and hooks up the loss listener, once per session.
    fn init(&mut self) -> Capabilities {
        if let Some(caps) = self.capabilities.get() {
            return *caps;
        }

        let caps = self.ctx.capabilities();
        self.context_loss.register(&mut self.ctx);
        debug!(
            "[Graphics Session] Initialized: max texture {}, max cube map {}, depth textures {}",
            caps.max_texture_size, caps.max_cube_map_size, caps.depth_textures
        );

        let _ = self.capabilities.set(caps);
        caps
    }

    fn observe_context_loss(&mut self) {
        if self.context_loss.take_pending() {
            self.handle_context_lost();
        }
    }

    fn cube_map_config(&self, caps: Capabilities) -> CubeMapConfig {
        CubeMapConfig {
            max_size: caps.max_cube_map_size,
            placeholder: self.config.cube_map_placeholder,
            resize_filter: self.config.resize_filter,
        }
    }

    pub fn resolve(&mut self, source: impl Into<TextureSource>) -> Result<TextureKey> {
        self.resolve_with(source, LoadOptions::default())
    }

    /// Returns the texture for `source`, building it if its identity isn't cached yet.
    ///
    /// URL sources come back immediately showing a placeholder. Their images arrive once
    /// the host pumps the loads.
    pub fn resolve_with(
        &mut self,
        source: impl Into<TextureSource>,
        options: LoadOptions,
    ) -> Result<TextureKey> {
        self.observe_context_loss();

        let source = source.into();
        source.validate()?;
        let caps = self.init();

        let identity = source.identity();
        if let Some(identity) = &identity {
            if let Some(key) = self.cache.get(identity) {
                if self.textures.contains(key) {
                    return Ok(key);
                }

                debug_panic!(
                    "[Graphics Session] Cache entry {identity} points at a released texture"
                );
                self.cache.remove(identity);
            }
        }

        let LoadOptions { flip_y, on_ready } = options;
        let key = match source {
            TextureSource::Color(color) => {
                let texture = SolidTexture::new(&mut self.ctx, clamp_color(color))?;
                self.textures.add(texture)
            }
            TextureSource::Url(url) => {
                let texture =
                    Texture2D::pending(&mut self.ctx, flip_y, self.config.image_placeholder)?;
                let key = self.textures.add(texture);
                let future = self.fetcher.fetch(&url);
                self.loads.track(url, LoadTarget::Image(key), future);
                key
            }
            TextureSource::Urls(urls) => {
                let config = self.cube_map_config(caps);
                let cube = CubeMap::from_urls(&mut self.ctx, &urls, config)?;
                let key = self.textures.add(cube);
                for (face, url) in urls.into_iter().enumerate() {
                    let future = self.fetcher.fetch(&url);
                    self.loads.track(url, LoadTarget::CubeFace { key, face }, future);
                }
                key
            }
            TextureSource::Image { image, .. } | TextureSource::Canvas(image) => {
                warn_if_oversized(&image, caps);
                let texture = Texture2D::from_surface(&mut self.ctx, image, flip_y)?;
                self.textures.add(texture)
            }
            TextureSource::Pixels(data) => {
                let texture = ColorTexture::new(&mut self.ctx, data)?;
                self.textures.add(texture)
            }
        };

        if let Some(identity) = identity {
            self.cache.insert(identity, key);
        }

        if let Some(callback) = on_ready {
            if self.is_loaded(key)? {
                callback(key);
            } else {
                self.ready_callbacks.insert(key, callback);
            }
        }

        Ok(key)
    }

    pub fn texture(&self, key: TextureKey) -> Result<&Texture> {
        self.textures.try_get(key).context(UnknownTextureErr { key })
    }

    pub fn get(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.try_get(key)
    }

    pub fn bind_to_unit(&mut self, key: TextureKey, unit: u32) -> Result<()> {
        self.observe_context_loss();

        let texture = self.textures.try_get(key).context(UnknownTextureErr { key })?;
        texture.bind_to_unit(&mut self.ctx, unit);
        Ok(())
    }

    pub fn set_parameter(
        &mut self,
        key: TextureKey,
        name: ParameterName,
        value: ParameterValue,
    ) -> Result<()> {
        self.observe_context_loss();

        let texture = self
            .textures
            .try_get_mut(key)
            .context(UnknownTextureErr { key })?;
        texture.set_parameter(&mut self.ctx, name, value);
        Ok(())
    }

    /// Releases the texture and forgets everything pointing at it.
    ///
    /// Destroying a key twice returns [`UnknownTexture`](crate::TextureError::UnknownTexture).
    pub fn destroy(&mut self, key: TextureKey) -> Result<()> {
        self.observe_context_loss();

        let texture = self.textures.remove(key).context(UnknownTextureErr { key })?;
        self.cache.evict(key);
        let cancelled = self.loads.cancel_for(key);
        self.ready_callbacks.remove(&key);

        if cancelled > 0 {
            trace!("[Graphics Session] Cancelled {cancelled} loads of destroyed {key:?}");
        }

        texture.destroy(&mut self.ctx);
        Ok(())
    }

    pub fn is_loaded(&self, key: TextureKey) -> Result<bool> {
        Ok(self.texture(key)?.is_loaded())
    }

    /// Whether every face of the cube map `key` has arrived.
    pub fn cube_map_ready(&self, key: TextureKey) -> Result<bool> {
        match self.texture(key)? {
            Texture::CubeMap(cube) => Ok(cube.all_faces_loaded()),
            other => WrongKindErr {
                key,
                expected: TextureKind::CubeMap,
                actual: other.kind(),
            }
            .fail(),
        }
    }

    /// Replaces the content of a 2D image texture, dropping any load still in flight for it.
    pub fn set_image(&mut self, key: TextureKey, image: impl Into<Surface>) -> Result<()> {
        self.observe_context_loss();

        let image = image.into();
        let texture = match self.textures.try_get_mut(key).context(UnknownTextureErr { key })? {
            Texture::Image(texture) => texture,
            other => {
                return WrongKindErr {
                    key,
                    expected: TextureKind::Image,
                    actual: other.kind(),
                }
                .fail();
            }
        };

        texture.set_image(&mut self.ctx, image);
        self.loads.cancel_for(key);
        self.fire_ready(key);
        Ok(())
    }

    pub fn create_depth_texture(&mut self, width: u32, height: u32) -> Result<TextureKey> {
        self.observe_context_loss();
        let caps = self.init();

        let texture = DepthTexture::new(&mut self.ctx, &caps, width, height)?;
        Ok(self.textures.add(texture))
    }

    pub fn create_color_texture(
        &mut self,
        data: PixelData,
        format: PixelFormat,
        ty: PixelType,
    ) -> Result<TextureKey> {
        self.observe_context_loss();
        self.init();

        let texture = ColorTexture::with_format(&mut self.ctx, data, format, ty)?;
        Ok(self.textures.add(texture))
    }

    /// A cube map with placeholder content and no source images.
    pub fn create_cube_map_sized(&mut self, size: u32) -> Result<TextureKey> {
        self.observe_context_loss();
        let caps = self.init();

        let config = self.cube_map_config(caps);
        let cube = CubeMap::sized(&mut self.ctx, size, config)?;
        Ok(self.textures.add(cube))
    }

    pub fn create_external_texture(&mut self, target: TextureTarget) -> Result<TextureKey> {
        self.observe_context_loss();
        self.init();

        let texture = ExternalTexture::new(&mut self.ctx, target)?;
        Ok(self.textures.add(texture))
    }

    /// Applies every load that has finished by now, without blocking.
    ///
    /// Returns the number of loads that completed.
    pub fn process_loads(&mut self) -> usize {
        let mut cx = Context::from_waker(noop_waker_ref());
        self.pump(&mut cx)
    }

    /// Applies finished loads. Ready once nothing is in flight anymore.
    pub fn poll_loads(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        self.pump(cx);

        if self.loads.is_idle() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    /// Resolves once every load in flight has been applied or has failed.
    pub async fn loads_settled(&mut self) {
        poll_fn(|cx| self.poll_loads(cx)).await
    }

    fn pump(&mut self, cx: &mut Context<'_>) -> usize {
        self.observe_context_loss();

        let completed = self.loads.poll_completed(cx);
        let count = completed.len();
        for load in completed {
            self.apply_load(load);
        }
        count
    }

    fn apply_load(&mut self, load: CompletedLoad) {
        let CompletedLoad {
            id,
            url,
            target,
            elapsed,
            result,
        } = load;
        let key = target.key();

        let Some(texture) = self.textures.get_mut_quiet(key) else {
            trace!("[Image Loader] Dropping load {id} of {url}, its texture is gone");
            return;
        };

        let image = match result {
            Ok(image) => Arc::new(image),
            Err(err) => {
                warn!("[Image Loader] Could not load image {url}: {err}");
                if let Texture::Image(texture) = texture {
                    texture.fail_load();
                }
                return;
            }
        };

        debug!(
            "[Image Loader] Loaded {url} ({}x{}) in {elapsed:?}",
            image.width(),
            image.height()
        );

        let ready = match (target, texture) {
            (LoadTarget::Image(_), Texture::Image(texture)) => {
                if let Some(caps) = self.capabilities.get() {
                    warn_if_oversized(&image, *caps);
                }
                texture.finish_load(&mut self.ctx, image);
                true
            }
            (LoadTarget::CubeFace { face, .. }, Texture::CubeMap(cube)) => {
                cube.on_face_loaded(&mut self.ctx, face, image)
            }
            (target, other) => {
                debug_panic!(
                    "[Image Loader] Load {id} for {target:?} landed on a {}",
                    other.kind()
                );
                false
            }
        };

        if ready {
            self.fire_ready(key);
        }
    }

    fn fire_ready(&mut self, key: TextureKey) {
        if let Some(callback) = self.ready_callbacks.remove(&key) {
            callback(key);
        }
    }

    /// Drops all per-context state after the context has been lost.
    ///
    /// Textures are forgotten without deleting them, since their names died with the context.
    /// Loads still in flight are cancelled and never applied.
    pub fn handle_context_lost(&mut self) {
        let cached = self.cache.clear();
        let cancelled = self.loads.cancel_all();
        let dropped = self.textures.clear();
        self.ready_callbacks.clear();
        self.context_loss.record_loss();

        warn!(
            "[Context Loss] Graphics context lost: dropped {dropped} textures, {cached} cache entries and {cancelled} loads"
        );
    }
}

impl<C: GraphicsContext> std::fmt::Debug for GraphicsSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsSession")
            .field("config", &self.config)
            .field("capabilities", &self.capabilities.get())
            .field("textures", &self.textures.len())
            .field("cache", &self.cache.len())
            .field("loads", &self.loads.in_flight())
            .field("context_losses", &self.context_loss.losses())
            .finish()
    }
}

fn warn_if_oversized(image: &Surface, caps: Capabilities) {
    let max = caps.max_texture_size;
    if image.width() > max || image.height() > max {
        warn!(
            "[Graphics Session] Image is {}x{}, larger than the maximum texture size {max}",
            image.width(),
            image.height()
        );
    }
}
