use crate::textures::{CUBE_MAP_PLACEHOLDER, IMAGE_PLACEHOLDER, TextureKey};
use bon::Builder;
use image::imageops::FilterType;
use std::fmt::{Debug, Formatter};

/// Called once the texture shows its final content.
pub type ReadyCallback = Box<dyn FnOnce(TextureKey) + 'static>;

/// Per-request options for [`GraphicsSession::resolve_with`](super::GraphicsSession::resolve_with).
#[derive(Builder)]
pub struct LoadOptions {
    /// Flip images vertically on upload.
    #[builder(default)]
    pub flip_y: bool,
    /// Not called when the request is answered from the cache.
    pub on_ready: Option<ReadyCallback>,
}

impl LoadOptions {
    pub fn flipped() -> Self {
        Self::builder().flip_y(true).build()
    }

    pub fn on_ready(callback: impl FnOnce(TextureKey) + 'static) -> Self {
        Self::builder().on_ready(Box::new(callback)).build()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Debug for LoadOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("flip_y", &self.flip_y)
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}

/// Session-wide settings.
#[derive(Debug, Copy, Clone, Builder)]
pub struct SessionConfig {
    #[builder(default = IMAGE_PLACEHOLDER)]
    pub image_placeholder: [u8; 4],
    #[builder(default = CUBE_MAP_PLACEHOLDER)]
    pub cube_map_placeholder: [u8; 4],
    /// Used when cube-map faces have to be scaled down.
    #[builder(default = FilterType::Triangle)]
    pub resize_filter: FilterType,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.image_placeholder, [255, 255, 255, 255]);
        assert_eq!(config.cube_map_placeholder, [100, 100, 255, 255]);
        assert_eq!(config.resize_filter, FilterType::Triangle);

        let options = LoadOptions::default();
        assert!(!options.flip_y);
        assert!(options.on_ready.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = SessionConfig::builder()
            .cube_map_placeholder([0, 0, 0, 255])
            .resize_filter(FilterType::Nearest)
            .build();
        assert_eq!(config.cube_map_placeholder, [0, 0, 0, 255]);
        assert_eq!(config.image_placeholder, IMAGE_PLACEHOLDER);

        let options = LoadOptions::builder()
            .flip_y(true)
            .on_ready(Box::new(|_: TextureKey| {}))
            .build();
        assert!(options.flip_y);
        assert!(options.on_ready.is_some());
    }
}
