//! Source descriptors: everything a texture can be requested from.
//!
//! The descriptor decides both which texture variant gets built and the identity the
//! session caches it under. Surfaces without a stable identity (canvases, raw pixel buffers)
//! always produce a fresh texture.

use crate::error::{InvalidDescriptorErr, Result};
use image::RgbaImage;
use itertools::Itertools;
use serde_json::Value;
use snafu::ensure;
use std::sync::Arc;

/// A decoded image, shared between the caller and the texture that uploads it.
pub type Surface = Arc<RgbaImage>;

/// Tightly packed pixel data with explicit dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PixelData {
    pub fn new(width: u32, height: u32, pixels: impl Into<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TextureSource {
    /// RGBA channels in `0..=255`, uploaded as a single pixel.
    Color([f32; 4]),
    /// A single image, loaded asynchronously into a 2D texture.
    Url(String),
    /// A cube map: one cross-layout atlas, or six faces in +X, -X, +Y, -Y, +Z, -Z order.
    Urls(Vec<String>),
    /// An already decoded image element. Cached under its `src`.
    Image { src: String, image: Surface },
    /// An already rendered surface without a stable identity.
    Canvas(Surface),
    /// Raw RGBA8 data.
    Pixels(PixelData),
}

impl TextureSource {
    pub fn color(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::Color([r, g, b, a])
    }

    pub fn image(src: impl Into<String>, image: impl Into<Surface>) -> Self {
        Self::Image {
            src: src.into(),
            image: image.into(),
        }
    }

    /// Key used to deduplicate textures. `None` means "always construct a new one".
    ///
    /// URL lists live under a `cube:` prefix so a cross atlas never shares an entry with the
    /// 2D texture of the same file.
    pub fn identity(&self) -> Option<String> {
        match self {
            TextureSource::Color(color) => Some(color.iter().join(",")),
            TextureSource::Url(url) => Some(url.clone()),
            TextureSource::Urls(urls) => Some(format!("cube:{}", urls.iter().join(","))),
            TextureSource::Image { src, .. } => Some(src.clone()),
            TextureSource::Canvas(_) | TextureSource::Pixels(_) => None,
        }
    }

    /// Rejects shapes no texture variant can be built from.
    pub fn validate(&self) -> Result<()> {
        match self {
            TextureSource::Color(color) => {
                ensure!(
                    color.iter().all(|c| c.is_finite()),
                    InvalidDescriptorErr {
                        reason: format!("color channels must be finite, got {color:?}"),
                    }
                );
            }
            TextureSource::Url(url) => {
                ensure!(
                    !url.is_empty(),
                    InvalidDescriptorErr {
                        reason: "empty image url"
                    }
                );
            }
            TextureSource::Urls(urls) => {
                ensure!(
                    matches!(urls.len(), 1 | 6),
                    InvalidDescriptorErr {
                        reason: format!("a cube map needs 1 or 6 urls, got {}", urls.len()),
                    }
                );
                ensure!(
                    urls.iter().all(|url| !url.is_empty()),
                    InvalidDescriptorErr {
                        reason: "empty cube map face url"
                    }
                );
            }
            TextureSource::Image { image, .. } | TextureSource::Canvas(image) => {
                ensure!(
                    image.width() > 0 && image.height() > 0,
                    InvalidDescriptorErr {
                        reason: "surface has no pixels"
                    }
                );
            }
            TextureSource::Pixels(data) => {
                ensure!(
                    data.width > 0 && data.height > 0,
                    InvalidDescriptorErr {
                        reason: "pixel data has no dimensions"
                    }
                );
                let expected = data.width as usize * data.height as usize * 4;
                ensure!(
                    data.pixels.len() == expected,
                    InvalidDescriptorErr {
                        reason: format!(
                            "{}x{} RGBA pixel data needs {expected} bytes, got {}",
                            data.width,
                            data.height,
                            data.pixels.len()
                        ),
                    }
                );
            }
        }

        Ok(())
    }

    /// Parses a descriptor from its JSON shape.
    ///
    /// An array of four numbers is a color, a string is a URL and an array of one or six
    /// strings is a cube map.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(url) => Ok(Self::Url(url.clone())),
            Value::Array(items) if items.len() == 4 && items.iter().all(Value::is_number) => {
                let mut color = [0.0; 4];
                for (channel, item) in color.iter_mut().zip(items) {
                    *channel = item.as_f64().unwrap_or_default() as f32;
                }
                Ok(Self::Color(color))
            }
            Value::Array(items)
                if matches!(items.len(), 1 | 6) && items.iter().all(Value::is_string) =>
            {
                let urls = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                Ok(Self::Urls(urls))
            }
            other => InvalidDescriptorErr {
                reason: format!("unrecognized texture source {other}"),
            }
            .fail(),
        }
    }
}

/// Clamps float channels into bytes.
pub fn clamp_color(color: [f32; 4]) -> [u8; 4] {
    color.map(|channel| channel.clamp(0.0, 255.0).round() as u8)
}

impl From<[f32; 4]> for TextureSource {
    fn from(color: [f32; 4]) -> Self {
        Self::Color(color)
    }
}

impl From<[u8; 4]> for TextureSource {
    fn from(color: [u8; 4]) -> Self {
        Self::Color(color.map(f32::from))
    }
}

impl From<&str> for TextureSource {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for TextureSource {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<Vec<String>> for TextureSource {
    fn from(urls: Vec<String>) -> Self {
        Self::Urls(urls)
    }
}

impl<const N: usize> From<[&str; N]> for TextureSource {
    fn from(urls: [&str; N]) -> Self {
        Self::Urls(urls.iter().map(|url| url.to_string()).collect())
    }
}

impl From<RgbaImage> for TextureSource {
    fn from(image: RgbaImage) -> Self {
        Self::Canvas(Arc::new(image))
    }
}

impl From<Surface> for TextureSource {
    fn from(image: Surface) -> Self {
        Self::Canvas(image)
    }
}

impl From<PixelData> for TextureSource {
    fn from(data: PixelData) -> Self {
        Self::Pixels(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identities_follow_descriptor_shape() {
        assert_eq!(
            TextureSource::from([255.0, 0.0, 0.0, 255.0]).identity().as_deref(),
            Some("255,0,0,255")
        );
        assert_eq!(
            TextureSource::from([0.5, 1.0, 2.0, 3.0]).identity().as_deref(),
            Some("0.5,1,2,3")
        );
        assert_eq!(
            TextureSource::from("sky.png").identity().as_deref(),
            Some("sky.png")
        );
        assert_eq!(
            TextureSource::from(["a.png", "b.png", "c.png", "d.png", "e.png", "f.png"])
                .identity()
                .as_deref(),
            Some("cube:a.png,b.png,c.png,d.png,e.png,f.png")
        );
        assert_eq!(
            TextureSource::from(["sky.png"]).identity().as_deref(),
            Some("cube:sky.png")
        );
        assert_eq!(
            TextureSource::image("img.png", RgbaImage::new(1, 1)).identity().as_deref(),
            Some("img.png")
        );
        assert_eq!(TextureSource::from(RgbaImage::new(2, 2)).identity(), None);
        assert_eq!(
            TextureSource::from(PixelData::new(1, 1, vec![0; 4])).identity(),
            None
        );
    }

    #[test]
    fn url_lists_must_describe_a_cube() {
        assert!(TextureSource::from(["a.png"]).validate().is_ok());
        assert!(TextureSource::from(["a.png", "b.png"]).validate().is_err());
        assert!(TextureSource::Urls(vec![]).validate().is_err());
        assert!(TextureSource::from(["", "", "", "", "", ""]).validate().is_err());
    }

    #[test]
    fn surfaces_and_pixels_need_content() {
        assert!(TextureSource::from(RgbaImage::new(0, 4)).validate().is_err());
        assert!(TextureSource::from(PixelData::new(2, 2, vec![0; 15])).validate().is_err());
        assert!(TextureSource::from(PixelData::new(2, 2, vec![0; 16])).validate().is_ok());
        assert!(TextureSource::from([f32::NAN, 0.0, 0.0, 0.0]).validate().is_err());
        assert!(TextureSource::from("").validate().is_err());
    }

    #[test]
    fn json_shapes_dispatch() {
        assert!(matches!(
            TextureSource::from_value(&json!([255, 128, 0, 255])),
            Ok(TextureSource::Color([255.0, 128.0, 0.0, 255.0]))
        ));
        assert!(matches!(
            TextureSource::from_value(&json!("grass.png")),
            Ok(TextureSource::Url(url)) if url == "grass.png"
        ));
        assert!(matches!(
            TextureSource::from_value(&json!(["cross.png"])),
            Ok(TextureSource::Urls(urls)) if urls.len() == 1
        ));

        assert!(TextureSource::from_value(&json!([1, 2, 3])).is_err());
        assert!(TextureSource::from_value(&json!(["a", "b"])).is_err());
        assert!(TextureSource::from_value(&json!({ "width": 2 })).is_err());
        assert!(TextureSource::from_value(&json!(42)).is_err());
    }

    #[test]
    fn colors_clamp_into_bytes() {
        assert_eq!(clamp_color([-5.0, 12.4, 254.6, 900.0]), [0, 12, 255, 255]);
    }
}
