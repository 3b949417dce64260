//! Asynchronous image fetching.
//!
//! A session hands every URL it needs to an [`ImageFetcher`] and parks the returned future in
//! its [`ImageLoadCoordinator`]. The host pumps the session, which polls the coordinator and
//! applies finished images to their textures.

mod coordinator;
#[cfg(feature = "file-fetcher")]
mod file;

pub use coordinator::{CompletedLoad, ImageLoadCoordinator};
#[cfg(feature = "file-fetcher")]
pub use file::FileFetcher;

use crate::textures::TextureKey;
use futures::future::BoxFuture;
use image::RgbaImage;
use snafu::Snafu;
use std::fmt::{Display, Formatter};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub))]
pub enum FetchError {
    #[snafu(display("Failed to read image {url}: {source}"))]
    Io {
        url: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to decode image {url}: {source}"))]
    Decode {
        url: String,
        source: image::ImageError,
    },

    #[snafu(display("Loading image {url} was cancelled"))]
    Cancelled { url: String },

    #[snafu(display("Image {url} couldn't be fetched: {reason}"))]
    Remote { url: String, reason: String },
}

pub type ImageFuture = BoxFuture<'static, Result<RgbaImage, FetchError>>;

/// Turns a URL into a decoded image.
///
/// Implemented for closures, so tests and hosts can plug in their own transport.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> ImageFuture;
}

impl<F> ImageFetcher for F
where
    F: Fn(&str) -> ImageFuture,
{
    fn fetch(&self, url: &str) -> ImageFuture {
        self(url)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LoadId(u64);

impl LoadId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Display for LoadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a finished load goes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LoadTarget {
    Image(TextureKey),
    CubeFace { key: TextureKey, face: usize },
}

impl LoadTarget {
    pub fn key(self) -> TextureKey {
        match self {
            LoadTarget::Image(key) | LoadTarget::CubeFace { key, .. } => key,
        }
    }
}
