//! Texture resource management on top of a stateful, GL-style graphics context.
//!
//! A [`GraphicsSession`] turns [`TextureSource`] descriptors (colors, image URLs, cube-map URL
//! sets, decoded surfaces, raw pixels) into GPU textures, deduplicates them by source identity
//! and applies asynchronously fetched images once they arrive. Images are uploaded with
//! filtering chosen by the [`MipmapPolicy`], and context loss drops all per-context state.
//!
//! ```no_run
//! use texstore::{GraphicsSession, RecordingContext, TextureSource};
//!
//! # fn main() -> texstore::Result<()> {
//! let mut session = GraphicsSession::with_files(RecordingContext::default(), "assets");
//!
//! let red = session.resolve([255.0, 0.0, 0.0, 255.0])?;
//! let sky = session.resolve(TextureSource::from(["skybox.png"]))?;
//!
//! futures::executor::block_on(session.loads_settled());
//! session.bind_to_unit(red, 0)?;
//! session.bind_to_unit(sky, 1)?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod context;
pub mod error;
pub mod loading;
pub mod session;
pub mod source;
pub mod textures;

pub use context::{Capabilities, GraphicsContext, RecordingContext};
pub use error::{Result, TextureError};
pub use loading::{FetchError, ImageFetcher, ImageLoadCoordinator};
pub use session::{GraphicsSession, LoadOptions, SessionConfig};
pub use source::{PixelData, Surface, TextureSource};
pub use textures::{MipmapPolicy, Texture, TextureKey, TextureResource};

pub use ::image;
pub use ::tracing;
