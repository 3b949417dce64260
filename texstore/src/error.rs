use crate::textures::{TextureKey, TextureKind};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum TextureError {
    #[snafu(display("Invalid texture descriptor: {reason}"))]
    InvalidDescriptor { reason: String },

    #[snafu(display("The graphics context doesn't support {capability}"))]
    UnsupportedCapability { capability: &'static str },

    #[snafu(display("The graphics context didn't hand out a texture object"))]
    CreateFailed,

    #[snafu(display("Texture {key:?} doesn't exist or was already destroyed"))]
    UnknownTexture { key: TextureKey },

    #[snafu(display("Texture {key:?} is a {actual}, expected a {expected}"))]
    WrongKind {
        key: TextureKey,
        expected: TextureKind,
        actual: TextureKind,
    },
}

pub type Result<T, E = TextureError> = std::result::Result<T, E>;
