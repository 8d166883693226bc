use thiserror::Error;

/// Failure to turn a named asset into a decoded pixel buffer.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset '{0}' not found")]
    NotFound(String),
    #[error("failed to read asset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode asset '{path}': {message}")]
    Decode { path: String, message: String },
    #[error("asset '{0}' decoded to an empty image")]
    EmptyImage(String),
}

/// Errors raised by, or polled from, a graphics context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GfxError {
    #[error("texture creation failed for '{label}': {message}")]
    TextureCreation { label: String, message: String },
    #[error("texture handle {0} is not live")]
    InvalidTexture(u32),
    #[error("transform stack underflow")]
    StackUnderflow,
    #[error("graphics device error: {0}")]
    Device(String),
}

/// Atlas loading combines the asset and graphics failure paths.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Gfx(#[from] GfxError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpriteError {
    #[error("sprite has no atlas texture")]
    Absent,
    #[error("clip {x},{y} {w}x{h} lies outside the {atlas_w}x{atlas_h} atlas")]
    ClipOutOfBounds {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        atlas_w: f32,
        atlas_h: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    #[error("frame index {index} out of range (sheet has {frame_count} frames)")]
    InvalidFrameIndex { index: usize, frame_count: usize },
    #[error("frame {0} failed to slice and has no sprite")]
    MissingFrame(usize),
}
