//! Asset boundary: resolve a named image to a decoded RGBA pixel buffer.
//!
//! Sprite and sheet construction only ever sees the `AssetSource` trait, so
//! the same code runs against the filesystem, an in-memory pack, or any
//! platform archive the host wires in.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::AssetError;

/// Decoded image, tightly packed RGBA8 rows, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PixelBuffer {
    /// Solid-colour buffer. Used for fallbacks and tests.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            rgba: data,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

pub trait AssetSource {
    fn load_pixels(&self, path: &str) -> Result<PixelBuffer, AssetError>;
}

/// Decode PNG bytes (the only format the workspace enables) into RGBA8.
pub fn decode_image(path: &str, bytes: &[u8]) -> Result<PixelBuffer, AssetError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| AssetError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(AssetError::EmptyImage(path.to_string()));
    }
    Ok(PixelBuffer {
        width,
        height,
        rgba: image.into_raw(),
    })
}

/// Reads assets relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    fn load_pixels(&self, path: &str) -> Result<PixelBuffer, AssetError> {
        let full_path = self.root.join(path);
        let bytes = fs::read(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AssetError::NotFound(full_path.display().to_string())
            } else {
                AssetError::Io {
                    path: full_path.display().to_string(),
                    source: e,
                }
            }
        })?;
        decode_image(path, &bytes)
    }
}

/// In-memory asset pack keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    images: HashMap<String, PixelBuffer>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, pixels: PixelBuffer) {
        self.images.insert(path.to_string(), pixels);
    }

    /// Decode and store encoded image bytes.
    pub fn insert_encoded(&mut self, path: &str, bytes: &[u8]) -> Result<(), AssetError> {
        let pixels = decode_image(path, bytes)?;
        self.insert(path, pixels);
        Ok(())
    }

    pub fn with_image(mut self, path: &str, width: u32, height: u32) -> Self {
        self.insert(path, PixelBuffer::filled(width, height, [255, 255, 255, 255]));
        self
    }
}

impl AssetSource for MemoryAssetSource {
    fn load_pixels(&self, path: &str) -> Result<PixelBuffer, AssetError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}
