//! Texture atlas loading.
//!
//! An atlas is one decoded image resident as a single context texture. Every
//! sprite view carved out of it holds an `Rc<AtlasTexture>`; the texture is
//! released once, by whichever view is destroyed last.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::asset::AssetSource;
use crate::error::AtlasError;
use crate::gfx::{drain_errors, GraphicsContext, TextureHandle};

#[derive(Debug)]
pub struct AtlasTexture {
    path: String,
    texture: TextureHandle,
    width: u32,
    height: u32,
    released: Cell<bool>,
}

impl AtlasTexture {
    pub fn new(path: &str, texture: TextureHandle, width: u32, height: u32) -> Self {
        Self {
            path: path.to_string(),
            texture,
            width,
            height,
            released: Cell::new(false),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    /// Delete the context texture. Returns false if it was already released.
    pub fn release<G: GraphicsContext + ?Sized>(&self, gfx: &mut G) -> bool {
        if self.released.replace(true) {
            return false;
        }
        gfx.delete_texture(self.texture);
        log::debug!("Released atlas '{}' ({:?})", self.path, self.texture);
        true
    }
}

/// Decode `path` through `assets` and upload it as a texture.
///
/// Decoding is synchronous; call this during setup, not per frame.
pub fn load_atlas<G, A>(gfx: &mut G, assets: &A, path: &str) -> Result<Rc<AtlasTexture>, AtlasError>
where
    G: GraphicsContext + ?Sized,
    A: AssetSource + ?Sized,
{
    let pixels = assets.load_pixels(path)?;
    let texture = gfx.create_texture(&pixels, path)?;
    drain_errors(gfx, "texture load");
    log::debug!(
        "Loaded atlas '{}' ({}x{}) as {:?}",
        path,
        pixels.width,
        pixels.height,
        texture
    );
    Ok(Rc::new(AtlasTexture::new(
        path,
        texture,
        pixels.width,
        pixels.height,
    )))
}
