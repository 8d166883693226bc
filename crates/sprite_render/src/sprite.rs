//! A sprite is a view onto a rectangular region of an atlas.
//!
//! The view owns only clip/UV state and a four-corner quad; the texture lives
//! in the shared `AtlasTexture`. Cloning a sprite (or `sub_image`) yields an
//! independent view over the same atlas.
//!
//! Invariants kept by every mutator:
//!  - `uv` is always the clip rect divided by the atlas size, except while a
//!    crop narrows `u_max`/`v_max`.
//!  - quad corners span the clip size (or the crop size while cropped) at the
//!    local origin: top-left, top-right, bottom-right, bottom-left.
//!  - flipping mirrors the quad's U coordinates without touching `uv`.
//!
//! A sprite whose atlas failed to load is *absent*: it keeps a zero-sized
//! clip and every draw is a no-op.

use std::rc::Rc;

use glam::Vec2;
use sprite_core::{Rect, UvRect};

use crate::asset::AssetSource;
use crate::atlas::{load_atlas, AtlasTexture};
use crate::error::{AtlasError, SpriteError};
use crate::gfx::GraphicsContext;
use crate::vertex::QuadVertex;

/// Which way a directional draw should face.
///
/// Sheet art is authored facing left, so `Right` draws the mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    fn flipped(self) -> bool {
        matches!(self, Facing::Right)
    }
}

#[derive(Debug, Clone)]
pub struct Sprite {
    atlas: Option<Rc<AtlasTexture>>,
    position: Vec2,
    atlas_size: Vec2,
    clip: Rect,
    uv: UvRect,
    flipped: bool,
    crop: Option<Vec2>,
    quad: [QuadVertex; 4],
    destroyed: bool,
}

impl Sprite {
    /// View over the whole atlas.
    pub fn new(atlas: Rc<AtlasTexture>) -> Self {
        let atlas_size = atlas.size();
        let clip = Rect::from_size(atlas_size.x, atlas_size.y);
        Self::from_parts(Some(atlas), atlas_size, clip)
    }

    /// View over `clip` inside the atlas.
    pub fn with_clip(atlas: Rc<AtlasTexture>, clip: Rect) -> Result<Self, SpriteError> {
        let mut sprite = Self::new(atlas);
        sprite.set_clip(clip)?;
        Ok(sprite)
    }

    /// Degraded sprite with no atlas.
    pub fn absent() -> Self {
        Self::from_parts(None, Vec2::ZERO, Rect::default())
    }

    pub fn try_load<G, A>(gfx: &mut G, assets: &A, path: &str) -> Result<Self, AtlasError>
    where
        G: GraphicsContext + ?Sized,
        A: AssetSource + ?Sized,
    {
        Ok(Self::new(load_atlas(gfx, assets, path)?))
    }

    /// Load a full-atlas sprite, degrading to an absent sprite on failure.
    pub fn load<G, A>(gfx: &mut G, assets: &A, path: &str) -> Self
    where
        G: GraphicsContext + ?Sized,
        A: AssetSource + ?Sized,
    {
        match Self::try_load(gfx, assets, path) {
            Ok(sprite) => sprite,
            Err(err) => {
                log::error!("Error loading sprite '{}': {}", path, err);
                Self::absent()
            }
        }
    }

    fn from_parts(atlas: Option<Rc<AtlasTexture>>, atlas_size: Vec2, clip: Rect) -> Self {
        let mut sprite = Self {
            atlas,
            position: Vec2::ZERO,
            atlas_size,
            clip,
            uv: UvRect::from_clip(clip, atlas_size.x, atlas_size.y),
            flipped: false,
            crop: None,
            quad: [QuadVertex {
                position: [0.0, 0.0],
                tex_coords: [0.0, 0.0],
            }; 4],
            destroyed: false,
        };
        sprite.rebuild_quad();
        sprite
    }

    pub fn is_absent(&self) -> bool {
        self.atlas.is_none()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn atlas(&self) -> Option<&Rc<AtlasTexture>> {
        self.atlas.as_ref()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn atlas_size(&self) -> Vec2 {
        self.atlas_size
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    pub fn uv(&self) -> UvRect {
        self.uv
    }

    pub fn quad(&self) -> &[QuadVertex; 4] {
        &self.quad
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn is_cropped(&self) -> bool {
        self.crop.is_some()
    }

    /// Size of the quad currently drawn (crop size while cropped).
    pub fn draw_size(&self) -> Vec2 {
        self.crop.unwrap_or(Vec2::new(self.clip.w, self.clip.h))
    }

    /// Re-clip the view. Clears any active crop.
    pub fn set_clip(&mut self, clip: Rect) -> Result<(), SpriteError> {
        if self.atlas.is_none() {
            return Err(SpriteError::Absent);
        }
        if !clip.fits_within(self.atlas_size.x, self.atlas_size.y) {
            return Err(SpriteError::ClipOutOfBounds {
                x: clip.x,
                y: clip.y,
                w: clip.w,
                h: clip.h,
                atlas_w: self.atlas_size.x,
                atlas_h: self.atlas_size.y,
            });
        }
        self.clip = clip;
        self.uv = UvRect::from_clip(clip, self.atlas_size.x, self.atlas_size.y);
        self.crop = None;
        self.rebuild_quad();
        Ok(())
    }

    /// Mirror the quad horizontally. Requesting the current state is a no-op.
    pub fn flip_horizontal(&mut self, on: bool) {
        if self.flipped == on {
            return;
        }
        self.flipped = on;
        self.rebuild_quad();
    }

    /// Narrow the view to its top-left `w` x `h` pixels, or restore it.
    ///
    /// `w > 0 && h > 0` crops when not already cropped; `(0, 0)` restores
    /// when cropped. Every other combination, including negative sizes and
    /// re-cropping without restoring first, leaves the sprite unchanged.
    pub fn crop_to(&mut self, w: f32, h: f32) {
        if self.atlas.is_none() {
            return;
        }
        if w > 0.0 && h > 0.0 && self.crop.is_none() {
            self.uv = UvRect::from_clip(
                Rect::new(self.clip.x, self.clip.y, w, h),
                self.atlas_size.x,
                self.atlas_size.y,
            );
            self.crop = Some(Vec2::new(w, h));
            self.rebuild_quad();
        } else if w == 0.0 && h == 0.0 && self.crop.is_some() {
            self.uv = UvRect::from_clip(self.clip, self.atlas_size.x, self.atlas_size.y);
            self.crop = None;
            self.rebuild_quad();
        }
    }

    fn rebuild_quad(&mut self) {
        let size = self.draw_size();
        let (u_left, u_right) = if self.flipped {
            (self.uv.u_max, self.uv.u_min)
        } else {
            (self.uv.u_min, self.uv.u_max)
        };
        let (v_top, v_bottom) = (self.uv.v_min, self.uv.v_max);
        self.quad = [
            QuadVertex {
                position: [0.0, 0.0],
                tex_coords: [u_left, v_top],
            },
            QuadVertex {
                position: [size.x, 0.0],
                tex_coords: [u_right, v_top],
            },
            QuadVertex {
                position: [size.x, size.y],
                tex_coords: [u_right, v_bottom],
            },
            QuadVertex {
                position: [0.0, size.y],
                tex_coords: [u_left, v_bottom],
            },
        ];
    }

    fn drawable(&self) -> Option<&Rc<AtlasTexture>> {
        if self.destroyed {
            return None;
        }
        self.atlas.as_ref()
    }

    /// Draw at `origin` (top-left, resolution space).
    pub fn draw<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G, origin: Vec2) {
        self.position = origin;
        let Some(atlas) = self.drawable() else {
            return;
        };
        gfx.bind_texture(atlas.texture());
        gfx.push_transform();
        gfx.translate(origin);
        gfx.draw_quad(&self.quad);
        gfx.pop_transform();
    }

    /// Draw at `origin`, rotated by `degrees` about `center` (local space).
    pub fn draw_rotated<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        origin: Vec2,
        degrees: f32,
        center: Vec2,
    ) {
        self.position = origin;
        let Some(atlas) = self.drawable() else {
            return;
        };
        gfx.bind_texture(atlas.texture());
        gfx.push_transform();
        gfx.translate(origin + center);
        gfx.rotate(degrees);
        gfx.translate(-center);
        gfx.draw_quad(&self.quad);
        gfx.pop_transform();
    }

    /// Tile the view over a `repeat_w` x `repeat_h` area starting at `origin`.
    ///
    /// Whole tiles are drawn at the clip size; the last column and row are
    /// cropped to the remainder. Negative sizes draw nothing. The sprite is
    /// left uncropped afterwards.
    pub fn draw_repeated<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        origin: Vec2,
        repeat_w: f32,
        repeat_h: f32,
    ) {
        let valid = |size: f32| size.is_finite() && size >= 0.0;
        if !valid(repeat_w) || !valid(repeat_h) || self.drawable().is_none() {
            return;
        }
        let (tile_w, tile_h) = (self.clip.w, self.clip.h);
        if tile_w <= 0.0 || tile_h <= 0.0 {
            return;
        }

        let columns = (repeat_w / tile_w).ceil() as usize;
        let rows = (repeat_h / tile_h).ceil() as usize;
        for col in 0..columns {
            let x = col as f32 * tile_w;
            let sub_w = (repeat_w - x).min(tile_w);
            for row in 0..rows {
                let y = row as f32 * tile_h;
                let sub_h = (repeat_h - y).min(tile_h);

                self.crop_to(0.0, 0.0);
                if sub_w < tile_w || sub_h < tile_h {
                    self.crop_to(sub_w, sub_h);
                }
                self.draw(gfx, origin + Vec2::new(x, y));
            }
        }
        self.crop_to(0.0, 0.0);
        self.position = origin;
    }

    pub fn draw_facing<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        facing: Facing,
        origin: Vec2,
    ) {
        self.flip_horizontal(facing.flipped());
        self.draw(gfx, origin);
    }

    pub fn draw_facing_rotated<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        facing: Facing,
        origin: Vec2,
        degrees: f32,
        center: Vec2,
    ) {
        self.flip_horizontal(facing.flipped());
        self.draw_rotated(gfx, origin, degrees, center);
    }

    /// Independent view over `clip`, sharing this sprite's atlas.
    pub fn sub_image(&self, clip: Rect) -> Result<Sprite, SpriteError> {
        if self.destroyed {
            return Err(SpriteError::Absent);
        }
        let mut view = self.clone();
        view.set_clip(clip)?;
        Ok(view)
    }

    /// Release this view. The atlas texture is deleted when this is the last
    /// view holding it. Calling twice is harmless.
    pub fn destroy<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(atlas) = self.atlas.take() {
            if Rc::strong_count(&atlas) == 1 {
                atlas.release(gfx);
            }
        }
    }
}
