//! Pixel rectangles and normalized texture-coordinate rectangles.
//!
//! A `Rect` is always expressed in atlas pixels with a top-left origin. A
//! `UvRect` is the same region divided by the atlas size, so every component
//! of a valid clip lands in `[0, 1]`.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin covering `w` x `h` pixels.
    pub const fn from_size(w: f32, h: f32) -> Self {
        Self { x: 0.0, y: 0.0, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// True when the rectangle has positive area and lies fully inside a
    /// `width` x `height` image anchored at the origin.
    pub fn fits_within(&self, width: f32, height: f32) -> bool {
        self.w > 0.0
            && self.h > 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= width
            && self.bottom() <= height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UvRect {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl UvRect {
    /// Full texture.
    pub const FULL: UvRect = UvRect {
        u_min: 0.0,
        v_min: 0.0,
        u_max: 1.0,
        v_max: 1.0,
    };

    /// Normalize a pixel clip against the atlas size.
    ///
    /// A zero-sized atlas yields an all-zero rect instead of NaN so degraded
    /// sprites keep comparable state.
    pub fn from_clip(clip: Rect, atlas_width: f32, atlas_height: f32) -> Self {
        if atlas_width <= 0.0 || atlas_height <= 0.0 {
            return Self::default();
        }
        Self {
            u_min: clip.x / atlas_width,
            v_min: clip.y / atlas_height,
            u_max: clip.right() / atlas_width,
            v_max: clip.bottom() / atlas_height,
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.u_min, self.v_min, self.u_max, self.v_max]
    }
}
