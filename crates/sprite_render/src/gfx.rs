//! Graphics boundary used by sprites and sheets.
//!
//! `GraphicsContext` is a small immediate-mode 2D capability in the style of a
//! fixed-function pipeline: a bound texture, a matrix stack, and a
//! "draw this quad now" call. Errors are not returned from draw calls; they
//! queue up inside the context and are polled with `take_error`, the same way
//! a GL error flag is read after a batch of calls.

use glam::{Affine2, Vec2};

use crate::asset::PixelBuffer;
use crate::error::GfxError;
use crate::vertex::QuadVertex;

/// Opaque id of a texture owned by a graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

pub trait GraphicsContext {
    fn create_texture(
        &mut self,
        pixels: &PixelBuffer,
        label: &str,
    ) -> Result<TextureHandle, GfxError>;
    fn delete_texture(&mut self, texture: TextureHandle);
    fn bind_texture(&mut self, texture: TextureHandle);
    fn push_transform(&mut self);
    fn pop_transform(&mut self);
    fn translate(&mut self, offset: Vec2);
    /// Rotate about the current origin, in degrees.
    fn rotate(&mut self, degrees: f32);
    /// Draw a quad in local space with the bound texture and current transform.
    fn draw_quad(&mut self, quad: &[QuadVertex; 4]);
    /// Pop the oldest pending error, if any.
    fn take_error(&mut self) -> Option<GfxError>;
}

/// Log every pending context error. Returns how many were drained.
pub fn drain_errors<G: GraphicsContext + ?Sized>(gfx: &mut G, during: &str) -> usize {
    let mut count = 0;
    while let Some(err) = gfx.take_error() {
        log::error!("Graphics error during {during}: {err}");
        count += 1;
    }
    count
}

/// Matrix stack shared by the context implementations.
///
/// Operations post-multiply, so the most recent `translate`/`rotate` applies
/// first to incoming vertices, matching fixed-function semantics.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Affine2,
    saved: Vec<Affine2>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            current: Affine2::IDENTITY,
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> Affine2 {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restore the last pushed transform. Returns false on underflow, leaving
    /// the current transform untouched.
    pub fn pop(&mut self) -> bool {
        match self.saved.pop() {
            Some(saved) => {
                self.current = saved;
                true
            }
            None => false,
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.current = self.current * Affine2::from_translation(offset);
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.current = self.current * Affine2::from_angle(degrees.to_radians());
    }

    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.current.transform_point2(point)
    }

    pub fn reset(&mut self) {
        self.current = Affine2::IDENTITY;
        self.saved.clear();
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn translate_moves_points() {
        let mut stack = TransformStack::new();
        stack.translate(Vec2::new(10.0, 5.0));
        assert!(approx(stack.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(11.0, 6.0)));
    }

    #[test]
    fn push_pop_restores_previous_transform() {
        let mut stack = TransformStack::new();
        stack.translate(Vec2::new(3.0, 0.0));
        stack.push();
        stack.translate(Vec2::new(100.0, 100.0));
        assert_eq!(stack.depth(), 1);
        assert!(stack.pop());
        assert!(approx(stack.transform_point(Vec2::ZERO), Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn pop_on_empty_stack_reports_underflow() {
        let mut stack = TransformStack::new();
        stack.translate(Vec2::new(1.0, 2.0));
        assert!(!stack.pop());
        assert!(approx(stack.transform_point(Vec2::ZERO), Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn rotate_about_center_keeps_center_fixed() {
        // translate(origin + center), rotate, translate(-center)
        let mut stack = TransformStack::new();
        let origin = Vec2::new(430.0, 25.0);
        let center = Vec2::new(16.0, 16.0);
        stack.translate(origin + center);
        stack.rotate(90.0);
        stack.translate(-center);

        assert!(approx(stack.transform_point(center), origin + center));
        // The local top-left corner swings around the centre.
        assert!(approx(
            stack.transform_point(Vec2::ZERO),
            Vec2::new(origin.x + 32.0, origin.y)
        ));
    }

    #[test]
    fn reset_clears_saved_state() {
        let mut stack = TransformStack::new();
        stack.push();
        stack.rotate(45.0);
        stack.reset();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), Affine2::IDENTITY);
    }
}
