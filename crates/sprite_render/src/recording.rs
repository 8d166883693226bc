//! Headless `GraphicsContext` that records every call.
//!
//! Draws are resolved through the transform stack at record time, so callers
//! can assert on final resolution-space corner positions without a GPU.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;

use crate::asset::PixelBuffer;
use crate::error::GfxError;
use crate::gfx::{GraphicsContext, TextureHandle, TransformStack};
use crate::vertex::QuadVertex;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnQuad {
    pub texture: Option<TextureHandle>,
    /// Corners after the current transform was applied.
    pub corners: [Vec2; 4],
    pub tex_coords: [[f32; 2]; 4],
}

impl DrawnQuad {
    pub fn top_left(&self) -> Vec2 {
        self.corners[0]
    }

    /// Axis-aligned size of the drawn quad (valid for unrotated draws).
    pub fn size(&self) -> Vec2 {
        self.corners[2] - self.corners[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    CreateTexture {
        texture: TextureHandle,
        label: String,
        width: u32,
        height: u32,
    },
    DeleteTexture(TextureHandle),
    BindTexture(TextureHandle),
    PushTransform,
    PopTransform,
    Translate(Vec2),
    Rotate(f32),
    DrawQuad(DrawnQuad),
}

#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    transform: TransformStack,
    bound: Option<TextureHandle>,
    live: HashSet<TextureHandle>,
    next_texture_id: u32,
    errors: VecDeque<GfxError>,
    fail_texture_labels: HashSet<String>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            next_texture_id: 1,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn draws(&self) -> Vec<&DrawnQuad> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawQuad(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn draws_with(&self, texture: TextureHandle) -> Vec<&DrawnQuad> {
        self.draws()
            .into_iter()
            .filter(|q| q.texture == Some(texture))
            .collect()
    }

    pub fn deleted_textures(&self) -> Vec<TextureHandle> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DeleteTexture(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn live_texture_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, texture: TextureHandle) -> bool {
        self.live.contains(&texture)
    }

    pub fn transform_depth(&self) -> usize {
        self.transform.depth()
    }

    /// Make `create_texture` fail for the given label.
    pub fn fail_texture(&mut self, label: &str) {
        self.fail_texture_labels.insert(label.to_string());
    }

    /// Queue an error as if the device had raised it.
    pub fn inject_error(&mut self, err: GfxError) {
        self.errors.push_back(err);
    }
}

impl GraphicsContext for RecordingContext {
    fn create_texture(
        &mut self,
        pixels: &PixelBuffer,
        label: &str,
    ) -> Result<TextureHandle, GfxError> {
        if self.fail_texture_labels.contains(label) {
            return Err(GfxError::TextureCreation {
                label: label.to_string(),
                message: "rejected by recording context".to_string(),
            });
        }
        let texture = TextureHandle(self.next_texture_id.max(1));
        self.next_texture_id = texture.0 + 1;
        self.live.insert(texture);
        self.commands.push(DrawCommand::CreateTexture {
            texture,
            label: label.to_string(),
            width: pixels.width,
            height: pixels.height,
        });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if !self.live.remove(&texture) {
            self.errors.push_back(GfxError::InvalidTexture(texture.0));
        }
        if self.bound == Some(texture) {
            self.bound = None;
        }
        self.commands.push(DrawCommand::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        if !self.live.contains(&texture) {
            self.errors.push_back(GfxError::InvalidTexture(texture.0));
        }
        self.bound = Some(texture);
        self.commands.push(DrawCommand::BindTexture(texture));
    }

    fn push_transform(&mut self) {
        self.transform.push();
        self.commands.push(DrawCommand::PushTransform);
    }

    fn pop_transform(&mut self) {
        if !self.transform.pop() {
            self.errors.push_back(GfxError::StackUnderflow);
        }
        self.commands.push(DrawCommand::PopTransform);
    }

    fn translate(&mut self, offset: Vec2) {
        self.transform.translate(offset);
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn rotate(&mut self, degrees: f32) {
        self.transform.rotate(degrees);
        self.commands.push(DrawCommand::Rotate(degrees));
    }

    fn draw_quad(&mut self, quad: &[QuadVertex; 4]) {
        let corners = quad.map(|v| self.transform.transform_point(Vec2::from(v.position)));
        let tex_coords = quad.map(|v| v.tex_coords);
        self.commands.push(DrawCommand::DrawQuad(DrawnQuad {
            texture: self.bound,
            corners,
            tex_coords,
        }));
    }

    fn take_error(&mut self) -> Option<GfxError> {
        self.errors.pop_front()
    }
}
