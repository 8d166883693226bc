//! wgpu-backed `GraphicsContext`.
//!
//! Immediate-mode calls are collected on the CPU into one mesh per frame:
//! every quad is transformed through the matrix stack as it arrives, and
//! consecutive quads sharing a texture collapse into a single draw call. At
//! the end of the frame the mesh is streamed into GPU buffers that grow by
//! powers of two and never shrink.

use std::collections::{HashMap, VecDeque};

use glam::Vec2;

use crate::asset::PixelBuffer;
use crate::camera::Viewport;
use crate::error::GfxError;
use crate::gfx::{GraphicsContext, TextureHandle, TransformStack};
use crate::gpu_context::GpuContext;
use crate::sprite_pipeline::SpritePipeline;
use crate::texture::Texture;
use crate::vertex::{QuadVertex, SpriteVertex, QUAD_INDICES};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub texture: TextureHandle,
    pub index_start: u32,
    pub index_count: u32,
}

/// CPU half of the batching context: transform stack and frame mesh.
#[derive(Debug, Default)]
pub struct SpriteBatch {
    transform: TransformStack,
    bound: Option<TextureHandle>,
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop last frame's mesh and transform state.
    pub fn clear(&mut self) {
        self.transform.reset();
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn bound(&self) -> Option<TextureHandle> {
        self.bound
    }

    pub fn bind(&mut self, texture: Option<TextureHandle>) {
        self.bound = texture;
    }

    pub fn transform_mut(&mut self) -> &mut TransformStack {
        &mut self.transform
    }

    pub fn transform_depth(&self) -> usize {
        self.transform.depth()
    }

    /// Append a quad with the bound texture. Returns false when nothing is
    /// bound.
    pub fn add_quad(&mut self, quad: &[QuadVertex; 4]) -> bool {
        let Some(texture) = self.bound else {
            return false;
        };
        let base_index = self.vertices.len() as u32;
        for corner in quad {
            let position = self.transform.transform_point(Vec2::from(corner.position));
            self.vertices.push(SpriteVertex {
                position: position.to_array(),
                tex_coords: corner.tex_coords,
                color: WHITE,
            });
        }
        let draw_start = self.indices.len() as u32;
        self.indices
            .extend(QUAD_INDICES.iter().map(|i| base_index + i));
        push_draw_call(&mut self.draw_calls, texture, draw_start, QUAD_INDICES.len() as u32);
        true
    }
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture: TextureHandle,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if last.texture == texture && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture,
        index_start,
        index_count,
    });
}

fn count_texture_binds(draw_calls: &[DrawCall]) -> usize {
    let mut binds = 0usize;
    let mut current = None;
    for draw in draw_calls {
        if current != Some(draw.texture) {
            current = Some(draw.texture);
            binds += 1;
        }
    }
    binds
}

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

pub struct WgpuBatchContext {
    gpu: GpuContext,
    pipeline: SpritePipeline,
    textures: HashMap<TextureHandle, GpuSpriteTexture>,
    next_texture_id: u32,
    batch: SpriteBatch,
    errors: VecDeque<GfxError>,
    clear_color: wgpu::Color,

    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl WgpuBatchContext {
    pub fn new(gpu: GpuContext, viewport: &Viewport, clear_color: wgpu::Color) -> Self {
        use wgpu::util::DeviceExt;

        let pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[viewport.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut context = Self {
            gpu,
            pipeline,
            textures: HashMap::new(),
            next_texture_id: 1,
            batch: SpriteBatch::new(),
            errors: VecDeque::new(),
            clear_color,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        };
        context.ensure_mesh_capacity(4, 6);
        context
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.gpu.size
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn set_projection(&mut self, viewport: &Viewport) {
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[viewport.build_uniform()]),
        );
    }

    /// Start collecting a new frame.
    pub fn begin_frame(&mut self) {
        self.batch.clear();
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Bytes of texture memory currently resident.
    pub fn texture_bytes(&self) -> u64 {
        self.textures.values().map(|t| t.texture.byte_size()).sum()
    }

    /// Upload the collected mesh, clear, draw, and present. Returns false if
    /// the surface was unavailable and the frame was skipped.
    pub fn end_frame(&mut self) -> bool {
        if self.batch.transform_depth() != 0 {
            log::warn!(
                "Frame ended with {} unpopped transforms",
                self.batch.transform_depth()
            );
        }
        let vertex_count = self.batch.vertices().len();
        let index_count = self.batch.indices().len();
        self.ensure_mesh_capacity(vertex_count, index_count);
        if vertex_count > 0 {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(self.batch.vertices()),
            );
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(self.batch.indices()));
        }

        let (output, view) = match self.gpu.begin_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return false,
            Err(err) => {
                self.errors.push_back(err);
                return false;
            }
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut last_bound: Option<TextureHandle> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in self.batch.draw_calls() {
                // Textures deleted mid-frame are skipped.
                if let Some(texture) = self.textures.get(&draw.texture) {
                    if last_bound != Some(draw.texture) {
                        render_pass.set_bind_group(1, &texture.bind_group, &[]);
                        last_bound = Some(draw.texture);
                    }
                    render_pass.draw_indexed(
                        draw.index_start..(draw.index_start + draw.index_count),
                        0,
                        0..1,
                    );
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        log::trace!(
            "Frame: {} quads, {} draw calls, {} texture binds",
            self.batch.quad_count(),
            self.batch.draw_calls().len(),
            count_texture_binds(self.batch.draw_calls())
        );
        true
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }
}

impl GraphicsContext for WgpuBatchContext {
    fn create_texture(
        &mut self,
        pixels: &PixelBuffer,
        label: &str,
    ) -> Result<TextureHandle, GfxError> {
        let max = self.gpu.max_texture_dimension();
        if pixels.width == 0 || pixels.height == 0 || pixels.width > max || pixels.height > max {
            return Err(GfxError::TextureCreation {
                label: label.to_string(),
                message: format!(
                    "size {}x{} outside 1..={} texels",
                    pixels.width, pixels.height, max
                ),
            });
        }

        self.gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = Texture::from_pixels(&self.gpu.device, &self.gpu.queue, pixels, label);
        let bind_group = self
            .pipeline
            .create_texture_bind_group(&self.gpu.device, &texture);
        if let Some(err) = pollster::block_on(self.gpu.device.pop_error_scope()) {
            return Err(GfxError::TextureCreation {
                label: label.to_string(),
                message: err.to_string(),
            });
        }

        let handle = TextureHandle(self.next_texture_id);
        self.next_texture_id += 1;
        self.textures.insert(
            handle,
            GpuSpriteTexture {
                texture,
                bind_group,
            },
        );
        log::debug!(
            "Uploaded texture '{}' ({}x{}) as {:?}",
            label,
            pixels.width,
            pixels.height,
            handle
        );
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            self.errors.push_back(GfxError::InvalidTexture(texture.0));
        }
        if self.batch.bound() == Some(texture) {
            self.batch.bind(None);
        }
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        if self.textures.contains_key(&texture) {
            self.batch.bind(Some(texture));
        } else {
            self.errors.push_back(GfxError::InvalidTexture(texture.0));
            self.batch.bind(None);
        }
    }

    fn push_transform(&mut self) {
        self.batch.transform_mut().push();
    }

    fn pop_transform(&mut self) {
        if !self.batch.transform_mut().pop() {
            self.errors.push_back(GfxError::StackUnderflow);
        }
    }

    fn translate(&mut self, offset: Vec2) {
        self.batch.transform_mut().translate(offset);
    }

    fn rotate(&mut self, degrees: f32) {
        self.batch.transform_mut().rotate(degrees);
    }

    fn draw_quad(&mut self, quad: &[QuadVertex; 4]) {
        if !self.batch.add_quad(quad) {
            log::trace!("Quad dropped: no texture bound");
        }
    }

    fn take_error(&mut self) -> Option<GfxError> {
        self.errors.pop_front()
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
