//! Renderer shell: owns the window surface, projection, clock and input, and
//! drives the scene once per redraw.

use std::sync::Arc;

use glam::Vec2;
use winit::window::Window;

use sprite_core::{FrameClock, InputState, Key};
use sprite_render::{
    drain_errors, DisplayOrientation, FsAssetSource, GpuContext, GraphicsContext, Viewport,
    WgpuBatchContext,
};

use crate::config::DemoConfig;
use crate::panel::GamePanel;

/// How often the smoothed frame rate is logged.
const FPS_LOG_INTERVAL_FRAMES: u64 = 300;

pub struct RendererShell {
    pub window: Arc<Window>,
    context: WgpuBatchContext,
    viewport: Viewport,
    clock: FrameClock,
    input: InputState,
    panel: GamePanel,
}

impl RendererShell {
    /// Configure the surface and projection, then build the scene.
    pub fn new(window: Arc<Window>, config: &DemoConfig) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone()).map_err(|e| e.to_string())?;
        let display = &config.display;
        let resolution = Vec2::new(display.resolution_width, display.resolution_height);
        let mut viewport = Viewport::new(resolution, display.orientation);
        viewport.set_surface_size(gpu.size.0, gpu.size.1);

        let grey = display.clear_grey;
        let clear_color = wgpu::Color {
            r: grey,
            g: grey,
            b: grey,
            a: 1.0,
        };
        let mut context = WgpuBatchContext::new(gpu, &viewport, clear_color);

        let assets = FsAssetSource::new(&config.asset_root);
        log::info!(
            "Loading textures from '{}' ({:?} orientation)",
            assets.root().display(),
            display.orientation
        );
        let panel = GamePanel::new(&mut context, &assets, &config.scene, resolution);
        log::debug!(
            "{} textures resident, {} KiB",
            context.texture_count(),
            context.texture_bytes() / 1024
        );

        Ok(Self {
            window,
            context,
            viewport,
            clock: FrameClock::new(),
            input: InputState::new(),
            panel,
        })
    }

    pub fn orientation(&self) -> DisplayOrientation {
        self.viewport.orientation
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.viewport.set_surface_size(width, height);
        self.context.set_projection(&self.viewport);
        log::info!("Resized to {}x{}", width, height);
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.input.pointer_position = position;
    }

    /// Queue a press at the last known pointer position.
    pub fn pointer_pressed(&mut self) {
        let position = self.input.pointer_position;
        self.input.pointer_down(position);
    }

    /// Returns true when the key asks the demo to exit.
    pub fn key_down(&mut self, key: Key) -> bool {
        self.input.key_down(key);
        self.panel.on_key_down(key);
        is_exit_key(key)
    }

    pub fn key_up(&mut self, key: Key) {
        self.input.key_up(key);
        self.panel.on_key_up(key);
    }

    pub fn frame(&mut self) {
        let (w, h) = self.context.surface_size();
        if w == 0 || h == 0 {
            return;
        }
        let dt_ms = self.clock.begin_frame();

        self.context.begin_frame();
        drive_frame(
            &mut self.panel,
            &mut self.context,
            &mut self.input,
            &self.viewport,
            dt_ms,
        );
        if !self.context.end_frame() {
            log::debug!("Frame skipped: surface unavailable");
        }
        drain_errors(&mut self.context, "present");

        if self.clock.frame_count % FPS_LOG_INTERVAL_FRAMES == 0 {
            log::debug!(
                "{:.1} fps ({:.2} ms/frame)",
                self.clock.smoothed_fps,
                self.clock.smoothed_frame_time_ms
            );
        }
    }

    /// Release scene resources. Called once on close.
    pub fn shutdown(&mut self) {
        self.panel.destroy(&mut self.context);
    }
}

/// One scene tick: forward queued pointer presses in resolution space, then
/// paint. Edge-triggered input is cleared afterwards.
pub fn drive_frame<G: GraphicsContext + ?Sized>(
    panel: &mut GamePanel,
    gfx: &mut G,
    input: &mut InputState,
    viewport: &Viewport,
    dt_ms: f32,
) {
    for position in input.drain_pointer_downs() {
        panel.on_pointer_down(viewport.map_pointer(position));
    }
    panel.paint(gfx, dt_ms);
    input.end_frame();
}

pub fn is_exit_key(key: Key) -> bool {
    matches!(key, Key::Escape | Key::Back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use sprite_render::{MemoryAssetSource, RecordingContext};

    fn scene(gfx: &mut RecordingContext) -> GamePanel {
        let assets = MemoryAssetSource::new()
            .with_image("enemy.png", 48, 384)
            .with_image("block.png", 16, 64);
        GamePanel::new(gfx, &assets, &SceneConfig::default(), Vec2::new(480.0, 272.0))
    }

    #[test]
    fn pointer_presses_are_mapped_and_centred() {
        let mut gfx = RecordingContext::new();
        let mut panel = scene(&mut gfx);
        let mut input = InputState::new();
        let mut viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Landscape);
        viewport.set_surface_size(960, 544);

        input.pointer_down(Vec2::new(480.0, 272.0));
        drive_frame(&mut panel, &mut gfx, &mut input, &viewport, 16.0);

        let spawns: Vec<Vec2> = panel.spawns().collect();
        // (480 / 960) * 480 - 48 / 2
        assert_eq!(spawns, vec![Vec2::new(240.0 - 24.0, 136.0 - 24.0)]);
        assert_eq!(input.pending_pointer_downs(), 0);
    }

    #[test]
    fn portrait_presses_use_inverse_orientation() {
        let mut gfx = RecordingContext::new();
        let mut panel = scene(&mut gfx);
        let mut input = InputState::new();
        let mut viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Portrait);
        viewport.set_surface_size(272, 480);

        // Surface top-right is the virtual top-left.
        input.pointer_down(Vec2::new(272.0, 0.0));
        drive_frame(&mut panel, &mut gfx, &mut input, &viewport, 16.0);
        let spawn = panel.spawns().next().expect("spawn");
        assert!((spawn - Vec2::new(-24.0, -24.0)).length() < 1e-3);
    }

    #[test]
    fn drive_frame_clears_key_edges() {
        let mut gfx = RecordingContext::new();
        let mut panel = scene(&mut gfx);
        let mut input = InputState::new();
        let viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Landscape);

        input.key_down(Key::Space);
        drive_frame(&mut panel, &mut gfx, &mut input, &viewport, 16.0);
        assert!(!input.is_just_pressed(Key::Space));
        assert!(input.is_held(Key::Space));
    }

    #[test]
    fn escape_and_back_exit() {
        assert!(is_exit_key(Key::Escape));
        assert!(is_exit_key(Key::Back));
        assert!(!is_exit_key(Key::Space));
    }
}
