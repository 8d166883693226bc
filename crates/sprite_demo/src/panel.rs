//! The demo scene: a scrolling background, a rotating moon, a player running
//! across a strip of animated terrain, and enemies spawned wherever the
//! pointer goes down.
//!
//! `GamePanel` knows nothing about windows or GPUs. It draws through any
//! `GraphicsContext` and works entirely in internal-resolution pixels.

use std::collections::VecDeque;

use glam::Vec2;
use sprite_core::{FrameCounter, FrameLimiter, Key};
use sprite_render::{
    drain_errors, AssetSource, Facing, GraphicsContext, SheetError, Sprite, SpriteSheet,
};

use crate::config::SceneConfig;

pub struct GamePanel {
    resolution: Vec2,

    background: Sprite,
    moon: Sprite,
    player: SpriteSheet,
    enemy: SpriteSheet,
    block: SpriteSheet,

    player_frames: FrameCounter,
    enemy_frames: FrameCounter,
    block_frames: FrameCounter,
    limiter: FrameLimiter,

    moon_angle: f32,
    moon_step_deg: f32,
    moon_inset: Vec2,
    player_x: f32,
    player_start_x: f32,
    player_speed: f32,

    spawns: VecDeque<Vec2>,
    spawn_capacity: usize,
    destroyed: bool,
}

impl GamePanel {
    /// Load every sprite and sheet. Missing textures are logged and leave the
    /// matching entity invisible; construction itself never fails.
    pub fn new<G, A>(gfx: &mut G, assets: &A, config: &SceneConfig, resolution: Vec2) -> Self
    where
        G: GraphicsContext + ?Sized,
        A: AssetSource + ?Sized,
    {
        let stride = config.fallback_stride;
        let background = Sprite::load(gfx, assets, &config.background);
        let moon = Sprite::load(gfx, assets, &config.moon);
        let player =
            SpriteSheet::load(gfx, assets, &config.player.path, config.player.grid(stride));
        let enemy = SpriteSheet::load(gfx, assets, &config.enemy.path, config.enemy.grid(stride));
        let block = SpriteSheet::load(gfx, assets, &config.block.path, config.block.grid(stride));
        drain_errors(gfx, "scene load");

        log::info!(
            "Scene loaded at {}x{} ({} enemy spawns max)",
            resolution.x,
            resolution.y,
            config.spawn_capacity
        );

        Self {
            resolution,
            background,
            moon,
            player,
            enemy,
            block,
            player_frames: FrameCounter::new(config.player.animation),
            enemy_frames: FrameCounter::new(config.enemy.animation),
            block_frames: FrameCounter::new(config.block.animation),
            limiter: FrameLimiter::new(config.animation_divisor),
            moon_angle: 0.0,
            moon_step_deg: config.moon_step_deg,
            moon_inset: Vec2::new(config.moon_inset_x, config.moon_inset_y),
            player_x: config.player_start_x,
            player_start_x: config.player_start_x,
            player_speed: config.player_speed,
            spawns: VecDeque::new(),
            spawn_capacity: config.spawn_capacity.max(1),
            destroyed: false,
        }
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    pub fn moon_angle(&self) -> f32 {
        self.moon_angle
    }

    pub fn player_x(&self) -> f32 {
        self.player_x
    }

    /// Top-left of the player: standing on the terrain strip.
    pub fn player_position(&self) -> Vec2 {
        Vec2::new(
            self.player_x,
            self.resolution.y - self.block.frame_height() - self.player.frame_height(),
        )
    }

    pub fn moon_origin(&self) -> Vec2 {
        Vec2::new(self.resolution.x - self.moon_inset.x, self.moon_inset.y)
    }

    pub fn player_frame(&self) -> usize {
        self.player_frames.current()
    }

    pub fn enemy_frame(&self) -> usize {
        self.enemy_frames.current()
    }

    pub fn block_frame(&self) -> usize {
        self.block_frames.current()
    }

    pub fn spawns(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.spawns.iter().copied()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.len()
    }

    pub fn terrain_tile_count(&self) -> usize {
        let width = self.block.frame_width();
        if width <= 0.0 {
            return 0;
        }
        (self.resolution.x / width).ceil() as usize
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Advance the scene by `dt_ms` and draw one frame.
    pub fn paint<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G, dt_ms: f32) {
        if self.destroyed {
            return;
        }

        self.background.draw(gfx, Vec2::ZERO);
        drain_errors(gfx, "background draw");

        self.moon_angle -= self.moon_step_deg;
        if self.moon_angle <= 0.0 {
            self.moon_angle += 360.0;
        }
        let moon_origin = self.moon_origin();
        let moon_center = self.moon.atlas_size() / 2.0;
        self.moon
            .draw_facing_rotated(gfx, Facing::Right, moon_origin, self.moon_angle, moon_center);
        drain_errors(gfx, "moon draw");

        self.player_x += self.player_speed * dt_ms;
        if self.player_x > self.resolution.x {
            self.player_x = self.player_start_x;
        }
        // Sheets without an atlas were reported at load and stay invisible.
        if !self.player.is_absent() {
            let player_position = self.player_position();
            let result = self.player.draw_frame_facing(
                gfx,
                self.player_frames.current(),
                Facing::Right,
                player_position,
            );
            report_sheet_error("player", result);
            drain_errors(gfx, "player draw");
        }

        if !self.enemy.is_absent() {
            let enemy_frame = self.enemy_frames.current();
            for spawn in &self.spawns {
                let result = self
                    .enemy
                    .draw_frame_facing(gfx, enemy_frame, Facing::Right, *spawn);
                report_sheet_error("enemy", result);
            }
            drain_errors(gfx, "enemy draw");
        }

        if !self.block.is_absent() {
            let block_frame = self.block_frames.current();
            let tile_width = self.block.frame_width();
            let ground_y = self.resolution.y - self.block.frame_height();
            for i in 0..self.terrain_tile_count() {
                let origin = Vec2::new(i as f32 * tile_width, ground_y);
                let result = self.block.draw_frame(gfx, block_frame, origin);
                report_sheet_error("terrain", result);
            }
            drain_errors(gfx, "terrain draw");
        }

        if self.limiter.tick() {
            self.player_frames.advance();
            self.enemy_frames.advance();
            self.block_frames.advance();
            log::trace!(
                "Animation frames: player {}, enemy {}, block {}",
                self.player_frames.current(),
                self.enemy_frames.current(),
                self.block_frames.current()
            );
        }
    }

    /// Spawn an enemy centred on `position` (internal-resolution pixels).
    pub fn on_pointer_down(&mut self, position: Vec2) {
        let half = Vec2::new(self.enemy.frame_width(), self.enemy.frame_height()) / 2.0;
        self.spawns.push_back(position - half);
        if self.spawns.len() > self.spawn_capacity {
            self.spawns.pop_front();
            log::debug!("Spawn list full, dropped oldest enemy");
        }
        log::debug!(
            "Enemy spawned at ({:.1}, {:.1}), {} total",
            position.x - half.x,
            position.y - half.y,
            self.spawns.len()
        );
    }

    pub fn on_key_down(&mut self, key: Key) {
        log::debug!("Key down: {:?}", key);
    }

    pub fn on_key_up(&mut self, key: Key) {
        log::debug!("Key up: {:?}", key);
    }

    /// Release every texture the scene holds. Safe to call more than once.
    pub fn destroy<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.background.destroy(gfx);
        self.moon.destroy(gfx);
        self.player.destroy(gfx);
        self.enemy.destroy(gfx);
        self.block.destroy(gfx);
        self.spawns.clear();
        drain_errors(gfx, "scene teardown");
        log::info!("Scene resources released");
    }
}

fn report_sheet_error(entity: &str, result: Result<(), SheetError>) {
    if let Err(err) = result {
        log::error!("Failed to draw {entity}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use sprite_core::FrameRange;
    use sprite_render::{MemoryAssetSource, RecordingContext, TextureHandle};

    const RESOLUTION: Vec2 = Vec2::new(480.0, 272.0);

    thread_local! {
        static ERROR_RECORDS: Cell<usize> = const { Cell::new(0) };
    }

    /// Counts error-level records emitted on the current test thread.
    struct ErrorCounter;

    impl log::Log for ErrorCounter {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Error
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                ERROR_RECORDS.with(|count| count.set(count.get() + 1));
            }
        }

        fn flush(&self) {}
    }

    static ERROR_COUNTER: ErrorCounter = ErrorCounter;

    fn install_error_counter() {
        // Another test may already have installed it.
        let _ = log::set_logger(&ERROR_COUNTER);
        log::set_max_level(log::LevelFilter::Error);
    }

    fn stock_assets() -> MemoryAssetSource {
        MemoryAssetSource::new()
            .with_image("background.png", 480, 272)
            .with_image("moon.png", 32, 32)
            .with_image("player.png", 64, 224)
            .with_image("enemy.png", 48, 384)
            .with_image("block.png", 16, 64)
    }

    fn panel(gfx: &mut RecordingContext) -> GamePanel {
        GamePanel::new(gfx, &stock_assets(), &SceneConfig::default(), RESOLUTION)
    }

    fn texture_of(gfx: &RecordingContext, label: &str) -> TextureHandle {
        gfx.commands()
            .iter()
            .find_map(|c| match c {
                sprite_render::DrawCommand::CreateTexture {
                    texture, label: l, ..
                } if l == label => Some(*texture),
                _ => None,
            })
            .expect("texture created")
    }

    #[test]
    fn new_loads_one_texture_per_asset() {
        let mut gfx = RecordingContext::new();
        let panel = panel(&mut gfx);
        assert_eq!(gfx.live_texture_count(), 5);
        assert_eq!(panel.player_frame(), 11);
        assert_eq!(panel.enemy_frame(), 0);
        assert_eq!(panel.block_frame(), 0);
        assert_eq!(panel.player_x(), -32.0);
        assert_eq!(panel.player_position().y, 272.0 - 16.0 - 32.0);
    }

    #[test]
    fn player_advances_with_delta_time() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        panel.paint(&mut gfx, 16.6);
        assert!((panel.player_x() - (-32.0 + 0.15 * 16.6)).abs() < 1e-4);
        assert!((panel.player_x() - -29.51).abs() < 1e-3);
    }

    #[test]
    fn player_wraps_after_206_ticks_at_60_hz() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        // 2.49 px per tick covers the 512 px from -32 past 480 in 206 ticks.
        for tick in 1..206 {
            panel.paint(&mut gfx, 16.6);
            assert!(panel.player_x() > -32.0, "wrapped early at tick {tick}");
        }
        panel.paint(&mut gfx, 16.6);
        assert_eq!(panel.player_x(), -32.0);
    }

    #[test]
    fn player_wraps_after_leaving_the_screen() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        // 0.15 px/ms * 3400 ms = 510 px: from -32 to 478, still on screen.
        panel.paint(&mut gfx, 3400.0);
        assert!(panel.player_x() <= 480.0);
        panel.paint(&mut gfx, 100.0);
        assert_eq!(panel.player_x(), -32.0);
    }

    #[test]
    fn moon_angle_wraps_at_zero() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        panel.paint(&mut gfx, 16.0);
        assert_eq!(panel.moon_angle(), 359.5);
        for _ in 0..718 {
            panel.paint(&mut gfx, 16.0);
        }
        assert_eq!(panel.moon_angle(), 0.5);
        panel.paint(&mut gfx, 16.0);
        assert_eq!(panel.moon_angle(), 360.0);
    }

    #[test]
    fn draw_order_is_background_moon_player_enemies_terrain() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        let expected: Vec<_> = ["background.png", "moon.png", "player.png", "enemy.png"]
            .iter()
            .map(|label| Some(texture_of(&gfx, label)))
            .collect();
        let block = Some(texture_of(&gfx, "block.png"));
        panel.on_pointer_down(Vec2::new(100.0, 100.0));
        gfx.clear_commands();
        panel.paint(&mut gfx, 16.0);

        let textures: Vec<_> = gfx.draws().iter().map(|d| d.texture).collect();
        // background + moon + player + 1 enemy + 30 terrain tiles
        assert_eq!(textures.len(), 1 + 1 + 1 + 1 + 30);
        assert_eq!(&textures[..4], expected.as_slice());
        assert!(textures[4..].iter().all(|t| *t == block));
    }

    #[test]
    fn three_spawns_are_kept_and_drawn_every_frame() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        let enemy = texture_of(&gfx, "enemy.png");

        panel.on_pointer_down(Vec2::new(100.0, 100.0));
        panel.on_pointer_down(Vec2::new(200.0, 50.0));
        panel.on_pointer_down(Vec2::new(24.0, 24.0));
        assert_eq!(panel.spawn_count(), 3);

        for frame in 1..=3 {
            panel.paint(&mut gfx, 16.0);
            assert_eq!(gfx.draws_with(enemy).len(), 3 * frame);
        }

        let draws = gfx.draws_with(enemy);
        // Spawns are centred on the pointer and drawn in insertion order.
        assert_eq!(draws[0].corners[0].y, 100.0 - 24.0);
        assert_eq!(draws[1].corners[0].y, 50.0 - 24.0);
        assert_eq!(draws[2].corners[0].y, 0.0);
    }

    #[test]
    fn spawn_list_evicts_oldest_beyond_capacity() {
        let mut gfx = RecordingContext::new();
        let config = SceneConfig {
            spawn_capacity: 2,
            ..SceneConfig::default()
        };
        let mut panel = GamePanel::new(&mut gfx, &stock_assets(), &config, RESOLUTION);
        panel.on_pointer_down(Vec2::new(24.0, 24.0));
        panel.on_pointer_down(Vec2::new(48.0, 24.0));
        panel.on_pointer_down(Vec2::new(72.0, 24.0));
        let xs: Vec<f32> = panel.spawns().map(|p| p.x).collect();
        assert_eq!(xs, vec![24.0, 48.0]);
    }

    #[test]
    fn animations_advance_in_lock_step_every_sixth_tick() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        for _ in 0..5 {
            panel.paint(&mut gfx, 16.0);
        }
        assert_eq!(
            (panel.player_frame(), panel.enemy_frame(), panel.block_frame()),
            (11, 0, 0)
        );
        panel.paint(&mut gfx, 16.0);
        assert_eq!(
            (panel.player_frame(), panel.enemy_frame(), panel.block_frame()),
            (12, 1, 1)
        );
        for _ in 0..12 {
            panel.paint(&mut gfx, 16.0);
        }
        // Three advances in total: player wraps 13 -> 11.
        assert_eq!(
            (panel.player_frame(), panel.enemy_frame(), panel.block_frame()),
            (11, 3, 3)
        );
    }

    #[test]
    fn terrain_covers_the_bottom_row() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        let block = texture_of(&gfx, "block.png");
        panel.paint(&mut gfx, 16.0);
        let tiles = gfx.draws_with(block);
        assert_eq!(tiles.len(), 30);
        assert_eq!(tiles[0].top_left(), Vec2::new(0.0, 256.0));
        assert_eq!(tiles[29].top_left(), Vec2::new(464.0, 256.0));
    }

    #[test]
    fn moon_is_drawn_rotated_about_its_centre() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        let moon = texture_of(&gfx, "moon.png");
        panel.paint(&mut gfx, 16.0);
        let quad = gfx.draws_with(moon)[0].clone();
        let centre = (quad.corners[0] + quad.corners[2]) / 2.0;
        assert!((centre - Vec2::new(430.0 + 16.0, 25.0 + 16.0)).length() < 1e-3);
    }

    #[test]
    fn missing_assets_leave_scene_running() {
        install_error_counter();
        let mut gfx = RecordingContext::new();
        let assets = MemoryAssetSource::new().with_image("block.png", 16, 64);
        let mut panel = GamePanel::new(&mut gfx, &assets, &SceneConfig::default(), RESOLUTION);
        panel.on_pointer_down(Vec2::new(50.0, 50.0));

        let errors_after_load = ERROR_RECORDS.with(Cell::get);
        assert!(errors_after_load > 0, "load failures are reported once");
        for _ in 0..100 {
            panel.paint(&mut gfx, 16.0);
        }
        assert_eq!(ERROR_RECORDS.with(Cell::get), errors_after_load);

        // Only terrain is visible.
        assert_eq!(gfx.draws().len(), 30 * 100);
        assert!(panel.player_x() > -32.0);
    }

    #[test]
    fn missing_player_sheet_is_skipped_quietly() {
        install_error_counter();
        let mut gfx = RecordingContext::new();
        let assets = MemoryAssetSource::new()
            .with_image("background.png", 480, 272)
            .with_image("moon.png", 32, 32)
            .with_image("enemy.png", 48, 384)
            .with_image("block.png", 16, 64);
        let mut panel = GamePanel::new(&mut gfx, &assets, &SceneConfig::default(), RESOLUTION);

        let errors_after_load = ERROR_RECORDS.with(Cell::get);
        for _ in 0..100 {
            panel.paint(&mut gfx, 16.0);
        }
        assert_eq!(ERROR_RECORDS.with(Cell::get), errors_after_load);
    }

    #[test]
    fn custom_animation_ranges_are_respected() {
        let mut gfx = RecordingContext::new();
        let mut config = SceneConfig::default();
        config.animation_divisor = 1;
        config.block.animation = FrameRange::new(2, 3);
        let mut panel = GamePanel::new(&mut gfx, &stock_assets(), &config, RESOLUTION);
        assert_eq!(panel.block_frame(), 2);
        panel.paint(&mut gfx, 16.0);
        assert_eq!(panel.block_frame(), 3);
        panel.paint(&mut gfx, 16.0);
        assert_eq!(panel.block_frame(), 2);
    }

    #[test]
    fn key_events_do_not_change_the_scene() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        panel.on_key_down(Key::Left);
        panel.on_key_up(Key::Left);
        assert_eq!(panel.player_x(), -32.0);
        assert_eq!(panel.spawn_count(), 0);
    }

    #[test]
    fn destroy_releases_every_texture_once() {
        let mut gfx = RecordingContext::new();
        let mut panel = panel(&mut gfx);
        panel.paint(&mut gfx, 16.0);
        panel.destroy(&mut gfx);
        panel.destroy(&mut gfx);
        assert!(panel.is_destroyed());
        assert_eq!(gfx.live_texture_count(), 0);
        assert_eq!(gfx.deleted_textures().len(), 5);
        assert_eq!(gfx.take_error(), None);

        gfx.clear_commands();
        panel.paint(&mut gfx, 16.0);
        assert!(gfx.commands().is_empty());
    }
}
