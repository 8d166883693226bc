//! Demo configuration file (`assets/config/demo.json`).
//!
//! Every field is optional; omitted values fall back to the stock demo
//! (480x272 internal resolution, the five bundled textures). A missing file
//! is not an error, a malformed one is.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use sprite_core::FrameRange;
use sprite_platform::window::PlatformConfig;
use sprite_render::{DisplayOrientation, FrameGrid, LEGACY_FALLBACK_STRIDE};

pub const CONFIG_VERSION: &str = "0.1";
pub const DEFAULT_CONFIG_PATH: &str = "assets/config/demo.json";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DemoConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
    #[serde(default)]
    pub window: PlatformConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_resolution_width")]
    pub resolution_width: f32,
    #[serde(default = "default_resolution_height")]
    pub resolution_height: f32,
    #[serde(default)]
    pub orientation: DisplayOrientation,
    /// Grey level of the clear colour, 0..=1.
    #[serde(default = "default_clear_grey")]
    pub clear_grey: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SheetConfig {
    pub path: String,
    pub frame_width: f32,
    pub frame_height: f32,
    pub frame_count: usize,
    /// Frames the animation loops over.
    pub animation: FrameRange,
}

impl SheetConfig {
    pub fn grid(&self, fallback_stride: f32) -> FrameGrid {
        FrameGrid::new(self.frame_width, self.frame_height, self.frame_count)
            .with_fallback_stride(fallback_stride)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SceneConfig {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_moon")]
    pub moon: String,
    /// Degrees subtracted from the moon angle every tick.
    #[serde(default = "default_moon_step_deg")]
    pub moon_step_deg: f32,
    /// Moon origin measured from the top-right corner.
    #[serde(default = "default_moon_inset_x")]
    pub moon_inset_x: f32,
    #[serde(default = "default_moon_inset_y")]
    pub moon_inset_y: f32,
    #[serde(default = "default_player_sheet")]
    pub player: SheetConfig,
    /// Pixels per millisecond.
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_player_start_x")]
    pub player_start_x: f32,
    #[serde(default = "default_enemy_sheet")]
    pub enemy: SheetConfig,
    #[serde(default = "default_block_sheet")]
    pub block: SheetConfig,
    /// Render ticks per animation frame.
    #[serde(default = "default_animation_divisor")]
    pub animation_divisor: u32,
    /// Oldest spawns are dropped beyond this many.
    #[serde(default = "default_spawn_capacity")]
    pub spawn_capacity: usize,
    #[serde(default = "default_fallback_stride")]
    pub fallback_stride: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            asset_root: default_asset_root(),
            window: PlatformConfig::default(),
            display: DisplayConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            resolution_width: default_resolution_width(),
            resolution_height: default_resolution_height(),
            orientation: DisplayOrientation::default(),
            clear_grey: default_clear_grey(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            moon: default_moon(),
            moon_step_deg: default_moon_step_deg(),
            moon_inset_x: default_moon_inset_x(),
            moon_inset_y: default_moon_inset_y(),
            player: default_player_sheet(),
            player_speed: default_player_speed(),
            player_start_x: default_player_start_x(),
            enemy: default_enemy_sheet(),
            block: default_block_sheet(),
            animation_divisor: default_animation_divisor(),
            spawn_capacity: default_spawn_capacity(),
            fallback_stride: default_fallback_stride(),
        }
    }
}

pub fn load_config_from_path(config_path: &Path) -> Result<DemoConfig, String> {
    let raw = fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read config file {}: {e}", config_path.display()))?;
    let config: DemoConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", config_path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load `config_path`, or the stock configuration when it does not exist.
pub fn load_config_or_default(config_path: &Path) -> Result<DemoConfig, String> {
    if !config_path.exists() {
        log::warn!(
            "Config file '{}' not found, using built-in defaults",
            config_path.display()
        );
        return Ok(DemoConfig::default());
    }
    load_config_from_path(config_path)
}

pub fn validate_config(config: &DemoConfig) -> Result<(), String> {
    if config.version != CONFIG_VERSION {
        return Err(format!(
            "Config validation failed: unsupported version '{}' (expected '{}')",
            config.version, CONFIG_VERSION
        ));
    }

    let display = &config.display;
    if display.resolution_width <= 0.0 || display.resolution_height <= 0.0 {
        return Err(format!(
            "Config validation failed: resolution must be positive, got {}x{}",
            display.resolution_width, display.resolution_height
        ));
    }
    if !(0.0..=1.0).contains(&display.clear_grey) {
        return Err(format!(
            "Config validation failed: clear_grey {} outside 0..=1",
            display.clear_grey
        ));
    }
    if config.window.width == 0 || config.window.height == 0 {
        return Err("Config validation failed: window size must be non-zero".to_string());
    }

    let scene = &config.scene;
    validate_sheet("player", &scene.player)?;
    validate_sheet("enemy", &scene.enemy)?;
    validate_sheet("block", &scene.block)?;

    if scene.animation_divisor == 0 {
        return Err("Config validation failed: animation_divisor must be > 0".to_string());
    }
    if scene.spawn_capacity == 0 {
        return Err("Config validation failed: spawn_capacity must be > 0".to_string());
    }
    if scene.fallback_stride <= 0.0 {
        return Err("Config validation failed: fallback_stride must be > 0".to_string());
    }
    if !scene.player_speed.is_finite() || !scene.moon_step_deg.is_finite() {
        return Err(
            "Config validation failed: player_speed and moon_step_deg must be finite".to_string(),
        );
    }
    Ok(())
}

fn validate_sheet(name: &str, sheet: &SheetConfig) -> Result<(), String> {
    if sheet.path.is_empty() {
        return Err(format!("Config validation failed: {name} sheet path is empty"));
    }
    if sheet.frame_width <= 0.0 || sheet.frame_height <= 0.0 {
        return Err(format!(
            "Config validation failed: {name} frame size must be positive, got {}x{}",
            sheet.frame_width, sheet.frame_height
        ));
    }
    if sheet.frame_count == 0 {
        return Err(format!("Config validation failed: {name} frame_count must be > 0"));
    }
    if sheet.animation.is_empty() || sheet.animation.last >= sheet.frame_count {
        return Err(format!(
            "Config validation failed: {name} animation frames {}..={} not inside 0..{}",
            sheet.animation.first, sheet.animation.last, sheet.frame_count
        ));
    }
    Ok(())
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_asset_root() -> PathBuf {
    PathBuf::from("assets/textures")
}

const fn default_resolution_width() -> f32 {
    480.0
}

const fn default_resolution_height() -> f32 {
    272.0
}

const fn default_clear_grey() -> f64 {
    0.5
}

fn default_background() -> String {
    "background.png".to_string()
}

fn default_moon() -> String {
    "moon.png".to_string()
}

const fn default_moon_step_deg() -> f32 {
    0.5
}

const fn default_moon_inset_x() -> f32 {
    50.0
}

const fn default_moon_inset_y() -> f32 {
    25.0
}

fn default_player_sheet() -> SheetConfig {
    SheetConfig {
        path: "player.png".to_string(),
        frame_width: 32.0,
        frame_height: 32.0,
        frame_count: 14,
        animation: FrameRange::new(11, 13),
    }
}

const fn default_player_speed() -> f32 {
    0.15
}

const fn default_player_start_x() -> f32 {
    -32.0
}

fn default_enemy_sheet() -> SheetConfig {
    SheetConfig {
        path: "enemy.png".to_string(),
        frame_width: 48.0,
        frame_height: 48.0,
        frame_count: 8,
        animation: FrameRange::new(0, 7),
    }
}

fn default_block_sheet() -> SheetConfig {
    SheetConfig {
        path: "block.png".to_string(),
        frame_width: 16.0,
        frame_height: 16.0,
        frame_count: 4,
        animation: FrameRange::new(0, 3),
    }
}

const fn default_animation_divisor() -> u32 {
    6
}

const fn default_spawn_capacity() -> usize {
    4096
}

const fn default_fallback_stride() -> f32 {
    LEGACY_FALLBACK_STRIDE
}
