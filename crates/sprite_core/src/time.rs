//! Variable-step frame clock.
//!
//! The demo advances once per displayed frame. Delta time is the difference
//! between two wall-clock samples taken at the start of consecutive frame
//! callbacks, in milliseconds. Wall-clock time can step backwards (NTP,
//! manual changes), so a negative delta is clamped to a small positive
//! epsilon instead of being fed into the simulation.

use std::time::{SystemTime, UNIX_EPOCH};

const FPS_SAMPLE_COUNT: usize = 60;

/// Substitute delta used when the wall clock runs backwards.
pub const NEGATIVE_DT_EPSILON_MS: f32 = 0.01;

/// Default cap on a single frame's delta.
pub const DEFAULT_MAX_DT_MS: f32 = 250.0;

pub struct FrameClock {
    pub max_dt_ms: f32,
    pub dt_ms: f32,
    pub frame_count: u64,
    last_sample_ms: Option<f64>,

    fps_samples: [f32; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f32,
    pub smoothed_frame_time_ms: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            max_dt_ms: DEFAULT_MAX_DT_MS,
            dt_ms: 0.0,
            frame_count: 0,
            last_sample_ms: None,
            fps_samples: [1000.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Sample the wall clock and return this frame's delta in milliseconds.
    pub fn begin_frame(&mut self) -> f32 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.tick_at(now_ms)
    }

    /// Advance the clock to an explicit wall-clock sample (milliseconds).
    ///
    /// The first sample has no predecessor and produces a zero delta.
    pub fn tick_at(&mut self, now_ms: f64) -> f32 {
        let mut dt = match self.last_sample_ms {
            Some(prev) => (now_ms - prev) as f32,
            None => 0.0,
        };
        self.last_sample_ms = Some(now_ms);

        if dt < 0.0 {
            log::debug!("Wall clock went backwards by {:.2}ms, clamping delta", -dt);
            dt = NEGATIVE_DT_EPSILON_MS;
        }
        if dt > self.max_dt_ms {
            log::warn!("Frame took {:.1}ms, capping delta to {}ms", dt, self.max_dt_ms);
            dt = self.max_dt_ms;
        }

        self.dt_ms = dt;
        self.frame_count += 1;

        if self.frame_count > 1 {
            self.fps_samples[self.fps_sample_index] = dt;
            self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
            let avg_ms: f32 = self.fps_samples.iter().sum::<f32>() / FPS_SAMPLE_COUNT as f32;
            self.smoothed_frame_time_ms = avg_ms;
            self.smoothed_fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
        }

        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
