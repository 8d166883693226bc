pub mod animation;
pub mod geometry;
pub mod input;
pub mod time;

pub use animation::{FrameCounter, FrameLimiter, FrameRange};
pub use geometry::{Rect, UvRect};
pub use input::{InputState, Key};
pub use time::FrameClock;
