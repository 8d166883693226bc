//! Lock-step frame counters for sprite-sheet animation.
//!
//! Every animated entity owns a `FrameCounter` walking an inclusive frame
//! range. Counters do not keep their own timers: a single shared
//! `FrameLimiter` decides on which render ticks all counters advance together.
//! With a divisor of 6 the counters step on ticks 6, 12, 18, ...

use serde::Deserialize;

/// Inclusive range of sheet frame indices an animation loops over.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub first: usize,
    pub last: usize,
}

impl FrameRange {
    pub const fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.last - self.first + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    pub fn contains(&self, frame: usize) -> bool {
        (self.first..=self.last).contains(&frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCounter {
    range: FrameRange,
    current: usize,
}

impl FrameCounter {
    /// Counter starting on the first frame of `range`.
    pub fn new(range: FrameRange) -> Self {
        Self {
            range,
            current: range.first,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn range(&self) -> FrameRange {
        self.range
    }

    /// Step to the next frame, wrapping past `last` back to `first`.
    pub fn advance(&mut self) -> usize {
        self.current = if self.current >= self.range.last {
            self.range.first
        } else {
            self.current + 1
        };
        self.current
    }
}

/// Render-tick divider shared by every animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimiter {
    divisor: u32,
    count: u32,
}

impl FrameLimiter {
    /// A divisor of zero is treated as one (advance every tick).
    pub fn new(divisor: u32) -> Self {
        Self {
            divisor: divisor.max(1),
            count: 0,
        }
    }

    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Count one render tick. Returns true on the tick where animations
    /// should advance, and restarts the count.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.divisor {
            self.count = 0;
            true
        } else {
            false
        }
    }
}
