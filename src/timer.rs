//! Frame timing
//!
//! `dt` is the wall-clock time between the starts of two consecutive ticks.
//! Nothing is clamped: a slow frame shows up as a large `dt` on the next one.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub struct FrameTimer {
    start: Instant,
    last_tick: Option<Instant>,
    dt: f32,
    frame: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last_tick: None,
            dt: 0.0,
            frame: 0,
        }
    }

    /// Start a tick now
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Start a tick at `now`; the first tick measures from construction
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let previous = self.last_tick.unwrap_or(self.start);
        self.dt = now.saturating_duration_since(previous).as_secs_f32();
        self.last_tick = Some(now);
        self.frame += 1;
        self.dt
    }

    /// Seconds between the last two ticks
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Time from construction to the latest tick
    pub fn elapsed(&self) -> Duration {
        self.last_tick
            .map_or(Duration::ZERO, |t| t.saturating_duration_since(self.start))
    }

    /// Nanoseconds from construction to the latest tick
    pub fn time_ns(&self) -> u128 {
        self.elapsed().as_nanos()
    }

    /// Ticks so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
