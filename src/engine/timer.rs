//! Frame timing: millisecond timer, FPS cap and per-second statistics.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of samples kept for the editor graphs.
pub const HISTORY_LEN: usize = 100;

pub const DEFAULT_MAX_FPS: i32 = 60;

/// Millisecond stopwatch.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started_at: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.started_at = Instant::now();
    }

    pub fn read_ms(&self) -> u32 {
        self.started_at.elapsed().as_millis().min(u32::MAX as u128) as u32
    }

    pub fn read_secs(&self) -> f32 {
        self.started_at.elapsed().as_secs_f32()
    }
}

/// Milliseconds a frame must last to honour `max_fps`.
///
/// A cap of 0 means uncapped and yields a non-positive value.
pub fn capped_ms(max_fps: i32) -> i32 {
    let fps = if max_fps == 0 { -1 } else { max_fps };
    1000 / fps
}

/// How long to sleep at the end of a frame, if at all.
pub fn frame_delay(capped_ms: i32, last_frame_ms: u32) -> Option<Duration> {
    if capped_ms > 0 && (last_frame_ms as i64) < capped_ms as i64 {
        Some(Duration::from_millis((capped_ms as i64 - last_frame_ms as i64) as u64))
    } else {
        None
    }
}

/// Frame statistics published to the modules.
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Frames counted during the last full second.
    pub fps: u32,
    pub last_frame_ms: u32,
    pub dt: f32,
    pub max_fps: i32,
    /// Frames since start.
    pub frame: u64,
    pub fps_history: VecDeque<f32>,
    pub ms_history: VecDeque<f32>,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            fps: 0,
            last_frame_ms: 0,
            dt: 0.0,
            max_fps: DEFAULT_MAX_FPS,
            frame: 0,
            fps_history: VecDeque::with_capacity(HISTORY_LEN),
            ms_history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }
}

impl FrameStats {
    pub fn push_fps(&mut self, fps: u32) {
        push_bounded(&mut self.fps_history, fps as f32);
    }

    pub fn push_ms(&mut self, ms: u32) {
        push_bounded(&mut self.ms_history, ms as f32);
    }
}

fn push_bounded(history: &mut VecDeque<f32>, value: f32) {
    if history.len() >= HISTORY_LEN {
        history.pop_front();
    }
    history.push_back(value);
}
