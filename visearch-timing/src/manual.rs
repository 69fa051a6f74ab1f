use crate::timer::{FrameStats, Timer};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Clock that only moves when told to.
///
/// Clones share the same time source, so a test can keep one handle and
/// advance the clock seen by a state machine that owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Rc<Cell<u64>>,
    frames: Vec<Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns.set(self.now_ns.get() + d.as_nanos() as u64);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set_ns(&self, ns: u64) {
        self.now_ns.set(ns);
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        self.now_ns.get()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }

    fn record_frame(&mut self, d: Duration) {
        self.frames.push(d);
    }

    fn frame_stats(&self) -> FrameStats {
        FrameStats::from_durations(&self.frames)
    }
}
