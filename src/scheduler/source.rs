use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Host clock and frame-request hook.
pub trait FrameSource {
    /// Monotonic time in milliseconds.
    fn now_ms(&self) -> f64;
    /// Ask the host to call `GlobalAnimation::on_animation_frame` soon.
    fn request_frame(&self);
}

/// Wall clock backed by [`Instant`]. Frame requests are latched for the host to poll.
#[derive(Debug)]
pub struct SystemFrameSource {
    origin: Instant,
    requested: Cell<bool>,
}

impl Default for SystemFrameSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            requested: Cell::new(false),
        }
    }
}

impl SystemFrameSource {
    /// Returns and clears the pending frame request.
    pub fn take_request(&self) -> bool {
        self.requested.replace(false)
    }
}

impl FrameSource for SystemFrameSource {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn request_frame(&self) {
        self.requested.set(true);
    }
}

/// Caller-controlled clock. Clones share the same time and request counter.
#[derive(Clone, Debug, Default)]
pub struct ManualFrameSource {
    now: Rc<Cell<f64>>,
    requests: Rc<Cell<u32>>,
}

impl ManualFrameSource {
    pub fn set_ms(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance_ms(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    /// Number of frame requests seen so far.
    pub fn requests(&self) -> u32 {
        self.requests.get()
    }
}

impl FrameSource for ManualFrameSource {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}
