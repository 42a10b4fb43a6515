use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::foundation::core::When;
use crate::foundation::error::{FigureError, FigureResult};
use crate::scheduler::source::{FrameSource, ManualFrameSource, SystemFrameSource};

const SYNC_NOW_WINDOW_MS: f64 = 100.0;

type FrameCallback = Box<dyn FnOnce(f64)>;

/// Identifier returned by [`GlobalAnimation::set_timeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

struct Timer {
    end: f64,
    callback: Box<dyn FnOnce()>,
    description: String,
    state_timer: bool,
}

struct Clock {
    next_draw_queue: Vec<FrameCallback>,
    last_draw_time: Option<f64>,
    speed: f64,
    now_time: f64,
    last_time: f64,
    synchronized_now: f64,
    update_sync_now: bool,
    sync_now_timer: Option<TimerId>,
    manual: bool,
    manual_queue_counter: u32,
    manual_one_frame_only: bool,
    frame_requested: bool,
    timers: BTreeMap<TimerId, Timer>,
    id_counter: u64,
    simulated_fps: Option<f64>,
    disposed: bool,
}

impl Clock {
    fn new(now: f64) -> Self {
        Self {
            next_draw_queue: Vec::new(),
            last_draw_time: None,
            speed: 1.0,
            now_time: now,
            last_time: now,
            synchronized_now: now,
            update_sync_now: true,
            sync_now_timer: None,
            manual: false,
            manual_queue_counter: 0,
            manual_one_frame_only: true,
            frame_requested: false,
            timers: BTreeMap::new(),
            id_counter: 0,
            simulated_fps: None,
            disposed: false,
        }
    }

    /// Due timer with the lowest end time. State timers lose ties.
    fn next_due(&self, limit: f64) -> Option<TimerId> {
        self.timers
            .iter()
            .filter(|(_, t)| t.end <= limit)
            .min_by(|(ia, a), (ib, b)| {
                a.end
                    .total_cmp(&b.end)
                    .then(a.state_timer.cmp(&b.state_timer))
                    .then(ia.cmp(ib))
            })
            .map(|(id, _)| *id)
    }
}

/// Frame scheduler and virtual clock for one running figure.
///
/// Times handed to draw callbacks are in seconds. The clock itself counts milliseconds and
/// advances by real elapsed time times `speed`, or only through [`frame`](Self::frame) in
/// manual mode. No borrow is held while callbacks run, so callbacks may queue frames, set
/// timers or read the clock.
pub struct GlobalAnimation {
    source: Box<dyn FrameSource>,
    clock: RefCell<Clock>,
    this: Weak<GlobalAnimation>,
}

impl fmt::Debug for GlobalAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.clock.borrow();
        f.debug_struct("GlobalAnimation")
            .field("now_time", &c.now_time)
            .field("speed", &c.speed)
            .field("manual", &c.manual)
            .field("queued", &c.next_draw_queue.len())
            .field("timers", &c.timers.len())
            .finish()
    }
}

impl GlobalAnimation {
    pub fn new(source: Box<dyn FrameSource>) -> Rc<Self> {
        let now = source.now_ms();
        Rc::new_cyclic(|this| Self {
            source,
            clock: RefCell::new(Clock::new(now)),
            this: this.clone(),
        })
    }

    pub fn with_system_clock() -> Rc<Self> {
        Self::new(Box::new(SystemFrameSource::default()))
    }

    /// Scheduler in manual-frame mode plus a handle on its source clock.
    pub fn manual() -> (Rc<Self>, ManualFrameSource) {
        let source = ManualFrameSource::default();
        let global = Self::new(Box::new(source.clone()));
        global.set_manual_frames();
        (global, source)
    }

    /// Drop queued frames and timers and return to real time at speed 1.
    pub fn reset(&self) {
        let now = self.source.now_ms();
        let mut c = self.clock.borrow_mut();
        let disposed = c.disposed;
        *c = Clock::new(now);
        c.disposed = disposed;
    }

    /// Release everything. Later frame requests are ignored.
    pub fn dispose(&self) {
        let mut c = self.clock.borrow_mut();
        c.next_draw_queue.clear();
        c.timers.clear();
        c.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.clock.borrow().disposed
    }

    fn update_now(&self) {
        let real = self.source.now_ms();
        let mut c = self.clock.borrow_mut();
        if c.manual {
            return;
        }
        let delta = real - c.last_time;
        c.now_time += delta * c.speed;
        c.last_time = real;
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> f64 {
        self.update_now();
        self.clock.borrow().now_time
    }

    pub fn speed(&self) -> f64 {
        self.clock.borrow().speed
    }

    pub fn set_speed(&self, speed: f64) -> FigureResult<()> {
        if speed.is_nan() || speed <= 0.0 {
            return Err(FigureError::validation(format!(
                "speed factor {speed} is not greater than 0"
            )));
        }
        self.update_now();
        self.clock.borrow_mut().speed = speed;
        Ok(())
    }

    /// Time of the last completed draw, in milliseconds.
    pub fn last_draw_time(&self) -> Option<f64> {
        self.clock.borrow().last_draw_time
    }

    /// Resolve a start instruction to seconds. `NextFrame` resolves to nothing.
    pub fn get_when(&self, when: When) -> Option<f64> {
        match when {
            When::Now => Some(self.now() * 0.001),
            When::PrevFrame => self.last_draw_time().map(|t| t * 0.001),
            When::SyncNow => Some(self.sync_now() * 0.001),
            When::NextFrame => None,
            When::At(t) => Some(t),
        }
    }

    /// `now`, cached for a short window so steps started together share a start time.
    pub fn sync_now(&self) -> f64 {
        if !self.clock.borrow().update_sync_now {
            return self.clock.borrow().synchronized_now;
        }
        let now = self.now();
        {
            let mut c = self.clock.borrow_mut();
            c.update_sync_now = false;
            c.synchronized_now = now;
        }
        let this = self.this.clone();
        let id = self.set_timeout(
            move || {
                if let Some(g) = this.upgrade() {
                    let mut c = g.clock.borrow_mut();
                    c.update_sync_now = true;
                    c.sync_now_timer = None;
                }
            },
            SYNC_NOW_WINDOW_MS,
            "syncNow",
            true,
        );
        self.clock.borrow_mut().sync_now_timer = Some(id);
        now
    }

    pub fn set_manual_frames(&self) {
        self.update_now();
        self.clock.borrow_mut().manual = true;
    }

    pub fn end_manual_frames(&self) {
        let real = self.source.now_ms();
        let mut c = self.clock.borrow_mut();
        c.manual = false;
        c.last_time = real;
    }

    pub fn is_manual(&self) -> bool {
        self.clock.borrow().manual
    }

    /// Advance the clock by `dt` seconds, firing due timers, then draw once.
    #[tracing::instrument(skip(self))]
    pub fn frame(&self, dt: f64) {
        let target = {
            let mut c = self.clock.borrow_mut();
            c.manual_queue_counter = 0;
            c.now_time + dt * 1000.0
        };
        self.increment_timers(target);
        {
            let mut c = self.clock.borrow_mut();
            c.now_time = target;
            c.last_time = target;
        }
        self.draw();
    }

    /// Fire timers due by `target`, one at a time, drawing after each.
    fn increment_timers(&self, target: f64) {
        loop {
            let timer = {
                let mut c = self.clock.borrow_mut();
                let Some(id) = c.next_due(target) else {
                    return;
                };
                let Some(timer) = c.timers.remove(&id) else {
                    return;
                };
                c.now_time = timer.end;
                c.last_time = timer.end;
                timer
            };
            tracing::trace!(description = %timer.description, end = timer.end, "timer fired");
            (timer.callback)();
            self.draw();
        }
    }

    /// Fire timers that are due against the current clock without moving it.
    pub fn poll_timers(&self) {
        let now = self.now();
        loop {
            let timer = {
                let mut c = self.clock.borrow_mut();
                let Some(id) = c.next_due(now) else {
                    return;
                };
                c.timers.remove(&id)
            };
            if let Some(timer) = timer {
                (timer.callback)();
            }
        }
    }

    /// Run `callback` after `ms` milliseconds of virtual time.
    pub fn set_timeout(
        &self,
        callback: impl FnOnce() + 'static,
        ms: f64,
        description: &str,
        state_timer: bool,
    ) -> TimerId {
        self.update_now();
        let mut c = self.clock.borrow_mut();
        let id = TimerId(c.id_counter);
        c.id_counter += 1;
        let end = c.now_time + ms;
        c.timers.insert(
            id,
            Timer {
                end,
                callback: Box::new(callback),
                description: description.to_owned(),
                state_timer,
            },
        );
        id
    }

    pub fn clear_timeout(&self, id: TimerId) {
        self.clock.borrow_mut().timers.remove(&id);
    }

    pub fn timer_count(&self) -> usize {
        self.clock.borrow().timers.len()
    }

    /// Number of callbacks waiting for the next draw.
    pub fn queued_frames(&self) -> usize {
        self.clock.borrow().next_draw_queue.len()
    }

    /// Queue `callback` for the next draw. It receives the draw time in seconds.
    pub fn queue_next_frame(&self, callback: impl FnOnce(f64) + 'static) {
        let request = {
            let mut c = self.clock.borrow_mut();
            if c.disposed {
                return;
            }
            c.next_draw_queue.push(Box::new(callback));
            if c.manual && c.manual_one_frame_only {
                if c.manual_queue_counter >= 1 {
                    return;
                }
                c.manual_queue_counter += 1;
            }
            c.next_draw_queue.len() == 1 && c.simulated_fps.is_none()
        };
        if request {
            self.request_frame();
        }
    }

    fn request_frame(&self) {
        let ask = {
            let mut c = self.clock.borrow_mut();
            let ask = !c.manual && !c.frame_requested;
            if ask {
                c.frame_requested = true;
            }
            ask
        };
        if ask {
            self.source.request_frame();
        }
    }

    /// Host animation-frame hook.
    ///
    /// With a debug frame rate set, only draws once a full simulated frame has elapsed.
    pub fn on_animation_frame(&self) {
        self.clock.borrow_mut().frame_requested = false;
        self.poll_timers();
        let fps = self.clock.borrow().simulated_fps;
        if let Some(fps) = fps {
            let now = self.now();
            let last = self.last_draw_time();
            if last.is_some_and(|last| now - last < 1000.0 / fps) {
                self.clock.borrow_mut().frame_requested = true;
                self.source.request_frame();
                return;
            }
        }
        self.draw();
    }

    /// Run every queued callback with the current time in seconds.
    pub fn draw(&self) {
        let sync_timer = {
            let mut c = self.clock.borrow_mut();
            c.frame_requested = false;
            c.update_sync_now = true;
            c.sync_now_timer.take()
        };
        if let Some(id) = sync_timer {
            self.clear_timeout(id);
        }
        let queue = std::mem::take(&mut self.clock.borrow_mut().next_draw_queue);
        let now = self.now();
        let seconds = now * 0.001;
        for callback in queue {
            callback(seconds);
        }
        self.clock.borrow_mut().last_draw_time = Some(now);
    }

    pub fn set_debug_frame_rate(&self, fps: f64) {
        if fps > 0.0 {
            self.clock.borrow_mut().simulated_fps = Some(fps);
            self.request_frame();
        }
    }

    pub fn disable_debug_frame_rate(&self) {
        let pending = {
            let mut c = self.clock.borrow_mut();
            c.simulated_fps = None;
            !c.next_draw_queue.is_empty()
        };
        if pending {
            self.request_frame();
        }
    }

    pub fn debug_frame_rate(&self) -> Option<f64> {
        self.clock.borrow().simulated_fps
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/global.rs"]
mod tests;
