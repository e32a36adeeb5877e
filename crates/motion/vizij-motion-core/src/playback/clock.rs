//! Frame clock abstraction.
//!
//! Animations subscribe to a [`FrameClock`] while they need frames and drop
//! the subscription when they finish. [`ManualClock`] is a deterministic
//! clock advanced by the host (tests, headless renderers, fixed-step loops).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Called once per frame with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnMut(f64)>;

pub trait FrameClock {
    /// Current timestamp, milliseconds.
    fn now(&self) -> f64;

    /// Deliver `callback` on every frame until the subscription is dropped.
    fn subscribe(&self, callback: FrameCallback) -> ClockSubscription;
}

/// Live clock subscription; dropping it (or calling [`Self::unsubscribe`]) stops delivery.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct ClockSubscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl ClockSubscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ClockSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for ClockSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type Subscriber = (u64, Rc<RefCell<FrameCallback>>);

#[derive(Default)]
struct ManualClockInner {
    now: Cell<f64>,
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl ManualClockInner {
    fn is_subscribed(&self, id: u64) -> bool {
        self.subscribers.borrow().iter().any(|(sid, _)| *sid == id)
    }
}

/// Clock advanced explicitly by the host.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Rc<ManualClockInner>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: f64) -> Self {
        let clock = Self::default();
        clock.inner.now.set(ms);
        clock
    }

    /// Advance by `dt` milliseconds and deliver one frame.
    pub fn advance(&self, dt: f64) {
        self.set(self.inner.now.get() + dt);
    }

    /// Jump to `ms` and deliver one frame.
    pub fn set(&self, ms: f64) {
        self.inner.now.set(ms);
        self.frame();
    }

    /// Deliver `frames` frames `dt` milliseconds apart.
    pub fn run(&self, frames: usize, dt: f64) {
        for _ in 0..frames {
            self.advance(dt);
        }
    }

    /// Deliver a frame at the current time.
    ///
    /// Subscribers are snapshotted first so callbacks may subscribe or
    /// unsubscribe; a callback removed during dispatch is skipped, and one that
    /// is already running further up the stack is not re-entered.
    pub fn frame(&self) {
        let now = self.inner.now.get();
        let snapshot: Vec<Subscriber> = self.inner.subscribers.borrow().clone();
        for (id, callback) in snapshot {
            if !self.inner.is_subscribed(id) {
                continue;
            }
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (callback)(now);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl FrameClock for ManualClock {
    fn now(&self) -> f64 {
        self.inner.now.get()
    }

    fn subscribe(&self, callback: FrameCallback) -> ClockSubscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(callback))));
        let weak: Weak<ManualClockInner> = Rc::downgrade(&self.inner);
        ClockSubscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
            }
        })
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.inner.now.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
