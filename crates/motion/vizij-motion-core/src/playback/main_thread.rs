//! CPU-driven animation handle: a [`PlaybackController`] wired to a frame
//! clock, a value sink and a completion channel.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::value::Value;

use super::clock::{ClockSubscription, FrameClock};
use super::completion::{notify, Completion, CompletionObserver};
use super::controller::PlaybackController;
use super::controls::PlaybackControls;
use super::sink::ValueSink;
use super::state::PlaybackState;

struct Inner {
    controller: RefCell<PlaybackController>,
    sink: Rc<dyn ValueSink>,
    clock: Rc<dyn FrameClock>,
    subscription: RefCell<Option<ClockSubscription>>,
    completion: RefCell<Completion>,
}

impl Inner {
    fn on_frame(&self, timestamp: f64) {
        let tick = self.controller.borrow_mut().tick(timestamp);
        if tick.finished {
            self.sink.on_complete(&tick.state.value);
            self.release_clock();
            self.resolve_completion();
        } else {
            self.sink.on_update(&tick.state.value);
        }
    }

    fn release_clock(&self) {
        let subscription = self.subscription.borrow_mut().take();
        drop(subscription);
    }

    fn resolve_completion(&self) {
        let observers = self.completion.borrow_mut().resolve();
        notify(observers);
    }
}

/// Shared handle to one main-thread animation. Clones refer to the same animation.
#[derive(Clone)]
pub struct MainThreadAnimation {
    inner: Rc<Inner>,
}

impl MainThreadAnimation {
    /// Wrap `controller`; starts immediately when `autoplay` is set.
    pub fn new(
        controller: PlaybackController,
        sink: Rc<dyn ValueSink>,
        clock: Rc<dyn FrameClock>,
        autoplay: bool,
    ) -> Self {
        let animation = Self {
            inner: Rc::new(Inner {
                controller: RefCell::new(controller),
                sink,
                clock,
                subscription: RefCell::new(None),
                completion: RefCell::new(Completion::default()),
            }),
        };
        if autoplay {
            animation.play();
        }
        animation
    }

    fn ensure_subscribed(&self) {
        if self.inner.subscription.borrow().is_some() {
            return;
        }
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let subscription = self.inner.clock.subscribe(Box::new(move |timestamp| {
            if let Some(inner) = weak.upgrade() {
                inner.on_frame(timestamp);
            }
        }));
        *self.inner.subscription.borrow_mut() = Some(subscription);
    }

    /// Evaluate at `t` ms without affecting playback.
    pub fn sample(&self, t: f64) -> Value {
        self.inner.controller.borrow().sample(t).value
    }

    pub fn total_duration(&self) -> f64 {
        self.inner.controller.borrow().total_duration_ms() / 1000.0
    }

    /// Whether the handle is currently subscribed to the clock.
    pub fn is_ticking(&self) -> bool {
        self.inner.subscription.borrow().is_some()
    }
}

impl PlaybackControls for MainThreadAnimation {
    fn time(&self) -> f64 {
        self.inner.controller.borrow().time_ms() / 1000.0
    }

    fn set_time(&self, seconds: f64) {
        let now = self.inner.clock.now();
        self.inner.controller.borrow_mut().set_time(seconds, now);
    }

    fn speed(&self) -> f64 {
        self.inner.controller.borrow().speed()
    }

    fn set_speed(&self, speed: f64) {
        let now = self.inner.clock.now();
        self.inner.controller.borrow_mut().set_speed(speed, now);
    }

    fn duration(&self) -> f64 {
        self.inner.controller.borrow().duration_ms() / 1000.0
    }

    fn state(&self) -> PlaybackState {
        self.inner.controller.borrow().state()
    }

    fn play(&self) {
        let now = self.inner.clock.now();
        let started = self.inner.controller.borrow_mut().play(now);
        if started {
            self.ensure_subscribed();
        }
    }

    fn pause(&self) {
        let now = self.inner.clock.now();
        self.inner.controller.borrow_mut().pause(now);
    }

    fn stop(&self) {
        let was_active = self.inner.controller.borrow_mut().stop();
        self.inner.release_clock();
        if was_active {
            self.inner.resolve_completion();
        }
    }

    fn cancel(&self) {
        let origin = self.inner.controller.borrow_mut().cancel();
        self.inner.sink.on_update(&origin);
        self.inner.release_clock();
        self.inner.resolve_completion();
    }

    fn complete(&self) {
        let now = self.inner.clock.now();
        self.inner.controller.borrow_mut().complete(now);
        if self.inner.controller.borrow().state() == PlaybackState::Finished {
            self.ensure_subscribed();
        }
    }

    fn then(&self, on_done: CompletionObserver) {
        self.inner.completion.borrow_mut().push(on_done);
    }
}

impl fmt::Debug for MainThreadAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let controller = self.inner.controller.borrow();
        f.debug_struct("MainThreadAnimation")
            .field("state", &controller.state())
            .field("time_ms", &controller.time_ms())
            .field("ticking", &self.is_ticking())
            .finish()
    }
}
