//! Compositor-driven animation handle.
//!
//! The compositor owns the timeline; this handle mirrors the playback
//! surface onto it and takes care of the two moments the sink must be
//! written from the CPU side:
//! - on finish, the exact final keyframe is committed before the compositor
//!   animation is released;
//! - on `stop()`, value and velocity are re-derived by sampling a disposable
//!   controller, since the compositor cannot be read mid-flight.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::Config;
use crate::error::MotionError;
use crate::options::{AnimationOptions, RepeatType, REPEAT_FOREVER};
use crate::playback::completion::{notify, Completion, CompletionObserver};
use crate::playback::controller::{final_keyframe, PlaybackController};
use crate::playback::controls::PlaybackControls;
use crate::playback::sink::ValueSink;
use crate::playback::state::PlaybackState;
use crate::value::Value;
use crate::velocity::sample_handoff;

use super::backend::{
    CompositorBackend, CompositorHandle, CompositorPlayState, CompositorTiming, FillMode,
    PlaybackDirection,
};
use super::pregenerate::{pregenerate_keyframes, requires_pregenerated_keyframes};
use super::support::{map_easing, normalize_property, Capabilities};

struct Inner {
    handle: Rc<dyn CompositorHandle>,
    sink: Rc<dyn ValueSink>,
    options: AnimationOptions,
    keyframes: Vec<Value>,
    final_keyframe: Value,
    duration: f64,
    config: Config,
    finished_time: Cell<Option<f64>>,
    stopped: Cell<bool>,
    cancelled: Cell<bool>,
    completion: RefCell<Completion>,
}

impl Inner {
    fn on_finished(&self) {
        let time = self.handle.current_time().unwrap_or(0.0);
        self.finished_time.set(Some(time));
        self.sink.on_complete(&self.final_keyframe);
        self.cancel_handle();
        self.resolve_completion();
    }

    fn cancel_handle(&self) {
        if let Err(err) = self.handle.cancel() {
            log::warn!("compositor cancel failed ({}): {err}", err.category());
        }
    }

    fn resolve_completion(&self) {
        let observers = self.completion.borrow_mut().resolve();
        notify(observers);
    }

    /// Sample a throwaway controller either side of the compositor's current
    /// time and write value + velocity to the sink.
    fn commit_interrupted_value(&self) -> Result<(), MotionError> {
        let t = self.handle.current_time().unwrap_or(0.0);
        let mut options = self.options.clone();
        options.speed = 1.0;
        let sampler = PlaybackController::new(&options, self.keyframes.clone(), &self.config)?;
        let handoff = sample_handoff(&sampler, t, self.config.handoff_sample_delta);
        self.sink.set_with_velocity(&handoff.value, handoff.velocity);
        Ok(())
    }
}

/// Animation delegated to a [`CompositorBackend`].
#[derive(Clone)]
pub struct AcceleratedAnimation {
    inner: Rc<Inner>,
}

impl AcceleratedAnimation {
    /// Start `options` for `property` on `backend`.
    ///
    /// `keyframes` are the hydrated keyframes; spring physics, unsupported easing and
    /// values the compositor would interpolate differently are pregenerated first.
    pub fn start(
        backend: &dyn CompositorBackend,
        property: &str,
        options: AnimationOptions,
        keyframes: Vec<Value>,
        sink: Rc<dyn ValueSink>,
        caps: &Capabilities,
        config: &Config,
    ) -> Result<Self, MotionError> {
        // Pregenerated samples are evenly spaced; explicit keyframes keep their offsets.
        let (played_keyframes, offsets, duration, ease) =
            if requires_pregenerated_keyframes(&options, &keyframes, caps, config)? {
                let generated = pregenerate_keyframes(&options, &keyframes, config)?;
                log::debug!(
                    "pregenerated {} keyframes for '{property}' over {}ms",
                    generated.keyframes.len(),
                    generated.duration
                );
                (generated.keyframes, None, generated.duration, generated.ease)
            } else {
                (
                    keyframes.clone(),
                    options.times.clone(),
                    options.duration.unwrap_or(config.default_duration),
                    options.ease.clone(),
                )
            };

        let easing = ease
            .as_list()
            .iter()
            .map(|e| {
                map_easing(e, duration, caps).ok_or_else(|| MotionError::Compositor {
                    reason: format!("easing {e:?} cannot be expressed"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let timing = CompositorTiming {
            delay: options.delay,
            duration,
            iterations: if options.repeat == REPEAT_FOREVER {
                f64::INFINITY
            } else {
                f64::from(options.repeat) + 1.0
            },
            direction: if options.repeat_type == RepeatType::Reverse {
                PlaybackDirection::Alternate
            } else {
                PlaybackDirection::Normal
            },
            fill: FillMode::Both,
            easing,
            offsets,
        };

        let handle: Rc<dyn CompositorHandle> = Rc::from(backend.animate(
            &normalize_property(property),
            &played_keyframes,
            &timing,
        )?);
        if options.speed != 1.0 {
            handle.set_playback_rate(options.speed);
        }
        if !options.autoplay {
            handle.pause();
        }

        let final_value = final_keyframe(&keyframes, options.repeat, options.repeat_type, options.speed)
            .cloned()
            .ok_or_else(|| MotionError::EmptyKeyframes {
                value: property.to_string(),
            })?;
        let inner = Rc::new(Inner {
            handle: Rc::clone(&handle),
            sink,
            options,
            keyframes,
            final_keyframe: final_value,
            duration,
            config: config.clone(),
            finished_time: Cell::new(None),
            stopped: Cell::new(false),
            cancelled: Cell::new(false),
            completion: RefCell::new(Completion::default()),
        });
        let weak: Weak<Inner> = Rc::downgrade(&inner);
        handle.on_finish(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_finished();
            }
        }));
        Ok(Self { inner })
    }
}

impl PlaybackControls for AcceleratedAnimation {
    fn time(&self) -> f64 {
        let ms = self
            .inner
            .finished_time
            .get()
            .or_else(|| self.inner.handle.current_time())
            .unwrap_or(0.0);
        ms / 1000.0
    }

    fn set_time(&self, seconds: f64) {
        self.inner.finished_time.set(None);
        self.inner.handle.set_current_time(seconds * 1000.0);
    }

    fn speed(&self) -> f64 {
        self.inner.handle.playback_rate()
    }

    fn set_speed(&self, speed: f64) {
        self.inner.handle.set_playback_rate(speed);
    }

    fn duration(&self) -> f64 {
        self.inner.duration / 1000.0
    }

    fn state(&self) -> PlaybackState {
        if self.inner.finished_time.get().is_some() {
            return PlaybackState::Finished;
        }
        if self.inner.stopped.get() || self.inner.cancelled.get() {
            return PlaybackState::Idle;
        }
        match self.inner.handle.play_state() {
            CompositorPlayState::Idle => PlaybackState::Idle,
            CompositorPlayState::Running => PlaybackState::Running,
            CompositorPlayState::Paused => PlaybackState::Paused,
            CompositorPlayState::Finished => PlaybackState::Finished,
        }
    }

    fn play(&self) {
        if self.inner.stopped.get() {
            return;
        }
        self.inner.finished_time.set(None);
        self.inner.cancelled.set(false);
        self.inner.handle.play();
    }

    fn pause(&self) {
        self.inner.handle.pause();
    }

    fn stop(&self) {
        if self.inner.stopped.replace(true) {
            return;
        }
        let state = self.state_before_stop();
        if matches!(state, PlaybackState::Idle | PlaybackState::Finished) {
            return;
        }
        if let Err(err) = self.inner.commit_interrupted_value() {
            log::warn!("could not sample interrupted animation: {err}");
        }
        self.inner.cancel_handle();
        self.inner.resolve_completion();
    }

    fn cancel(&self) {
        self.inner.cancelled.set(true);
        self.inner.cancel_handle();
        if let Some(origin) = self.inner.keyframes.first() {
            self.inner.sink.on_update(origin);
        }
        self.inner.resolve_completion();
    }

    fn complete(&self) {
        let handle = Rc::clone(&self.inner.handle);
        handle.finish();
    }

    fn then(&self, on_done: CompletionObserver) {
        self.inner.completion.borrow_mut().push(on_done);
    }
}

impl AcceleratedAnimation {
    fn state_before_stop(&self) -> PlaybackState {
        if self.inner.finished_time.get().is_some() {
            return PlaybackState::Finished;
        }
        if self.inner.cancelled.get() {
            return PlaybackState::Idle;
        }
        match self.inner.handle.play_state() {
            CompositorPlayState::Idle => PlaybackState::Idle,
            CompositorPlayState::Finished => PlaybackState::Finished,
            CompositorPlayState::Running => PlaybackState::Running,
            CompositorPlayState::Paused => PlaybackState::Paused,
        }
    }
}

impl fmt::Debug for AcceleratedAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceleratedAnimation")
            .field("duration", &self.inner.duration)
            .field("final_keyframe", &self.inner.final_keyframe)
            .field("stopped", &self.inner.stopped.get())
            .finish()
    }
}
