//! Compositor backend seam.
//!
//! A compositor runs keyframe animations outside the frame loop. The core
//! only hands it a keyframe list plus timing and afterwards talks to the
//! returned handle: current time, playback rate, transport and one finish
//! notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;
use crate::generators::keyframes::default_offsets;
use crate::value::Value;

/// Easing in a form a compositor understands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompositorEasing {
    Named(String),
    CubicBezier([f64; 4]),
    /// Evenly spaced samples of an arbitrary curve, linearly interpolated.
    LinearCurve(Vec<f64>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackDirection {
    #[default]
    Normal,
    Alternate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillMode {
    None,
    Forwards,
    Backwards,
    #[default]
    Both,
}

/// Timing handed to the compositor. Times are milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositorTiming {
    pub delay: f64,
    pub duration: f64,
    /// `f64::INFINITY` repeats forever.
    pub iterations: f64,
    pub direction: PlaybackDirection,
    pub fill: FillMode,
    /// One entry applies to every segment; otherwise one entry per segment.
    pub easing: Vec<CompositorEasing>,
    /// Position of each keyframe in [0, 1]; `None` spaces them evenly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<Vec<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositorPlayState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// A running compositor animation.
pub trait CompositorHandle {
    /// Milliseconds, `None` when the animation is not attached to a timeline.
    fn current_time(&self) -> Option<f64>;
    fn set_current_time(&self, ms: f64);
    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64);
    fn play(&self);
    fn pause(&self);
    fn finish(&self);
    fn cancel(&self) -> Result<(), MotionError>;
    fn play_state(&self) -> CompositorPlayState;
    /// Invoked every time the animation reaches its end.
    fn on_finish(&self, callback: Box<dyn Fn()>);
}

pub trait CompositorBackend {
    fn animate(
        &self,
        property: &str,
        keyframes: &[Value],
        timing: &CompositorTiming,
    ) -> Result<Box<dyn CompositorHandle>, MotionError>;
}

/// Record of one animation started on a [`ManualCompositor`].
pub struct ManualCompositorAnimation {
    pub property: String,
    pub keyframes: Vec<Value>,
    pub timing: CompositorTiming,
    current_time: Cell<f64>,
    rate: Cell<f64>,
    state: Cell<CompositorPlayState>,
    fail_cancel: bool,
    finish_callbacks: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl ManualCompositorAnimation {
    fn end_time(&self) -> f64 {
        self.timing.delay + self.timing.duration * self.timing.iterations
    }

    /// Move compositor time forward; fires finish callbacks when the end is reached.
    pub fn advance(&self, dt: f64) {
        if self.state.get() != CompositorPlayState::Running {
            return;
        }
        let t = self.current_time.get() + dt * self.rate.get();
        self.current_time.set(t);
        if t >= self.end_time() {
            self.finish_now();
        }
    }

    fn finish_now(&self) {
        let end = self.end_time();
        if end.is_finite() {
            self.current_time.set(end);
        }
        self.state.set(CompositorPlayState::Finished);
        let callbacks: Vec<Rc<dyn Fn()>> = self.finish_callbacks.borrow().clone();
        for callback in callbacks {
            callback();
        }
    }

    pub fn time(&self) -> f64 {
        self.current_time.get()
    }

    /// Offset of every keyframe, explicit or evenly spaced.
    pub fn offsets(&self) -> Vec<f64> {
        self.timing
            .offsets
            .clone()
            .unwrap_or_else(|| default_offsets(self.keyframes.len()))
    }

    pub fn state(&self) -> CompositorPlayState {
        self.state.get()
    }
}

impl fmt::Debug for ManualCompositorAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualCompositorAnimation")
            .field("property", &self.property)
            .field("keyframes", &self.keyframes.len())
            .field("timing", &self.timing)
            .field("current_time", &self.current_time.get())
            .field("state", &self.state.get())
            .finish()
    }
}

struct ManualHandle(Rc<ManualCompositorAnimation>);

impl CompositorHandle for ManualHandle {
    fn current_time(&self) -> Option<f64> {
        match self.0.state.get() {
            CompositorPlayState::Idle => None,
            _ => Some(self.0.current_time.get()),
        }
    }

    fn set_current_time(&self, ms: f64) {
        self.0.current_time.set(ms);
    }

    fn playback_rate(&self) -> f64 {
        self.0.rate.get()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.0.rate.set(rate);
    }

    fn play(&self) {
        if matches!(
            self.0.state.get(),
            CompositorPlayState::Idle | CompositorPlayState::Finished
        ) {
            self.0.current_time.set(0.0);
        }
        self.0.state.set(CompositorPlayState::Running);
    }

    fn pause(&self) {
        self.0.state.set(CompositorPlayState::Paused);
    }

    fn finish(&self) {
        self.0.finish_now();
    }

    fn cancel(&self) -> Result<(), MotionError> {
        self.0.state.set(CompositorPlayState::Idle);
        if self.0.fail_cancel {
            return Err(MotionError::Compositor {
                reason: "cancel rejected".into(),
            });
        }
        Ok(())
    }

    fn play_state(&self) -> CompositorPlayState {
        self.0.state.get()
    }

    fn on_finish(&self, callback: Box<dyn Fn()>) {
        self.0.finish_callbacks.borrow_mut().push(Rc::from(callback));
    }
}

/// Compositor driven by the host, for headless use and tests.
#[derive(Clone, Default)]
pub struct ManualCompositor {
    animations: Rc<RefCell<Vec<Rc<ManualCompositorAnimation>>>>,
    reject: Rc<Cell<bool>>,
    fail_cancel: Rc<Cell<bool>>,
}

impl ManualCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `animate` call fail.
    pub fn reject_animations(&self, reject: bool) {
        self.reject.set(reject);
    }

    /// Make `cancel` on subsequently created handles report an error.
    pub fn fail_cancels(&self, fail: bool) {
        self.fail_cancel.set(fail);
    }

    pub fn animations(&self) -> Vec<Rc<ManualCompositorAnimation>> {
        self.animations.borrow().clone()
    }

    /// Advance every running animation by `dt` milliseconds.
    pub fn advance(&self, dt: f64) {
        for animation in self.animations() {
            animation.advance(dt);
        }
    }
}

impl CompositorBackend for ManualCompositor {
    fn animate(
        &self,
        property: &str,
        keyframes: &[Value],
        timing: &CompositorTiming,
    ) -> Result<Box<dyn CompositorHandle>, MotionError> {
        if self.reject.get() {
            return Err(MotionError::Compositor {
                reason: format!("'{property}' cannot be animated"),
            });
        }
        if let Some(offsets) = &timing.offsets {
            if offsets.len() != keyframes.len() {
                return Err(MotionError::Compositor {
                    reason: format!(
                        "{} offsets for {} keyframes",
                        offsets.len(),
                        keyframes.len()
                    ),
                });
            }
        }
        let animation = Rc::new(ManualCompositorAnimation {
            property: property.to_string(),
            keyframes: keyframes.to_vec(),
            timing: timing.clone(),
            current_time: Cell::new(0.0),
            rate: Cell::new(1.0),
            state: Cell::new(CompositorPlayState::Running),
            fail_cancel: self.fail_cancel.get(),
            finish_callbacks: RefCell::new(Vec::new()),
        });
        self.animations.borrow_mut().push(Rc::clone(&animation));
        Ok(Box::new(ManualHandle(animation)))
    }
}

impl fmt::Debug for ManualCompositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualCompositor")
            .field("animations", &self.animations.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(duration: f64) -> CompositorTiming {
        CompositorTiming {
            delay: 0.0,
            duration,
            iterations: 1.0,
            direction: PlaybackDirection::Normal,
            fill: FillMode::Both,
            easing: vec![CompositorEasing::Named("linear".into())],
            offsets: None,
        }
    }

    #[test]
    fn manual_compositor_finishes_and_notifies() {
        let compositor = ManualCompositor::new();
        let handle = compositor
            .animate("opacity", &[0.0.into(), 1.0.into()], &timing(100.0))
            .unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        handle.on_finish(Box::new(move || h.set(h.get() + 1)));
        compositor.advance(60.0);
        assert_eq!(handle.current_time(), Some(60.0));
        compositor.advance(60.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(handle.play_state(), CompositorPlayState::Finished);
        assert_eq!(handle.current_time(), Some(100.0));
    }

    #[test]
    fn rejected_backend_reports_compositor_error() {
        let compositor = ManualCompositor::new();
        compositor.reject_animations(true);
        let err = compositor
            .animate("opacity", &[0.0.into()], &timing(1.0))
            .err()
            .unwrap();
        assert!(err.is_recoverable());
    }

    #[test]
    fn offsets_default_to_even_spacing_and_must_match() {
        let compositor = ManualCompositor::new();
        compositor
            .animate("opacity", &[0.0.into(), 1.0.into(), 0.0.into()], &timing(100.0))
            .unwrap();
        assert_eq!(compositor.animations()[0].offsets(), vec![0.0, 0.5, 1.0]);

        let mut uneven = timing(100.0);
        uneven.offsets = Some(vec![0.0, 0.1, 1.0]);
        compositor
            .animate("opacity", &[0.0.into(), 1.0.into(), 0.0.into()], &uneven)
            .unwrap();
        assert_eq!(compositor.animations()[1].offsets(), vec![0.0, 0.1, 1.0]);

        assert!(compositor
            .animate("opacity", &[0.0.into(), 1.0.into()], &uneven)
            .is_err());
    }
}
