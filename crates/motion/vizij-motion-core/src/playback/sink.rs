//! Where animated values go.

use std::cell::RefCell;
use std::rc::Rc;

use crate::value::Value;

/// Receives values produced by an animation.
///
/// Only `on_update` is required; the other hooks have conservative defaults.
pub trait ValueSink {
    /// Called every frame with the latest value.
    fn on_update(&self, value: &Value);

    /// Called once with the exact final value when an animation finishes.
    fn on_complete(&self, value: &Value) {
        self.on_update(value);
    }

    /// Commit a value together with its velocity (units/s), used when a
    /// compositor animation is interrupted mid-flight.
    fn set_with_velocity(&self, value: &Value, _velocity: f64) {
        self.on_update(value);
    }

    /// Current value, used to hydrate `None` keyframes.
    fn current(&self) -> Option<Value> {
        None
    }

    /// Whether the host needs a value every frame (so the animation cannot be
    /// handed to a compositor).
    fn requires_frame_updates(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct Recorded {
    current: Option<Value>,
    velocity: f64,
    history: Vec<Value>,
    completed: Vec<Value>,
}

/// In-memory sink that keeps the current value and a history of updates.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    inner: Rc<RefCell<Recorded>>,
    frame_updates: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<Value>) -> Self {
        let sink = Self::default();
        sink.inner.borrow_mut().current = Some(value.into());
        sink
    }

    /// Mark the sink as needing per-frame values.
    pub fn requiring_frame_updates(mut self) -> Self {
        self.frame_updates = true;
        self
    }

    pub fn value(&self) -> Option<Value> {
        self.inner.borrow().current.clone()
    }

    pub fn number(&self) -> Option<f64> {
        self.inner.borrow().current.as_ref().and_then(Value::as_number)
    }

    pub fn velocity(&self) -> f64 {
        self.inner.borrow().velocity
    }

    pub fn history(&self) -> Vec<Value> {
        self.inner.borrow().history.clone()
    }

    pub fn completed(&self) -> Vec<Value> {
        self.inner.borrow().completed.clone()
    }
}

impl ValueSink for RecordingSink {
    fn on_update(&self, value: &Value) {
        let mut inner = self.inner.borrow_mut();
        inner.current = Some(value.clone());
        inner.history.push(value.clone());
    }

    fn on_complete(&self, value: &Value) {
        let mut inner = self.inner.borrow_mut();
        inner.current = Some(value.clone());
        inner.completed.push(value.clone());
    }

    fn set_with_velocity(&self, value: &Value, velocity: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.current = Some(value.clone());
        inner.velocity = velocity;
        inner.history.push(value.clone());
    }

    fn current(&self) -> Option<Value> {
        self.value()
    }

    fn requires_frame_updates(&self) -> bool {
        self.frame_updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_tracks_updates_and_completion() {
        let sink = RecordingSink::with_value(1.0);
        assert_eq!(sink.current(), Some(Value::Number(1.0)));
        sink.on_update(&Value::Number(2.0));
        sink.on_complete(&Value::Number(3.0));
        assert_eq!(sink.number(), Some(3.0));
        assert_eq!(sink.history(), vec![Value::Number(2.0)]);
        assert_eq!(sink.completed(), vec![Value::Number(3.0)]);
        sink.set_with_velocity(&Value::Number(4.0), 120.0);
        assert_eq!(sink.velocity(), 120.0);
    }
}
