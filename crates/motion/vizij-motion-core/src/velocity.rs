//! Helpers for estimating handoff velocity from two samples.

use crate::playback::controller::PlaybackController;
use crate::value::{Rgba, Value};

/// Time derivative `(current - previous) / dt`, per second, with `dt` in milliseconds.
///
/// Returns `None` for value kinds where a derivative is not well defined
/// (text, mismatched shapes) or when `dt <= 0`.
pub fn derivative_value(current: &Value, previous: &Value, dt_ms: f64) -> Option<Value> {
    if dt_ms <= 0.0 {
        return None;
    }
    let per_second = 1000.0 / dt_ms;
    match (current, previous) {
        (Value::Number(c), Value::Number(p)) => Some(Value::Number((c - p) * per_second)),
        (Value::Color(c), Value::Color(p)) => Some(Value::Color(Rgba::new(
            (c.r - p.r) * per_second,
            (c.g - p.g) * per_second,
            (c.b - p.b) * per_second,
            (c.a - p.a) * per_second,
        ))),
        (Value::Array(c), Value::Array(p)) if c.len() == p.len() => c
            .iter()
            .zip(p)
            .map(|(c, p)| derivative_value(c, p, dt_ms))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (Value::Object(c), Value::Object(p)) if c.len() == p.len() => c
            .iter()
            .map(|(k, c)| {
                let p = p.get(k)?;
                Some((k.clone(), derivative_value(c, p, dt_ms)?))
            })
            .collect::<Option<_>>()
            .map(Value::Object),
        _ => None,
    }
}

/// Scalar velocity in units per second; 0 when either sample is not a number.
pub fn scalar_velocity(current: &Value, previous: &Value, dt_ms: f64) -> f64 {
    match derivative_value(current, previous, dt_ms) {
        Some(Value::Number(v)) => v,
        _ => 0.0,
    }
}

/// Value and velocity at the moment an animation is interrupted.
#[derive(Clone, Debug, PartialEq)]
pub struct HandoffSample {
    pub value: Value,
    /// Units per second.
    pub velocity: f64,
}

/// Sample `controller` at `t - delta` and `t` (milliseconds).
pub fn sample_handoff(controller: &PlaybackController, t: f64, delta: f64) -> HandoffSample {
    let previous = controller.sample((t - delta).max(0.0)).value;
    let value = controller.sample(t).value;
    let dt = t - (t - delta).max(0.0);
    HandoffSample {
        velocity: scalar_velocity(&value, &previous, dt),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::easing::Easing;
    use crate::options::AnimationOptions;
    use approx::assert_relative_eq;

    #[test]
    fn numbers_and_colors_differentiate() {
        let v = derivative_value(&Value::Number(3.0), &Value::Number(1.0), 10.0);
        assert_eq!(v, Some(Value::Number(200.0)));
        let c = derivative_value(
            &Value::rgba(10.0, 0.0, 0.0, 1.0),
            &Value::rgba(0.0, 0.0, 0.0, 1.0),
            100.0,
        );
        assert_eq!(c, Some(Value::rgba(100.0, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn text_and_zero_dt_have_no_derivative() {
        assert_eq!(derivative_value(&"a".into(), &"b".into(), 10.0), None);
        assert_eq!(derivative_value(&Value::Number(1.0), &Value::Number(0.0), 0.0), None);
        assert_eq!(scalar_velocity(&"a".into(), &"b".into(), 10.0), 0.0);
    }

    #[test]
    fn arrays_need_matching_lengths() {
        let a = Value::Array(vec![1.0.into(), 2.0.into()]);
        let b = Value::Array(vec![0.0.into()]);
        assert_eq!(derivative_value(&a, &b, 10.0), None);
        let d = derivative_value(&a, &a, 10.0);
        assert_eq!(d, Some(Value::Array(vec![0.0.into(), 0.0.into()])));
    }

    #[test]
    fn handoff_of_linear_tween_is_constant() {
        let options = AnimationOptions::tween([0.0, 100.0])
            .with_duration(1000.0)
            .with_easing(Easing::Linear);
        let frames = crate::value::resolve_keyframes(&options.keyframes, None, "x").unwrap();
        let controller = PlaybackController::new(&options, frames, &Config::default()).unwrap();
        let sample = sample_handoff(&controller, 500.0, 10.0);
        assert_eq!(sample.value, Value::Number(50.0));
        assert_relative_eq!(sample.velocity, 100.0, epsilon = 1e-9);
        let start = sample_handoff(&controller, 0.0, 10.0);
        assert_eq!(start.velocity, 0.0);
    }
}
