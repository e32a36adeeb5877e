//! Tween generator: eased interpolation through keyframes over a fixed duration.

use crate::easing::EaseSpec;
use crate::error::MotionError;
use crate::interpolate::{InterpolateOptions, Interpolator};
use crate::value::Value;

use super::{Generator, GeneratorState};

/// Evenly spaced offsets in `[0, 1]` for `count` keyframes.
pub fn default_offsets(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

#[derive(Clone, Debug)]
pub struct KeyframesGenerator {
    interpolator: Interpolator,
    duration: f64,
}

impl KeyframesGenerator {
    /// `times` is only honoured when it has one offset per keyframe.
    pub fn new(
        keyframes: &[Value],
        times: Option<&[f64]>,
        ease: &EaseSpec,
        duration: f64,
    ) -> Result<Self, MotionError> {
        let offsets = match times {
            Some(times) if times.len() == keyframes.len() => times.to_vec(),
            _ => default_offsets(keyframes.len()),
        };
        let absolute: Vec<f64> = offsets.iter().map(|o| o * duration).collect();
        let interpolator = Interpolator::new(
            &absolute,
            keyframes,
            InterpolateOptions {
                ease: ease.expand(keyframes.len().saturating_sub(1)),
                ..Default::default()
            },
        )?;
        Ok(Self {
            interpolator,
            duration,
        })
    }
}

impl Generator for KeyframesGenerator {
    fn next(&self, t: f64) -> GeneratorState {
        GeneratorState {
            value: self.interpolator.at(t),
            done: t >= self.duration,
        }
    }

    fn calculated_duration(&self) -> Option<f64> {
        Some(self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    fn nums(v: &[f64]) -> Vec<Value> {
        v.iter().map(|x| Value::Number(*x)).collect()
    }

    #[test]
    fn linear_midpoint_is_the_value_midpoint() {
        let g = KeyframesGenerator::new(
            &nums(&[0.0, 100.0]),
            None,
            &Easing::Linear.into(),
            1000.0,
        )
        .unwrap();
        assert_eq!(g.next(500.0).value, Value::Number(50.0));
        assert!(!g.next(999.0).done);
        let end = g.next(1000.0);
        assert!(end.done);
        assert_eq!(end.value, Value::Number(100.0));
        assert_eq!(g.calculated_duration(), Some(1000.0));
    }

    #[test]
    fn explicit_times_place_keyframes() {
        let g = KeyframesGenerator::new(
            &nums(&[0.0, 10.0, 20.0]),
            Some(&[0.0, 0.8, 1.0]),
            &Easing::Linear.into(),
            100.0,
        )
        .unwrap();
        assert_eq!(g.next(40.0).value, Value::Number(5.0));
        assert_eq!(g.next(90.0).value, Value::Number(15.0));
    }

    #[test]
    fn mismatched_times_fall_back_to_even_offsets() {
        let g = KeyframesGenerator::new(
            &nums(&[0.0, 10.0, 20.0]),
            Some(&[0.0, 1.0]),
            &Easing::Linear.into(),
            100.0,
        )
        .unwrap();
        assert_eq!(g.next(50.0).value, Value::Number(10.0));
    }

    #[test]
    fn per_segment_easing_fills_with_ease_in_out() {
        let ease = EaseSpec::PerSegment(vec![Easing::Linear]);
        let g = KeyframesGenerator::new(&nums(&[0.0, 10.0, 20.0]), None, &ease, 200.0).unwrap();
        assert_eq!(g.next(50.0).value, Value::Number(5.0));
        // easeInOut is symmetric about the segment midpoint
        assert_eq!(g.next(150.0).value, Value::Number(15.0));
    }

    #[test]
    fn default_offsets_are_even() {
        assert_eq!(default_offsets(3), vec![0.0, 0.5, 1.0]);
        assert_eq!(default_offsets(1), vec![0.0]);
    }
}
