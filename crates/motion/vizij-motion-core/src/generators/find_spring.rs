//! Resolve spring physics from a perceptual description (duration + bounce).
//!
//! The envelope of a unit spring released with normalised velocity `v` must
//! fall below `SAFE_MIN` exactly at `duration`; Newton–Raphson on the
//! undamped angular frequency finds the stiffness that achieves it.

use crate::config::SpringDefaults;

const SAFE_MIN: f64 = 0.001;
const MIN_DURATION_S: f64 = 0.01;
const MAX_DURATION_S: f64 = 10.0;
const MIN_DAMPING: f64 = 0.05;
const MAX_DAMPING: f64 = 1.0;
const ROOT_ITERATIONS: usize = 12;

/// Default duration (ms) when only a bounce is given.
pub const DEFAULT_SPRING_DURATION: f64 = 800.0;
/// Default bounce when only a duration is given.
pub const DEFAULT_SPRING_BOUNCE: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FindSpringOptions {
    /// Milliseconds.
    pub duration: f64,
    /// 0 = critically damped, 1 = undamped.
    pub bounce: f64,
    /// Initial velocity normalised by the travel distance, 1/s.
    pub velocity: f64,
    pub mass: f64,
}

impl Default for FindSpringOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SPRING_DURATION,
            bounce: DEFAULT_SPRING_BOUNCE,
            velocity: 0.0,
            mass: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedSpring {
    pub stiffness: f64,
    pub damping: f64,
    /// Clamped duration, milliseconds.
    pub duration: f64,
}

/// Damping ratio for a bounce, clamped to the supported range.
#[inline]
pub fn damping_ratio_for_bounce(bounce: f64) -> f64 {
    (1.0 - bounce).clamp(MIN_DAMPING, MAX_DAMPING)
}

#[inline]
fn angular_freq(undamped: f64, ratio: f64) -> f64 {
    undamped * (1.0 - ratio * ratio).sqrt()
}

fn approximate_root(envelope: impl Fn(f64) -> f64, derivative: impl Fn(f64) -> f64, guess: f64) -> f64 {
    let mut result = guess;
    for _ in 0..ROOT_ITERATIONS {
        result -= envelope(result) / derivative(result);
    }
    result
}

/// Find stiffness and damping so a spring settles in `options.duration`.
///
/// Falls back to `fallback` stiffness/damping when the solver diverges.
pub fn find_spring(options: FindSpringOptions, fallback: SpringDefaults) -> ResolvedSpring {
    let ratio = damping_ratio_for_bounce(options.bounce);
    let duration = (options.duration / 1000.0).clamp(MIN_DURATION_S, MAX_DURATION_S);
    let velocity = options.velocity;

    let root = if ratio < 1.0 {
        let envelope = |freq: f64| {
            let decay = freq * ratio;
            let delta = decay * duration;
            let a = decay - velocity;
            let b = angular_freq(freq, ratio);
            SAFE_MIN - (a / b) * (-delta).exp()
        };
        let derivative = |freq: f64| {
            let decay = freq * ratio;
            let delta = decay * duration;
            let d = delta * velocity + velocity;
            let e = ratio * ratio * freq * freq * duration;
            let f = (-delta).exp();
            let g = angular_freq(freq * freq, ratio);
            let factor = if -envelope(freq) + SAFE_MIN > 0.0 {
                -1.0
            } else {
                1.0
            };
            factor * ((d - e) * f) / g
        };
        approximate_root(envelope, derivative, 5.0 / duration)
    } else {
        let envelope = |freq: f64| {
            let a = (-freq * duration).exp();
            let b = (freq - velocity) * duration + 1.0;
            -SAFE_MIN + a * b
        };
        let derivative = |freq: f64| {
            let a = (-freq * duration).exp();
            let b = (velocity - freq) * (duration * duration);
            a * b
        };
        approximate_root(envelope, derivative, 5.0 / duration)
    };

    let duration = duration * 1000.0;
    if !root.is_finite() {
        log::debug!(
            "spring solver diverged for duration {duration}ms, bounce {}; using fallback physics",
            options.bounce
        );
        return ResolvedSpring {
            stiffness: fallback.stiffness,
            damping: fallback.damping,
            duration,
        };
    }
    let stiffness = root * root * options.mass;
    ResolvedSpring {
        stiffness,
        damping: ratio * 2.0 * (options.mass * stiffness).sqrt(),
        duration,
    }
}
