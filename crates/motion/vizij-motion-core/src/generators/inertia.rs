//! Exponential decay ("momentum scroll") with optional elastic bounds.
//!
//! The decay curve is `target - amplitude * e^(-t / time_constant)`. When it
//! would leave `[min, max]`, the crossing time is solved at construction and a
//! bounce spring takes over from the boundary, so `next` stays a pure function.

use crate::config::Config;
use crate::options::TargetModifier;
use crate::value::Value;

use super::spring::{Spring, SpringOptions};
use super::{Generator, GeneratorState};

const DEFAULT_POWER: f64 = 0.8;
const DEFAULT_TIME_CONSTANT: f64 = 325.0;
const DEFAULT_REST_DELTA: f64 = 0.5;
const DEFAULT_BOUNCE_STIFFNESS: f64 = 500.0;
const DEFAULT_BOUNCE_DAMPING: f64 = 10.0;

#[derive(Clone, Debug, Default)]
pub struct InertiaOptions {
    pub origin: f64,
    /// Units per second.
    pub velocity: f64,
    pub power: Option<f64>,
    /// Milliseconds.
    pub time_constant: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub bounce_stiffness: Option<f64>,
    pub bounce_damping: Option<f64>,
    pub rest_delta: Option<f64>,
    pub rest_speed: Option<f64>,
    pub modify_target: Option<TargetModifier>,
}

#[derive(Clone, Debug)]
enum Boundary {
    /// Origin already outside the bounds: spring back from t = 0.
    Immediate(Spring),
    /// Decay crosses a bound at `at` ms; the spring starts there.
    Crossing { at: f64, spring: Spring },
}

#[derive(Clone, Debug)]
pub struct Inertia {
    target: f64,
    amplitude: f64,
    time_constant: f64,
    rest_delta: f64,
    boundary: Option<Boundary>,
}

fn is_out_of_bounds(v: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_some_and(|m| v < m) || max.is_some_and(|m| v > m)
}

fn nearest_boundary(v: f64, min: Option<f64>, max: Option<f64>) -> Option<f64> {
    match (min, max) {
        (None, None) => None,
        (Some(m), None) | (None, Some(m)) => Some(m),
        (Some(lo), Some(hi)) => Some(if (lo - v).abs() < (hi - v).abs() { lo } else { hi }),
    }
}

impl Inertia {
    pub fn new(options: InertiaOptions, cfg: &Config) -> Self {
        let InertiaOptions {
            origin,
            velocity,
            min,
            max,
            ..
        } = options;
        let power = options.power.unwrap_or(DEFAULT_POWER);
        let time_constant = options.time_constant.unwrap_or(DEFAULT_TIME_CONSTANT);
        let rest_delta = options.rest_delta.unwrap_or(DEFAULT_REST_DELTA);

        let mut amplitude = power * velocity;
        let ideal = origin + amplitude;
        let target = match &options.modify_target {
            Some(modify) => modify.apply(ideal),
            None => ideal,
        };
        if target != ideal {
            amplitude = target - origin;
        }

        let bounce_spring = |from: f64, to: f64, velocity: f64| {
            Spring::new(
                SpringOptions {
                    origin: from,
                    target: to,
                    velocity,
                    stiffness: Some(options.bounce_stiffness.unwrap_or(DEFAULT_BOUNCE_STIFFNESS)),
                    damping: Some(options.bounce_damping.unwrap_or(DEFAULT_BOUNCE_DAMPING)),
                    mass: Some(1.0),
                    rest_delta: Some(rest_delta),
                    rest_speed: options.rest_speed,
                    ..Default::default()
                },
                cfg,
            )
        };

        let boundary = if is_out_of_bounds(origin, min, max) {
            nearest_boundary(origin, min, max)
                .map(|edge| Boundary::Immediate(bounce_spring(origin, edge, velocity)))
        } else if is_out_of_bounds(target, min, max) {
            nearest_boundary(target, min, max).and_then(|edge| {
                let ratio = (target - edge) / amplitude;
                if ratio > 0.0 && ratio <= 1.0 {
                    let at = -time_constant * ratio.ln();
                    let slope = amplitude / time_constant * (-at / time_constant).exp() * 1000.0;
                    Some(Boundary::Crossing {
                        at,
                        spring: bounce_spring(edge, edge, slope),
                    })
                } else {
                    None
                }
            })
        } else {
            None
        };

        Self {
            target,
            amplitude,
            time_constant,
            rest_delta,
            boundary,
        }
    }

    /// Resting point of the friction phase (after `modify_target`).
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Time (ms) at which the decay hands over to the bounce spring, if it does.
    pub fn boundary_time(&self) -> Option<f64> {
        match &self.boundary {
            Some(Boundary::Immediate(_)) => Some(0.0),
            Some(Boundary::Crossing { at, .. }) => Some(*at),
            None => None,
        }
    }

    fn friction(&self, t: f64) -> GeneratorState {
        let delta = -self.amplitude * (-t / self.time_constant).exp();
        let done = self.boundary.is_none() && delta.abs() <= self.rest_delta;
        let value = if done { self.target } else { self.target + delta };
        GeneratorState {
            value: Value::Number(value),
            done,
        }
    }
}

impl Generator for Inertia {
    fn next(&self, t: f64) -> GeneratorState {
        match &self.boundary {
            Some(Boundary::Immediate(spring)) => spring.next(t),
            Some(Boundary::Crossing { at, spring }) if t >= *at => spring.next(t - at),
            _ => self.friction(t),
        }
    }
}
