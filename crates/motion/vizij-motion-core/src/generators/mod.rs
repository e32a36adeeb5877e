//! Generator engine: stateless time → value functions.
//!
//! A generator never reads a clock; `next(t)` is a pure function of `t`
//! (milliseconds since the generator's start), so the same generator can be
//! sampled out of order for velocity probing, pregeneration and scrubbing.

pub mod duration;
pub mod find_spring;
pub mod inertia;
pub mod keyframes;
pub mod spring;

use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::error::MotionError;
use crate::options::{AnimationOptions, GeneratorKind};
use crate::value::Value;

pub use duration::{calc_generator_duration, calc_generator_velocity};
pub use find_spring::{find_spring, FindSpringOptions, ResolvedSpring};
pub use inertia::{Inertia, InertiaOptions};
pub use keyframes::KeyframesGenerator;
pub use spring::{Spring, SpringOptions};

/// Output of one generator sample.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorState {
    pub value: Value,
    pub done: bool,
}

impl GeneratorState {
    #[inline]
    pub fn new(value: impl Into<Value>, done: bool) -> Self {
        Self {
            value: value.into(),
            done,
        }
    }
}

/// A pure, deterministic time → value function.
pub trait Generator: fmt::Debug {
    /// Sample at `t` milliseconds.
    fn next(&self, t: f64) -> GeneratorState;

    /// Analytic duration of one pass, when the generator has one.
    fn calculated_duration(&self) -> Option<f64> {
        None
    }
}

fn numeric_endpoints(keyframes: &[Value]) -> Result<(f64, f64), MotionError> {
    let first = keyframes.first().ok_or_else(|| MotionError::EmptyKeyframes {
        value: "generator".into(),
    })?;
    let last = keyframes.last().unwrap_or(first);
    match (first.as_number(), last.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(MotionError::IncompatibleValues {
            from: first.kind().to_string(),
            to: last.kind().to_string(),
            reason: "physical generators animate numbers only".into(),
        }),
    }
}

/// Build the generator for `kind` over already-hydrated `keyframes`.
///
/// `velocity` is passed separately so mirrored generators can negate it
/// without cloning the whole option set.
pub fn create_generator(
    kind: GeneratorKind,
    keyframes: &[Value],
    options: &AnimationOptions,
    velocity: f64,
    cfg: &Config,
) -> Result<Rc<dyn Generator>, MotionError> {
    let generator: Rc<dyn Generator> = match kind {
        GeneratorKind::Keyframes => Rc::new(KeyframesGenerator::new(
            keyframes,
            options.times.as_deref(),
            &options.ease,
            options.duration.unwrap_or(cfg.default_duration),
        )?),
        GeneratorKind::Spring => {
            let (origin, target) = numeric_endpoints(keyframes)?;
            Rc::new(Spring::new(
                SpringOptions {
                    origin,
                    target,
                    velocity,
                    stiffness: options.stiffness,
                    damping: options.damping,
                    mass: options.mass,
                    duration: options.duration,
                    bounce: options.bounce,
                    visual_duration: options.visual_duration,
                    rest_speed: options.rest_speed,
                    rest_delta: options.rest_delta,
                },
                cfg,
            ))
        }
        GeneratorKind::Inertia => {
            let (origin, _) = numeric_endpoints(keyframes)?;
            Rc::new(Inertia::new(
                InertiaOptions {
                    origin,
                    velocity,
                    power: options.power,
                    time_constant: options.time_constant,
                    min: options.min,
                    max: options.max,
                    bounce_stiffness: options.bounce_stiffness,
                    bounce_damping: options.bounce_damping,
                    rest_delta: options.rest_delta,
                    rest_speed: options.rest_speed,
                    modify_target: options.modify_target.clone(),
                },
                cfg,
            ))
        }
    };
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_rejects_non_numeric_springs() {
        let opts = AnimationOptions::spring(["a", "b"]);
        let frames = vec![Value::from("a"), Value::from("b")];
        let err = create_generator(
            GeneratorKind::Spring,
            &frames,
            &opts,
            0.0,
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MotionError::IncompatibleValues { .. }));
    }

    #[test]
    fn factory_builds_each_kind() {
        let cfg = Config::default();
        let frames = vec![Value::Number(0.0), Value::Number(1.0)];
        let opts = AnimationOptions::tween([0.0, 1.0]);
        for kind in [
            GeneratorKind::Keyframes,
            GeneratorKind::Spring,
            GeneratorKind::Inertia,
        ] {
            let g = create_generator(kind, &frames, &opts, 0.0, &cfg).unwrap();
            assert_eq!(g.next(0.0).value, Value::Number(0.0));
        }
    }
}
