//! Analytic damped-spring generator.
//!
//! Internally time is milliseconds, angular frequencies are rad/ms and the
//! initial velocity is units/ms, so the closed forms can be evaluated on the
//! raw generator input.

use std::f64::consts::PI;

use crate::config::Config;
use crate::value::Value;

use super::duration::calc_generator_velocity;
use super::find_spring::{
    damping_ratio_for_bounce, find_spring, FindSpringOptions, DEFAULT_SPRING_DURATION,
};
use super::{Generator, GeneratorState};

const GRANULAR_SCALE: f64 = 5.0;
const GRANULAR_REST_SPEED: f64 = 0.01;
const GRANULAR_REST_DELTA: f64 = 0.005;
const DEFAULT_REST_SPEED: f64 = 2.0;
const DEFAULT_REST_DELTA: f64 = 0.5;
const MAX_HYPERBOLIC_ARG: f64 = 300.0;

/// Inputs for [`Spring::new`]. Unset physics fall back to [`Config::spring`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpringOptions {
    pub origin: f64,
    pub target: f64,
    /// Units per second.
    pub velocity: f64,
    pub stiffness: Option<f64>,
    pub damping: Option<f64>,
    pub mass: Option<f64>,
    /// Milliseconds; with `bounce`, selects the duration resolver.
    pub duration: Option<f64>,
    pub bounce: Option<f64>,
    /// Milliseconds; perceived duration of the motion, rest thresholds still apply.
    pub visual_duration: Option<f64>,
    pub rest_speed: Option<f64>,
    pub rest_delta: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Regime {
    Under { damped_freq: f64 },
    Critical,
    Over { damped_freq: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
    origin: f64,
    target: f64,
    delta: f64,
    /// Negated option velocity, units/ms.
    initial_velocity: f64,
    stiffness: f64,
    damping: f64,
    mass: f64,
    damping_ratio: f64,
    /// rad/ms
    undamped_freq: f64,
    regime: Regime,
    rest_speed: f64,
    rest_delta: f64,
    /// Set when the physics were resolved from a duration; the spring then ends exactly there.
    resolved_duration: Option<f64>,
    velocity_sample: f64,
}

impl Spring {
    pub fn new(options: SpringOptions, cfg: &Config) -> Self {
        let SpringOptions {
            origin,
            target,
            velocity,
            ..
        } = options;
        let delta = target - origin;
        let has_physics =
            options.stiffness.is_some() || options.damping.is_some() || options.mass.is_some();
        let has_duration = options.duration.is_some() || options.bounce.is_some();

        let mut stiffness = options.stiffness.unwrap_or(cfg.spring.stiffness);
        let mut damping = options.damping.unwrap_or(cfg.spring.damping);
        let mut mass = options.mass.unwrap_or(cfg.spring.mass);
        let mut resolved_duration = None;

        if !has_physics {
            if let Some(visual) = options.visual_duration {
                let root = 2.0 * PI / (visual / 1000.0 * 1.2);
                stiffness = root * root;
                damping = 2.0
                    * damping_ratio_for_bounce(options.bounce.unwrap_or(0.0))
                    * stiffness.sqrt();
                mass = 1.0;
            } else if has_duration {
                let normalised_velocity = if delta == 0.0 {
                    0.0
                } else {
                    -velocity / delta.abs()
                };
                let mut find = FindSpringOptions {
                    velocity: normalised_velocity,
                    ..FindSpringOptions::default()
                };
                find.duration = options.duration.unwrap_or(DEFAULT_SPRING_DURATION);
                if let Some(bounce) = options.bounce {
                    find.bounce = bounce;
                }
                let resolved = find_spring(find, cfg.spring);
                stiffness = resolved.stiffness;
                damping = resolved.damping;
                mass = 1.0;
                resolved_duration = Some(resolved.duration);
            }
        }

        let damping_ratio = damping / (2.0 * (stiffness * mass).sqrt());
        let undamped_freq = (stiffness / mass).sqrt() / 1000.0;
        let regime = if damping_ratio < 1.0 {
            Regime::Under {
                damped_freq: undamped_freq * (1.0 - damping_ratio * damping_ratio).sqrt(),
            }
        } else if damping_ratio == 1.0 {
            Regime::Critical
        } else {
            Regime::Over {
                damped_freq: undamped_freq * (damping_ratio * damping_ratio - 1.0).sqrt(),
            }
        };

        let granular = delta.abs() < GRANULAR_SCALE;
        let rest_speed = options.rest_speed.unwrap_or(if granular {
            GRANULAR_REST_SPEED
        } else {
            DEFAULT_REST_SPEED
        });
        let rest_delta = options.rest_delta.unwrap_or(if granular {
            GRANULAR_REST_DELTA
        } else {
            DEFAULT_REST_DELTA
        });

        Self {
            origin,
            target,
            delta,
            initial_velocity: -velocity / 1000.0,
            stiffness,
            damping,
            mass,
            damping_ratio,
            undamped_freq,
            regime,
            rest_speed,
            rest_delta,
            resolved_duration,
            velocity_sample: cfg.velocity_sample_delta,
        }
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Raw closed-form position at `t` ms, with no rest snapping.
    pub fn position(&self, t: f64) -> f64 {
        let zw = self.damping_ratio * self.undamped_freq;
        let (v0, d) = (self.initial_velocity, self.delta);
        match self.regime {
            Regime::Under { damped_freq } => {
                let envelope = (-zw * t).exp();
                self.target
                    - envelope
                        * (((v0 + zw * d) / damped_freq) * (damped_freq * t).sin()
                            + d * (damped_freq * t).cos())
            }
            Regime::Critical => {
                let w = self.undamped_freq;
                self.target - (-w * t).exp() * (d + (v0 + w * d) * t)
            }
            Regime::Over { damped_freq } => {
                let envelope = (-zw * t).exp();
                let arg = (damped_freq * t).min(MAX_HYPERBOLIC_ARG);
                self.target
                    - (envelope * ((v0 + zw * d) * arg.sinh() + damped_freq * d * arg.cosh()))
                        / damped_freq
            }
        }
    }

    /// Velocity at `t` in units/s (exact at 0, backward difference elsewhere).
    pub fn velocity_at(&self, t: f64) -> f64 {
        if t == 0.0 {
            -self.initial_velocity * 1000.0
        } else {
            calc_generator_velocity(|s| self.position(s), t, self.position(t), self.velocity_sample)
        }
    }
}

impl Generator for Spring {
    fn next(&self, t: f64) -> GeneratorState {
        let current = self.position(t);
        let done = match self.resolved_duration {
            Some(duration) => t >= duration,
            None => {
                self.velocity_at(t).abs() <= self.rest_speed
                    && (self.target - current).abs() <= self.rest_delta
            }
        };
        let value = if done { self.target } else { current };
        GeneratorState {
            value: Value::Number(value),
            done,
        }
    }

    fn calculated_duration(&self) -> Option<f64> {
        self.resolved_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::calc_generator_duration;
    use approx::assert_relative_eq;

    fn physics(origin: f64, target: f64, k: f64, c: f64, m: f64) -> Spring {
        Spring::new(
            SpringOptions {
                origin,
                target,
                stiffness: Some(k),
                damping: Some(c),
                mass: Some(m),
                ..Default::default()
            },
            &Config::default(),
        )
    }

    fn num(s: GeneratorState) -> f64 {
        s.value.as_number().unwrap()
    }

    #[test]
    fn underdamped_spring_overshoots_and_settles() {
        let spring = physics(0.0, 1.0, 100.0, 10.0, 1.0);
        assert_eq!(num(spring.next(0.0)), 0.0);
        let peak = (0..200)
            .map(|i| spring.position(i as f64 * 10.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
        let end = spring.next(5000.0);
        assert!(end.done);
        assert_eq!(num(end), 1.0);
    }

    #[test]
    fn initial_slope_matches_velocity() {
        let spring = Spring::new(
            SpringOptions {
                origin: 0.0,
                target: 0.0,
                velocity: 500.0,
                ..Default::default()
            },
            &Config::default(),
        );
        let slope = (spring.position(0.01) - spring.position(0.0)) / 0.01 * 1000.0;
        assert_relative_eq!(slope, 500.0, epsilon = 1.0);
        assert_eq!(spring.velocity_at(0.0), 500.0);
    }

    #[test]
    fn critical_and_overdamped_regimes_approach_target() {
        let critical = physics(0.0, 100.0, 100.0, 20.0, 1.0);
        let over = physics(0.0, 100.0, 100.0, 60.0, 1.0);
        for spring in [&critical, &over] {
            let mut last = 0.0;
            for i in 1..100 {
                let v = spring.position(i as f64 * 20.0);
                assert!(v >= last - 1e-9 && v <= 100.0 + 1e-9);
                last = v;
            }
        }
        assert!(calc_generator_duration(&over, &Config::default()).is_finite());
    }

    #[test]
    fn granular_deltas_use_tighter_thresholds() {
        let spring = physics(0.0, 1.0, 100.0, 10.0, 1.0);
        assert_eq!(spring.rest_delta, GRANULAR_REST_DELTA);
        let spring = physics(0.0, 100.0, 100.0, 10.0, 1.0);
        assert_eq!(spring.rest_speed, DEFAULT_REST_SPEED);
    }

    #[test]
    fn duration_resolved_spring_matches_physics_equivalent() {
        let cfg = Config::default();
        let resolved = Spring::new(
            SpringOptions {
                origin: 0.0,
                target: 100.0,
                duration: Some(600.0),
                bounce: Some(0.2),
                ..Default::default()
            },
            &cfg,
        );
        assert_relative_eq!(resolved.calculated_duration().unwrap(), 600.0, epsilon = 1e-9);
        let direct = physics(0.0, 100.0, resolved.stiffness(), resolved.damping(), 1.0);
        for i in 0..60 {
            let t = i as f64 * 10.0;
            assert_relative_eq!(resolved.position(t), direct.position(t), epsilon = 1e-9);
        }
        assert!(resolved.next(601.0).done);
        assert!(!resolved.next(590.0).done);
    }

    #[test]
    fn visual_duration_derives_physics() {
        let spring = Spring::new(
            SpringOptions {
                origin: 0.0,
                target: 100.0,
                visual_duration: Some(500.0),
                bounce: Some(0.0),
                ..Default::default()
            },
            &Config::default(),
        );
        assert_eq!(spring.calculated_duration(), None);
        assert_relative_eq!(spring.damping_ratio(), 1.0, epsilon = 1e-9);
        let root = 2.0 * PI / 0.6;
        assert_relative_eq!(spring.stiffness(), root * root, epsilon = 1e-9);
    }

    #[test]
    fn sampling_is_idempotent() {
        let spring = physics(10.0, -40.0, 300.0, 15.0, 2.0);
        assert_eq!(spring.next(123.0), spring.next(123.0));
    }
}
