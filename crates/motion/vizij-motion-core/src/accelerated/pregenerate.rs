//! Turn animations a compositor cannot express into explicit keyframe lists.

use crate::config::Config;
use crate::easing::{EaseSpec, Easing};
use crate::error::MotionError;
use crate::mix::Mixer;
use crate::options::{AnimationOptions, GeneratorKind};
use crate::playback::controller::PlaybackController;
use crate::value::Value;

use super::support::{is_easing_supported, Capabilities};

/// Sampled keyframes, played back with linear easing.
#[derive(Clone, Debug, PartialEq)]
pub struct PregeneratedKeyframes {
    pub keyframes: Vec<Value>,
    /// Milliseconds.
    pub duration: f64,
    pub ease: EaseSpec,
}

/// Keyframes whose segments a compositor would interpolate differently.
pub fn needs_frame_interpolation(keyframes: &[Value]) -> Result<bool, MotionError> {
    for pair in keyframes.windows(2) {
        if Mixer::new(&pair[0], &pair[1])?.needs_frame_sampling() {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn requires_pregenerated_keyframes(
    options: &AnimationOptions,
    keyframes: &[Value],
    caps: &Capabilities,
    cfg: &Config,
) -> Result<bool, MotionError> {
    if options.kind == GeneratorKind::Spring {
        return Ok(true);
    }
    let duration = options.duration.unwrap_or(cfg.default_duration);
    if !is_easing_supported(&options.ease, duration, caps) {
        return Ok(true);
    }
    needs_frame_interpolation(keyframes)
}

/// Sample a disposable controller every `cfg.pregenerate_step` ms.
///
/// Repeat and delay are left to the compositor, so the sampler plays a single
/// undelayed iteration.
pub fn pregenerate_keyframes(
    options: &AnimationOptions,
    keyframes: &[Value],
    cfg: &Config,
) -> Result<PregeneratedKeyframes, MotionError> {
    let mut single = options.clone();
    single.repeat = 0;
    single.repeat_delay = 0.0;
    single.delay = 0.0;
    single.speed = 1.0;
    let sampler = PlaybackController::new(&single, keyframes.to_vec(), cfg)?;

    let mut sampled = Vec::new();
    let mut t = 0.0;
    let mut done = false;
    while !done && t < cfg.max_generator_duration {
        let state = sampler.sample(t);
        done = state.done;
        sampled.push(state.value);
        t += cfg.pregenerate_step;
    }
    if !done {
        log::warn!(
            "pregeneration capped at {}ms before the animation settled",
            cfg.max_generator_duration
        );
    }
    Ok(PregeneratedKeyframes {
        keyframes: sampled,
        duration: t - cfg.pregenerate_step,
        ease: EaseSpec::Single(Easing::Linear),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn springs_and_colors_need_pregeneration() {
        let cfg = Config::default();
        let caps = Capabilities::full();
        let spring = AnimationOptions::spring([0.0, 1.0]);
        let frames = vec![Value::Number(0.0), Value::Number(1.0)];
        assert!(requires_pregenerated_keyframes(&spring, &frames, &caps, &cfg).unwrap());

        let tween = AnimationOptions::tween([0.0, 1.0]);
        assert!(!requires_pregenerated_keyframes(&tween, &frames, &caps, &cfg).unwrap());

        let colors = vec![
            Value::rgba(0.0, 0.0, 0.0, 1.0),
            Value::rgba(255.0, 255.0, 255.0, 1.0),
        ];
        assert!(requires_pregenerated_keyframes(&tween, &colors, &caps, &cfg).unwrap());
    }

    #[test]
    fn unsupported_easing_needs_pregeneration() {
        let cfg = Config::default();
        let caps = Capabilities {
            compositor: true,
            linear_easing: false,
        };
        let frames = vec![Value::Number(0.0), Value::Number(1.0)];
        let tween = AnimationOptions::tween([0.0, 1.0]).with_easing(Easing::Anticipate);
        assert!(requires_pregenerated_keyframes(&tween, &frames, &caps, &cfg).unwrap());
    }

    #[test]
    fn spring_samples_every_step_until_settled() {
        let cfg = Config::default();
        let options = AnimationOptions::spring([0.0, 100.0]).with_physics(100.0, 10.0, 1.0);
        let frames = vec![Value::Number(0.0), Value::Number(100.0)];
        let out = pregenerate_keyframes(&options, &frames, &cfg).unwrap();
        assert_eq!(out.ease, EaseSpec::Single(Easing::Linear));
        assert_eq!(out.keyframes[0], Value::Number(0.0));
        assert_eq!(out.keyframes.last(), Some(&Value::Number(100.0)));
        assert_eq!(
            out.duration,
            (out.keyframes.len() - 1) as f64 * cfg.pregenerate_step
        );
    }
}
