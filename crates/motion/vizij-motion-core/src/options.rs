//! Animation options shared by every generator kind.
//!
//! Times are milliseconds, velocities are units per second.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::easing::{EaseSpec, Easing};
use crate::value::{Keyframes, Value};

/// Closed set of generator kinds; each has one factory in [`crate::generators`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneratorKind {
    #[default]
    #[serde(alias = "tween")]
    Keyframes,
    Spring,
    #[serde(alias = "decay")]
    Inertia,
}

impl GeneratorKind {
    /// Physical generators have no intrinsic duration and only animate numbers.
    #[inline]
    pub fn is_physical(&self) -> bool {
        matches!(self, Self::Spring | Self::Inertia)
    }
}

/// How odd iterations of a repeating animation are played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatType {
    #[default]
    Loop,
    /// Odd iterations run backwards through the same curve.
    Reverse,
    /// Odd iterations run a second generator built from reversed keyframes.
    Mirror,
}

/// Repeat count meaning "forever".
pub const REPEAT_FOREVER: u32 = u32::MAX;

/// Maps the ideal resting point of an inertia animation to the actual one (e.g. snap to grid).
#[derive(Clone)]
pub struct TargetModifier(Rc<dyn Fn(f64) -> f64>);

impl TargetModifier {
    pub fn new(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn apply(&self, ideal: f64) -> f64 {
        (self.0)(ideal)
    }
}

impl fmt::Debug for TargetModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TargetModifier(..)")
    }
}

impl PartialEq for TargetModifier {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Start delay of a sequence step, optionally staggered across its targets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Delay {
    Fixed(f64),
    /// `start + each * index`, counted from the first or last target.
    #[serde(rename_all = "camelCase")]
    Stagger {
        each: f64,
        #[serde(default)]
        start: f64,
        #[serde(default)]
        from_last: bool,
    },
}

impl Delay {
    /// Delay for target `index` of `count`.
    pub fn resolve(&self, index: usize, count: usize) -> f64 {
        match *self {
            Delay::Fixed(ms) => ms,
            Delay::Stagger {
                each,
                start,
                from_last,
            } => {
                let position = if from_last {
                    count.saturating_sub(1).saturating_sub(index)
                } else {
                    index
                };
                start + each * position as f64
            }
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Fixed(0.0)
    }
}

impl From<f64> for Delay {
    fn from(ms: f64) -> Self {
        Delay::Fixed(ms)
    }
}

/// Everything needed to build and play one animated value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationOptions {
    /// At least one entry; `None` hydrates from the sink's current value.
    pub keyframes: Keyframes,
    #[serde(rename = "type")]
    pub kind: GeneratorKind,

    /// Normalised offsets for each keyframe (tween only).
    pub times: Option<Vec<f64>>,
    pub ease: EaseSpec,

    /// Duration of one iteration. Tween default comes from [`crate::Config`];
    /// for springs a duration (or bounce) selects the duration resolver.
    pub duration: Option<f64>,
    pub delay: f64,
    pub repeat: u32,
    pub repeat_type: RepeatType,
    pub repeat_delay: f64,

    pub stiffness: Option<f64>,
    pub damping: Option<f64>,
    pub mass: Option<f64>,
    /// Initial velocity, units per second.
    pub velocity: f64,
    pub bounce: Option<f64>,
    pub visual_duration: Option<f64>,
    pub rest_speed: Option<f64>,
    pub rest_delta: Option<f64>,

    pub power: Option<f64>,
    pub time_constant: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub bounce_stiffness: Option<f64>,
    pub bounce_damping: Option<f64>,
    #[serde(skip)]
    pub modify_target: Option<TargetModifier>,

    /// Initial playback rate; negative plays backwards.
    pub speed: f64,
    /// Start playing as soon as the animation is created.
    pub autoplay: bool,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            keyframes: Vec::new(),
            kind: GeneratorKind::Keyframes,
            times: None,
            ease: EaseSpec::default(),
            duration: None,
            delay: 0.0,
            repeat: 0,
            repeat_type: RepeatType::Loop,
            repeat_delay: 0.0,
            stiffness: None,
            damping: None,
            mass: None,
            velocity: 0.0,
            bounce: None,
            visual_duration: None,
            rest_speed: None,
            rest_delta: None,
            power: None,
            time_constant: None,
            min: None,
            max: None,
            bounce_stiffness: None,
            bounce_damping: None,
            modify_target: None,
            speed: 1.0,
            autoplay: true,
        }
    }
}

impl AnimationOptions {
    /// Tween through fully specified keyframes.
    pub fn tween<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            keyframes: crate::value::keyframes(values),
            ..Self::default()
        }
    }

    /// Spring between the first and last keyframe.
    pub fn spring<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            keyframes: crate::value::keyframes(values),
            kind: GeneratorKind::Spring,
            ..Self::default()
        }
    }

    /// Decay from `origin` with an initial velocity.
    pub fn inertia(origin: f64, velocity: f64) -> Self {
        Self {
            keyframes: vec![Some(Value::Number(origin))],
            kind: GeneratorKind::Inertia,
            velocity,
            ..Self::default()
        }
    }

    pub fn with_keyframes(mut self, keyframes: Keyframes) -> Self {
        self.keyframes = keyframes;
        self
    }

    pub fn with_duration(mut self, ms: f64) -> Self {
        self.duration = Some(ms);
        self
    }

    pub fn with_delay(mut self, ms: f64) -> Self {
        self.delay = ms;
        self
    }

    pub fn with_ease(mut self, ease: impl Into<EaseSpec>) -> Self {
        self.ease = ease.into();
        self
    }

    pub fn with_easing(self, easing: Easing) -> Self {
        self.with_ease(easing)
    }

    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = Some(times);
        self
    }

    pub fn with_repeat(mut self, repeat: u32, repeat_type: RepeatType) -> Self {
        self.repeat = repeat;
        self.repeat_type = repeat_type;
        self
    }

    pub fn with_repeat_delay(mut self, ms: f64) -> Self {
        self.repeat_delay = ms;
        self
    }

    pub fn with_physics(mut self, stiffness: f64, damping: f64, mass: f64) -> Self {
        self.stiffness = Some(stiffness);
        self.damping = Some(damping);
        self.mass = Some(mass);
        self
    }

    pub fn with_bounce(mut self, bounce: f64) -> Self {
        self.bounce = Some(bounce);
        self
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_modify_target(mut self, f: impl Fn(f64) -> f64 + 'static) -> Self {
        self.modify_target = Some(TargetModifier::new(f));
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn paused(mut self) -> Self {
        self.autoplay = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let opts: AnimationOptions = serde_json::from_str(
            r#"{ "keyframes": [0, null, 100], "type": "spring", "repeatType": "mirror", "repeat": 2 }"#,
        )
        .unwrap();
        assert_eq!(opts.kind, GeneratorKind::Spring);
        assert_eq!(opts.repeat_type, RepeatType::Mirror);
        assert_eq!(opts.keyframes[1], None);
        assert_eq!(opts.speed, 1.0);
        assert!(opts.autoplay);
    }

    #[test]
    fn kind_aliases() {
        let k: GeneratorKind = serde_json::from_str(r#""decay""#).unwrap();
        assert_eq!(k, GeneratorKind::Inertia);
        let k: GeneratorKind = serde_json::from_str(r#""tween""#).unwrap();
        assert_eq!(k, GeneratorKind::Keyframes);
        assert!(GeneratorKind::Spring.is_physical());
    }

    #[test]
    fn stagger_counts_from_either_end() {
        let d: Delay = serde_json::from_str(r#"{ "each": 50, "start": 100 }"#).unwrap();
        assert_eq!(d.resolve(0, 3), 100.0);
        assert_eq!(d.resolve(2, 3), 200.0);
        let reversed = Delay::Stagger {
            each: 50.0,
            start: 0.0,
            from_last: true,
        };
        assert_eq!(reversed.resolve(0, 3), 100.0);
        assert_eq!(Delay::from(30.0).resolve(5, 6), 30.0);
    }
}
