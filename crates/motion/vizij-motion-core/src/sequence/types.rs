//! Sequence description and compiled output types.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::easing::{EaseSpec, Easing};
use crate::options::{AnimationOptions, Delay, GeneratorKind, RepeatType};
use crate::value::{Keyframes, Value};

/// Where a segment (or label) starts on the timeline.
///
/// Serialized as a number (absolute ms) or a string: `"+100"` / `"-50"`
/// relative to the end of the previous segment, `"<"` for the start of the
/// previous segment, anything else names a label.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeAnchor {
    Absolute(f64),
    Relative(f64),
    PreviousStart,
    Label(String),
}

impl TimeAnchor {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s == "<" {
            return Ok(TimeAnchor::PreviousStart);
        }
        if s.starts_with('+') || s.starts_with('-') {
            return s
                .parse::<f64>()
                .map(TimeAnchor::Relative)
                .map_err(|e| format!("invalid relative time '{s}': {e}"));
        }
        Ok(TimeAnchor::Label(s.to_string()))
    }
}

impl fmt::Display for TimeAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeAnchor::Absolute(ms) => write!(f, "{ms}"),
            TimeAnchor::Relative(ms) if *ms >= 0.0 => write!(f, "+{ms}"),
            TimeAnchor::Relative(ms) => write!(f, "{ms}"),
            TimeAnchor::PreviousStart => f.write_str("<"),
            TimeAnchor::Label(name) => f.write_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for TimeAnchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(ms) => Ok(TimeAnchor::Absolute(ms)),
            Raw::Text(s) => TimeAnchor::parse(&s).map_err(de::Error::custom),
        }
    }
}

impl Serialize for TimeAnchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimeAnchor::Absolute(ms) => serializer.serialize_f64(*ms),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Timing for one step of a sequence. Unset fields fall back to the
/// sequence's default transition, then to [`crate::Config`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transition {
    #[serde(rename = "type")]
    pub kind: GeneratorKind,
    pub duration: Option<f64>,
    pub delay: Delay,
    pub ease: Option<EaseSpec>,
    pub times: Option<Vec<f64>>,
    /// Unrolled into the track, so it must stay below the configured maximum.
    pub repeat: u32,

    pub stiffness: Option<f64>,
    pub damping: Option<f64>,
    pub mass: Option<f64>,
    pub velocity: f64,
    pub bounce: Option<f64>,
    pub visual_duration: Option<f64>,
    pub rest_speed: Option<f64>,
    pub rest_delta: Option<f64>,
}

impl Transition {
    pub fn with_duration(mut self, ms: f64) -> Self {
        self.duration = Some(ms);
        self
    }

    pub fn with_delay(mut self, delay: impl Into<Delay>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.ease = Some(EaseSpec::Single(easing));
        self
    }

    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = Some(times);
        self
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn spring(stiffness: f64, damping: f64, mass: f64) -> Self {
        Self {
            kind: GeneratorKind::Spring,
            stiffness: Some(stiffness),
            damping: Some(damping),
            mass: Some(mass),
            ..Self::default()
        }
    }

    /// Generator options for building a physical easing curve.
    pub(crate) fn generator_options(&self) -> AnimationOptions {
        AnimationOptions {
            kind: self.kind,
            duration: self.duration,
            stiffness: self.stiffness,
            damping: self.damping,
            mass: self.mass,
            velocity: self.velocity,
            bounce: self.bounce,
            visual_duration: self.visual_duration,
            rest_speed: self.rest_speed,
            rest_delta: self.rest_delta,
            ..AnimationOptions::default()
        }
    }
}

/// Segment-level transition plus optional per-value replacements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentTransition {
    pub at: Option<TimeAnchor>,
    #[serde(flatten)]
    pub base: Transition,
    /// Replaces `base` entirely for the named values.
    pub overrides: IndexMap<String, Transition>,
}

impl SegmentTransition {
    pub fn at(mut self, anchor: TimeAnchor) -> Self {
        self.at = Some(anchor);
        self
    }

    pub fn with_base(mut self, base: Transition) -> Self {
        self.base = base;
        self
    }

    pub fn with_override(mut self, value: impl Into<String>, transition: Transition) -> Self {
        self.overrides.insert(value.into(), transition);
        self
    }

    /// Transition for `value`.
    ///
    /// An override is used as a whole: its unset fields fall back to the
    /// sequence default transition, not to `base`.
    pub fn for_value(&self, value: &str) -> &Transition {
        self.overrides.get(value).unwrap_or(&self.base)
    }
}

impl From<Transition> for SegmentTransition {
    fn from(base: Transition) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }
}

/// One entry of a sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Label at the current time.
    Label(String),
    LabelAt {
        name: String,
        at: TimeAnchor,
    },
    Animate {
        targets: Vec<String>,
        #[serde(deserialize_with = "keyframe_lists")]
        values: IndexMap<String, Keyframes>,
        #[serde(default)]
        transition: SegmentTransition,
    },
}

impl Segment {
    pub fn label(name: impl Into<String>) -> Self {
        Segment::Label(name.into())
    }

    pub fn label_at(name: impl Into<String>, at: TimeAnchor) -> Self {
        Segment::LabelAt {
            name: name.into(),
            at,
        }
    }

    /// Animate one value of one target.
    pub fn animate(
        target: impl Into<String>,
        value: impl Into<String>,
        keyframes: Keyframes,
        transition: impl Into<SegmentTransition>,
    ) -> Self {
        let mut values = IndexMap::new();
        values.insert(value.into(), keyframes);
        Segment::Animate {
            targets: vec![target.into()],
            values,
            transition: transition.into(),
        }
    }
}

/// A single value is shorthand for a one-element keyframe list.
fn keyframe_lists<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<IndexMap<String, Keyframes>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Option<Value>>),
        One(Value),
    }
    let raw = IndexMap::<String, OneOrMany>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, frames)| {
            let frames = match frames {
                OneOrMany::Many(list) => list,
                OneOrMany::One(v) => vec![Some(v)],
            };
            (name, frames)
        })
        .collect())
}

/// Sequence-wide options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SequenceOptions {
    /// Fallback for every segment's unset transition fields.
    pub default_transition: Transition,
    pub delay: Option<f64>,
    pub repeat: Option<u32>,
    pub repeat_type: Option<RepeatType>,
    pub repeat_delay: Option<f64>,
    pub speed: Option<f64>,
    pub autoplay: Option<bool>,
}

/// A keyframe on the absolute timeline of one target value.
#[derive(Clone, Debug, PartialEq)]
pub struct AbsoluteKeyframe {
    /// `None` holds the previous value.
    pub value: Option<Value>,
    /// Milliseconds from the start of the sequence.
    pub at: f64,
    /// Easing of the segment that starts at this keyframe.
    pub easing: Option<Easing>,
}

/// Compiled animations for one target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceDefinition {
    pub keyframes: IndexMap<String, Keyframes>,
    pub transition: IndexMap<String, AnimationOptions>,
}
