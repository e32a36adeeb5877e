//! Easing curves.
//!
//! Named curves follow the usual motion vocabulary (`easeIn`, `backOut`, ...).
//! Cubic beziers are solved by bisection on x. A [`GeneratorEasing`] turns a
//! physical generator (e.g. a spring) into a duration-based curve so it can sit
//! inside a keyframe timeline.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::MotionError;
use crate::generators::Generator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepPosition {
    Start,
    End,
}

/// A progress → progress curve evaluated on [0, 1].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    CircIn,
    CircOut,
    CircInOut,
    BackIn,
    BackOut,
    BackInOut,
    Anticipate,
    /// Control points `[x1, y1, x2, y2]`.
    CubicBezier([f64; 4]),
    Steps {
        count: u32,
        position: StepPosition,
    },
    /// A generator sampled over a fixed duration and normalised by its scale.
    Generator(GeneratorEasing),
}

const EASE_IN: [f64; 4] = [0.42, 0.0, 1.0, 1.0];
const EASE_OUT: [f64; 4] = [0.0, 0.0, 0.58, 1.0];
const EASE_IN_OUT: [f64; 4] = [0.42, 0.0, 0.58, 1.0];
const BACK_OUT: [f64; 4] = [0.33, 1.53, 0.69, 0.99];

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p1: f64, p2: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

/// Solve x(t) = progress by bisection and return y(t).
fn bezier_ease(progress: f64, [x1, y1, x2, y2]: [f64; 4]) -> f64 {
    if x1 == y1 && x2 == y2 {
        return progress;
    }
    if progress <= 0.0 || progress >= 1.0 {
        return progress;
    }
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = progress;
    for _ in 0..32 {
        let x = cubic_bezier(x1, x2, mid);
        if (x - progress).abs() < 1e-7 {
            break;
        }
        if x < progress {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(y1, y2, mid)
}

#[inline]
fn reverse(f: impl Fn(f64) -> f64, p: f64) -> f64 {
    1.0 - f(1.0 - p)
}

#[inline]
fn mirror(f: impl Fn(f64) -> f64, p: f64) -> f64 {
    if p <= 0.5 {
        f(2.0 * p) / 2.0
    } else {
        (2.0 - f(2.0 * (1.0 - p))) / 2.0
    }
}

fn circ_in(p: f64) -> f64 {
    1.0 - p.clamp(-1.0, 1.0).acos().sin()
}

fn back_in(p: f64) -> f64 {
    reverse(|q| bezier_ease(q, BACK_OUT), p)
}

impl Easing {
    /// Look up a named easing (`"easeInOut"`, `"linear"`, `"backOut"`, ...).
    pub fn from_name(name: &str) -> Result<Self, MotionError> {
        let easing = match name {
            "linear" => Easing::Linear,
            "easeIn" => Easing::EaseIn,
            "easeOut" => Easing::EaseOut,
            "easeInOut" => Easing::EaseInOut,
            "circIn" => Easing::CircIn,
            "circOut" => Easing::CircOut,
            "circInOut" => Easing::CircInOut,
            "backIn" => Easing::BackIn,
            "backOut" => Easing::BackOut,
            "backInOut" => Easing::BackInOut,
            "anticipate" => Easing::Anticipate,
            _ => {
                return Err(MotionError::UnknownEasing {
                    name: name.to_string(),
                })
            }
        };
        Ok(easing)
    }

    /// Canonical name for named curves.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "easeIn",
            Easing::EaseOut => "easeOut",
            Easing::EaseInOut => "easeInOut",
            Easing::CircIn => "circIn",
            Easing::CircOut => "circOut",
            Easing::CircInOut => "circInOut",
            Easing::BackIn => "backIn",
            Easing::BackOut => "backOut",
            Easing::BackInOut => "backInOut",
            Easing::Anticipate => "anticipate",
            _ => return None,
        };
        Some(name)
    }

    /// Apply the easing function to a progress value (0.0 to 1.0).
    pub fn apply(&self, p: f64) -> f64 {
        match self {
            Easing::Linear => p,
            Easing::EaseIn => bezier_ease(p, EASE_IN),
            Easing::EaseOut => bezier_ease(p, EASE_OUT),
            Easing::EaseInOut => bezier_ease(p, EASE_IN_OUT),
            Easing::CircIn => circ_in(p),
            Easing::CircOut => reverse(circ_in, p),
            Easing::CircInOut => mirror(circ_in, p),
            Easing::BackIn => back_in(p),
            Easing::BackOut => bezier_ease(p, BACK_OUT),
            Easing::BackInOut => mirror(back_in, p),
            Easing::Anticipate => {
                let p2 = p * 2.0;
                if p2 < 1.0 {
                    0.5 * back_in(p2)
                } else {
                    0.5 * (2.0 - 2f64.powf(-10.0 * (p2 - 1.0)))
                }
            }
            Easing::CubicBezier(ctrl) => bezier_ease(p, *ctrl),
            Easing::Steps { count, position } => {
                let count = (*count).max(1) as f64;
                let p = p.clamp(0.0, 1.0);
                let expanded = p * count;
                let rounded = match position {
                    StepPosition::End => expanded.floor(),
                    StepPosition::Start => expanded.ceil(),
                };
                (rounded / count).clamp(0.0, 1.0)
            }
            Easing::Generator(g) => g.apply(p),
        }
    }

    /// Bezier control points for curves a compositor can express directly.
    pub fn as_cubic_bezier(&self) -> Option<[f64; 4]> {
        match self {
            Easing::EaseIn => Some(EASE_IN),
            Easing::EaseOut => Some(EASE_OUT),
            Easing::EaseInOut => Some(EASE_IN_OUT),
            Easing::BackOut => Some(BACK_OUT),
            Easing::CubicBezier(ctrl) => Some(*ctrl),
            _ => None,
        }
    }

    /// Sample this curve into evenly spaced points (for compositors that accept linear curves).
    pub fn sample_points(&self, resolution: usize) -> Vec<f64> {
        let n = resolution.max(2);
        (0..n)
            .map(|i| self.apply(i as f64 / (n - 1) as f64))
            .collect()
    }
}

/// Duration-based curve produced by sampling a generator that animates `0 → scale`.
#[derive(Clone)]
pub struct GeneratorEasing {
    generator: Rc<dyn Generator>,
    /// Milliseconds.
    duration: f64,
    scale: f64,
}

impl GeneratorEasing {
    pub fn new(generator: Rc<dyn Generator>, duration: f64, scale: f64) -> Self {
        Self {
            generator,
            duration,
            scale: if scale == 0.0 { 1.0 } else { scale },
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn apply(&self, p: f64) -> f64 {
        match self.generator.next(self.duration * p).value.as_number() {
            Some(v) => v / self.scale,
            None => p,
        }
    }
}

impl fmt::Debug for GeneratorEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorEasing")
            .field("generator", &self.generator)
            .field("duration", &self.duration)
            .field("scale", &self.scale)
            .finish()
    }
}

impl PartialEq for GeneratorEasing {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.generator, &other.generator)
            && self.duration == other.duration
            && self.scale == other.scale
    }
}

/// Serialized form: a name, `[x1, y1, x2, y2]`, or a steps object.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EasingDef {
    Name(String),
    Bezier([f64; 4]),
    Steps {
        steps: u32,
        #[serde(default = "default_step_position")]
        position: StepPosition,
    },
}

fn default_step_position() -> StepPosition {
    StepPosition::End
}

impl TryFrom<EasingDef> for Easing {
    type Error = MotionError;

    fn try_from(def: EasingDef) -> Result<Self, Self::Error> {
        match def {
            EasingDef::Name(name) => Easing::from_name(&name),
            EasingDef::Bezier(ctrl) => Ok(Easing::CubicBezier(ctrl)),
            EasingDef::Steps { steps, position } => Ok(Easing::Steps {
                count: steps,
                position,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let def = EasingDef::deserialize(deserializer)?;
        Easing::try_from(def).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Easing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let def = match self {
            Easing::CubicBezier(ctrl) => EasingDef::Bezier(*ctrl),
            Easing::Steps { count, position } => EasingDef::Steps {
                steps: *count,
                position: *position,
            },
            Easing::Generator(_) => {
                return Err(serde::ser::Error::custom(
                    "generator-backed easing has no serialized form",
                ))
            }
            named => EasingDef::Name(named.name().unwrap_or("linear").to_string()),
        };
        def.serialize(serializer)
    }
}

/// A single easing or one easing per keyframe segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EaseSpec {
    Single(Easing),
    PerSegment(Vec<Easing>),
}

impl EaseSpec {
    /// Easing for segment `i`, wrapping around a per-segment list.
    pub fn for_segment(&self, i: usize) -> Easing {
        match self {
            EaseSpec::Single(e) => e.clone(),
            EaseSpec::PerSegment(list) if !list.is_empty() => list[i % list.len()].clone(),
            EaseSpec::PerSegment(_) => Easing::default(),
        }
    }

    /// Expand to exactly `segments` easings; missing slots get `easeInOut`.
    pub fn expand(&self, segments: usize) -> Vec<Easing> {
        match self {
            EaseSpec::Single(e) => vec![e.clone(); segments],
            EaseSpec::PerSegment(list) => (0..segments)
                .map(|i| list.get(i).cloned().unwrap_or_default())
                .collect(),
        }
    }

    pub fn as_list(&self) -> Vec<Easing> {
        match self {
            EaseSpec::Single(e) => vec![e.clone()],
            EaseSpec::PerSegment(list) => list.clone(),
        }
    }
}

impl Default for EaseSpec {
    fn default() -> Self {
        EaseSpec::Single(Easing::EaseInOut)
    }
}

impl From<Easing> for EaseSpec {
    fn from(e: Easing) -> Self {
        EaseSpec::Single(e)
    }
}

impl From<Vec<Easing>> for EaseSpec {
    fn from(list: Vec<Easing>) -> Self {
        EaseSpec::PerSegment(list)
    }
}
