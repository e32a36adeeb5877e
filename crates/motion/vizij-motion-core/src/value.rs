//! Animatable values and keyframe lists.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// RGBA color. Channels are 0..255, alpha is 0..1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Color,
    /// Free-form string, possibly carrying numbers ("10px 20px", "blur(4px)").
    Text,
    Array,
    Object,
}

/// A value that can be written to a sink and mixed between keyframes.
///
/// Serialized untagged so keyframes read naturally in JSON:
/// `0.5`, `"10px"`, `{"r":255,"g":0,"b":0}`, `[1, 2]`, `{"x": 1}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Color(Rgba),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Color(_) => ValueKind::Color,
            Value::Text(_) => ValueKind::Text,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Value::Color(Rgba::new(r, g, b, a))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Rgba> for Value {
    fn from(v: Rgba) -> Self {
        Value::Color(v)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Number => "number",
            ValueKind::Color => "color",
            ValueKind::Text => "text",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Keyframe list as authored: `None` means "use the current value".
pub type Keyframes = Vec<Option<Value>>;

/// Build a fully specified keyframe list.
pub fn keyframes<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Keyframes {
    values.into_iter().map(|v| Some(v.into())).collect()
}

/// Fill `None` keyframes.
///
/// A leading `None` hydrates from `current`; any later `None` holds the
/// previous resolved keyframe.
pub fn resolve_keyframes(
    frames: &[Option<Value>],
    current: Option<&Value>,
    name: &str,
) -> Result<Vec<Value>, MotionError> {
    if frames.is_empty() {
        return Err(MotionError::EmptyKeyframes {
            value: name.to_string(),
        });
    }
    let mut out: Vec<Value> = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let resolved = match (frame, out.last()) {
            (Some(v), _) => v.clone(),
            (None, Some(prev)) => prev.clone(),
            (None, None) => current.cloned().ok_or_else(|| MotionError::MissingOrigin {
                value: name.to_string(),
                index,
            })?,
        };
        out.push(resolved);
    }
    Ok(out)
}
