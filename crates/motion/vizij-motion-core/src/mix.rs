//! Value mixers.
//!
//! A [`Mixer`] is built once per keyframe segment and evaluated every frame:
//! - numbers: linear
//! - colors: RGB mixed in squared (light-linear) space, alpha linear
//! - composite strings: numbers inside matching templates mixed linearly
//! - arrays/objects: element-wise / key-wise
//! - anything else: immediate switch once progress leaves 0

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::MotionError;
use crate::value::{Rgba, Value};

/// Linear interpolation of scalars.
#[inline]
pub fn mix_number(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

#[inline]
fn mix_channel(from: f64, to: f64, progress: f64) -> f64 {
    let from_sq = from * from;
    let expo = progress * (to * to - from_sq) + from_sq;
    if expo < 0.0 {
        0.0
    } else {
        expo.sqrt()
    }
}

/// Color mix with RGB blended in squared space to avoid the dark midpoint of naive lerp.
pub fn mix_color(from: Rgba, to: Rgba, progress: f64) -> Rgba {
    Rgba {
        r: mix_channel(from.r, to.r, progress),
        g: mix_channel(from.g, to.g, progress),
        b: mix_channel(from.b, to.b, progress),
        a: mix_number(from.a, to.a, progress),
    }
}

/// Literal parts of a string around the numbers it contains.
#[derive(Clone, Debug, PartialEq)]
struct Template {
    parts: Vec<String>,
    numbers: Vec<f64>,
}

fn number_end(bytes: &[u8], start: usize) -> Option<usize> {
    let digit = |i: usize| bytes.get(i).is_some_and(|b| b.is_ascii_digit());
    let mut i = start;
    if matches!(bytes.get(i), Some(b'-') | Some(b'+')) {
        i += 1;
    }
    let int_start = i;
    while digit(i) {
        i += 1;
    }
    let mut has_digits = i > int_start;
    if bytes.get(i) == Some(&b'.') && digit(i + 1) {
        i += 1;
        while digit(i) {
            i += 1;
        }
        has_digits = true;
    }
    if !has_digits {
        return None;
    }
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-') | Some(b'+')) {
            j += 1;
        }
        if digit(j) {
            while digit(j) {
                j += 1;
            }
            i = j;
        }
    }
    Some(i)
}

fn analyse(text: &str) -> Template {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut numbers = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = number_end(bytes, i) {
            if let Ok(n) = text[i..end].parse::<f64>() {
                parts.push(text[literal_start..i].to_string());
                numbers.push(n);
                literal_start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    parts.push(text[literal_start..].to_string());
    Template { parts, numbers }
}

fn sanitize(v: f64) -> f64 {
    (v * 100_000.0).round() / 100_000.0
}

fn render(parts: &[String], numbers: impl Iterator<Item = f64>) -> String {
    let mut out = String::new();
    let mut numbers = numbers;
    for (i, part) in parts.iter().enumerate() {
        out.push_str(part);
        if i + 1 < parts.len() {
            if let Some(n) = numbers.next() {
                out.push_str(&sanitize(n).to_string());
            }
        }
    }
    out
}

/// Custom mixer function for values the built-in mixers do not understand.
pub type MixFn = Rc<dyn Fn(f64) -> Value>;

/// A precomputed mixer for one keyframe segment.
#[derive(Clone)]
pub enum Mixer {
    Number(f64, f64),
    Color(Rgba, Rgba),
    Complex {
        parts: Vec<String>,
        from: Vec<f64>,
        to: Vec<f64>,
    },
    Array(Vec<Mixer>),
    Object(Vec<(String, Mixer)>),
    /// Switches from `from` to `to` as soon as progress is above zero.
    Immediate(Value, Value),
    Custom(MixFn),
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mixer::Number(a, b) => f.debug_tuple("Number").field(a).field(b).finish(),
            Mixer::Color(a, b) => f.debug_tuple("Color").field(a).field(b).finish(),
            Mixer::Complex { parts, from, to } => f
                .debug_struct("Complex")
                .field("parts", parts)
                .field("from", from)
                .field("to", to)
                .finish(),
            Mixer::Array(m) => f.debug_tuple("Array").field(m).finish(),
            Mixer::Object(m) => f.debug_tuple("Object").field(m).finish(),
            Mixer::Immediate(a, b) => f.debug_tuple("Immediate").field(a).field(b).finish(),
            Mixer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Mixer {
    /// Select a mixer by the value types at both ends of a segment.
    pub fn new(from: &Value, to: &Value) -> Result<Self, MotionError> {
        let mixer = match (from, to) {
            (Value::Number(a), Value::Number(b)) => Mixer::Number(*a, *b),
            (Value::Color(a), Value::Color(b)) => Mixer::Color(*a, *b),
            (Value::Text(a), Value::Text(b)) => {
                let ta = analyse(a);
                let tb = analyse(b);
                if ta.parts == tb.parts && !ta.numbers.is_empty() {
                    Mixer::Complex {
                        parts: ta.parts,
                        from: ta.numbers,
                        to: tb.numbers,
                    }
                } else {
                    log::debug!("'{a}' and '{b}' do not share a template; switching immediately");
                    Mixer::Immediate(from.clone(), to.clone())
                }
            }
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return Err(MotionError::IncompatibleValues {
                        from: from.kind().to_string(),
                        to: to.kind().to_string(),
                        reason: format!("array lengths differ ({} vs {})", a.len(), b.len()),
                    });
                }
                Mixer::Array(
                    a.iter()
                        .zip(b.iter())
                        .map(|(x, y)| Mixer::new(x, y))
                        .collect::<Result<_, _>>()?,
                )
            }
            (Value::Object(a), Value::Object(b)) => {
                let mut entries = Vec::with_capacity(b.len());
                for (key, target) in b {
                    let mixer = match a.get(key) {
                        Some(origin) => Mixer::new(origin, target)?,
                        None => Mixer::Immediate(target.clone(), target.clone()),
                    };
                    entries.push((key.clone(), mixer));
                }
                Mixer::Object(entries)
            }
            _ => Mixer::Immediate(from.clone(), to.clone()),
        };
        Ok(mixer)
    }

    pub fn mix(&self, progress: f64) -> Value {
        match self {
            Mixer::Number(a, b) => Value::Number(mix_number(*a, *b, progress)),
            Mixer::Color(a, b) => Value::Color(mix_color(*a, *b, progress)),
            Mixer::Complex { parts, from, to } => Value::Text(render(
                parts,
                from.iter()
                    .zip(to.iter())
                    .map(|(a, b)| mix_number(*a, *b, progress)),
            )),
            Mixer::Array(items) => Value::Array(items.iter().map(|m| m.mix(progress)).collect()),
            Mixer::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, m)| (k.clone(), m.mix(progress)))
                    .collect::<BTreeMap<_, _>>(),
            ),
            Mixer::Immediate(a, b) => {
                if progress > 0.0 {
                    b.clone()
                } else {
                    a.clone()
                }
            }
            Mixer::Custom(f) => f(progress),
        }
    }

    /// Whether this segment can only be produced by sampling every frame
    /// (i.e. a compositor would interpolate it differently).
    pub fn needs_frame_sampling(&self) -> bool {
        match self {
            Mixer::Number(..) | Mixer::Immediate(..) => false,
            Mixer::Array(items) => items.iter().any(Mixer::needs_frame_sampling),
            Mixer::Object(entries) => entries.iter().any(|(_, m)| m.needs_frame_sampling()),
            Mixer::Color(..) | Mixer::Complex { .. } | Mixer::Custom(_) => true,
        }
    }
}

/// One-shot mix of two values.
pub fn mix(from: &Value, to: &Value, progress: f64) -> Result<Value, MotionError> {
    Ok(Mixer::new(from, to)?.mix(progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn numbers_mix_linearly() {
        let v = mix(&Value::Number(0.0), &Value::Number(100.0), 0.25).unwrap();
        assert_eq!(v, Value::Number(25.0));
    }

    #[test]
    fn colors_mix_in_squared_space() {
        let red = Value::rgba(255.0, 0.0, 0.0, 1.0);
        let blue = Value::rgba(0.0, 0.0, 255.0, 0.0);
        let Value::Color(c) = mix(&red, &blue, 0.5).unwrap() else {
            panic!("expected color");
        };
        let expected = (0.5f64 * 255.0 * 255.0).sqrt();
        assert_relative_eq!(c.r, expected, epsilon = 1e-9);
        assert_relative_eq!(c.b, expected, epsilon = 1e-9);
        assert_relative_eq!(c.a, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn composite_strings_share_template() {
        let v = mix(&"10px 0px".into(), &"20px 100px".into(), 0.5).unwrap();
        assert_eq!(v, Value::Text("15px 50px".into()));

        let v = mix(&"blur(0px)".into(), &"blur(-8.5px)".into(), 1.0).unwrap();
        assert_eq!(v, Value::Text("blur(-8.5px)".into()));
    }

    #[test]
    fn mismatched_templates_switch_immediately() {
        let m = Mixer::new(&"hidden".into(), &"visible".into()).unwrap();
        assert_eq!(m.mix(0.0), Value::Text("hidden".into()));
        assert_eq!(m.mix(0.01), Value::Text("visible".into()));
    }

    #[test]
    fn arrays_require_equal_length() {
        let a = Value::Array(vec![1.0.into(), 2.0.into()]);
        let b = Value::Array(vec![1.0.into()]);
        assert!(matches!(
            Mixer::new(&a, &b),
            Err(MotionError::IncompatibleValues { .. })
        ));

        let c = Value::Array(vec![3.0.into(), 4.0.into()]);
        assert_eq!(
            mix(&a, &c, 0.5).unwrap(),
            Value::Array(vec![2.0.into(), 3.0.into()])
        );
    }

    #[test]
    fn objects_mix_by_key() {
        let a: Value = serde_json::from_str(r#"{"x": 0, "y": 10}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"x": 10, "y": 20}"#).unwrap();
        let out = mix(&a, &b, 0.5).unwrap();
        let expected: Value = serde_json::from_str(r#"{"x": 5, "y": 15}"#).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn frame_sampling_classification() {
        assert!(!Mixer::Number(0.0, 1.0).needs_frame_sampling());
        let c = Mixer::new(
            &Value::rgba(0.0, 0.0, 0.0, 1.0),
            &Value::rgba(1.0, 1.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(c.needs_frame_sampling());
    }
}
