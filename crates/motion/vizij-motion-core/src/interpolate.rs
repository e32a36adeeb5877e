//! Piecewise mapping from an input range to output values.
//!
//! Model:
//! - `input` is a monotonic list of stops (either direction), `output` the values at those stops.
//! - Segment `i` mixes `output[i] → output[i+1]` with its own easing.
//! - Inputs outside the range are clamped unless clamping is disabled.

use std::rc::Rc;

use crate::easing::Easing;
use crate::error::MotionError;
use crate::mix::Mixer;
use crate::value::Value;

/// Builds a mixer for a pair of values; replaces the type-selected default.
pub type MixerFactory = Rc<dyn Fn(&Value, &Value) -> Result<Mixer, MotionError>>;

#[derive(Clone, Default)]
pub struct InterpolateOptions {
    /// Disable clamping to extrapolate past the first/last stop.
    pub unclamped: bool,
    /// One easing per segment; missing entries are linear.
    pub ease: Vec<Easing>,
    pub mixer: Option<MixerFactory>,
}

/// Progress of `value` between `from` and `to` (1 when the range is empty).
#[inline]
pub fn progress(from: f64, to: f64, value: f64) -> f64 {
    let range = to - from;
    if range == 0.0 {
        1.0
    } else {
        (value - from) / range
    }
}

#[derive(Clone, Debug)]
enum Segments {
    Constant(Value),
    Mixed {
        input: Vec<f64>,
        mixers: Vec<Mixer>,
        ease: Vec<Easing>,
        zero_range: bool,
    },
}

/// A compiled input → output mapping.
#[derive(Clone, Debug)]
pub struct Interpolator {
    segments: Segments,
    clamp: bool,
}

impl Interpolator {
    pub fn new(
        input: &[f64],
        output: &[Value],
        options: InterpolateOptions,
    ) -> Result<Self, MotionError> {
        if input.len() != output.len() {
            return Err(MotionError::InterpolationLength {
                input: input.len(),
                output: output.len(),
            });
        }
        if output.is_empty() {
            return Err(MotionError::EmptyKeyframes {
                value: "interpolate".into(),
            });
        }
        let clamp = !options.unclamped;
        if output.len() == 1 || (output.len() == 2 && output[0] == output[1]) {
            let last = output.len() - 1;
            return Ok(Self {
                segments: Segments::Constant(output[last].clone()),
                clamp,
            });
        }

        let mut input = input.to_vec();
        let mut output = output.to_vec();
        let zero_range = input[0] == input[1];
        if input[0] > input[input.len() - 1] {
            input.reverse();
            output.reverse();
        }

        let mut mixers = Vec::with_capacity(output.len() - 1);
        for pair in output.windows(2) {
            let mixer = match &options.mixer {
                Some(factory) => factory(&pair[0], &pair[1])?,
                None => Mixer::new(&pair[0], &pair[1])?,
            };
            mixers.push(mixer);
        }
        let ease = (0..mixers.len())
            .map(|i| options.ease.get(i).cloned().unwrap_or(Easing::Linear))
            .collect();

        Ok(Self {
            segments: Segments::Mixed {
                input,
                mixers,
                ease,
                zero_range,
            },
            clamp,
        })
    }

    pub fn at(&self, v: f64) -> Value {
        match &self.segments {
            Segments::Constant(value) => value.clone(),
            Segments::Mixed {
                input,
                mixers,
                ease,
                zero_range,
            } => {
                let last = input.len() - 1;
                let v = if self.clamp {
                    v.clamp(input[0], input[last])
                } else {
                    v
                };
                if *zero_range && v < input[0] {
                    return mixers[0].mix(0.0);
                }
                let mut i = 0;
                if mixers.len() > 1 {
                    while i < input.len() - 2 {
                        if v < input[i + 1] {
                            break;
                        }
                        i += 1;
                    }
                }
                let p = progress(input[i], input[i + 1], v);
                mixers[i].mix(ease[i].apply(p))
            }
        }
    }
}

/// One-shot convenience over [`Interpolator::new`].
pub fn interpolate(
    input: &[f64],
    output: &[Value],
    options: InterpolateOptions,
) -> Result<Interpolator, MotionError> {
    Interpolator::new(input, output, options)
}
