//! Whether an animation may run on the compositor.

use serde::{Deserialize, Serialize};

use crate::easing::{EaseSpec, Easing};
use crate::options::{AnimationOptions, GeneratorKind, RepeatType};
use crate::playback::sink::ValueSink;

use super::backend::CompositorEasing;

/// Properties a compositor can animate without layout or paint.
pub const ACCELERATED_PROPERTIES: [&str; 5] =
    ["opacity", "clipPath", "filter", "transform", "backgroundColor"];

/// Platform features, probed once by the host and injected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Capabilities {
    /// A compositor backend is available at all.
    pub compositor: bool,
    /// The compositor accepts sampled linear curves as easing.
    pub linear_easing: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn full() -> Self {
        Self {
            compositor: true,
            linear_easing: true,
        }
    }
}

/// `background-color` → `backgroundColor`.
pub fn normalize_property(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn is_accelerated_property(name: &str) -> bool {
    let name = normalize_property(name);
    ACCELERATED_PROPERTIES.contains(&name.as_str())
}

/// Eligibility for compositor playback.
pub fn supports_acceleration(
    property: &str,
    options: &AnimationOptions,
    sink: &dyn ValueSink,
    caps: &Capabilities,
) -> bool {
    caps.compositor
        && is_accelerated_property(property)
        && !sink.requires_frame_updates()
        && options.repeat_delay == 0.0
        && options.repeat_type != RepeatType::Mirror
        && options.damping != Some(0.0)
        && options.kind != GeneratorKind::Inertia
}

fn cubic_bezier_for(easing: &Easing) -> Option<[f64; 4]> {
    match easing {
        Easing::CircIn => Some([0.55, 0.0, 1.0, 0.45]),
        Easing::CircOut => Some([0.0, 0.55, 0.45, 1.0]),
        Easing::BackIn => Some([0.31, 0.01, 0.66, -0.59]),
        other => other.as_cubic_bezier(),
    }
}

/// Number of samples for a linear curve covering `duration_ms`.
fn linear_curve_points(duration_ms: f64) -> usize {
    ((duration_ms / 10.0).round() as usize).max(2)
}

/// Translate an easing for the compositor; `None` when it cannot be expressed.
pub fn map_easing(
    easing: &Easing,
    duration_ms: f64,
    caps: &Capabilities,
) -> Option<CompositorEasing> {
    if *easing == Easing::Linear {
        return Some(CompositorEasing::Named("linear".into()));
    }
    if let Some(ctrl) = cubic_bezier_for(easing) {
        return Some(CompositorEasing::CubicBezier(ctrl));
    }
    if caps.linear_easing {
        return Some(CompositorEasing::LinearCurve(
            easing.sample_points(linear_curve_points(duration_ms)),
        ));
    }
    None
}

pub fn is_easing_supported(ease: &EaseSpec, duration_ms: f64, caps: &Capabilities) -> bool {
    ease.as_list()
        .iter()
        .all(|easing| map_easing(easing, duration_ms, caps).is_some())
}
