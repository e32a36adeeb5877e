//! Compile a segment list into one keyframes animation per target value.

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::config::Config;
use crate::easing::{EaseSpec, Easing, GeneratorEasing};
use crate::error::MotionError;
use crate::generators::keyframes::default_offsets;
use crate::generators::{calc_generator_duration, create_generator};
use crate::options::{AnimationOptions, GeneratorKind};
use crate::value::{Keyframes, Value};

use super::time::calc_next_time;
use super::track::{add_keyframes, fill_offset, normalize_track};
use super::types::{AbsoluteKeyframe, Segment, SequenceDefinition, SequenceOptions, Transition};

/// Scale used for physical easing curves over non-numeric keyframes.
const DEFAULT_GENERATOR_SCALE: f64 = 100.0;

type ValueTracks = IndexMap<String, Vec<AbsoluteKeyframe>>;

/// One value of one target, ready to be spliced into its track.
struct Step {
    keyframes: Keyframes,
    offsets: Vec<f64>,
    ease: EaseSpec,
    delay: f64,
    duration: f64,
}

/// Replace a physical transition with a duration-based curve sampled from
/// a generator that animates `0 → scale`.
fn generator_easing(
    transition: &Transition,
    scale: f64,
    cfg: &Config,
) -> Result<(Easing, f64), MotionError> {
    let frames = [Value::Number(0.0), Value::Number(scale)];
    let generator = create_generator(
        transition.kind,
        &frames,
        &transition.generator_options(),
        transition.velocity,
        cfg,
    )?;
    let duration = generator
        .calculated_duration()
        .unwrap_or_else(|| calc_generator_duration(generator.as_ref(), cfg))
        .min(cfg.max_generator_duration);
    let curve = GeneratorEasing::new(generator, duration, scale);
    Ok((Easing::Generator(curve), duration))
}

fn generator_scale(keyframes: &[Option<Value>]) -> f64 {
    match keyframes {
        [Some(a), Some(b)] => match (a.as_number(), b.as_number()) {
            (Some(a), Some(b)) => (b - a).abs(),
            _ => DEFAULT_GENERATOR_SCALE,
        },
        _ => DEFAULT_GENERATOR_SCALE,
    }
}

fn resolve_step(
    value: &str,
    frames: &[Option<Value>],
    transition: &Transition,
    defaults: &Transition,
    stagger: (usize, usize),
    cfg: &Config,
) -> Result<Step, MotionError> {
    if frames.is_empty() {
        return Err(MotionError::EmptyKeyframes {
            value: value.to_string(),
        });
    }
    let mut keyframes = frames.to_vec();
    let mut offsets = transition
        .times
        .clone()
        .unwrap_or_else(|| default_offsets(keyframes.len()));
    let mut ease = transition
        .ease
        .clone()
        .or_else(|| defaults.ease.clone())
        .unwrap_or(EaseSpec::Single(Easing::EaseOut));
    let mut duration = transition.duration;

    if transition.kind.is_physical() && keyframes.len() <= 2 {
        let (curve, curve_duration) =
            generator_easing(transition, generator_scale(&keyframes), cfg)?;
        ease = EaseSpec::Single(curve);
        duration = Some(curve_duration);
    }
    let mut duration = duration
        .or(defaults.duration)
        .unwrap_or(cfg.sequence_default_duration);

    if keyframes.len() == 1 {
        keyframes.insert(0, None);
    }
    if offsets.len() == 1 && offsets[0] == 0.0 {
        offsets.push(1.0);
    }
    if offsets.len() < keyframes.len() {
        let missing = keyframes.len() - offsets.len();
        fill_offset(&mut offsets, missing);
    }

    let repeat = transition.repeat;
    if repeat > 0 {
        if repeat >= cfg.max_sequence_repeat {
            return Err(MotionError::RepeatTooHigh {
                repeat,
                max: cfg.max_sequence_repeat,
            });
        }
        let passes = f64::from(repeat) + 1.0;
        duration *= passes;
        let original_frames = keyframes.clone();
        let original_offsets = offsets.clone();
        let original_ease = ease.expand(original_frames.len().saturating_sub(1));
        let mut unrolled = original_ease.clone();
        for pass in 1..=repeat {
            keyframes.extend(original_frames.iter().cloned());
            for (k, offset) in original_offsets.iter().enumerate().take(original_frames.len()) {
                offsets.push(offset + f64::from(pass));
                unrolled.push(if k == 0 {
                    Easing::Linear
                } else {
                    original_ease[k - 1].clone()
                });
            }
        }
        for offset in offsets.iter_mut() {
            *offset /= passes;
        }
        ease = EaseSpec::PerSegment(unrolled);
    }

    Ok(Step {
        keyframes,
        offsets,
        ease,
        delay: transition.delay.resolve(stagger.0, stagger.1),
        duration,
    })
}

fn sequence_options(
    keyframes: Keyframes,
    offsets: Vec<f64>,
    easing: Vec<Easing>,
    total: f64,
    options: &SequenceOptions,
) -> AnimationOptions {
    let mut out = AnimationOptions {
        keyframes,
        kind: GeneratorKind::Keyframes,
        times: Some(offsets),
        ease: EaseSpec::PerSegment(easing),
        duration: Some(total),
        ..AnimationOptions::default()
    };
    if let Some(delay) = options.delay {
        out.delay = delay;
    }
    if let Some(repeat) = options.repeat {
        out.repeat = repeat;
    }
    if let Some(repeat_type) = options.repeat_type {
        out.repeat_type = repeat_type;
    }
    if let Some(repeat_delay) = options.repeat_delay {
        out.repeat_delay = repeat_delay;
    }
    if let Some(speed) = options.speed {
        out.speed = speed;
    }
    if let Some(autoplay) = options.autoplay {
        out.autoplay = autoplay;
    }
    out
}

/// Compile `segments` into absolute per-value keyframe animations.
///
/// Segments are processed left to right. Each animate segment starts at the
/// running time (or its `at` anchor) and advances it by its longest
/// delay + duration. Where two segments animate the same value over
/// overlapping windows, the later one replaces the earlier inside its window.
///
/// Times are milliseconds. Every returned animation spans the whole sequence.
pub fn create_animations_from_sequence(
    segments: &[Segment],
    options: &SequenceOptions,
    cfg: &Config,
) -> Result<IndexMap<String, SequenceDefinition>, MotionError> {
    let defaults = &options.default_transition;
    let mut tracks: IndexMap<String, ValueTracks> = IndexMap::new();
    let mut labels: HashMap<String, f64> = HashMap::new();
    let mut prev_time = 0.0;
    let mut current_time = 0.0;
    let mut total_duration: f64 = 0.0;

    for segment in segments {
        match segment {
            Segment::Label(name) => {
                labels.insert(name.clone(), current_time);
            }
            Segment::LabelAt { name, at } => {
                let time = calc_next_time(current_time, at, prev_time, &labels);
                labels.insert(name.clone(), time);
            }
            Segment::Animate {
                targets,
                values,
                transition,
            } => {
                if targets.is_empty() {
                    return Err(MotionError::NoTargets);
                }
                if let Some(at) = &transition.at {
                    current_time = calc_next_time(current_time, at, prev_time, &labels);
                }
                let mut max_duration: f64 = 0.0;
                for (index, target) in targets.iter().enumerate() {
                    let value_tracks = tracks.entry(target.clone()).or_default();
                    for (name, frames) in values {
                        let step = resolve_step(
                            name,
                            frames,
                            transition.for_value(name),
                            defaults,
                            (index, targets.len()),
                            cfg,
                        )?;
                        let start = current_time + step.delay;
                        let end = start + step.duration;
                        add_keyframes(
                            value_tracks.entry(name.clone()).or_default(),
                            &step.keyframes,
                            &step.ease,
                            &step.offsets,
                            start,
                            end,
                        );
                        max_duration = max_duration.max(step.delay + step.duration);
                        total_duration = total_duration.max(end);
                    }
                }
                prev_time = current_time;
                current_time += max_duration;
            }
        }
    }

    if tracks.is_empty() {
        return Err(MotionError::NoTargets);
    }
    log::debug!(
        "compiled sequence of {} segments into {} targets over {}ms",
        segments.len(),
        tracks.len(),
        total_duration
    );

    let mut definitions = IndexMap::with_capacity(tracks.len());
    for (target, value_tracks) in tracks {
        let mut definition = SequenceDefinition::default();
        for (name, track) in value_tracks {
            let normalized = normalize_track(track, total_duration);
            let transition = sequence_options(
                normalized.keyframes.clone(),
                normalized.offsets,
                normalized.easing,
                total_duration,
                options,
            );
            definition.keyframes.insert(name.clone(), normalized.keyframes);
            definition.transition.insert(name, transition);
        }
        definitions.insert(target, definition);
    }
    Ok(definitions)
}
