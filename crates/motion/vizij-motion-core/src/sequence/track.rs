//! Absolute-time keyframe tracks, one per target value.

use std::cmp::Ordering;

use crate::easing::{EaseSpec, Easing};
use crate::value::{Keyframes, Value};

use super::types::AbsoluteKeyframe;

/// Easing used for the segment synthesised in front of a track that does not start at 0.
pub const DEFAULT_SEGMENT_EASING: Easing = Easing::EaseInOut;

/// Append `remaining` offsets evenly spaced between the last offset and 1.
pub fn fill_offset(offsets: &mut Vec<f64>, remaining: usize) {
    let min = offsets.last().copied().unwrap_or(0.0);
    for i in 1..=remaining {
        let p = i as f64 / remaining as f64;
        offsets.push(min + (1.0 - min) * p);
    }
}

/// Remove keyframes strictly inside `(start, end)`.
pub fn erase_keyframes(track: &mut Vec<AbsoluteKeyframe>, start: f64, end: f64) {
    track.retain(|k| !(k.at > start && k.at < end));
}

/// Splice `keyframes` into `track`, mapping `offsets` from [0, 1] into `[start, end]`.
///
/// Entries already inside the window are dropped first, so the later call wins.
pub fn add_keyframes(
    track: &mut Vec<AbsoluteKeyframe>,
    keyframes: &[Option<Value>],
    ease: &EaseSpec,
    offsets: &[f64],
    start: f64,
    end: f64,
) {
    erase_keyframes(track, start, end);
    for (i, (value, offset)) in keyframes.iter().zip(offsets).enumerate() {
        track.push(AbsoluteKeyframe {
            value: value.clone(),
            at: start + (end - start) * offset,
            easing: Some(ease.for_segment(i)),
        });
    }
}

/// Ascending by time; on a tie a hold (`None`) sorts after a concrete value.
pub fn compare_by_time(a: &AbsoluteKeyframe, b: &AbsoluteKeyframe) -> Ordering {
    if a.at == b.at {
        return match (&a.value, &b.value) {
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            _ => Ordering::Equal,
        };
    }
    a.at.partial_cmp(&b.at).unwrap_or(Ordering::Equal)
}

/// A track converted to the normalised form a keyframes generator consumes.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedTrack {
    pub keyframes: Keyframes,
    pub offsets: Vec<f64>,
    pub easing: Vec<Easing>,
}

/// Sort `track` and express it as offsets of `total`.
///
/// The result always starts at offset 0 (duplicating the first keyframe) and
/// ends at offset 1 (appending a hold).
pub fn normalize_track(mut track: Vec<AbsoluteKeyframe>, total: f64) -> NormalizedTrack {
    track.sort_by(compare_by_time);
    let mut keyframes = Vec::with_capacity(track.len() + 2);
    let mut offsets = Vec::with_capacity(track.len() + 2);
    let mut easing = Vec::with_capacity(track.len() + 2);
    for keyframe in track {
        keyframes.push(keyframe.value);
        offsets.push(if total > 0.0 { keyframe.at / total } else { 0.0 });
        easing.push(keyframe.easing.unwrap_or(Easing::EaseOut));
    }
    if offsets.first() != Some(&0.0) {
        offsets.insert(0, 0.0);
        let first = keyframes.first().cloned().flatten();
        keyframes.insert(0, first);
        easing.insert(0, DEFAULT_SEGMENT_EASING);
    }
    if offsets.last() != Some(&1.0) {
        offsets.push(1.0);
        keyframes.push(None);
    }
    NormalizedTrack {
        keyframes,
        offsets,
        easing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: Option<f64>, at: f64) -> AbsoluteKeyframe {
        AbsoluteKeyframe {
            value: value.map(Value::Number),
            at,
            easing: None,
        }
    }

    #[test]
    fn later_window_replaces_interior_entries() {
        let mut track = Vec::new();
        let ease = EaseSpec::Single(Easing::Linear);
        add_keyframes(
            &mut track,
            &[Some(0.0.into()), Some(50.0.into()), Some(100.0.into())],
            &ease,
            &[0.0, 0.5, 1.0],
            0.0,
            1000.0,
        );
        add_keyframes(
            &mut track,
            &[Some(7.0.into()), Some(8.0.into())],
            &ease,
            &[0.0, 1.0],
            400.0,
            1200.0,
        );
        let times: Vec<f64> = track.iter().map(|k| k.at).collect();
        assert_eq!(times, vec![0.0, 400.0, 1200.0]);
    }

    #[test]
    fn window_edges_survive_erase() {
        let mut track = vec![key(Some(1.0), 100.0), key(Some(2.0), 200.0), key(Some(3.0), 300.0)];
        erase_keyframes(&mut track, 100.0, 300.0);
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn holds_sort_after_values_at_the_same_time() {
        let mut track = vec![key(None, 100.0), key(Some(1.0), 100.0), key(Some(0.0), 0.0)];
        track.sort_by(compare_by_time);
        assert_eq!(track[0].at, 0.0);
        assert_eq!(track[1].value, Some(Value::Number(1.0)));
        assert_eq!(track[2].value, None);
    }

    #[test]
    fn normalization_pins_both_ends() {
        let normalized = normalize_track(vec![key(Some(5.0), 250.0), key(Some(9.0), 500.0)], 1000.0);
        assert_eq!(normalized.offsets, vec![0.0, 0.25, 0.5, 1.0]);
        assert_eq!(
            normalized.keyframes,
            vec![
                Some(Value::Number(5.0)),
                Some(Value::Number(5.0)),
                Some(Value::Number(9.0)),
                None
            ]
        );
        assert_eq!(normalized.easing[0], DEFAULT_SEGMENT_EASING);
        assert_eq!(normalized.easing[1], Easing::EaseOut);
        assert_eq!(normalized.easing.len(), 3);
    }

    #[test]
    fn fill_offset_spreads_to_one() {
        let mut offsets = vec![0.0, 0.5];
        fill_offset(&mut offsets, 2);
        assert_eq!(offsets, vec![0.0, 0.5, 0.75, 1.0]);
    }
}
