//! Timeline sequencer.
//!
//! A sequence is an ordered list of segments with relative, absolute or
//! labelled start times. Compilation flattens it into one absolute-time
//! keyframe track per target value and then into plain keyframes animations
//! that all span the full sequence.

pub mod compile;
pub mod time;
pub mod track;
pub mod types;

pub use compile::create_animations_from_sequence;
pub use time::calc_next_time;
pub use types::{
    AbsoluteKeyframe, Segment, SegmentTransition, SequenceDefinition, SequenceOptions, TimeAnchor,
    Transition,
};
