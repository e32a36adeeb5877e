//! Vizij Motion Core (engine-agnostic)
//!
//! Generators turn declarative keyframe, spring and decay descriptions into
//! pure time → value functions. Playback controllers drive them from a frame
//! clock (or hand them to a compositor backend), and the sequencer compiles
//! relatively timed segment lists into one keyframe track per target value.
//!
//! Everything here is single-threaded: handles are `Rc`-based and values are
//! delivered synchronously from the clock callback.

pub mod accelerated;
pub mod animate;
pub mod config;
pub mod easing;
pub mod error;
pub mod generators;
pub mod group;
pub mod interpolate;
pub mod mix;
pub mod options;
pub mod playback;
pub mod sequence;
pub mod value;
pub mod velocity;

// Re-exports for hosts and adapters
pub use accelerated::{
    AcceleratedAnimation, Capabilities, CompositorBackend, CompositorHandle, ManualCompositor,
};
pub use animate::{Animator, SinkResolver, SinkTable};
pub use config::{Config, SpringDefaults};
pub use easing::{EaseSpec, Easing};
pub use error::MotionError;
pub use generators::{create_generator, Generator, GeneratorState};
pub use group::GroupPlaybackControls;
pub use interpolate::Interpolator;
pub use mix::Mixer;
pub use options::{AnimationOptions, Delay, GeneratorKind, RepeatType, REPEAT_FOREVER};
pub use playback::{
    FrameClock, MainThreadAnimation, ManualClock, PlaybackController, PlaybackControls,
    PlaybackState, RecordingSink, ValueSink,
};
pub use sequence::{
    create_animations_from_sequence, Segment, SegmentTransition, SequenceDefinition,
    SequenceOptions, TimeAnchor, Transition,
};
pub use value::{keyframes, Keyframes, Rgba, Value, ValueKind};

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, MotionError>;
