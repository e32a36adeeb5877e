//! Acceleration bridge: decide between compositor and CPU playback, and keep
//! compositor playback interruptible.

pub mod animation;
pub mod backend;
pub mod pregenerate;
pub mod support;

pub use animation::AcceleratedAnimation;
pub use backend::{
    CompositorBackend, CompositorEasing, CompositorHandle, CompositorPlayState, CompositorTiming,
    FillMode, ManualCompositor, ManualCompositorAnimation, PlaybackDirection,
};
pub use pregenerate::{pregenerate_keyframes, requires_pregenerated_keyframes, PregeneratedKeyframes};
pub use support::{is_accelerated_property, supports_acceleration, Capabilities};
