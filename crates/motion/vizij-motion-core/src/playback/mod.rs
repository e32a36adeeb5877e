//! Playback: the controller state machine and the seams it drives.

pub mod clock;
pub mod completion;
pub mod controller;
pub mod controls;
pub mod main_thread;
pub mod sink;
pub mod state;

pub use clock::{ClockSubscription, FrameCallback, FrameClock, ManualClock};
pub use completion::{Completion, CompletionObserver};
pub use controller::{final_keyframe, PlaybackController, Tick};
pub use controls::PlaybackControls;
pub use main_thread::MainThreadAnimation;
pub use sink::{RecordingSink, ValueSink};
pub use state::PlaybackState;
