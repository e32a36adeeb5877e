use super::completion::CompletionObserver;
use super::state::PlaybackState;

/// Uniform playback surface shared by single animations, compositor
/// animations and groups. Times are seconds.
///
/// Methods take `&self`: implementors are shared handles with interior
/// mutability, so a completion observer may call back into the same handle.
pub trait PlaybackControls {
    fn time(&self) -> f64;
    fn set_time(&self, seconds: f64);

    fn speed(&self) -> f64;
    fn set_speed(&self, speed: f64);

    /// Duration of one iteration, seconds.
    fn duration(&self) -> f64;
    fn state(&self) -> PlaybackState;

    fn play(&self);
    fn pause(&self);
    /// Stop in place; the animation cannot be played again.
    fn stop(&self);
    /// Return to the origin and go idle; the animation may be replayed.
    fn cancel(&self);
    /// Jump to the end and finish on the next frame.
    fn complete(&self);

    /// Run `on_done` at the next terminal transition (finish, stop or cancel).
    ///
    /// There is no rejection side. Invalid options fail when the animation is
    /// created, and compositor failures after that are logged and recovered,
    /// so every run ends in one of the three terminal transitions.
    fn then(&self, on_done: CompletionObserver);
}
