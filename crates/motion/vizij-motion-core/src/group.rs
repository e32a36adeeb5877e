//! Several animations behind one [`PlaybackControls`] handle.

use std::fmt;

use crate::playback::completion::{fan_in, CompletionObserver};
use crate::playback::controls::PlaybackControls;
use crate::playback::state::PlaybackState;

/// Broadcasts every command to its members.
///
/// Getters for `time`, `speed` and `state` read the first member only; the
/// group does not reconcile members that have drifted apart.
pub struct GroupPlaybackControls {
    animations: Vec<Box<dyn PlaybackControls>>,
}

impl GroupPlaybackControls {
    /// Absent members are dropped.
    pub fn new(animations: Vec<Option<Box<dyn PlaybackControls>>>) -> Self {
        Self {
            animations: animations.into_iter().flatten().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn members(&self) -> &[Box<dyn PlaybackControls>] {
        &self.animations
    }

    fn first(&self) -> Option<&dyn PlaybackControls> {
        self.animations.first().map(|a| a.as_ref())
    }
}

impl PlaybackControls for GroupPlaybackControls {
    fn time(&self) -> f64 {
        self.first().map_or(0.0, |a| a.time())
    }

    fn set_time(&self, seconds: f64) {
        for animation in &self.animations {
            animation.set_time(seconds);
        }
    }

    fn speed(&self) -> f64 {
        self.first().map_or(1.0, |a| a.speed())
    }

    fn set_speed(&self, speed: f64) {
        for animation in &self.animations {
            animation.set_speed(speed);
        }
    }

    fn duration(&self) -> f64 {
        self.animations
            .iter()
            .map(|a| a.duration())
            .fold(0.0, f64::max)
    }

    fn state(&self) -> PlaybackState {
        self.first().map_or(PlaybackState::Idle, |a| a.state())
    }

    fn play(&self) {
        for animation in &self.animations {
            animation.play();
        }
    }

    fn pause(&self) {
        for animation in &self.animations {
            animation.pause();
        }
    }

    fn stop(&self) {
        for animation in &self.animations {
            animation.stop();
        }
    }

    fn cancel(&self) {
        for animation in &self.animations {
            animation.cancel();
        }
    }

    fn complete(&self) {
        for animation in &self.animations {
            animation.complete();
        }
    }

    /// Fires once every member has reached a terminal transition.
    fn then(&self, on_done: CompletionObserver) {
        let arrivals = fan_in(self.animations.len(), on_done);
        for (animation, arrival) in self.animations.iter().zip(arrivals) {
            animation.then(arrival);
        }
    }
}

impl fmt::Debug for GroupPlaybackControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupPlaybackControls")
            .field("members", &self.animations.len())
            .field("duration", &self.duration())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::easing::Easing;
    use crate::options::AnimationOptions;
    use crate::playback::{ManualClock, MainThreadAnimation, PlaybackController, RecordingSink};
    use std::cell::Cell;
    use std::rc::Rc;

    fn member(clock: &ManualClock, duration_ms: f64) -> Box<dyn PlaybackControls> {
        let options = AnimationOptions::tween([0.0, 1.0])
            .with_duration(duration_ms)
            .with_easing(Easing::Linear);
        let frames = crate::value::resolve_keyframes(&options.keyframes, None, "x").unwrap();
        let controller = PlaybackController::new(&options, frames, &Config::default()).unwrap();
        Box::new(MainThreadAnimation::new(
            controller,
            Rc::new(RecordingSink::new()),
            Rc::new(clock.clone()),
            true,
        ))
    }

    #[test]
    fn duration_is_the_longest_member() {
        let clock = ManualClock::new();
        let group = GroupPlaybackControls::new(vec![
            Some(member(&clock, 1000.0)),
            None,
            Some(member(&clock, 3000.0)),
        ]);
        assert_eq!(group.len(), 2);
        assert_eq!(group.duration(), 3.0);
    }

    #[test]
    fn then_waits_for_every_member() {
        let clock = ManualClock::new();
        let group = GroupPlaybackControls::new(vec![
            Some(member(&clock, 100.0)),
            Some(member(&clock, 300.0)),
        ]);
        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);
        group.then(Box::new(move || d.set(d.get() + 1)));
        clock.advance(100.0);
        assert_eq!(done.get(), 0);
        clock.advance(200.0);
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn groups_nest() {
        let clock = ManualClock::new();
        let inner = GroupPlaybackControls::new(vec![Some(member(&clock, 200.0))]);
        let outer = GroupPlaybackControls::new(vec![
            Some(Box::new(inner) as Box<dyn PlaybackControls>),
            Some(member(&clock, 100.0)),
        ]);
        assert_eq!(outer.duration(), 0.2);
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        outer.then(Box::new(move || d.set(true)));
        outer.cancel();
        assert!(done.get());
        assert_eq!(outer.state(), PlaybackState::Idle);
    }

    #[test]
    fn empty_group_resolves_immediately() {
        let group = GroupPlaybackControls::new(Vec::new());
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        group.then(Box::new(move || d.set(true)));
        assert!(done.get());
        assert_eq!(group.duration(), 0.0);
    }
}
