//! Main-thread playback state machine.
//!
//! The controller owns the generator(s) and all timing state but never reads
//! a clock or writes to a sink: callers pass timestamps in and forward the
//! returned values. This keeps it usable both for live playback and as a
//! disposable sampler (pregeneration, interruption velocity).
//!
//! Time model (milliseconds):
//! - `resolved_duration` = one iteration + repeat delay
//! - `total_duration` = `resolved_duration * (repeat + 1) - repeat_delay`
//! - the raw playback time is `round(now - start_time) * speed`, or the held time when paused

use std::rc::Rc;

use crate::config::Config;
use crate::error::MotionError;
use crate::generators::{calc_generator_duration, create_generator, Generator, GeneratorState};
use crate::mix::Mixer;
use crate::options::{AnimationOptions, GeneratorKind, RepeatType, REPEAT_FOREVER};
use crate::value::Value;

use super::state::PlaybackState;

/// Keyframe an animation rests on once it finishes.
///
/// Odd repeat counts of `Reverse`/`Mirror` and backwards playback end on the origin.
pub fn final_keyframe(
    keyframes: &[Value],
    repeat: u32,
    repeat_type: RepeatType,
    speed: f64,
) -> Option<&Value> {
    let use_first =
        speed < 0.0 || (repeat > 0 && repeat_type != RepeatType::Loop && repeat % 2 == 1);
    if use_first {
        keyframes.first()
    } else {
        keyframes.last()
    }
}

/// Result of one controller tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub state: GeneratorState,
    /// True only on the tick that moved the controller into `Finished`.
    pub finished: bool,
}

#[derive(Debug)]
pub struct PlaybackController {
    kind: GeneratorKind,
    generator: Rc<dyn Generator>,
    mirrored: Option<Rc<dyn Generator>>,
    /// Maps 0..100 generator output onto non-numeric keyframes.
    percent_mixer: Option<Mixer>,
    keyframes: Vec<Value>,

    calculated_duration: f64,
    resolved_duration: f64,
    total_duration: f64,
    delay: f64,
    repeat: u32,
    repeat_type: RepeatType,
    repeat_delay: f64,

    state: PlaybackState,
    start_time: Option<f64>,
    hold_time: Option<f64>,
    current_time: f64,
    speed: f64,
    stopped: bool,
    notified: bool,
}

impl PlaybackController {
    /// Build a controller over hydrated `keyframes`.
    pub fn new(
        options: &AnimationOptions,
        keyframes: Vec<Value>,
        cfg: &Config,
    ) -> Result<Self, MotionError> {
        if keyframes.is_empty() {
            return Err(MotionError::EmptyKeyframes {
                value: "animation".into(),
            });
        }
        let kind = options.kind;

        let numeric = keyframes.iter().all(Value::is_number);
        let (percent_mixer, generator_keyframes) = if kind.is_physical() && !numeric {
            let first = &keyframes[0];
            let last = &keyframes[keyframes.len() - 1];
            (
                Some(Mixer::new(first, last)?),
                vec![Value::Number(0.0), Value::Number(100.0)],
            )
        } else {
            (None, keyframes.clone())
        };

        let generator =
            create_generator(kind, &generator_keyframes, options, options.velocity, cfg)?;
        let mirrored = if options.repeat_type == RepeatType::Mirror {
            let reversed: Vec<Value> = generator_keyframes.iter().rev().cloned().collect();
            Some(create_generator(kind, &reversed, options, -options.velocity, cfg)?)
        } else {
            None
        };

        let calculated_duration = generator
            .calculated_duration()
            .unwrap_or_else(|| calc_generator_duration(generator.as_ref(), cfg));
        let resolved_duration = calculated_duration + options.repeat_delay;
        let total_duration = if options.repeat == REPEAT_FOREVER {
            f64::INFINITY
        } else {
            resolved_duration * (f64::from(options.repeat) + 1.0) - options.repeat_delay
        };

        Ok(Self {
            kind,
            generator,
            mirrored,
            percent_mixer,
            keyframes,
            calculated_duration,
            resolved_duration,
            total_duration,
            delay: options.delay,
            repeat: options.repeat,
            repeat_type: options.repeat_type,
            repeat_delay: options.repeat_delay,
            state: PlaybackState::Idle,
            start_time: None,
            hold_time: None,
            current_time: 0.0,
            speed: options.speed,
            stopped: false,
            notified: false,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Playback time in milliseconds (delay already subtracted after a tick).
    pub fn time_ms(&self) -> f64 {
        self.current_time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Duration of one iteration, milliseconds (infinite when the generator never settles).
    pub fn duration_ms(&self) -> f64 {
        self.calculated_duration
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration
    }

    pub fn keyframes(&self) -> &[Value] {
        &self.keyframes
    }

    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Exact value committed on finish.
    pub fn final_keyframe(&self) -> Value {
        final_keyframe(&self.keyframes, self.repeat, self.repeat_type, self.speed)
            .cloned()
            .unwrap_or(Value::Number(0.0))
    }

    fn map_value(&self, mut state: GeneratorState) -> GeneratorState {
        if let Some(mixer) = &self.percent_mixer {
            let percent = state.value.as_number().unwrap_or(0.0);
            state.value = mixer.mix(percent / 100.0);
        }
        state
    }

    fn update_time(&mut self, now: f64) {
        self.current_time = match (self.hold_time, self.start_time) {
            (Some(hold), _) => hold,
            (None, Some(start)) => (now - start).round() * self.speed,
            (None, None) => self.current_time,
        };
    }

    /// Evaluate the animation at raw playback time `raw`.
    ///
    /// Returns the delay-adjusted time and the state with the time-based
    /// `done` rule applied.
    fn resolve_frame(&self, raw: f64, at_end: bool) -> (f64, GeneratorState) {
        let forward = self.speed >= 0.0;
        let without_delay = raw - if forward { self.delay } else { -self.delay };
        let in_delay = if forward {
            without_delay < 0.0
        } else {
            without_delay > self.total_duration
        };
        let mut current = without_delay.max(0.0);
        if at_end && self.total_duration.is_finite() {
            current = self.total_duration;
        }

        let mut elapsed = current;
        let mut generator = &self.generator;
        if self.repeat > 0 && self.resolved_duration.is_finite() && self.resolved_duration > 0.0 {
            let progress = current.min(self.total_duration) / self.resolved_duration;
            let mut iteration = progress.floor();
            let mut iteration_progress = progress % 1.0;
            if iteration_progress == 0.0 && progress >= 1.0 {
                iteration_progress = 1.0;
            }
            if iteration_progress == 1.0 {
                iteration -= 1.0;
            }
            iteration = iteration.min(f64::from(self.repeat) + 1.0);
            if iteration.rem_euclid(2.0) == 1.0 {
                match self.repeat_type {
                    RepeatType::Reverse => {
                        iteration_progress = 1.0 - iteration_progress;
                        if self.repeat_delay != 0.0 {
                            iteration_progress -= self.repeat_delay / self.resolved_duration;
                        }
                    }
                    RepeatType::Mirror => {
                        if let Some(mirrored) = &self.mirrored {
                            generator = mirrored;
                        }
                    }
                    RepeatType::Loop => {}
                }
            }
            elapsed = iteration_progress.clamp(0.0, 1.0) * self.resolved_duration;
        }

        let mut state = if in_delay {
            GeneratorState {
                value: self.keyframes[0].clone(),
                done: false,
            }
        } else {
            self.map_value(generator.next(elapsed))
        };
        if !in_delay && self.calculated_duration.is_finite() {
            state.done = if forward {
                current >= self.total_duration
            } else {
                current <= 0.0
            };
        }
        (current, state)
    }

    /// Advance to `timestamp` and return the value to display.
    pub fn tick(&mut self, timestamp: f64) -> Tick {
        let Some(mut start) = self.start_time else {
            return Tick {
                state: self.map_value(self.generator.next(0.0)),
                finished: false,
            };
        };
        if self.speed > 0.0 {
            start = start.min(timestamp);
        } else if self.speed < 0.0 && self.total_duration.is_finite() {
            start = start.min(timestamp - self.total_duration / self.speed);
        }
        self.start_time = Some(start);
        self.update_time(timestamp);

        let at_end = self.state == PlaybackState::Finished && self.hold_time.is_none();
        let (current, mut state) = self.resolve_frame(self.current_time, at_end);
        self.current_time = current;

        let finished = self.hold_time.is_none()
            && (self.state == PlaybackState::Finished
                || (self.state == PlaybackState::Running && state.done));
        if finished && self.kind != GeneratorKind::Inertia {
            state.value = self.final_keyframe();
        }
        let first_finish = finished && !self.notified;
        if first_finish {
            self.finish();
        }
        Tick {
            state,
            finished: first_finish,
        }
    }

    /// Evaluate at `t` ms of raw playback time without touching any state.
    pub fn sample(&self, t: f64) -> GeneratorState {
        self.resolve_frame(t, false).1
    }

    fn finish(&mut self) {
        log::debug!("animation finished at {}ms", self.current_time);
        self.state = PlaybackState::Finished;
        self.hold_time = None;
        self.notified = true;
    }

    fn teardown(&mut self) {
        self.state = PlaybackState::Idle;
        self.start_time = None;
        self.hold_time = None;
    }

    /// Start or resume. Returns false when stopped or already running.
    pub fn play(&mut self, now: f64) -> bool {
        if self.stopped || !self.state.can_play() {
            return false;
        }
        let was_finished = self.state.is_terminal();
        let mut start = if was_finished {
            self.notified = false;
            now
        } else if let Some(hold) = self.hold_time {
            if self.speed == 0.0 {
                now
            } else {
                now - hold / self.speed
            }
        } else {
            self.start_time.unwrap_or(now)
        };
        if was_finished && self.speed < 0.0 && self.calculated_duration.is_finite() {
            start += self.calculated_duration;
        }
        self.start_time = Some(start);
        self.hold_time = None;
        self.state = PlaybackState::Running;
        true
    }

    /// Hold the current time. A finished animation stays finished.
    pub fn pause(&mut self, now: f64) {
        if self.stopped || !self.state.can_pause() {
            return;
        }
        self.update_time(now);
        self.state = PlaybackState::Paused;
        self.hold_time = Some(self.current_time);
    }

    /// Jump to the end; the next tick commits the final keyframe.
    pub fn complete(&mut self, now: f64) {
        if !self.state.is_running() && !self.play(now) {
            return;
        }
        self.state = PlaybackState::Finished;
        self.hold_time = None;
    }

    /// Return to idle and report the origin value to restore.
    pub fn cancel(&mut self) -> Value {
        let (_, state) = self.resolve_frame(0.0, false);
        self.teardown();
        self.current_time = 0.0;
        state.value
    }

    /// Stop permanently. Returns whether anything was running.
    pub fn stop(&mut self) -> bool {
        self.stopped = true;
        if self.state == PlaybackState::Idle {
            return false;
        }
        self.teardown();
        true
    }

    /// Seek to `seconds` of raw playback time.
    pub fn set_time(&mut self, seconds: f64, now: f64) {
        let t = seconds * 1000.0;
        self.current_time = t;
        if self.hold_time.is_some()
            || self.start_time.is_none()
            || self.state == PlaybackState::Paused
            || self.speed == 0.0
        {
            self.hold_time = Some(t);
        } else {
            self.start_time = Some(now - t / self.speed);
        }
    }

    /// Change the rate while keeping the displayed time.
    pub fn set_speed(&mut self, speed: f64, now: f64) {
        let changed = self.speed != speed;
        let anchored = changed && self.state == PlaybackState::Running;
        if anchored {
            self.update_time(now);
        }
        self.speed = speed;
        if anchored {
            self.set_time(self.current_time / 1000.0, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use approx::assert_relative_eq;

    fn controller(options: AnimationOptions) -> PlaybackController {
        let frames = crate::value::resolve_keyframes(&options.keyframes, None, "x").unwrap();
        PlaybackController::new(&options, frames, &Config::default()).unwrap()
    }

    fn linear(from: f64, to: f64, ms: f64) -> AnimationOptions {
        AnimationOptions::tween([from, to])
            .with_duration(ms)
            .with_easing(Easing::Linear)
    }

    fn num(tick: &Tick) -> f64 {
        tick.state.value.as_number().unwrap()
    }

    #[test]
    fn runs_to_completion_once() {
        let mut c = controller(linear(0.0, 100.0, 1000.0));
        assert!(c.play(0.0));
        assert_eq!(num(&c.tick(500.0)), 50.0);
        let end = c.tick(1000.0);
        assert!(end.finished);
        assert_eq!(num(&end), 100.0);
        assert_eq!(c.state(), PlaybackState::Finished);
        let again = c.tick(1100.0);
        assert!(!again.finished);
        assert_eq!(num(&again), 100.0);
    }

    #[test]
    fn delay_holds_origin() {
        let mut c = controller(linear(10.0, 20.0, 100.0).with_delay(200.0));
        c.play(0.0);
        assert_eq!(num(&c.tick(150.0)), 10.0);
        assert_eq!(num(&c.tick(250.0)), 15.0);
    }

    #[test]
    fn pause_holds_time_and_resume_continues() {
        let mut c = controller(linear(0.0, 100.0, 1000.0));
        c.play(0.0);
        c.tick(200.0);
        c.pause(300.0);
        assert_eq!(c.state(), PlaybackState::Paused);
        assert_eq!(num(&c.tick(900.0)), 30.0);
        c.play(1000.0);
        assert_eq!(num(&c.tick(1100.0)), 40.0);
    }

    #[test]
    fn reverse_repeat_ends_on_the_right_keyframe() {
        let mut odd = controller(linear(0.0, 100.0, 100.0).with_repeat(1, RepeatType::Reverse));
        odd.play(0.0);
        assert_eq!(num(&odd.tick(150.0)), 50.0);
        let end = odd.tick(200.0);
        assert!(end.finished);
        assert_eq!(num(&end), 0.0);

        let mut even = controller(linear(0.0, 100.0, 100.0).with_repeat(2, RepeatType::Reverse));
        even.play(0.0);
        let end = even.tick(300.0);
        assert!(end.finished);
        assert_eq!(num(&end), 100.0);
    }

    #[test]
    fn loop_repeat_restarts_each_iteration() {
        let mut c = controller(linear(0.0, 100.0, 100.0).with_repeat(2, RepeatType::Loop));
        c.play(0.0);
        assert_eq!(num(&c.tick(150.0)), 50.0);
        assert_eq!(num(&c.tick(100.0 + 100.0 + 25.0)), 25.0);
        assert_eq!(c.total_duration_ms(), 300.0);
    }

    #[test]
    fn repeat_delay_holds_between_iterations() {
        let mut c = controller(
            linear(0.0, 100.0, 100.0)
                .with_repeat(1, RepeatType::Loop)
                .with_repeat_delay(50.0),
        );
        assert_eq!(c.total_duration_ms(), 250.0);
        c.play(0.0);
        assert_eq!(num(&c.tick(120.0)), 100.0);
        assert_relative_eq!(num(&c.tick(175.0)), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn mirror_uses_reversed_generator() {
        let mut c = controller(
            AnimationOptions::tween([0.0, 100.0])
                .with_duration(100.0)
                .with_easing(Easing::EaseIn)
                .with_repeat(1, RepeatType::Mirror),
        );
        c.play(0.0);
        let forward = num(&c.tick(25.0));
        let mirrored = num(&c.tick(125.0));
        // the mirrored leg runs easeIn from 100 to 0, not easeIn reversed in time
        assert_relative_eq!(mirrored, 100.0 - forward, epsilon = 1e-9);
    }

    #[test]
    fn seek_while_running_reanchors_start() {
        let mut c = controller(linear(0.0, 100.0, 1000.0));
        c.play(0.0);
        c.set_time(0.5, 100.0);
        assert_eq!(num(&c.tick(100.0)), 50.0);
    }

    #[test]
    fn speed_change_preserves_time() {
        let mut c = controller(linear(0.0, 100.0, 1000.0));
        c.play(0.0);
        c.tick(400.0);
        c.set_speed(2.0, 400.0);
        assert_eq!(num(&c.tick(400.0)), 40.0);
        assert_eq!(num(&c.tick(500.0)), 60.0);
    }

    #[test]
    fn stop_is_terminal_and_cancel_is_replayable() {
        let mut c = controller(linear(5.0, 100.0, 1000.0));
        c.play(0.0);
        c.tick(500.0);
        assert_eq!(c.cancel(), Value::Number(5.0));
        assert_eq!(c.state(), PlaybackState::Idle);
        assert!(c.play(600.0));
        assert!(c.stop());
        assert!(!c.play(700.0));
        assert_eq!(c.state(), PlaybackState::Idle);
    }

    #[test]
    fn transport_ignores_redundant_commands() {
        let mut c = controller(linear(0.0, 100.0, 1000.0));
        assert!(c.play(0.0));
        c.tick(300.0);
        assert!(!c.play(300.0));
        assert_eq!(num(&c.tick(400.0)), 40.0);

        c.tick(1000.0);
        assert_eq!(c.state(), PlaybackState::Finished);
        c.pause(1100.0);
        assert_eq!(c.state(), PlaybackState::Finished);
        assert!(c.play(1200.0));
        assert_eq!(num(&c.tick(1300.0)), 10.0);
    }

    #[test]
    fn complete_commits_the_end_on_next_tick() {
        let mut c = controller(linear(0.0, 100.0, 1000.0));
        c.play(0.0);
        c.tick(100.0);
        c.complete(100.0);
        let t = c.tick(116.0);
        assert!(t.finished);
        assert_eq!(num(&t), 100.0);
        assert_relative_eq!(c.time_ms(), 1000.0);
    }

    #[test]
    fn sample_is_non_mutating() {
        let c = controller(linear(0.0, 100.0, 1000.0));
        assert_eq!(c.sample(250.0).value, Value::Number(25.0));
        assert!(c.sample(1000.0).done);
        assert_eq!(c.state(), PlaybackState::Idle);
    }

    #[test]
    fn spring_controller_uses_search_duration() {
        let c = controller(AnimationOptions::spring([0.0, 100.0]));
        assert!(c.duration_ms().is_finite());
        assert_eq!(c.duration_ms() % 50.0, 0.0);
    }

    #[test]
    fn physical_generators_drive_non_numeric_keyframes() {
        let mut c = controller(AnimationOptions::spring(["0px", "100px"]));
        c.play(0.0);
        assert_eq!(c.tick(0.0).state.value, Value::Text("0px".into()));
        let end = c.tick(10_000.0);
        assert!(end.finished);
        assert_eq!(end.state.value, Value::Text("100px".into()));
    }

    #[test]
    fn negative_speed_plays_backwards_to_origin() {
        let mut c = controller(linear(0.0, 100.0, 1000.0).with_speed(-1.0));
        c.set_time(1.0, 0.0);
        c.play(0.0);
        assert_eq!(num(&c.tick(250.0)), 75.0);
        let end = c.tick(1000.0);
        assert!(end.finished);
        assert_eq!(num(&end), 0.0);
    }
}
