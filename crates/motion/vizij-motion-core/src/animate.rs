//! Public entry points: single animations and compiled sequences.
//!
//! An [`Animator`] carries everything the core needs from the host: the
//! frame clock, an optional compositor backend with its probed
//! capabilities, and the [`Config`]. Values reach the host through
//! [`ValueSink`]s; sequences find theirs through a [`SinkResolver`].

use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::accelerated::{supports_acceleration, AcceleratedAnimation, Capabilities, CompositorBackend};
use crate::config::Config;
use crate::error::MotionError;
use crate::group::GroupPlaybackControls;
use crate::options::AnimationOptions;
use crate::playback::{FrameClock, PlaybackController, PlaybackControls, ValueSink};
use crate::sequence::{create_animations_from_sequence, Segment, SequenceOptions};
use crate::value::{resolve_keyframes, Value};

pub use crate::playback::MainThreadAnimation;

/// Trait for resolving a sequence target's value to the sink that receives it.
/// Hosts implement this and pass it into [`Animator::create_sequence_animation`].
pub trait SinkResolver {
    fn resolve(&mut self, target: &str, value: &str) -> Option<Rc<dyn ValueSink>>;
}

/// Sink lookup table keyed by `(target, value)`.
#[derive(Default)]
pub struct SinkTable {
    sinks: HashMap<(String, String), Rc<dyn ValueSink>>,
}

impl SinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the sink for `target.value`.
    pub fn insert(&mut self, target: &str, value: &str, sink: Rc<dyn ValueSink>) {
        self.sinks.insert((target.to_string(), value.to_string()), sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl SinkResolver for SinkTable {
    fn resolve(&mut self, target: &str, value: &str) -> Option<Rc<dyn ValueSink>> {
        self.sinks
            .get(&(target.to_string(), value.to_string()))
            .cloned()
    }
}

impl fmt::Debug for SinkTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkTable")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

pub struct Animator {
    config: Config,
    clock: Rc<dyn FrameClock>,
    compositor: Option<Rc<dyn CompositorBackend>>,
    capabilities: Capabilities,
}

impl Animator {
    /// CPU-only animator with default configuration.
    pub fn new(clock: Rc<dyn FrameClock>) -> Self {
        Self {
            config: Config::default(),
            clock,
            compositor: None,
            capabilities: Capabilities::none(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Enable compositor playback for eligible properties.
    pub fn with_compositor(
        mut self,
        backend: Rc<dyn CompositorBackend>,
        capabilities: Capabilities,
    ) -> Self {
        self.compositor = Some(backend);
        self.capabilities = capabilities;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn hydrate(
        &self,
        name: &str,
        options: &AnimationOptions,
        sink: &dyn ValueSink,
    ) -> Result<Vec<Value>, MotionError> {
        let current = sink.current();
        resolve_keyframes(&options.keyframes, current.as_ref(), name)
    }

    fn main_thread(
        &self,
        options: &AnimationOptions,
        keyframes: Vec<Value>,
        sink: Rc<dyn ValueSink>,
    ) -> Result<MainThreadAnimation, MotionError> {
        let controller = PlaybackController::new(options, keyframes, &self.config)?;
        Ok(MainThreadAnimation::new(
            controller,
            sink,
            Rc::clone(&self.clock),
            options.autoplay,
        ))
    }

    /// Animate one value on the main thread.
    pub fn create_animation(
        &self,
        options: AnimationOptions,
        sink: Rc<dyn ValueSink>,
    ) -> Result<MainThreadAnimation, MotionError> {
        let keyframes = self.hydrate("value", &options, sink.as_ref())?;
        self.main_thread(&options, keyframes, sink)
    }

    /// Animate `property`, on the compositor when it is eligible.
    ///
    /// A backend that refuses the animation is not an error: playback falls
    /// back to the main thread.
    pub fn animate_property(
        &self,
        property: &str,
        options: AnimationOptions,
        sink: Rc<dyn ValueSink>,
    ) -> Result<Box<dyn PlaybackControls>, MotionError> {
        let keyframes = self.hydrate(property, &options, sink.as_ref())?;
        if let Some(backend) = &self.compositor {
            if supports_acceleration(property, &options, sink.as_ref(), &self.capabilities) {
                match AcceleratedAnimation::start(
                    backend.as_ref(),
                    property,
                    options.clone(),
                    keyframes.clone(),
                    Rc::clone(&sink),
                    &self.capabilities,
                    &self.config,
                ) {
                    Ok(animation) => {
                        log::debug!("'{property}' runs on the compositor");
                        return Ok(Box::new(animation));
                    }
                    Err(err) if err.is_recoverable() => {
                        log::warn!("'{property}' falls back to the main thread: {err}");
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(Box::new(self.main_thread(&options, keyframes, sink)?))
    }

    /// Compile `segments` and start one animation per target value.
    ///
    /// Every target value is resolved before anything is compiled or
    /// started, so an unresolvable target starts nothing.
    pub fn create_sequence_animation(
        &self,
        segments: &[Segment],
        options: &SequenceOptions,
        resolver: &mut dyn SinkResolver,
    ) -> Result<GroupPlaybackControls, MotionError> {
        let mut sinks: HashMap<(String, String), Rc<dyn ValueSink>> = HashMap::new();
        for segment in segments {
            let Segment::Animate {
                targets, values, ..
            } = segment
            else {
                continue;
            };
            if targets.is_empty() {
                return Err(MotionError::NoTargets);
            }
            for target in targets {
                for value in values.keys() {
                    let key = (target.clone(), value.clone());
                    if sinks.contains_key(&key) {
                        continue;
                    }
                    let sink = resolver.resolve(target, value).ok_or_else(|| {
                        MotionError::UnresolvedTarget {
                            target: target.clone(),
                            value: value.clone(),
                        }
                    })?;
                    sinks.insert(key, sink);
                }
            }
        }
        if sinks.is_empty() {
            return Err(MotionError::NoTargets);
        }

        let definitions = create_animations_from_sequence(segments, options, &self.config)?;
        let mut members: Vec<Option<Box<dyn PlaybackControls>>> = Vec::new();
        for (target, definition) in definitions {
            for (value, transition) in definition.transition {
                let sink = sinks
                    .get(&(target.clone(), value.clone()))
                    .cloned()
                    .ok_or_else(|| MotionError::UnresolvedTarget {
                        target: target.clone(),
                        value: value.clone(),
                    })?;
                members.push(Some(self.animate_property(&value, transition, sink)?));
            }
        }
        Ok(GroupPlaybackControls::new(members))
    }
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("config", &self.config)
            .field("compositor", &self.compositor.is_some())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accelerated::ManualCompositor;
    use crate::playback::{ManualClock, PlaybackState, RecordingSink};
    use crate::sequence::Transition;
    use crate::value::keyframes;

    #[test]
    fn hydrates_leading_none_from_sink() {
        let clock = ManualClock::new();
        let animator = Animator::new(Rc::new(clock.clone()));
        let sink = RecordingSink::with_value(40.0);
        let options = AnimationOptions::tween([0.0, 100.0])
            .with_keyframes(vec![None, Some(Value::Number(100.0))])
            .with_duration(100.0)
            .with_easing(crate::easing::Easing::Linear);
        let anim = animator.create_animation(options, Rc::new(sink.clone())).unwrap();
        clock.advance(50.0);
        assert_eq!(sink.number(), Some(70.0));
        clock.advance(50.0);
        assert_eq!(anim.state(), PlaybackState::Finished);
    }

    #[test]
    fn missing_origin_is_reported() {
        let animator = Animator::new(Rc::new(ManualClock::new()));
        let options = AnimationOptions::default().with_keyframes(vec![None, Some(1.0.into())]);
        let err = animator
            .create_animation(options, Rc::new(RecordingSink::new()))
            .unwrap_err();
        assert!(matches!(err, MotionError::MissingOrigin { .. }));
    }

    #[test]
    fn rejected_compositor_falls_back_to_main_thread() {
        let clock = ManualClock::new();
        let compositor = ManualCompositor::new();
        compositor.reject_animations(true);
        let animator = Animator::new(Rc::new(clock.clone()))
            .with_compositor(Rc::new(compositor.clone()), Capabilities::full());
        let sink = RecordingSink::new();
        let anim = animator
            .animate_property("opacity", AnimationOptions::tween([0.0, 1.0]), Rc::new(sink.clone()))
            .unwrap();
        assert!(compositor.animations().is_empty());
        clock.advance(300.0);
        assert_eq!(anim.state(), PlaybackState::Finished);
        assert_eq!(sink.number(), Some(1.0));
    }

    #[test]
    fn eligible_property_runs_on_the_compositor() {
        let compositor = ManualCompositor::new();
        let animator = Animator::new(Rc::new(ManualClock::new()))
            .with_compositor(Rc::new(compositor.clone()), Capabilities::full());
        animator
            .animate_property(
                "opacity",
                AnimationOptions::tween([0.0, 1.0]),
                Rc::new(RecordingSink::new()),
            )
            .unwrap();
        animator
            .animate_property("x", AnimationOptions::tween([0.0, 1.0]), Rc::new(RecordingSink::new()))
            .unwrap();
        assert_eq!(compositor.animations().len(), 1);
        assert_eq!(compositor.animations()[0].property, "opacity");
    }

    #[test]
    fn unresolved_targets_fail_before_starting() {
        let clock = ManualClock::new();
        let animator = Animator::new(Rc::new(clock.clone()));
        let mut table = SinkTable::new();
        let sink = RecordingSink::with_value(0.0);
        table.insert("a", "x", Rc::new(sink.clone()));
        let segments = [
            Segment::animate("a", "x", keyframes([0.0, 1.0]), Transition::default()),
            Segment::animate("b", "x", keyframes([0.0, 1.0]), Transition::default()),
        ];
        let err = animator
            .create_sequence_animation(&segments, &SequenceOptions::default(), &mut table)
            .unwrap_err();
        assert_eq!(
            err,
            MotionError::UnresolvedTarget {
                target: "b".into(),
                value: "x".into()
            }
        );
        assert_eq!(clock.subscriber_count(), 0);
    }
}
