use std::rc::Rc;

use approx::assert_relative_eq;
use indexmap::IndexMap;
use serde::Deserialize;
use vizij_motion::{
    create_animations_from_sequence, keyframes, Animator, Config, EaseSpec, Easing, Keyframes,
    ManualClock, PlaybackControls, PlaybackState, RecordingSink, RepeatType, Segment,
    SegmentTransition, SequenceOptions, SinkTable, Transition, Value,
};

#[derive(Debug, Deserialize)]
struct ExpectedTrack {
    duration: Option<f64>,
    times: Vec<f64>,
    keyframes: Keyframes,
}

#[derive(Debug, Deserialize)]
struct SequenceFixture {
    description: String,
    segments: Vec<Segment>,
    #[serde(default)]
    options: SequenceOptions,
    expected: IndexMap<String, IndexMap<String, ExpectedTrack>>,
}

fn load(name: &str) -> SequenceFixture {
    vizij_test_fixtures::sequences::load(name).expect("load sequence fixture")
}

#[test]
fn fixture_sequences_compile_to_expected_tracks() {
    for name in vizij_test_fixtures::sequences::keys() {
        let fixture = load(&name);
        let compiled =
            create_animations_from_sequence(&fixture.segments, &fixture.options, &Config::default())
                .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(
            compiled.len(),
            fixture.expected.len(),
            "{name} ({})",
            fixture.description
        );
        for (target, values) in &fixture.expected {
            let definition = &compiled[target.as_str()];
            for (value, expected) in values {
                let options = &definition.transition[value.as_str()];
                let times = options.times.clone().unwrap_or_default();
                assert_eq!(times.len(), expected.times.len(), "{name}: {target}.{value} times");
                for (got, want) in times.iter().zip(&expected.times) {
                    assert_relative_eq!(*got, *want, epsilon = 1e-9);
                }
                assert_eq!(
                    definition.keyframes[value.as_str()],
                    expected.keyframes,
                    "{name}: {target}.{value} keyframes"
                );
                assert_eq!(options.keyframes, expected.keyframes);
                if let Some(duration) = expected.duration {
                    assert_eq!(options.duration, Some(duration), "{name}: {target}.{value}");
                }
            }
        }
    }
}

#[test]
fn sequence_options_reach_every_track() {
    let fixture = load("override-window");
    let compiled =
        create_animations_from_sequence(&fixture.segments, &fixture.options, &Config::default())
            .unwrap();
    let x = &compiled["box"].transition["x"];
    assert_eq!(x.repeat, 1);
    assert_eq!(x.repeat_type, RepeatType::Reverse);
    let EaseSpec::PerSegment(easing) = &x.ease else {
        panic!("compiled tracks carry per-segment easing");
    };
    assert_eq!(easing[0], Easing::Linear);
    assert_eq!(easing[1], Easing::EaseOut);
}

#[test]
fn value_override_replaces_the_whole_transition() {
    let base = Transition::default()
        .with_duration(1000.0)
        .with_easing(Easing::Linear);
    let transition = SegmentTransition::default()
        .with_base(base)
        .with_override("y", Transition::default().with_duration(200.0));
    let mut values = IndexMap::new();
    values.insert("x".to_string(), keyframes([0.0, 1.0]));
    values.insert("y".to_string(), keyframes([0.0, 1.0]));
    let segments = [Segment::Animate {
        targets: vec!["box".into()],
        values,
        transition,
    }];
    let compiled =
        create_animations_from_sequence(&segments, &SequenceOptions::default(), &Config::default())
            .unwrap();
    let def = &compiled["box"];

    assert_eq!(def.transition["x"].times, Some(vec![0.0, 1.0]));
    assert_eq!(def.transition["y"].times, Some(vec![0.0, 0.2, 1.0]));
    assert_eq!(def.keyframes["y"].last(), Some(&None));

    // The override keeps nothing from the base, so `y` eases out.
    let EaseSpec::PerSegment(x_easing) = &def.transition["x"].ease else {
        panic!("per-segment easing");
    };
    let EaseSpec::PerSegment(y_easing) = &def.transition["y"].ease else {
        panic!("per-segment easing");
    };
    assert_eq!(x_easing[0], Easing::Linear);
    assert_eq!(y_easing[0], Easing::EaseOut);
}

#[test]
fn default_transition_fills_unset_fields() {
    let options = SequenceOptions {
        default_transition: Transition::default().with_duration(800.0),
        ..SequenceOptions::default()
    };
    let segments = [
        Segment::animate("a", "x", keyframes([0.0, 1.0]), Transition::default()),
        Segment::animate(
            "a",
            "x",
            keyframes([2.0]),
            Transition::default().with_duration(200.0),
        ),
    ];
    let compiled = create_animations_from_sequence(&segments, &options, &Config::default()).unwrap();
    let x = &compiled["a"].transition["x"];
    assert_eq!(x.duration, Some(1000.0));
    assert_eq!(x.times, Some(vec![0.0, 0.8, 0.8, 1.0]));
    assert_eq!(
        compiled["a"].keyframes["x"],
        vec![
            Some(Value::Number(0.0)),
            Some(Value::Number(1.0)),
            None,
            Some(Value::Number(2.0)),
        ]
    );
}

#[test]
fn animator_plays_a_compiled_sequence() {
    let fixture = load("override-window");
    let clock = ManualClock::new();
    let animator = Animator::new(Rc::new(clock.clone()));
    let sink = RecordingSink::with_value(0.0);
    let mut table = SinkTable::new();
    table.insert("box", "x", Rc::new(sink.clone()));

    let group = animator
        .create_sequence_animation(&fixture.segments, &fixture.options, &mut table)
        .expect("sequence");
    assert_eq!(group.len(), 1);
    assert_eq!(group.duration(), 1.0);

    clock.run(100, 10.0);
    assert_eq!(sink.number(), Some(100.0));
    assert_eq!(group.state(), PlaybackState::Running);

    clock.run(100, 10.0);
    assert_eq!(group.state(), PlaybackState::Finished);
    assert_eq!(sink.completed(), vec![Value::Number(0.0)]);
}

#[test]
fn held_values_hydrate_from_the_sink() {
    let clock = ManualClock::new();
    let animator = Animator::new(Rc::new(clock.clone()));
    let sink = RecordingSink::with_value(0.5);
    let mut table = SinkTable::new();
    table.insert("card", "opacity", Rc::new(sink.clone()));

    let segments = [Segment::animate(
        "card",
        "opacity",
        keyframes([1.0]),
        Transition::default()
            .with_duration(100.0)
            .with_easing(Easing::Linear),
    )];
    let group = animator
        .create_sequence_animation(&segments, &SequenceOptions::default(), &mut table)
        .unwrap();
    clock.advance(50.0);
    assert_relative_eq!(sink.number().unwrap_or_default(), 0.75, epsilon = 1e-9);
    clock.advance(50.0);
    assert_eq!(group.state(), PlaybackState::Finished);
    assert_eq!(sink.completed(), vec![Value::Number(1.0)]);
}
