//! Duration search and velocity estimation for generators without closed forms.

use crate::config::Config;

use super::Generator;

/// Convert a per-`frame_ms` change into a per-second velocity.
#[inline]
pub fn velocity_per_second(delta: f64, frame_ms: f64) -> f64 {
    if frame_ms > 0.0 {
        delta * (1000.0 / frame_ms)
    } else {
        0.0
    }
}

/// Backward-difference velocity (units/s) of `resolve` at `t`, given the value already
/// computed there.
pub fn calc_generator_velocity(
    resolve: impl Fn(f64) -> f64,
    t: f64,
    current: f64,
    sample_ms: f64,
) -> f64 {
    let prev_t = (t - sample_ms).max(0.0);
    velocity_per_second(current - resolve(prev_t), t - prev_t)
}

/// Step through `generator` until it reports `done`.
///
/// Returns `f64::INFINITY` when the generator has not settled by
/// `cfg.max_generator_duration`.
pub fn calc_generator_duration(generator: &dyn Generator, cfg: &Config) -> f64 {
    let mut duration = 0.0;
    let mut state = generator.next(duration);
    while !state.done && duration < cfg.max_generator_duration {
        duration += cfg.duration_search_step;
        state = generator.next(duration);
    }
    if duration >= cfg.max_generator_duration {
        log::warn!(
            "generator did not settle within {}ms; treating duration as infinite",
            cfg.max_generator_duration
        );
        f64::INFINITY
    } else {
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::GeneratorState;

    #[derive(Debug)]
    struct DoneAt(f64);

    impl Generator for DoneAt {
        fn next(&self, t: f64) -> GeneratorState {
            GeneratorState::new(t, t >= self.0)
        }
    }

    #[test]
    fn search_rounds_up_to_the_step() {
        let cfg = Config::default();
        assert_eq!(calc_generator_duration(&DoneAt(120.0), &cfg), 150.0);
        assert_eq!(calc_generator_duration(&DoneAt(0.0), &cfg), 0.0);
    }

    #[test]
    fn capped_search_is_infinite() {
        let cfg = Config::default();
        assert!(calc_generator_duration(&DoneAt(f64::MAX), &cfg).is_infinite());
    }

    #[test]
    fn backward_difference_velocity() {
        let v = calc_generator_velocity(|t| t * 2.0, 100.0, 200.0, 5.0);
        assert!((v - 2000.0).abs() < 1e-9);
        assert_eq!(calc_generator_velocity(|t| t, 0.0, 0.0, 5.0), 0.0);
    }
}
