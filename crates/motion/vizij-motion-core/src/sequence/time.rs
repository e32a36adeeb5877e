use hashbrown::HashMap;

use super::types::TimeAnchor;

/// Resolve `anchor` against the running timeline position.
///
/// Relative anchors never go below zero. An unknown label resolves to
/// `current`.
pub fn calc_next_time(
    current: f64,
    anchor: &TimeAnchor,
    prev: f64,
    labels: &HashMap<String, f64>,
) -> f64 {
    match anchor {
        TimeAnchor::Absolute(ms) => *ms,
        TimeAnchor::Relative(offset) => (current + offset).max(0.0),
        TimeAnchor::PreviousStart => prev,
        TimeAnchor::Label(name) => labels.get(name).copied().unwrap_or(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_resolve_against_current_and_previous() {
        let mut labels = HashMap::new();
        labels.insert("intro".to_string(), 150.0);
        assert_eq!(calc_next_time(100.0, &TimeAnchor::Absolute(40.0), 0.0, &labels), 40.0);
        assert_eq!(calc_next_time(100.0, &TimeAnchor::Relative(50.0), 0.0, &labels), 150.0);
        assert_eq!(calc_next_time(100.0, &TimeAnchor::Relative(-500.0), 0.0, &labels), 0.0);
        assert_eq!(calc_next_time(100.0, &TimeAnchor::PreviousStart, 20.0, &labels), 20.0);
        assert_eq!(
            calc_next_time(100.0, &TimeAnchor::Label("intro".into()), 0.0, &labels),
            150.0
        );
        assert_eq!(
            calc_next_time(100.0, &TimeAnchor::Label("missing".into()), 0.0, &labels),
            100.0
        );
    }
}
