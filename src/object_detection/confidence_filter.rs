use crate::annotations::detection::Detection;

/// Keeps candidates whose confidence is strictly above `conf_threshold`, in their
/// original order.
pub fn filter_by_confidence(
    candidates: Vec<Detection>,
    conf_threshold: f32,
) -> Vec<Detection> {
    candidates
        .into_iter()
        .filter(|det| det.confidence > conf_threshold)
        .collect()
}
