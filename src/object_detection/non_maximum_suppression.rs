use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use itertools::Itertools;

/// Indices of boxes scoring above `score_threshold`, best first.
///
/// The sort is stable, so equal scores stay in ascending index order and the output is
/// reproducible for any input.
fn ranked_candidates(scores: &[f32], score_threshold: f32) -> Vec<usize> {
    (0..scores.len())
        .filter(|&i| scores[i] > score_threshold)
        .sorted_by(|&a, &b| scores[b].total_cmp(&scores[a]))
        .collect()
}

/// Greedy class-agnostic non-maximum suppression.
///
/// Boxes scoring at or below `score_threshold` are dropped up front. The rest are visited
/// best first; each box that has not been suppressed is kept and suppresses every later
/// box whose IoU with it is above `iou_threshold`. Returns indices into `boxes` in the
/// order they were kept.
///
/// `boxes` and `scores` must have the same length.
pub fn non_maximum_suppression(
    boxes: &[BoundingBox],
    scores: &[f32],
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<usize> {
    suppress(boxes, scores, score_threshold, iou_threshold, |_, _| true)
}

/// Like `non_maximum_suppression`, but a box only suppresses boxes of its own class.
pub fn non_maximum_suppression_per_class(
    boxes: &[BoundingBox],
    scores: &[f32],
    class_ids: &[usize],
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), class_ids.len());
    suppress(boxes, scores, score_threshold, iou_threshold, |a, b| {
        class_ids[a] == class_ids[b]
    })
}

fn suppress<F>(
    boxes: &[BoundingBox],
    scores: &[f32],
    score_threshold: f32,
    iou_threshold: f32,
    competes: F,
) -> Vec<usize>
where
    F: Fn(usize, usize) -> bool,
{
    debug_assert_eq!(boxes.len(), scores.len());
    let order = ranked_candidates(scores, score_threshold);
    let mut suppressed = vec![false; order.len()];
    let mut keep = Vec::new();

    for (rank, &current) in order.iter().enumerate() {
        if suppressed[rank] {
            continue;
        }
        keep.push(current);
        for (other_rank, &other) in order.iter().enumerate().skip(rank + 1) {
            if suppressed[other_rank] || !competes(current, other) {
                continue;
            }
            if boxes[current].intersection_over_union(&boxes[other]) > iou_threshold {
                suppressed[other_rank] = true;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32, w: f32, h: f32) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    #[test]
    fn nms_no_overlap() {
        let boxes = vec![bbox(0.0, 0.0, 1.0, 1.0), bbox(2.0, 2.0, 1.0, 1.0)];
        let keep = non_maximum_suppression(&boxes, &[0.6, 0.6], 0.0, 0.5);
        assert_eq!(keep, vec![0, 1]);
    }

    #[test]
    fn nms_suppresses_heavily_overlapping_lower_score() {
        let boxes = vec![bbox(0.0, 0.0, 10.0, 10.0), bbox(1.0, 1.0, 10.0, 10.0)];
        let keep = non_maximum_suppression(&boxes, &[0.9, 0.8], 0.25, 0.5);
        assert_eq!(keep, vec![0]);
    }

    #[test]
    fn nms_standard_usage() {
        let boxes = vec![
            bbox(0.0, 0.0, 4.0, 4.0),
            bbox(0.0, 0.0, 5.0, 5.0),
            bbox(6.0, 6.0, 4.0, 4.0),
        ];
        let keep = non_maximum_suppression(&boxes, &[0.6, 0.55, 0.75], 0.0, 0.5);
        assert_eq!(keep, vec![2, 0]);
    }

    #[test]
    fn iou_equal_to_threshold_is_not_suppressed() {
        // Intersection 50, union 100.
        let boxes = vec![bbox(0.0, 0.0, 10.0, 10.0), bbox(0.0, 0.0, 10.0, 5.0)];
        let keep = non_maximum_suppression(&boxes, &[0.9, 0.8], 0.0, 0.5);
        assert_eq!(keep, vec![0, 1]);
    }

    #[test]
    fn score_threshold_is_honoured_standalone() {
        let boxes = vec![bbox(0.0, 0.0, 1.0, 1.0), bbox(5.0, 5.0, 1.0, 1.0)];
        let keep = non_maximum_suppression(&boxes, &[0.3, 0.2], 0.25, 0.5);
        assert_eq!(keep, vec![0]);
        let keep = non_maximum_suppression(&boxes, &[0.25, 0.2], 0.25, 0.5);
        assert!(keep.is_empty());
    }

    #[test]
    fn ties_resolve_by_index() {
        let boxes = vec![
            bbox(0.0, 0.0, 10.0, 10.0),
            bbox(0.5, 0.5, 10.0, 10.0),
            bbox(100.0, 100.0, 10.0, 10.0),
        ];
        let scores = [0.7, 0.7, 0.7];
        let first = non_maximum_suppression(&boxes, &scores, 0.0, 0.5);
        assert_eq!(first, vec![0, 2]);
        for _ in 0..10 {
            assert_eq!(non_maximum_suppression(&boxes, &scores, 0.0, 0.5), first);
        }
    }

    #[test]
    fn kept_boxes_never_overlap_beyond_threshold_and_rerun_is_stable() {
        let mut boxes = Vec::new();
        let mut scores = Vec::new();
        for i in 0..12 {
            for j in 0..12 {
                boxes.push(bbox(i as f32 * 3.0, j as f32 * 2.5, 10.0 + (i % 3) as f32, 8.0));
                scores.push(((i * 7 + j * 13) % 17) as f32 / 17.0 + 0.01);
            }
        }
        let iou_threshold = 0.4;
        let keep = non_maximum_suppression(&boxes, &scores, 0.0, iou_threshold);
        assert!(!keep.is_empty());

        for (n, &a) in keep.iter().enumerate() {
            for &b in &keep[n + 1..] {
                assert!(boxes[a].intersection_over_union(&boxes[b]) <= iou_threshold);
            }
        }

        let kept_boxes: Vec<BoundingBox> = keep.iter().map(|&i| boxes[i]).collect();
        let kept_scores: Vec<f32> = keep.iter().map(|&i| scores[i]).collect();
        let again = non_maximum_suppression(&kept_boxes, &kept_scores, 0.0, iou_threshold);
        assert_eq!(again, (0..keep.len()).collect::<Vec<_>>());
    }

    #[test]
    fn kept_order_is_descending_score() {
        let boxes = vec![
            bbox(0.0, 0.0, 1.0, 1.0),
            bbox(10.0, 0.0, 1.0, 1.0),
            bbox(20.0, 0.0, 1.0, 1.0),
        ];
        let keep = non_maximum_suppression(&boxes, &[0.2, 0.9, 0.5], 0.0, 0.5);
        assert_eq!(keep, vec![1, 2, 0]);
    }

    #[test]
    fn zero_area_boxes_are_all_kept() {
        let boxes = vec![bbox(5.0, 5.0, 0.0, 0.0), bbox(5.0, 5.0, 0.0, 0.0)];
        let keep = non_maximum_suppression(&boxes, &[0.9, 0.8], 0.0, 0.5);
        assert_eq!(keep, vec![0, 1]);
    }

    #[test]
    fn empty_input() {
        assert!(non_maximum_suppression(&[], &[], 0.0, 0.5).is_empty());
    }

    #[test]
    fn class_agnostic_suppresses_across_classes_but_per_class_does_not() {
        let boxes = vec![
            bbox(0.0, 0.0, 4.0, 4.0),
            bbox(0.0, 0.0, 4.0, 4.5),
            bbox(0.0, 0.0, 4.5, 4.0),
            bbox(6.0, 6.0, 4.0, 4.0),
        ];
        let scores = [0.8, 0.6, 0.55, 0.75];
        let class_ids = [0, 0, 1, 0];

        let agnostic = non_maximum_suppression(&boxes, &scores, 0.0, 0.5);
        assert_eq!(agnostic, vec![0, 3]);

        let per_class =
            non_maximum_suppression_per_class(&boxes, &scores, &class_ids, 0.0, 0.5);
        assert_eq!(per_class, vec![0, 3, 2]);
    }
}
