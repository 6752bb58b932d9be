use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::error::{PipelineError, Result};
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix3, s};

/// Number of leading features that hold box geometry (cx, cy, w, h).
pub const BOX_FEATURES: usize = 4;

/// Which axis of a `[1, a, b]` prediction tensor holds the features.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, features, proposals]`, the native YOLOv8/YOLO11 export layout.
    FeaturesFirst,
    /// `[1, proposals, features]`.
    ProposalsFirst,
}

/// Works out the layout of a raw prediction tensor.
///
/// With a known class count the feature axis is the one equal to `4 + num_classes`.
/// Without it: an empty axis is the proposal axis, an axis too short to hold a box plus
/// one class cannot be the feature axis, and otherwise the shorter axis wins, since
/// detectors emit far more proposals than classes. Ties go to `FeaturesFirst`.
pub fn resolve_layout(shape: &[usize], num_classes: Option<usize>) -> Result<TensorLayout> {
    if shape.len() != 3 {
        return Err(PipelineError::ShapeMismatch(format!(
            "expected a rank-3 tensor [1, features, proposals], got shape {:?}",
            shape
        )));
    }
    if shape[0] != 1 {
        return Err(PipelineError::ShapeMismatch(format!(
            "expected batch size 1, got shape {:?}",
            shape
        )));
    }

    let (a, b) = (shape[1], shape[2]);
    let layout = match num_classes {
        Some(n) => {
            let expected = BOX_FEATURES + n;
            if a == expected {
                TensorLayout::FeaturesFirst
            } else if b == expected {
                TensorLayout::ProposalsFirst
            } else {
                return Err(PipelineError::ShapeMismatch(format!(
                    "expected {} features (4 box + {} classes), got shape {:?}",
                    expected, n, shape
                )));
            }
        }
        None => guess_layout(a, b),
    };

    let features = match layout {
        TensorLayout::FeaturesFirst => a,
        TensorLayout::ProposalsFirst => b,
    };
    if features <= BOX_FEATURES {
        return Err(PipelineError::ShapeMismatch(format!(
            "need at least {} features (box + one class), got shape {:?}",
            BOX_FEATURES + 1,
            shape
        )));
    }
    Ok(layout)
}

fn guess_layout(a: usize, b: usize) -> TensorLayout {
    let can_hold_features = |n: usize| n > BOX_FEATURES;
    if b == 0 || (can_hold_features(a) && !can_hold_features(b)) {
        TensorLayout::FeaturesFirst
    } else if a == 0 || (can_hold_features(b) && !can_hold_features(a)) {
        TensorLayout::ProposalsFirst
    } else if a <= b {
        TensorLayout::FeaturesFirst
    } else {
        TensorLayout::ProposalsFirst
    }
}

/// Turns a raw detector tensor into one candidate per proposal.
///
/// Class scores are taken as-is: the exported graph has already applied its activation.
/// Candidates come out in proposal order, with boxes in letterboxed input space.
pub fn decode(raw: ArrayViewD<f32>, num_classes: Option<usize>) -> Result<Vec<Detection>> {
    let layout = resolve_layout(raw.shape(), num_classes)?;
    let raw = raw
        .into_dimensionality::<Ix3>()
        .map_err(|e| PipelineError::ShapeMismatch(e.to_string()))?;
    let batch = raw.index_axis_move(Axis(0), 0);
    let proposals = match layout {
        TensorLayout::FeaturesFirst => batch.reversed_axes(),
        TensorLayout::ProposalsFirst => batch,
    };
    Ok(decode_rows(proposals))
}

/// Decodes a `[proposals, features]` view.
fn decode_rows(proposals: ArrayView2<f32>) -> Vec<Detection> {
    let boxes = proposals.slice(s![.., ..BOX_FEATURES]);
    let class_scores = proposals.slice(s![.., BOX_FEATURES..]);

    boxes
        .outer_iter()
        .zip(class_scores.outer_iter())
        .map(|(geometry, scores)| {
            let (class_id, confidence) = scores
                .iter()
                .copied()
                .enumerate()
                .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
                .unwrap_or((0, f32::NEG_INFINITY));
            Detection {
                annotation: BoundingBox::from_center(
                    geometry[0],
                    geometry[1],
                    geometry[2],
                    geometry[3],
                ),
                confidence,
                class_id,
            }
        })
        .collect()
}
