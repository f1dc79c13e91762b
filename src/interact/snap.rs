//! Alignment snapping for move gestures.
//!
//! Each axis is resolved independently. Targets are the canvas midline and edges plus the center
//! and edges of every other layer; the moving box contributes its center, leading edge and trailing
//! edge as reference points. The single closest (reference, target) pair under the threshold wins.
//! Ties keep the first pair found, in the order: reference center, leading, trailing, each scanned
//! against canvas 50, 0, 100 and then the other layers in stack order.

use crate::geometry::PercentBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideAxis {
    /// A vertical line at an x position (produced by horizontal snapping).
    Vertical,
    /// A horizontal line at a y position.
    Horizontal,
}

/// Transient alignment indicator shown while a snap is active.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Guide {
    pub axis: GuideAxis,
    /// Percent along the perpendicular axis.
    pub position: f64,
}

/// Alignment targets along both axes, in percent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapTargets {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl SnapTargets {
    /// Canvas targets followed by every box in `others`.
    pub fn collect<'a>(others: impl IntoIterator<Item = &'a PercentBox>) -> Self {
        let mut t = Self {
            x: vec![50.0, 0.0, 100.0],
            y: vec![50.0, 0.0, 100.0],
        };
        for b in others {
            t.x.extend([b.x, b.left(), b.right()]);
            t.y.extend([b.y, b.top(), b.bottom()]);
        }
        t
    }
}

/// Outcome of snapping one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSnap {
    /// Adjusted center along the axis.
    pub center: f64,
    pub target: f64,
}

/// Snap a box center on one axis. `half_extent` is half the box size on that axis.
pub fn snap_axis(center: f64, half_extent: f64, targets: &[f64], threshold: f64) -> Option<AxisSnap> {
    let refs = [
        (center, 0.0),
        (center - half_extent, half_extent),
        (center + half_extent, -half_extent),
    ];

    let mut best: Option<(f64, AxisSnap)> = None;
    for (point, offset_to_center) in refs {
        for &target in targets {
            let diff = (point - target).abs();
            let better = best.is_none_or(|(d, _)| diff < d);
            if diff < threshold && better {
                best = Some((
                    diff,
                    AxisSnap {
                        center: target + offset_to_center,
                        target,
                    },
                ));
            }
        }
    }
    best.map(|(_, s)| s)
}

/// Snap a candidate box on both axes. Returns the adjusted box and 0..=2 guides.
pub fn snap_box(
    candidate: PercentBox,
    targets: &SnapTargets,
    threshold_x: f64,
    threshold_y: f64,
) -> (PercentBox, Vec<Guide>) {
    let mut out = candidate;
    let mut guides = Vec::with_capacity(2);

    if let Some(s) = snap_axis(candidate.x, candidate.width / 2.0, &targets.x, threshold_x) {
        out.x = s.center;
        guides.push(Guide {
            axis: GuideAxis::Vertical,
            position: s.target,
        });
    }
    if let Some(s) = snap_axis(candidate.y, candidate.height / 2.0, &targets.y, threshold_y) {
        out.y = s.center;
        guides.push(Guide {
            axis: GuideAxis::Horizontal,
            position: s.target,
        });
    }

    (out, guides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_center_to_canvas_midline() {
        let s = snap_axis(50.6, 10.0, &[50.0, 0.0, 100.0], 1.0).unwrap();
        assert_eq!(s.center, 50.0);
        assert_eq!(s.target, 50.0);
    }

    #[test]
    fn snaps_leading_edge_and_shifts_center() {
        // left edge at 0.4 -> 0
        let s = snap_axis(10.4, 10.0, &[50.0, 0.0, 100.0], 1.0).unwrap();
        assert!((s.center - 10.0).abs() < 1e-12);
        assert_eq!(s.target, 0.0);
    }

    #[test]
    fn closest_pair_wins_across_reference_points() {
        // center 30.3 is 0.7 from 31, right edge 40.3 is 0.3 from 40.
        let s = snap_axis(30.3, 10.0, &[31.0, 40.0], 1.0).unwrap();
        assert_eq!(s.target, 40.0);
        assert!((s.center - 30.0).abs() < 1e-12);
    }

    #[test]
    fn equal_distance_keeps_first_found() {
        // center is 0.5 from 50.5 and the left edge is 0.5 from 39.5
        let s = snap_axis(50.0, 10.0, &[50.5, 39.5], 1.0).unwrap();
        assert_eq!(s.target, 50.5);
    }

    #[test]
    fn nothing_within_threshold() {
        assert!(snap_axis(33.0, 5.0, &[50.0, 0.0, 100.0], 1.0).is_none());
        // threshold is exclusive
        assert!(snap_axis(51.0, 5.0, &[50.0], 1.0).is_none());
    }

    #[test]
    fn targets_include_other_boxes() {
        let other = PercentBox::new(20.0, 70.0, 10.0, 4.0);
        let t = SnapTargets::collect([&other]);
        assert_eq!(t.x, vec![50.0, 0.0, 100.0, 20.0, 15.0, 25.0]);
        assert_eq!(t.y, vec![50.0, 0.0, 100.0, 70.0, 68.0, 72.0]);
    }

    #[test]
    fn box_snap_emits_one_guide_per_axis() {
        let t = SnapTargets::collect([]);
        let (b, guides) = snap_box(PercentBox::new(50.3, 20.0, 10.0, 10.0), &t, 1.0, 1.0);
        assert_eq!(b.x, 50.0);
        assert_eq!(b.y, 20.0);
        assert_eq!(
            guides,
            vec![Guide {
                axis: GuideAxis::Vertical,
                position: 50.0
            }]
        );
    }
}
