//! Per-axis segment merge
//!
//! States compute horizontal and vertical motion independently. This joins
//! the two streams into one planar stream whose breakpoints are the union of
//! both axes' breakpoints.

use glam::Vec2;

use super::kinematics::{KinematicSegment, KinematicState};

/// Join x and y segment streams covering (nominally) the same time span.
///
/// Walks both streams with two cursors, emitting a planar segment for the
/// shorter of the two active pieces and contracting the longer one. Output
/// length is `min(Σx, Σy)`; zero-length pieces are skipped.
pub fn merge_segments(
    x: &[KinematicSegment<f32>],
    y: &[KinematicSegment<f32>],
) -> Vec<KinematicSegment<Vec2>> {
    let mut merged = Vec::with_capacity(x.len() + y.len());
    let mut xs = x.iter().copied();
    let mut ys = y.iter().copied();
    let mut cur_x = xs.next();
    let mut cur_y = ys.next();

    while let (Some(sx), Some(sy)) = (cur_x, cur_y) {
        let duration = sx.duration.min(sy.duration);
        if duration > 0.0 {
            merged.push(KinematicSegment::new(
                KinematicState::from_axes(sx.initial, sy.initial),
                Vec2::new(sx.acceleration, sy.acceleration),
                duration,
            ));
        }

        if sx.duration < sy.duration {
            cur_y = Some(sy.contracted(duration));
            cur_x = xs.next();
        } else if sy.duration < sx.duration {
            cur_x = Some(sx.contracted(duration));
            cur_y = ys.next();
        } else {
            cur_x = xs.next();
            cur_y = ys.next();
        }
    }

    merged
}
