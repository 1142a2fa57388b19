//! Deterministic replay of an action plan against a canvas.
//!
//! The simulator models a physical cursor: it cannot leave the canvas at any
//! point mid-sequence, so each axis is clamped to `[0, bound]` after every
//! individual move. Overshoot in one direction therefore never "banks"
//! distance that a later opposite move could reclaim.

use crate::action::Action;

/// Replays `actions` from `start`, returning the final clamped position.
///
/// Each `Move` displaces the cursor by `step * magnitude` along its axis and
/// is clamped immediately. `Click` leaves the position unchanged. Pure and
/// infallible for any input sequence and any non-negative bounds.
pub fn simulate(actions: &[Action], start: (i32, i32), bounds: (i32, i32), step: i32) -> (i32, i32) {
    let (mut x, mut y) = start;
    let (width, height) = bounds;

    for action in actions {
        match action {
            Action::Move { direction, magnitude } => {
                let (ux, uy) = direction.unit();
                // Widen to i64: step * magnitude can exceed i32 for parsed
                // plans with absurd magnitudes, and clamping brings the
                // position back into i32 range anyway.
                let amount = step as i64 * *magnitude as i64;
                x = (x as i64 + ux as i64 * amount).clamp(0, width.max(0) as i64) as i32;
                y = (y as i64 + uy as i64 * amount).clamp(0, height.max(0) as i64) as i32;
            }
            Action::Click => {}
        }
    }

    (x, y)
}
