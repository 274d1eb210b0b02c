//! Core type definitions used throughout the codebase

use std::f32::consts::{PI, TAU};

/// Simulation tick counter
pub type Tick = u64;

/// Heading in radians, measured counter-clockwise from +X on the
/// horizontal plane. Kept in (-PI, PI] once normalized.
pub type Heading = f32;

/// Wrap an angle into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Shortest signed rotation taking `from` onto `to`, in (-PI, PI]
///
/// A half turn is reported as +PI.
pub fn shortest_turn(from: Heading, to: Heading) -> f32 {
    wrap_angle(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_wrap_angle_identity_in_range() {
        assert!((wrap_angle(1.0) - 1.0).abs() < EPS);
        assert!((wrap_angle(-1.0) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_wrap_angle_full_turns() {
        assert!(wrap_angle(TAU).abs() < EPS);
        assert!((wrap_angle(PI + 0.5) - (-PI + 0.5)).abs() < EPS);
        assert!((wrap_angle(-PI) - PI).abs() < EPS);
    }

    #[test]
    fn test_shortest_turn_crosses_seam() {
        // From just below +PI to just above -PI is a small positive turn
        let turn = shortest_turn(PI - 0.1, -PI + 0.1);
        assert!((turn - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_half_turn_is_positive() {
        let turn = shortest_turn(0.0, PI);
        assert!((turn - PI).abs() < EPS);
        let turn = shortest_turn(PI / 2.0, -PI / 2.0);
        assert!((turn - PI).abs() < EPS);
    }
}
