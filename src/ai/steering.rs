//! Steering behaviors for AI movement
//!
//! Stateless kinematic rules on the XZ plane. Positions and velocities are
//! `Vec2` with `x` = world X and `y` = world Z; each function returns a
//! desired acceleration (or, for [`face`], a new orientation).

use glam::{Quat, Vec2, Vec3};
use rand::Rng;

/// Below this, a time step or speed is treated as zero.
const EPSILON: f32 = 1e-5;

/// Planar (XZ) projection of a world position
#[inline]
#[must_use]
pub fn planar(position: Vec3) -> Vec2 {
    Vec2::new(position.x, position.z)
}

/// World-space vector for a planar one, at height `y`
#[inline]
#[must_use]
pub fn from_planar(planar: Vec2, y: f32) -> Vec3 {
    Vec3::new(planar.x, y, planar.y)
}

/// Movement behaviour of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behaviour {
    /// Move toward the target
    Seek,
    /// Move away from the target
    Flee,
    /// Move toward where a moving target will be
    Pursue,
    /// Move away from where a moving target will be
    Evade,
}

impl Behaviour {
    /// Behaviour to use against a target that cannot move.
    ///
    /// Predicting a static point is pointless, so Pursue and Evade collapse
    /// to Seek and Flee.
    #[must_use]
    pub fn for_static_target(self) -> Self {
        match self {
            Self::Pursue => Self::Seek,
            Self::Evade => Self::Flee,
            other => other,
        }
    }

    /// Whether the behaviour moves toward its target
    #[must_use]
    pub fn approaches(self) -> bool {
        matches!(self, Self::Seek | Self::Pursue)
    }
}

/// Distances at which a behaviour counts as done.
#[derive(Debug, Clone, Copy)]
pub struct CompletionThresholds {
    /// Seek/Pursue complete within this distance (negative = never)
    pub seek_acceptable_distance: f32,
    /// Flee/Evade complete beyond this distance (negative = never)
    pub flee_acceptable_distance: f32,
}

impl Default for CompletionThresholds {
    fn default() -> Self {
        Self {
            seek_acceptable_distance: 0.1,
            flee_acceptable_distance: 10.0,
        }
    }
}

/// Whether `behaviour` from `position` against `target` is finished.
#[must_use]
pub fn is_complete(
    behaviour: Behaviour,
    position: Vec2,
    target: Vec2,
    thresholds: &CompletionThresholds,
) -> bool {
    let distance = position.distance(target);
    if behaviour.approaches() {
        let limit = thresholds.seek_acceptable_distance;
        limit >= 0.0 && distance <= limit
    } else {
        let limit = thresholds.flee_acceptable_distance;
        limit >= 0.0 && distance >= limit
    }
}

/// Accelerate toward `target`.
#[must_use]
pub fn seek(position: Vec2, _velocity: Vec2, target: Vec2, acceleration: f32) -> Vec2 {
    (target - position).normalize_or_zero() * acceleration
}

/// Accelerate away from `target`.
#[must_use]
pub fn flee(position: Vec2, velocity: Vec2, target: Vec2, acceleration: f32) -> Vec2 {
    -seek(position, velocity, target, acceleration)
}

/// Where a target moving from `last_target` to `target` over `delta_time`
/// will be by the time an agent at `position` with `velocity` gets there.
#[must_use]
pub fn predict_target(
    position: Vec2,
    velocity: Vec2,
    target: Vec2,
    last_target: Vec2,
    delta_time: f32,
) -> Vec2 {
    let target_velocity = if delta_time > EPSILON {
        (target - last_target) / delta_time
    } else {
        Vec2::ZERO
    };
    if target_velocity == Vec2::ZERO {
        return target;
    }

    let speed = velocity.length();
    let look_ahead = if speed > EPSILON {
        position.distance(target) / speed
    } else {
        0.0
    };
    target + target_velocity * look_ahead
}

/// Accelerate toward the predicted position of a moving target.
#[must_use]
pub fn pursue(
    position: Vec2,
    velocity: Vec2,
    target: Vec2,
    last_target: Vec2,
    acceleration: f32,
    delta_time: f32,
) -> Vec2 {
    let predicted = predict_target(position, velocity, target, last_target, delta_time);
    seek(position, velocity, predicted, acceleration)
}

/// Accelerate away from the predicted position of a moving target.
#[must_use]
pub fn evade(
    position: Vec2,
    velocity: Vec2,
    target: Vec2,
    last_target: Vec2,
    acceleration: f32,
    delta_time: f32,
) -> Vec2 {
    -pursue(position, velocity, target, last_target, acceleration, delta_time)
}

/// Random heading change of at most `max_turn_degrees` either way.
pub fn wander<R: Rng + ?Sized>(heading_degrees: f32, max_turn_degrees: f32, rng: &mut R) -> f32 {
    let max_turn = max_turn_degrees.abs();
    if max_turn <= 0.0 {
        return heading_degrees;
    }
    (heading_degrees + rng.random_range(-max_turn..=max_turn)).rem_euclid(360.0)
}

/// Unit planar direction for a heading in degrees (0 = +Z, 90 = +X).
#[must_use]
pub fn heading_direction(heading_degrees: f32) -> Vec2 {
    let radians = heading_degrees.to_radians();
    Vec2::new(radians.sin(), radians.cos())
}

/// Heading in degrees of a planar direction (inverse of [`heading_direction`]).
#[must_use]
pub fn heading_of(direction: Vec2) -> f32 {
    direction.x.atan2(direction.y).to_degrees().rem_euclid(360.0)
}

/// Turn `rotation` so that `forward` swings toward `target`, by at most
/// `max_degrees_per_second * delta_time`.
///
/// Only the planar part of the directions is used. If either direction is
/// degenerate, or the result is not a finite rotation, `rotation` is
/// returned unchanged.
#[must_use]
pub fn face(
    position: Vec3,
    forward: Vec3,
    target: Vec3,
    max_degrees_per_second: f32,
    delta_time: f32,
    rotation: Quat,
) -> Quat {
    let current = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    let desired = Vec3::new(target.x - position.x, 0.0, target.z - position.z).normalize_or_zero();
    if current == Vec3::ZERO || desired == Vec3::ZERO {
        return rotation;
    }

    let angle = current.angle_between(desired);
    let max_step = (max_degrees_per_second * delta_time).to_radians().max(0.0);
    let arc = Quat::from_rotation_arc(current, desired);
    let step = if angle <= max_step || angle <= EPSILON {
        arc
    } else {
        Quat::IDENTITY.slerp(arc, max_step / angle)
    };

    let turned = (step * rotation).normalize();
    if turned.is_finite() && turned.length_squared() > EPSILON {
        turned
    } else {
        rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_seek() {
        let output = seek(Vec2::ZERO, Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0);

        assert!(output.x > 0.0);
        assert!((output.length() - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_seek_at_target_is_zero() {
        assert_eq!(seek(Vec2::ONE, Vec2::ZERO, Vec2::ONE, 5.0), Vec2::ZERO);
    }

    #[test]
    fn test_flee_is_negated_seek() {
        let cases = [
            (Vec2::ZERO, Vec2::X, Vec2::new(3.0, -4.0), 2.0),
            (Vec2::new(-1.0, 5.0), Vec2::ZERO, Vec2::new(7.0, 7.0), 0.5),
            (Vec2::new(2.0, 2.0), Vec2::Y, Vec2::new(2.0, 2.0), 9.0),
        ];
        for (pos, vel, target, accel) in cases {
            assert_eq!(flee(pos, vel, target, accel), -seek(pos, vel, target, accel));
        }
    }

    #[test]
    fn test_pursue_static_target_is_seek() {
        let pos = Vec2::new(1.0, 2.0);
        let vel = Vec2::new(0.5, 0.5);
        let target = Vec2::new(6.0, -3.0);
        assert_eq!(
            pursue(pos, vel, target, target, 4.0, 0.016),
            seek(pos, vel, target, 4.0)
        );
    }

    #[test]
    fn test_pursue_zero_delta_time_is_seek() {
        let pos = Vec2::ZERO;
        let vel = Vec2::X;
        let target = Vec2::new(5.0, 5.0);
        let last = Vec2::new(4.0, 5.0);
        assert_eq!(pursue(pos, vel, target, last, 3.0, 0.0), seek(pos, vel, target, 3.0));
    }

    #[test]
    fn test_pursue_leads_moving_target() {
        // Target at (10, 0) moving +Z at 1 unit/s; pursuer moving at 5 units/s.
        let predicted = predict_target(
            Vec2::ZERO,
            Vec2::new(5.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, -1.0),
            1.0,
        );
        // Look ahead = 10 / 5 = 2 seconds.
        assert!(approx(predicted, Vec2::new(10.0, 2.0)));

        let steering = pursue(
            Vec2::ZERO,
            Vec2::new(5.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, -1.0),
            1.0,
            1.0,
        );
        assert!(steering.y > 0.0, "pursuer should lead the target");
    }

    #[test]
    fn test_evade_is_negated_pursue() {
        let args = (Vec2::ZERO, Vec2::X, Vec2::new(4.0, 1.0), Vec2::new(3.0, 1.0), 2.0, 0.5);
        assert_eq!(
            evade(args.0, args.1, args.2, args.3, args.4, args.5),
            -pursue(args.0, args.1, args.2, args.3, args.4, args.5)
        );
    }

    #[test]
    fn test_wander_stays_within_turn_limit() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut heading = 90.0;
        for _ in 0..100 {
            let next = wander(heading, 10.0, &mut rng);
            let delta = (next - heading + 540.0).rem_euclid(360.0) - 180.0;
            assert!(delta.abs() <= 10.0 + 1e-3);
            heading = next;
        }
    }

    #[test]
    fn test_wander_without_turn_keeps_heading() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(wander(45.0, 0.0, &mut rng), 45.0);
    }

    #[test]
    fn test_heading_roundtrip() {
        assert!(approx(heading_direction(0.0), Vec2::Y));
        assert!(approx(heading_direction(90.0), Vec2::X));
        assert!((heading_of(Vec2::new(-1.0, 0.0)) - 270.0).abs() < 1e-3);
    }

    #[test]
    fn test_completion_thresholds() {
        let thresholds = CompletionThresholds::default();
        let pos = Vec2::ZERO;

        assert!(is_complete(Behaviour::Seek, pos, Vec2::new(0.05, 0.0), &thresholds));
        assert!(!is_complete(Behaviour::Seek, pos, Vec2::new(0.5, 0.0), &thresholds));
        assert!(is_complete(Behaviour::Flee, pos, Vec2::new(12.0, 0.0), &thresholds));
        assert!(!is_complete(Behaviour::Evade, pos, Vec2::new(5.0, 0.0), &thresholds));
    }

    #[test]
    fn test_negative_threshold_disables_completion() {
        let thresholds = CompletionThresholds {
            seek_acceptable_distance: -1.0,
            flee_acceptable_distance: -1.0,
        };
        assert!(!is_complete(Behaviour::Pursue, Vec2::ZERO, Vec2::ZERO, &thresholds));
        assert!(!is_complete(Behaviour::Flee, Vec2::ZERO, Vec2::splat(1000.0), &thresholds));
    }

    #[test]
    fn test_completion_is_monotonic() {
        let thresholds = CompletionThresholds::default();
        let target = Vec2::new(3.0, 4.0);
        let mut distance = thresholds.seek_acceptable_distance;
        while distance > 0.0 {
            let pos = target - Vec2::X * distance;
            assert!(is_complete(Behaviour::Seek, pos, target, &thresholds));
            distance -= 0.01;
        }
    }

    #[test]
    fn test_static_target_degradation() {
        assert_eq!(Behaviour::Pursue.for_static_target(), Behaviour::Seek);
        assert_eq!(Behaviour::Evade.for_static_target(), Behaviour::Flee);
        assert_eq!(Behaviour::Flee.for_static_target(), Behaviour::Flee);
    }

    #[test]
    fn test_face_turns_at_most_max_rate() {
        let rotation = Quat::IDENTITY;
        let forward = rotation * Vec3::NEG_Z;
        // Target directly to the right (+X), 90 degrees away.
        let turned = face(Vec3::ZERO, forward, Vec3::X, 45.0, 1.0, rotation);
        let new_forward = turned * Vec3::NEG_Z;

        let turned_by = forward.angle_between(new_forward).to_degrees();
        assert!((turned_by - 45.0).abs() < 0.1);
        assert!(new_forward.x > 0.0);
    }

    #[test]
    fn test_face_snaps_when_close() {
        let rotation = Quat::IDENTITY;
        let forward = rotation * Vec3::NEG_Z;
        let target = Vec3::new(0.1, 0.0, -1.0);
        let turned = face(Vec3::ZERO, forward, target, 360.0, 1.0, rotation);
        let new_forward = turned * Vec3::NEG_Z;
        assert!((new_forward - target.normalize()).length() < 1e-4);
    }

    #[test]
    fn test_face_degenerate_keeps_rotation() {
        let rotation = Quat::from_rotation_y(0.7);
        let forward = rotation * Vec3::NEG_Z;
        // Target at own position: no direction to face.
        assert_eq!(face(Vec3::ONE, forward, Vec3::ONE, 90.0, 0.1, rotation), rotation);
        // Target straight above: planar direction is zero.
        assert_eq!(face(Vec3::ZERO, forward, Vec3::Y * 5.0, 90.0, 0.1, rotation), rotation);
        // Degenerate forward.
        assert_eq!(face(Vec3::ZERO, Vec3::Y, Vec3::X, 90.0, 0.1, rotation), rotation);
    }
}
