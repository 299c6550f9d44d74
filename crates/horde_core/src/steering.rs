//! Steering: pure direction and velocity computations.
//!
//! No hidden state. Every function returns either a unit direction or a
//! velocity whose length never exceeds the requested speed.

use crate::math::{fixed_sqrt, Fixed, Vec2Fixed};

/// Velocity toward `to` at `speed`. Zero when already there.
#[must_use]
pub fn seek(from: Vec2Fixed, to: Vec2Fixed, speed: Fixed) -> Vec2Fixed {
    (to - from).normalize() * speed
}

/// Velocity away from `threat` at `speed`. Exactly `-seek`.
#[must_use]
pub fn flee(from: Vec2Fixed, threat: Vec2Fixed, speed: Fixed) -> Vec2Fixed {
    -seek(from, threat, speed)
}

/// Boid-style separation away from crowding neighbors.
///
/// Sums `(subject - neighbor) / distance` over neighbors strictly within
/// `radius`, then normalizes. Closer neighbors dominate. Neighbors at zero
/// distance have no defined direction and are skipped.
#[must_use]
pub fn separation<I>(subject: Vec2Fixed, neighbors: I, radius: Fixed) -> Vec2Fixed
where
    I: IntoIterator<Item = Vec2Fixed>,
{
    let radius_sq = radius * radius;
    // keeps the 1/dist weight bounded for near-coincident neighbors
    let min_dist = Fixed::from_num(0.001);
    let mut push = Vec2Fixed::ZERO;

    for neighbor in neighbors {
        let away = subject - neighbor;
        let dist_sq = away.dot(away);
        if dist_sq == Fixed::ZERO || dist_sq >= radius_sq {
            continue;
        }
        let dist = fixed_sqrt(dist_sq).max(min_dist);
        push += away.normalize() * (Fixed::ONE / dist);
    }

    push.normalize()
}

/// Unit tangent for circling `center`; `sign` selects the direction.
///
/// Perpendicular to the subject-to-center vector: positive sign orbits
/// counter-clockwise.
#[must_use]
pub fn orbit(center: Vec2Fixed, subject: Vec2Fixed, sign: Fixed) -> Vec2Fixed {
    let to_center = (center - subject).normalize();
    let tangent = to_center.perpendicular();
    if sign < Fixed::ZERO {
        -tangent
    } else {
        tangent
    }
}

/// Combine steering directions and scale to `speed`.
///
/// The sum is normalized first so blending never exceeds max speed.
#[must_use]
pub fn blend(directions: &[Vec2Fixed], speed: Fixed) -> Vec2Fixed {
    let mut sum = Vec2Fixed::ZERO;
    for direction in directions {
        sum += *direction;
    }
    sum.normalize() * speed
}

/// Radial correction keeping `subject` inside `[ideal - band, ideal + band]`
/// from `center`, scaled by `weight`. Zero inside the band.
#[must_use]
pub fn hold_distance(
    center: Vec2Fixed,
    subject: Vec2Fixed,
    ideal: Fixed,
    band: Fixed,
    weight: Fixed,
) -> Vec2Fixed {
    let to_center = (center - subject).normalize();
    let dist = subject.distance(center);
    if dist > ideal + band {
        to_center * weight
    } else if dist < ideal - band {
        -to_center * weight
    } else {
        Vec2Fixed::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn close(a: Fixed, b: Fixed) -> bool {
        (a - b).abs() < f(0.001)
    }

    #[test]
    fn test_seek_and_flee_are_opposite() {
        let from = Vec2Fixed::ZERO;
        let to = Vec2Fixed::from_ints(10, 0);
        assert_eq!(seek(from, to, f(3.0)), Vec2Fixed::from_ints(3, 0));
        assert_eq!(flee(from, to, f(3.0)), Vec2Fixed::from_ints(-3, 0));
        assert_eq!(seek(to, to, f(3.0)), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_separation_alone_is_zero() {
        let far = [Vec2Fixed::from_ints(5, 0), Vec2Fixed::from_ints(0, -5)];
        assert_eq!(separation(Vec2Fixed::ZERO, far, f(1.5)), Vec2Fixed::ZERO);
        assert_eq!(
            separation(Vec2Fixed::ZERO, std::iter::empty(), f(1.5)),
            Vec2Fixed::ZERO
        );
    }

    #[test]
    fn test_separation_points_away() {
        let push = separation(
            Vec2Fixed::ZERO,
            [Vec2Fixed::from_f64(0.5, 0.0)],
            f(1.0),
        );
        assert!(close(push.x, f(-1.0)));
        assert!(close(push.y, Fixed::ZERO));
    }

    #[test]
    fn test_separation_closer_neighbor_dominates() {
        let push = separation(
            Vec2Fixed::ZERO,
            [Vec2Fixed::from_f64(0.2, 0.0), Vec2Fixed::from_f64(0.0, 0.8)],
            f(1.0),
        );
        assert!(push.x < Fixed::ZERO);
        assert!(push.y < Fixed::ZERO);
        assert!(push.x.abs() > push.y.abs());
    }

    #[test]
    fn test_separation_skips_coincident_neighbor() {
        let push = separation(Vec2Fixed::ZERO, [Vec2Fixed::ZERO], f(1.0));
        assert_eq!(push, Vec2Fixed::ZERO);
    }

    #[test]
    fn test_orbit_is_perpendicular_unit() {
        let center = Vec2Fixed::ZERO;
        let subject = Vec2Fixed::from_ints(3, 0);
        let ccw = orbit(center, subject, Fixed::ONE);
        let cw = orbit(center, subject, -Fixed::ONE);

        assert_eq!(ccw, -cw);
        assert!(close(ccw.length(), Fixed::ONE));
        assert!(close(ccw.dot(center - subject), Fixed::ZERO));
    }

    #[test]
    fn test_blend_never_exceeds_speed() {
        let velocity = blend(
            &[Vec2Fixed::from_ints(1, 0), Vec2Fixed::from_ints(0, 1)],
            f(2.0),
        );
        assert!(close(velocity.length(), f(2.0)));
        assert_eq!(blend(&[], f(2.0)), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_hold_distance_band() {
        let center = Vec2Fixed::ZERO;
        let ideal = f(2.0);
        let band = f(0.5);
        let weight = f(0.5);

        let far = hold_distance(center, Vec2Fixed::from_ints(4, 0), ideal, band, weight);
        assert!(far.x < Fixed::ZERO);

        let near = hold_distance(center, Vec2Fixed::from_ints(1, 0), ideal, band, weight);
        assert!(near.x > Fixed::ZERO);

        let inside = hold_distance(center, Vec2Fixed::from_ints(2, 0), ideal, band, weight);
        assert_eq!(inside, Vec2Fixed::ZERO);
    }
}
