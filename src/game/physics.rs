//! Object Physics
//!
//! Integrates physics-enabled world objects: gravity, linear friction,
//! then position. The floor and the side walls bounce with half the
//! incoming speed. There is no ceiling and objects do not collide with
//! each other.

use crate::config::Playfield;
use crate::game::state::{WorldObject, WorldState};

/// Fraction of speed kept after a bounce.
pub const RESTITUTION: f64 = 0.5;

/// Advance one object by `dt` seconds. No-op unless physics is enabled.
pub fn integrate_object(object: &mut WorldObject, gravity: f64, dt: f64, playfield: &Playfield) {
    let Some(physics) = object.physics.as_ref().filter(|p| p.enabled) else {
        return;
    };
    let damping = 1.0 - physics.friction * dt;

    object.velocity.y += gravity * dt;
    object.velocity = object.velocity * damping;
    object.position = object.position + object.velocity * dt;

    // Floor
    let floor = playfield.height - object.size.y;
    if object.position.y >= floor {
        object.position.y = floor;
        if object.velocity.y > 0.0 {
            object.velocity.y = -object.velocity.y * RESTITUTION;
        }
    }

    // Walls
    let right = (playfield.width - object.size.x).max(0.0);
    if object.position.x <= 0.0 {
        object.position.x = 0.0;
        if object.velocity.x < 0.0 {
            object.velocity.x = -object.velocity.x * RESTITUTION;
        }
    } else if object.position.x >= right {
        object.position.x = right;
        if object.velocity.x > 0.0 {
            object.velocity.x = -object.velocity.x * RESTITUTION;
        }
    }
}

/// Advance every physics-enabled object.
pub fn update_objects(state: &mut WorldState, gravity: f64, dt: f64) {
    let playfield = state.playfield;
    for object in state.objects.iter_mut() {
        integrate_object(object, gravity, dt, &playfield);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::state::{ObjectCategory, ObjectPhysics};
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn ball(position: Vec2, velocity: Vec2, friction: f64, enabled: bool) -> WorldObject {
        WorldObject {
            id: "ball".to_string(),
            position,
            size: Vec2::new(20.0, 20.0),
            velocity,
            color: "#fff".to_string(),
            category: ObjectCategory::Scenery,
            physics: Some(ObjectPhysics { enabled, mass: 1.0, friction }),
        }
    }

    #[test]
    fn test_gravity_and_friction() {
        let field = Playfield::default();
        let mut obj = ball(Vec2::new(100.0, 100.0), Vec2::ZERO, 0.1, true);
        integrate_object(&mut obj, 9.8, DT, &field);

        let expected_vy = 9.8 * DT * (1.0 - 0.1 * DT);
        assert!((obj.velocity.y - expected_vy).abs() < 1e-12);
        assert!((obj.position.y - (100.0 + expected_vy * DT)).abs() < 1e-12);
        assert_eq!(obj.position.x, 100.0);
    }

    #[test]
    fn test_zero_friction_keeps_speed() {
        let field = Playfield::default();
        let mut obj = ball(Vec2::new(100.0, 100.0), Vec2::new(50.0, 0.0), 0.0, true);
        integrate_object(&mut obj, 0.0, DT, &field);
        assert_eq!(obj.velocity, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_disabled_or_missing_physics_is_static() {
        let field = Playfield::default();
        let mut obj = ball(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0), 0.1, false);
        integrate_object(&mut obj, 9.8, DT, &field);
        assert_eq!(obj.position, Vec2::new(100.0, 100.0));

        obj.physics = None;
        integrate_object(&mut obj, 9.8, DT, &field);
        assert_eq!(obj.position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_floor_bounce() {
        let field = Playfield::default();
        let mut obj = ball(Vec2::new(100.0, 579.0), Vec2::new(0.0, 120.0), 0.0, true);
        integrate_object(&mut obj, 0.0, DT, &field);

        assert_eq!(obj.position.y, 580.0);
        assert_eq!(obj.velocity.y, -60.0);
    }

    #[test]
    fn test_wall_bounce() {
        let field = Playfield::default();

        let mut obj = ball(Vec2::new(0.5, 100.0), Vec2::new(-60.0, 0.0), 0.0, true);
        integrate_object(&mut obj, 0.0, DT, &field);
        assert_eq!(obj.position.x, 0.0);
        assert_eq!(obj.velocity.x, 30.0);

        let mut obj = ball(Vec2::new(779.5, 100.0), Vec2::new(60.0, 0.0), 0.0, true);
        integrate_object(&mut obj, 0.0, DT, &field);
        assert_eq!(obj.position.x, 780.0);
        assert_eq!(obj.velocity.x, -30.0);
    }

    #[test]
    fn test_resting_on_floor_does_not_launch() {
        let field = Playfield::default();
        let mut obj = ball(Vec2::new(100.0, 580.0), Vec2::ZERO, 0.1, true);

        for _ in 0..600 {
            integrate_object(&mut obj, 9.8, DT, &field);
            assert!(obj.position.y + obj.size.y <= field.height);
        }
        assert!(obj.velocity.y.abs() < 1.0);
    }

    proptest! {
        #[test]
        fn prop_bottom_edge_never_below_floor(
            x in 0.0f64..780.0,
            y in 0.0f64..580.0,
            vx in -2000.0f64..2000.0,
            vy in -2000.0f64..2000.0,
            gravity in 0.0f64..100.0,
            friction in 0.0f64..1.0,
            steps in 1usize..300,
        ) {
            let field = Playfield::default();
            let mut obj = ball(Vec2::new(x, y), Vec2::new(vx, vy), friction, true);

            for _ in 0..steps {
                integrate_object(&mut obj, gravity, DT, &field);
                prop_assert!(obj.position.y + obj.size.y <= field.height);
                prop_assert!(obj.position.x >= 0.0);
                prop_assert!(obj.position.x + obj.size.x <= field.width);
            }
        }
    }
}
