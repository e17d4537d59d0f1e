// Fire control: edge-triggered fire button gated by a shot cooldown.

use crate::domain::ports::TickClock;
use crate::domain::state::{Buttons, EntityId, PlayerInput};
use crate::domain::systems::projectiles::spawn_projectile;
use crate::domain::timer;
use crate::domain::tuning::ProjectileTuning;
use crate::domain::world::World;

/// Applies one tick of input to the shooter's fire state.
///
/// Returns the spawned projectile when the fire button was pressed this tick and the
/// cooldown allowed it.
pub fn fire_control<C: TickClock + ?Sized>(
    world: &mut World,
    shooter: EntityId,
    input: &PlayerInput,
    clock: &C,
    shot_delay: f32,
    projectile: ProjectileTuning,
) -> Option<EntityId> {
    let tick = clock.current_tick();
    let e = world.get_mut(shooter)?;
    if !e.alive {
        return None;
    }
    let owner = e.authority?;
    let origin = e.position;
    let player = e.player_mut()?;

    let pressed = input.buttons.was_pressed(player.buttons_previous, Buttons::FIRE);
    player.buttons_previous = input.buttons;

    let direction = input.direction();
    if !direction.is_zero() {
        player.facing = direction.normalized();
    }

    if !pressed || !timer::is_expired_or_not_running(player.shoot_cooldown, tick) {
        return None;
    }
    player.shoot_cooldown = timer::start(shot_delay, tick, clock.tick_rate());
    let heading = player.facing;

    Some(spawn_projectile(world, owner, origin, heading, clock, projectile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::math::Vec2;
    use crate::domain::spawner::{SpawnRegistry, Spawner};
    use crate::domain::state::AuthorityId;
    use crate::domain::test_support::FixedClock;
    use crate::domain::tuning::PlayerTuning;

    fn setup() -> (World, EntityId) {
        let mut world = World::new();
        let registry = SpawnRegistry::new(vec![Vec2::ZERO]).expect("registry");
        let mut spawner = Spawner::new(registry, PlayerTuning::default(), 0);
        let id = spawner.place_new_entity(&mut world, AuthorityId(1), "A".into());
        (world, id)
    }

    fn fire(horizontal: f32, vertical: f32) -> PlayerInput {
        PlayerInput {
            horizontal,
            vertical,
            buttons: Buttons::FIRE,
        }
    }

    #[test]
    fn when_no_direction_was_ever_given_then_bullet_heads_up() {
        let (mut world, id) = setup();
        let shot = fire_control(
            &mut world,
            id,
            &fire(0.0, 0.0),
            &FixedClock::at(1),
            0.2,
            ProjectileTuning::default(),
        )
        .expect("shot fired");

        let heading = world.get(shot).and_then(|e| e.projectile().map(|p| p.heading));
        assert_eq!(heading, Some(Vec2::UP));
    }

    #[test]
    fn when_fire_is_held_then_only_one_bullet_is_spawned() {
        let (mut world, id) = setup();
        let tuning = ProjectileTuning::default();

        let first = fire_control(&mut world, id, &fire(1.0, 0.0), &FixedClock::at(1), 0.2, tuning);
        let held = fire_control(&mut world, id, &fire(1.0, 0.0), &FixedClock::at(40), 0.2, tuning);

        assert!(first.is_some());
        assert!(held.is_none());
    }

    #[test]
    fn when_pressed_again_inside_the_cooldown_then_the_shot_is_refused() {
        let (mut world, id) = setup();
        let tuning = ProjectileTuning::default();
        let release = PlayerInput::default();

        // 0.2s at 60Hz is a 12 tick cooldown starting at tick 10.
        assert!(fire_control(&mut world, id, &fire(0.0, 1.0), &FixedClock::at(10), 0.2, tuning).is_some());
        fire_control(&mut world, id, &release, &FixedClock::at(11), 0.2, tuning);
        assert!(fire_control(&mut world, id, &fire(0.0, 1.0), &FixedClock::at(21), 0.2, tuning).is_none());
        fire_control(&mut world, id, &release, &FixedClock::at(22), 0.2, tuning);
        assert!(fire_control(&mut world, id, &fire(0.0, 1.0), &FixedClock::at(23), 0.2, tuning).is_some());
    }

    #[test]
    fn when_last_direction_was_left_then_bullet_keeps_heading_left_after_input_stops() {
        let (mut world, id) = setup();
        let tuning = ProjectileTuning::default();
        let steer_left = PlayerInput {
            horizontal: -1.0,
            ..PlayerInput::default()
        };

        fire_control(&mut world, id, &steer_left, &FixedClock::at(1), 0.2, tuning);
        let shot = fire_control(&mut world, id, &fire(0.0, 0.0), &FixedClock::at(2), 0.2, tuning)
            .expect("shot fired");

        let heading = world.get(shot).and_then(|e| e.projectile().map(|p| p.heading));
        assert_eq!(heading, Some(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn when_shooter_is_dead_then_nothing_is_fired() {
        let (mut world, id) = setup();
        world.get_mut(id).expect("ship").alive = false;
        let shot = fire_control(
            &mut world,
            id,
            &fire(0.0, 1.0),
            &FixedClock::at(1),
            0.2,
            ProjectileTuning::default(),
        );
        assert!(shot.is_none());
    }
}
