// Arrow projectile

use glam::{IVec2, Vec2};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::orientation::Orientation;
use super::EntityView;
use crate::core::math::unit_direction;
use crate::engine::game_loop::LoopHandle;
use crate::engine::physics::{Body, BodyOptions, Rect, WorldHandle};
use crate::engine::sprite::{Sprite, SpriteAnimation, SpriteSheet};
use crate::game::config::{ArrowTuning, ARROW_FILTER, BORDER_LABEL};
use crate::game::error::GameError;

/// What an arrow ran into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrowSignal {
    Border,
    /// Any other body, by label
    Obstacle(String),
}

/// A projectile pinned at its start until shot, then flying straight
pub struct Arrow {
    body: Body,
    sprite: Sprite,
    shot: Rc<Cell<bool>>,
    signals: Rc<RefCell<Vec<ArrowSignal>>>,
}

impl Arrow {
    /// Spawn an arrow with its top-left corner at `start`
    pub fn new(
        world: &WorldHandle,
        game_loop: &LoopHandle,
        tuning: &ArrowTuning,
        start: Vec2,
        direction: IVec2,
    ) -> Result<Self, GameError> {
        let rect = Rect::new(start.x, start.y, tuning.width, tuning.height);
        let angle = Orientation::from_movement(direction)
            .map(Orientation::angle)
            .unwrap_or(0.0);

        let shot = Rc::new(Cell::new(false));
        let signals = Rc::new(RefCell::new(Vec::new()));

        let velocity = unit_direction(direction) * tuning.speed;
        let anchor = rect.center();
        let is_shot = Rc::clone(&shot);
        let collisions = Rc::clone(&signals);

        let body = Body::builder(rect)
            .options(
                BodyOptions::dynamic()
                    .label("arrow")
                    .angle(angle)
                    .friction_air(0.0)
                    .can_sleep(false)
                    .collision_filter(ARROW_FILTER),
            )
            .on_update(move |control| {
                if is_shot.get() {
                    if control.velocity() != velocity {
                        control.set_velocity(velocity);
                    }
                } else {
                    control.set_position(anchor);
                    control.set_angle(angle);
                    control.set_velocity(Vec2::ZERO);
                }
            })
            .on_collision(move |collision| {
                let mut signals = collisions.borrow_mut();
                for contact in &collision.pairs {
                    signals.push(if contact.other_label == BORDER_LABEL {
                        ArrowSignal::Border
                    } else {
                        ArrowSignal::Obstacle(contact.other_label.clone())
                    });
                }
            })
            .mount(world, game_loop)?;

        let sheet = SpriteSheet::still(tuning.width as u32, tuning.height as u32);
        let sprite = Sprite::new(game_loop, sheet, SpriteAnimation::new(0))?;

        log::debug!("Arrow spawned at {:?} toward {:?}", start, direction);
        Ok(Self {
            body,
            sprite,
            shot,
            signals,
        })
    }

    /// Release the arrow; it takes its velocity on the next tick
    pub fn shoot(&self) {
        self.shot.set(true);
    }

    #[cfg(test)]
    pub fn is_shot(&self) -> bool {
        self.shot.get()
    }

    /// Collisions seen since the last poll, oldest first
    pub fn poll_signals(&self) -> Vec<ArrowSignal> {
        std::mem::take(&mut self.signals.borrow_mut())
    }

    #[cfg(test)]
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn view(&self) -> EntityView {
        EntityView::new(&self.body, self.sprite.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::engine::game_loop::GameLoop;
    use crate::engine::physics::{Gravity, World, WorldConfig};
    use crate::game::config::{colliders, ARROW_TUNING};
    use crate::engine::physics::CollisionFilter;
    use std::time::Duration;

    struct Rig {
        game_loop: GameLoop,
        clock: Rc<ManualClock>,
        world: World,
    }

    impl Rig {
        fn new() -> Self {
            let game_loop = GameLoop::new();
            let clock = Rc::new(ManualClock::new());
            let world = World::new(
                &game_loop.handle(),
                clock.clone(),
                WorldConfig {
                    gravity: Gravity::zero(),
                },
            );
            Self {
                game_loop,
                clock,
                world,
            }
        }

        fn tick(&self) {
            self.clock.advance(Duration::from_micros(16_667));
            self.game_loop.tick();
        }

        fn arrow(&self, start: Vec2, direction: IVec2) -> Arrow {
            Arrow::new(
                &self.world.handle(),
                &self.game_loop.handle(),
                &ARROW_TUNING,
                start,
                direction,
            )
            .unwrap()
        }

        fn wall(&self, rect: Rect, label: &str) {
            self.world
                .handle()
                .add_body(rect, &BodyOptions::fixed().label(label))
                .unwrap();
        }
    }

    #[test]
    fn test_shot_arrow_flies_at_fixed_speed() {
        let rig = Rig::new();
        let arrow = rig.arrow(Vec2::new(100.0, 100.0), IVec2::new(1, 0));

        rig.tick();
        assert_eq!(arrow.body().velocity().unwrap(), Vec2::ZERO);

        arrow.shoot();
        rig.tick();
        assert_eq!(arrow.body().velocity().unwrap(), Vec2::new(12.0, 0.0));
    }

    #[test]
    fn test_unshot_arrow_stays_put() {
        let rig = Rig::new();
        let arrow = rig.arrow(Vec2::new(100.0, 100.0), IVec2::new(0, 1));
        for _ in 0..5 {
            rig.tick();
        }
        assert_eq!(arrow.body().position(), Vec2::new(108.0, 102.5));
        assert!(!arrow.is_shot());
    }

    #[test]
    fn test_arrow_angle_follows_direction() {
        let rig = Rig::new();
        let arrow = rig.arrow(Vec2::new(100.0, 100.0), IVec2::new(0, -1));
        assert!((arrow.body().angle() - Orientation::North.angle()).abs() < 1e-6);

        // Pinned arrows keep their heading; the simulation reports it in (-pi, pi]
        for _ in 0..3 {
            rig.tick();
        }
        let drift = arrow.body().angle() - Orientation::North.angle();
        assert!(drift.sin().abs() < 1e-4 && drift.cos() > 0.0);
    }

    #[test]
    fn test_border_hit_is_signalled() {
        let rig = Rig::new();
        rig.wall(Rect::new(160.0, 0.0, 20.0, 300.0), BORDER_LABEL);
        let arrow = rig.arrow(Vec2::new(100.0, 100.0), IVec2::new(1, 0));
        arrow.shoot();

        let mut signals = Vec::new();
        for _ in 0..20 {
            rig.tick();
            signals.extend(arrow.poll_signals());
        }
        assert_eq!(signals.first(), Some(&ArrowSignal::Border));
    }

    #[test]
    fn test_obstacle_hit_carries_label() {
        let rig = Rig::new();
        rig.wall(Rect::new(40.0, 90.0, 30.0, 30.0), "rock");
        let arrow = rig.arrow(Vec2::new(100.0, 100.0), IVec2::new(-1, 0));
        arrow.shoot();

        let mut signals = Vec::new();
        for _ in 0..20 {
            rig.tick();
            signals.extend(arrow.poll_signals());
        }
        assert_eq!(signals.first(), Some(&ArrowSignal::Obstacle("rock".into())));
    }

    #[test]
    fn test_arrow_passes_through_player() {
        let rig = Rig::new();
        rig.world
            .handle()
            .add_body(
                Rect::new(120.0, 90.0, 32.0, 32.0),
                &BodyOptions::fixed()
                    .label("player")
                    .collision_filter(CollisionFilter::new(colliders::PLAYER, colliders::DEFAULT)),
            )
            .unwrap();
        let arrow = rig.arrow(Vec2::new(100.0, 100.0), IVec2::new(1, 0));
        arrow.shoot();

        for _ in 0..10 {
            rig.tick();
        }
        assert!(arrow.poll_signals().is_empty());
        assert!(arrow.body().position().x > 150.0);
    }
}
