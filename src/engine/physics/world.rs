use rapier2d::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use super::body::{BodyOptions, Rect};
use super::collision::{CollisionEventQueue, CollisionPair, CollisionStart};
use super::PhysicsError;
use crate::core::{Clock, SubscriptionId, Subscribers};
use crate::engine::game_loop::{LoopHandle, TICKS_PER_SECOND};

/// Nominal simulation step (one display refresh at 60 Hz), in seconds
pub const NOMINAL_STEP: f32 = 1.0 / TICKS_PER_SECOND;

/// Bounds on the elapsed/nominal ratio applied to a step; a stalled frame
/// must not turn into one huge step
const MIN_TIME_RATIO: f32 = 0.2;
const MAX_TIME_RATIO: f32 = 5.0;

/// World gravity: direction `(x, y)` and a magnitude `scale` in units/ms²
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Gravity {
    pub const fn new(x: f32, y: f32, scale: f32) -> Self {
        Self { x, y, scale }
    }

    /// No gravity at all (top-down games)
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.001)
    }

    /// Acceleration in units/s²
    pub fn acceleration(&self) -> Vector<Real> {
        let per_second_squared = self.scale * 1_000_000.0;
        vector![self.x * per_second_squared, self.y * per_second_squared]
    }
}

impl Default for Gravity {
    /// Downward (y grows toward the bottom of the stage)
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.001)
    }
}

/// World settings
#[derive(Debug, Clone, Default)]
pub struct WorldConfig {
    pub gravity: Gravity,
}

/// The physics simulation context: every rigid body and collider
pub struct Simulation {
    /// Gravity applied to dynamic bodies
    gravity: Gravity,

    /// Integration parameters for the physics simulation
    integration_parameters: IntegrationParameters,

    /// Physics pipeline handles collision detection and solving
    physics_pipeline: PhysicsPipeline,

    /// Island manager for sleeping bodies
    island_manager: IslandManager,

    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,

    /// Narrow phase collision detection
    narrow_phase: NarrowPhase,

    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,

    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver for fast-moving objects
    ccd_solver: CCDSolver,

    /// Rigid body set
    rigid_body_set: RigidBodySet,

    /// Collider set
    collider_set: ColliderSet,

    /// Collision event handler
    collision_event_queue: CollisionEventQueue,

    /// Body labels, reported with collision pairs
    labels: HashMap<RigidBodyHandle, String>,
}

impl Simulation {
    pub fn new(gravity: Gravity) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = NOMINAL_STEP;

        Self {
            gravity,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            collision_event_queue: CollisionEventQueue::new(),
            labels: HashMap::new(),
        }
    }

    /// Add a rectangular body, `rect` anchored at its top-left corner
    pub fn add_body(
        &mut self,
        rect: Rect,
        options: &BodyOptions,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        rect.validate()?;

        let body = options.build_rigid_body(rect.center());
        let handle = self.rigid_body_set.insert(body);

        let half = rect.size() / 2.0;
        let collider = options.build_collider(half.x, half.y);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.labels.insert(handle, options.label.clone());
        log::debug!("Added body '{}' at {:?}", options.label, rect);
        Ok(handle)
    }

    /// Remove a rigid body and all its attached colliders
    ///
    /// Returns false if the body was already gone.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        let removed = self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // remove attached colliders
        );
        self.labels.remove(&handle);
        removed.is_some()
    }

    /// Remove every body
    pub fn clear(&mut self) {
        let handles: Vec<_> = self.rigid_body_set.iter().map(|(h, _)| h).collect();
        for handle in handles {
            self.remove_body(handle);
        }
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Returns the body pairs that started touching during this step.
    pub fn step(&mut self, dt: Real) -> Vec<CollisionPair> {
        self.integration_parameters.dt = dt;

        // Clear previous frame's collision events
        self.collision_event_queue.clear();

        // Create event handler
        let event_handler = &self.collision_event_queue;

        // Step the physics simulation
        self.physics_pipeline.step(
            &self.gravity.acceleration(),
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            event_handler,
        );

        self.collision_event_queue
            .drain()
            .into_iter()
            .map(|(body_a, body_b)| CollisionPair {
                body_a,
                body_b,
                label_a: self.label(body_a).unwrap_or_default().to_owned(),
                label_b: self.label(body_b).unwrap_or_default().to_owned(),
            })
            .collect()
    }

    /// Get a reference to a rigid body
    #[cfg(test)]
    pub fn rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// Get a mutable reference to a rigid body
    pub fn rigid_body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    /// Label given to a body when it was added
    pub fn label(&self, handle: RigidBodyHandle) -> Option<&str> {
        self.labels.get(&handle).map(String::as_str)
    }

    /// Handles of every body carrying `label`
    #[cfg(test)]
    pub fn bodies_labelled(&self, label: &str) -> Vec<RigidBodyHandle> {
        self.labels
            .iter()
            .filter(|(_, l)| l.as_str() == label)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Get current gravity
    pub fn gravity(&self) -> Gravity {
        self.gravity
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Gravity::default())
    }
}

/// Turns wall-clock time between steps into a step scale
pub(crate) struct StepTimer {
    clock: Rc<dyn Clock>,
    last: Option<Duration>,
}

impl StepTimer {
    pub(crate) fn new(clock: Rc<dyn Clock>) -> Self {
        Self { clock, last: None }
    }

    /// Elapsed time since the previous call over the nominal step; 1 on the
    /// first call
    pub(crate) fn next_ratio(&mut self) -> f32 {
        let now = self.clock.now();
        let ratio = match self.last {
            None => 1.0,
            Some(last) => {
                let elapsed = now.saturating_sub(last).as_secs_f32();
                (elapsed / NOMINAL_STEP).clamp(MIN_TIME_RATIO, MAX_TIME_RATIO)
            }
        };
        self.last = Some(now);
        ratio
    }
}

type CollisionListener = Rc<RefCell<dyn FnMut(&CollisionStart)>>;

/// Cloneable access to a [`World`]'s simulation and collision channel
#[derive(Clone)]
pub struct WorldHandle {
    simulation: Rc<RefCell<Simulation>>,
    listeners: Rc<RefCell<Subscribers<CollisionListener>>>,
    /// Removals requested while the simulation was borrowed
    pending_removals: Rc<RefCell<Vec<RigidBodyHandle>>>,
}

impl WorldHandle {
    fn new(simulation: Simulation) -> Self {
        Self {
            simulation: Rc::new(RefCell::new(simulation)),
            listeners: Rc::new(RefCell::new(Subscribers::new())),
            pending_removals: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn add_body(
        &self,
        rect: Rect,
        options: &BodyOptions,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        self.simulation.borrow_mut().add_body(rect, options)
    }

    /// Remove a body now, or before the next step if the simulation is busy
    pub fn remove_body(&self, handle: RigidBodyHandle) {
        match self.simulation.try_borrow_mut() {
            Ok(mut simulation) => {
                simulation.remove_body(handle);
            }
            Err(_) => self.pending_removals.borrow_mut().push(handle),
        }
    }

    #[cfg(test)]
    pub fn with_simulation<R>(&self, f: impl FnOnce(&Simulation) -> R) -> R {
        f(&self.simulation.borrow())
    }

    /// Run `f` on one rigid body
    pub fn with_body_mut<R>(
        &self,
        handle: RigidBodyHandle,
        f: impl FnOnce(&mut RigidBody) -> R,
    ) -> Result<R, PhysicsError> {
        let mut simulation = self.simulation.borrow_mut();
        let body = simulation
            .rigid_body_mut(handle)
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        Ok(f(body))
    }

    /// Register a listener for every collision start event
    pub fn subscribe_to_collision<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CollisionStart) + 'static,
    {
        let listener: CollisionListener = Rc::new(RefCell::new(listener));
        self.listeners.borrow_mut().subscribe(listener)
    }

    pub fn unsubscribe_from_collision(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().unsubscribe(id);
    }

    #[cfg(test)]
    pub fn collision_listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Step the simulation, then hand the collision starts to every listener
    fn step(&self, dt: Real) {
        let pairs = {
            let mut simulation = self.simulation.borrow_mut();
            for handle in self.pending_removals.borrow_mut().drain(..) {
                simulation.remove_body(handle);
            }
            simulation.step(dt)
        };

        if pairs.is_empty() {
            return;
        }

        log::trace!("{} collision pairs started", pairs.len());
        let event = CollisionStart { pairs };
        let listeners = self.listeners.borrow().snapshot();
        for listener in listeners {
            (listener.borrow_mut())(&event);
        }
    }
}

/// Owner of the physics simulation, stepped once per loop tick
///
/// Dropping the world unsubscribes it from the loop, removes every body and
/// drops every collision listener.
pub struct World {
    handle: WorldHandle,
    game_loop: LoopHandle,
    step_subscription: SubscriptionId,
}

impl World {
    /// Create an empty world and subscribe its step to `game_loop`
    #[cfg(test)]
    pub fn new(game_loop: &LoopHandle, clock: Rc<dyn Clock>, config: WorldConfig) -> Self {
        Self::create(game_loop, clock, Simulation::new(config.gravity))
    }

    /// Create a world and subscribe its step to `game_loop`
    ///
    /// `on_init` runs on the fresh simulation first (static scenery such as
    /// borders); its error aborts creation before anything is subscribed.
    pub fn with_init<F>(
        game_loop: &LoopHandle,
        clock: Rc<dyn Clock>,
        config: WorldConfig,
        on_init: F,
    ) -> Result<Self, PhysicsError>
    where
        F: FnOnce(&mut Simulation) -> Result<(), PhysicsError>,
    {
        let mut simulation = Simulation::new(config.gravity);
        on_init(&mut simulation)?;
        Ok(Self::create(game_loop, clock, simulation))
    }

    fn create(game_loop: &LoopHandle, clock: Rc<dyn Clock>, simulation: Simulation) -> Self {
        log::info!(
            "Creating world with gravity {:?} and {} bodies",
            simulation.gravity(),
            simulation.body_count()
        );
        let handle = WorldHandle::new(simulation);

        let stepper = handle.clone();
        let mut timer = StepTimer::new(clock);
        let step_subscription = game_loop.subscribe(move || {
            let ratio = timer.next_ratio();
            stepper.step(NOMINAL_STEP * ratio);
        });

        Self {
            handle,
            game_loop: game_loop.clone(),
            step_subscription,
        }
    }

    /// Handle passed to the bodies living in this world
    pub fn handle(&self) -> WorldHandle {
        self.handle.clone()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.game_loop.unsubscribe(self.step_subscription);
        if let Ok(mut simulation) = self.handle.simulation.try_borrow_mut() {
            simulation.clear();
        }
        let listeners = std::mem::take(&mut *self.handle.listeners.borrow_mut());
        drop(listeners);
        log::info!("World torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::engine::game_loop::GameLoop;
    use crate::engine::physics::body::Body;
    use crate::engine::physics::collision::CollisionFilter;
    use approx::assert_relative_eq;
    use glam::Vec2;
    use std::cell::Cell;

    const TICK: Duration = Duration::from_micros(16_667);

    struct Rig {
        game_loop: GameLoop,
        clock: Rc<ManualClock>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                game_loop: GameLoop::new(),
                clock: Rc::new(ManualClock::new()),
            }
        }

        fn world(&self, gravity: Gravity) -> World {
            World::new(
                &self.game_loop.handle(),
                self.clock.clone(),
                WorldConfig { gravity },
            )
        }

        fn tick(&self) {
            self.clock.advance(TICK);
            self.game_loop.tick();
        }
    }

    #[test]
    fn test_gravity_units() {
        let acceleration = Gravity::default().acceleration();
        assert_relative_eq!(acceleration.x, 0.0);
        assert_relative_eq!(acceleration.y, 1000.0);
        assert_eq!(Gravity::zero().acceleration(), vector![0.0, 0.0]);
    }

    #[test]
    fn test_step_timer_ratio() {
        let clock = Rc::new(ManualClock::new());
        let mut timer = StepTimer::new(clock.clone());

        clock.advance(Duration::from_secs(10));
        assert_eq!(timer.next_ratio(), 1.0);

        clock.advance(Duration::from_micros(33_333));
        assert_relative_eq!(timer.next_ratio(), 2.0, epsilon = 1e-3);

        clock.advance(Duration::from_secs(2));
        assert_eq!(timer.next_ratio(), MAX_TIME_RATIO);

        assert_eq!(timer.next_ratio(), MIN_TIME_RATIO);
    }

    #[test]
    fn test_simulation_add_remove() {
        let mut simulation = Simulation::default();
        let handle = simulation
            .add_body(Rect::new(0.0, 0.0, 10.0, 10.0), &BodyOptions::fixed().label("wall"))
            .unwrap();

        assert_eq!(simulation.body_count(), 1);
        assert_eq!(simulation.label(handle), Some("wall"));
        assert_eq!(simulation.bodies_labelled("wall"), vec![handle]);

        assert!(simulation.remove_body(handle));
        assert!(!simulation.remove_body(handle));
        assert_eq!(simulation.body_count(), 0);
        assert_eq!(simulation.label(handle), None);
    }

    #[test]
    fn test_simulation_rejects_bad_rect() {
        let mut simulation = Simulation::default();
        let result = simulation.add_body(Rect::new(0.0, 0.0, 0.0, 10.0), &BodyOptions::default());
        assert!(matches!(result, Err(PhysicsError::InvalidRect { .. })));
        assert_eq!(simulation.body_count(), 0);
    }

    #[test]
    fn test_world_steps_each_tick() {
        let rig = Rig::new();
        let world = rig.world(Gravity::default());
        let handle = world
            .handle()
            .add_body(Rect::new(100.0, 100.0, 10.0, 10.0), &BodyOptions::dynamic())
            .unwrap();

        let y_before = world.handle().with_simulation(|s| s.rigid_body(handle).unwrap().translation().y);
        rig.tick();
        rig.tick();
        let y_after = world.handle().with_simulation(|s| s.rigid_body(handle).unwrap().translation().y);

        // Downward gravity
        assert!(y_after > y_before);
    }

    #[test]
    fn test_init_callback_seeds_bodies() {
        let rig = Rig::new();
        let world = World::with_init(
            &rig.game_loop.handle(),
            rig.clock.clone(),
            WorldConfig::default(),
            |simulation| {
                simulation.add_body(Rect::new(0.0, -20.0, 100.0, 20.0), &BodyOptions::fixed().label("border"))?;
                simulation.add_body(Rect::new(0.0, 100.0, 100.0, 20.0), &BodyOptions::fixed().label("border"))?;
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(world.handle().with_simulation(|s| s.bodies_labelled("border").len()), 2);
    }

    #[test]
    fn test_init_error_propagates() {
        let rig = Rig::new();
        let result = World::with_init(
            &rig.game_loop.handle(),
            rig.clock.clone(),
            WorldConfig::default(),
            |simulation| {
                simulation.add_body(Rect::new(0.0, 0.0, -1.0, 20.0), &BodyOptions::fixed())?;
                Ok(())
            },
        );
        assert!(result.is_err());
        assert_eq!(rig.game_loop.subscriber_count(), 0);
    }

    #[test]
    fn test_zero_gravity_straight_line() {
        let rig = Rig::new();
        let world = rig.world(Gravity::zero());
        let body = Body::builder(Rect::new(100.0, 100.0, 10.0, 10.0))
            .mount(&world.handle(), &rig.game_loop.handle())
            .unwrap();
        body.set_velocity(Vec2::new(1.0, 0.0)).unwrap();

        let start = body.simulated_position().unwrap();
        let mut previous = start;
        for _ in 0..20 {
            rig.tick();
            let current = body.simulated_position().unwrap();
            assert!(current.x > previous.x, "x must strictly increase");
            assert_relative_eq!(current.y, start.y, epsilon = 1e-4);
            previous = current;
        }
    }

    #[test]
    fn test_collision_start_reported_once() {
        let rig = Rig::new();
        let world = rig.world(Gravity::zero());
        let handle = world.handle();

        let one = handle
            .add_body(
                Rect::new(100.0, 100.0, 20.0, 20.0),
                &BodyOptions::dynamic()
                    .label("one")
                    .collision_filter(CollisionFilter::new(1, 2)),
            )
            .unwrap();
        let two = handle
            .add_body(
                Rect::new(110.0, 100.0, 20.0, 20.0),
                &BodyOptions::dynamic()
                    .label("two")
                    .collision_filter(CollisionFilter::new(2, 1)),
            )
            .unwrap();

        let events = Rc::new(RefCell::new(Vec::<(u64, CollisionStart)>::new()));
        let tick_no = Rc::new(Cell::new(0u64));
        {
            let events = Rc::clone(&events);
            let tick_no = Rc::clone(&tick_no);
            handle.subscribe_to_collision(move |event| {
                events.borrow_mut().push((tick_no.get(), event.clone()));
            });
        }

        for i in 1..=10 {
            tick_no.set(i);
            rig.tick();
        }

        let events = events.borrow();
        assert_eq!(events.len(), 1, "only the first intersecting tick reports");
        let (tick, event) = &events[0];
        assert_eq!(*tick, 1);
        assert_eq!(event.pairs.len(), 1);
        let pair = &event.pairs[0];
        let bodies = [pair.body_a, pair.body_b];
        assert!(bodies.contains(&one) && bodies.contains(&two));
    }

    #[test]
    fn test_filtered_bodies_do_not_collide() {
        let rig = Rig::new();
        let world = rig.world(Gravity::zero());
        let handle = world.handle();

        handle
            .add_body(
                Rect::new(100.0, 100.0, 20.0, 20.0),
                &BodyOptions::dynamic().collision_filter(CollisionFilter::new(1, 2)),
            )
            .unwrap();
        handle
            .add_body(
                Rect::new(105.0, 100.0, 20.0, 20.0),
                &BodyOptions::dynamic().collision_filter(CollisionFilter::new(4, 4)),
            )
            .unwrap();

        let count = Rc::new(Cell::new(0));
        {
            let count = Rc::clone(&count);
            handle.subscribe_to_collision(move |_| count.set(count.get() + 1));
        }
        for _ in 0..5 {
            rig.tick();
        }
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_removal_while_borrowed_is_deferred() {
        let rig = Rig::new();
        let world = rig.world(Gravity::zero());
        let handle = world.handle();
        let body = handle
            .add_body(Rect::new(0.0, 0.0, 10.0, 10.0), &BodyOptions::dynamic())
            .unwrap();

        handle.with_simulation(|_| handle.remove_body(body));
        assert_eq!(handle.with_simulation(|s| s.body_count()), 1);

        rig.tick();
        assert_eq!(handle.with_simulation(|s| s.body_count()), 0);
    }

    #[test]
    fn test_teardown() {
        let rig = Rig::new();
        let world = rig.world(Gravity::zero());
        let handle = world.handle();
        handle
            .add_body(Rect::new(0.0, 0.0, 10.0, 10.0), &BodyOptions::dynamic())
            .unwrap();
        handle.subscribe_to_collision(|_| {});
        assert_eq!(rig.game_loop.subscriber_count(), 1);

        drop(world);

        assert_eq!(rig.game_loop.subscriber_count(), 0);
        assert_eq!(handle.with_simulation(|s| s.body_count()), 0);
        assert_eq!(handle.collision_listener_count(), 0);
    }
}
