use glam::Vec2;
use rapier2d::prelude::*;
use std::sync::Mutex;

use crate::api::types::BodyId;

// ---------------------------------------------------------------------------
// Conversion helpers (private), glam to/from nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body. Balls are dynamic; cushions and pocket sensors
/// are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.95,
            friction: 0.4,
            density: 1.0,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub ccd: bool,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub collider: ColliderDesc,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            ccd: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
            collider,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            position: Vec2::ZERO,
            ccd: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
            collider,
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    /// Enable continuous collision detection. Fast balls tunnel through
    /// cushions without it.
    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    /// Set the linear damping (velocity decay). This is what makes balls
    /// roll to a stop on the felt.
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set the angular damping (rotation decay).
    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }
}

/// Handle pair stored in the simulation's body table, referencing Rapier
/// internals.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// A collision between two bodies, resolved to their ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: BodyId,
    pub b: BodyId,
    /// `true` when the overlap just started, `false` when it ended.
    pub started: bool,
}

// ---------------------------------------------------------------------------
// Event collector
// ---------------------------------------------------------------------------

// Rapier invokes the EventHandler from inside the step, so events are
// buffered behind a Mutex and drained synchronously right after. The lock is
// never contended; the whole frame loop is single threaded.
struct CollisionBuffer {
    events: Mutex<Vec<CollisionEvent>>,
}

impl CollisionBuffer {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) -> Vec<CollisionEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventHandler for CollisionBuffer {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.events.lock().unwrap().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
        // Contact forces are not used; the trait requires this method.
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct. The table is viewed
/// top down, so there is no gravity; balls decelerate through damping only.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collision_buffer: CollisionBuffer,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: nalgebra::Vector2::zeros(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collision_buffer: CollisionBuffer::new(),
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Create a rigid body + collider and return handles.
    /// The BodyId is stored in the body's `user_data` for collision lookups.
    pub fn create_body(
        &mut self,
        id: BodyId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .ccd_enabled(desc.ccd)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .user_data(id.0 as u128)
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Create a fixed sensor circle. Sensors report overlap events but do
    /// not obstruct motion; pockets are made of these.
    pub fn create_sensor(&mut self, id: BodyId, center: Vec2, radius: f32) -> PhysicsBody {
        let rb = RigidBodyBuilder::fixed()
            .translation(vec2_to_na(center))
            .user_data(id.0 as u128)
            .build();
        let body_handle = self.bodies.insert(rb);

        let collider = ColliderBuilder::ball(radius)
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body and all its colliders from the simulation.
    /// Safe to call with a handle that was already removed.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Step the simulation and collect collision events into the provided Vec.
    pub fn step_into(&mut self, collision_events: &mut Vec<CollisionPair>) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collision_buffer,
        );

        // Drain buffered events and resolve entity ids from user_data
        for event in self.collision_buffer.drain() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };

            let a = self.collider_to_body_id(h1);
            let b = self.collider_to_body_id(h2);

            if let (Some(a), Some(b)) = (a, b) {
                collision_events.push(CollisionPair { a, b, started });
            }
        }
    }

    /// Set the linear velocity of a body directly. Strikes are applied this
    /// way: the cue tip imparts a velocity, not a sustained force.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Teleport a body to a position at rest, used to respot the cue ball
    /// after a scratch.
    pub fn set_position(&mut self, body: &PhysicsBody, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_translation(vec2_to_na(pos), true);
            rb.set_linvel(nalgebra::Vector2::zeros(), true);
            rb.set_angvel(0.0, true);
        }
    }

    /// Get the current position of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| Vec2::new(rb.translation().x, rb.translation().y))
            .unwrap_or(Vec2::ZERO)
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // -- private helpers --

    fn collider_to_body_id(&self, collider_handle: ColliderHandle) -> Option<BodyId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        Some(BodyId(body.user_data as u32))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ball_desc(radius: f32) -> BodyDesc {
        BodyDesc::dynamic(ColliderDesc::Ball { radius }).with_ccd(true)
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = PhysicsWorld::new();
        let body = world.create_body(BodyId(1), &ball_desc(15.0), ColliderMaterial::default());
        assert_eq!(world.body_count(), 1);
        world.remove_body(&body);
        assert_eq!(world.body_count(), 0);
        // Removing again is a no-op
        world.remove_body(&body);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn set_velocity_directly() {
        let mut world = PhysicsWorld::new();
        let body = world.create_body(BodyId(1), &ball_desc(15.0), ColliderMaterial::default());

        world.set_velocity(&body, Vec2::new(50.0, -30.0));
        let vel = world.velocity(&body);
        assert!((vel.x - 50.0).abs() < 0.001);
        assert!((vel.y - (-30.0)).abs() < 0.001);
    }

    #[test]
    fn damping_slows_a_rolling_ball() {
        let mut world = PhysicsWorld::new();
        world.set_dt(1.0 / 60.0);

        let body = world.create_body(
            BodyId(1),
            &ball_desc(15.0).with_linear_damping(2.3),
            ColliderMaterial::default(),
        );
        world.set_velocity(&body, Vec2::new(100.0, 0.0));

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut events);
        }

        let speed = world.velocity(&body).length();
        assert!(speed < 20.0, "ball should have slowed, speed={}", speed);
        assert!(speed >= 0.0);
    }

    #[test]
    fn cushion_stops_a_ball_without_tunneling() {
        let mut world = PhysicsWorld::new();
        world.set_dt(1.0 / 60.0);

        // Wall centered on x=0, thickness 20
        world.create_body(
            BodyId(1),
            &BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: 10.0,
                half_height: 200.0,
            }),
            ColliderMaterial {
                restitution: 0.8,
                friction: 0.5,
                density: 1.0,
            },
        );

        let ball = world.create_body(
            BodyId(2),
            &ball_desc(15.0).with_position(Vec2::new(100.0, 0.0)),
            ColliderMaterial::default(),
        );
        world.set_velocity(&ball, Vec2::new(-400.0, 0.0));

        let mut events = Vec::new();
        for _ in 0..120 {
            world.step_into(&mut events);
        }

        let pos = world.body_position(&ball);
        assert!(pos.x > 0.0, "ball tunneled through the wall: x={}", pos.x);
    }

    #[test]
    fn sensor_reports_overlap_without_blocking() {
        let mut world = PhysicsWorld::new();
        world.set_dt(1.0 / 60.0);

        let _sensor = world.create_sensor(BodyId(7), Vec2::new(60.0, 0.0), 25.0);
        let ball = world.create_body(
            BodyId(2),
            &ball_desc(15.0).with_position(Vec2::ZERO),
            ColliderMaterial::default(),
        );
        world.set_velocity(&ball, Vec2::new(300.0, 0.0));

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut events);
        }

        let started: Vec<_> = events.iter().filter(|e| e.started).collect();
        assert!(
            started
                .iter()
                .any(|e| e.a == BodyId(7) || e.b == BodyId(7)),
            "sensor overlap should have been reported: {:?}",
            events
        );

        // The sensor must not have deflected or stopped the ball
        let pos = world.body_position(&ball);
        assert!(pos.x > 100.0, "ball should pass through the sensor: x={}", pos.x);
        assert!(pos.y.abs() < 0.001, "ball should not deflect: y={}", pos.y);
    }

    #[test]
    fn teleport_comes_to_rest() {
        let mut world = PhysicsWorld::new();
        let body = world.create_body(BodyId(1), &ball_desc(15.0), ColliderMaterial::default());
        world.set_velocity(&body, Vec2::new(500.0, 500.0));

        world.set_position(&body, Vec2::new(300.0, 225.0));
        assert_eq!(world.body_position(&body), Vec2::new(300.0, 225.0));
        assert_eq!(world.velocity(&body), Vec2::ZERO);
    }

    #[test]
    fn collision_events_between_converging_balls() {
        let mut world = PhysicsWorld::new();
        world.set_dt(1.0 / 60.0);

        let a = world.create_body(
            BodyId(1),
            &ball_desc(15.0).with_position(Vec2::new(0.0, 0.0)),
            ColliderMaterial::default(),
        );
        let b = world.create_body(
            BodyId(2),
            &ball_desc(15.0).with_position(Vec2::new(40.0, 0.0)),
            ColliderMaterial::default(),
        );
        world.set_velocity(&a, Vec2::new(200.0, 0.0));
        world.set_velocity(&b, Vec2::new(-200.0, 0.0));

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut events);
        }

        let started: Vec<_> = events.iter().filter(|e| e.started).collect();
        assert!(!started.is_empty(), "balls should have collided");
        let ids = [started[0].a, started[0].b];
        assert!(ids.contains(&BodyId(1)));
        assert!(ids.contains(&BodyId(2)));
    }
}
