//! The simulation boundary: owns the bodies for balls, cushions, and pocket
//! sensors, and turns raw collision pairs into game-level events.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use log::{info, warn};

use crate::api::types::BodyId;
use crate::components::ball::Ball;
use crate::components::table::Table;
use crate::core::physics::{
    BodyDesc, ColliderDesc, ColliderMaterial, CollisionPair, PhysicsBody, PhysicsWorld,
};

/// Collision events the rules engine consumes, already resolved to game terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// A ball's body first overlapped a pocket sensor. Fired once per
    /// overlap; re-entrant firing while the overlap persists is suppressed.
    BallPocketed { number: u8 },
    /// Two balls came into contact.
    BallContact { a: u8, b: u8 },
}

/// What a simulated body represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimTag {
    Ball(u8),
    Pocket(usize),
    Cushion,
}

/// Tunables the simulation takes from the game configuration.
#[derive(Debug, Clone, Copy)]
pub struct SimParams {
    pub dt: f32,
    /// Speed below which a ball counts as at rest.
    pub quiescence_threshold: f32,
    pub ball_restitution: f32,
    pub ball_friction: f32,
    /// Linear damping standing in for rolling friction on the felt.
    pub felt_damping: f32,
    pub spin_damping: f32,
    pub cushion_restitution: f32,
    pub cushion_friction: f32,
    pub cushion_thickness: f32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            quiescence_threshold: 0.1,
            ball_restitution: 0.95,
            ball_friction: 0.4,
            felt_damping: 2.3,
            spin_damping: 1.0,
            cushion_restitution: 0.8,
            cushion_friction: 0.5,
            cushion_thickness: 20.0,
        }
    }
}

/// Physics adapter for one game. Creates and removes bodies, steps the
/// world, and raises `SimEvent`s. The rules engine never touches Rapier
/// handles; balls carry a `BodyId` looked up in the table here.
pub struct Simulation {
    world: PhysicsWorld,
    params: SimParams,
    tags: HashMap<BodyId, SimTag>,
    bodies: HashMap<BodyId, PhysicsBody>,
    /// Balls currently overlapping a pocket sensor, for once-per-overlap
    /// event firing.
    pocket_overlaps: HashSet<u8>,
    raw_events: Vec<CollisionPair>,
    next_id: u32,
}

impl Simulation {
    pub fn new(params: SimParams) -> Self {
        let mut world = PhysicsWorld::new();
        world.set_dt(params.dt);
        Self {
            world,
            params,
            tags: HashMap::new(),
            bodies: HashMap::new(),
            pocket_overlaps: HashSet::new(),
            raw_events: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Build the static table: four cushions and six pocket sensors.
    /// Cushions are centered on the boundary lines with finite thickness so
    /// fast balls cannot tunnel out.
    pub fn add_table(&mut self, table: &Table) {
        let t = self.params.cushion_thickness / 2.0;
        let material = ColliderMaterial {
            restitution: self.params.cushion_restitution,
            friction: self.params.cushion_friction,
            density: 1.0,
        };
        let (w, h) = (table.width, table.height);

        let cushions = [
            (Vec2::new(w / 2.0, 0.0), w / 2.0 + t, t),
            (Vec2::new(w / 2.0, h), w / 2.0 + t, t),
            (Vec2::new(0.0, h / 2.0), t, h / 2.0 + t),
            (Vec2::new(w, h / 2.0), t, h / 2.0 + t),
        ];
        for (center, half_width, half_height) in cushions {
            let id = self.next_id();
            let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width,
                half_height,
            })
            .with_position(center);
            let body = self.world.create_body(id, &desc, material);
            self.tags.insert(id, SimTag::Cushion);
            self.bodies.insert(id, body);
        }

        for (index, pocket) in table.pockets().iter().enumerate() {
            let id = self.next_id();
            let body = self.world.create_sensor(id, pocket.center, pocket.radius);
            self.tags.insert(id, SimTag::Pocket(index));
            self.bodies.insert(id, body);
        }
    }

    /// Give a ball a dynamic circular body at its current position and store
    /// the handle on the ball.
    pub fn add_ball(&mut self, ball: &mut Ball) {
        let id = self.next_id();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: ball.radius })
            .with_position(ball.pos)
            .with_ccd(true)
            .with_linear_damping(self.params.felt_damping)
            .with_angular_damping(self.params.spin_damping);
        // Density chosen so every ball weighs exactly one unit
        let material = ColliderMaterial {
            restitution: self.params.ball_restitution,
            friction: self.params.ball_friction,
            density: 1.0 / (std::f32::consts::PI * ball.radius * ball.radius),
        };
        let body = self.world.create_body(id, &desc, material);
        self.tags.insert(id, SimTag::Ball(ball.number));
        self.bodies.insert(id, body);
        ball.body = Some(id);
    }

    /// Detach a ball's body from the simulation. Idempotent: a ball without
    /// a body is left untouched.
    pub fn remove_ball(&mut self, ball: &mut Ball) {
        let Some(id) = ball.body.take() else { return };
        if let Some(body) = self.bodies.remove(&id) {
            self.world.remove_body(&body);
        }
        self.tags.remove(&id);
        self.pocket_overlaps.remove(&ball.number);
    }

    /// Teleport the cue ball back to the given spot, at rest.
    pub fn respot_cue(&mut self, ball: &mut Ball, spot: Vec2) {
        let Some(body) = ball.body.and_then(|id| self.bodies.get(&id)) else {
            warn!("respot requested for a cue ball with no body");
            return;
        };
        self.world.set_position(body, spot);
        self.pocket_overlaps.remove(&ball.number);
        ball.pos = spot;
        ball.vel = Vec2::ZERO;
    }

    /// Advance the simulation one timestep and return the game-level events
    /// it produced, in arrival order.
    pub fn step(&mut self) -> Vec<SimEvent> {
        let mut raw = std::mem::take(&mut self.raw_events);
        raw.clear();
        self.world.step_into(&mut raw);

        let mut events = Vec::new();
        for pair in &raw {
            let (Some(&tag_a), Some(&tag_b)) = (self.tags.get(&pair.a), self.tags.get(&pair.b))
            else {
                // Bodies can vanish between the step and the drain when a
                // ball is removed in the same frame.
                continue;
            };
            match (tag_a, tag_b) {
                (SimTag::Ball(n), SimTag::Pocket(p)) | (SimTag::Pocket(p), SimTag::Ball(n)) => {
                    if pair.started {
                        if self.pocket_overlaps.insert(n) {
                            info!("ball {} captured by pocket {}", n, p);
                            events.push(SimEvent::BallPocketed { number: n });
                        }
                    } else {
                        self.pocket_overlaps.remove(&n);
                    }
                }
                (SimTag::Ball(a), SimTag::Ball(b)) if pair.started => {
                    events.push(SimEvent::BallContact { a, b });
                }
                _ => {} // cushion contacts carry no rule meaning
            }
        }
        self.raw_events = raw;
        events
    }

    /// Whether the ball's speed exceeds the quiescence threshold.
    /// A ball with no body is at rest by definition.
    pub fn is_moving(&self, ball: &Ball) -> bool {
        self.velocity(ball).length() > self.params.quiescence_threshold
    }

    /// Current simulated position, `None` once the ball has no body.
    pub fn position(&self, ball: &Ball) -> Option<Vec2> {
        let body = self.body_of(ball)?;
        Some(self.world.body_position(body))
    }

    /// Current simulated velocity, zero once the ball has no body.
    pub fn velocity(&self, ball: &Ball) -> Vec2 {
        self.body_of(ball)
            .map(|body| self.world.velocity(body))
            .unwrap_or(Vec2::ZERO)
    }

    /// Apply a strike: set the ball's velocity directly.
    pub fn set_ball_velocity(&mut self, ball: &Ball, vel: Vec2) {
        if let Some(id) = ball.body {
            if let Some(body) = self.bodies.get(&id) {
                self.world.set_velocity(body, vel);
            }
        }
    }

    /// Number of bodies currently simulated (balls, cushions, sensors).
    pub fn body_count(&self) -> usize {
        self.world.body_count()
    }

    fn body_of(&self, ball: &Ball) -> Option<&PhysicsBody> {
        ball.body.and_then(|id| self.bodies.get(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_table() -> Table {
        Table::new(900.0, 450.0, 25.0, 10.0)
    }

    fn sim_with_table() -> Simulation {
        let mut sim = Simulation::new(SimParams::default());
        sim.add_table(&test_table());
        sim
    }

    #[test]
    fn table_creates_cushions_and_pockets() {
        let sim = sim_with_table();
        assert_eq!(sim.body_count(), 10, "4 cushions + 6 pocket sensors");
    }

    #[test]
    fn ball_add_remove_is_idempotent() {
        let mut sim = sim_with_table();
        let mut ball = Ball::new(5, 15.0, Vec2::new(400.0, 225.0));
        sim.add_ball(&mut ball);
        assert!(ball.body.is_some());
        assert_eq!(sim.body_count(), 11);

        sim.remove_ball(&mut ball);
        assert!(ball.body.is_none());
        assert_eq!(sim.body_count(), 10);

        // Second removal is a no-op
        sim.remove_ball(&mut ball);
        assert_eq!(sim.body_count(), 10);
    }

    #[test]
    fn quiescence_threshold_gates_is_moving() {
        let mut sim = sim_with_table();
        let mut ball = Ball::new(0, 15.0, Vec2::new(300.0, 225.0));
        sim.add_ball(&mut ball);

        assert!(!sim.is_moving(&ball), "a fresh ball is at rest");
        sim.set_ball_velocity(&ball, Vec2::new(300.0, 0.0));
        assert!(sim.is_moving(&ball));
    }

    #[test]
    fn removed_ball_is_never_moving() {
        let mut sim = sim_with_table();
        let mut ball = Ball::new(3, 15.0, Vec2::new(400.0, 225.0));
        sim.add_ball(&mut ball);
        sim.set_ball_velocity(&ball, Vec2::new(500.0, 0.0));
        sim.remove_ball(&mut ball);
        assert!(!sim.is_moving(&ball));
        assert_eq!(sim.velocity(&ball), Vec2::ZERO);
        assert_eq!(sim.position(&ball), None);
    }

    #[test]
    fn ball_rolling_into_corner_is_pocketed_once() {
        let mut sim = sim_with_table();
        // Rolling left along the top cushion toward the top-left pocket
        let mut ball = Ball::new(0, 15.0, Vec2::new(100.0, 35.0));
        sim.add_ball(&mut ball);
        sim.set_ball_velocity(&ball, Vec2::new(-300.0, 0.0));

        let mut pocketed = 0;
        for _ in 0..240 {
            for event in sim.step() {
                if let SimEvent::BallPocketed { number } = event {
                    assert_eq!(number, 0);
                    pocketed += 1;
                }
            }
        }
        assert_eq!(pocketed, 1, "capture must fire exactly once");
    }

    #[test]
    fn pocket_sensor_does_not_obstruct_crossing_balls() {
        let mut sim = sim_with_table();
        // Fast ball crossing the top-middle pocket region, clear of the cushion
        let mut ball = Ball::new(9, 15.0, Vec2::new(300.0, 40.0));
        sim.add_ball(&mut ball);
        sim.set_ball_velocity(&ball, Vec2::new(600.0, 0.0));

        let mut pocket_events = 0;
        for _ in 0..120 {
            for event in sim.step() {
                if matches!(event, SimEvent::BallPocketed { number: 9 }) {
                    pocket_events += 1;
                }
            }
        }
        assert_eq!(pocket_events, 1, "crossing the mouth still counts as capture");
        let pos = sim.position(&ball).unwrap();
        assert!(pos.x > 500.0, "sensor must not slow the ball: x={}", pos.x);
    }

    #[test]
    fn converging_balls_raise_a_contact_event() {
        let mut sim = sim_with_table();
        let mut a = Ball::new(1, 15.0, Vec2::new(400.0, 225.0));
        let mut b = Ball::new(2, 15.0, Vec2::new(460.0, 225.0));
        sim.add_ball(&mut a);
        sim.add_ball(&mut b);
        sim.set_ball_velocity(&a, Vec2::new(200.0, 0.0));
        sim.set_ball_velocity(&b, Vec2::new(-200.0, 0.0));

        let mut contact = None;
        for _ in 0..60 {
            for event in sim.step() {
                if let SimEvent::BallContact { a: first, b: second } = event {
                    contact = Some((first, second));
                }
            }
            if contact.is_some() {
                break;
            }
        }
        let (first, second) = contact.expect("balls should have touched");
        let mut numbers = [first, second];
        numbers.sort_unstable();
        assert_eq!(numbers, [1, 2]);
    }

    #[test]
    fn respot_parks_the_ball_at_the_spot() {
        let mut sim = sim_with_table();
        let mut cue = Ball::new(0, 15.0, Vec2::new(100.0, 100.0));
        sim.add_ball(&mut cue);
        sim.set_ball_velocity(&cue, Vec2::new(400.0, 400.0));

        sim.respot_cue(&mut cue, Vec2::new(300.0, 225.0));
        assert_eq!(cue.pos, Vec2::new(300.0, 225.0));
        assert_eq!(sim.position(&cue), Some(Vec2::new(300.0, 225.0)));
        assert!(!sim.is_moving(&cue));
    }
}
