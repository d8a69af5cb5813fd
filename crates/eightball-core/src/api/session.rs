//! The per-game orchestrator: owns the simulation, the balls, the rules
//! engine, and the shot controller, and runs the strict per-frame order:
//! step, drain events into the rules, apply commands, refresh mirrors,
//! resolve the shot once the table rests.

use glam::Vec2;
use log::info;

use crate::api::types::{GameSnapshot, Outcome, Player};
use crate::components::ball::{rack_positions, Ball};
use crate::components::table::Table;
use crate::core::simulation::{SimParams, Simulation};
use crate::input::queue::InputEvent;
use crate::input::shot::{CuePreview, ShotController, ShotParams, TableStatus};
use crate::rules::{RulesCommand, RulesEngine};

/// Everything tunable about a game, with playable defaults.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub table_width: f32,
    pub table_height: f32,
    pub cushion_thickness: f32,
    pub pocket_radius: f32,
    pub ball_radius: f32,
    /// Fixed simulation timestep in seconds.
    pub fixed_dt: f32,
    /// Speed below which a ball counts as at rest.
    pub quiescence_threshold: f32,
    pub ball_restitution: f32,
    pub ball_friction: f32,
    /// Linear damping standing in for rolling friction on the felt.
    pub felt_damping: f32,
    pub spin_damping: f32,
    pub cushion_restitution: f32,
    pub cushion_friction: f32,
    pub max_cue_length: f32,
    pub force_multiplier: f32,
    pub min_force: f32,
    pub max_force: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            table_width: 900.0,
            table_height: 450.0,
            cushion_thickness: 20.0,
            pocket_radius: 25.0,
            ball_radius: 15.0,
            fixed_dt: 1.0 / 60.0,
            quiescence_threshold: 0.1,
            ball_restitution: 0.95,
            ball_friction: 0.4,
            felt_damping: 2.3,
            spin_damping: 1.0,
            cushion_restitution: 0.8,
            cushion_friction: 0.5,
            max_cue_length: 400.0,
            force_multiplier: 6.0,
            min_force: 10.0,
            max_force: 2000.0,
        }
    }
}

impl GameConfig {
    /// Where the cue ball breaks from and returns to after a scratch.
    pub fn cue_spot(&self) -> Vec2 {
        Vec2::new(self.table_width / 3.0, self.table_height / 2.0)
    }

    /// Apex of the triangular rack, facing the cue spot.
    pub fn rack_apex(&self) -> Vec2 {
        Vec2::new(self.table_width * 2.0 / 3.0, self.table_height / 2.0)
    }

    pub fn table(&self) -> Table {
        Table::new(
            self.table_width,
            self.table_height,
            self.pocket_radius,
            self.cushion_thickness / 2.0,
        )
    }

    fn sim_params(&self) -> SimParams {
        SimParams {
            dt: self.fixed_dt,
            quiescence_threshold: self.quiescence_threshold,
            ball_restitution: self.ball_restitution,
            ball_friction: self.ball_friction,
            felt_damping: self.felt_damping,
            spin_damping: self.spin_damping,
            cushion_restitution: self.cushion_restitution,
            cushion_friction: self.cushion_friction,
            cushion_thickness: self.cushion_thickness,
        }
    }

    fn shot_params(&self) -> ShotParams {
        ShotParams {
            max_cue_length: self.max_cue_length,
            force_multiplier: self.force_multiplier,
            min_force: self.min_force,
            max_force: self.max_force,
        }
    }
}

/// One running game. Presentation reads `balls()`, `snapshot()` and
/// `cue_preview()` each frame; the host drives `handle_input` and `tick`.
pub struct GameSession {
    config: GameConfig,
    table: Table,
    balls: Vec<Ball>,
    sim: Simulation,
    rules: RulesEngine,
    shot: ShotController,
    preview: Option<CuePreview>,
    pending_game_over: Option<Player>,
    game_over_notified: bool,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        let table = config.table();
        let mut sim = Simulation::new(config.sim_params());
        sim.add_table(&table);
        let balls = Self::spawn_balls(&config, &mut sim);
        let shot = ShotController::new(config.shot_params());
        Self {
            config,
            table,
            balls,
            sim,
            rules: RulesEngine::new(),
            shot,
            preview: None,
            pending_game_over: None,
            game_over_notified: false,
        }
    }

    /// Cue ball at the cue spot, object balls racked at the apex.
    fn spawn_balls(config: &GameConfig, sim: &mut Simulation) -> Vec<Ball> {
        let mut balls = Vec::with_capacity(16);
        let mut cue = Ball::new(0, config.ball_radius, config.cue_spot());
        sim.add_ball(&mut cue);
        balls.push(cue);
        for (number, pos) in rack_positions(config.rack_apex(), config.ball_radius) {
            let mut ball = Ball::new(number, config.ball_radius, pos);
            sim.add_ball(&mut ball);
            balls.push(ball);
        }
        balls
    }

    /// Discard the whole game and rack up fresh: new simulation, new balls,
    /// new rules state. Replacement, not repair.
    pub fn new_game(&mut self) {
        info!("new game");
        let mut sim = Simulation::new(self.config.sim_params());
        sim.add_table(&self.table);
        self.balls = Self::spawn_balls(&self.config, &mut sim);
        self.sim = sim;
        self.rules = RulesEngine::new();
        self.shot = ShotController::new(self.config.shot_params());
        self.preview = None;
        self.pending_game_over = None;
        self.game_over_notified = false;
    }

    /// Route one pointer event into the shot controller.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { x, y } => {
                let status = self.table_status();
                self.shot.begin_aim(Vec2::new(x, y), status);
            }
            InputEvent::PointerMove { x, y } => {
                if let Some(cue_pos) = self.cue_pos() {
                    self.preview = self.shot.update_aim(Vec2::new(x, y), cue_pos);
                }
            }
            InputEvent::PointerUp { x, y } => {
                self.preview = None;
                let Some(cue_pos) = self.cue_pos() else {
                    self.shot.cancel();
                    return;
                };
                if let Some(strike) = self.shot.release_shot(Vec2::new(x, y), cue_pos) {
                    if let Some(cue) = self.balls.iter().find(|b| b.is_cue()) {
                        self.sim.set_ball_velocity(cue, strike);
                    }
                    self.rules.begin_shot();
                }
            }
        }
    }

    /// One fixed step of the whole pipeline.
    pub fn tick(&mut self) {
        let events = self.sim.step();
        let mut commands = Vec::new();
        for event in &events {
            commands.extend(self.rules.handle_event(event, &mut self.balls));
        }
        for command in commands {
            self.apply(command);
        }
        self.sync_mirrors();

        if self.rules.shot_in_flight() && self.quiescent() {
            self.rules.resolve_shot();
        }

        if !self.game_over_notified {
            if let Outcome::Won(winner) = self.rules.state().outcome {
                self.pending_game_over = Some(winner);
                self.game_over_notified = true;
            }
        }
    }

    fn apply(&mut self, command: RulesCommand) {
        match command {
            RulesCommand::RemoveFromPlay(number) => {
                if let Some(ball) = self.balls.iter_mut().find(|b| b.number == number) {
                    self.sim.remove_ball(ball);
                    ball.vel = Vec2::ZERO;
                }
            }
            RulesCommand::RespotCue => {
                let spot = self.config.cue_spot();
                if let Some(ball) = self.balls.iter_mut().find(|b| b.is_cue()) {
                    self.sim.respot_cue(ball, spot);
                }
            }
        }
    }

    /// Refresh the balls' mirrored position and velocity from the
    /// simulation. Pocketed balls keep their last mirrored state.
    fn sync_mirrors(&mut self) {
        for ball in &mut self.balls {
            if let Some(pos) = self.sim.position(ball) {
                ball.pos = pos;
                ball.vel = self.sim.velocity(ball);
            }
        }
    }

    fn table_status(&self) -> TableStatus {
        TableStatus {
            quiescent: self.quiescent(),
            cue_in_play: self
                .balls
                .iter()
                .any(|b| b.is_cue() && !b.in_pocket && b.body.is_some()),
            game_over: self.rules.state().outcome != Outcome::Playing,
        }
    }

    /// All live balls below the quiescence threshold.
    pub fn quiescent(&self) -> bool {
        self.balls
            .iter()
            .filter(|b| !b.in_pocket)
            .all(|b| !self.sim.is_moving(b))
    }

    fn cue_pos(&self) -> Option<Vec2> {
        self.balls.iter().find(|b| b.is_cue()).map(|b| b.pos)
    }

    // -- Read-only surface for the presentation layer and the host --

    pub fn snapshot(&self) -> GameSnapshot {
        self.rules.snapshot()
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_aiming(&self) -> bool {
        self.shot.is_aiming()
    }

    pub fn cue_preview(&self) -> Option<CuePreview> {
        self.preview
    }

    /// The terminal notification, handed out once. The host presents its
    /// end-of-game prompt on `Some`.
    pub fn take_game_over(&mut self) -> Option<Player> {
        self.pending_game_over.take()
    }
}
