//! Drives a [`GameSession`] from a host's variable-rate frame loop.
//!
//! The host pushes pointer events as they arrive and calls [`GameRunner::tick`]
//! once per rendered frame with the elapsed time; the runner converts that
//! into whole fixed simulation steps and surfaces the terminal game-over
//! notification for the end-of-game prompt.

use eightball_core::{FixedTimestep, GameConfig, GameSession, InputEvent, InputQueue, Player};

pub struct GameRunner {
    session: GameSession,
    input: InputQueue,
    timestep: FixedTimestep,
    /// Latched winner, handed to the host once per game.
    game_over: Option<Player>,
}

impl GameRunner {
    pub fn new(config: GameConfig) -> Self {
        let timestep = FixedTimestep::new(config.fixed_dt);
        Self {
            session: GameSession::new(config),
            input: InputQueue::new(),
            timestep,
            game_over: None,
        }
    }

    /// Queue a pointer event for the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame: forward queued input, then run as many fixed steps as
    /// the elapsed frame time covers.
    pub fn tick(&mut self, frame_dt: f32) {
        for event in self.input.drain() {
            self.session.handle_input(event);
        }

        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.session.tick();
            if let Some(winner) = self.session.take_game_over() {
                log::info!("game over, winner {:?}", winner);
                self.game_over = Some(winner);
            }
        }
    }

    /// The terminal notification, handed out once. `Some` means the host
    /// should present its play-again-or-quit prompt.
    pub fn take_game_over(&mut self) -> Option<Player> {
        self.game_over.take()
    }

    /// Full reset: fresh rack, fresh scores, banked frame time dropped.
    pub fn new_game(&mut self) {
        self.session.new_game();
        self.timestep.reset();
        self.game_over = None;
    }

    /// Read-only access for the presentation layer's per-frame poll.
    pub fn session(&self) -> &GameSession {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn input_is_forwarded_before_stepping() {
        let mut runner = GameRunner::new(GameConfig::default());
        let cue_pos = runner.session().balls()[0].pos;

        runner.push_input(InputEvent::PointerDown {
            x: cue_pos.x,
            y: cue_pos.y - 50.0,
        });
        runner.tick(DT);
        assert!(runner.session().is_aiming());

        runner.push_input(InputEvent::PointerUp {
            x: cue_pos.x,
            y: cue_pos.y - 50.0,
        });
        runner.tick(DT);

        let cue = &runner.session().balls()[0];
        assert!(
            cue.vel.length() > 250.0,
            "strike should be in flight: {:?}",
            cue.vel
        );
    }

    #[test]
    fn frame_time_converts_to_fixed_steps() {
        let mut runner = GameRunner::new(GameConfig::default());
        // Half a frame banks, the next half pays out one step; either way
        // the runner never panics and the session stays consistent.
        runner.tick(DT / 2.0);
        runner.tick(DT / 2.0);
        runner.tick(DT * 3.0);
        assert!(runner.session().quiescent());
    }

    #[test]
    fn shot_settles_into_a_turn_change() {
        let mut runner = GameRunner::new(GameConfig::default());
        let cue_pos = runner.session().balls()[0].pos;

        runner.push_input(InputEvent::PointerDown {
            x: cue_pos.x,
            y: cue_pos.y - 50.0,
        });
        runner.push_input(InputEvent::PointerUp {
            x: cue_pos.x,
            y: cue_pos.y - 50.0,
        });
        for _ in 0..600 {
            runner.tick(DT);
        }

        let snapshot = runner.session().snapshot();
        assert_eq!(snapshot.current_player, Player::Two);
        assert_eq!(runner.take_game_over(), None);
    }

    #[test]
    fn new_game_resets_the_runner() {
        let mut runner = GameRunner::new(GameConfig::default());
        let cue_pos = runner.session().balls()[0].pos;
        runner.push_input(InputEvent::PointerDown {
            x: cue_pos.x,
            y: cue_pos.y - 50.0,
        });
        runner.push_input(InputEvent::PointerUp {
            x: cue_pos.x,
            y: cue_pos.y - 50.0,
        });
        for _ in 0..600 {
            runner.tick(DT);
        }

        runner.new_game();
        let snapshot = runner.session().snapshot();
        assert_eq!(snapshot.current_player, Player::One);
        assert_eq!(snapshot.player_one_score, 0);
        assert!(runner.session().quiescent());
        assert_eq!(runner.take_game_over(), None);
    }
}
