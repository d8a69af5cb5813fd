//! The turn and scoring state machine.
//!
//! Consumes [`SimEvent`]s plus shot lifecycle calls and answers with
//! [`RulesCommand`]s for the session to apply. The engine never holds a
//! physics handle; every branch is total over ball numbers and malformed
//! events are dropped with a log line instead of an error.
//!
//! Foul policy, applied uniformly: every foul transfers the turn exactly
//! once per shot; points always follow the pocketed ball's group owner; a
//! scratch never scores.

use log::{debug, info, warn};

use crate::api::types::{GameSnapshot, Outcome, Player};
use crate::components::ball::Ball;
use crate::core::simulation::SimEvent;

/// The two mutually exclusive target groups assigned to the players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetGroup {
    Solids,
    Stripes,
}

impl TargetGroup {
    /// Group that owns a numbered object ball, if it belongs to one.
    pub fn of_number(number: u8) -> Option<TargetGroup> {
        match number {
            1..=7 => Some(TargetGroup::Solids),
            9..=15 => Some(TargetGroup::Stripes),
            _ => None,
        }
    }

    pub fn contains(self, number: u8) -> bool {
        TargetGroup::of_number(number) == Some(self)
    }
}

/// Instructions for the physics side, issued by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesCommand {
    /// Detach the ball's body from the simulation permanently.
    RemoveFromPlay(u8),
    /// Teleport the cue ball back to the cue spot with zero velocity.
    RespotCue,
}

/// Authoritative score and turn state for one game.
#[derive(Debug, Clone)]
pub struct GameState {
    pub current_player: Player,
    /// Indexed by `Player::index`. Monotonically non-decreasing.
    pub scores: [u32; 2],
    /// Set exactly once, at the first non-cue, non-eight pocketing.
    pub assignment: Option<[TargetGroup; 2]>,
    /// Ball numbers in pocketing order. Append only.
    pub potted_order: Vec<u8>,
    pub outcome: Outcome,
}

impl GameState {
    fn new() -> Self {
        Self {
            current_player: Player::One,
            scores: [0, 0],
            assignment: None,
            potted_order: Vec::new(),
            outcome: Outcome::Playing,
        }
    }
}

/// Per-shot bookkeeping between a strike and the table coming to rest.
#[derive(Debug, Clone, Copy)]
struct ShotRecord {
    /// The shooter pocketed at least one ball of their own group.
    own_pot: bool,
    /// A foul already passed the turn during this shot.
    turn_transferred: bool,
}

pub struct RulesEngine {
    state: GameState,
    shot: Option<ShotRecord>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
            shot: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            player_one_score: self.state.scores[0],
            player_two_score: self.state.scores[1],
            current_player: self.state.current_player,
            potted_order: self.state.potted_order.clone(),
            outcome: self.state.outcome,
        }
    }

    /// Mark a strike as in flight. Turn transfer is decided when the table
    /// settles, in [`RulesEngine::resolve_shot`].
    pub fn begin_shot(&mut self) {
        if self.state.outcome != Outcome::Playing {
            return;
        }
        self.shot = Some(ShotRecord {
            own_pot: false,
            turn_transferred: false,
        });
    }

    pub fn shot_in_flight(&self) -> bool {
        self.shot.is_some()
    }

    /// Called once the table is quiescent after a strike. The shooter keeps
    /// the table only when they pocketed one of their own; a foul that
    /// already passed the turn is not flipped back.
    pub fn resolve_shot(&mut self) {
        let Some(shot) = self.shot.take() else { return };
        if self.state.outcome != Outcome::Playing {
            return;
        }
        if !shot.own_pot && !shot.turn_transferred {
            self.state.current_player = self.state.current_player.opponent();
        }
    }

    /// Feed one simulation event through the state machine. Returns the
    /// commands the physics side must apply.
    pub fn handle_event(&mut self, event: &SimEvent, balls: &mut [Ball]) -> Vec<RulesCommand> {
        if self.state.outcome != Outcome::Playing {
            debug!("game over, ignoring {:?}", event);
            return Vec::new();
        }
        match *event {
            SimEvent::BallContact { .. } => Vec::new(),
            SimEvent::BallPocketed { number } => self.handle_pocketed(number, balls),
        }
    }

    fn handle_pocketed(&mut self, number: u8, balls: &mut [Ball]) -> Vec<RulesCommand> {
        let Some(idx) = balls.iter().position(|b| b.number == number) else {
            warn!("pocket event for untracked ball {}, ignoring", number);
            return Vec::new();
        };
        if balls[idx].in_pocket {
            warn!("pocket event for ball {} already out of play, ignoring", number);
            return Vec::new();
        }

        match number {
            0 => {
                // Scratch: the cue ball is respotted, never retired.
                info!("scratch by {:?}", self.state.current_player);
                self.transfer_turn();
                vec![RulesCommand::RespotCue]
            }
            8 => {
                balls[idx].in_pocket = true;
                let shooter = self.state.current_player;
                let winner = match self.state.assignment {
                    Some(groups) if group_cleared(groups[shooter.index()], balls) => shooter,
                    // Early eight, or the shooter's group still on the table
                    _ => shooter.opponent(),
                };
                self.state.outcome = Outcome::Won(winner);
                info!("eight ball down, {:?} wins", winner);
                vec![RulesCommand::RemoveFromPlay(8)]
            }
            _ => {
                balls[idx].in_pocket = true;
                self.state.potted_order.push(number);
                match TargetGroup::of_number(number) {
                    Some(group) => {
                        if self.state.assignment.is_none() {
                            self.assign_groups(group);
                        }
                        let shooter = self.state.current_player;
                        let owner = self.owner_of(group);
                        if owner == shooter {
                            self.award_point(shooter);
                            if let Some(shot) = &mut self.shot {
                                shot.own_pot = true;
                            }
                        } else {
                            // Opponent's ball: the point follows the group
                            // owner and the turn passes.
                            self.award_point(owner);
                            self.transfer_turn();
                        }
                    }
                    None => warn!("ball {} belongs to no group, not scored", number),
                }
                vec![RulesCommand::RemoveFromPlay(number)]
            }
        }
    }

    /// First object ball down fixes both players' groups for the rest of
    /// the game.
    fn assign_groups(&mut self, first: TargetGroup) {
        let other = match first {
            TargetGroup::Solids => TargetGroup::Stripes,
            TargetGroup::Stripes => TargetGroup::Solids,
        };
        let mut groups = [first, other];
        if self.state.current_player == Player::Two {
            groups.swap(0, 1);
        }
        self.state.assignment = Some(groups);
        info!(
            "groups assigned: {:?} takes {:?}",
            self.state.current_player, first
        );
    }

    fn owner_of(&self, group: TargetGroup) -> Player {
        match self.state.assignment {
            Some(groups) if groups[0] == group => Player::One,
            Some(_) => Player::Two,
            // Unassigned: every ball is fair game for the shooter
            None => self.state.current_player,
        }
    }

    fn award_point(&mut self, player: Player) {
        self.state.scores[player.index()] += 1;
    }

    /// Foul turn transfer, at most once per shot.
    fn transfer_turn(&mut self) {
        match &mut self.shot {
            Some(shot) if shot.turn_transferred => {}
            Some(shot) => {
                shot.turn_transferred = true;
                self.state.current_player = self.state.current_player.opponent();
            }
            None => {
                self.state.current_player = self.state.current_player.opponent();
            }
        }
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn group_cleared(group: TargetGroup, balls: &[Ball]) -> bool {
    balls
        .iter()
        .filter(|b| group.contains(b.number))
        .all(|b| b.in_pocket)
}
