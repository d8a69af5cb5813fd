use serde::Serialize;

/// Identifier linking a game entity to its body in the simulation's table.
/// Balls hold one of these instead of an owning reference to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u32);

/// One of the two players at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Index into per-player arrays (scores, group assignment).
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

/// Whether the game is still running. Terminal once `Won`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Playing,
    Won(Player),
}

/// Read-only view of the score state for the presentation layer,
/// polled once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub player_one_score: u32,
    pub player_two_score: u32,
    pub current_player: Player,
    /// Ball numbers in the order they went down.
    pub potted_order: Vec<u8>,
    pub outcome: Outcome,
}
