//! Drag-and-release shot gesture, as an explicit two-phase machine.
//!
//! The controller owns its phase (`Idle` or `Aiming`) and is transitioned
//! only through its three entry points. Pulling the pointer away from the
//! cue ball and releasing shoots the ball the opposite way.

use glam::Vec2;
use log::debug;

/// Shot tunables, taken from the game configuration.
#[derive(Debug, Clone, Copy)]
pub struct ShotParams {
    /// Drag distance is clamped to this for the cue-stick preview.
    pub max_cue_length: f32,
    /// Scale from drag distance to strike speed.
    pub force_multiplier: f32,
    /// Gestures at or below this force are discarded as non-shots.
    pub min_force: f32,
    pub max_force: f32,
}

impl Default for ShotParams {
    fn default() -> Self {
        Self {
            max_cue_length: 400.0,
            force_multiplier: 6.0,
            min_force: 10.0,
            max_force: 2000.0,
        }
    }
}

/// What the cue-stick preview needs: where the stick points and how far the
/// player has pulled back. Presentation only; no physics effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuePreview {
    /// Unit vector from the cue ball toward the pointer.
    pub direction: Vec2,
    /// Drag distance, clamped to the maximum cue length.
    pub length: f32,
}

/// Table conditions the gesture gate checks before an aim may begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStatus {
    /// Every live ball is below the quiescence threshold.
    pub quiescent: bool,
    pub cue_in_play: bool,
    pub game_over: bool,
}

impl TableStatus {
    pub fn allows_aim(&self) -> bool {
        self.quiescent && self.cue_in_play && !self.game_over
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AimPhase {
    Idle,
    Aiming { origin: Vec2 },
}

pub struct ShotController {
    phase: AimPhase,
    params: ShotParams,
}

impl ShotController {
    pub fn new(params: ShotParams) -> Self {
        Self {
            phase: AimPhase::Idle,
            params,
        }
    }

    pub fn is_aiming(&self) -> bool {
        matches!(self.phase, AimPhase::Aiming { .. })
    }

    /// Where the gesture started, while one is in progress.
    pub fn aim_origin(&self) -> Option<Vec2> {
        match self.phase {
            AimPhase::Idle => None,
            AimPhase::Aiming { origin } => Some(origin),
        }
    }

    /// Start a gesture. Rejected unless the table is quiescent, the cue
    /// ball is in play, and the game is still running.
    pub fn begin_aim(&mut self, pointer: Vec2, status: TableStatus) -> bool {
        if self.is_aiming() || !status.allows_aim() {
            debug!("aim rejected: {:?}", status);
            return false;
        }
        self.phase = AimPhase::Aiming { origin: pointer };
        true
    }

    /// Recompute the cue-stick preview for the current pointer position.
    pub fn update_aim(&mut self, pointer: Vec2, cue_pos: Vec2) -> Option<CuePreview> {
        match self.phase {
            AimPhase::Idle => None,
            AimPhase::Aiming { .. } => {
                let offset = pointer - cue_pos;
                Some(CuePreview {
                    direction: offset.normalize_or_zero(),
                    length: offset.length().min(self.params.max_cue_length),
                })
            }
        }
    }

    /// End the gesture. Returns the strike velocity for the cue ball, aimed
    /// opposite the drag, or `None` when no aim was active or the pull was
    /// too weak to count as a shot.
    pub fn release_shot(&mut self, pointer: Vec2, cue_pos: Vec2) -> Option<Vec2> {
        if !self.is_aiming() {
            return None;
        }
        self.phase = AimPhase::Idle;

        let pull = cue_pos - pointer;
        let force = (pull.length() * self.params.force_multiplier)
            .clamp(self.params.min_force, self.params.max_force);
        if force <= self.params.min_force {
            debug!("gesture below minimum force, discarded");
            return None;
        }
        Some(pull.normalize_or_zero() * force)
    }

    /// Abandon any gesture in progress.
    pub fn cancel(&mut self) {
        self.phase = AimPhase::Idle;
    }
}
