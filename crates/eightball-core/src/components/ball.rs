//! Ball data: identity, classification, colors, and the rack layout.

use glam::Vec2;

use crate::api::types::BodyId;

/// Classification by number: 0 cue, 1-7 solids, 8 the eight ball, 9-15 stripes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallGroup {
    Cue,
    Solid,
    Eight,
    Striped,
}

impl BallGroup {
    /// `None` for numbers outside the sixteen-ball set.
    pub fn of(number: u8) -> Option<BallGroup> {
        match number {
            0 => Some(BallGroup::Cue),
            1..=7 => Some(BallGroup::Solid),
            8 => Some(BallGroup::Eight),
            9..=15 => Some(BallGroup::Striped),
            _ => None,
        }
    }
}

/// Passive data holder for one simulated ball. `pos` and `vel` mirror the
/// simulation state and are refreshed once per frame by the session.
#[derive(Debug, Clone)]
pub struct Ball {
    pub number: u8,
    pub radius: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Set once when the ball is captured; cleared only by a full new game.
    /// A pocketed ball has no body in the simulation.
    pub in_pocket: bool,
    /// Handle into the simulation's body table, `None` once out of play.
    pub body: Option<BodyId>,
}

impl Ball {
    pub fn new(number: u8, radius: f32, pos: Vec2) -> Self {
        Self {
            number,
            radius,
            pos,
            vel: Vec2::ZERO,
            in_pocket: false,
            body: None,
        }
    }

    pub fn group(&self) -> Option<BallGroup> {
        BallGroup::of(self.number)
    }

    pub fn is_cue(&self) -> bool {
        self.number == 0
    }

    /// Cosmetic color, derived from the number.
    pub fn color(&self) -> (u8, u8, u8) {
        COLORS
            .get(self.number as usize)
            .copied()
            .unwrap_or((170, 170, 170))
    }
}

/// Ball colors indexed by number: white cue, yellow through maroon solids,
/// black eight, pink through teal stripes.
const COLORS: [(u8, u8, u8); 16] = [
    (255, 255, 255),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 0),
    (128, 0, 128),
    (255, 165, 0),
    (0, 128, 0),
    (128, 0, 0),
    (0, 0, 0),
    (255, 192, 203),
    (165, 42, 42),
    (0, 0, 139),
    (139, 0, 0),
    (85, 107, 47),
    (128, 128, 0),
    (0, 128, 128),
];

/// Triangular rack layout for the fifteen object balls.
///
/// The apex ball sits at `apex` facing the cue ball; rows advance away from
/// it at 30 degrees, balls within a row spread symmetrically. Row contents:
///
/// ```text
///  1
///  2  9
///  3  7  8
/// 10  6  4  5
/// 11 15 14 12 13
/// ```
pub fn rack_positions(apex: Vec2, radius: f32) -> [(u8, Vec2); 15] {
    let spacing = radius * 2.2;
    let row_advance = spacing * 0.866; // cos 30 degrees, equilateral rows

    const ROWS: [&[u8]; 5] = [
        &[1],
        &[2, 9],
        &[3, 7, 8],
        &[10, 6, 4, 5],
        &[11, 15, 14, 12, 13],
    ];

    let mut positions = [(0u8, Vec2::ZERO); 15];
    let mut i = 0;
    for (row, numbers) in ROWS.iter().enumerate() {
        for (col, &number) in numbers.iter().enumerate() {
            let x = apex.x + row as f32 * row_advance;
            let y = apex.y + (col as f32 - row as f32 / 2.0) * spacing;
            positions[i] = (number, Vec2::new(x, y));
            i += 1;
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_cover_all_numbers() {
        assert_eq!(BallGroup::of(0), Some(BallGroup::Cue));
        assert_eq!(BallGroup::of(1), Some(BallGroup::Solid));
        assert_eq!(BallGroup::of(7), Some(BallGroup::Solid));
        assert_eq!(BallGroup::of(8), Some(BallGroup::Eight));
        assert_eq!(BallGroup::of(9), Some(BallGroup::Striped));
        assert_eq!(BallGroup::of(15), Some(BallGroup::Striped));
        assert_eq!(BallGroup::of(16), None);
    }

    #[test]
    fn cue_ball_is_white() {
        let cue = Ball::new(0, 15.0, Vec2::ZERO);
        assert!(cue.is_cue());
        assert_eq!(cue.color(), (255, 255, 255));
    }

    #[test]
    fn rack_holds_every_object_ball_once() {
        let positions = rack_positions(Vec2::new(600.0, 225.0), 15.0);
        let mut seen = [false; 16];
        for (number, _) in positions {
            assert!(!seen[number as usize], "ball {} placed twice", number);
            seen[number as usize] = true;
        }
        for number in 1..=15 {
            assert!(seen[number], "ball {} missing from rack", number);
        }
    }

    #[test]
    fn rack_apex_is_ball_one() {
        let apex = Vec2::new(600.0, 225.0);
        let positions = rack_positions(apex, 15.0);
        let (number, pos) = positions[0];
        assert_eq!(number, 1);
        assert_eq!(pos, apex);
    }

    #[test]
    fn rack_rows_do_not_overlap() {
        let positions = rack_positions(Vec2::new(600.0, 225.0), 15.0);
        for (i, &(_, a)) in positions.iter().enumerate() {
            for &(_, b) in positions.iter().skip(i + 1) {
                assert!(
                    a.distance(b) >= 15.0 * 2.0,
                    "balls at {:?} and {:?} overlap",
                    a,
                    b
                );
            }
        }
    }
}
