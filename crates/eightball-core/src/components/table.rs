//! Table geometry: playing surface dimensions and derived pocket positions.

use glam::Vec2;

/// A pocket capture region. A fixed sensor circle in the simulation;
/// it detects overlap without obstructing motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pocket {
    pub center: Vec2,
    pub radius: f32,
}

/// The playing surface. Pocket positions derive from the dimensions and the
/// fixed inset margin; nothing here changes after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Table {
    pub width: f32,
    pub height: f32,
    pub pocket_radius: f32,
    /// Distance from the boundary line to a pocket center, normally the
    /// inner cushion face.
    pub pocket_inset: f32,
}

impl Table {
    pub fn new(width: f32, height: f32, pocket_radius: f32, pocket_inset: f32) -> Self {
        Self {
            width,
            height,
            pocket_radius,
            pocket_inset,
        }
    }

    /// The six pockets in fixed order: top-left, top-middle, top-right,
    /// bottom-left, bottom-middle, bottom-right.
    pub fn pockets(&self) -> [Pocket; 6] {
        let m = self.pocket_inset;
        let r = self.pocket_radius;
        let (w, h) = (self.width, self.height);
        [
            Pocket { center: Vec2::new(m, m), radius: r },
            Pocket { center: Vec2::new(w / 2.0, m), radius: r },
            Pocket { center: Vec2::new(w - m, m), radius: r },
            Pocket { center: Vec2::new(m, h - m), radius: r },
            Pocket { center: Vec2::new(w / 2.0, h - m), radius: r },
            Pocket { center: Vec2::new(w - m, h - m), radius: r },
        ]
    }
}
