pub mod api;
pub mod components;
pub mod core;
pub mod input;
pub mod rules;

// Re-export key types at crate root for convenience
pub use crate::api::session::{GameConfig, GameSession};
pub use crate::api::types::{BodyId, GameSnapshot, Outcome, Player};
pub use crate::components::ball::{rack_positions, Ball, BallGroup};
pub use crate::components::table::{Pocket, Table};
pub use crate::core::physics::{
    BodyDesc, BodyType, ColliderDesc, ColliderMaterial, CollisionPair, PhysicsBody, PhysicsWorld,
};
pub use crate::core::simulation::{SimEvent, SimParams, Simulation};
pub use crate::core::time::FixedTimestep;
pub use crate::input::queue::{InputEvent, InputQueue};
pub use crate::input::shot::{CuePreview, ShotController, ShotParams, TableStatus};
pub use crate::rules::{GameState, RulesCommand, RulesEngine, TargetGroup};
