//! Game simulation modules

pub mod command;
pub mod map;
pub mod player;
pub mod turn;
pub mod visibility;
pub mod world;

pub use command::{interpret, CommandError};
pub use map::Map;
pub use world::{JoinError, Outcome, World};

use uuid::Uuid;

/// Identifies one connection and the player bound to it
pub type SessionId = Uuid;
