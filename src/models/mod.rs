//! Core data models: tournaments, players, teams, rounds and matches.

mod ids;
mod player;
mod round;
mod score;
mod tournament;

pub use ids::*;
pub use player::*;
pub use round::*;
pub use score::*;
pub use tournament::*;
