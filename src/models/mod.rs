//! Core data models for the team analyzer.

mod analysis;
mod match_summary;
pub(crate) mod participant;
mod region;

pub use analysis::*;
pub use match_summary::*;
pub use participant::{sort_by_position, ParticipantStats, Role, BLUE_TEAM, RED_TEAM};
pub use region::*;
