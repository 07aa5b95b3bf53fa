//! Domain models for the Matchday backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the group prediction platform.

pub mod fixture;
pub mod group;
pub mod group_fixture;
pub mod group_member;
pub mod group_rules;
pub mod prediction;
pub mod user;

// Re-export all models for convenient access
pub use fixture::{Fixture, MatchState};
pub use group::{Group, GroupStatus};
pub use group_fixture::GroupFixture;
pub use group_member::GroupMember;
pub use group_rules::GroupRules;
pub use prediction::Prediction;
pub use user::User;
