//! Matchday Backend Library
//!
//! Settlement and ranking engine for the Matchday group prediction
//! platform: turns finished fixtures into settled predictions, group
//! standings and group lifecycle transitions. This module exposes the
//! backend components for use by tests and other consumers.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod scoring;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use repositories::*;
use std::sync::Arc;

/// Application state containing all repositories
pub struct AppState {
    pub database: Database,
    pub user_repo: Arc<UserRepository>,
    pub group_repo: Arc<GroupRepository>,
    pub group_member_repo: Arc<GroupMemberRepository>,
    pub fixture_repo: Arc<FixtureRepository>,
    pub group_fixture_repo: Arc<GroupFixtureRepository>,
    pub rules_repo: Arc<GroupRulesRepository>,
    pub prediction_repo: Arc<PredictionRepository>,
}

impl AppState {
    /// Create a new AppState with initialized repositories
    pub fn new(pool: sqlx::PgPool) -> Self {
        let database = Database::new(pool.clone());

        Self {
            database: database.clone(),
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            group_repo: Arc::new(GroupRepository::new(pool.clone())),
            group_member_repo: Arc::new(GroupMemberRepository::new(pool.clone())),
            fixture_repo: Arc::new(FixtureRepository::new(pool.clone())),
            group_fixture_repo: Arc::new(GroupFixtureRepository::new(pool.clone())),
            rules_repo: Arc::new(GroupRulesRepository::new(pool.clone())),
            prediction_repo: Arc::new(PredictionRepository::new(pool)),
        }
    }
}
