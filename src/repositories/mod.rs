pub mod fixture_repository;
pub mod group_fixture_repository;
pub mod group_member_repository;
pub mod group_repository;
pub mod group_rules_repository;
pub mod prediction_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use fixture_repository::FixtureRepository;
pub use group_fixture_repository::GroupFixtureRepository;
pub use group_member_repository::GroupMemberRepository;
pub use group_repository::GroupRepository;
pub use group_rules_repository::GroupRulesRepository;
pub use prediction_repository::PredictionRepository;
pub use user_repository::UserRepository;
