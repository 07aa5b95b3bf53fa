pub mod cache;
pub mod notification;
pub mod ranking;
pub mod settlement;

pub use cache::{CacheInvalidator, HttpCacheInvalidator, NullCacheInvalidator};
pub use notification::{NullNotifier, RankChangeNotifier, WebhookNotifier};
pub use ranking::{compute_standings, RankingEntry, RankingService};
pub use settlement::{SettlementOutcome, SettlementService};
