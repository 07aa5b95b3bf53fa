use crate::config::SettlementConfig;
use crate::error::AppResult;
use crate::models::{Fixture, GroupFixture, GroupRules, Prediction};
use crate::repositories::{
    FixtureRepository, GroupFixtureRepository, GroupRepository, GroupRulesRepository,
    PredictionRepository,
};
use crate::scoring::{self, PointsAward};
use crate::services::cache::CacheInvalidator;
use crate::services::notification::RankChangeNotifier;
use crate::services::ranking::{RankingEntry, RankingService};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Aggregate result of one settlement run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettlementOutcome {
    pub settled: u64,
    pub skipped: u64,
    pub groups_ended: u64,
}

/// One prediction's computed award, staged for the atomic write
#[derive(Debug, Clone, Copy)]
struct PredictionSettlement {
    prediction_id: Uuid,
    user_id: Uuid,
    award: PointsAward,
}

/// A user's standing improvement detected after settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RankChange {
    user_id: Uuid,
    old_rank: Option<i64>,
    new_rank: i64,
}

/// Settlement orchestrator: turns a batch of finished fixtures into
/// settled predictions, updated group lifecycles and rank-change
/// notifications.
///
/// Safe to re-invoke with overlapping fixture sets: settled predictions
/// are excluded by the `settled_at` filter and guarded again in the
/// UPDATE, so repeated runs converge without double-awarding points.
pub struct SettlementService {
    fixture_repo: Arc<FixtureRepository>,
    group_fixture_repo: Arc<GroupFixtureRepository>,
    group_repo: Arc<GroupRepository>,
    rules_repo: Arc<GroupRulesRepository>,
    prediction_repo: Arc<PredictionRepository>,
    ranking: Arc<RankingService>,
    notifier: Arc<dyn RankChangeNotifier>,
    caches: Arc<dyn CacheInvalidator>,
    pool: PgPool,
    config: SettlementConfig,
}

impl SettlementService {
    /// Create a new settlement service
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fixture_repo: Arc<FixtureRepository>,
        group_fixture_repo: Arc<GroupFixtureRepository>,
        group_repo: Arc<GroupRepository>,
        rules_repo: Arc<GroupRulesRepository>,
        prediction_repo: Arc<PredictionRepository>,
        ranking: Arc<RankingService>,
        notifier: Arc<dyn RankChangeNotifier>,
        caches: Arc<dyn CacheInvalidator>,
        pool: PgPool,
        config: SettlementConfig,
    ) -> Self {
        Self {
            fixture_repo,
            group_fixture_repo,
            group_repo,
            rules_repo,
            prediction_repo,
            ranking,
            notifier,
            caches,
            pool,
            config,
        }
    }

    /// Settle every open prediction touched by the given fixtures.
    ///
    /// The prediction updates of one run are written in a single
    /// transaction; a store failure there fails the whole call with no
    /// partial state. Downstream notification and cache calls are
    /// best-effort and never fail the run.
    pub async fn settle(&self, fixture_ids: &[Uuid]) -> AppResult<SettlementOutcome> {
        if fixture_ids.is_empty() {
            return Ok(SettlementOutcome::default());
        }

        let fixtures = self.fixture_repo.find_finished_by_ids(fixture_ids).await?;
        if fixtures.is_empty() {
            info!("Settlement triggered for {} fixtures, none finished", fixture_ids.len());
            return Ok(SettlementOutcome::default());
        }
        let finished_ids: Vec<Uuid> = fixtures.iter().map(|f| f.id).collect();

        let memberships = self
            .group_fixture_repo
            .find_by_fixture_ids(&finished_ids)
            .await?;
        if memberships.is_empty() {
            info!("No group references the {} finished fixtures, nothing to settle", fixtures.len());
            return Ok(SettlementOutcome::default());
        }

        let group_ids: Vec<Uuid> = memberships
            .iter()
            .map(|m| m.group_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        // A group without rules is a data-integrity defect; its
        // predictions are skipped, the rest of the batch continues.
        let rules_by_group: HashMap<Uuid, GroupRules> = self
            .rules_repo
            .find_by_group_ids(&group_ids)
            .await?
            .into_iter()
            .map(|r| (r.group_id, r))
            .collect();
        for group_id in &group_ids {
            if !rules_by_group.contains_key(group_id) {
                warn!("Group {} has no scoring rules, skipping its predictions", group_id);
            }
        }

        let membership_ids: Vec<Uuid> = memberships.iter().map(|m| m.id).collect();
        let predictions = self
            .prediction_repo
            .find_unsettled_by_memberships(&membership_ids)
            .await?;

        let memberships_by_id: HashMap<Uuid, &GroupFixture> =
            memberships.iter().map(|m| (m.id, m)).collect();
        let fixtures_by_id: HashMap<Uuid, &Fixture> =
            fixtures.iter().map(|f| (f.id, f)).collect();

        let (updates, skipped) = plan_settlements(
            &predictions,
            &memberships_by_id,
            &fixtures_by_id,
            &rules_by_group,
        );

        // Standings snapshot before the write, for rank-change detection
        let standings_before = if updates.is_empty() {
            HashMap::new()
        } else {
            self.snapshot_ranks(&group_ids).await?
        };

        // The idempotence boundary: every update persists or none do.
        let mut settled: u64 = 0;
        if !updates.is_empty() {
            let settled_at = chrono::Utc::now().naive_utc();
            let mut tx = self.pool.begin().await?;
            for update in &updates {
                settled += PredictionRepository::mark_settled(
                    &mut tx,
                    update.prediction_id,
                    update.award,
                    settled_at,
                )
                .await?;
            }
            tx.commit().await?;
        }

        let groups_ended = self.close_finished_groups(&group_ids).await?;

        // Strictly after the commit and before the standings re-read, so
        // downstream readers and the diff below both observe fresh data.
        let user_ids: Vec<Uuid> = updates
            .iter()
            .map(|u| u.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        self.invalidate_caches(&group_ids, &user_ids).await;

        if !updates.is_empty() {
            self.notify_rank_changes(&standings_before).await;
        }

        let outcome = SettlementOutcome {
            settled,
            skipped,
            groups_ended,
        };
        info!(
            "Settlement complete: {} settled, {} skipped, {} groups ended",
            outcome.settled, outcome.skipped, outcome.groups_ended
        );
        Ok(outcome)
    }

    /// Read the current rank of every member of the given groups
    async fn snapshot_ranks(
        &self,
        group_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, HashMap<Uuid, i64>>> {
        let standings =
            futures::future::join_all(group_ids.iter().map(|id| self.ranking.standings(*id)))
                .await;

        let mut snapshot = HashMap::new();
        for (group_id, result) in group_ids.iter().zip(standings) {
            let ranks = result?
                .into_iter()
                .map(|entry| (entry.user_id, entry.rank))
                .collect();
            snapshot.insert(*group_id, ranks);
        }
        Ok(snapshot)
    }

    /// Transition every group whose slate has fully reached terminal
    /// match states from active to ended.
    ///
    /// Re-evaluated on every run: a group left partially open by this
    /// batch ends on whichever later run closes out its last fixture.
    async fn close_finished_groups(&self, group_ids: &[Uuid]) -> AppResult<u64> {
        let mut ended = 0;
        for group in self.group_repo.find_by_ids(group_ids).await? {
            if !group.is_active() {
                continue;
            }
            if self.group_fixture_repo.has_open_fixtures(group.id).await? {
                continue;
            }
            if self.group_repo.mark_ended(group.id).await? {
                info!("Group {} has no open fixtures left, marked as ended", group.id);
                ended += 1;
            }
        }
        Ok(ended)
    }

    /// Fire-and-forget invalidation of the externally owned caches
    async fn invalidate_caches(&self, group_ids: &[Uuid], user_ids: &[Uuid]) {
        if let Err(e) = self.caches.invalidate_ranking(group_ids).await {
            warn!("Ranking cache invalidation failed: {}", e);
        }
        if user_ids.is_empty() {
            return;
        }
        if let Err(e) = self.caches.invalidate_user_stats(user_ids).await {
            warn!("User stats cache invalidation failed: {}", e);
        }
        if let Err(e) = self.caches.invalidate_head_to_head(user_ids).await {
            warn!("Head-to-head cache invalidation failed: {}", e);
        }
    }

    /// Diff post-settlement standings against the snapshot and announce
    /// users who climbed into the top ranks. Best-effort per item: one
    /// failed read or webhook call never affects the others, let alone
    /// the settlement itself.
    async fn notify_rank_changes(&self, before: &HashMap<Uuid, HashMap<Uuid, i64>>) {
        for (group_id, old_ranks) in before {
            let standings = match self.ranking.standings(*group_id).await {
                Ok(standings) => standings,
                Err(e) => {
                    warn!("Skipping rank-change detection for group {}: {}", group_id, e);
                    continue;
                }
            };

            for change in rank_improvements(old_ranks, &standings, self.config.notify_top_ranks) {
                if let Err(e) = self
                    .notifier
                    .emit_rank_change(*group_id, change.user_id, change.old_rank, change.new_rank)
                    .await
                {
                    warn!(
                        "Rank-change notification failed for user {} in group {}: {}",
                        change.user_id, group_id, e
                    );
                }
            }
        }
    }
}

/// Compute the award for every loaded prediction, resolving its fixture
/// through the membership row and its rules through the group.
///
/// Data-integrity gaps (missing membership, fixture, rules, or an
/// unresolvable actual score) skip the prediction and count it; they
/// never abort the batch.
fn plan_settlements(
    predictions: &[Prediction],
    memberships_by_id: &HashMap<Uuid, &GroupFixture>,
    fixtures_by_id: &HashMap<Uuid, &Fixture>,
    rules_by_group: &HashMap<Uuid, GroupRules>,
) -> (Vec<PredictionSettlement>, u64) {
    let mut updates = Vec::with_capacity(predictions.len());
    let mut skipped: u64 = 0;

    for prediction in predictions {
        let Some(membership) = memberships_by_id.get(&prediction.group_fixture_id) else {
            warn!("Prediction {} references unknown membership {}", prediction.id, prediction.group_fixture_id);
            skipped += 1;
            continue;
        };
        let Some(fixture) = fixtures_by_id.get(&membership.fixture_id) else {
            warn!("Prediction {} references unknown fixture {}", prediction.id, membership.fixture_id);
            skipped += 1;
            continue;
        };
        let Some(rules) = rules_by_group.get(&prediction.group_id) else {
            // Already reported once per group
            skipped += 1;
            continue;
        };

        let scores = fixture.scores();
        if scoring::resolve_full_time(&scores).is_none() {
            warn!("Fixture {} finished without a resolvable score, skipping prediction {}", fixture.id, prediction.id);
            skipped += 1;
            continue;
        }

        let award = scoring::score_prediction(&prediction.guess, &scores, &rules.scoring_rules());
        updates.push(PredictionSettlement {
            prediction_id: prediction.id,
            user_id: prediction.user_id,
            award,
        });
    }

    (updates, skipped)
}

/// Users whose rank improved into the top `top_ranks` positions
fn rank_improvements(
    before: &HashMap<Uuid, i64>,
    after: &[RankingEntry],
    top_ranks: i64,
) -> Vec<RankChange> {
    after
        .iter()
        .filter(|entry| entry.rank <= top_ranks)
        .filter_map(|entry| {
            let old_rank = before.get(&entry.user_id).copied();
            let improved = match old_rank {
                Some(old) => entry.rank < old,
                None => true,
            };
            improved.then(|| RankChange {
                user_id: entry.user_id,
                old_rank,
                new_rank: entry.rank,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fixture, GroupFixture, GroupRules, Prediction};
    use chrono::Utc;

    fn fixture(full_time: Option<(i32, i32)>) -> Fixture {
        let now = Utc::now().naive_utc();
        Fixture {
            id: Uuid::new_v4(),
            home_team: "Home".to_string(),
            away_team: "Away".to_string(),
            kickoff_at: None,
            state: "finished".to_string(),
            full_time_home: full_time.map(|(h, _)| h),
            full_time_away: full_time.map(|(_, a)| a),
            extra_time_home: None,
            extra_time_away: None,
            penalties_home: None,
            penalties_away: None,
            result_text: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn membership(group_id: Uuid, fixture_id: Uuid) -> GroupFixture {
        GroupFixture {
            id: Uuid::new_v4(),
            group_id,
            fixture_id,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn rules(group_id: Uuid) -> GroupRules {
        GroupRules {
            group_id,
            mode: "correct_score".to_string(),
            ko_mode: "full_time".to_string(),
            points_exact: 4,
            points_difference: 3,
            points_outcome: 2,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn prediction(group_id: Uuid, group_fixture_id: Uuid, guess: &str) -> Prediction {
        let now = Utc::now().naive_utc();
        Prediction {
            id: Uuid::new_v4(),
            group_id,
            group_fixture_id,
            user_id: Uuid::new_v4(),
            guess: guess.to_string(),
            points: 0,
            exact_hit: false,
            tendency_hit: false,
            settled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_plan_awards_points_per_rules() {
        let group_id = Uuid::new_v4();
        let fixture = fixture(Some((2, 1)));
        let membership = membership(group_id, fixture.id);
        let predictions = vec![
            prediction(group_id, membership.id, "2:1"),
            prediction(group_id, membership.id, "0:2"),
        ];

        let memberships_by_id = HashMap::from([(membership.id, &membership)]);
        let fixtures_by_id = HashMap::from([(fixture.id, &fixture)]);
        let rules_by_group = HashMap::from([(group_id, rules(group_id))]);

        let (updates, skipped) =
            plan_settlements(&predictions, &memberships_by_id, &fixtures_by_id, &rules_by_group);

        assert_eq!(skipped, 0);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].award.points, 4);
        assert!(updates[0].award.exact_hit);
        assert_eq!(updates[1].award.points, 0);
    }

    #[test]
    fn test_plan_skips_group_without_rules() {
        let group_id = Uuid::new_v4();
        let fixture = fixture(Some((1, 0)));
        let membership = membership(group_id, fixture.id);
        let predictions = vec![prediction(group_id, membership.id, "1:0")];

        let memberships_by_id = HashMap::from([(membership.id, &membership)]);
        let fixtures_by_id = HashMap::from([(fixture.id, &fixture)]);

        let (updates, skipped) =
            plan_settlements(&predictions, &memberships_by_id, &fixtures_by_id, &HashMap::new());

        assert!(updates.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_plan_skips_unresolvable_score() {
        let group_id = Uuid::new_v4();
        let fixture = fixture(None);
        let membership = membership(group_id, fixture.id);
        let predictions = vec![prediction(group_id, membership.id, "1:0")];

        let memberships_by_id = HashMap::from([(membership.id, &membership)]);
        let fixtures_by_id = HashMap::from([(fixture.id, &fixture)]);
        let rules_by_group = HashMap::from([(group_id, rules(group_id))]);

        let (updates, skipped) =
            plan_settlements(&predictions, &memberships_by_id, &fixtures_by_id, &rules_by_group);

        assert!(updates.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_plan_resolves_score_from_result_text() {
        let group_id = Uuid::new_v4();
        let mut fixture = fixture(None);
        fixture.result_text = Some("2:0".to_string());
        let membership = membership(group_id, fixture.id);
        let predictions = vec![prediction(group_id, membership.id, "2:0")];

        let memberships_by_id = HashMap::from([(membership.id, &membership)]);
        let fixtures_by_id = HashMap::from([(fixture.id, &fixture)]);
        let rules_by_group = HashMap::from([(group_id, rules(group_id))]);

        let (updates, skipped) =
            plan_settlements(&predictions, &memberships_by_id, &fixtures_by_id, &rules_by_group);

        assert_eq!(skipped, 0);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].award.points, 4);
    }

    #[test]
    fn test_plan_skips_dangling_membership() {
        let group_id = Uuid::new_v4();
        let predictions = vec![prediction(group_id, Uuid::new_v4(), "1:0")];

        let (updates, skipped) = plan_settlements(
            &predictions,
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::from([(group_id, rules(group_id))]),
        );

        assert!(updates.is_empty());
        assert_eq!(skipped, 1);
    }

    fn entry(user_id: Uuid, rank: i64) -> RankingEntry {
        RankingEntry {
            user_id,
            username: "user".to_string(),
            rank,
            points: 0,
            predictions: 0,
            exact_hits: 0,
            tendency_hits: 0,
        }
    }

    #[test]
    fn test_rank_improvements_detects_climb_into_top_three() {
        let climber = Uuid::new_v4();
        let steady = Uuid::new_v4();
        let before = HashMap::from([(climber, 5), (steady, 1)]);
        let after = vec![entry(steady, 1), entry(climber, 2)];

        let changes = rank_improvements(&before, &after, 3);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].user_id, climber);
        assert_eq!(changes[0].old_rank, Some(5));
        assert_eq!(changes[0].new_rank, 2);
    }

    #[test]
    fn test_rank_improvements_ignores_moves_outside_top_three() {
        let user = Uuid::new_v4();
        let before = HashMap::from([(user, 8)]);
        let after = vec![entry(user, 4)];

        assert!(rank_improvements(&before, &after, 3).is_empty());
    }

    #[test]
    fn test_rank_improvements_ignores_drops_and_holds() {
        let dropper = Uuid::new_v4();
        let holder = Uuid::new_v4();
        let before = HashMap::from([(dropper, 1), (holder, 2)]);
        let after = vec![entry(holder, 2), entry(dropper, 3)];

        assert!(rank_improvements(&before, &after, 3).is_empty());
    }

    #[test]
    fn test_rank_improvements_counts_new_member_as_climb() {
        let newcomer = Uuid::new_v4();
        let after = vec![entry(newcomer, 1)];

        let changes = rank_improvements(&HashMap::new(), &after, 3);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_rank, None);
    }
}
