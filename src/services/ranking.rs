use crate::error::AppResult;
use crate::models::Prediction;
use crate::repositories::{GroupMemberRepository, PredictionRepository, UserRepository};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// One row of a group's standings.
///
/// Derived on demand from predictions; never persisted as source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub user_id: Uuid,
    pub username: String,
    /// Standard competition rank: tied entries share a rank, ties
    /// consume rank slots
    pub rank: i64,
    pub points: i64,
    pub predictions: i64,
    pub exact_hits: i64,
    pub tendency_hits: i64,
}

/// Ranking computation over a group's members and predictions.
///
/// Standings are recomputed live from the store on every call. The
/// settlement service relies on that: it reads standings before and after
/// the settlement write to detect rank changes, and a cached read on
/// either side would break the diff. Response caching belongs to the
/// cache service, keyed by group, with the short TTL it already uses.
pub struct RankingService {
    group_member_repo: Arc<GroupMemberRepository>,
    user_repo: Arc<UserRepository>,
    prediction_repo: Arc<PredictionRepository>,
}

impl RankingService {
    /// Create a new ranking service
    pub fn new(
        group_member_repo: Arc<GroupMemberRepository>,
        user_repo: Arc<UserRepository>,
        prediction_repo: Arc<PredictionRepository>,
    ) -> Self {
        Self {
            group_member_repo,
            user_repo,
            prediction_repo,
        }
    }

    /// Compute the current standings of a group.
    ///
    /// Every member appears, including members without a single
    /// prediction; unsettled predictions contribute zero points.
    pub async fn standings(&self, group_id: Uuid) -> AppResult<Vec<RankingEntry>> {
        let members = self.group_member_repo.find_by_group(group_id).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let member_ids: Vec<Uuid> = members.iter().map(|m| m.user_id).collect();
        let users = self.user_repo.find_by_ids(&member_ids).await?;
        let usernames: HashMap<Uuid, String> =
            users.into_iter().map(|u| (u.id, u.username)).collect();

        // A member whose user row is gone still ranks; the id stands in
        // for the name.
        let members: Vec<(Uuid, String)> = member_ids
            .iter()
            .map(|id| {
                let name = usernames.get(id).cloned().unwrap_or_else(|| id.to_string());
                (*id, name)
            })
            .collect();

        let predictions = self.prediction_repo.find_by_group(group_id).await?;

        Ok(compute_standings(&members, &predictions))
    }
}

/// Build a group's standings table from loaded rows.
///
/// Sort order: total points, then exact-score hits, then tendency hits,
/// all descending, with username ascending as the deterministic final
/// key. Ranks follow standard competition ranking over the first three
/// keys (the username never separates ranks).
pub fn compute_standings(
    members: &[(Uuid, String)],
    predictions: &[Prediction],
) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = members
        .iter()
        .map(|(user_id, username)| RankingEntry {
            user_id: *user_id,
            username: username.clone(),
            rank: 0,
            points: 0,
            predictions: 0,
            exact_hits: 0,
            tendency_hits: 0,
        })
        .collect();

    let by_user: HashMap<Uuid, usize> = entries
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.user_id, idx))
        .collect();

    for prediction in predictions {
        // Predictions from users no longer in the group do not rank
        let Some(&idx) = by_user.get(&prediction.user_id) else {
            continue;
        };
        let entry = &mut entries[idx];
        entry.predictions += 1;
        if prediction.is_settled() {
            entry.points += i64::from(prediction.points);
            if prediction.exact_hit {
                entry.exact_hits += 1;
            }
            if prediction.tendency_hit {
                entry.tendency_hits += 1;
            }
        }
    }

    entries.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.exact_hits.cmp(&a.exact_hits))
            .then(b.tendency_hits.cmp(&a.tendency_hits))
            .then(a.username.cmp(&b.username))
    });

    let mut last_key = None;
    let mut last_rank = 0;
    for (position, entry) in entries.iter_mut().enumerate() {
        let key = (entry.points, entry.exact_hits, entry.tendency_hits);
        if last_key != Some(key) {
            last_rank = (position + 1) as i64;
            last_key = Some(key);
        }
        entry.rank = last_rank;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(name: &str) -> (Uuid, String) {
        (Uuid::new_v4(), name.to_string())
    }

    fn settled(user_id: Uuid, points: i32, exact: bool, tendency: bool) -> Prediction {
        let now = Utc::now().naive_utc();
        Prediction {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            group_fixture_id: Uuid::new_v4(),
            user_id,
            guess: "1:0".to_string(),
            points,
            exact_hit: exact,
            tendency_hit: tendency,
            settled_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    fn pending(user_id: Uuid) -> Prediction {
        let now = Utc::now().naive_utc();
        Prediction {
            settled_at: None,
            points: 0,
            exact_hit: false,
            tendency_hit: false,
            ..settled(user_id, 0, false, false)
        }
    }

    #[test]
    fn test_orders_by_points_then_hit_counts() {
        let alice = member("alice");
        let bob = member("bob");
        let carol = member("carol");
        let predictions = vec![
            settled(alice.0, 2, false, true),
            settled(bob.0, 4, true, true),
            settled(carol.0, 2, false, true),
            settled(carol.0, 4, true, true),
        ];

        let standings = compute_standings(&[alice.clone(), bob.clone(), carol.clone()], &predictions);

        assert_eq!(standings[0].username, "carol");
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[0].points, 6);
        assert_eq!(standings[1].username, "bob");
        assert_eq!(standings[1].rank, 2);
        assert_eq!(standings[2].username, "alice");
        assert_eq!(standings[2].rank, 3);
    }

    #[test]
    fn test_ties_share_rank_and_consume_slots() {
        let alice = member("alice");
        let charlie = member("charlie");
        let dave = member("dave");
        let predictions = vec![
            settled(alice.0, 3, false, true),
            settled(charlie.0, 3, false, true),
            settled(dave.0, 2, false, true),
        ];

        let standings = compute_standings(&[dave.clone(), charlie.clone(), alice.clone()], &predictions);

        // Equal on all counts: alphabetical order, shared rank 1
        assert_eq!(standings[0].username, "alice");
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].username, "charlie");
        assert_eq!(standings[1].rank, 1);
        // The next distinct entry is rank 3, not 2
        assert_eq!(standings[2].username, "dave");
        assert_eq!(standings[2].rank, 3);
    }

    #[test]
    fn test_exact_hits_break_point_ties() {
        let alice = member("alice");
        let bob = member("bob");
        let predictions = vec![
            settled(alice.0, 4, false, true),
            settled(bob.0, 4, true, true),
        ];

        let standings = compute_standings(&[alice.clone(), bob.clone()], &predictions);

        assert_eq!(standings[0].username, "bob");
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].rank, 2);
    }

    #[test]
    fn test_members_without_predictions_are_included() {
        let alice = member("alice");
        let bob = member("bob");
        let predictions = vec![settled(alice.0, 2, false, true)];

        let standings = compute_standings(&[alice.clone(), bob.clone()], &predictions);

        assert_eq!(standings.len(), 2);
        assert_eq!(standings[1].username, "bob");
        assert_eq!(standings[1].points, 0);
        assert_eq!(standings[1].predictions, 0);
        assert_eq!(standings[1].rank, 2);
    }

    #[test]
    fn test_pending_predictions_count_but_score_zero() {
        let alice = member("alice");
        let predictions = vec![pending(alice.0), pending(alice.0)];

        let standings = compute_standings(&[alice.clone()], &predictions);

        assert_eq!(standings[0].predictions, 2);
        assert_eq!(standings[0].points, 0);
        assert_eq!(standings[0].rank, 1);
    }

    #[test]
    fn test_non_member_predictions_are_ignored() {
        let alice = member("alice");
        let stranger = Uuid::new_v4();
        let predictions = vec![settled(stranger, 4, true, true)];

        let standings = compute_standings(&[alice.clone()], &predictions);

        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].points, 0);
    }
}
