use crate::model::tournament::LeaderboardEntry;
use crate::schema::{
    tournament_completions::dsl as completions_dsl, tournament_submissions::dsl as sub_dsl,
    users::dsl as users_dsl,
};
use diesel::dsl::count_distinct;
use diesel::prelude::*;
use std::collections::HashMap;

pub const LEADERBOARD_LIMIT: i64 = 100;

/// Fastest completions first. `completed_levels` is counted from passed
/// submissions, independently of the completion row itself.
pub fn build_leaderboard(
    conn: &mut PgConnection,
    tournament_id: i32,
    limit: i64,
) -> QueryResult<Vec<LeaderboardEntry>> {
    let finishers = completions_dsl::tournament_completions
        .inner_join(users_dsl::users)
        .filter(completions_dsl::tournament_id.eq(tournament_id))
        .order((
            completions_dsl::completion_time.asc(),
            completions_dsl::completed_at.asc(),
        ))
        .limit(limit)
        .select((
            users_dsl::id,
            users_dsl::username,
            completions_dsl::completion_time,
        ))
        .load::<(i32, String, i32)>(conn)?;

    if finishers.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i32> = finishers.iter().map(|(id, _, _)| *id).collect();
    let completed_levels: HashMap<i32, i64> = sub_dsl::tournament_submissions
        .filter(sub_dsl::tournament_id.eq(tournament_id))
        .filter(sub_dsl::passed.eq(true))
        .filter(sub_dsl::user_id.eq_any(user_ids))
        .group_by(sub_dsl::user_id)
        .select((sub_dsl::user_id, count_distinct(sub_dsl::level_id)))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect();

    Ok(finishers
        .into_iter()
        .enumerate()
        .map(|(index, (user_id, username, completion_time))| LeaderboardEntry {
            rank: index + 1,
            user_id,
            username,
            completion_time,
            completed_levels: completed_levels.get(&user_id).copied().unwrap_or(0),
        })
        .collect())
}
