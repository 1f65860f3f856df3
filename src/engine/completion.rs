use super::progression::{level_count, passed_level_count};
use crate::model::tournament::NewCompletion;
use crate::schema::tournament_completions::dsl as completions_dsl;
use diesel::dsl::now;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// True once the user has a passed submission for every level of a
/// tournament that has at least one level.
pub fn has_cleared(conn: &mut PgConnection, user_id: i32, tournament_id: i32) -> QueryResult<bool> {
    let total = level_count(conn, tournament_id)?;
    if total == 0 {
        return Ok(false);
    }
    Ok(passed_level_count(conn, user_id, tournament_id)? >= total)
}

/// Stores the completion time for (user, tournament), replacing any earlier
/// time in the same statement.
pub fn record_completion(
    conn: &mut PgConnection,
    user_id: i32,
    tournament_id: i32,
    completion_time: i32,
) -> QueryResult<()> {
    diesel::insert_into(completions_dsl::tournament_completions)
        .values(&NewCompletion {
            user_id,
            tournament_id,
            completion_time,
        })
        .on_conflict((completions_dsl::user_id, completions_dsl::tournament_id))
        .do_update()
        .set((
            completions_dsl::completion_time.eq(excluded(completions_dsl::completion_time)),
            completions_dsl::completed_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}
