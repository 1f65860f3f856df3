use crate::schema::{
    tournament_levels::dsl as levels_dsl, tournament_submissions::dsl as sub_dsl,
};
use diesel::dsl::{exists, select};
use diesel::prelude::*;

/// Whether `user_id` may attempt `level_number` of a tournament.
///
/// The first level is always open. Any later level requires a passed
/// submission for the level numbered immediately before it.
pub fn can_attempt(
    conn: &mut PgConnection,
    user_id: i32,
    tournament_id: i32,
    level_number: i32,
) -> QueryResult<bool> {
    if level_number <= 1 {
        return Ok(true);
    }

    select(exists(
        sub_dsl::tournament_submissions
            .inner_join(levels_dsl::tournament_levels)
            .filter(sub_dsl::user_id.eq(user_id))
            .filter(sub_dsl::tournament_id.eq(tournament_id))
            .filter(sub_dsl::passed.eq(true))
            .filter(levels_dsl::tournament_id.eq(tournament_id))
            .filter(levels_dsl::level_number.eq(level_number - 1)),
    ))
    .get_result::<bool>(conn)
}
