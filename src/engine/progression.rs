use crate::model::tournament::{Level, NewSubmission};
use crate::schema::{
    tournament_levels::dsl as levels_dsl, tournament_submissions::dsl as sub_dsl,
    users::dsl as users_dsl,
};
use clap::ValueEnum;
use diesel::dsl::{count_distinct, exists, select};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// When a passing submission earns the level's points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AwardPolicy {
    /// Points are credited on every passing submission, including repeats.
    EveryPass,
    /// Points are credited only the first time the user passes a level.
    #[default]
    FirstPass,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub points_awarded: i32,
    pub tournament_completed: bool,
    pub next_level_number: Option<i32>,
}

pub fn level_count(conn: &mut PgConnection, tournament_id: i32) -> QueryResult<i64> {
    levels_dsl::tournament_levels
        .filter(levels_dsl::tournament_id.eq(tournament_id))
        .count()
        .get_result(conn)
}

/// Number of distinct levels the user has at least one passed submission for.
pub fn passed_level_count(
    conn: &mut PgConnection,
    user_id: i32,
    tournament_id: i32,
) -> QueryResult<i64> {
    sub_dsl::tournament_submissions
        .filter(sub_dsl::tournament_id.eq(tournament_id))
        .filter(sub_dsl::user_id.eq(user_id))
        .filter(sub_dsl::passed.eq(true))
        .select(count_distinct(sub_dsl::level_id))
        .get_result(conn)
}

/// Smallest level number strictly after `level_number`, if any.
pub fn next_level_number(
    conn: &mut PgConnection,
    tournament_id: i32,
    level_number: i32,
) -> QueryResult<Option<i32>> {
    levels_dsl::tournament_levels
        .filter(levels_dsl::tournament_id.eq(tournament_id))
        .filter(levels_dsl::level_number.gt(level_number))
        .order(levels_dsl::level_number.asc())
        .select(levels_dsl::level_number)
        .first::<i32>(conn)
        .optional()
}

fn points_for(policy: AwardPolicy, level_points: i32, previously_passed: bool) -> i32 {
    match policy {
        AwardPolicy::EveryPass => level_points,
        AwardPolicy::FirstPass if previously_passed => 0,
        AwardPolicy::FirstPass => level_points,
    }
}

/// Appends the submission and, when it passed, credits points and works out
/// where the user stands in the tournament.
///
/// Must run inside a transaction: the user's row is locked first so
/// concurrent submissions by the same user are applied one at a time.
pub fn record_submission(
    conn: &mut PgConnection,
    user_id: i32,
    level: &Level,
    passed: bool,
    policy: AwardPolicy,
) -> QueryResult<Progress> {
    users_dsl::users
        .find(user_id)
        .select(users_dsl::id)
        .for_update()
        .first::<i32>(conn)?;

    let previously_passed = select(exists(
        sub_dsl::tournament_submissions
            .filter(sub_dsl::user_id.eq(user_id))
            .filter(sub_dsl::level_id.eq(level.id))
            .filter(sub_dsl::passed.eq(true)),
    ))
    .get_result::<bool>(conn)?;

    diesel::insert_into(sub_dsl::tournament_submissions)
        .values(&NewSubmission {
            user_id,
            tournament_id: level.tournament_id,
            level_id: level.id,
            passed,
        })
        .execute(conn)?;

    if !passed {
        debug!(
            "Failed submission recorded for user {} on level {} of tournament {}",
            user_id, level.level_number, level.tournament_id
        );
        return Ok(Progress::default());
    }

    let points_awarded = points_for(policy, level.points, previously_passed);
    if points_awarded > 0 {
        diesel::update(users_dsl::users.find(user_id))
            .set(users_dsl::points.eq(users_dsl::points + points_awarded))
            .execute(conn)?;
    }

    let total = level_count(conn, level.tournament_id)?;
    let completed = passed_level_count(conn, user_id, level.tournament_id)?;
    info!(
        "User {} passed level {} of tournament {} ({}/{} levels, +{} points)",
        user_id, level.level_number, level.tournament_id, completed, total, points_awarded
    );

    if completed >= total {
        return Ok(Progress {
            points_awarded,
            tournament_completed: true,
            next_level_number: None,
        });
    }

    Ok(Progress {
        points_awarded,
        tournament_completed: false,
        next_level_number: next_level_number(conn, level.tournament_id, level.level_number)?,
    })
}
