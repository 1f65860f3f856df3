use crate::model::tournament::{
    Difficulty, LanguageEntry, Level, LevelView, NewLevel, NewTournament, NewTournamentLanguage,
    TournamentSummary,
};
use crate::payloads::tournament::CreateTournamentPayload;
use crate::schema::{
    programming_languages::dsl as pl_dsl, tournament_completions::dsl as completions_dsl,
    tournament_languages::dsl as tl_dsl, tournament_levels::dsl as levels_dsl,
    tournament_submissions::dsl as sub_dsl, tournaments::dsl as t_dsl, users::dsl as users_dsl,
};
use chrono::{DateTime, Utc};
use diesel::dsl::{count, exists, select};
use diesel::prelude::*;
use std::collections::{HashMap, HashSet};

/// Filters accepted by [`list_tournaments`].
#[derive(Debug, Clone, Copy)]
pub struct TournamentFilter {
    pub limit: i64,
    pub offset: i64,
    pub difficulty: Option<Difficulty>,
}

// id, title, description, difficulty, max_participants, created_at, creator username
type TournamentRow = (
    i32,
    String,
    String,
    String,
    Option<i32>,
    DateTime<Utc>,
    Option<String>,
);

/// Tournament header without levels or languages.
pub struct TournamentHeader {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub max_participants: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub created_by_username: Option<String>,
}

impl From<TournamentRow> for TournamentHeader {
    fn from(row: TournamentRow) -> Self {
        let (id, title, description, difficulty, max_participants, created_at, creator) = row;
        TournamentHeader {
            id,
            title,
            description,
            difficulty,
            max_participants,
            created_at,
            created_by_username: creator,
        }
    }
}

/// Newest first, with level and participant counts for the returned page.
/// Returns the page and the total number of tournaments matching the filter.
pub fn list_tournaments(
    conn: &mut PgConnection,
    filter: TournamentFilter,
) -> QueryResult<(Vec<TournamentSummary>, i64)> {
    let mut total_query = t_dsl::tournaments.into_boxed();
    let mut page_query = t_dsl::tournaments.left_join(users_dsl::users).into_boxed();
    if let Some(difficulty) = filter.difficulty {
        total_query = total_query.filter(t_dsl::difficulty.eq(difficulty.as_str()));
        page_query = page_query.filter(t_dsl::difficulty.eq(difficulty.as_str()));
    }

    let total = total_query.count().get_result::<i64>(conn)?;
    let rows = page_query
        .order((t_dsl::created_at.desc(), t_dsl::id.desc()))
        .limit(filter.limit)
        .offset(filter.offset)
        .select((
            t_dsl::id,
            t_dsl::title,
            t_dsl::description,
            t_dsl::difficulty,
            t_dsl::max_participants,
            t_dsl::created_at,
            users_dsl::username.nullable(),
        ))
        .load::<TournamentRow>(conn)?;

    let ids: Vec<i32> = rows.iter().map(|row| row.0).collect();

    let level_counts: HashMap<i32, i64> = levels_dsl::tournament_levels
        .filter(levels_dsl::tournament_id.eq_any(ids.clone()))
        .group_by(levels_dsl::tournament_id)
        .select((levels_dsl::tournament_id, count(levels_dsl::id)))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect();

    let participant_counts: HashMap<i32, i64> = completions_dsl::tournament_completions
        .filter(completions_dsl::tournament_id.eq_any(ids))
        .group_by(completions_dsl::tournament_id)
        .select((completions_dsl::tournament_id, count(completions_dsl::id)))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect();

    let summaries = rows
        .into_iter()
        .map(TournamentHeader::from)
        .map(|header| TournamentSummary {
            level_count: level_counts.get(&header.id).copied().unwrap_or(0),
            participant_count: participant_counts.get(&header.id).copied().unwrap_or(0),
            id: header.id,
            title: header.title,
            description: header.description,
            difficulty: header.difficulty,
            max_participants: header.max_participants,
            created_at: header.created_at,
            created_by_username: header.created_by_username,
        })
        .collect();

    Ok((summaries, total))
}

pub fn find_tournament(
    conn: &mut PgConnection,
    tournament_id: i32,
) -> QueryResult<Option<TournamentHeader>> {
    t_dsl::tournaments
        .left_join(users_dsl::users)
        .filter(t_dsl::id.eq(tournament_id))
        .select((
            t_dsl::id,
            t_dsl::title,
            t_dsl::description,
            t_dsl::difficulty,
            t_dsl::max_participants,
            t_dsl::created_at,
            users_dsl::username.nullable(),
        ))
        .first::<TournamentRow>(conn)
        .optional()
        .map(|row| row.map(TournamentHeader::from))
}

pub fn tournament_exists(conn: &mut PgConnection, tournament_id: i32) -> QueryResult<bool> {
    select(exists(t_dsl::tournaments.find(tournament_id))).get_result(conn)
}

pub fn find_level(
    conn: &mut PgConnection,
    tournament_id: i32,
    level_number: i32,
) -> QueryResult<Option<Level>> {
    levels_dsl::tournament_levels
        .filter(levels_dsl::tournament_id.eq(tournament_id))
        .filter(levels_dsl::level_number.eq(level_number))
        .select(Level::as_select())
        .first(conn)
        .optional()
}

/// Levels in order, each flagged with whether `user_id` has passed it.
pub fn levels_with_progress(
    conn: &mut PgConnection,
    tournament_id: i32,
    user_id: Option<i32>,
) -> QueryResult<Vec<LevelView>> {
    let levels = levels_dsl::tournament_levels
        .filter(levels_dsl::tournament_id.eq(tournament_id))
        .order(levels_dsl::level_number.asc())
        .select(Level::as_select())
        .load(conn)?;

    let passed: HashSet<i32> = match user_id {
        Some(user_id) => sub_dsl::tournament_submissions
            .filter(sub_dsl::tournament_id.eq(tournament_id))
            .filter(sub_dsl::user_id.eq(user_id))
            .filter(sub_dsl::passed.eq(true))
            .select(sub_dsl::level_id)
            .distinct()
            .load::<i32>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    Ok(levels
        .into_iter()
        .map(|level| LevelView {
            completed: passed.contains(&level.id),
            id: level.id,
            level_number: level.level_number,
            expected_output: level.expected_output,
            required_keywords: level.required_keywords,
            points: level.points,
        })
        .collect())
}

/// The level a user should attempt next: the first level after the highest
/// one passed, or the first level when nothing has been passed yet.
pub fn next_open_level(levels: &[LevelView]) -> Option<i32> {
    let highest_passed = levels
        .iter()
        .filter(|level| level.completed)
        .map(|level| level.level_number)
        .max();

    levels
        .iter()
        .map(|level| level.level_number)
        .filter(|number| highest_passed.is_none_or(|highest| *number > highest))
        .min()
}

pub fn languages_for(conn: &mut PgConnection, tournament_id: i32) -> QueryResult<Vec<LanguageEntry>> {
    tl_dsl::tournament_languages
        .inner_join(pl_dsl::programming_languages.on(pl_dsl::code.eq(tl_dsl::language_code)))
        .filter(tl_dsl::tournament_id.eq(tournament_id))
        .order(pl_dsl::name.asc())
        .select((pl_dsl::name, pl_dsl::code))
        .load::<LanguageEntry>(conn)
}

/// A tournament without a language list accepts every supported language.
pub fn tournament_allows(
    conn: &mut PgConnection,
    tournament_id: i32,
    language_code: &str,
) -> QueryResult<bool> {
    let allowed = tl_dsl::tournament_languages
        .filter(tl_dsl::tournament_id.eq(tournament_id))
        .select(tl_dsl::language_code)
        .load::<String>(conn)?;

    Ok(allowed.is_empty()
        || allowed
            .iter()
            .any(|code| code.eq_ignore_ascii_case(language_code)))
}

pub fn list_languages(conn: &mut PgConnection) -> QueryResult<Vec<LanguageEntry>> {
    pl_dsl::programming_languages
        .order(pl_dsl::name.asc())
        .select((pl_dsl::name, pl_dsl::code))
        .load::<LanguageEntry>(conn)
}

/// Inserts a tournament with its languages and levels. Expects a validated
/// payload and an enclosing transaction.
pub fn create_tournament(
    conn: &mut PgConnection,
    creator_id: i32,
    payload: CreateTournamentPayload,
) -> QueryResult<i32> {
    let tournament_id = diesel::insert_into(t_dsl::tournaments)
        .values(&NewTournament {
            title: payload.title.trim().to_string(),
            description: payload.description,
            difficulty: payload.difficulty.as_str().to_string(),
            max_participants: payload.max_participants,
            created_by: Some(creator_id),
        })
        .returning(t_dsl::id)
        .get_result::<i32>(conn)?;

    let languages: Vec<NewTournamentLanguage> = payload
        .languages
        .into_iter()
        .map(|language_code| NewTournamentLanguage {
            tournament_id,
            language_code,
        })
        .collect();
    diesel::insert_into(tl_dsl::tournament_languages)
        .values(&languages)
        .execute(conn)?;

    let levels: Vec<NewLevel> = payload
        .levels
        .into_iter()
        .map(|level| NewLevel {
            tournament_id,
            level_number: level.level_number,
            expected_output: level.expected_output,
            required_keywords: level.required_keywords,
            points: level.points,
        })
        .collect();
    diesel::insert_into(levels_dsl::tournament_levels)
        .values(&levels)
        .execute(conn)?;

    Ok(tournament_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(level_number: i32, completed: bool) -> LevelView {
        LevelView {
            id: level_number * 10,
            level_number,
            expected_output: String::new(),
            required_keywords: Vec::new(),
            points: 0,
            completed,
        }
    }

    #[test]
    fn next_open_level_starts_at_first_level() {
        let levels = [level(1, false), level(2, false)];
        assert_eq!(next_open_level(&levels), Some(1));
    }

    #[test]
    fn next_open_level_follows_highest_passed() {
        let levels = [level(1, true), level(2, false), level(3, false)];
        assert_eq!(next_open_level(&levels), Some(2));

        let gaps = [level(1, true), level(5, false), level(9, false)];
        assert_eq!(next_open_level(&gaps), Some(5));
    }

    #[test]
    fn next_open_level_is_none_when_cleared() {
        let levels = [level(1, true), level(2, true)];
        assert_eq!(next_open_level(&levels), None);
        assert_eq!(next_open_level(&[]), None);
    }
}
