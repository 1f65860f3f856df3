use super::helper;
use crate::auth::{AuthUser, TeacherUser};
use crate::engine::catalog::{self, TournamentFilter};
use crate::engine::judge::{self, Language};
use crate::engine::leaderboard::{self, LEADERBOARD_LIMIT};
use crate::engine::{completion, gate, progression, verdict};
use crate::errors::AppError;
use crate::model::tournament::{
    LanguageEntry, SubmissionResult, TournamentDetail, TournamentDetailResponse, TournamentList,
};
use crate::payloads::tournament::{
    CompleteTournamentPayload, CreateTournamentPayload, DEFAULT_PAGE_SIZE, ListTournamentsParams,
    MAX_PAGE_SIZE, SubmitSolutionPayload,
};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, error, info, instrument, warn};

/// Lists tournaments, newest first.
///
/// Query Parameters:
/// * `limit`: page size, 1..=100 (default 10).
/// * `offset`: rows to skip (default 0).
/// * `difficulty`: optional `Easy`, `Medium` or `Hard`.
///
/// Returns (wrapped in `ApiResponse`)
/// * `TournamentList`: total count and the requested page (200 OK).
/// * `400 Bad Request`: If `limit` or `offset` is out of range.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(state))]
pub async fn list_tournaments(
    State(state): State<AppState>,
    Query(params): Query<ListTournamentsParams>,
) -> Result<ApiResponse<TournamentList>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err(AppError::BadRequest(
            "offset must not be negative".to_string(),
        ));
    }

    let filter = TournamentFilter {
        limit,
        offset,
        difficulty: params.difficulty,
    };
    let (tournaments, total) =
        helper::run_query(&state.pool, move |conn| catalog::list_tournaments(conn, filter))
            .await?;

    info!(
        "Fetched {} of {} tournaments (offset {})",
        tournaments.len(),
        total,
        offset
    );
    Ok(ApiResponse::ok(TournamentList { total, tournaments }))
}

/// Queries the catalog of programming languages tournaments can enable.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<LanguageEntry>`: name and code of each language, by name (200 OK).
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(state))]
pub async fn list_languages(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<LanguageEntry>>, AppError> {
    let languages = helper::run_query(&state.pool, catalog::list_languages).await?;
    Ok(ApiResponse::ok(languages))
}

/// Queries a tournament with its levels, languages and leaderboard.
///
/// Authentication is optional. Authenticated callers get per-level
/// `completed` flags and a `nextLevelNumber` based on their own progress.
///
/// Returns (wrapped in `ApiResponse`)
/// * `TournamentDetailResponse` (200 OK).
/// * `401 Unauthorized`: If a token is sent but cannot be verified.
/// * `404 Not Found`: If the tournament does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(state, user))]
pub async fn get_tournament(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(tournament_id): Path<i32>,
) -> Result<ApiResponse<TournamentDetailResponse>, AppError> {
    let user_id = user.map(|user| user.user_id);
    debug!(
        "Fetching tournament {} for user {:?}",
        tournament_id, user_id
    );

    let detail = helper::run_query(&state.pool, move |conn| {
        let Some(header) = catalog::find_tournament(conn, tournament_id)? else {
            return Ok(None);
        };
        let levels = catalog::levels_with_progress(conn, tournament_id, user_id)?;
        let languages = catalog::languages_for(conn, tournament_id)?;
        let leaderboard = leaderboard::build_leaderboard(conn, tournament_id, LEADERBOARD_LIMIT)?;
        let next_level_number = catalog::next_open_level(&levels);

        Ok(Some(TournamentDetailResponse {
            tournament: TournamentDetail {
                id: header.id,
                title: header.title,
                description: header.description,
                difficulty: header.difficulty,
                max_participants: header.max_participants,
                created_at: header.created_at,
                created_by_username: header.created_by_username,
                levels,
                languages,
            },
            leaderboard,
            next_level_number,
        }))
    })
    .await?;

    match detail {
        Some(detail) => Ok(ApiResponse::ok(detail)),
        None => {
            warn!("Tournament {} not found", tournament_id);
            Err(AppError::NotFound(format!(
                "Tournament with ID {} not found",
                tournament_id
            )))
        }
    }
}

/// Creates a tournament with its languages and levels. Teacher role only.
///
/// Request Body: `CreateTournamentPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i32`: The new tournament ID (201 Created).
/// * `400 Bad Request`: If the payload fails validation.
/// * `401 Unauthorized` / `403 Forbidden`: Missing token or non-teacher caller.
/// * `404 Not Found`: If the creating user does not exist.
/// * `409 Conflict`: If a uniqueness constraint is violated.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(state, teacher, payload), fields(user_id = teacher.0.user_id))]
pub async fn create_tournament(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Json(payload): Json<CreateTournamentPayload>,
) -> Result<ApiResponse<i32>, AppError> {
    let TeacherUser(user) = teacher;
    let payload = payload.validate().map_err(|reason| {
        warn!("Rejected tournament payload: {}", reason);
        AppError::BadRequest(reason)
    })?;
    debug!("Create tournament payload: {:?}", payload);

    let creator_id = user.user_id;
    let conn = state.pool.get().await?;
    let created = conn
        .interact(move |conn_sync| {
            conn_sync.transaction::<_, DieselError, _>(|transaction_conn| {
                catalog::create_tournament(transaction_conn, creator_id, payload)
            })
        })
        .await?;

    match created {
        Ok(tournament_id) => {
            info!(
                "Tournament {} created by user {}",
                tournament_id, creator_id
            );
            Ok(ApiResponse::created(tournament_id))
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info)) => {
            error!(
                "Foreign key violation while creating tournament: {}",
                info.message()
            );
            Err(AppError::NotFound(format!(
                "User with ID {} or a referenced language not found.",
                creator_id
            )))
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
            error!(
                "Unique violation while creating tournament: {}",
                info.message()
            );
            Err(AppError::Conflict(
                "Tournament levels or languages are duplicated.".to_string(),
            ))
        }
        Err(e) => Err(AppError::from(e)),
    }
}

/// Runs a solution for one level through the judge and records the attempt.
///
/// Request Body: `SubmitSolutionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `SubmissionResult`: verdict, judge output, points credited and progression (200 OK).
/// * `400 Bad Request`: If the language is unsupported or not enabled for the tournament.
/// * `401 Unauthorized`: If no valid token is sent.
/// * `403 Forbidden`: If the previous level has not been passed yet.
/// * `404 Not Found`: If the tournament, level or user does not exist.
/// * `422 Unprocessable Entity`: If the code failed to compile or run; carries the diagnostic.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(state, user, payload), fields(user_id = user.user_id))]
pub async fn submit_solution(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tournament_id): Path<i32>,
    Json(payload): Json<SubmitSolutionPayload>,
) -> Result<ApiResponse<SubmissionResult>, AppError> {
    let user_id = user.user_id;
    let level_number = payload.level_id;
    info!(
        "Submission by user {} for level {} of tournament {}",
        user_id, level_number, tournament_id
    );

    let language = Language::from_code(&payload.language_code)
        .ok_or_else(|| AppError::UnsupportedLanguage(payload.language_code.clone()))?;

    let (level, allowed, eligible) = helper::run_query(&state.pool, move |conn| {
        let Some(level) = catalog::find_level(conn, tournament_id, level_number)? else {
            return Ok((None, false, false));
        };
        let allowed = catalog::tournament_allows(conn, tournament_id, language.code())?;
        let eligible = gate::can_attempt(conn, user_id, tournament_id, level_number)?;
        Ok((Some(level), allowed, eligible))
    })
    .await?;

    let level = level.ok_or_else(|| {
        warn!(
            "Level {} of tournament {} not found",
            level_number, tournament_id
        );
        AppError::NotFound(format!(
            "Level {} of tournament {} not found",
            level_number, tournament_id
        ))
    })?;
    if !allowed {
        return Err(AppError::UnsupportedLanguage(format!(
            "{} is not enabled for tournament {}",
            language.code(),
            tournament_id
        )));
    }
    if !eligible {
        info!(
            "User {} tried level {} before passing level {}",
            user_id,
            level_number,
            level_number - 1
        );
        return Err(AppError::PreconditionNotMet(format!(
            "Complete level {} first",
            level_number - 1
        )));
    }

    let output = judge::execute_within(
        state.judge.as_ref(),
        state.judge_deadline,
        language.code(),
        &payload.code,
    )
    .await?;
    let verdict = verdict::assess(
        &output,
        &level.expected_output,
        level.required_keywords.as_slice(),
        &payload.code,
    );
    let passed = verdict.passed();
    debug!("Verdict for user {}: {:?}", user_id, verdict);

    let policy = state.award_policy;
    let conn = state.pool.get().await?;
    let progress = conn
        .interact(move |conn_sync| {
            conn_sync.transaction::<_, DieselError, _>(|transaction_conn| {
                progression::record_submission(transaction_conn, user_id, &level, passed, policy)
            })
        })
        .await??;

    Ok(ApiResponse::ok(SubmissionResult {
        passed,
        output,
        points: progress.points_awarded,
        tournament_completed: progress.tournament_completed,
        next_level_number: progress.next_level_number,
        output_matches: verdict.output_matches,
        missing_keywords: verdict.missing_keywords,
    }))
}

/// Records the caller's finishing time for a tournament, replacing any
/// earlier time. Accepted only once every level has been passed.
///
/// Request Body: `CompleteTournamentPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `()`: Empty success response (200 OK).
/// * `400 Bad Request`: If `completion_time` is negative.
/// * `401 Unauthorized`: If no valid token is sent.
/// * `403 Forbidden`: If some level has not been passed yet.
/// * `404 Not Found`: If the tournament does not exist.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(state, user, payload), fields(user_id = user.user_id))]
pub async fn complete_tournament(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tournament_id): Path<i32>,
    Json(payload): Json<CompleteTournamentPayload>,
) -> Result<ApiResponse<()>, AppError> {
    let user_id = user.user_id;
    let completion_time = payload.completion_time;
    if completion_time < 0 {
        return Err(AppError::BadRequest(
            "completion_time must not be negative".to_string(),
        ));
    }

    let conn = state.pool.get().await?;
    let recorded: Result<(), AppError> = conn
        .interact(move |conn_sync| {
            conn_sync.transaction(|transaction_conn| {
                if !catalog::tournament_exists(transaction_conn, tournament_id)? {
                    return Err(AppError::NotFound(format!(
                        "Tournament with ID {} not found",
                        tournament_id
                    )));
                }
                if !completion::has_cleared(transaction_conn, user_id, tournament_id)? {
                    return Err(AppError::PreconditionNotMet(
                        "All levels must be passed before completing the tournament".to_string(),
                    ));
                }
                completion::record_completion(
                    transaction_conn,
                    user_id,
                    tournament_id,
                    completion_time,
                )?;
                Ok(())
            })
        })
        .await?;
    recorded?;

    info!(
        "User {} completed tournament {} in {}s",
        user_id, tournament_id, completion_time
    );
    Ok(ApiResponse::ok(()))
}
