use crate::schema::{
    tournament_completions, tournament_languages, tournament_levels, tournament_submissions,
    tournaments,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Queryable, Selectable, Deserialize, Serialize, Debug, Clone)]
#[diesel(table_name = tournament_levels)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Level {
    pub id: i32,
    pub tournament_id: i32,
    pub level_number: i32,
    pub expected_output: String,
    pub required_keywords: Vec<String>,
    pub points: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tournaments)]
pub struct NewTournament {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub max_participants: Option<i32>,
    pub created_by: Option<i32>,
    // created_at, updated_at have DB defaults
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tournament_languages)]
pub struct NewTournamentLanguage {
    pub tournament_id: i32,
    pub language_code: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tournament_levels)]
pub struct NewLevel {
    pub tournament_id: i32,
    pub level_number: i32,
    pub expected_output: String,
    pub required_keywords: Vec<String>,
    pub points: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tournament_submissions)]
pub struct NewSubmission {
    pub user_id: i32,
    pub tournament_id: i32,
    pub level_id: i32,
    pub passed: bool,
    // created_at has a DB default
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tournament_completions)]
pub struct NewCompletion {
    pub user_id: i32,
    pub tournament_id: i32,
    pub completion_time: i32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Queryable)]
pub struct LanguageEntry {
    pub name: String,
    pub code: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: i32,
    pub username: String,
    pub completion_time: i32,
    pub completed_levels: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TournamentSummary {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub max_participants: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub created_by_username: Option<String>,
    // calculated fields
    pub level_count: i64,
    pub participant_count: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TournamentList {
    pub total: i64,
    pub tournaments: Vec<TournamentSummary>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LevelView {
    pub id: i32,
    pub level_number: i32,
    pub expected_output: String,
    pub required_keywords: Vec<String>,
    pub points: i32,
    // false for anonymous viewers
    pub completed: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TournamentDetail {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub max_participants: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub created_by_username: Option<String>,
    pub levels: Vec<LevelView>,
    pub languages: Vec<LanguageEntry>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TournamentDetailResponse {
    pub tournament: TournamentDetail,
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(rename = "nextLevelNumber")]
    pub next_level_number: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SubmissionResult {
    pub passed: bool,
    pub output: String,
    pub points: i32,
    pub tournament_completed: bool,
    #[serde(rename = "nextLevelNumber")]
    pub next_level_number: Option<i32>,
    pub output_matches: bool,
    pub missing_keywords: Vec<String>,
}
