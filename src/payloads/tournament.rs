use crate::engine::judge::Language;
use crate::model::tournament::Difficulty;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ListTournamentsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub difficulty: Option<Difficulty>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SubmitSolutionPayload {
    /// Level number within the tournament.
    pub level_id: i32,
    pub code: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CompleteTournamentPayload {
    /// Elapsed seconds as measured by the client.
    pub completion_time: i32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LevelPayload {
    pub level_number: i32,
    pub expected_output: String,
    #[serde(default)]
    pub required_keywords: Vec<String>,
    #[serde(default)]
    pub points: i32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateTournamentPayload {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub max_participants: Option<i32>,
    pub languages: Vec<String>,
    pub levels: Vec<LevelPayload>,
}

impl CreateTournamentPayload {
    /// Checks the payload and normalizes language codes to their canonical form.
    pub fn validate(mut self) -> Result<Self, String> {
        let title_len = self.title.trim().chars().count();
        if !(3..=100).contains(&title_len) {
            return Err("Title must be between 3 and 100 characters".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Description is required".to_string());
        }
        if matches!(self.max_participants, Some(max) if max < 1) {
            return Err("max_participants must be positive when set".to_string());
        }

        if self.languages.is_empty() {
            return Err("At least one language is required".to_string());
        }
        let mut languages = Vec::with_capacity(self.languages.len());
        for code in &self.languages {
            let language =
                Language::from_code(code).ok_or_else(|| format!("Unsupported language: {}", code))?;
            if languages.contains(&language.code()) {
                return Err(format!("Language {} is listed more than once", code));
            }
            languages.push(language.code());
        }
        self.languages = languages.into_iter().map(str::to_string).collect();

        if self.levels.is_empty() {
            return Err("At least one level is required".to_string());
        }
        let mut seen = HashSet::new();
        for level in &self.levels {
            if level.level_number < 1 {
                return Err(format!(
                    "Level number {} must be at least 1",
                    level.level_number
                ));
            }
            if !seen.insert(level.level_number) {
                return Err(format!(
                    "Level number {} is used more than once",
                    level.level_number
                ));
            }
            if level.points < 0 {
                return Err(format!(
                    "Level {} cannot award negative points",
                    level.level_number
                ));
            }
        }
        let highest = self.levels.len() as i32;
        if let Some(gap) = (1..=highest).find(|number| !seen.contains(number)) {
            return Err(format!(
                "Level numbers must run from 1 to {} without gaps; level {} is missing",
                highest, gap
            ));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateTournamentPayload {
        CreateTournamentPayload {
            title: "Loops".to_string(),
            description: "Print things".to_string(),
            difficulty: Difficulty::Easy,
            max_participants: None,
            languages: vec!["Python".to_string(), "haskell".to_string()],
            levels: vec![
                LevelPayload {
                    level_number: 1,
                    expected_output: "Hello".to_string(),
                    required_keywords: vec!["print".to_string()],
                    points: 100,
                },
                LevelPayload {
                    level_number: 2,
                    expected_output: "0 1 2".to_string(),
                    required_keywords: vec!["for".to_string()],
                    points: 150,
                },
            ],
        }
    }

    #[test]
    fn valid_payload_normalizes_language_codes() {
        let validated = payload().validate().unwrap();
        assert_eq!(validated.languages, vec!["python", "haskell"]);
    }

    #[test]
    fn rejects_short_title() {
        let mut p = payload();
        p.title = "ab".to_string();
        assert!(p.validate().unwrap_err().contains("Title"));
    }

    #[test]
    fn rejects_unknown_and_duplicate_languages() {
        let mut p = payload();
        p.languages = vec!["cobol".to_string()];
        assert!(p.validate().unwrap_err().contains("Unsupported language"));

        let mut p = payload();
        p.languages = vec!["python".to_string(), "PYTHON".to_string()];
        assert!(p.validate().unwrap_err().contains("more than once"));
    }

    #[test]
    fn rejects_duplicate_or_non_positive_levels() {
        let mut p = payload();
        p.levels[1].level_number = 1;
        assert!(p.validate().unwrap_err().contains("used more than once"));

        let mut p = payload();
        p.levels[0].level_number = 0;
        assert!(p.validate().unwrap_err().contains("at least 1"));
    }

    #[test]
    fn rejects_gaps_in_level_numbers() {
        let mut p = payload();
        p.levels[1].level_number = 3;
        let reason = p.validate().unwrap_err();
        assert!(reason.contains("without gaps"), "{}", reason);
        assert!(reason.contains("level 2 is missing"), "{}", reason);
    }

    #[test]
    fn accepts_levels_listed_out_of_order() {
        let mut p = payload();
        p.levels.reverse();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_negative_points_and_empty_levels() {
        let mut p = payload();
        p.levels[0].points = -5;
        assert!(p.validate().unwrap_err().contains("negative"));

        let mut p = payload();
        p.levels.clear();
        assert!(p.validate().unwrap_err().contains("At least one level"));
    }
}
