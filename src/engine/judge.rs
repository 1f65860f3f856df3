//! Client for the external code-execution service (Judge0 API).

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

const STATUS_IN_QUEUE: i32 = 1;
const STATUS_PROCESSING: i32 = 2;
const STATUS_ACCEPTED: i32 = 3;

/// Languages the judge is configured to run, keyed by the code clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    CSharp,
    Haskell,
    Lisp,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::CSharp,
        Language::Haskell,
        Language::Lisp,
    ];

    /// Resolves a client language code, ignoring ASCII case.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(code))
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::CSharp => "csharp",
            Language::Haskell => "haskell",
            Language::Lisp => "lisp",
        }
    }

    /// Judge0 language id.
    pub fn judge_id(self) -> i32 {
        match self {
            Language::Python => 71,  // Python 3.8.1
            Language::CSharp => 51,  // C# Mono 6.6.0.161
            Language::Haskell => 21, // GHC 8.8.1
            Language::Lisp => 55,    // SBCL 2.0.0
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JudgeError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// Runs source code and returns its captured standard output.
///
/// Implementations may take several seconds; the returned future can be
/// dropped at any await point to abandon the run.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn execute(&self, language_code: &str, source_code: &str) -> Result<String, JudgeError>;
}

/// Runs `judge` but gives up once `deadline` has passed, dropping the
/// in-flight run.
pub async fn execute_within(
    judge: &dyn Judge,
    deadline: Duration,
    language_code: &str,
    source_code: &str,
) -> Result<String, JudgeError> {
    tokio::time::timeout(deadline, judge.execute(language_code, source_code))
        .await
        .unwrap_or_else(|_| {
            warn!("Judge did not answer within {:?}", deadline);
            Err(JudgeError::ExecutionFailed(format!(
                "Execution did not finish within {} seconds",
                deadline.as_secs_f64()
            )))
        })
}

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub request_timeout: Duration,
}

pub struct Judge0Client {
    config: JudgeConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CreateSubmission<'a> {
    source_code: &'a str,
    language_id: i32,
    stdin: &'a str,
}

#[derive(Deserialize)]
struct SubmissionToken {
    token: String,
}

#[derive(Deserialize, Debug)]
struct SubmissionStatus {
    id: i32,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SubmissionState {
    status: SubmissionStatus,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
}

impl SubmissionState {
    fn is_pending(&self) -> bool {
        matches!(self.status.id, STATUS_IN_QUEUE | STATUS_PROCESSING)
    }

    fn diagnostic(self, polls: u32) -> String {
        let non_empty = |text: Option<String>| text.filter(|t| !t.trim().is_empty());

        if let Some(compile_output) = non_empty(self.compile_output) {
            return compile_output;
        }
        if let Some(stderr) = non_empty(self.stderr) {
            return stderr;
        }
        if matches!(self.status.id, STATUS_IN_QUEUE | STATUS_PROCESSING) {
            return format!("Execution did not finish after {} status checks", polls);
        }
        non_empty(self.status.description).unwrap_or_else(|| "Execution failed".to_string())
    }
}

fn transport_error(err: reqwest::Error) -> JudgeError {
    warn!("Judge request failed: {:?}", err);
    JudgeError::ExecutionFailed(format!("judge request failed: {}", err))
}

impl Judge0Client {
    pub fn new(config: JudgeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    fn with_credentials(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.config.api_key {
            Some(key) => request.header("X-RapidAPI-Key", key),
            None => request,
        };
        match &self.config.api_host {
            Some(host) => request.header("X-RapidAPI-Host", host),
            None => request,
        }
    }

    async fn create_submission(
        &self,
        language: Language,
        source_code: &str,
    ) -> Result<String, JudgeError> {
        let body = CreateSubmission {
            source_code,
            language_id: language.judge_id(),
            stdin: "",
        };

        let created: SubmissionToken = self
            .with_credentials(self.client.post(self.endpoint("submissions")))
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(created.token)
    }

    async fn fetch_submission(&self, token: &str) -> Result<SubmissionState, JudgeError> {
        self.with_credentials(
            self.client
                .get(self.endpoint(&format!("submissions/{}", token))),
        )
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(transport_error)?
        .json()
        .await
        .map_err(transport_error)
    }
}

#[async_trait]
impl Judge for Judge0Client {
    async fn execute(&self, language_code: &str, source_code: &str) -> Result<String, JudgeError> {
        let language = Language::from_code(language_code)
            .ok_or_else(|| JudgeError::UnsupportedLanguage(language_code.to_string()))?;

        let token = self.create_submission(language, source_code).await?;
        info!(
            "Judge submission {} created for language {}",
            token,
            language.code()
        );

        let mut last_state = None;
        let mut polls = 0;
        while polls < self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;
            polls += 1;

            let state = self.fetch_submission(&token).await?;
            debug!(
                "Judge submission {} poll {}: status {}",
                token, polls, state.status.id
            );
            let pending = state.is_pending();
            last_state = Some(state);
            if !pending {
                break;
            }
        }

        let state = last_state.ok_or_else(|| {
            JudgeError::ExecutionFailed("judge was not polled for a result".to_string())
        })?;

        if state.status.id != STATUS_ACCEPTED {
            info!(
                "Judge submission {} finished with status {}",
                token, state.status.id
            );
            return Err(JudgeError::ExecutionFailed(state.diagnostic(polls)));
        }

        Ok(state.stdout.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: i32, stderr: Option<&str>, compile_output: Option<&str>) -> SubmissionState {
        SubmissionState {
            status: SubmissionStatus {
                id,
                description: Some("Runtime Error (NZEC)".to_string()),
            },
            stdout: None,
            stderr: stderr.map(str::to_string),
            compile_output: compile_output.map(str::to_string),
        }
    }

    struct SlowJudge(Duration);

    #[async_trait]
    impl Judge for SlowJudge {
        async fn execute(&self, _language_code: &str, _source_code: &str) -> Result<String, JudgeError> {
            tokio::time::sleep(self.0).await;
            Ok("late".to_string())
        }
    }

    #[tokio::test]
    async fn execute_within_gives_up_after_deadline() {
        let judge = SlowJudge(Duration::from_secs(5));
        let result =
            execute_within(&judge, Duration::from_millis(20), "python", "print(1)").await;
        match result {
            Err(JudgeError::ExecutionFailed(message)) => {
                assert!(message.contains("did not finish within"), "{}", message)
            }
            other => panic!("expected execution failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn execute_within_passes_through_fast_results() {
        let judge = SlowJudge(Duration::from_millis(1));
        let result = execute_within(&judge, Duration::from_secs(5), "python", "print(1)").await;
        assert_eq!(result, Ok("late".to_string()));
    }

    #[test]
    fn language_codes_are_case_insensitive() {
        assert_eq!(Language::from_code("Python"), Some(Language::Python));
        assert_eq!(Language::from_code("CSHARP"), Some(Language::CSharp));
        assert_eq!(Language::from_code("rust"), None);
        assert_eq!(Language::Haskell.judge_id(), 21);
    }

    #[test]
    fn diagnostic_prefers_compile_output_then_stderr() {
        assert_eq!(
            state(6, Some("trace"), Some("syntax error")).diagnostic(1),
            "syntax error"
        );
        assert_eq!(state(11, Some("trace"), Some("")).diagnostic(1), "trace");
        assert_eq!(state(11, None, None).diagnostic(1), "Runtime Error (NZEC)");
        assert_eq!(
            state(2, None, None).diagnostic(10),
            "Execution did not finish after 10 status checks"
        );
    }
}
