//! Client for the grading backend.
//!
//! Submits the candidate's code with its test cases and returns the verdict.
//! One attempt per call; retry policy belongs to the caller, and in practice
//! the front-end just reports the failure to the candidate.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GraderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("grader returned status {0}")]
    BadStatus(u16),

    #[error("failed to build runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// One test case shipped with a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// Wire format of a submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub code: String,
    pub test_cases: Vec<TestCase>,
}

/// Overall verdict from the grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Success,
    CompileError,
    RuntimeError,
    Timeout,
    MemoryLimitExceeded,
    InternalError,
}

impl SubmissionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionStatus::Success)
    }
}

/// Per-test-case outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    #[serde(default)]
    pub test_case_id: Option<i64>,
    pub passed: bool,
    pub input: String,
    pub expected_output: String,
    pub actual_output: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub status: SubmissionStatus,
    #[serde(default)]
    pub results: Vec<TestCaseResult>,
    #[serde(default)]
    pub message: Option<String>,
    /// Compiler diagnostics on a COMPILE_ERROR verdict
    #[serde(default)]
    pub compiler_output: Option<String>,
}

/// Async client for the grading backend.
pub struct GraderClient {
    base_url: String,
    client: reqwest::Client,
}

impl GraderClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GraderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Submit code for grading. One attempt, no retry.
    pub async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionResult, GraderError> {
        let url = format!("{}/submissions", self.base_url);
        debug!(url = %url, test_cases = request.test_cases.len(), "submitting code");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GraderError::BadStatus(status.as_u16()));
        }

        let result: SubmissionResult = response.json().await?;
        info!(status = ?result.status, "submission graded");
        Ok(result)
    }
}

/// Blocking wrapper around [`GraderClient`] for synchronous callers.
pub struct BlockingGraderClient {
    inner: GraderClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingGraderClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GraderError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            inner: GraderClient::new(base_url)?,
            runtime,
        })
    }

    pub fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResult, GraderError> {
        self.runtime.block_on(self.inner.submit(request))
    }
}
