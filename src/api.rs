use crate::config::ApiContext;
use crate::model::{Job, Pipeline, Stage};
use crate::status::JobStatus;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10 MB

/// Errors from the remote client facade. All calls are single-attempt; the
/// caller decides whether to re-trigger.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Project '{0}' not found (check project path and token scope)")]
    NotFound(String),
    #[error("No pipelines found for ref '{0}'")]
    NoPipelines(String),
    #[error("GitLab request failed: {0}")]
    Transport(String),
    #[error("Unexpected GitLab response: {0}")]
    Protocol(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

const PIPELINE_QUERY: &str = r"
query($fullPath: ID!, $ref: String!) {
  project(fullPath: $fullPath) {
    pipelines(ref: $ref, first: 1) {
      nodes {
        id
        iid
        status
        createdAt
        stages {
          nodes {
            name
            status
            jobs {
              nodes {
                id
                name
                status
                webPath
              }
            }
          }
        }
      }
    }
  }
}
";

/// Thin client over the GitLab GraphQL (pipeline tree) and REST (logs,
/// cancel/retry) APIs for a single project.
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    project_path: String,
    encoded_project: String,
}

impl GitLabClient {
    pub fn new(ctx: &ApiContext) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: ctx.base_url.trim_end_matches('/').to_string(),
            token: ctx.token.clone(),
            project_path: ctx.project_path.clone(),
            encoded_project: ctx.project_path.replace('/', "%2F"),
        })
    }

    /// Latest pipeline for `git_ref`, with its full stage/job tree.
    pub async fn fetch_pipeline(&self, git_ref: &str) -> ApiResult<Pipeline> {
        let start = std::time::Instant::now();
        let body = serde_json::json!({
            "query": PIPELINE_QUERY,
            "variables": { "fullPath": self.project_path, "ref": git_ref },
        });
        let resp = self
            .http
            .post(format!("{}/api/graphql", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Protocol(format!(
                "GraphQL endpoint returned {status}"
            )));
        }
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            bytes = text.len(),
            "fetched pipeline"
        );
        decode_pipeline_response(&text, &self.project_path, git_ref)
    }

    /// Raw trace text for one job.
    pub async fn fetch_job_log(&self, job_id: u64) -> ApiResult<String> {
        let url = format!(
            "{}/api/v4/projects/{}/jobs/{}/trace",
            self.base_url, self.encoded_project, job_id
        );
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!("job {job_id} trace")));
        }
        if !status.is_success() {
            return Err(ApiError::Protocol(format!("trace endpoint returned {status}")));
        }
        if text.len() > MAX_RESPONSE_SIZE {
            return Err(ApiError::Protocol(format!(
                "Log too large ({:.1} MB, max {} MB)",
                text.len() as f64 / (1024.0 * 1024.0),
                MAX_RESPONSE_SIZE / (1024 * 1024)
            )));
        }
        Ok(text)
    }

    pub async fn cancel_job(&self, job_id: u64) -> ApiResult<()> {
        self.post_action(&format!("jobs/{job_id}/cancel")).await
    }

    pub async fn retry_job(&self, job_id: u64) -> ApiResult<()> {
        self.post_action(&format!("jobs/{job_id}/retry")).await
    }

    pub async fn cancel_pipeline(&self, pipeline_id: u64) -> ApiResult<()> {
        self.post_action(&format!("pipelines/{pipeline_id}/cancel"))
            .await
    }

    pub async fn retry_pipeline(&self, pipeline_id: u64) -> ApiResult<()> {
        self.post_action(&format!("pipelines/{pipeline_id}/retry"))
            .await
    }

    async fn post_action(&self, path: &str) -> ApiResult<()> {
        let start = std::time::Instant::now();
        let url = format!(
            "{}/api/v4/projects/{}/{}",
            self.base_url, self.encoded_project, path
        );
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = rest_error_message(&body).unwrap_or_else(|| status.to_string());
            return Err(ApiError::Protocol(format!("{path}: {detail}")));
        }
        tracing::debug!(path, elapsed_ms = start.elapsed().as_millis(), "action ok");
        Ok(())
    }
}

// -- GraphQL wire structs --
//
// Required fields are non-optional on purpose: a response missing them is a
// protocol error, not something to tolerate at every access site.

#[derive(Deserialize)]
struct GqlEnvelope {
    data: Option<GqlData>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Deserialize)]
struct GqlData {
    project: Option<GqlProject>,
}

#[derive(Deserialize)]
struct GqlProject {
    pipelines: GqlNodes<GqlPipeline>,
}

#[derive(Deserialize)]
struct GqlNodes<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<T>,
}

impl<T> Default for GqlNodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Deserialize)]
struct GqlPipeline {
    id: String,
    iid: String,
    status: JobStatus,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    stages: GqlNodes<GqlStage>,
}

#[derive(Deserialize)]
struct GqlStage {
    name: String,
    status: JobStatus,
    #[serde(default)]
    jobs: GqlNodes<GqlJob>,
}

#[derive(Deserialize)]
struct GqlJob {
    id: String,
    name: String,
    status: JobStatus,
    #[serde(rename = "webPath", default)]
    web_path: String,
}

/// Decodes a GraphQL pipeline response, failing closed on anything
/// malformed. Stage and job order is taken from the response untouched.
pub fn decode_pipeline_response(
    json: &str,
    project_path: &str,
    git_ref: &str,
) -> ApiResult<Pipeline> {
    if json.len() > MAX_RESPONSE_SIZE {
        return Err(ApiError::Protocol(format!(
            "Response too large ({:.1} MB, max {} MB)",
            json.len() as f64 / (1024.0 * 1024.0),
            MAX_RESPONSE_SIZE / (1024 * 1024)
        )));
    }
    let envelope: GqlEnvelope =
        serde_json::from_str(json).map_err(|e| ApiError::Protocol(e.to_string()))?;

    if let Some(err) = envelope.errors.first() {
        return Err(ApiError::Protocol(err.message.clone()));
    }
    let data = envelope
        .data
        .ok_or_else(|| ApiError::Protocol("empty response body".to_string()))?;
    let project = data
        .project
        .ok_or_else(|| ApiError::NotFound(project_path.to_string()))?;
    let pipeline = project
        .pipelines
        .nodes
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NoPipelines(git_ref.to_string()))?;

    let iid = pipeline
        .iid
        .parse::<u64>()
        .map_err(|_| ApiError::Protocol(format!("non-numeric pipeline iid '{}'", pipeline.iid)))?;

    let stages = pipeline
        .stages
        .nodes
        .into_iter()
        .map(|s| Stage {
            name: s.name,
            status: s.status,
            jobs: s
                .jobs
                .nodes
                .into_iter()
                .map(|j| Job {
                    id: j.id,
                    name: j.name,
                    status: j.status,
                    web_path: j.web_path,
                })
                .collect(),
        })
        .collect();

    Ok(Pipeline {
        id: pipeline.id,
        iid,
        status: pipeline.status,
        created_at: pipeline.created_at,
        stages,
    })
}

fn rest_error_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("message")
        .or_else(|| v.get("error"))
        .map(|m| match m {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RESPONSE: &str = r#"{
        "data": {
            "project": {
                "pipelines": {
                    "nodes": [{
                        "id": "gid://gitlab/Ci::Pipeline/1001",
                        "iid": "42",
                        "status": "RUNNING",
                        "createdAt": "2024-03-01T09:30:00Z",
                        "stages": {
                            "nodes": [
                                {
                                    "name": "build",
                                    "status": "SUCCESS",
                                    "jobs": {"nodes": [
                                        {"id": "gid://gitlab/Ci::Build/1", "name": "compile",
                                         "status": "SUCCESS", "webPath": "/g/p/-/jobs/1"}
                                    ]}
                                },
                                {
                                    "name": "test",
                                    "status": "RUNNING",
                                    "jobs": {"nodes": [
                                        {"id": "gid://gitlab/Ci::Build/2", "name": "unit",
                                         "status": "RUNNING", "webPath": "/g/p/-/jobs/2"},
                                        {"id": "gid://gitlab/Ci::Build/3", "name": "lint",
                                         "status": "PENDING", "webPath": "/g/p/-/jobs/3"}
                                    ]}
                                }
                            ]
                        }
                    }]
                }
            }
        }
    }"#;

    #[test]
    fn decode_full_pipeline() {
        let p = decode_pipeline_response(FULL_RESPONSE, "g/p", "main").unwrap();
        assert_eq!(p.iid, 42);
        assert_eq!(p.status, JobStatus::Running);
        assert_eq!(p.numeric_id(), Some(1001));
        assert_eq!(p.stages.len(), 2);
        assert_eq!(p.stages[0].name, "build");
        assert_eq!(p.stages[1].name, "test");
        assert_eq!(p.stages[1].jobs.len(), 2);
        // Job order preserved as returned
        assert_eq!(p.stages[1].jobs[0].name, "unit");
        assert_eq!(p.stages[1].jobs[1].name, "lint");
        assert_eq!(p.stages[1].jobs[1].numeric_id(), Some(3));
    }

    #[test]
    fn decode_null_project_is_not_found() {
        let json = r#"{"data": {"project": null}}"#;
        let err = decode_pipeline_response(json, "g/p", "main").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "{err}");
    }

    #[test]
    fn decode_empty_nodes_is_no_pipelines() {
        let json = r#"{"data": {"project": {"pipelines": {"nodes": []}}}}"#;
        let err = decode_pipeline_response(json, "g/p", "main").unwrap_err();
        assert!(matches!(err, ApiError::NoPipelines(_)), "{err}");
        assert!(err.to_string().contains("main"));
    }

    #[test]
    fn decode_graphql_errors_win() {
        let json = r#"{"data": null, "errors": [{"message": "ref is invalid"}]}"#;
        let err = decode_pipeline_response(json, "g/p", "main").unwrap_err();
        assert!(matches!(err, ApiError::Protocol(_)));
        assert!(err.to_string().contains("ref is invalid"));
    }

    #[test]
    fn decode_missing_required_field_fails_closed() {
        // pipeline node without a status
        let json = r#"{"data": {"project": {"pipelines": {"nodes": [
            {"id": "gid://gitlab/Ci::Pipeline/1", "iid": "1",
             "createdAt": "2024-03-01T09:30:00Z"}
        ]}}}}"#;
        let err = decode_pipeline_response(json, "g/p", "main").unwrap_err();
        assert!(matches!(err, ApiError::Protocol(_)));
    }

    #[test]
    fn decode_non_numeric_iid_fails() {
        let json = r#"{"data": {"project": {"pipelines": {"nodes": [
            {"id": "x", "iid": "abc", "status": "SUCCESS",
             "createdAt": "2024-03-01T09:30:00Z"}
        ]}}}}"#;
        let err = decode_pipeline_response(json, "g/p", "main").unwrap_err();
        assert!(err.to_string().contains("iid"));
    }

    #[test]
    fn decode_pipeline_without_stages() {
        let json = r#"{"data": {"project": {"pipelines": {"nodes": [
            {"id": "gid://gitlab/Ci::Pipeline/1", "iid": "7", "status": "CREATED",
             "createdAt": "2024-03-01T09:30:00Z"}
        ]}}}}"#;
        let p = decode_pipeline_response(json, "g/p", "main").unwrap();
        assert!(p.stages.is_empty());
    }

    #[test]
    fn decode_invalid_json_is_protocol_error() {
        let err = decode_pipeline_response("not json", "g/p", "main").unwrap_err();
        assert!(matches!(err, ApiError::Protocol(_)));
    }

    #[test]
    fn decode_rejects_oversized_response() {
        let huge = "x".repeat(11 * 1024 * 1024);
        let err = decode_pipeline_response(&huge, "g/p", "main").unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn rest_error_message_extracts_message() {
        assert_eq!(
            rest_error_message(r#"{"message": "403 Forbidden"}"#),
            Some("403 Forbidden".to_string())
        );
        assert_eq!(
            rest_error_message(r#"{"error": "insufficient_scope"}"#),
            Some("insufficient_scope".to_string())
        );
        assert_eq!(rest_error_message("plain text"), None);
    }
}
