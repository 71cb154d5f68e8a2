use crate::status::JobStatus;
use chrono::{DateTime, Utc};

/// One execution of the CI system for a commit/branch reference.
///
/// Replaced wholesale by every successful fetch; never mutated in place.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// GraphQL global id, e.g. `gid://gitlab/Ci::Pipeline/123456`.
    pub id: String,
    /// Display-only sequence number within the project.
    pub iid: u64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Stage order as returned by the API is execution order; preserved
    /// exactly.
    pub stages: Vec<Stage>,
}

/// A named phase of a pipeline containing an ordered set of jobs.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub status: JobStatus,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone)]
pub struct Job {
    /// GraphQL global id, e.g. `gid://gitlab/Ci::Build/456`.
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub web_path: String,
}

impl Pipeline {
    /// Numeric id for REST calls, extracted from the GID.
    pub fn numeric_id(&self) -> Option<u64> {
        gid_number(&self.id)
    }
}

impl Job {
    pub fn numeric_id(&self) -> Option<u64> {
        gid_number(&self.id)
    }
}

/// Extracts the trailing numeric id from a GitLab global id string
/// (`gid://gitlab/Ci::Build/456` → 456). Also accepts a bare number.
pub fn gid_number(gid: &str) -> Option<u64> {
    gid.rsplit('/').next().and_then(|tail| tail.parse().ok())
}
