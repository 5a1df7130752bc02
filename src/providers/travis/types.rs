use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of `GET /repo/{slug}/builds`.
#[derive(Debug, Deserialize)]
pub struct BuildsPageDto {
    #[serde(rename = "@pagination")]
    pub pagination: PaginationDto,
    #[serde(default)]
    pub builds: Vec<BuildDto>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationDto {
    pub limit: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildDto {
    pub id: u64,
    pub number: Option<String>,
    pub state: Option<String>,
    pub duration: Option<i64>,
    pub event_type: Option<String>,
    pub pull_request_number: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub repository: Option<RepositoryDto>,
    pub branch: Option<BranchDto>,
    pub commit: Option<CommitDto>,
    #[serde(default)]
    pub jobs: Vec<JobDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryDto {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchDto {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDto {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobDto {
    pub id: u64,
}

/// A build as stored in `repo-data-travis.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestedBuild {
    pub repository_id: Option<u64>,
    pub build_id: u64,
    pub number: Option<String>,
    pub commit: Option<String>,
    pub pull_request: bool,
    pub pull_request_number: Option<u64>,
    pub branch: Option<String>,
    pub status: Option<String>,
    pub duration: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub jobs: Vec<u64>,
}

impl From<BuildDto> for HarvestedBuild {
    fn from(build: BuildDto) -> Self {
        Self {
            repository_id: build.repository.map(|r| r.id),
            build_id: build.id,
            number: build.number,
            commit: build.commit.map(|c| c.sha),
            pull_request: build.event_type.as_deref() == Some("pull_request"),
            pull_request_number: build.pull_request_number,
            branch: build.branch.map(|b| b.name),
            status: build.state,
            duration: build.duration,
            started_at: build.started_at,
            finished_at: build.finished_at,
            jobs: build.jobs.into_iter().map(|j| j.id).collect(),
        }
    }
}
