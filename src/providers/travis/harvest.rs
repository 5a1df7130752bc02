use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, info, warn};

use super::client::TravisClient;
use super::types::{BuildDto, HarvestedBuild};
use crate::auth::Token;
use crate::error::{BuildLensError, Result};
use crate::insights::HarvestReport;
use crate::records::DATA_FILE_NAME;

const CSV_FILE_NAME: &str = "repo-data-travis.csv";
const PAGE_SIZE: usize = 100;
const CONCURRENCY: usize = 10;

const CSV_HEADER: [&str; 12] = [
    "repository_id",
    "build_id",
    "number",
    "commit",
    "pull_request",
    "pull_request_number",
    "branch",
    "status",
    "duration",
    "started_at",
    "finished_at",
    "jobs",
];

pub struct TravisProvider {
    client: TravisClient,
    slug: String,
}

impl TravisProvider {
    pub fn new(base_url: &str, slug: String, token: Option<Token>) -> Result<Self> {
        let valid = slug
            .split_once('/')
            .is_some_and(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'));
        if !valid {
            return Err(BuildLensError::Config(format!(
                "Repository slug must look like owner/repo, got '{slug}'"
            )));
        }

        let client = TravisClient::new(base_url, token)?;

        Ok(Self { client, slug })
    }

    /// `<directory>/build_logs/<owner>@<repo>`
    pub fn repository_dir(&self, directory: &Path) -> PathBuf {
        directory
            .join("build_logs")
            .join(self.slug.replace('/', "@"))
    }

    /// Fetch up to `limit` builds (all when `None`), newest first.
    pub async fn fetch_builds(&self, limit: Option<usize>) -> Result<Vec<BuildDto>> {
        let first_page = self.client.fetch_builds_page(&self.slug, 0, PAGE_SIZE).await?;

        let available = first_page.pagination.count;
        let total = limit.map_or(available, |limit| limit.min(available));
        let step = first_page.pagination.limit.max(1);

        info!("Fetching {total} of {available} builds for {}...", self.slug);

        let mut builds = first_page.builds;
        let offsets: Vec<usize> = (builds.len().max(step)..total).step_by(step).collect();

        let pages: Vec<_> = stream::iter(offsets)
            .map(|offset| async move {
                self.client
                    .fetch_builds_page(&self.slug, offset, step)
                    .await
            })
            .buffered(CONCURRENCY)
            .try_collect()
            .await?;

        for page in pages {
            debug!("Received {} builds", page.builds.len());
            builds.extend(page.builds);
        }

        builds.truncate(total);
        info!("Fetched {} builds for {}", builds.len(), self.slug);

        Ok(builds)
    }

    /// Harvest the build history into `<directory>/build_logs/<owner>@<repo>/`.
    pub async fn harvest(
        &self,
        directory: &Path,
        until: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<HarvestReport> {
        let parent_dir = self.repository_dir(directory);
        fs::create_dir_all(&parent_dir)?;

        info!("[START] Harvesting Travis builds for {}", self.slug);

        let builds = self.fetch_builds(limit).await?;
        let builds_fetched = builds.len();
        let harvested = select_builds(builds, until);

        if harvested.is_empty() {
            return Err(BuildLensError::Api(format!(
                "Could not get any build information for {}",
                self.slug
            )));
        }

        let skipped = builds_fetched - harvested.len();
        if skipped > 0 {
            warn!("Skipped {skipped} unfinished, duplicate or out of range builds");
        }

        let json_file = parent_dir.join(DATA_FILE_NAME);
        fs::write(&json_file, serde_json::to_string_pretty(&harvested)?)?;

        let csv_file = parent_dir.join(CSV_FILE_NAME);
        fs::write(&csv_file, to_csv(&harvested))?;

        info!(
            "[FINISH] Harvested {} builds for {} into {}",
            harvested.len(),
            self.slug,
            parent_dir.display()
        );

        Ok(HarvestReport {
            provider: "Travis CI".to_string(),
            slug: self.slug.clone(),
            collected_at: Utc::now(),
            builds_fetched,
            builds_written: harvested.len(),
            json_file,
            csv_file,
        })
    }
}

/// Keep finished builds inside the date threshold, first occurrence of each id.
fn select_builds(builds: Vec<BuildDto>, until: Option<NaiveDate>) -> Vec<HarvestedBuild> {
    let mut seen = HashSet::new();

    builds
        .into_iter()
        .filter(|build| {
            let Some(finished_at) = build.finished_at else {
                debug!("Skipping unfinished build {}", build.id);
                return false;
            };
            let Some(until) = until else {
                return true;
            };
            let started_in_range = build
                .started_at
                .map_or(true, |started_at| started_at.date_naive() <= until);
            started_in_range && finished_at.date_naive() <= until
        })
        .filter(|build| seen.insert(build.id))
        .map(HarvestedBuild::from)
        .collect()
}

/// Render builds as CSV, highest build id first.
fn to_csv(builds: &[HarvestedBuild]) -> String {
    let mut sorted: Vec<&HarvestedBuild> = builds.iter().collect();
    sorted.sort_by(|a, b| b.build_id.cmp(&a.build_id));

    let mut csv = CSV_HEADER.join(",");
    csv.push('\n');

    for build in sorted {
        let jobs = build
            .jobs
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(";");

        let row = [
            optional(build.repository_id),
            build.build_id.to_string(),
            optional(build.number.as_deref()),
            optional(build.commit.as_deref()),
            build.pull_request.to_string(),
            optional(build.pull_request_number),
            optional(build.branch.as_deref()),
            optional(build.status.as_deref()),
            optional(build.duration),
            optional(build.started_at.map(|t| t.to_rfc3339())),
            optional(build.finished_at.map(|t| t.to_rfc3339())),
            jobs,
        ];

        let escaped: Vec<String> = row.iter().map(|field| escape_csv(field)).collect();
        csv.push_str(&escaped.join(","));
        csv.push('\n');
    }

    csv
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
