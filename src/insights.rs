use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::stats::BoxStats;

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildInsights {
    pub repository: String,
    pub input: PathBuf,
    pub collected_at: DateTime<Utc>,
    pub total_builds: usize,
    /// Keyed by series label, in the order the plots were drawn.
    pub series: IndexMap<String, SeriesSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub title: String,
    pub image: PathBuf,
    pub stats: BoxStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HarvestReport {
    pub provider: String,
    pub slug: String,
    pub collected_at: DateTime<Utc>,
    pub builds_fetched: usize,
    pub builds_written: usize,
    pub json_file: PathBuf,
    pub csv_file: PathBuf,
}
