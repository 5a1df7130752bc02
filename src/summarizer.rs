use std::path::Path;

use chrono::Utc;
use indexmap::IndexMap;
use log::{info, warn};

use crate::error::Result;
use crate::insights::{BuildInsights, SeriesSummary};
use crate::records::{load_records, DATA_FILE_NAME};
use crate::report::{chart_caption, render_box_plot, ImageFormat, PlotRequest};
use crate::transform::{BuildRecordSet, SeriesKind};

/// Load `<repository>/repo-data-travis.json`, derive both series and plot them.
pub fn summarize_repository(repository: &Path, format: ImageFormat) -> Result<BuildInsights> {
    format.ensure_supported()?;

    let input = repository.join(DATA_FILE_NAME);
    info!("Reading build history from: {}", input.display());

    let raw = load_records(&input)?;
    let builds = BuildRecordSet::from_raw(&raw)?;
    if let (Some(first), Some(last)) = (builds.records().first(), builds.records().last()) {
        info!(
            "Ordered {} builds started between {} and {} (last finished {})",
            builds.records().len(),
            first.started_at,
            last.started_at,
            last.finished_at
        );
    }

    let mut series = IndexMap::new();

    for derived in [builds.interval_series(), builds.duration_series()] {
        let label = derived.kind.label();
        let title = derived.kind.title();

        if derived.kind == SeriesKind::Duration {
            let dropped = builds.records().len() - derived.values.len();
            if dropped > 0 {
                warn!("Skipping {dropped} builds without a positive duration");
            }
        }

        let (image, stats) = render_box_plot(&PlotRequest {
            values: &derived.values,
            input: &input,
            label,
            title,
            format,
        })?;

        info!(
            "{title}: mean {:.2} min, min {:.2} min, max {:.2} min",
            stats.mean, stats.min, stats.max
        );

        series.insert(
            label.to_string(),
            SeriesSummary {
                title: title.to_string(),
                image,
                stats,
            },
        );
    }

    Ok(BuildInsights {
        repository: chart_caption(&input),
        input,
        collected_at: Utc::now(),
        total_builds: builds.records().len(),
        series,
    })
}
