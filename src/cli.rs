use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::auth::Token;
use crate::providers::travis::TravisProvider;
use crate::report::ImageFormat;
use crate::summarizer::summarize_repository;

#[derive(Parser)]
#[command(name = "buildlens")]
#[command(author, version, about = "CI build distribution tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path for the JSON summary (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot build arrival intervals and durations of a repository
    Plot {
        /// Directory of the project to analyse (holds repo-data-travis.json)
        #[arg(short, long)]
        repository: PathBuf,

        /// Image format of the plots
        #[arg(short, long, value_enum, default_value_t = ImageFormat::Svg)]
        format: ImageFormat,
    },

    /// Harvest the build history of a repository from Travis CI
    Fetch {
        /// Repository slug (e.g., "owner/repo")
        #[arg(short, long)]
        slug: String,

        /// Directory under which build_logs/<owner>@<repo> is created
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Skip builds that started or finished after this date (YYYY-MM-DD)
        #[arg(short, long)]
        until: Option<NaiveDate>,

        /// Maximum number of builds to fetch (optional, defaults to all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Travis CI API URL
        #[arg(long, default_value = "https://api.travis-ci.com")]
        url: String,

        /// Travis CI API token (optional, required for private repositories)
        #[arg(short, long, env = "TRAVIS_TOKEN")]
        token: Option<String>,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Plot { repository, format } => {
                info!("Plotting build distributions for: {}", repository.display());

                let insights = summarize_repository(repository, *format)?;
                self.emit(&insights)
            }
            Commands::Fetch {
                slug,
                directory,
                until,
                limit,
                url,
                token,
            } => {
                info!("Harvesting Travis CI builds for repository: {slug}");

                let token = token.as_deref().map(Token::from);
                let provider = TravisProvider::new(url, slug.clone(), token)?;
                let report = provider.harvest(directory, *until, *limit).await?;
                self.emit(&report)
            }
        }
    }

    fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Summary written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{BuildInsights, HarvestReport};
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plot_requires_repository() {
        assert!(Cli::try_parse_from(["buildlens", "plot"]).is_err());
    }

    #[test]
    fn test_plot_defaults_to_svg() {
        let cli = Cli::try_parse_from(["buildlens", "plot", "-r", "build_logs/octo@widget"]).unwrap();

        match cli.command {
            Commands::Plot { repository, format } => {
                assert_eq!(repository, PathBuf::from("build_logs/octo@widget"));
                assert_eq!(format, ImageFormat::Svg);
            }
            Commands::Fetch { .. } => panic!("expected plot"),
        }
        assert!(!cli.pretty);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_plot_accepts_png_and_global_flags() {
        let cli = Cli::try_parse_from([
            "buildlens",
            "plot",
            "--repository",
            "repo",
            "--format",
            "png",
            "--pretty",
            "-o",
            "summary.json",
        ])
        .unwrap();

        assert!(cli.pretty);
        assert_eq!(cli.output, Some(PathBuf::from("summary.json")));
        assert!(matches!(
            cli.command,
            Commands::Plot {
                format: ImageFormat::Png,
                ..
            }
        ));
    }

    #[test]
    fn test_fetch_parses_threshold_and_limit() {
        let cli = Cli::try_parse_from([
            "buildlens",
            "fetch",
            "--slug",
            "octo/widget",
            "--until",
            "2017-06-30",
            "--limit",
            "500",
        ])
        .unwrap();

        match cli.command {
            Commands::Fetch {
                slug,
                directory,
                until,
                limit,
                url,
                ..
            } => {
                assert_eq!(slug, "octo/widget");
                assert_eq!(directory, PathBuf::from("."));
                assert_eq!(until, NaiveDate::from_ymd_opt(2017, 6, 30));
                assert_eq!(limit, Some(500));
                assert_eq!(url, "https://api.travis-ci.com");
            }
            Commands::Plot { .. } => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_fetch_rejects_invalid_date() {
        let result =
            Cli::try_parse_from(["buildlens", "fetch", "-s", "octo/widget", "-u", "30/06/2017"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_plot_writes_pretty_summary_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("octo@widget");
        std::fs::create_dir(&repo).unwrap();
        std::fs::write(
            repo.join("repo-data-travis.json"),
            r#"[
                {"started_at": "2020-01-01T00:00:00Z", "finished_at": "2020-01-01T00:05:00Z", "duration": 300},
                {"started_at": "2020-01-01T00:10:00Z", "finished_at": "2020-01-01T00:12:00Z", "duration": 120}
            ]"#,
        )
        .unwrap();
        let out = dir.path().join("summary.json");

        let cli = Cli::try_parse_from([
            "buildlens",
            "plot",
            "-r",
            repo.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--pretty",
        ])
        .unwrap();
        cli.execute().await.unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.lines().count() > 1);

        let insights: BuildInsights = serde_json::from_str(&written).unwrap();
        assert_eq!(insights.repository, "octo@widget");
        assert_eq!(insights.total_builds, 2);
        assert_eq!(
            insights.series.keys().collect::<Vec<_>>(),
            vec!["diff-date", "build-duration"]
        );
        assert_eq!(insights.series["build-duration"].stats.max, 5.0);
        assert!(insights.series["diff-date"].image.exists());
    }

    #[tokio::test]
    async fn test_fetch_writes_compact_report_to_output() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repo/octo%2Fwidget/builds")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "@pagination": {"limit": 100, "offset": 0, "count": 1},
                    "builds": [{
                        "id": 7,
                        "number": "7",
                        "state": "passed",
                        "duration": 300,
                        "event_type": "push",
                        "started_at": "2020-01-01T10:00:00Z",
                        "finished_at": "2020-01-01T10:05:00Z",
                        "jobs": [{"id": 70}]
                    }]
                }"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.json");
        let url = server.url();

        let cli = Cli::try_parse_from([
            "buildlens",
            "fetch",
            "-s",
            "octo/widget",
            "-d",
            dir.path().to_str().unwrap(),
            "--url",
            url.as_str(),
            "-t",
            "",
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();
        cli.execute().await.unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().count(), 1);

        let report: HarvestReport = serde_json::from_str(&written).unwrap();
        assert_eq!(report.slug, "octo/widget");
        assert_eq!(report.builds_fetched, 1);
        assert_eq!(report.builds_written, 1);
        assert!(report.json_file.exists());
        assert!(report.csv_file.exists());
    }
}
