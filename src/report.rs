use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::info;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters_backend::DrawingErrorKind;
use plotters::prelude::*;

use crate::error::{BuildLensError, Result};
use crate::stats::BoxStats;

const IMAGE_SIZE: (u32, u32) = (640, 480);
const Y_AXIS_DESC: &str = "delay (min)";

const BOX_COLOUR: RGBColor = RGBColor(0x1F, 0x77, 0xB4);
const MEDIAN_COLOUR: RGBColor = RGBColor(0xFF, 0x7F, 0x0E);
const MEAN_COLOUR: RGBColor = RGBColor(0x2C, 0xA0, 0x2C);

// The box sits at x = 1 on a [0, 2] axis.
const BOX_CENTRE: f64 = 1.0;
const BOX_HALF_WIDTH: f64 = 0.25;
const CAP_HALF_WIDTH: f64 = 0.125;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// Bitmap text needs a font backend, which only the `ttf` feature provides.
    pub fn ensure_supported(self) -> Result<()> {
        if self == Self::Png && !cfg!(feature = "ttf") {
            return Err(BuildLensError::Config(
                "PNG output needs buildlens built with the `ttf` feature; use --format svg".into(),
            ));
        }
        Ok(())
    }
}

/// One box plot to draw.
pub struct PlotRequest<'a> {
    pub values: &'a [f64],
    /// Data file the series was derived from; output lands next to it.
    pub input: &'a Path,
    pub label: &'a str,
    pub title: &'a str,
    pub format: ImageFormat,
}

/// `<dir>/<name without .json>-<label>.<ext>`
pub fn output_path(input: &Path, label: &str, format: ImageFormat) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(".json").unwrap_or(&file_name);

    input.with_file_name(format!("{stem}-{label}.{}", format.extension()))
}

/// Caption for a chart: the name of the directory holding the data file.
pub fn chart_caption(input: &Path) -> String {
    input
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Render a box plot of `request.values` and write it to disk.
///
/// Every call draws on its own surface, so plots never share state.
pub fn render_box_plot(request: &PlotRequest<'_>) -> Result<(PathBuf, BoxStats)> {
    request.format.ensure_supported()?;

    let stats = BoxStats::compute(request.values).ok_or_else(|| {
        BuildLensError::data_format(format!("no {} values to plot", request.label))
    })?;

    let path = output_path(request.input, request.label, request.format);
    let caption = chart_caption(request.input);

    match request.format {
        ImageFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, IMAGE_SIZE).into_drawing_area();
                draw_box_plot(&root, &stats, &caption, request.title).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
            fs::write(&path, svg)?;
        }
        ImageFormat::Png => {
            let root = BitMapBackend::new(&path, IMAGE_SIZE).into_drawing_area();
            draw_box_plot(&root, &stats, &caption, request.title).map_err(render_error)?;
            root.present().map_err(render_error)?;
        }
    }

    info!("{} plot written to: {}", request.title, path.display());

    Ok((path, stats))
}

fn draw_box_plot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    stats: &BoxStats,
    caption: &str,
    title: &str,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (y_low, y_high) = y_bounds(stats);

    let mut chart = ChartBuilder::on(root)
        .caption(caption, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..2.0, y_low..y_high)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_: &f64| String::new())
        .x_desc(title)
        .y_desc(Y_AXIS_DESC)
        .draw()?;

    let left = BOX_CENTRE - BOX_HALF_WIDTH;
    let right = BOX_CENTRE + BOX_HALF_WIDTH;

    chart.draw_series(std::iter::once(Rectangle::new(
        [(left, stats.q1), (right, stats.q3)],
        BOX_COLOUR.stroke_width(2),
    )))?;

    let whiskers = [
        vec![(BOX_CENTRE, stats.q1), (BOX_CENTRE, stats.whisker_low)],
        vec![(BOX_CENTRE, stats.q3), (BOX_CENTRE, stats.whisker_high)],
        vec![
            (BOX_CENTRE - CAP_HALF_WIDTH, stats.whisker_low),
            (BOX_CENTRE + CAP_HALF_WIDTH, stats.whisker_low),
        ],
        vec![
            (BOX_CENTRE - CAP_HALF_WIDTH, stats.whisker_high),
            (BOX_CENTRE + CAP_HALF_WIDTH, stats.whisker_high),
        ],
    ];
    chart.draw_series(
        whiskers
            .into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
    )?;

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(left, stats.median), (right, stats.median)],
        MEDIAN_COLOUR.stroke_width(2),
    )))?;

    chart.draw_series(std::iter::once(TriangleMarker::new(
        (BOX_CENTRE, stats.mean),
        6,
        MEAN_COLOUR.filled(),
    )))?;

    Ok(())
}

// Whisker span plus the mean, padded so nothing sits on the frame.
fn y_bounds(stats: &BoxStats) -> (f64, f64) {
    let low = stats.whisker_low.min(stats.mean);
    let high = stats.whisker_high.max(stats.mean);
    let span = high - low;
    let padding = if span > 0.0 { span * 0.05 } else { 1.0 };

    (low - padding, high + padding)
}

fn render_error<E>(err: DrawingAreaErrorKind<E>) -> BuildLensError
where
    E: std::error::Error + Send + Sync,
{
    match err {
        DrawingAreaErrorKind::BackendError(DrawingErrorKind::DrawingError(e)) => {
            BuildLensError::Io(std::io::Error::other(e.to_string()))
        }
        other => BuildLensError::Render(other.to_string()),
    }
}
