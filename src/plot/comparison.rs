//! Reconstruction error against disentanglement score, per method

use std::path::Path;

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use serde::Serialize;
use tracing::info;

use super::FONT;
use crate::aggregate::SummaryPoint;
use crate::error::{Error, Result};

const COMPARISON_SIZE: (u32, u32) = (900, 700);
const RECON_RANGE: std::ops::Range<f64> = 0.0..150.0;
const SCORE_RANGE: std::ops::Range<f64> = 0.3..1.0;
const RECON_GRID_STEP: f64 = 25.0;
const SCORE_GRID_STEP: f64 = 0.1;
const GRID_DASH: i32 = 3;

/// One scatter point: where a hyperparameter setting ended up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonPoint {
    /// Final reconstruction error (x).
    pub recon_error: f64,
    /// Final disentanglement score (y).
    pub score: f64,
    /// Hyperparameter value written next to the point.
    pub value: f64,
}

impl From<&SummaryPoint> for ComparisonPoint {
    fn from(point: &SummaryPoint) -> Self {
        Self {
            recon_error: point.final_recon_loss,
            score: point.final_score,
            value: point.value,
        }
    }
}

const fn reference(recon_error: f64, score: f64, value: f64) -> ComparisonPoint {
    ComparisonPoint {
        recon_error,
        score,
        value,
    }
}

/// Published beta-VAE results, annotated with beta.
pub const BETA_VAE_REFERENCE: [ComparisonPoint; 6] = [
    reference(20.0, 0.69, 1.0),
    reference(30.0, 0.685, 2.0),
    reference(42.0, 0.73, 4.0),
    reference(58.0, 0.700, 6.0),
    reference(60.0, 0.625, 8.0),
    reference(111.0, 0.68, 16.0),
];

/// Scatter beta-VAE reference points against the two trained methods.
///
/// Every point is annotated with its hyperparameter value.
///
/// # Errors
///
/// Returns `Plot` if the backend fails to draw or write the file.
pub fn render_comparison(
    path: &Path,
    factor_vae: &[SummaryPoint],
    ad_factor_vae: &[SummaryPoint],
) -> Result<()> {
    let root = BitMapBackend::new(path, COMPARISON_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Reconstruction error against disentanglement metric",
            (FONT, 22).into_font(),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(RECON_RANGE, SCORE_RANGE)
        .map_err(Error::plot)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("reconstruction error")
        .y_desc("disentanglement metric")
        .axis_desc_style((FONT, 20))
        .draw()
        .map_err(Error::plot)?;

    for x in grid_lines(RECON_RANGE, RECON_GRID_STEP) {
        chart
            .draw_series(DashedLineSeries::new(
                vec![(x, SCORE_RANGE.start), (x, SCORE_RANGE.end)],
                GRID_DASH,
                GRID_DASH,
                RED.mix(0.5).stroke_width(1),
            ))
            .map_err(Error::plot)?;
    }
    for y in grid_lines(SCORE_RANGE, SCORE_GRID_STEP) {
        chart
            .draw_series(DashedLineSeries::new(
                vec![(RECON_RANGE.start, y), (RECON_RANGE.end, y)],
                GRID_DASH,
                GRID_DASH,
                RED.mix(0.5).stroke_width(1),
            ))
            .map_err(Error::plot)?;
    }

    let factor: Vec<ComparisonPoint> = factor_vae.iter().map(ComparisonPoint::from).collect();
    let ad: Vec<ComparisonPoint> = ad_factor_vae.iter().map(ComparisonPoint::from).collect();
    let groups: [(&str, RGBColor, &[ComparisonPoint]); 3] = [
        ("beta VAE", BLUE, &BETA_VAE_REFERENCE[..]),
        ("Factor VAE", GREEN, factor.as_slice()),
        ("AD Factor VAE", RED, ad.as_slice()),
    ];

    for (name, color, points) in groups {
        chart
            .draw_series(
                points
                    .iter()
                    .map(|p| Circle::new((p.recon_error, p.score), 5, color.filled())),
            )
            .map_err(Error::plot)?
            .label(name)
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));

        chart
            .draw_series(points.iter().map(|p| {
                Text::new(
                    format!("{}", p.value),
                    (p.recon_error, p.score),
                    (FONT, 14).into_font(),
                )
            }))
            .map_err(Error::plot)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, 14))
        .draw()
        .map_err(Error::plot)?;

    root.present().map_err(Error::plot)?;
    info!(
        path = %path.display(),
        factor_vae = factor.len(),
        ad_factor_vae = ad.len(),
        "rendered method comparison"
    );
    Ok(())
}

/// Grid positions from `range.start` to `range.end`, both included.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn grid_lines(range: std::ops::Range<f64>, step: f64) -> Vec<f64> {
    let count = ((range.end - range.start) / step + 1e-9).floor() as usize;
    (0..=count).map(|i| range.start + i as f64 * step).collect()
}
