//! Line charts of seed-averaged curves

use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use super::{iteration_range, value_range, FONT};
use crate::aggregate::{DisentanglementAggregate, TrainingAggregate};
use crate::error::{Error, Result};
use crate::metrics::LossComponent;

const TRAIN_SIZE: (u32, u32) = (960, 720);
const TRAIN_DETAIL_SIZE: (u32, u32) = (800, 600);
const DISENTANGLEMENT_SIZE: (u32, u32) = (900, 400);

const RECON_DETAIL_RANGE: Range<f64> = 0.0..150.0;
const TC_DETAIL_RANGE: Range<f64> = -0.3..0.85;
const SCORE_DETAIL_RANGE: Range<f64> = 0.4..1.0;
const SCORE_RANGE: Range<f64> = 0.0..1.0;

/// Draw reconstruction loss (top) and total correlation (bottom) curves.
///
/// In detail mode the y-ranges are fixed so charts of different sweeps
/// line up; otherwise they fit the data.
///
/// # Errors
///
/// Returns `Plot` if the backend fails to draw or write the file.
pub fn render_train_loss(path: &Path, curves: &[TrainingAggregate], detail: bool) -> Result<()> {
    let size = if detail { TRAIN_DETAIL_SIZE } else { TRAIN_SIZE };
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;

    let panels = root.split_evenly((2, 1));
    draw_loss_panel(
        &panels[0],
        curves,
        LossComponent::Reconstruction,
        "reconstruction loss",
        detail.then_some(RECON_DETAIL_RANGE),
    )?;
    draw_loss_panel(
        &panels[1],
        curves,
        LossComponent::TotalCorrelation,
        "true total correlation (VAE)",
        detail.then_some(TC_DETAIL_RANGE),
    )?;

    root.present().map_err(Error::plot)?;
    info!(path = %path.display(), curves = curves.len(), "rendered loss curves");
    Ok(())
}

fn draw_loss_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    curves: &[TrainingAggregate],
    component: LossComponent,
    y_desc: &str,
    y_range: Option<Range<f64>>,
) -> Result<()> {
    let x_range = iteration_range(curves.iter().flat_map(|c| c.series().iters().iter().copied()));
    let y_range = y_range.unwrap_or_else(|| {
        value_range(
            curves
                .iter()
                .flat_map(|c| c.series().component(component).iter().copied()),
        )
    });

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(Error::plot)?;

    chart
        .configure_mesh()
        .x_desc("iterations")
        .y_desc(y_desc)
        .label_style((FONT, 14))
        .draw()
        .map_err(Error::plot)?;

    for (idx, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let series = curve.series();
        chart
            .draw_series(LineSeries::new(
                series
                    .iters()
                    .iter()
                    .copied()
                    .zip(series.component(component).iter().copied()),
                &color,
            ))
            .map_err(Error::plot)?
            .label(curve.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, 12))
        .draw()
        .map_err(Error::plot)?;

    Ok(())
}

/// Draw the disentanglement score curves on one panel.
///
/// # Errors
///
/// Returns `Plot` if the backend fails to draw or write the file.
pub fn render_disentanglement(
    path: &Path,
    curves: &[DisentanglementAggregate],
    detail: bool,
) -> Result<()> {
    let root = BitMapBackend::new(path, DISENTANGLEMENT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;

    let x_range = iteration_range(curves.iter().flat_map(|c| c.series().iters().iter().copied()));
    let y_range = if detail { SCORE_DETAIL_RANGE } else { SCORE_RANGE };

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(Error::plot)?;

    chart
        .configure_mesh()
        .x_desc("iterations")
        .y_desc("disentanglement metric")
        .label_style((FONT, 14))
        .draw()
        .map_err(Error::plot)?;

    for (idx, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let series = curve.series();
        chart
            .draw_series(LineSeries::new(
                series.iters().iter().copied().zip(series.scores().iter().copied()),
                &color,
            ))
            .map_err(Error::plot)?
            .label(curve.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, 12))
        .draw()
        .map_err(Error::plot)?;

    root.present().map_err(Error::plot)?;
    info!(path = %path.display(), curves = curves.len(), "rendered disentanglement curves");
    Ok(())
}
