// ============================================================
// Layer 6 — Plot Rendering
// ============================================================
// Every chart the tools produce, drawn with `plotters` onto a
// PNG bitmap:
//
//   Training:  loss_vs_epoch.png, particle_types_histogram.png,
//              energy_scatter.png
//   Histogram: RatioVsRadius_Deadtime{D}ns.png,
//              RatioVsRadius_Combined.png (2×2 panels)

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

use crate::data::binning::{BinSpec, DeadtimeProfiles};
use crate::domain::{particle::ParticleKind, radial_graph::deadtime_label};
use crate::infra::metrics::EpochMetrics;

const PURPLE: RGBColor = RGBColor(128, 0, 128);
const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);
const SERIES_COLORS: [RGBColor; 4] = [BLUE, RED, DARK_GREEN, PURPLE];

const TRAINING_SIZE: (u32, u32) = (1200, 600);
const PROFILE_SIZE: (u32, u32)  = (2000, 1200);
const COMBINED_SIZE: (u32, u32) = (3200, 2400);

/// Axis range covering `values` with 5% headroom on both sides.
fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() {
        return 0.0..1.0;
    }
    if (hi - lo).abs() < 1e-12 {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

// ─── Training plots ───────────────────────────────────────────────────────────

/// Training and validation loss per epoch.
pub fn plot_loss_curve(path: &Path, history: &[EpochMetrics]) -> Result<()> {
    let root = BitMapBackend::new(path, TRAINING_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = history.len().max(1) as f64;
    let y_range = padded_range(history.iter().flat_map(|m| [m.train_loss, m.val_loss]));

    let mut chart = ChartBuilder::on(&root)
        .caption("Training and Validation Loss", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max + 1.0, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Epochs")
        .y_desc("Loss")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            history.iter().map(|m| (m.epoch as f64, m.train_loss)),
            &BLUE,
        ))?
        .label("Training Loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            history.iter().map(|m| (m.epoch as f64, m.val_loss)),
            &RED,
        ))?
        .label("Validation Loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    tracing::info!("Saved {}", path.display());
    Ok(())
}

/// Count of each class index in `classes`.
fn class_counts(classes: &[usize]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for &c in classes {
        if let Some(slot) = counts.get_mut(c) {
            *slot += 1;
        }
    }
    counts
}

/// Side-by-side bars of true and predicted particle types.
pub fn plot_particle_histogram(path: &Path, truth: &[usize], predicted: &[usize]) -> Result<()> {
    let root = BitMapBackend::new(path, TRAINING_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let true_counts = class_counts(truth);
    let pred_counts = class_counts(predicted);
    let y_max = true_counts
        .iter()
        .chain(&pred_counts)
        .copied()
        .max()
        .unwrap_or(0)
        .max(1) as f64
        * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption("True vs Predicted Particle Types", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..3.5f64, 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(5)
        .x_label_formatter(&|x| {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                ParticleKind::from_class_index(idx as usize)
                    .map(|p| p.symbol().to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Particle Types")
        .y_desc("Frequency")
        .draw()?;

    chart
        .draw_series(true_counts.iter().enumerate().map(|(i, &c)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x, c as f64)], BLUE.mix(0.5).filled())
        }))?
        .label("True Particle Types")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], BLUE.mix(0.5).filled()));

    chart
        .draw_series(pred_counts.iter().enumerate().map(|(i, &c)| {
            let x = i as f64;
            Rectangle::new([(x, 0.0), (x + 0.4, c as f64)], RED.mix(0.5).filled())
        }))?
        .label("Predicted Particle Types")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], RED.mix(0.5).filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    tracing::info!("Saved {}", path.display());
    Ok(())
}

/// Predicted against true beam energy, one dot per test event.
pub fn plot_energy_scatter(path: &Path, truth: &[f32], predicted: &[f32]) -> Result<()> {
    let root = BitMapBackend::new(path, TRAINING_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_range = padded_range(truth.iter().map(|&v| f64::from(v)));
    let y_range = padded_range(predicted.iter().map(|&v| f64::from(v)));

    let mut chart = ChartBuilder::on(&root)
        .caption("True vs Predicted Energy", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("True Energy")
        .y_desc("Predicted Energy")
        .draw()?;

    chart
        .draw_series(
            truth
                .iter()
                .zip(predicted)
                .map(|(&t, &p)| Circle::new((f64::from(t), f64::from(p)), 3, BLUE.mix(0.5).filled())),
        )?
        .label("Predicted vs True Energy")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLUE.mix(0.5).filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    tracing::info!("Saved {}", path.display());
    Ok(())
}

// ─── Ratio vs radius plots ────────────────────────────────────────────────────

/// Draw one deadtime's profiles (line + error bars + markers per grid).
fn draw_profiles(
    area:    &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    group:   &DeadtimeProfiles,
    spec:    &BinSpec,
) -> Result<()> {
    let x_range = (spec.lo * 100.0)..(spec.hi * 100.0);
    let y_range = padded_range(group.grids.iter().flat_map(|g| {
        g.profile
            .means
            .iter()
            .zip(&g.profile.errors)
            .flat_map(|(m, e)| [m - e, m + e])
    }));

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .bold_line_style(BLACK.mix(0.3))
        .light_line_style(BLACK.mix(0.15))
        .x_desc("Distance from Center [cm]")
        .y_desc("Mean Reception Ratio")
        .label_style(("sans-serif", 20))
        .draw()?;

    for (i, grid) in group.grids.iter().enumerate() {
        let color  = SERIES_COLORS[i % SERIES_COLORS.len()];
        let style  = color.filled();
        let points: Vec<(f64, f64)> = grid
            .profile
            .centers
            .iter()
            .zip(&grid.profile.means)
            .map(|(c, m)| (c * 100.0, *m))
            .collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.mix(0.7)))?
            .label(format!("dSiPM pitch {:.1} µm", grid.key.dsipm_pitch_um()))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        chart.draw_series(
            points
                .iter()
                .zip(&grid.profile.errors)
                .map(|(&(x, y), &e)| ErrorBar::new_vertical(x, y - e, y, y + e, style, 8)),
        )?;

        // circle, square, triangle, diamond
        match i % 4 {
            0 => {
                chart.draw_series(points.iter().map(|&p| Circle::new(p, 5, style)))?;
            }
            1 => {
                chart.draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p) + Rectangle::new([(-4, -4), (4, 4)], style)
                }))?;
            }
            2 => {
                chart.draw_series(points.iter().map(|&p| TriangleMarker::new(p, 6, style)))?;
            }
            _ => {
                chart.draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p) + Polygon::new(vec![(0, -6), (5, 0), (0, 6), (-5, 0)], style)
                }))?;
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 20))
        .draw()?;

    Ok(())
}

/// One chart for a single deadtime.
pub fn plot_ratio_profiles(path: &Path, group: &DeadtimeProfiles, spec: &BinSpec) -> Result<()> {
    let root = BitMapBackend::new(path, PROFILE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!(
        "Mean Ratio vs Distance - Deadtime {}ns",
        deadtime_label(group.deadtime_ns)
    );
    draw_profiles(&root, &caption, group, spec)?;

    root.present()?;
    Ok(())
}

/// Up to four deadtimes on a 2×2 panel.
pub fn plot_ratio_grid(path: &Path, groups: &[DeadtimeProfiles], spec: &BinSpec) -> Result<()> {
    let root = BitMapBackend::new(path, COMBINED_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Mean Ratio vs Distance for Different Deadtimes", ("sans-serif", 40))?;

    for (panel, group) in root.split_evenly((2, 2)).iter().zip(groups) {
        let caption = format!("Deadtime {}ns", deadtime_label(group.deadtime_ns));
        draw_profiles(panel, &caption, group, spec)?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let r = padded_range([0.0, 10.0]);
        assert!((r.start + 0.5).abs() < 1e-12);
        assert!((r.end - 10.5).abs() < 1e-12);

        let flat = padded_range([2.0, 2.0]);
        assert_eq!(flat, 1.5..2.5);

        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        assert_eq!(padded_range([f64::NAN]), 0.0..1.0);
    }

    #[test]
    fn test_class_counts_ignores_unknown_classes() {
        assert_eq!(class_counts(&[0, 1, 1, 3, 7]), [1, 2, 0, 1]);
    }
}
