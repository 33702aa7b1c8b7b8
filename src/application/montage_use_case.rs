// ============================================================
// Layer 2 — MontageUseCase
// ============================================================
// Tiles the per-size snapshot panels of one deadtime into
// report figures:
//
//   Combined_Deadtime{D}ns_{s}x{s}.png        one row per size
//   Combined_Large_Sizes_Deadtime{D}ns.png    first group of rows
//   Combined_Small_Sizes_Deadtime{D}ns.png    second group of rows
//
// A size with any missing panel is skipped with a warning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::radial_graph::deadtime_label;
use crate::infra::montage::{combine_files_grid, combine_files_horizontal};

/// Which set of snapshot panels makes up one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MontageLayout {
    /// No deadtime | with deadtime | reception ratio
    Comparison,
    /// Same panels drawn with two reference circles, plus the
    /// ratio distribution.
    Circles { circle1: f64, circle2: f64 },
}

impl MontageLayout {
    /// Panel file names of one row, left to right.
    pub fn panels(&self, deadtime: &str, size: u32) -> Vec<String> {
        match *self {
            MontageLayout::Comparison => vec![
                format!("NoDeadtime_{size}x{size}.png"),
                format!("Deadtime{deadtime}ns_{size}x{size}.png"),
                format!("ReceptionRatio_Deadtime{deadtime}ns_{size}x{size}.png"),
            ],
            MontageLayout::Circles { circle1, circle2 } => vec![
                format!(
                    "NoDeadtime_{size}x{size}_withCircles_{}_{}.png",
                    circle1.trunc() as i64,
                    circle2.trunc() as i64
                ),
                format!("Deadtime{deadtime}ns_{size}x{size}_withCircles.png"),
                format!("ReceptionRatio_Deadtime{deadtime}ns_{size}x{size}.png"),
                format!("RatioDistribution_Deadtime{deadtime}ns_{size}x{size}.png"),
            ],
        }
    }

    /// Rows per stacked figure.
    pub fn group_size(&self) -> usize {
        match self {
            MontageLayout::Comparison      => 3,
            MontageLayout::Circles { .. }  => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MontageConfig {
    pub layout:      MontageLayout,
    pub deadtime_ns: f64,
    pub sizes:       Vec<u32>,
    pub input_dir:   String,
    pub output_dir:  String,
}

impl MontageConfig {
    pub fn comparison() -> Self {
        Self {
            layout:      MontageLayout::Comparison,
            deadtime_ns: 30.0,
            sizes:       vec![100, 80, 50, 40, 25, 20],
            input_dir:   ".".to_string(),
            output_dir:  ".".to_string(),
        }
    }

    pub fn circles() -> Self {
        Self {
            layout:      MontageLayout::Circles { circle1: 40.0, circle2: 20.0 },
            deadtime_ns: 5.0,
            sizes:       vec![100, 50, 25, 20],
            input_dir:   ".".to_string(),
            output_dir:  ".".to_string(),
        }
    }
}

pub struct MontageUseCase {
    config: MontageConfig,
}

impl MontageUseCase {
    pub fn new(config: MontageConfig) -> Self {
        Self { config }
    }

    /// Write every figure that can be built and return their paths.
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let cfg        = &self.config;
        let deadtime   = deadtime_label(cfg.deadtime_ns);
        let input_dir  = Path::new(&cfg.input_dir);
        let output_dir = Path::new(&cfg.output_dir);

        fs::create_dir_all(output_dir)
            .with_context(|| format!("Cannot create output directory '{}'", output_dir.display()))?;

        let mut rows    = Vec::new();
        let mut written = Vec::new();

        for &size in &cfg.sizes {
            let panels: Vec<PathBuf> = cfg
                .layout
                .panels(&deadtime, size)
                .into_iter()
                .map(|name| input_dir.join(name))
                .collect();

            let missing: Vec<String> = panels
                .iter()
                .filter(|p| !p.exists())
                .map(|p| p.display().to_string())
                .collect();
            if !missing.is_empty() {
                tracing::warn!(
                    "Skipping {size}x{size}: missing {}",
                    missing.join(", ")
                );
                continue;
            }

            let output = output_dir.join(format!("Combined_Deadtime{deadtime}ns_{size}x{size}.png"));
            combine_files_horizontal(&panels, &output)?;
            rows.push(output.clone());
            written.push(output);
        }

        let group = cfg.layout.group_size();
        for (stack, name) in rows.chunks_exact(group).zip(["Large", "Small"]) {
            let output = output_dir.join(format!("Combined_{name}_Sizes_Deadtime{deadtime}ns.png"));
            combine_files_grid(stack, &output, group as u32, 1)?;
            written.push(output);
        }

        tracing::info!("All images combined for deadtime {deadtime} ns");
        Ok(written)
    }
}
