// ============================================================
// Layer 4 — Ratio Map
// ============================================================
// A reception-ratio map is the 2D `RatioHist` of one simulation
// run, exported one cell per row:
//
//   x,y,content
//   -4.1650,4.5225,0.93
//   ...
//
// x / y are bin centres in metres. Extraction keeps the filled
// cells (content > 0) within `max_distance` of the beam spot and
// turns them into a ratio-vs-distance graph.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::domain::radial_graph::RadialGraph;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RatioCell {
    pub x:       f64,
    pub y:       f64,
    pub content: f64,
}

/// Where distances are measured from.
#[derive(Debug, Clone, Copy)]
pub struct BeamSpot {
    pub x: f64,
    pub y: f64,
}

impl Default for BeamSpot {
    fn default() -> Self {
        Self { x: -4.16, y: 4.527 }
    }
}

pub fn load_ratio_map(path: &Path) -> Result<Vec<RatioCell>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open ratio map '{}'", path.display()))?;

    reader
        .deserialize::<RatioCell>()
        .enumerate()
        .map(|(line, cell)| {
            cell.with_context(|| format!("Bad row {} in '{}'", line + 2, path.display()))
        })
        .collect()
}

/// Ratio against distance from `spot` for every filled cell in range,
/// in the order the cells are given.
pub fn extract_radial_graph(
    name:         impl Into<String>,
    cells:        &[RatioCell],
    spot:         BeamSpot,
    max_distance: f64,
) -> RadialGraph {
    let mut graph = RadialGraph::new(name);
    for cell in cells.iter().filter(|c| c.content > 0.0) {
        let distance = (cell.x - spot.x).hypot(cell.y - spot.y);
        if distance <= max_distance {
            graph.push(distance, cell.content);
        }
    }
    graph
}
