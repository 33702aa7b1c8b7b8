// ============================================================
// Layer 2 — RatioExtractUseCase
// ============================================================
// Builds the ratio-vs-radius graph table that `ratio-hist`
// reads, from one exported ratio map per deadtime and grid:
//
//   <input_dir>/RatioHistograms_Deadtime{D:.1}ns_{G}x{G}.csv
//       │  load_ratio_map
//       ▼
//   extract_radial_graph  (content > 0, distance ≤ max)
//       │
//       ▼
//   <output>  graph,distance,ratio
//
// Missing maps and maps with no cell in range are skipped.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    graph_loader::write_graph_table,
    ratio_map::{extract_radial_graph, load_ratio_map, BeamSpot},
};
use crate::domain::radial_graph::{GraphKey, RadialGraph};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioExtractConfig {
    pub input_dir:    String,
    pub output:       String,
    pub deadtimes:    Vec<f64>,
    pub grid_sizes:   Vec<u32>,
    pub center_x:     f64,
    pub center_y:     f64,
    pub max_distance: f64,
}

impl Default for RatioExtractConfig {
    fn default() -> Self {
        let spot = BeamSpot::default();
        Self {
            input_dir:    "ana_datas".to_string(),
            output:       "RatioVsRadius.csv".to_string(),
            deadtimes:    vec![0.0, 5.0, 10.0, 30.0],
            grid_sizes:   vec![100, 50, 25, 20],
            center_x:     spot.x,
            center_y:     spot.y,
            max_distance: 0.05,
        }
    }
}

/// File name of the exported ratio map for `key`.
pub fn ratio_map_file(key: &GraphKey) -> String {
    format!("RatioHistograms_Deadtime{:.1}ns_{g}x{g}.csv", key.deadtime_ns, g = key.grid_size)
}

pub struct RatioExtractUseCase {
    config: RatioExtractConfig,
}

impl RatioExtractUseCase {
    pub fn new(config: RatioExtractConfig) -> Self {
        Self { config }
    }

    /// Write the graph table and return the graphs it holds.
    pub fn execute(&self) -> Result<Vec<RadialGraph>> {
        let cfg       = &self.config;
        let input_dir = Path::new(&cfg.input_dir);
        let spot      = BeamSpot { x: cfg.center_x, y: cfg.center_y };

        let mut graphs = Vec::new();
        for &deadtime_ns in &cfg.deadtimes {
            for &grid_size in &cfg.grid_sizes {
                let key  = GraphKey { deadtime_ns, grid_size };
                let path = input_dir.join(ratio_map_file(&key));
                if !path.exists() {
                    tracing::warn!("File not found: {}", path.display());
                    continue;
                }

                let cells = load_ratio_map(&path)?;
                let graph = extract_radial_graph(key.graph_name(), &cells, spot, cfg.max_distance);
                if graph.is_empty() {
                    tracing::warn!("No filled cells within {} m in {}", cfg.max_distance, path.display());
                    continue;
                }

                tracing::info!(
                    "Created graph for deadtime {} ns, grid size {g}x{g} with {} points",
                    deadtime_ns, graph.len(), g = grid_size
                );
                graphs.push(graph);
            }
        }

        ensure!(!graphs.is_empty(), "No ratio maps found in '{}'", input_dir.display());

        let output = PathBuf::from(&cfg.output);
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_graph_table(&output, &graphs)?;
        tracing::info!("Graph table saved to {}", output.display());
        Ok(graphs)
    }
}
