// ============================================================
// Layer 4 — Graph Loader
// ============================================================
// Reads ratio-vs-radius graphs from their columnar export:
//
//   graph,distance,ratio
//   RatioVsRadius_Deadtime0.0ns_100x100,0.0021,0.98
//   RatioVsRadius_Deadtime0.0ns_100x100,0.0034,0.97
//   ...
//
// One row per graph point (the TGraph fX / fY arrays), grouped
// back into graphs by name in the order the names first appear.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::{Path, PathBuf}};

use crate::domain::{radial_graph::RadialGraph, traits::GraphSource};

#[derive(Debug, Deserialize)]
struct GraphRow {
    graph:    String,
    distance: f64,
    ratio:    f64,
}

#[derive(Debug, Serialize)]
struct GraphRowRef<'a> {
    graph:    &'a str,
    distance: f64,
    ratio:    f64,
}

/// Write `graphs` in the table format `CsvGraphLoader` reads.
pub fn write_graph_table(path: &Path, graphs: &[RadialGraph]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create graph table '{}'", path.display()))?;

    for graph in graphs {
        for (&distance, &ratio) in graph.distances.iter().zip(&graph.ratios) {
            writer.serialize(GraphRowRef { graph: &graph.name, distance, ratio })?;
        }
    }
    writer
        .flush()
        .with_context(|| format!("Cannot write graph table '{}'", path.display()))?;
    Ok(())
}

pub struct CsvGraphLoader {
    path: PathBuf,
}

impl CsvGraphLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GraphSource for CsvGraphLoader {
    fn load_graphs(&self) -> Result<Vec<RadialGraph>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Cannot open graph table '{}'", self.path.display()))?;

        let mut graphs: Vec<RadialGraph>    = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (line, row) in reader.deserialize::<GraphRow>().enumerate() {
            let row = row.with_context(|| {
                format!("Bad row {} in '{}'", line + 2, self.path.display())
            })?;

            let slot = *index.entry(row.graph.clone()).or_insert_with(|| {
                graphs.push(RadialGraph::new(row.graph.clone()));
                graphs.len() - 1
            });
            graphs[slot].push(row.distance, row.ratio);
        }

        tracing::info!(
            "Loaded {} graphs from '{}'",
            graphs.len(),
            self.path.display()
        );
        Ok(graphs)
    }
}
