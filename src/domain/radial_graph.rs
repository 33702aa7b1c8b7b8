// ============================================================
// Layer 3 — Ratio vs Radius Graphs
// ============================================================
// A graph holds the reception ratio of every histogram cell
// against its distance from the beam spot, for one deadtime
// and one sensor grid. Both parameters are encoded in the
// graph name, e.g. `RatioVsRadius_Deadtime5.0ns_100x100`.

use anyhow::{anyhow, Context, Result};

/// Name fragment every analysable graph carries.
pub const GRAPH_PREFIX: &str = "RatioVsRadius_Deadtime";

/// Name fragment of the summary canvas stored next to the graphs.
const CANVAS_MARKER: &str = "c1";

#[derive(Debug, Clone, PartialEq)]
pub struct RadialGraph {
    pub name:      String,
    /// Distance from the beam spot in metres.
    pub distances: Vec<f64>,
    pub ratios:    Vec<f64>,
}

impl RadialGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), distances: Vec::new(), ratios: Vec::new() }
    }

    pub fn push(&mut self, distance: f64, ratio: f64) {
        self.distances.push(distance);
        self.ratios.push(ratio);
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Simulation parameters decoded from a graph name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphKey {
    pub deadtime_ns: f64,
    pub grid_size:   u32,
}

impl GraphKey {
    /// Parse `RatioVsRadius_Deadtime{D}ns_{G}x{G}[;cycle]`.
    pub fn parse(name: &str) -> Result<Self> {
        let base  = name.split(';').next().unwrap_or(name);
        let parts: Vec<&str> = base.split('_').collect();
        let (deadtime_part, grid_part) = match parts.as_slice() {
            [_, deadtime, grid, ..] => (*deadtime, *grid),
            _ => return Err(anyhow!("graph name '{name}' has no deadtime/grid fields")),
        };

        let deadtime_ns = deadtime_part
            .replace("Deadtime", "")
            .replace("ns", "")
            .parse::<f64>()
            .with_context(|| format!("bad deadtime '{deadtime_part}' in graph '{name}'"))?;

        let grid_size = grid_part
            .split('x')
            .next()
            .unwrap_or_default()
            .parse::<u32>()
            .with_context(|| format!("bad grid size '{grid_part}' in graph '{name}'"))?;

        if grid_size == 0 {
            return Err(anyhow!("grid size of graph '{name}' is zero"));
        }

        Ok(Self { deadtime_ns, grid_size })
    }

    /// Graph name for this key, deadtime with one decimal:
    /// `RatioVsRadius_Deadtime5.0ns_100x100`.
    pub fn graph_name(&self) -> String {
        format!("{GRAPH_PREFIX}{:.1}ns_{g}x{g}", self.deadtime_ns, g = self.grid_size)
    }

    /// dSiPM pitch in µm for a 1 mm tile split into `grid_size` cells.
    pub fn dsipm_pitch_um(&self) -> f64 {
        1000.0 / f64::from(self.grid_size)
    }
}

/// True for graph objects that take part in the analysis.
pub fn is_analysis_graph(name: &str) -> bool {
    name.contains(GRAPH_PREFIX) && !name.contains(CANVAS_MARKER)
}

/// Render a deadtime the way the snapshot files spell it:
/// always with a fractional part (`5.0`, `2.5`).
pub fn deadtime_label(deadtime_ns: f64) -> String {
    format!("{deadtime_ns:?}")
}
