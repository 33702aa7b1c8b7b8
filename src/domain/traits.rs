// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipelines only see these traits, never the file formats
// behind them, so tests can feed them in-memory data.

use anyhow::Result;

use crate::data::loader::ParticleShowers;
use crate::domain::{particle::ParticleKind, radial_graph::RadialGraph};

// ─── ShowerSource ─────────────────────────────────────────────────────────────
/// Anything that can provide the simulated showers of one particle species.
///
/// Implementations:
///   - Hdf5ShowerLoader → one .h5 file per particle
pub trait ShowerSource {
    fn load_particle(&self, particle: ParticleKind) -> Result<ParticleShowers>;
}

// ─── GraphSource ──────────────────────────────────────────────────────────────
/// Anything that can provide ratio-vs-radius graphs.
///
/// Implementations:
///   - CsvGraphLoader → `graph,distance,ratio` table
pub trait GraphSource {
    /// Every graph in the source, in first-seen order.
    fn load_graphs(&self) -> Result<Vec<RadialGraph>>;
}
