// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the analysis works on:
// particle species, ratio-vs-radius graphs, and the traits
// that data sources implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Particle species used as classification targets
pub mod particle;

// Reception ratio vs distance graphs and their name keys
pub mod radial_graph;

// Data source abstractions implemented in the data layer
pub mod traits;
