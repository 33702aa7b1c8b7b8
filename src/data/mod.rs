// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw analysis files to tensor batches and
// binned statistics.
//
// Training pipeline:
//
//   .h5 shower files
//       │
//       ▼
//   Hdf5ShowerLoader  → beam energies + 2D hit histograms
//       │
//       ▼
//   build_samples     → labelled samples with energy sums
//       │
//       ▼
//   split_dataset     → shuffled train / validation / test
//       │
//       ▼
//   ShowerDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   ShowerBatcher     → stacks samples into tensor batches
//
// Histogram pipeline:
//
//   ratio map CSV → extract_radial_graph → write_graph_table
//   CsvGraphLoader → RadialGraph → bin_profile → BinnedProfile

/// Reads per-particle shower files and builds labelled samples
pub mod loader;

/// Reads ratio-vs-radius graphs from their CSV export
pub mod graph_loader;

/// Reads exported 2D ratio maps and extracts ratio-vs-distance graphs
pub mod ratio_map;

/// Implements Burn's Dataset trait for shower samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation/test sets
pub mod splitter;

/// Mean and standard error of values in equal-width bins
pub mod binning;
