// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns shared by the use cases:
//
//   checkpoint.rs — Saving and loading model weights
//                   Uses Burn's CompactRecorder to
//                   serialise model parameters to disk.
//                   Also saves/loads TrainConfig as JSON
//                   so evaluation can rebuild the model.
//
//   metrics.rs    — Training metrics logging
//                   Writes epoch-level metrics (loss,
//                   accuracy, energy error) to a CSV file.
//
//   montage.rs    — Pastes PNG snapshots into rows and grids
//                   with the `image` crate.
//
//   plots.rs      — Renders charts to PNG with `plotters`:
//                   loss curves, prediction summaries and
//                   ratio-vs-radius profiles.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Image tiling for report figures
pub mod montage;

/// PNG chart rendering
pub mod plots;
