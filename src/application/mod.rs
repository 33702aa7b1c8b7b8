// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case is one subcommand's workflow. It coordinates
// the data, ml and infra layers but holds no model math, no
// file formats and no argument parsing of its own.

// `dsipm train`
pub mod train_use_case;

// `dsipm combine` and `dsipm combine-circles`
pub mod montage_use_case;

// `dsipm ratio-extract`
pub mod ratio_extract_use_case;

// `dsipm ratio-hist`
pub mod ratio_hist_use_case;
