// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network code lives here:
//
//   model.rs     — ShowerNet, the two-headed CNN
//                  • convolution stack over the hit histogram
//                  • dense layers joined with the energy sum
//                  • particle logits + energy regression heads
//                  • cross-entropy + MSLE loss
//
//   trainer.rs   — The training loop
//                  Adam updates, per-epoch validation,
//                  save-best checkpointing and early stopping
//
//   evaluator.rs — Scoring on labelled batches
//                  Validation during training and the final
//                  test-set report of the best checkpoint

/// Shower classification / energy regression network
pub mod model;

/// Training loop with validation, checkpointing and early stopping
pub mod trainer;

/// Loss, accuracy and energy error over labelled batches
pub mod evaluator;
