// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Check the image geometry  (Layer 5 - ml)
//   Step 2: Load every particle file  (Layer 4 - data)
//   Step 3: Build labelled samples    (Layer 4 - data)
//   Step 4: Split train/val/test      (Layer 4 - data)
//   Step 5: Save config               (Layer 6 - infra)
//   Step 6: Run training loop         (Layer 5 - ml)
//   Step 7: Evaluate best checkpoint  (Layer 5 - ml)
//           Fails if no epoch improved validation loss
//   Step 8: Write summary plots       (Layer 6 - infra)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::{ShowerDataset, ShowerSample},
    loader::{build_samples, Hdf5ShowerLoader},
    splitter::{split_dataset, SplitFractions},
};
use crate::domain::{particle::ParticleKind, traits::ShowerSource};
use crate::infra::{checkpoint::CheckpointManager, plots};
use crate::ml::{
    evaluator::{run_evaluation, EvalReport},
    model::ShowerNetConfig,
    trainer::run_training,
};

/// Where the network runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    /// WGPU (Vulkan / Metal / DX12)
    Gpu,
    /// NdArray on the CPU
    Cpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved next to the checkpoint so evaluation can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:        String,
    pub energy_tag:      String,
    pub events_per_file: usize,
    pub image_height:    usize,
    pub image_width:     usize,
    pub checkpoint_dir:  String,
    pub plot_dir:        String,
    pub batch_size:      usize,
    pub epochs:          usize,
    pub learning_rate:   f64,
    pub patience:        usize,
    pub dropout:         f64,
    pub seed:            Option<u64>,
    pub device:          ComputeDevice,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        ".".to_string(),
            energy_tag:      "E1-100".to_string(),
            events_per_file: 2000,
            image_height:    57,
            image_width:     49,
            checkpoint_dir:  "checkpoints".to_string(),
            plot_dir:        ".".to_string(),
            batch_size:      128,
            epochs:          25,
            learning_rate:   1e-3,
            patience:        6,
            dropout:         0.2,
            seed:            None,
            device:          ComputeDevice::Gpu,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> ShowerNetConfig {
        ShowerNetConfig::new(self.image_height, self.image_width).with_dropout(self.dropout)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train from the HDF5 files in `data_dir` and return the test report.
    pub fn execute(&self) -> Result<EvalReport> {
        let cfg    = &self.config;
        let loader = Hdf5ShowerLoader::new(
            &cfg.data_dir,
            &cfg.energy_tag,
            cfg.events_per_file,
            cfg.image_height,
            cfg.image_width,
        );
        self.execute_with(&loader)
    }

    pub fn execute_with(&self, source: &dyn ShowerSource) -> Result<EvalReport> {
        let cfg = &self.config;

        // ── Step 1: Reject geometries the convolutions cannot reduce ──────────
        ensure!(
            cfg.model_config().flattened_len().is_some(),
            "Images of {}x{} are too small for the network",
            cfg.image_height, cfg.image_width
        );
        ensure!(cfg.batch_size > 0, "Batch size must be positive");

        // ── Steps 2–3: Load showers and build samples ─────────────────────────
        let samples = load_samples(source)?;
        ensure!(!samples.is_empty(), "No shower events were loaded");

        // ── Step 4: Shuffle and split 70/20/10 ────────────────────────────────
        let split = split_dataset(samples, SplitFractions::default(), cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            split.train.len(), split.val.len(), split.test.len()
        );

        // ── Step 5: Save config for evaluation ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 6: Train ─────────────────────────────────────────────────────
        let history = run_training(
            cfg,
            ShowerDataset::new(split.train),
            ShowerDataset::new(split.val),
            &ckpt_manager,
        )?;

        let plot_dir = Path::new(&cfg.plot_dir);
        std::fs::create_dir_all(plot_dir)?;
        plots::plot_loss_curve(&plot_dir.join("loss_vs_epoch.png"), &history)?;

        // ── Step 7: Score the best checkpoint on the test split ───────────────
        // The trainer clears old checkpoints, so one exists only if this run saved it
        ensure!(
            ckpt_manager.best_epoch().is_ok(),
            "No epoch improved validation loss; nothing to evaluate"
        );
        let report = run_evaluation(cfg.device, &ckpt_manager, &split.test, cfg.batch_size)?;
        tracing::info!("Evaluated {} test samples", report.samples);

        // ── Step 8: Summary plots ─────────────────────────────────────────────
        plots::plot_particle_histogram(
            &plot_dir.join("particle_types_histogram.png"),
            &report.true_classes,
            &report.predicted_classes,
        )?;
        plots::plot_energy_scatter(
            &plot_dir.join("energy_scatter.png"),
            &report.true_energy,
            &report.predicted_energy,
        )?;
        tracing::info!("Plots written to '{}'", plot_dir.display());

        Ok(report)
    }
}

/// Load every species in class order and concatenate their samples.
pub fn load_samples(source: &dyn ShowerSource) -> Result<Vec<ShowerSample>> {
    let mut showers = Vec::with_capacity(ParticleKind::ALL.len());
    for particle in ParticleKind::ALL {
        let s = source.load_particle(particle)?;
        tracing::info!("Loaded {} events of {}", s.event_count(), particle);
        showers.push(s);
    }
    let samples = build_samples(showers);
    tracing::info!("Built {} samples", samples.len());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{showers_from_raw, ParticleShowers};

    struct InMemory {
        events: usize,
    }

    impl ShowerSource for InMemory {
        fn load_particle(&self, particle: ParticleKind) -> Result<ParticleShowers> {
            let n = self.events;
            let energies = (0..n).map(|i| i as f32).collect();
            let raw = vec![particle.class_index() as f32; n * 57 * 49];
            showers_from_raw(particle, energies, raw, &[n, 57, 49], 57, 49)
        }
    }

    #[test]
    fn test_load_samples_follows_class_order() {
        let samples = load_samples(&InMemory { events: 3 }).unwrap();
        assert_eq!(samples.len(), 12);
        let labels: Vec<usize> = samples.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3]);
        assert!((samples[4].esum - 57.0 * 49.0).abs() < 1e-3);
    }

    #[test]
    fn test_small_images_are_rejected_before_loading() {
        let cfg = TrainConfig { image_height: 10, image_width: 10, ..TrainConfig::default() };
        let err = TrainUseCase::new(cfg).execute_with(&InMemory { events: 1 }).unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    fn cpu_config(dir: &Path, epochs: usize) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.join("ckpt").display().to_string(),
            plot_dir:       dir.join("plots").display().to_string(),
            batch_size:     4,
            epochs,
            seed:           Some(5),
            device:         ComputeDevice::Cpu,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_execute_trains_evaluates_and_plots() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cpu_config(dir.path(), 1);

        // 12 samples: 8 train, 2 validation, 2 test
        let report = TrainUseCase::new(cfg).execute_with(&InMemory { events: 3 }).unwrap();

        assert_eq!(report.samples, 2);
        assert_eq!(report.predicted_classes.len(), 2);
        assert!(report.loss.is_finite());

        let ckpt = CheckpointManager::new(dir.path().join("ckpt")).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), 1);
        assert_eq!(ckpt.load_config().unwrap().batch_size, 4);
        for plot in ["loss_vs_epoch.png", "particle_types_histogram.png", "energy_scatter.png"] {
            assert!(dir.path().join("plots").join(plot).exists(), "{plot} missing");
        }
    }

    #[test]
    fn test_stale_checkpoint_is_not_evaluated() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cpu_config(dir.path(), 1);

        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        let old: crate::ml::model::ShowerNet<burn::backend::NdArray> =
            cfg.model_config().init(&Default::default());
        ckpt.save_best(&old, 9).unwrap();

        // 4 samples split 2 / 0 / 2: the empty validation set never improves
        let err = TrainUseCase::new(cfg).execute_with(&InMemory { events: 1 }).unwrap_err();
        assert!(err.to_string().contains("No epoch improved"), "{err}");
        assert!(ckpt.best_epoch().is_err());
    }

    #[test]
    fn test_config_serialises_device_in_lowercase() {
        let cfg  = TrainConfig { device: ComputeDevice::Cpu, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"device\":\"cpu\""));
    }

    #[test]
    fn test_defaults_match_training_recipe() {
        let cfg = TrainConfig::default();
        assert_eq!((cfg.image_height, cfg.image_width), (57, 49));
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.epochs, 25);
        assert_eq!(cfg.patience, 6);
        assert_eq!(cfg.model_config().flattened_len(), Some(12));
    }
}
