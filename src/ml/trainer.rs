// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
//   - Training uses Autodiff<backend> for gradients
//   - model.valid() returns the model on the inner backend,
//     with dropout off and batch-norm using running statistics
//   - The best model by validation loss is checkpointed
//   - Training stops early once validation loss has not
//     improved for `patience` epochs, never before epoch 2
//   - A best checkpoint left by an earlier run is removed first

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{ComputeDevice, TrainConfig};
use crate::data::{batcher::ShowerBatcher, dataset::ShowerDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    evaluator::evaluate_batches,
    model::{shower_loss, ShowerNet},
};

/// Stops training once the monitored loss stops improving.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best:     f64,
    wait:     usize,
    seen:     usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best: f64::INFINITY, wait: 0, seen: 0 }
    }

    /// Record one epoch. Returns true on a new best validation loss.
    pub fn observe(&mut self, metrics: &EpochMetrics) -> bool {
        self.seen += 1;
        if metrics.is_improvement(self.best) {
            self.best = metrics.val_loss;
            self.wait = 0;
            true
        } else {
            self.wait += 1;
            false
        }
    }

    /// The first epoch only sets the baseline, so this is false
    /// until a second epoch has been observed.
    pub fn should_stop(&self) -> bool {
        self.seen > 1 && self.wait >= self.patience
    }

    pub fn best(&self) -> f64 {
        self.best
    }
}

/// Train on the configured device and return the per-epoch history.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: ShowerDataset,
    val_dataset:   ShowerDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<Vec<EpochMetrics>> {
    match cfg.device {
        ComputeDevice::Gpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<Autodiff<Wgpu>>(cfg, train_dataset, val_dataset, ckpt_manager, device)
        }
        ComputeDevice::Cpu => {
            tracing::info!("Using NdArray CPU backend");
            train_loop::<Autodiff<NdArray>>(cfg, train_dataset, val_dataset, ckpt_manager, NdArrayDevice::Cpu)
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: ShowerDataset,
    val_dataset:   ShowerDataset,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
) -> Result<Vec<EpochMetrics>> {

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: ShowerNet<B> = cfg.model_config().init(&device);
    tracing::info!(
        "Model ready: {}x{} input, {} training / {} validation samples",
        cfg.image_height, cfg.image_width,
        train_dataset.sample_count(), val_dataset.sample_count(),
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_batcher = ShowerBatcher::<B>::new(device.clone(), cfg.image_height, cfg.image_width);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed.unwrap_or(42))
        .num_workers(1)
        .build(train_dataset);

    // Validation batches live on the inner backend
    let val_batcher = ShowerBatcher::<B::InnerBackend>::new(device.clone(), cfg.image_height, cfg.image_width);
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    ckpt_manager.clear_best()?;
    let metrics_logger = MetricsLogger::new(ckpt_manager.dir())?;
    let mut stopper    = EarlyStopping::new(cfg.patience);
    let mut history    = Vec::new();

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let output = model.forward(batch.images, batch.esum);
            let loss   = shower_loss(&output, batch.labels, batch.energy);

            train_loss_sum += loss.total.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        let val = evaluate_batches(&model.valid(), val_loader.iter())?;

        let metrics = EpochMetrics::new(epoch, avg_train_loss, val.loss, val.accuracy, val.energy_mae);
        tracing::debug!(
            "Epoch {} validation loss split: particle={:.4} energy={:.4}",
            epoch, val.particle_loss, val.energy_loss
        );
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}% | val_mae={:.3}",
            epoch, cfg.epochs, avg_train_loss, val.loss, val.accuracy * 100.0, val.energy_mae,
        );
        metrics_logger.log(&metrics)?;

        if stopper.observe(&metrics) {
            ckpt_manager.save_best(&model, epoch)?;
            tracing::info!("val_loss improved to {:.4}, checkpoint saved", val.loss);
        }
        history.push(metrics);

        if stopper.should_stop() {
            tracing::info!(
                "Early stopping after epoch {}: no improvement for {} epochs",
                epoch, cfg.patience
            );
            break;
        }
    }

    tracing::info!("Training complete! Best val_loss={:.4}", stopper.best());
    Ok(history)
}
