// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a model on labelled batches: total loss, particle
// accuracy and energy MAE, keeping every prediction for the
// summary plots. Used for validation after each epoch and for
// the final test-set evaluation of the best checkpoint.

use anyhow::{anyhow, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::application::train_use_case::ComputeDevice;
use crate::data::{
    batcher::{ShowerBatch, ShowerBatcher},
    dataset::ShowerSample,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{shower_loss, ShowerNet};

#[derive(Debug, Clone, Default)]
pub struct EvalReport {
    /// Sample-weighted mean of the total loss.
    pub loss:              f64,
    /// Cross-entropy part of `loss`.
    pub particle_loss:     f64,
    /// Energy regression part of `loss`.
    pub energy_loss:       f64,
    pub accuracy:          f64,
    pub energy_mae:        f64,
    pub samples:           usize,
    pub true_classes:      Vec<usize>,
    pub predicted_classes: Vec<usize>,
    pub true_energy:       Vec<f32>,
    pub predicted_energy:  Vec<f32>,
}

fn to_floats<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

fn to_classes<B: Backend>(t: Tensor<B, 1, Int>) -> Result<Vec<usize>> {
    Ok(t.into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))?
        .into_iter()
        .map(|c| c as usize)
        .collect())
}

/// Run `model` over `batches` and aggregate the scores.
pub fn evaluate_batches<B, I>(model: &ShowerNet<B>, batches: I) -> Result<EvalReport>
where
    B: Backend,
    I: IntoIterator<Item = ShowerBatch<B>>,
{
    let mut report      = EvalReport::default();
    let mut loss_sum    = 0.0f64;
    let mut ce_sum      = 0.0f64;
    let mut msle_sum    = 0.0f64;
    let mut abs_err_sum = 0.0f64;
    let mut correct     = 0usize;

    for batch in batches {
        let n      = batch.size();
        let output = model.forward(batch.images, batch.esum);
        let loss   = shower_loss(&output, batch.labels.clone(), batch.energy.clone());
        loss_sum  += loss.total.into_scalar().elem::<f64>() * n as f64;
        ce_sum    += loss.particle.into_scalar().elem::<f64>() * n as f64;
        msle_sum  += loss.energy.into_scalar().elem::<f64>() * n as f64;

        // argmax(1) keeps the class axis: [batch, 1] -> [batch]
        let predicted = output.particle_logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .clone()
            .equal(batch.labels.clone())
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        correct += hits as usize;

        abs_err_sum += (output.energy.clone() - batch.energy.clone())
            .abs()
            .sum()
            .into_scalar()
            .elem::<f64>();

        report.samples += n;
        report.true_classes.extend(to_classes(batch.labels)?);
        report.predicted_classes.extend(to_classes(predicted)?);
        report.true_energy.extend(to_floats(batch.energy)?);
        report.predicted_energy.extend(to_floats(output.energy)?);
    }

    if report.samples > 0 {
        let n = report.samples as f64;
        report.loss          = loss_sum / n;
        report.particle_loss = ce_sum / n;
        report.energy_loss   = msle_sum / n;
        report.accuracy   = correct as f64 / n;
        report.energy_mae = abs_err_sum / n;
    } else {
        report.loss          = f64::NAN;
        report.particle_loss = f64::NAN;
        report.energy_loss   = f64::NAN;
        report.energy_mae    = f64::NAN;
    }

    Ok(report)
}

/// The best checkpoint, rebuilt for evaluation.
pub struct Evaluator<B: Backend> {
    model:   ShowerNet<B>,
    batcher: ShowerBatcher<B>,
}

impl<B: Backend> Evaluator<B> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg   = ckpt_manager.load_config()?;
        let model = cfg.model_config().init::<B>(&device);
        let model = ckpt_manager.load_best(model, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self {
            model,
            batcher: ShowerBatcher::new(device, cfg.image_height, cfg.image_width),
        })
    }

    pub fn evaluate(&self, samples: &[ShowerSample], batch_size: usize) -> Result<EvalReport> {
        let batches = samples
            .chunks(batch_size.max(1))
            .map(|chunk| self.batcher.batch(chunk.to_vec()));
        evaluate_batches(&self.model, batches)
    }
}

/// Evaluate the best checkpoint on `samples` with the configured device.
pub fn run_evaluation(
    device:       ComputeDevice,
    ckpt_manager: &CheckpointManager,
    samples:      &[ShowerSample],
    batch_size:   usize,
) -> Result<EvalReport> {
    match device {
        ComputeDevice::Gpu => Evaluator::<Wgpu>::from_checkpoint(ckpt_manager, WgpuDevice::default())?
            .evaluate(samples, batch_size),
        ComputeDevice::Cpu => Evaluator::<NdArray>::from_checkpoint(ckpt_manager, NdArrayDevice::Cpu)?
            .evaluate(samples, batch_size),
    }
}
