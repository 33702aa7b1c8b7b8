// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores ShowerNet weights using Burn's CompactRecorder.
//
// Only the best model (lowest validation loss) is kept:
//
//   checkpoints/
//     best_model.mpk.gz    ← weights of the best epoch so far
//     best_epoch.json      ← which epoch that was
//     train_config.json    ← hyperparameters and image geometry
//
// The config is needed to rebuild the exact architecture before
// the weights can be loaded into it.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::ShowerNet;

const BEST_MODEL: &str  = "best_model";
// File the recorder actually writes for BEST_MODEL
const BEST_MODEL_FILE: &str = "best_model.mpk.gz";
const BEST_EPOCH: &str  = "best_epoch.json";
const CONFIG_FILE: &str = "train_config.json";

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating its directory like `mkdir -p`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Overwrite the best checkpoint with `model`.
    pub fn save_best<B: Backend>(&self, model: &ShowerNet<B>, epoch: usize) -> Result<()> {
        // The recorder appends its own extension
        let path = self.dir.join(BEST_MODEL);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        fs::write(self.dir.join(BEST_EPOCH), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {BEST_EPOCH}"))?;

        tracing::debug!("Saved best checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the best checkpoint into `model`, which must have the
    /// architecture the checkpoint was saved with.
    pub fn load_best<B: Backend>(
        &self,
        model:  ShowerNet<B>,
        device: &B::Device,
    ) -> Result<ShowerNet<B>> {
        let epoch = self.best_epoch()?;
        let path  = self.dir.join(BEST_MODEL);

        tracing::info!("Loading best checkpoint (epoch {})", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Has training run?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Remove the best checkpoint and its epoch marker, if present.
    pub fn clear_best(&self) -> Result<()> {
        for name in [BEST_MODEL_FILE, BEST_EPOCH] {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed stale '{}'", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Cannot remove '{}'", path.display()));
                }
            }
        }
        Ok(())
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    /// Epoch of the saved best model. Errors if nothing was saved yet.
    pub fn best_epoch(&self) -> Result<usize> {
        let path = self.dir.join(BEST_EPOCH);

        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Has training run?", path.display()))?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::ml::model::ShowerNetConfig;

    #[test]
    fn test_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("ckpt")).unwrap();

        let cfg = TrainConfig { epochs: 3, batch_size: 16, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.batch_size, 16);
        assert_eq!(loaded.image_height, cfg.image_height);
    }

    #[test]
    fn test_best_model_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let cfg    = ShowerNetConfig::new(57, 49);

        assert!(ckpt.best_epoch().is_err());

        let model: ShowerNet<NdArray> = cfg.init(&device);
        ckpt.save_best(&model, 4).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), 4);

        let fresh: ShowerNet<NdArray> = cfg.init(&device);
        let loaded = ckpt.load_best(fresh, &device).unwrap();

        assert!(dir.path().join(BEST_MODEL_FILE).exists());

        let saved: Vec<f32> = model.dense3.weight.val().into_data().convert::<f32>().to_vec().unwrap();
        let restored: Vec<f32> = loaded.dense3.weight.val().into_data().convert::<f32>().to_vec().unwrap();
        // CompactRecorder stores half precision
        assert_eq!(saved.len(), restored.len());
        for (a, b) in saved.iter().zip(&restored) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn test_clear_best_removes_checkpoint() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        // Nothing saved yet
        ckpt.clear_best().unwrap();

        let model: ShowerNet<NdArray> = ShowerNetConfig::new(57, 49).init(&Default::default());
        ckpt.save_best(&model, 2).unwrap();
        ckpt.save_config(&TrainConfig::default()).unwrap();

        ckpt.clear_best().unwrap();
        assert!(ckpt.best_epoch().is_err());
        assert!(!dir.path().join(BEST_MODEL_FILE).exists());
        assert!(ckpt.load_config().is_ok());
    }
}
