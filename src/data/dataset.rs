use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One labelled shower: its hit histogram plus the two targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowerSample {
    /// Row-major H×W hit histogram.
    pub image:       Vec<f32>,
    /// Total deposit, fed to the network next to the image.
    pub esum:        f32,
    /// Particle class index (see `ParticleKind::class_index`).
    pub label:       usize,
    pub beam_energy: f32,
}

impl ShowerSample {
    pub fn new(image: Vec<f32>, label: usize, beam_energy: f32) -> Self {
        let esum = image.iter().sum();
        Self { image, esum, label, beam_energy }
    }
}

pub struct ShowerDataset {
    samples: Vec<ShowerSample>,
}

impl ShowerDataset {
    pub fn new(samples: Vec<ShowerSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<ShowerSample> for ShowerDataset {
    fn get(&self, index: usize) -> Option<ShowerSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
