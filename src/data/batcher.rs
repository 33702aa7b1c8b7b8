// ============================================================
// Layer 4 — Shower Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<ShowerSample>
// into tensors for the two-input network.
//
// How batching works here:
//   Input:  N samples, each with an H×W image
//   Output: images [N, 1, H, W], esum [N, 1],
//           labels [N], energy [N, 1]
//
//   All images are flattened into one long Vec and reshaped,
//   exactly like stacking N single-channel pictures.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ShowerSample;

// ─── ShowerBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ShowerBatch<B: Backend> {
    /// Hit histograms, shape [batch_size, 1, height, width]
    pub images: Tensor<B, 4>,

    /// Energy sums, shape [batch_size, 1]
    pub esum: Tensor<B, 2>,

    /// Particle class indices, shape [batch_size]
    pub labels: Tensor<B, 1, Int>,

    /// Beam energies, shape [batch_size, 1]
    pub energy: Tensor<B, 2>,
}

impl<B: Backend> ShowerBatch<B> {
    pub fn size(&self) -> usize {
        self.labels.dims()[0]
    }
}

// ─── ShowerBatcher ────────────────────────────────────────────────────────────
/// Holds the target device and the image geometry.
#[derive(Clone, Debug)]
pub struct ShowerBatcher<B: Backend> {
    pub device: B::Device,
    pub height: usize,
    pub width:  usize,
}

impl<B: Backend> ShowerBatcher<B> {
    pub fn new(device: B::Device, height: usize, width: usize) -> Self {
        Self { device, height, width }
    }
}

impl<B: Backend> Batcher<ShowerSample, ShowerBatch<B>> for ShowerBatcher<B> {
    fn batch(&self, items: Vec<ShowerSample>) -> ShowerBatch<B> {
        let batch_size = items.len();

        let image_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.image.iter().copied())
            .collect();
        let esum: Vec<f32>   = items.iter().map(|s| s.esum).collect();
        let energy: Vec<f32> = items.iter().map(|s| s.beam_energy).collect();
        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let images = Tensor::<B, 1>::from_floats(image_flat.as_slice(), &self.device)
            .reshape([batch_size, 1, self.height, self.width]);

        let esum = Tensor::<B, 1>::from_floats(esum.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let energy = Tensor::<B, 1>::from_floats(energy.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ShowerBatch { images, esum, labels, energy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = ShowerBatcher::<NdArray>::new(device, 2, 3);
        let items   = vec![
            ShowerSample::new(vec![1.0; 6], 0, 10.0),
            ShowerSample::new(vec![2.0; 6], 3, 50.0),
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 1, 2, 3]);
        assert_eq!(batch.esum.dims(), [2, 1]);
        assert_eq!(batch.energy.dims(), [2, 1]);
        assert_eq!(batch.size(), 2);

        let esum = batch.esum.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(esum, vec![6.0, 12.0]);
        let labels = batch.labels.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![0, 3]);
    }
}
