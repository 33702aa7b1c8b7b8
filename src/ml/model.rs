use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        BatchNorm, BatchNormConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

/// Channels of the last convolution, i.e. feature maps entering the dense stack.
const FEATURE_MAPS: usize = 6;

#[derive(Config, Debug)]
pub struct ShowerNetConfig {
    pub image_height: usize,
    pub image_width:  usize,
    #[config(default = 4)]
    pub num_classes:  usize,
    #[config(default = 0.2)]
    pub dropout:      f64,
}

impl ShowerNetConfig {
    /// Spatial extent of one image axis after the three conv/pool stages,
    /// or `None` when the image is smaller than the receptive field.
    fn reduced_extent(n: usize) -> Option<usize> {
        // conv5 + conv3, pool
        let n = n.checked_sub(4 + 2)? / 2;
        // conv3 + conv3, pool
        let n = n.checked_sub(2 + 2)? / 2;
        // conv3 ×3, pool
        let n = n.checked_sub(2 + 2 + 2)? / 2;
        (n > 0).then_some(n)
    }

    /// Width of the flattened convolution output.
    pub fn flattened_len(&self) -> Option<usize> {
        let h = Self::reduced_extent(self.image_height)?;
        let w = Self::reduced_extent(self.image_width)?;
        Some(FEATURE_MAPS * h * w)
    }

    /// Panics if the image is too small for the network; check
    /// `flattened_len` first when the geometry comes from user input.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ShowerNet<B> {
        let flat = self.flattened_len().unwrap_or_else(|| {
            panic!(
                "{}x{} images are too small for ShowerNet",
                self.image_height, self.image_width
            )
        });

        let conv = |ch_in: usize, ch_out: usize, k: usize| {
            Conv2dConfig::new([ch_in, ch_out], [k, k]).init::<B>(device)
        };

        ShowerNet {
            conv1: conv(1, 64, 5),
            conv2: conv(64, 32, 3),
            conv3: conv(32, 32, 3),
            conv4: conv(32, 32, 3),
            norm:  BatchNormConfig::new(32).init(device),
            conv5: conv(32, 32, 3),
            conv6: conv(32, 32, 3),
            conv7: conv(32, FEATURE_MAPS, 3),
            dense1: LinearConfig::new(flat, 512).init(device),
            dense2: LinearConfig::new(512, 128).init(device),
            dense3: LinearConfig::new(128, 32).init(device),
            // +1 for the energy sum concatenated after dense3
            particle_head: LinearConfig::new(32 + 1, self.num_classes).init(device),
            energy_head:   LinearConfig::new(32 + 1, 1).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct ShowerNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub conv2: Conv2d<B>,
    pub conv3: Conv2d<B>,
    pub conv4: Conv2d<B>,
    pub norm:  BatchNorm<B, 2>,
    pub conv5: Conv2d<B>,
    pub conv6: Conv2d<B>,
    pub conv7: Conv2d<B>,
    pub dense1: Linear<B>,
    pub dense2: Linear<B>,
    pub dense3: Linear<B>,
    pub particle_head: Linear<B>,
    pub energy_head:   Linear<B>,
    pub dropout: Dropout,
}

pub struct ShowerNetOutput<B: Backend> {
    /// Unnormalised class scores: [batch, num_classes]
    pub particle_logits: Tensor<B, 2>,
    /// Predicted beam energy: [batch, 1]
    pub energy: Tensor<B, 2>,
}

/// Loss terms of one batch; `total` is what gets minimised.
pub struct ShowerLoss<B: Backend> {
    pub total:    Tensor<B, 1>,
    pub particle: Tensor<B, 1>,
    pub energy:   Tensor<B, 1>,
}

/// 2×2 max pooling with stride 2; a trailing odd row or column is dropped.
///
/// Built from reshape + `max_dim` rather than `nn::pool::MaxPool2d`:
/// the ndarray backend's pooling backward decodes argmax indices with the
/// wrong stride on non-square maps, and 57×49 showers are not square.
pub fn max_pool_2x2<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [n, c, h, w] = x.dims();
    let (h2, w2) = (h / 2, w / 2);
    x.slice([0..n, 0..c, 0..h2 * 2, 0..w2 * 2])
        .reshape([n, c, h2, 2, w2, 2])
        .max_dim(5)
        .max_dim(3)
        .reshape([n, c, h2, w2])
}

impl<B: Backend> ShowerNet<B> {
    /// images: [batch, 1, H, W], esum: [batch, 1]
    pub fn forward(&self, images: Tensor<B, 4>, esum: Tensor<B, 2>) -> ShowerNetOutput<B> {
        let x = relu(self.conv1.forward(images));
        let x = relu(self.conv2.forward(x));
        let x = max_pool_2x2(x);

        let x = relu(self.conv3.forward(x));
        let x = relu(self.conv4.forward(x));
        let x = self.norm.forward(x);
        let x = max_pool_2x2(x);

        let x = relu(self.conv5.forward(x));
        let x = relu(self.conv6.forward(x));
        let x = relu(self.conv7.forward(x));
        let x = max_pool_2x2(x);

        let x = x.flatten::<2>(1, 3);
        let x = self.dropout.forward(relu(self.dense1.forward(x)));
        let x = self.dropout.forward(relu(self.dense2.forward(x)));
        let x = relu(self.dense3.forward(x));

        let x = Tensor::cat(vec![x, esum], 1);

        ShowerNetOutput {
            particle_logits: self.particle_head.forward(x.clone()),
            energy:          self.energy_head.forward(x),
        }
    }

    /// Class probabilities for each sample: [batch, num_classes]
    pub fn predict_proba(&self, images: Tensor<B, 4>, esum: Tensor<B, 2>) -> Tensor<B, 2> {
        let output = self.forward(images, esum);
        burn::tensor::activation::softmax(output.particle_logits, 1)
    }
}

/// Cross-entropy on the particle class plus mean squared
/// logarithmic error on the energy.
pub fn shower_loss<B: Backend>(
    output: &ShowerNetOutput<B>,
    labels: Tensor<B, 1, Int>,
    energy: Tensor<B, 2>,
) -> ShowerLoss<B> {
    let ce = CrossEntropyLossConfig::new().init(&output.particle_logits.device());
    let particle = ce.forward(output.particle_logits.clone(), labels);
    let energy   = mean_squared_log_error(output.energy.clone(), energy);
    ShowerLoss { total: particle.clone() + energy.clone(), particle, energy }
}

/// mean((ln(1 + max(pred, 0)) - ln(1 + max(target, 0)))²)
pub fn mean_squared_log_error<B: Backend, const D: usize>(
    pred:   Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    let log_pred   = pred.clamp_min(0.0).add_scalar(1.0).log();
    let log_target = target.clamp_min(0.0).add_scalar(1.0).log();
    (log_pred - log_target).powf_scalar(2.0).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_flattened_len_for_default_geometry() {
        // 57x49 → 2x1 after the three stages, 6 feature maps
        let cfg = ShowerNetConfig::new(57, 49);
        assert_eq!(cfg.flattened_len(), Some(12));
    }

    #[test]
    fn test_small_images_are_rejected() {
        assert_eq!(ShowerNetConfig::new(20, 49).flattened_len(), None);
        assert_eq!(ShowerNetConfig::new(57, 0).flattened_len(), None);
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model: ShowerNet<TestBackend> = ShowerNetConfig::new(57, 49).init(&device);

        let images = Tensor::<TestBackend, 4>::ones([3, 1, 57, 49], &device);
        let esum   = Tensor::<TestBackend, 2>::ones([3, 1], &device);
        let output = model.forward(images.clone(), esum.clone());
        assert_eq!(output.particle_logits.dims(), [3, 4]);
        assert_eq!(output.energy.dims(), [3, 1]);

        let proba = model.predict_proba(images, esum);
        let rows: Vec<f32> = proba.sum_dim(1).into_data().convert::<f32>().to_vec().unwrap();
        for r in rows {
            assert!((r - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_loss_is_finite() {
        let device = Default::default();
        let model: ShowerNet<TestBackend> = ShowerNetConfig::new(57, 49).init(&device);

        let images = Tensor::<TestBackend, 4>::random(
            [2, 1, 57, 49],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let esum   = images.clone().sum_dim(3).sum_dim(2).reshape([2, 1]);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 2], &device);
        let energy = Tensor::<TestBackend, 1>::from_floats([5.0, 80.0], &device).reshape([2, 1]);

        let output = model.forward(images, esum);
        let loss   = shower_loss(&output, labels, energy);
        let total: f64 = loss.total.into_scalar().elem();
        assert!(total.is_finite());
        assert!(total > 0.0);
    }

    #[test]
    fn test_pooling_on_non_square_map() {
        let device = Default::default();
        // 1×1×4×3 map: rows 0..4, values 0..12 row-major
        let x = Tensor::<TestBackend, 1>::from_floats(
            [0., 1., 2., 3., 4., 5., 6., 7., 8., 9., 10., 11.],
            &device,
        )
        .reshape([1, 1, 4, 3]);
        let pooled = max_pool_2x2(x);
        assert_eq!(pooled.dims(), [1, 1, 2, 1]);
        let v: Vec<f32> = pooled.into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(v, vec![4.0, 10.0]);
    }

    #[test]
    fn test_pooling_gradient_reaches_the_maximum() {
        use burn::backend::Autodiff;
        let device = Default::default();
        let x = Tensor::<Autodiff<TestBackend>, 1>::from_floats(
            [0., 1., 2., 3., 4., 5., 6., 7.],
            &device,
        )
        .reshape([1, 1, 4, 2])
        .require_grad();

        let grads = max_pool_2x2(x.clone()).sum().backward();
        let g: Vec<f32> = x.grad(&grads).unwrap().into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(g, vec![0., 0., 0., 1., 0., 0., 0., 1.]);
    }

    #[test]
    fn test_backward_pass_at_default_geometry() {
        use burn::backend::Autodiff;
        type B = Autodiff<TestBackend>;
        let device = Default::default();
        let model: ShowerNet<B> = ShowerNetConfig::new(57, 49).init(&device);

        let images = Tensor::<B, 4>::random(
            [2, 1, 57, 49],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let esum   = images.clone().sum_dim(3).sum_dim(2).reshape([2, 1]);
        let labels = Tensor::<B, 1, Int>::from_ints([1, 3], &device);
        let energy = Tensor::<B, 1>::from_floats([10.0, 40.0], &device).reshape([2, 1]);

        let loss  = shower_loss(&model.forward(images, esum), labels, energy);
        let grads = loss.total.backward();
        assert!(model.conv1.weight.grad(&grads).is_some());
    }

    #[test]
    fn test_msle_of_identical_inputs_is_zero() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([0.0, 3.0, 99.0], &device);
        let v: f64 = mean_squared_log_error(x.clone(), x).into_scalar().elem();
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn test_msle_clamps_negative_predictions() {
        let device = Default::default();
        let pred   = Tensor::<TestBackend, 1>::from_floats([-5.0], &device);
        let target = Tensor::<TestBackend, 1>::from_floats([0.0], &device);
        let v: f64 = mean_squared_log_error(pred, target).into_scalar().elem();
        assert!(v.abs() < 1e-9);
    }
}
