//! Fully-connected network shared by every garment sub-model.

use burn::module::Module;
use burn::nn;
use burn::prelude::Backend;
use burn::tensor::Tensor;
use burn::tensor::activation::relu;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Mlp`].
///
/// `depth` counts linear layers, so the default of 3 gives
/// `input -> hidden -> hidden -> output`.
///
/// # Example
///
/// ```
/// use garment_models::MlpConfig;
///
/// let config = MlpConfig::new(86, 3 * 4000);
/// assert_eq!(config.hidden, 1024);
/// assert_eq!(config.depth, 3);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Input feature width.
    pub input_dim: usize,

    /// Output feature width (`3V` for vertex fields).
    pub output_dim: usize,

    /// Number of hidden units.
    pub hidden: usize,

    /// Number of linear layers, at least 2.
    pub depth: usize,

    /// Dropout probability after the first layer (training only).
    pub dropout: f64,
}

impl MlpConfig {
    /// Creates a configuration with the standard hidden width and depth.
    #[must_use]
    pub const fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            input_dim,
            output_dim,
            hidden: 1024,
            depth: 3,
            dropout: 0.2,
        }
    }

    /// Sets the hidden width.
    #[must_use]
    pub const fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Sets the number of linear layers.
    #[must_use]
    pub const fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the dropout probability.
    #[must_use]
    pub const fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `true` if all widths are positive, there are at least two
    /// layers and the dropout probability lies in `[0, 1)`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.input_dim > 0
            && self.output_dim > 0
            && self.hidden > 0
            && self.depth >= 2
            && (0.0..1.0).contains(&self.dropout)
    }
}

/// Feed-forward network: `Linear -> ReLU -> Dropout -> [Linear -> ReLU]* -> Linear`.
///
/// [`Mlp::forward`] is the inference path and never applies dropout, on any
/// backend. [`Mlp::forward_train`] applies it.
///
/// # Example
///
/// ```
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
/// use garment_models::{Mlp, MlpConfig};
///
/// let device = Default::default();
/// let config = MlpConfig::new(14, 9).with_hidden(16);
/// let model = Mlp::<NdArray<f32>>::new(&config, &device);
///
/// let output = model.forward(Tensor::zeros([2, 14], &device));
/// assert_eq!(output.dims(), [2, 9]);
/// ```
#[derive(Debug, Module)]
pub struct Mlp<B: Backend> {
    input: nn::Linear<B>,
    dropout: nn::Dropout,
    hidden: Vec<nn::Linear<B>>,
    output: nn::Linear<B>,
}

impl<B: Backend> Mlp<B> {
    /// Creates a randomly initialized network.
    ///
    /// A `depth` below 2 is treated as 2.
    #[must_use]
    pub fn new(config: &MlpConfig, device: &B::Device) -> Self {
        let input = nn::LinearConfig::new(config.input_dim, config.hidden).init(device);
        let dropout = nn::DropoutConfig::new(config.dropout).init();
        let hidden = (0..config.depth.saturating_sub(2))
            .map(|_| nn::LinearConfig::new(config.hidden, config.hidden).init(device))
            .collect();
        let output = nn::LinearConfig::new(config.hidden, config.output_dim).init(device);

        Self {
            input,
            dropout,
            hidden,
            output,
        }
    }

    /// Width of the input layer.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input.weight.val().dims()[0]
    }

    /// Width of the output layer.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.output.weight.val().dims()[1]
    }

    /// Number of linear layers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.hidden.len() + 2
    }

    /// Inference forward pass, `[batch, input_dim] -> [batch, output_dim]`.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.run(input, false)
    }

    /// Training forward pass with dropout after the first layer.
    pub fn forward_train(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.run(input, true)
    }

    fn run(&self, input: Tensor<B, 2>, train: bool) -> Tensor<B, 2> {
        let mut x = relu(self.input.forward(input));
        if train {
            x = self.dropout.forward(x);
        }
        for layer in &self.hidden {
            x = relu(layer.forward(x));
        }
        self.output.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn config_default_widths() {
        let config = MlpConfig::new(72, 30);
        assert_eq!(config.input_dim, 72);
        assert_eq!(config.output_dim, 30);
        assert_eq!(config.hidden, 1024);
        assert_eq!(config.depth, 3);
        assert!((config.dropout - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn config_builder() {
        let config = MlpConfig::new(10, 3)
            .with_hidden(32)
            .with_depth(5)
            .with_dropout(0.0);
        assert_eq!(config.hidden, 32);
        assert_eq!(config.depth, 5);
        assert!(config.is_valid());
    }

    #[test]
    fn config_rejects_shallow_or_empty() {
        assert!(!MlpConfig::new(10, 3).with_depth(1).is_valid());
        assert!(!MlpConfig::new(0, 3).is_valid());
        assert!(!MlpConfig::new(10, 3).with_hidden(0).is_valid());
        assert!(!MlpConfig::new(10, 3).with_dropout(1.0).is_valid());
    }

    #[test]
    fn config_serialization() {
        let config = MlpConfig::new(86, 12).with_hidden(8);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MlpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn layer_count_follows_depth() {
        let device = Default::default();
        for depth in 2..5 {
            let config = MlpConfig::new(4, 6).with_hidden(8).with_depth(depth);
            let model = Mlp::<TestBackend>::new(&config, &device);
            assert_eq!(model.depth(), depth);
            assert_eq!(model.input_dim(), 4);
            assert_eq!(model.output_dim(), 6);
        }
    }

    #[test]
    fn forward_shape() {
        let device = Default::default();
        let config = MlpConfig::new(72, 15).with_hidden(8);
        let model = Mlp::<TestBackend>::new(&config, &device);

        let output = model.forward(Tensor::zeros([3, 72], &device));
        assert_eq!(output.dims(), [3, 15]);
    }

    #[test]
    fn forward_is_deterministic() {
        let device = Default::default();
        let config = MlpConfig::new(4, 3).with_hidden(8).with_dropout(0.5);
        let model = Mlp::<TestBackend>::new(&config, &device);
        let input = Tensor::<TestBackend, 2>::ones([2, 4], &device);

        let a = model.forward(input.clone()).into_data().to_vec::<f32>().unwrap();
        let b = model.forward(input).into_data().to_vec::<f32>().unwrap();
        assert_eq!(a, b);
    }
}
