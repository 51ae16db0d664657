//! RBF kernel blending of per-pivot high-frequency fields.
//!
//! For a query with predicted rest vertices `r` and pivot bases `c_p`:
//!
//! ```text
//! dist[b, p] = scale * mean_v |r[b, v] - c_p[v]|^2
//! w[b, p]    = exp(-dist[b, p] / sigma) / sum_p' exp(-dist[b, p'] / sigma)
//! out[b]     = sum_p w[b, p] * hf[b, p]
//! ```
//!
//! Weights are normalized on the host in `f64` after subtracting each row's
//! minimum distance, which leaves the result unchanged and keeps the nearest
//! pivot's weight at exactly one before normalization.

use std::fmt;

use burn::prelude::Backend;
use burn::tensor::{Tensor, TensorData};
use garment_types::CanonicalBasis;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::predictor::PivotPredictor;

/// What to do with a row whose weights cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Weight every pivot `1/P` and log a warning.
    #[default]
    Uniform,

    /// Fail with [`ModelError::DegenerateKernelWeights`].
    Fail,
}

impl fmt::Display for DegeneratePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Kernel bandwidth and numerical guards.
///
/// # Example
///
/// ```
/// use garment_models::{DegeneratePolicy, KernelConfig};
///
/// let config = KernelConfig::default().with_sigma(0.05);
/// assert_eq!(config.distance_scale, 1000.0);
/// assert_eq!(config.degenerate, DegeneratePolicy::Uniform);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// RBF bandwidth; smaller is sharper.
    pub sigma: f64,

    /// Factor applied to the mean squared vertex distance.
    pub distance_scale: f64,

    /// Smallest acceptable sum of shifted weights.
    ///
    /// The nearest pivot always contributes `exp(0) = 1`, so the sum lies in
    /// `[1, P]`. A floor above 1 rejects rows where fewer than that many
    /// pivots carry weight. `0.0` disables the check.
    pub weight_floor: f64,

    /// Policy for rows that cannot be normalized.
    pub degenerate: DegeneratePolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            sigma: 0.01,
            distance_scale: 1000.0,
            weight_floor: 0.0,
            degenerate: DegeneratePolicy::Uniform,
        }
    }
}

impl KernelConfig {
    /// Sets the bandwidth.
    #[must_use]
    pub const fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the distance scale.
    #[must_use]
    pub const fn with_distance_scale(mut self, scale: f64) -> Self {
        self.distance_scale = scale;
        self
    }

    /// Sets the denominator floor.
    #[must_use]
    pub const fn with_weight_floor(mut self, floor: f64) -> Self {
        self.weight_floor = floor;
        self
    }

    /// Sets the degenerate-row policy.
    #[must_use]
    pub const fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate = policy;
        self
    }

    /// Returns `true` if sigma and scale are finite and positive and the
    /// floor is finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.sigma.is_finite()
            && self.sigma > 0.0
            && self.distance_scale.is_finite()
            && self.distance_scale > 0.0
            && self.weight_floor.is_finite()
            && self.weight_floor >= 0.0
    }

    /// Turns one row of scaled distances into weights summing to one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DegenerateKernelWeights`] if the row cannot be
    /// normalized and the policy is [`DegeneratePolicy::Fail`].
    ///
    /// # Example
    ///
    /// ```
    /// use garment_models::KernelConfig;
    ///
    /// let weights = KernelConfig::default().normalize(0, &[0.0, 0.0, 0.0, 0.0]).unwrap();
    /// assert_eq!(weights, vec![0.25; 4]);
    /// ```
    pub fn normalize(&self, row: usize, distances: &[f64]) -> Result<Vec<f64>> {
        if distances.is_empty() {
            return Err(ModelError::degenerate_kernel_weights(row, "no pivots"));
        }
        if let Some(bad) = distances.iter().find(|d| !d.is_finite()) {
            return self.degenerate(row, distances.len(), &format!("non-finite distance {bad}"));
        }

        let nearest = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let raw: Vec<f64> = distances
            .iter()
            .map(|d| (-(d - nearest) / self.sigma).exp())
            .collect();
        let total: f64 = raw.iter().sum();

        if !total.is_finite() || total < self.weight_floor {
            return self.degenerate(row, distances.len(), &format!("weight sum {total}"));
        }
        Ok(raw.into_iter().map(|w| w / total).collect())
    }

    fn degenerate(&self, row: usize, pivots: usize, reason: &str) -> Result<Vec<f64>> {
        match self.degenerate {
            DegeneratePolicy::Uniform => {
                warn!(row, pivots, reason, "Degenerate kernel weights, using uniform blend");
                #[allow(clippy::cast_precision_loss)]
                let weight = 1.0 / pivots as f64;
                Ok(vec![weight; pivots])
            }
            DegeneratePolicy::Fail => Err(ModelError::degenerate_kernel_weights(row, reason)),
        }
    }
}

/// Blends `[batch, P, V, 3]` pivot fields using distances to a canonical basis.
#[derive(Debug, Clone)]
pub struct KernelBlender<B: Backend> {
    basis: Tensor<B, 3>,
    config: KernelConfig,
}

impl<B: Backend> KernelBlender<B> {
    /// Uploads the basis and checks the kernel configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] if the configuration is invalid.
    pub fn new(basis: &CanonicalBasis, config: KernelConfig, device: &B::Device) -> Result<Self> {
        if !config.is_valid() {
            return Err(ModelError::invalid_config(format!(
                "kernel sigma {} / scale {} / floor {}",
                config.sigma, config.distance_scale, config.weight_floor
            )));
        }
        let data = TensorData::new(basis.as_slice().to_vec(), basis.shape());
        Ok(Self {
            basis: Tensor::from_data(data, device),
            config,
        })
    }

    /// Kernel configuration.
    #[must_use]
    pub const fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Number of pivots in the basis.
    #[must_use]
    pub fn pivot_count(&self) -> usize {
        self.basis.dims()[0]
    }

    /// Vertices per basis entry.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.basis.dims()[1]
    }

    /// Scaled mean squared distance from each rest field to each pivot,
    /// `[batch, V, 3] -> [batch, P]`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the vertex count differs from
    /// the basis.
    pub fn distances(&self, rest: Tensor<B, 3>) -> Result<Tensor<B, 2>> {
        let [batch, vertices, _] = rest.dims();
        let [pivots, basis_vertices, _] = self.basis.dims();
        if vertices != basis_vertices {
            return Err(ModelError::shape_mismatch(
                format!("{basis_vertices} rest vertices"),
                vertices.to_string(),
            ));
        }

        let rest = rest.unsqueeze_dim::<4>(1).repeat_dim(1, pivots);
        let basis = self.basis.clone().unsqueeze_dim::<4>(0).repeat_dim(0, batch);
        let diff = rest - basis;

        #[allow(clippy::cast_possible_truncation)]
        let scale = self.config.distance_scale as f32;
        Ok(diff
            .clone()
            .mul(diff)
            .sum_dim(3)
            .mean_dim(2)
            .reshape([batch, pivots])
            .mul_scalar(scale))
    }

    /// Normalized kernel weights `[batch, P]` for predicted rest vertices.
    ///
    /// # Errors
    ///
    /// - [`ModelError::ShapeMismatch`] on a vertex-count mismatch
    /// - [`ModelError::DegenerateKernelWeights`] under
    ///   [`DegeneratePolicy::Fail`]
    #[allow(clippy::cast_possible_truncation)]
    pub fn weights(&self, rest: Tensor<B, 3>) -> Result<Tensor<B, 2>> {
        let device = rest.device();
        let distances = self.distances(rest)?;
        let [batch, pivots] = distances.dims();

        let host = host_values(distances)?;
        let mut weights = Vec::with_capacity(batch * pivots);
        for (row, chunk) in host.chunks_exact(pivots).enumerate() {
            let row_distances: Vec<f64> = chunk.iter().map(|&d| f64::from(d)).collect();
            let normalized = self.config.normalize(row, &row_distances)?;
            weights.extend(normalized.into_iter().map(|w| w as f32));
        }

        Ok(Tensor::from_data(
            TensorData::new(weights, [batch, pivots]),
            &device,
        ))
    }

    /// Collapses the pivot axis: `[batch, P, V, 3] x [batch, P] -> [batch, V, 3]`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if batch or pivot counts differ.
    pub fn blend(&self, fields: Tensor<B, 4>, weights: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
        let [batch, pivots, vertices, dim] = fields.dims();
        if weights.dims() != [batch, pivots] {
            return Err(ModelError::shape_mismatch(
                format!("weights [{batch}, {pivots}]"),
                format!("{:?}", weights.dims()),
            ));
        }

        let weights = weights.reshape([batch, pivots, 1, 1]);
        Ok(fields
            .mul(weights)
            .sum_dim(1)
            .reshape([batch, vertices, dim]))
    }

    /// Weights the pivot fields by their closeness to `rest` and sums them.
    ///
    /// # Errors
    ///
    /// See [`KernelBlender::weights`] and [`KernelBlender::blend`].
    pub fn blend_for(&self, fields: Tensor<B, 4>, rest: Tensor<B, 3>) -> Result<Tensor<B, 3>> {
        let weights = self.weights(rest)?;
        self.blend(fields, weights)
    }
}

/// Runs every pivot predictor on the same pose and stacks the results in
/// pivot order, `[batch, P, V, 3]`.
///
/// # Errors
///
/// - [`ModelError::InvalidInput`] on a pose width other than 72
/// - [`ModelError::ShapeMismatch`] if the predictors disagree on vertex count
///   or the slice is empty
pub fn stack_pivot_fields<B, P>(predictors: &[P], thetas: &Tensor<B, 2>) -> Result<Tensor<B, 4>>
where
    B: Backend,
    P: PivotPredictor<B>,
{
    let vertex_count = predictors
        .first()
        .map(PivotPredictor::vertex_count)
        .ok_or_else(|| ModelError::shape_mismatch("at least one pivot", "0"))?;

    let fields = predictors
        .iter()
        .map(|predictor| {
            if predictor.vertex_count() != vertex_count {
                return Err(ModelError::shape_mismatch(
                    format!("{vertex_count} vertices"),
                    format!("{} for pivot {}", predictor.vertex_count(), predictor.pivot()),
                ));
            }
            predictor.forward_pose(thetas.clone())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Tensor::stack(fields, 1))
}

/// Copies a tensor's values to the host as `f32`.
pub(crate) fn host_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| ModelError::serialization(format!("tensor readback: {e:?}")))
}
