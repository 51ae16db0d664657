//! Checkpoint directory conventions and ordered fallback chains.
//!
//! ```text
//! {checkpoints}/{category}_{gender}_weights/{stage}/{category}_{gender}[/{shape}_{style}]/
//!     params.json
//!     lin.bin | lin.json
//! {checkpoints}/{baseline}/params.json
//! {checkpoints}/{baseline}/{stage}[/{shape}_{style}]/lin.bin | lin.json
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use garment_types::{GarmentCategory, Gender, Pivot, instance_name};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::checkpoint::CheckpointFormat;
use crate::error::{ModelError, Result};
use crate::predictor::{HF_INPUT_DIM, LF_INPUT_DIM, SS2G_INPUT_DIM};

/// Per-network hyperparameter file name.
pub const PARAMS_FILE: &str = "params.json";

/// Weights file stem; the extension comes from the [`CheckpointFormat`].
pub const WEIGHTS_STEM: &str = "lin";

/// Baseline directory used when an instance has no files of its own.
pub const DEFAULT_BASELINE_DIR: &str = "tn_orig_baseline/t-shirt_female";

/// Which sub-model a checkpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Low-frequency displacement network.
    LowFrequency,
    /// Per-pivot high-frequency network.
    HighFrequency,
    /// Shape-style-to-geometry network.
    Ss2g,
}

impl Stage {
    /// All stages.
    pub const ALL: [Self; 3] = [Self::LowFrequency, Self::HighFrequency, Self::Ss2g];

    /// Directory name of this stage.
    #[must_use]
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::LowFrequency => "tn_orig_lf",
            Self::HighFrequency => "tn_orig_hf",
            Self::Ss2g => "tn_orig_ss2g",
        }
    }

    /// Input width of this stage's network.
    #[must_use]
    pub const fn input_dim(&self) -> usize {
        match self {
            Self::LowFrequency => LF_INPUT_DIM,
            Self::HighFrequency => HF_INPUT_DIM,
            Self::Ss2g => SS2G_INPUT_DIM,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// A value resolved from a [`ResourceChain`].
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The loaded value.
    pub value: T,
    /// The candidate it came from.
    pub path: PathBuf,
    /// Whether the candidate was a fallback.
    pub fallback: bool,
}

/// Ordered candidate locations for one resource; first successful load wins.
///
/// # Example
///
/// ```
/// use garment_models::ResourceChain;
///
/// let chain = ResourceChain::new("params")
///     .push("instance/params.json")
///     .push_fallback("baseline/params.json");
/// assert_eq!(chain.candidates().count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceChain {
    resource: String,
    candidates: Vec<(PathBuf, bool)>,
}

impl ResourceChain {
    /// Creates an empty chain for `resource`.
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            candidates: Vec::new(),
        }
    }

    /// Appends a primary candidate.
    #[must_use]
    pub fn push(mut self, path: impl Into<PathBuf>) -> Self {
        self.candidates.push((path.into(), false));
        self
    }

    /// Appends a fallback candidate.
    #[must_use]
    pub fn push_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.candidates.push((path.into(), true));
        self
    }

    /// What this chain resolves.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Candidate paths in resolution order.
    pub fn candidates(&self) -> impl Iterator<Item = &Path> {
        self.candidates.iter().map(|(path, _)| path.as_path())
    }

    /// Loads the first candidate that exists and loads cleanly.
    ///
    /// Missing candidates are skipped silently; candidates that exist but
    /// fail to load are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingWeights`] listing every candidate if none
    /// loads.
    pub fn resolve<T, F>(&self, mut load: F) -> Result<Resolved<T>>
    where
        F: FnMut(&Path) -> Result<T>,
    {
        for (path, fallback) in &self.candidates {
            if !path.exists() {
                continue;
            }
            match load(path) {
                Ok(value) => {
                    if *fallback {
                        warn!(resource = %self.resource, path = %path.display(), "Using fallback");
                    } else {
                        debug!(resource = %self.resource, path = %path.display(), "Resolved");
                    }
                    return Ok(Resolved {
                        value,
                        path: path.clone(),
                        fallback: *fallback,
                    });
                }
                Err(err) => {
                    warn!(
                        resource = %self.resource,
                        path = %path.display(),
                        error = %err,
                        "Skipping unreadable candidate"
                    );
                }
            }
        }

        Err(ModelError::missing_weights(
            &self.resource,
            self.candidates()
                .map(|path| path.display().to_string())
                .collect(),
        ))
    }
}

/// Checkpoint paths for one `{category}_{gender}` instance.
///
/// # Example
///
/// ```
/// use garment_models::{CheckpointLayout, Stage};
/// use garment_types::{GarmentCategory, Gender, Pivot};
/// use std::path::Path;
///
/// let layout = CheckpointLayout::new("ckpt", GarmentCategory::Pant, Gender::Male);
/// assert_eq!(
///     layout.stage_dir(Stage::HighFrequency, Some(Pivot::new(0, 3))),
///     Path::new("ckpt/pant_male_weights/tn_orig_hf/pant_male/000_003"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLayout {
    root: PathBuf,
    instance: String,
    baseline_dir: PathBuf,
}

impl CheckpointLayout {
    /// Creates a layout under `root` with the default baseline directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, category: GarmentCategory, gender: Gender) -> Self {
        Self {
            root: root.into(),
            instance: instance_name(category, gender),
            baseline_dir: PathBuf::from(DEFAULT_BASELINE_DIR),
        }
    }

    /// Sets the baseline directory, relative to the checkpoint root.
    #[must_use]
    pub fn with_baseline_dir(mut self, baseline_dir: impl Into<PathBuf>) -> Self {
        self.baseline_dir = baseline_dir.into();
        self
    }

    /// Checkpoint root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one network's files.
    #[must_use]
    pub fn stage_dir(&self, stage: Stage, pivot: Option<Pivot>) -> PathBuf {
        let dir = self
            .root
            .join(format!("{}_weights", self.instance))
            .join(stage.dir_name())
            .join(&self.instance);
        with_pivot(dir, pivot)
    }

    /// Baseline directory holding one network's weights.
    #[must_use]
    pub fn baseline_stage_dir(&self, stage: Stage, pivot: Option<Pivot>) -> PathBuf {
        let dir = self.root.join(&self.baseline_dir).join(stage.dir_name());
        with_pivot(dir, pivot)
    }

    /// Path of one network's weights in a given format.
    #[must_use]
    pub fn weights_path(
        &self,
        stage: Stage,
        pivot: Option<Pivot>,
        format: CheckpointFormat,
    ) -> PathBuf {
        self.stage_dir(stage, pivot)
            .join(WEIGHTS_STEM)
            .with_extension(format.extension())
    }

    /// Path of one network's hyperparameters.
    #[must_use]
    pub fn params_path(&self, stage: Stage, pivot: Option<Pivot>) -> PathBuf {
        self.stage_dir(stage, pivot).join(PARAMS_FILE)
    }

    /// Instance `params.json`, then the baseline `params.json`.
    #[must_use]
    pub fn params_chain(&self, stage: Stage, pivot: Option<Pivot>) -> ResourceChain {
        ResourceChain::new(resource_name("params", stage, pivot))
            .push(self.params_path(stage, pivot))
            .push_fallback(self.root.join(&self.baseline_dir).join(PARAMS_FILE))
    }

    /// Instance weights in every format, then baseline weights in every format.
    #[must_use]
    pub fn weights_chain(&self, stage: Stage, pivot: Option<Pivot>) -> ResourceChain {
        let baseline = self.baseline_stage_dir(stage, pivot).join(WEIGHTS_STEM);
        let mut chain = ResourceChain::new(resource_name("weights", stage, pivot));
        for format in CheckpointFormat::ALL {
            chain = chain.push(self.weights_path(stage, pivot, format));
        }
        for format in CheckpointFormat::ALL {
            chain = chain.push_fallback(baseline.with_extension(format.extension()));
        }
        chain
    }
}

fn with_pivot(dir: PathBuf, pivot: Option<Pivot>) -> PathBuf {
    match pivot {
        Some(pivot) => dir.join(pivot.dir_name()),
        None => dir,
    }
}

fn resource_name(kind: &str, stage: Stage, pivot: Option<Pivot>) -> String {
    match pivot {
        Some(pivot) => format!("{stage}/{pivot} {kind}"),
        None => format!("{stage} {kind}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn layout() -> CheckpointLayout {
        CheckpointLayout::new("ckpt", GarmentCategory::TShirt, Gender::Female)
    }

    #[test]
    fn stage_dir_names() {
        assert_eq!(Stage::LowFrequency.dir_name(), "tn_orig_lf");
        assert_eq!(Stage::HighFrequency.to_string(), "tn_orig_hf");
        assert_eq!(Stage::Ss2g.dir_name(), "tn_orig_ss2g");
        assert_eq!(Stage::Ss2g.input_dim(), 14);
    }

    #[test]
    fn instance_paths() {
        let layout = layout();
        assert_eq!(
            layout.params_path(Stage::LowFrequency, None),
            Path::new("ckpt/t-shirt_female_weights/tn_orig_lf/t-shirt_female/params.json")
        );
        assert_eq!(
            layout.weights_path(Stage::Ss2g, None, CheckpointFormat::Json),
            Path::new("ckpt/t-shirt_female_weights/tn_orig_ss2g/t-shirt_female/lin.json")
        );
    }

    #[test]
    fn params_chain_falls_back_to_baseline() {
        let chain = layout().params_chain(Stage::HighFrequency, Some(Pivot::new(1, 2)));
        let candidates: Vec<_> = chain.candidates().collect();
        assert_eq!(
            candidates,
            vec![
                Path::new(
                    "ckpt/t-shirt_female_weights/tn_orig_hf/t-shirt_female/001_002/params.json"
                ),
                Path::new("ckpt/tn_orig_baseline/t-shirt_female/params.json"),
            ]
        );
        assert_eq!(chain.resource(), "tn_orig_hf/001_002 params");
    }

    #[test]
    fn weights_chain_order() {
        let chain = layout()
            .with_baseline_dir("base")
            .weights_chain(Stage::LowFrequency, None);
        let candidates: Vec<_> = chain.candidates().collect();
        assert_eq!(
            candidates,
            vec![
                Path::new("ckpt/t-shirt_female_weights/tn_orig_lf/t-shirt_female/lin.bin"),
                Path::new("ckpt/t-shirt_female_weights/tn_orig_lf/t-shirt_female/lin.json"),
                Path::new("ckpt/base/tn_orig_lf/lin.bin"),
                Path::new("ckpt/base/tn_orig_lf/lin.json"),
            ]
        );
    }

    #[test]
    fn resolve_first_existing_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");
        fs::write(&first, "first").unwrap();
        fs::write(&second, "second").unwrap();

        let chain = ResourceChain::new("text").push(&first).push_fallback(&second);
        let resolved = chain.resolve(|p| Ok(fs::read_to_string(p)?)).unwrap();
        assert_eq!(resolved.value, "first");
        assert!(!resolved.fallback);
    }

    #[test]
    fn resolve_skips_missing_and_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.txt");
        let good = dir.path().join("good.txt");
        fs::write(&broken, "broken").unwrap();
        fs::write(&good, "good").unwrap();

        let chain = ResourceChain::new("text")
            .push(dir.path().join("missing.txt"))
            .push(&broken)
            .push_fallback(&good);
        let resolved = chain
            .resolve(|p| {
                let text = fs::read_to_string(p)?;
                if text == "broken" {
                    Err(ModelError::load_checkpoint(p.display().to_string(), "corrupt"))
                } else {
                    Ok(text)
                }
            })
            .unwrap();
        assert_eq!(resolved.value, "good");
        assert_eq!(resolved.path, good);
        assert!(resolved.fallback);
    }

    #[test]
    fn resolve_exhausted_is_missing_weights() {
        let chain = ResourceChain::new("weights")
            .push("/nope/a.bin")
            .push_fallback("/nope/b.bin");
        let err = chain.resolve(|_| Ok(())).unwrap_err();
        match err {
            ModelError::MissingWeights { resource, tried } => {
                assert_eq!(resource, "weights");
                assert_eq!(tried, vec!["/nope/a.bin", "/nope/b.bin"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
