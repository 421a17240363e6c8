use std::path::Path;

use crate::error::{EvaluatorError, ModelLoadError, ScoreError};
use crate::model::{ModelArtifacts, ReconstructionModel, Transform};

use super::{LabeledSample, Sample};

pub const DEFAULT_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub error: f64,
    pub is_anomaly: bool,
}

/// Reconstruction-error scorer. Holds only fitted parameters, so it is
/// safe to share across evaluators.
pub struct Scorer {
    transform: Box<dyn Transform>,
    model: Box<dyn ReconstructionModel>,
    threshold: f64,
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("dimension", &self.transform.dimension())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl Scorer {
    pub fn new(
        transform: impl Transform + 'static,
        model: impl ReconstructionModel + 'static,
        threshold: f64,
    ) -> Result<Self, EvaluatorError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EvaluatorError::InvalidConfig(format!(
                "threshold must be a finite non-negative number, got {}",
                threshold
            )));
        }
        let dim = transform.dimension();
        if model.input_dimension() != dim || model.output_dimension() != dim {
            return Err(EvaluatorError::InvalidConfig(format!(
                "model maps {} -> {} features but the transform has {}",
                model.input_dimension(),
                model.output_dimension(),
                dim
            )));
        }
        Ok(Self {
            transform: Box::new(transform),
            model: Box::new(model),
            threshold,
        })
    }

    /// Loads the scaler and autoencoder from `dir`. Fails here, never per call.
    pub fn from_artifacts(dir: impl AsRef<Path>, threshold: f64) -> Result<Self, ModelLoadError> {
        let dir = dir.as_ref();
        let ModelArtifacts { transform, model } = ModelArtifacts::load(dir)?;
        Self::new(transform, model, threshold)
            .map_err(|e| ModelLoadError::new("scorer", dir, e.to_string()))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn dimension(&self) -> usize {
        self.transform.dimension()
    }

    pub fn score_values(&self, values: &[f64]) -> Result<Score, ScoreError> {
        let expected = self.transform.dimension();
        if values.len() != expected {
            return Err(ScoreError::DimensionMismatch { expected, actual: values.len() });
        }

        let normalized = self.transform.transform(values);
        let reconstructed = self.model.reconstruct(&normalized);
        let error = normalized
            .iter()
            .zip(&reconstructed)
            .map(|(n, r)| (n - r).powi(2))
            .sum::<f64>()
            / normalized.len() as f64;

        Ok(Score { error, is_anomaly: error > self.threshold })
    }

    pub fn score(&self, sample: &Sample) -> Result<Score, ScoreError> {
        self.score_values(&sample.values())
    }

    pub fn label(&self, sample: Sample) -> Result<LabeledSample, ScoreError> {
        let Score { error, is_anomaly } = self.score(&sample)?;
        Ok(LabeledSample { sample, error, is_anomaly })
    }
}
