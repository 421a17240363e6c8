//! Model module - Capability traits for the fitted transform and reconstruction model,
//! plus loading of their serialized artifacts.

pub mod autoencoder;
pub mod scaler;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::ModelLoadError;

pub use autoencoder::DenseAutoencoder;
pub use scaler::MinMaxScaler;

pub const SCALER_FILE: &str = "scaler.json";
pub const AUTOENCODER_FILE: &str = "autoencoder.json";

/// Fitted affine map from raw sample space into model input space.
pub trait Transform: Send + Sync {
    fn dimension(&self) -> usize;

    /// Callers guarantee `input.len() == self.dimension()`.
    fn transform(&self, input: &[f64]) -> Vec<f64>;
}

/// Opaque `normalized -> normalized` reconstruction.
pub trait ReconstructionModel: Send + Sync {
    fn input_dimension(&self) -> usize;

    fn output_dimension(&self) -> usize;

    fn reconstruct(&self, normalized: &[f64]) -> Vec<f64>;
}

// ============================================================================
// ARTIFACT LOADING
// ============================================================================

/// The pair of fitted artifacts the scorer needs, loaded once at startup.
pub struct ModelArtifacts {
    pub transform: MinMaxScaler,
    pub model: DenseAutoencoder,
}

impl ModelArtifacts {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let dir = dir.as_ref();
        let scaler_path = dir.join(SCALER_FILE);
        let model_path = dir.join(AUTOENCODER_FILE);

        let transform = MinMaxScaler::from_params(read_json("scaler", &scaler_path)?)
            .map_err(|reason| ModelLoadError::new("scaler", &scaler_path, reason))?;
        let model = DenseAutoencoder::from_spec(read_json("autoencoder", &model_path)?)
            .map_err(|reason| ModelLoadError::new("autoencoder", &model_path, reason))?;

        if model.input_dimension() != transform.dimension()
            || model.output_dimension() != transform.dimension()
        {
            return Err(ModelLoadError::new(
                "autoencoder",
                &model_path,
                format!(
                    "model maps {} -> {} features but the scaler was fitted on {}",
                    model.input_dimension(),
                    model.output_dimension(),
                    transform.dimension()
                ),
            ));
        }

        tracing::info!(
            dir = %dir.display(),
            features = transform.dimension(),
            layers = model.depth(),
            "loaded model artifacts"
        );
        Ok(Self { transform, model })
    }
}

fn read_json<T: DeserializeOwned>(
    artifact: &'static str,
    path: &PathBuf,
) -> Result<T, ModelLoadError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ModelLoadError::new(artifact, path, e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| ModelLoadError::new(artifact, path, e.to_string()))
}
