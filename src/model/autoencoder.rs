use ndarray::{Array1, Array2};
use serde::Deserialize;

use super::ReconstructionModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, v: f64) -> f64 {
        match self {
            Activation::Relu => v.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-v).exp()),
            Activation::Tanh => v.tanh(),
            Activation::Linear => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerSpec {
    /// Row per input unit, column per output unit.
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoencoderSpec {
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    kernel: Array2<f64>,
    bias: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        let act = self.activation;
        (input.dot(&self.kernel) + &self.bias).mapv_into(|v| act.apply(v))
    }
}

/// Feed-forward dense autoencoder evaluated layer by layer.
#[derive(Debug, Clone)]
pub struct DenseAutoencoder {
    layers: Vec<DenseLayer>,
}

impl DenseAutoencoder {
    pub fn from_spec(spec: AutoencoderSpec) -> Result<Self, String> {
        if spec.layers.is_empty() {
            return Err("autoencoder has no layers".into());
        }

        let mut layers = Vec::with_capacity(spec.layers.len());
        let mut prev_width: Option<usize> = None;
        for (i, layer) in spec.layers.into_iter().enumerate() {
            let rows = layer.kernel.len();
            let cols = layer.kernel.first().map_or(0, Vec::len);
            if rows == 0 || cols == 0 {
                return Err(format!("layer {} has an empty kernel", i));
            }
            if layer.kernel.iter().any(|row| row.len() != cols) {
                return Err(format!("layer {} kernel is not rectangular", i));
            }
            if layer.bias.len() != cols {
                return Err(format!(
                    "layer {} bias has {} entries, kernel has {} outputs",
                    i,
                    layer.bias.len(),
                    cols
                ));
            }
            if let Some(width) = prev_width {
                if width != rows {
                    return Err(format!(
                        "layer {} expects {} inputs but the previous layer emits {}",
                        i, rows, width
                    ));
                }
            }

            let flat: Vec<f64> = layer.kernel.into_iter().flatten().collect();
            if flat.iter().chain(&layer.bias).any(|v| !v.is_finite()) {
                return Err(format!("layer {} has non-finite weights", i));
            }
            let kernel = Array2::from_shape_vec((rows, cols), flat).map_err(|e| e.to_string())?;
            layers.push(DenseLayer {
                kernel,
                bias: Array1::from(layer.bias),
                activation: layer.activation,
            });
            prev_width = Some(cols);
        }

        Ok(Self { layers })
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl ReconstructionModel for DenseAutoencoder {
    fn input_dimension(&self) -> usize {
        self.layers[0].kernel.nrows()
    }

    fn output_dimension(&self) -> usize {
        self.layers[self.layers.len() - 1].kernel.ncols()
    }

    fn reconstruct(&self, normalized: &[f64]) -> Vec<f64> {
        let input = Array1::from(normalized.to_vec());
        self.layers
            .iter()
            .fold(input, |acc, layer| layer.forward(&acc))
            .to_vec()
    }
}
