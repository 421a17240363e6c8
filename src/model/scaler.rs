use serde::Deserialize;

use super::Transform;

#[derive(Debug, Clone, Deserialize)]
pub struct MinMaxParams {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Min-max feature scaling: `x * scale + min` per feature.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    scale: Vec<f64>,
    min: Vec<f64>,
}

impl MinMaxScaler {
    pub fn from_params(params: MinMaxParams) -> Result<Self, String> {
        let MinMaxParams { data_min, data_max, feature_range } = params;
        if data_min.is_empty() {
            return Err("scaler has no features".into());
        }
        if data_min.len() != data_max.len() {
            return Err(format!(
                "data_min has {} features, data_max has {}",
                data_min.len(),
                data_max.len()
            ));
        }
        let (lo, hi) = feature_range;
        if lo.partial_cmp(&hi) != Some(std::cmp::Ordering::Less) {
            return Err(format!("feature_range ({}, {}) is not increasing", lo, hi));
        }
        if data_min.iter().chain(&data_max).any(|v| !v.is_finite()) {
            return Err("scaler bounds must be finite".into());
        }

        let (scale, min) = data_min
            .iter()
            .zip(&data_max)
            .map(|(&dmin, &dmax)| {
                let mut range = dmax - dmin;
                // constant features scale by 1, as sklearn does
                if range.abs() < 10.0 * f64::EPSILON {
                    range = 1.0;
                }
                let scale = (hi - lo) / range;
                (scale, lo - dmin * scale)
            })
            .unzip();

        Ok(Self { scale, min })
    }
}

impl Transform for MinMaxScaler {
    fn dimension(&self) -> usize {
        self.scale.len()
    }

    fn transform(&self, input: &[f64]) -> Vec<f64> {
        input
            .iter()
            .zip(self.scale.iter().zip(&self.min))
            .map(|(x, (s, m))| x * s + m)
            .collect()
    }
}
