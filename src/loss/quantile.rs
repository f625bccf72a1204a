use crate::reduction::shared::SharedData;

/// Pinball loss for the `tau`-quantile.
pub struct QuantileLoss;

impl QuantileLoss {
    pub fn loss(_sd: &SharedData, prediction: f32, label: f32, tau: f32) -> f32 {
        let e = label - prediction;
        if e > 0.0 { tau * e } else { -(1.0 - tau) * e }
    }

    /// Subgradient: -tau below the target, 1 - tau above it, 0 on it.
    pub fn first_derivative(_sd: &SharedData, prediction: f32, label: f32, tau: f32) -> f32 {
        let e = label - prediction;
        if e == 0.0 {
            0.0
        } else if e > 0.0 {
            -tau
        } else {
            1.0 - tau
        }
    }
}
