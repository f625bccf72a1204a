use crate::reduction::shared::SharedData;

/// Hinge loss over labels in {-1, +1}.
pub struct HingeLoss;

impl HingeLoss {
    /// max(0, 1 - y·p)
    pub fn loss(_sd: &SharedData, prediction: f32, label: f32) -> f32 {
        (1.0 - label * prediction).max(0.0)
    }

    /// Subgradient: -y inside the margin, 0 outside it.
    pub fn first_derivative(_sd: &SharedData, prediction: f32, label: f32) -> f32 {
        if label * prediction <= 1.0 { -label } else { 0.0 }
    }
}
