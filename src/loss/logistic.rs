use crate::reduction::shared::SharedData;

/// Logistic loss over labels in {-1, +1}.
pub struct LogisticLoss;

impl LogisticLoss {
    /// log(1 + e^(-y·p))
    pub fn loss(_sd: &SharedData, prediction: f32, label: f32) -> f32 {
        (1.0 + (-label * prediction).exp()).ln()
    }

    /// -y / (1 + e^(y·p))
    pub fn first_derivative(_sd: &SharedData, prediction: f32, label: f32) -> f32 {
        -label / (1.0 + (label * prediction).exp())
    }
}
