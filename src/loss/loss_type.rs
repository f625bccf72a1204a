use serde::{Serialize, Deserialize};

use crate::loss::{HingeLoss, LogisticLoss, QuantileLoss, SquaredLoss};
use crate::reduction::shared::SharedData;

/// Selects the loss a learner optimises. Carried in `LearnContext` and
/// swapped to `Squared` while hidden units are trained.
///
/// - `Squared`: squared error, clamped to the current label bounds.
/// - `Logistic`: logistic loss, labels in {-1, +1}.
/// - `Hinge`: hinge loss, labels in {-1, +1}.
/// - `Quantile`: pinball loss for quantile `tau` in (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Squared,
    Logistic,
    Hinge,
    Quantile { tau: f32 },
}

impl Default for LossType {
    fn default() -> Self {
        LossType::Squared
    }
}

impl LossType {
    pub fn loss(&self, sd: &SharedData, prediction: f32, label: f32) -> f32 {
        match *self {
            LossType::Squared => SquaredLoss::loss(sd, prediction, label),
            LossType::Logistic => LogisticLoss::loss(sd, prediction, label),
            LossType::Hinge => HingeLoss::loss(sd, prediction, label),
            LossType::Quantile { tau } => QuantileLoss::loss(sd, prediction, label, tau),
        }
    }

    pub fn first_derivative(&self, sd: &SharedData, prediction: f32, label: f32) -> f32 {
        match *self {
            LossType::Squared => SquaredLoss::first_derivative(sd, prediction, label),
            LossType::Logistic => LogisticLoss::first_derivative(sd, prediction, label),
            LossType::Hinge => HingeLoss::first_derivative(sd, prediction, label),
            LossType::Quantile { tau } => QuantileLoss::first_derivative(sd, prediction, label, tau),
        }
    }
}
