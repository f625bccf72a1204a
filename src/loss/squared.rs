use crate::reduction::shared::SharedData;

pub struct SquaredLoss;

impl SquaredLoss {
    /// Squared error, linearised outside the label bounds so that a clamped
    /// prediction is still charged for how far out of range it was.
    pub fn loss(sd: &SharedData, prediction: f32, label: f32) -> f32 {
        if prediction >= sd.min_label && prediction <= sd.max_label {
            (prediction - label) * (prediction - label)
        } else if prediction < sd.min_label {
            if label == sd.min_label {
                0.0
            } else {
                let d = label - sd.min_label;
                d * d + 2.0 * d * (sd.min_label - prediction)
            }
        } else if label == sd.max_label {
            0.0
        } else {
            let d = sd.max_label - label;
            d * d + 2.0 * d * (prediction - sd.max_label)
        }
    }

    /// d/dp of (p - y)², with p clamped to the label bounds first.
    pub fn first_derivative(sd: &SharedData, prediction: f32, label: f32) -> f32 {
        let p = prediction.clamp(sd.min_label, sd.max_label);
        2.0 * (p - label)
    }
}
