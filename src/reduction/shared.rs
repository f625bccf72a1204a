use log::warn;

use crate::reduction::example::Example;

/// State shared by every stage of one pipeline: the label range predictions
/// are clamped to, and running totals for progress reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedData {
    pub min_label: f32,
    pub max_label: f32,
    /// When set, `update_bounds` is a no-op. Hidden-unit training sets this so
    /// fabricated regression targets never widen the task's label range.
    pub bounds_frozen: bool,

    pub example_number: u64,
    pub weighted_examples: f64,
    pub weighted_labels: f64,
    pub sum_loss: f64,
    pub total_features: u64,
}

impl Default for SharedData {
    fn default() -> Self {
        SharedData::with_bounds(0.0, 1.0)
    }
}

impl SharedData {
    pub fn with_bounds(min_label: f32, max_label: f32) -> SharedData {
        SharedData {
            min_label,
            max_label,
            bounds_frozen: false,
            example_number: 0,
            weighted_examples: 0.0,
            weighted_labels: 0.0,
            sum_loss: 0.0,
            total_features: 0,
        }
    }

    /// Maps a raw score into the current label range. NaN becomes 0.
    pub fn finalize_prediction(&self, raw: f32) -> f32 {
        if raw.is_nan() {
            warn!("NaN prediction in example {}, forcing 0.0", self.example_number + 1);
            return 0.0;
        }
        if raw > self.max_label {
            self.max_label
        } else if raw < self.min_label {
            self.min_label
        } else {
            raw
        }
    }

    /// Widens the label range to include `label`. Non-finite labels are
    /// ignored.
    pub fn update_bounds(&mut self, label: f32) {
        if self.bounds_frozen || !label.is_finite() {
            return;
        }
        self.min_label = self.min_label.min(label);
        self.max_label = self.max_label.max(label);
    }

    /// Folds a finished example into the running totals.
    pub fn account(&mut self, ec: &Example) {
        self.example_number += 1;
        self.total_features += ec.num_features() as u64;
        if let Some(label) = ec.label {
            self.weighted_examples += ec.weight as f64;
            self.weighted_labels += (label * ec.weight) as f64;
            self.sum_loss += ec.loss as f64;
        }
    }

    /// Mean loss per unit of importance weight seen so far.
    pub fn average_loss(&self) -> f64 {
        if self.weighted_examples > 0.0 {
            self.sum_loss / self.weighted_examples
        } else {
            0.0
        }
    }
}
