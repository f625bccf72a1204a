use crate::math::fast::fast_tanh;

/// Inverted-dropout compensation: surviving units are doubled so the expected
/// output-layer input matches the mean-field network.
const DROPOUT_SCALE: f32 = 2.0;

/// The sigmoidal squashing applied to every hidden unit.
///
/// Holds the dropout scale so that forward and backward agree on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HiddenActivation {
    dropscale: f32,
}

impl HiddenActivation {
    pub fn new(dropout: bool) -> HiddenActivation {
        HiddenActivation {
            dropscale: if dropout { DROPOUT_SCALE } else { 1.0 },
        }
    }

    /// Value fed to the output layer for a unit with pre-activation `pre`.
    /// A dropped unit contributes exactly zero.
    pub fn function(&self, pre: f32, dropped: bool) -> f32 {
        if dropped {
            0.0
        } else {
            self.dropscale * fast_tanh(pre)
        }
    }

    /// Derivative of `function` w.r.t. the pre-activation, expressed in terms
    /// of the value `function` emitted (so no second `fast_tanh` is needed).
    pub fn derivative(&self, emitted: f32) -> f32 {
        let sigmah = emitted / self.dropscale;
        self.dropscale * (1.0 - sigmah * sigmah)
    }
}
