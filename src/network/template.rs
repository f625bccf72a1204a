use log::debug;

use crate::reduction::example::{Example, Feature, Namespace, NN_OUTPUT_NAMESPACE};

/// Base weight index of the output template, before stride scaling.
pub const NN_CONSTANT: u64 = 533_357_803;

/// The synthetic example carrying the hidden layer's outputs.
///
/// Slot `i < k` holds unit `i`'s activation; in separate-output mode slot `k`
/// is a bias feature fixed at 1. Indices are laid out once; values are
/// rewritten for every example.
#[derive(Debug, Clone)]
pub struct OutputTemplate {
    pub example: Example,
    k: usize,
}

impl OutputTemplate {
    pub fn build(k: usize, inpass: bool, increment: u64, stride_shift: u32) -> OutputTemplate {
        let mut block = Namespace::new(NN_OUTPUT_NAMESPACE);
        let mut index = NN_CONSTANT << stride_shift;
        for _ in 0..k {
            block.features.push(Feature { x: 1.0, weight_index: index });
            index += increment;
        }
        if !inpass {
            block.features.push(Feature { x: 1.0, weight_index: index });
        }

        let mut example = Example::new(None);
        example.push_namespace(block);
        OutputTemplate { example, k }
    }

    /// Number of hidden-unit slots (excludes the bias slot).
    pub fn hidden_units(&self) -> usize {
        self.k
    }

    /// Total feature entries, bias slot included.
    pub fn len(&self) -> usize {
        self.block().features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn block(&self) -> &Namespace {
        &self.example.namespaces[0]
    }

    pub fn block_mut(&mut self) -> &mut Namespace {
        &mut self.example.namespaces[0]
    }

    /// Writes the activations into the hidden slots and refreshes the squared
    /// norms the delegate normalizes with.
    pub fn set_activations(&mut self, values: &[f32]) {
        let mut sum_sq = 1.0;
        let block = self.block_mut();
        for (slot, &x) in block.features.iter_mut().zip(values) {
            slot.x = x;
            sum_sq += x * x;
        }
        block.sum_feat_sq = sum_sq;
        self.example.total_sum_feat_sq = sum_sq;
    }

    /// Moves the feature block out, leaving an empty one behind. Pair with
    /// `restore_block`.
    pub fn take_block(&mut self) -> Namespace {
        std::mem::take(self.block_mut())
    }

    pub fn restore_block(&mut self, block: Namespace) {
        *self.block_mut() = block;
    }
}

/// Two-state lifecycle of the template: built once, on first use, when the
/// delegate's stride is known.
#[derive(Debug, Clone, Default)]
pub enum OutputLayer {
    #[default]
    Unbuilt,
    Built(OutputTemplate),
}

impl OutputLayer {
    pub fn is_built(&self) -> bool {
        matches!(self, OutputLayer::Built(_))
    }

    /// Builds the template on the first call; later calls return it as is.
    pub fn get_or_build(
        &mut self,
        k: usize,
        inpass: bool,
        increment: u64,
        stride_shift: u32,
    ) -> &mut OutputTemplate {
        if let OutputLayer::Unbuilt = self {
            debug!("building output template: {k} hidden units, inpass = {inpass}");
            *self = OutputLayer::Built(OutputTemplate::build(k, inpass, increment, stride_shift));
        }
        match self {
            OutputLayer::Built(template) => template,
            OutputLayer::Unbuilt => unreachable!("output template was just built"),
        }
    }

    /// Drops the template's feature storage.
    pub fn release(&mut self) {
        *self = OutputLayer::Unbuilt;
    }
}
