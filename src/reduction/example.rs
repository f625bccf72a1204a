/// Namespace carrying the constant (bias) feature.
pub const CONSTANT_NAMESPACE: u8 = 128;
/// Namespace the hidden layer's outputs are published under.
pub const NN_OUTPUT_NAMESPACE: u8 = 129;
/// Hash of the constant feature before scaling into the weight store.
pub const CONSTANT_HASH: u64 = 11_650_396;

/// One hashed feature: its value and its (already scaled) weight index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    pub x: f32,
    pub weight_index: u64,
}

/// A block of features sharing one namespace, with its cached squared norm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    pub index: u8,
    pub features: Vec<Feature>,
    pub sum_feat_sq: f32,
}

impl Namespace {
    pub fn new(index: u8) -> Namespace {
        Namespace { index, features: Vec::new(), sum_feat_sq: 0.0 }
    }
}

/// A single training or test example flowing through the reduction stack.
///
/// Stages communicate through the prediction fields: a delegate call writes
/// `partial_prediction` (raw score), `prediction` (finalized) and `loss`.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub namespaces: Vec<Namespace>,
    pub total_sum_feat_sq: f32,
    /// `None` for test-only examples.
    pub label: Option<f32>,
    /// Importance weight.
    pub weight: f32,
    /// Offset added to every weight index (multi-problem reductions).
    pub ft_offset: u64,
    pub partial_prediction: f32,
    pub prediction: f32,
    pub loss: f32,
    /// Weighted example counter used by learning-rate schedules.
    pub example_t: f64,
    pub tag: String,
}

impl Example {
    pub fn new(label: Option<f32>) -> Example {
        Example {
            namespaces: Vec::new(),
            total_sum_feat_sq: 0.0,
            label,
            weight: 1.0,
            ft_offset: 0,
            partial_prediction: 0.0,
            prediction: 0.0,
            loss: 0.0,
            example_t: 0.0,
            tag: String::new(),
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Example {
        self.weight = weight;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Example {
        self.tag = tag.to_string();
        self
    }

    /// Adds a feature to the first block with namespace `ns`, creating it if
    /// needed, and keeps the squared-norm caches current.
    pub fn push_feature(&mut self, ns: u8, weight_index: u64, x: f32) {
        let pos = match self.namespaces.iter().position(|n| n.index == ns) {
            Some(pos) => pos,
            None => {
                self.namespaces.push(Namespace::new(ns));
                self.namespaces.len() - 1
            }
        };
        let block = &mut self.namespaces[pos];
        block.features.push(Feature { x, weight_index });
        block.sum_feat_sq += x * x;
        self.total_sum_feat_sq += x * x;
    }

    /// Appends `block` as its own namespace, even if one with the same index
    /// already exists. Undo with `pop_namespace`.
    pub fn push_namespace(&mut self, block: Namespace) {
        self.total_sum_feat_sq += block.sum_feat_sq;
        self.namespaces.push(block);
    }

    /// Removes the most recently appended block.
    pub fn pop_namespace(&mut self) -> Option<Namespace> {
        let block = self.namespaces.pop()?;
        self.total_sum_feat_sq -= block.sum_feat_sq;
        Some(block)
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.namespaces.iter().flat_map(|n| n.features.iter())
    }

    pub fn num_features(&self) -> usize {
        self.namespaces.iter().map(|n| n.features.len()).sum()
    }
}
