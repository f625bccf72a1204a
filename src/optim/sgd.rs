use crate::error::Result;
use crate::reduction::context::LearnContext;
use crate::reduction::example::{Example, CONSTANT_HASH, CONSTANT_NAMESPACE};
use crate::reduction::learner::BaseLearner;
use crate::optim::weights::WeightStore;

/// Weight + normalizer per coordinate.
const STRIDE_SHIFT: u32 = 1;
const NORMALIZER: usize = 1;

/// Online linear learner: one stochastic gradient step per labelled example.
///
/// With `normalized` set, every coordinate is scaled by the largest
/// magnitude its feature has taken so far, which makes the step size
/// insensitive to feature scale. Otherwise the step is capped at
/// `0.5 / Σx²` so a single squared-loss update cannot overshoot its target.
#[derive(Debug, Clone)]
pub struct SgdLearner {
    store: WeightStore,
    sub_models: usize,
    pub learning_rate: f32,
    pub normalized: bool,
}

impl SgdLearner {
    /// A learner over `2^bits` weights, laid out for `sub_models` disjoint
    /// slices (at least 1).
    pub fn new(bits: u32, sub_models: usize, learning_rate: f32) -> SgdLearner {
        SgdLearner {
            store: WeightStore::new(bits, STRIDE_SHIFT),
            sub_models: sub_models.max(1),
            learning_rate,
            normalized: false,
        }
    }

    pub fn with_normalized(mut self, normalized: bool) -> SgdLearner {
        self.normalized = normalized;
        self
    }

    /// Scales a raw feature hash into this store's index space, leaving room
    /// for every sub-model slice.
    pub fn feature_index(&self, hash: u64) -> u64 {
        hash.wrapping_mul(self.sub_models as u64) << STRIDE_SHIFT
    }

    /// Appends the constant feature so the learner can fit an intercept.
    pub fn add_constant(&self, ec: &mut Example) {
        ec.push_feature(CONSTANT_NAMESPACE, self.constant_index(), 1.0);
    }

    /// Normalizer state of the weight at `index`: the largest feature
    /// magnitude seen there, or a seeded hint. Zero until either happens.
    pub fn normalizer(&self, index: u64) -> f32 {
        self.store.get(index, NORMALIZER)
    }

    fn offset(&self, ec: &Example, sub: usize) -> u64 {
        sub as u64 * self.increment() + ec.ft_offset
    }

    fn raw_score(&self, ec: &Example, sub: usize) -> f32 {
        let offset = self.offset(ec, sub);
        ec.features()
            .map(|f| f.x * self.store.get(f.weight_index + offset, 0))
            .sum()
    }
}

impl BaseLearner for SgdLearner {
    fn predict(&mut self, ctx: &mut LearnContext, ec: &mut Example, sub: usize) -> Result<()> {
        let raw = self.raw_score(ec, sub);
        ec.partial_prediction = raw;
        ec.prediction = ctx.sd.finalize_prediction(raw);
        ec.loss = match ec.label {
            Some(label) => ctx.loss.loss(&ctx.sd, ec.prediction, label) * ec.weight,
            None => 0.0,
        };
        Ok(())
    }

    fn learn(&mut self, ctx: &mut LearnContext, ec: &mut Example, sub: usize) -> Result<()> {
        if let Some(label) = ec.label {
            ctx.sd.update_bounds(label);
        }
        self.predict(ctx, ec, sub)?;

        let Some(label) = ec.label.filter(|l| ctx.training && l.is_finite()) else {
            return Ok(());
        };
        let gradient = ctx.loss.first_derivative(&ctx.sd, ec.prediction, label) * ec.weight;
        if gradient == 0.0 {
            return Ok(());
        }

        let offset = self.offset(ec, sub);
        if self.normalized {
            for f in ec.features() {
                if f.x == 0.0 {
                    continue;
                }
                let index = f.weight_index + offset;
                let norm = self.store.get_mut(index, NORMALIZER);
                *norm = (*norm).max(f.x.abs());
                let norm = *norm;
                *self.store.get_mut(index, 0) -= self.learning_rate * gradient * f.x / (norm * norm);
            }
        } else {
            let eta = if ec.total_sum_feat_sq > 0.0 {
                self.learning_rate.min(0.5 / ec.total_sum_feat_sq)
            } else {
                self.learning_rate
            };
            for f in ec.features() {
                *self.store.get_mut(f.weight_index + offset, 0) -= eta * gradient * f.x;
            }
        }
        Ok(())
    }

    fn increment(&self) -> u64 {
        self.store.stride()
    }

    fn sub_models(&self) -> usize {
        self.sub_models
    }

    fn stride_shift(&self) -> u32 {
        STRIDE_SHIFT
    }

    fn constant_index(&self) -> u64 {
        self.feature_index(CONSTANT_HASH)
    }

    fn weight(&self, index: u64) -> f32 {
        self.store.get(index, 0)
    }

    fn seed_if_untouched(&mut self, index: u64, value: f32, normalizer_hint: Option<f32>) -> bool {
        let w = self.store.get_mut(index, 0);
        if *w != 0.0 {
            return false;
        }
        *w = value;
        if let (true, Some(hint)) = (self.normalized, normalizer_hint) {
            *self.store.get_mut(index, NORMALIZER) = hint;
        }
        true
    }
}
