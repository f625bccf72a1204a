use crate::error::Result;
use crate::reduction::context::LearnContext;
use crate::reduction::example::Example;

/// The next stage of a reduction stack: an online learner over a shared,
/// hashed weight store, partitioned into `sub_models()` disjoint slices.
///
/// `sub` selects the slice; a call with sub-model `i` reads and writes only
/// coordinates offset by `i * increment()`.
pub trait BaseLearner {
    /// Scores `ec` with sub-model `sub`, writing `partial_prediction`,
    /// `prediction` and `loss`.
    fn predict(&mut self, ctx: &mut LearnContext, ec: &mut Example, sub: usize) -> Result<()>;

    /// Scores `ec` and applies the learner's own online update toward its label.
    fn learn(&mut self, ctx: &mut LearnContext, ec: &mut Example, sub: usize) -> Result<()>;

    /// Distance between consecutive sub-model slices in the weight store.
    fn increment(&self) -> u64;

    /// Number of disjoint sub-model slices the store was laid out for.
    fn sub_models(&self) -> usize;

    /// log2 of the number of floats each logical weight occupies.
    fn stride_shift(&self) -> u32;

    /// Weight index of the constant (bias) feature, before any sub-model or
    /// feature offset is applied.
    fn constant_index(&self) -> u64;

    /// Reads one weight coordinate. Coordinates never written read as 0.
    fn weight(&self, index: u64) -> f32;

    /// Writes `value` to the coordinate at `index` iff it currently reads 0.
    /// Learners that keep a per-coordinate normalizer store
    /// `normalizer_hint` alongside it. Returns whether a write happened.
    fn seed_if_untouched(&mut self, index: u64, value: f32, normalizer_hint: Option<f32>) -> bool;

    fn end_pass(&mut self, _ctx: &mut LearnContext) {}

    /// Default completion bookkeeping: accounts the example and traces its
    /// raw score.
    fn finish_example(&mut self, ctx: &mut LearnContext, ec: &mut Example) {
        ctx.sd.account(ec);
        if ctx.tracing() {
            let text = ec.partial_prediction.to_string();
            ctx.print_raw(&text, &ec.tag);
        }
    }
}
