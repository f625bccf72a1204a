use rand::rngs::StdRng;
use rand::Rng;

use crate::activation::activation::HiddenActivation;
use crate::error::Result;
use crate::network::forward::HiddenActivations;
use crate::network::template::OutputTemplate;
use crate::reduction::context::LearnContext;
use crate::reduction::example::Example;
use crate::reduction::learner::BaseLearner;

/// What the output layer produced for one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRecord {
    /// Raw delegate score, before range finalization.
    pub partial_prediction: f32,
    pub prediction: f32,
    pub loss: f32,
}

/// Settings shared by every output-layer call of one reduction.
#[derive(Debug, Clone, Copy)]
pub struct OutputLayerParams {
    pub k: usize,
    pub inpass: bool,
    pub is_learn: bool,
    pub activation: HiddenActivation,
    pub normalizer_hint: Option<f32>,
}

/// Publishes the hidden activations through the template and runs the
/// delegate's sub-model `k` over them.
pub fn output_layer<L: BaseLearner + ?Sized>(
    base: &mut L,
    ctx: &mut LearnContext,
    ec: &mut Example,
    template: &mut OutputTemplate,
    hidden: &HiddenActivations,
    params: &OutputLayerParams,
    seed_rng: &mut StdRng,
) -> Result<OutputRecord> {
    let k = params.k;
    let values: Vec<f32> = hidden
        .pre
        .iter()
        .zip(&hidden.dropped)
        .map(|(&pre, &dropped)| params.activation.function(pre, dropped))
        .collect();
    template.set_activations(&values);

    let output_offset = k as u64 * base.increment() + ec.ft_offset;
    let sqrtk = (k as f32).sqrt();
    for slot in template.block().features.iter().take(k) {
        let index = slot.weight_index + output_offset;
        if base.weight(index) == 0.0 {
            let value = (seed_rng.gen::<f32>() - 0.5) / sqrtk;
            base.seed_if_untouched(index, value, params.normalizer_hint);
        }
    }

    let (partial_prediction, loss) = if params.inpass {
        passthrough(base, ctx, ec, template, k, params.is_learn)?
    } else {
        separate(base, ctx, ec, template, k, params.is_learn)?
    };

    Ok(OutputRecord {
        partial_prediction,
        prediction: ctx.sd.finalize_prediction(partial_prediction),
        loss,
    })
}

/// Lends the template's block to `ec` for the duration of one call.
fn passthrough<L: BaseLearner + ?Sized>(
    base: &mut L,
    ctx: &mut LearnContext,
    ec: &mut Example,
    template: &mut OutputTemplate,
    k: usize,
    is_learn: bool,
) -> Result<(f32, f32)> {
    let total_sum_feat_sq = ec.total_sum_feat_sq;
    ec.push_namespace(template.take_block());
    let res = call(base, ctx, ec, k, is_learn);
    if let Some(block) = ec.pop_namespace() {
        template.restore_block(block);
    }
    ec.total_sum_feat_sq = total_sum_feat_sq;
    res?;
    Ok((ec.partial_prediction, ec.loss))
}

/// Runs the delegate on the template itself, carrying over the caller's
/// label, offset, importance weight and example counter.
fn separate<L: BaseLearner + ?Sized>(
    base: &mut L,
    ctx: &mut LearnContext,
    ec: &mut Example,
    template: &mut OutputTemplate,
    k: usize,
    is_learn: bool,
) -> Result<(f32, f32)> {
    let out = &mut template.example;
    out.ft_offset = ec.ft_offset;
    out.label = ec.label;
    out.weight = ec.weight;
    out.example_t = ec.example_t;
    out.partial_prediction = 0.0;
    call(base, ctx, out, k, is_learn)?;
    ec.label = out.label;
    Ok((out.partial_prediction, out.loss))
}

fn call<L: BaseLearner + ?Sized>(
    base: &mut L,
    ctx: &mut LearnContext,
    ec: &mut Example,
    sub: usize,
    is_learn: bool,
) -> Result<()> {
    if is_learn {
        base.learn(ctx, ec, sub)
    } else {
        base.predict(ctx, ec, sub)
    }
}
