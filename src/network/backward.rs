use crate::activation::activation::HiddenActivation;
use crate::error::Result;
use crate::network::forward::{HiddenActivations, HIDDEN_MAX_ACTIVATION, HIDDEN_MIN_ACTIVATION};
use crate::network::template::OutputTemplate;
use crate::reduction::context::LearnContext;
use crate::reduction::example::Example;
use crate::reduction::learner::BaseLearner;

/// Pushes the output loss gradient back into the hidden units.
///
/// Each active unit gets a regression target one (half) gradient step away
/// from its current pre-activation, and the delegate learns sub-model `i`
/// toward it with its own update rule. Returns the number of learn calls
/// issued; examples without a finite label issue none. `ec.label` is
/// restored before returning, on every path.
pub fn backward_pass<L: BaseLearner + ?Sized>(
    base: &mut L,
    ctx: &mut LearnContext,
    ec: &mut Example,
    template: &OutputTemplate,
    hidden: &HiddenActivations,
    activation: HiddenActivation,
    prediction: f32,
) -> Result<usize> {
    let Some(label) = ec.label.filter(|l| l.is_finite()) else {
        return Ok(0);
    };
    let gradient = ctx.loss.first_derivative(&ctx.sd, prediction, label);
    // NaN counts as zero
    if !(gradient.abs() > 0.0) {
        return Ok(0);
    }

    let mut scope = ctx.hidden_unit_scope(HIDDEN_MIN_ACTIVATION, HIDDEN_MAX_ACTIVATION);
    let res = train_hidden_units(base, &mut scope, ec, template, hidden, activation, gradient);
    ec.label = Some(label);
    res
}

fn train_hidden_units<L: BaseLearner + ?Sized>(
    base: &mut L,
    ctx: &mut LearnContext,
    ec: &mut Example,
    template: &OutputTemplate,
    hidden: &HiddenActivations,
    activation: HiddenActivation,
    gradient: f32,
) -> Result<usize> {
    let k = template.hidden_units();
    let output_offset = k as u64 * base.increment() + ec.ft_offset;
    let mut updates = 0;

    for (i, slot) in template.block().features.iter().take(k).enumerate() {
        if !hidden.is_active(i) {
            continue;
        }
        let sigmahprime = activation.derivative(slot.x);
        let nu = base.weight(slot.weight_index + output_offset);
        let gradhw = 0.5 * nu * gradient * sigmahprime;

        let target = ctx.sd.finalize_prediction(hidden.pre[i] - gradhw);
        if target != hidden.pre[i] {
            ec.label = Some(target);
            base.learn(ctx, ec, i)?;
            updates += 1;
        }
    }

    Ok(updates)
}
