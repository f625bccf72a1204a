use rand::rngs::StdRng;
use rand::Rng;

use crate::error::Result;
use crate::math::fast::fast_tanh;
use crate::reduction::context::LearnContext;
use crate::reduction::example::Example;
use crate::reduction::learner::BaseLearner;

/// Hidden units regress onto this range regardless of the task's labels.
pub const HIDDEN_MIN_ACTIVATION: f32 = -3.0;
pub const HIDDEN_MAX_ACTIVATION: f32 = 3.0;

/// Per-example hidden-layer state: pre-activations and which units are off.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenActivations {
    pub pre: Vec<f32>,
    pub dropped: Vec<bool>,
}

impl HiddenActivations {
    pub fn is_active(&self, i: usize) -> bool {
        !self.dropped[i]
    }
}

/// Draws a dropout mask: each unit is off with probability 1/2.
pub fn sample_mask(rng: &mut StdRng, k: usize) -> Vec<bool> {
    (0..k).map(|_| rng.gen::<f32>() < 0.5).collect()
}

/// The mask used by the second dropout pass.
pub fn complement(mask: &[bool]) -> Vec<bool> {
    mask.iter().map(|&d| !d).collect()
}

/// Computes the `k` hidden pre-activations for `ec`, one delegate prediction
/// per unit under the squared-loss, [-3, 3] regression override.
///
/// A unit whose bias has never been touched gets a small random bias first,
/// so units do not start out identical. When `trace` is given, one
/// `"<i>:<raw>,<tanh>"` token per unit is appended to it.
pub fn forward_pass<L: BaseLearner + ?Sized>(
    base: &mut L,
    ctx: &mut LearnContext,
    ec: &mut Example,
    k: usize,
    seed_rng: &mut StdRng,
    normalizer_hint: Option<f32>,
    mut trace: Option<&mut String>,
) -> Result<Vec<f32>> {
    let mut scope = ctx.hidden_unit_scope(HIDDEN_MIN_ACTIVATION, HIDDEN_MAX_ACTIVATION);
    let increment = base.increment();
    let constant = base.constant_index();
    let mut pre = Vec::with_capacity(k);

    for i in 0..k {
        let bias = constant + i as u64 * increment + ec.ft_offset;
        if base.weight(bias) == 0.0 {
            let value = seed_rng.gen::<f32>() - 0.5;
            base.seed_if_untouched(bias, value, normalizer_hint);
        }

        base.predict(&mut scope, ec, i)?;
        pre.push(ec.prediction);

        if let Some(line) = trace.as_deref_mut() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&format!("{i}:{},{}", ec.partial_prediction, fast_tanh(ec.prediction)));
        }
    }

    Ok(pre)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::loss::loss_type::LossType;
    use crate::optim::sgd::SgdLearner;

    fn setup() -> (SgdLearner, LearnContext, Example) {
        let learner = SgdLearner::new(18, 3, 0.1);
        let ctx = LearnContext::new(LossType::Logistic).with_bounds(-1.0, 1.0);
        let mut ec = Example::new(Some(1.0));
        ec.push_feature(b'f', learner.feature_index(3), 1.0);
        learner.add_constant(&mut ec);
        (learner, ctx, ec)
    }

    #[test]
    fn complement_flips_every_bit() {
        let mut rng = StdRng::seed_from_u64(4);
        let mask = sample_mask(&mut rng, 16);
        let inv = complement(&mask);
        assert!(mask.iter().zip(&inv).all(|(a, b)| a != b));
    }

    #[test]
    fn seeds_biases_and_restores_context() {
        let (mut learner, mut ctx, mut ec) = setup();
        let mut rng = StdRng::seed_from_u64(0);
        let inc = learner.increment();
        let constant = learner.constant_index();

        let pre = forward_pass(&mut learner, &mut ctx, &mut ec, 2, &mut rng, None, None).unwrap();

        assert_eq!(pre.len(), 2);
        for (i, &p) in pre.iter().enumerate() {
            let bias = learner.weight(constant + i as u64 * inc);
            assert!(bias != 0.0 && bias.abs() <= 0.5);
            // only the seeded bias contributes
            assert_eq!(p, bias);
        }
        assert_eq!(ctx.loss, LossType::Logistic);
        assert_eq!((ctx.sd.min_label, ctx.sd.max_label), (-1.0, 1.0));
    }

    #[test]
    fn pre_activations_clamp_to_hidden_range() {
        let (mut learner, mut ctx, mut ec) = setup();
        let index = learner.feature_index(3);
        learner.seed_if_untouched(index, 10.0, None);
        let mut rng = StdRng::seed_from_u64(0);
        let pre = forward_pass(&mut learner, &mut ctx, &mut ec, 1, &mut rng, None, None).unwrap();
        assert_eq!(pre, vec![HIDDEN_MAX_ACTIVATION]);
    }

    #[test]
    fn trace_lists_each_unit() {
        let (mut learner, mut ctx, mut ec) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        let mut line = String::new();
        forward_pass(&mut learner, &mut ctx, &mut ec, 2, &mut rng, None, Some(&mut line)).unwrap();
        let tokens: Vec<&str> = line.split(' ').collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].starts_with("0:"));
        assert!(tokens[1].starts_with("1:"));
    }
}
