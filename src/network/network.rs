use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activation::activation::HiddenActivation;
use crate::error::{Error, Result};
use crate::network::backward::backward_pass;
use crate::network::config::NnConfig;
use crate::network::forward::{complement, forward_pass, sample_mask, HiddenActivations};
use crate::network::output::{output_layer, OutputLayerParams, OutputRecord};
use crate::network::template::{OutputLayer, OutputTemplate, NN_CONSTANT};
use crate::reduction::context::LearnContext;
use crate::reduction::example::Example;
use crate::reduction::learner::BaseLearner;

/// Normalizer value stored next to freshly seeded weights under dropout.
const DROPOUT_NORMALIZER_HINT: f32 = 1e-4;

/// A single sigmoidal hidden layer stacked on top of a delegate learner.
///
/// Hidden unit `i` is the delegate's sub-model `i` regressed onto [-3, 3];
/// the output layer is sub-model `k`, fed the squashed hidden activations.
/// Training never touches weights directly: credit assignment fabricates a
/// regression target per hidden unit and lets the delegate learn toward it.
pub struct NeuralNetwork<L: BaseLearner> {
    config: NnConfig,
    activation: HiddenActivation,
    output_layer: OutputLayer,
    dropout_rng: StdRng,
    dropout_checkpoint: StdRng,
    seed_rng: StdRng,
    base: L,
}

impl<L: BaseLearner> NeuralNetwork<L> {
    /// Assembles the reduction over `base`. Fails if `k` is zero or `base`
    /// was not laid out for at least `k + 1` sub-models.
    pub fn new(config: NnConfig, base: L) -> Result<NeuralNetwork<L>> {
        let config = config.validate()?;
        let k = config.hidden_units;
        if base.sub_models() < k + 1 {
            return Err(Error::Config(format!(
                "{k} hidden units need {} sub-models, delegate has {}",
                k + 1,
                base.sub_models()
            )));
        }

        if config.meanfield {
            info!("using mean field for neural network");
        }
        if config.dropout {
            info!("using dropout for neural network");
        }
        if config.inpass {
            info!("using input passthrough for neural network");
        }

        let seed = config.seed();
        let dropout_rng = StdRng::seed_from_u64(seed);
        Ok(NeuralNetwork {
            activation: HiddenActivation::new(config.dropout),
            output_layer: OutputLayer::Unbuilt,
            dropout_checkpoint: dropout_rng.clone(),
            dropout_rng,
            seed_rng: StdRng::seed_from_u64(seed.wrapping_add(NN_CONSTANT)),
            config,
            base,
        })
    }

    pub fn config(&self) -> &NnConfig {
        &self.config
    }

    pub fn base(&self) -> &L {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut L {
        &mut self.base
    }

    /// The output template, once built.
    pub fn template(&self) -> Option<&OutputTemplate> {
        match &self.output_layer {
            OutputLayer::Built(template) => Some(template),
            OutputLayer::Unbuilt => None,
        }
    }

    /// Lays out the output template. Runs automatically on the first
    /// example; further calls are no-ops.
    pub fn finish_setup(&mut self) {
        let (increment, stride_shift) = (self.base.increment(), self.base.stride_shift());
        self.output_layer
            .get_or_build(self.config.hidden_units, self.config.inpass, increment, stride_shift);
    }

    pub fn predict(&mut self, ctx: &mut LearnContext, ec: &mut Example) -> Result<()> {
        self.predict_or_learn(ctx, ec, false)
    }

    pub fn learn(&mut self, ctx: &mut LearnContext, ec: &mut Example) -> Result<()> {
        self.predict_or_learn(ctx, ec, true)
    }

    /// Processes one example. Under dropout this runs two complete passes,
    /// the second with every mask bit flipped; the caller sees the first
    /// pass's predictions and loss.
    pub fn predict_or_learn(&mut self, ctx: &mut LearnContext, ec: &mut Example, is_learn: bool) -> Result<()> {
        self.finish_setup();
        let k = self.config.hidden_units;

        let masks = if self.config.dropout {
            let mask = sample_mask(&mut self.dropout_rng, k);
            let inverse = complement(&mask);
            vec![mask, inverse]
        } else {
            vec![vec![false; k]]
        };

        let saved_label = ec.label;
        let mut first: Option<OutputRecord> = None;
        for dropped in masks {
            let record = self.run_pass(ctx, ec, dropped, is_learn);
            ec.label = saved_label;
            let record = record?;
            first.get_or_insert(record);
        }

        if let Some(record) = first {
            ec.partial_prediction = record.partial_prediction;
            ec.prediction = record.prediction;
            ec.loss = record.loss;
        }
        Ok(())
    }

    fn run_pass(
        &mut self,
        ctx: &mut LearnContext,
        ec: &mut Example,
        dropped: Vec<bool>,
        is_learn: bool,
    ) -> Result<OutputRecord> {
        let k = self.config.hidden_units;
        let normalizer_hint = self.config.dropout.then_some(DROPOUT_NORMALIZER_HINT);
        let mut trace = ctx.tracing().then(String::new);

        let pre = forward_pass(
            &mut self.base,
            ctx,
            ec,
            k,
            &mut self.seed_rng,
            normalizer_hint,
            trace.as_mut(),
        )?;
        let hidden = HiddenActivations { pre, dropped };

        let (increment, stride_shift) = (self.base.increment(), self.base.stride_shift());
        let template = self.output_layer.get_or_build(k, self.config.inpass, increment, stride_shift);
        let params = OutputLayerParams {
            k,
            inpass: self.config.inpass,
            is_learn,
            activation: self.activation,
            normalizer_hint,
        };
        let record = output_layer(&mut self.base, ctx, ec, template, &hidden, &params, &mut self.seed_rng)?;

        if let Some(mut line) = trace {
            line.push_str(&format!(" {}", record.partial_prediction));
            ctx.print_raw(&line, &ec.tag);
        }

        if is_learn && ctx.training {
            backward_pass(&mut self.base, ctx, ec, template, &hidden, self.activation, record.prediction)?;
        }

        Ok(record)
    }

    /// End of a full pass over the data. Rewinds the dropout stream when the
    /// outer optimizer needs identical sweeps.
    pub fn end_pass(&mut self, ctx: &mut LearnContext) {
        if ctx.deterministic_sweeps {
            debug!("rewinding dropout state for a deterministic sweep");
            self.dropout_rng = self.dropout_checkpoint.clone();
        }
        self.base.end_pass(ctx);
    }

    /// Completes an example through the delegate's bookkeeping. The hidden
    /// layer already traced its own raw prediction, so tracing is suspended
    /// for the duration.
    pub fn finish_example(&mut self, ctx: &mut LearnContext, ec: &mut Example) {
        let sink = ctx.take_raw_prediction();
        self.base.finish_example(ctx, ec);
        ctx.restore_raw_prediction(sink);
    }

    /// Releases the output template.
    pub fn finish(&mut self) {
        self.output_layer.release();
    }
}
