use ferrite_reduce::reduction::example::NN_OUTPUT_NAMESPACE;
use ferrite_reduce::{
    BaseLearner, Error, Example, LearnContext, LossType, NeuralNetwork, NnConfig, Result, SgdLearner,
};

#[derive(Debug, Clone, PartialEq)]
struct Call {
    sub: usize,
    learn: bool,
    num_features: usize,
    /// Values published in the hidden-layer namespace, if any.
    hidden: Vec<f32>,
    partial_prediction: f32,
    label: Option<f32>,
    weight: f32,
    ft_offset: u64,
}

/// Delegate wrapper that records every call, and optionally fails on one
/// sub-model.
struct Recording {
    inner: SgdLearner,
    calls: Vec<Call>,
    fail_on: Option<usize>,
}

impl Recording {
    fn new(k: usize) -> Recording {
        Recording { inner: SgdLearner::new(18, k + 1, 0.1), calls: Vec::new(), fail_on: None }
    }

    fn record(&mut self, ec: &Example, sub: usize, learn: bool) {
        let hidden = ec
            .namespaces
            .iter()
            .filter(|n| n.index == NN_OUTPUT_NAMESPACE)
            .flat_map(|n| n.features.iter().map(|f| f.x))
            .collect();
        self.calls.push(Call {
            sub,
            learn,
            num_features: ec.num_features(),
            hidden,
            partial_prediction: ec.partial_prediction,
            label: ec.label,
            weight: ec.weight,
            ft_offset: ec.ft_offset,
        });
    }

    fn output_calls(&self, k: usize) -> Vec<&Call> {
        self.calls.iter().filter(|c| c.sub == k).collect()
    }
}

impl BaseLearner for Recording {
    fn predict(&mut self, ctx: &mut LearnContext, ec: &mut Example, sub: usize) -> Result<()> {
        if self.fail_on == Some(sub) {
            return Err(Error::Delegate(format!("sub-model {sub} unavailable")));
        }
        self.inner.predict(ctx, ec, sub)?;
        self.record(ec, sub, false);
        Ok(())
    }

    fn learn(&mut self, ctx: &mut LearnContext, ec: &mut Example, sub: usize) -> Result<()> {
        if self.fail_on == Some(sub) {
            return Err(Error::Delegate(format!("sub-model {sub} unavailable")));
        }
        self.inner.learn(ctx, ec, sub)?;
        self.record(ec, sub, true);
        Ok(())
    }

    fn increment(&self) -> u64 {
        self.inner.increment()
    }

    fn sub_models(&self) -> usize {
        self.inner.sub_models()
    }

    fn stride_shift(&self) -> u32 {
        self.inner.stride_shift()
    }

    fn constant_index(&self) -> u64 {
        self.inner.constant_index()
    }

    fn weight(&self, index: u64) -> f32 {
        self.inner.weight(index)
    }

    fn seed_if_untouched(&mut self, index: u64, value: f32, normalizer_hint: Option<f32>) -> bool {
        self.inner.seed_if_untouched(index, value, normalizer_hint)
    }
}

fn network(config: NnConfig) -> NeuralNetwork<Recording> {
    let k = config.hidden_units;
    NeuralNetwork::new(config, Recording::new(k)).unwrap()
}

fn example(nn: &NeuralNetwork<Recording>, label: Option<f32>) -> Example {
    let mut ec = Example::new(label);
    ec.push_feature(b'x', nn.base().inner.feature_index(17), 1.0);
    nn.base().inner.add_constant(&mut ec);
    ec
}

fn bias_index(nn: &NeuralNetwork<Recording>, i: usize) -> u64 {
    nn.base().constant_index() + i as u64 * nn.base().increment()
}

#[test]
fn one_learn_escapes_the_saddle_point() {
    let mut nn = network(NnConfig::new(2).with_seed(0));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(1.0));

    assert_eq!(nn.base().weight(bias_index(&nn, 0)), 0.0);
    assert_eq!(nn.base().weight(bias_index(&nn, 1)), 0.0);

    nn.learn(&mut ctx, &mut ec).unwrap();

    assert!(nn.base().weight(bias_index(&nn, 0)) != 0.0);
    assert!(nn.base().weight(bias_index(&nn, 1)) != 0.0);

    let output = nn.base().output_calls(2);
    assert_eq!(output.len(), 1);
    // the caller sees the raw score of the output call, not its clamped value
    assert_eq!(ec.partial_prediction, output[0].partial_prediction);
    assert_eq!(ec.prediction, ctx.sd.finalize_prediction(output[0].partial_prediction));
    // two unit activations and the bias slot
    assert_eq!(output[0].hidden.len(), 3);
    assert!(output[0].hidden[..2].iter().all(|h| h.abs() < 1.0));
    assert_eq!(output[0].hidden[2], 1.0);
}

#[test]
fn forward_is_deterministic_without_learning() {
    let mut nn = network(NnConfig::new(3).with_seed(5));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(0.5));

    nn.predict(&mut ctx, &mut ec).unwrap();
    let first = (ec.partial_prediction, ec.prediction);
    let first_hidden = nn.base().output_calls(3)[0].hidden.clone();

    nn.predict(&mut ctx, &mut ec).unwrap();
    assert_eq!((ec.partial_prediction, ec.prediction), first);
    assert_eq!(nn.base().output_calls(3)[1].hidden, first_hidden);
}

#[test]
fn same_seed_same_network() {
    let config = NnConfig::new(4).with_dropout(true).with_seed(21);
    let mut a = network(config.clone());
    let mut b = network(config);
    let mut ctx_a = LearnContext::new(LossType::Squared);
    let mut ctx_b = LearnContext::new(LossType::Squared);

    for label in [1.0, 0.0, 1.0] {
        let mut ea = example(&a, Some(label));
        let mut eb = example(&b, Some(label));
        a.learn(&mut ctx_a, &mut ea).unwrap();
        b.learn(&mut ctx_b, &mut eb).unwrap();
        assert_eq!(ea.partial_prediction.to_bits(), eb.partial_prediction.to_bits());
        assert_eq!(ea.prediction.to_bits(), eb.prediction.to_bits());
    }
    assert_eq!(a.base().calls, b.base().calls);
}

#[test]
fn call_counts_without_dropout() {
    let k = 3;
    let mut nn = network(NnConfig::new(k));
    let mut ctx = LearnContext::new(LossType::Squared);

    let mut ec = example(&nn, Some(1.0));
    nn.predict(&mut ctx, &mut ec).unwrap();
    assert_eq!(nn.base().calls.len(), k + 1);
    assert!(nn.base().calls.iter().all(|c| !c.learn));

    nn.base_mut().calls.clear();
    nn.learn(&mut ctx, &mut ec).unwrap();
    let calls = &nn.base().calls;
    let forward: Vec<usize> = calls.iter().take(k).map(|c| c.sub).collect();
    assert_eq!(forward, vec![0, 1, 2]);
    assert!(calls[k].learn && calls[k].sub == k);
    let backward = calls.len() - (k + 1);
    assert!(backward <= k);
    assert!(calls[k + 1..].iter().all(|c| c.learn && c.sub < k));
}

#[test]
fn dropout_doubles_calls_with_complementary_masks() {
    let k = 6;
    let mut nn = network(NnConfig::new(k).with_dropout(true).with_seed(2));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(1.0));

    nn.predict(&mut ctx, &mut ec).unwrap();
    assert_eq!(nn.base().calls.len(), 2 * (k + 1));

    let output = nn.base().output_calls(k);
    assert_eq!(output.len(), 2);
    let first: Vec<bool> = output[0].hidden[..k].iter().map(|&h| h == 0.0).collect();
    let second: Vec<bool> = output[1].hidden[..k].iter().map(|&h| h == 0.0).collect();
    assert!(first.iter().zip(&second).all(|(a, b)| a != b), "{first:?} vs {second:?}");
    // surviving units are doubled
    assert!(output[0].hidden[..k].iter().all(|h| h.abs() < 2.0));

    // the caller sees the first pass
    assert_eq!(ec.partial_prediction, output[0].partial_prediction);
}

#[test]
fn dropout_learn_trains_each_unit_at_most_once() {
    let k = 4;
    let mut nn = network(NnConfig::new(k).with_dropout(true).with_seed(9));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(1.0));

    nn.learn(&mut ctx, &mut ec).unwrap();
    let calls = &nn.base().calls;
    let output_learns = calls.iter().filter(|c| c.learn && c.sub == k).count();
    let hidden_learns: Vec<usize> = calls.iter().filter(|c| c.learn && c.sub < k).map(|c| c.sub).collect();
    assert_eq!(output_learns, 2);
    assert!(hidden_learns.len() <= k);
    let mut sorted = hidden_learns.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), hidden_learns.len());
}

#[test]
fn passthrough_lends_hidden_features_only_during_output_call() {
    let k = 3;
    let mut nn = network(NnConfig::new(k).with_inpass(true));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(1.0));
    let before = ec.num_features();

    nn.learn(&mut ctx, &mut ec).unwrap();

    let output = nn.base().output_calls(k);
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].num_features, before + k);
    assert_eq!(output[0].hidden.len(), k);
    assert_eq!(ec.num_features(), before);
    assert!(ec.namespaces.iter().all(|n| n.index != NN_OUTPUT_NAMESPACE));
    assert_eq!(nn.template().map(|t| t.len()), Some(k));
}

#[test]
fn delegate_failure_restores_shared_state() {
    let k = 2;
    let mut nn = network(NnConfig::new(k).with_inpass(true));
    nn.base_mut().fail_on = Some(k);
    let mut ctx = LearnContext::new(LossType::Hinge).with_bounds(-1.0, 1.0);
    let mut ec = example(&nn, Some(1.0));
    let before = ec.clone();

    let res = nn.learn(&mut ctx, &mut ec);
    assert!(matches!(res, Err(Error::Delegate(_))));
    assert_eq!(ctx.loss, LossType::Hinge);
    assert_eq!((ctx.sd.min_label, ctx.sd.max_label), (-1.0, 1.0));
    assert!(!ctx.sd.bounds_frozen);
    assert_eq!(ec.label, Some(1.0));
    assert_eq!(ec.namespaces, before.namespaces);
    assert_eq!(nn.template().map(|t| t.len()), Some(k));
}

#[test]
fn failure_inside_hidden_scope_restores_loss() {
    let mut nn = network(NnConfig::new(2));
    nn.base_mut().fail_on = Some(1);
    let mut ctx = LearnContext::new(LossType::Logistic).with_bounds(-1.0, 1.0);
    let mut ec = example(&nn, Some(-1.0));

    assert!(nn.predict(&mut ctx, &mut ec).is_err());
    assert_eq!(ctx.loss, LossType::Logistic);
    assert_eq!((ctx.sd.min_label, ctx.sd.max_label), (-1.0, 1.0));
}

#[test]
fn separate_output_carries_weight_and_offset() {
    let k = 2;
    let offset = 1000;
    let mut nn = network(NnConfig::new(k).with_seed(3));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(1.0)).with_weight(3.0);
    ec.ft_offset = offset;

    nn.learn(&mut ctx, &mut ec).unwrap();

    let output = nn.base().output_calls(k);
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].label, Some(1.0));
    assert_eq!(output[0].weight, 3.0);
    assert_eq!(output[0].ft_offset, offset);
    assert!(nn.base().calls.iter().all(|c| c.weight == 3.0 && c.ft_offset == offset));
    assert_eq!(ec.label, Some(1.0));
}

#[test]
fn seeded_weights_follow_the_feature_offset() {
    let k = 2;
    let offset = 1000;
    let mut nn = network(NnConfig::new(k).with_seed(3));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(1.0));
    ec.ft_offset = offset;

    nn.learn(&mut ctx, &mut ec).unwrap();

    for i in 0..k {
        assert!(nn.base().weight(bias_index(&nn, i) + offset) != 0.0);
        assert_eq!(nn.base().weight(bias_index(&nn, i)), 0.0);
    }
    let output_offset = k as u64 * nn.base().increment();
    let template = nn.template().unwrap();
    for slot in template.block().features.iter().take(k) {
        let index = slot.weight_index + output_offset;
        assert!(nn.base().weight(index + offset) != 0.0);
        assert_eq!(nn.base().weight(index), 0.0);
    }
}

#[test]
fn dropout_hands_normalizer_hint_to_delegate() {
    let k = 3;
    for (dropout, hint) in [(true, 1e-4), (false, 0.0)] {
        let base = SgdLearner::new(18, k + 1, 0.1).with_normalized(true);
        let mut nn = NeuralNetwork::new(NnConfig::new(k).with_dropout(dropout).with_seed(4), base).unwrap();
        let mut ctx = LearnContext::new(LossType::Squared);
        let mut ec = Example::new(None);
        ec.push_feature(b'x', nn.base().feature_index(17), 1.0);
        nn.base().add_constant(&mut ec);

        nn.predict(&mut ctx, &mut ec).unwrap();

        let base = nn.base();
        let inc = base.increment();
        for i in 0..k {
            let bias = base.constant_index() + i as u64 * inc;
            assert!(base.weight(bias) != 0.0);
            assert_eq!(base.normalizer(bias), hint, "bias {i}, dropout {dropout}");
        }
        let template = nn.template().unwrap();
        for slot in template.block().features.iter().take(k) {
            assert_eq!(base.normalizer(slot.weight_index + k as u64 * inc), hint);
        }
    }
}

#[test]
fn infinite_label_skips_credit_assignment() {
    let k = 2;
    let mut nn = network(NnConfig::new(k));
    let mut ctx = LearnContext::new(LossType::Squared);
    let mut ec = example(&nn, Some(f32::INFINITY));

    nn.learn(&mut ctx, &mut ec).unwrap();

    assert!(nn.base().calls.iter().all(|c| !c.learn || c.sub == k));
    assert_eq!(nn.base().weight(nn.base().inner.feature_index(17)), 0.0);
    assert_eq!((ctx.sd.min_label, ctx.sd.max_label), (0.0, 1.0));

    let mut next = example(&nn, Some(1.0));
    nn.predict(&mut ctx, &mut next).unwrap();
    assert!(next.prediction.is_finite());
}

#[test]
fn learns_xor() {
    let mut nn = NeuralNetwork::new(NnConfig::new(8).with_seed(1), SgdLearner::new(18, 9, 0.5)).unwrap();
    let mut ctx = LearnContext::new(LossType::Squared);
    let data = [([0.0, 0.0], 0.0), ([0.0, 1.0], 1.0), ([1.0, 0.0], 1.0), ([1.0, 1.0], 0.0)];

    let make = |nn: &NeuralNetwork<SgdLearner>, x: [f32; 2], y: f32| {
        let mut ec = Example::new(Some(y));
        for (hash, &v) in [1u64, 2].iter().zip(&x) {
            if v != 0.0 {
                ec.push_feature(b'x', nn.base().feature_index(*hash), v);
            }
        }
        nn.base().add_constant(&mut ec);
        ec
    };

    for _ in 0..3000 {
        for &(x, y) in &data {
            let mut ec = make(&nn, x, y);
            nn.learn(&mut ctx, &mut ec).unwrap();
        }
    }

    let mut total = 0.0;
    for &(x, y) in &data {
        let mut ec = make(&nn, x, y);
        nn.predict(&mut ctx, &mut ec).unwrap();
        total += (ec.prediction - y).powi(2);
    }
    assert!(total / 4.0 < 0.1, "mean squared error {}", total / 4.0);
}
