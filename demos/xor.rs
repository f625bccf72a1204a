use ferrite_reduce::{Example, LearnContext, LossType, NeuralNetwork, NnConfig, SgdLearner, WriterSink};

fn main() {
    env_logger::init();

    let config = NnConfig::new(8).with_seed(1);
    let base = SgdLearner::new(18, config.hidden_units + 1, 0.5);
    let mut nn = NeuralNetwork::new(config, base).expect("valid configuration");
    let mut ctx = LearnContext::new(LossType::Squared);

    let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let labels = [0.0, 1.0, 1.0, 0.0];

    let make = |nn: &NeuralNetwork<SgdLearner>, x: [f32; 2], y: f32, tag: &str| {
        let mut ec = Example::new(Some(y)).with_tag(tag);
        ec.push_feature(b'x', nn.base().feature_index(1), x[0]);
        ec.push_feature(b'x', nn.base().feature_index(2), x[1]);
        nn.base().add_constant(&mut ec);
        ec
    };

    for epoch in 0..4000 {
        let mut loss = 0.0;
        for (x, &y) in inputs.iter().zip(&labels) {
            let mut ec = make(&nn, *x, y, "");
            nn.learn(&mut ctx, &mut ec).expect("delegate never fails");
            loss += ec.loss;
        }
        if epoch % 1000 == 0 {
            println!("Epoch {epoch}: loss = {:.6}", loss / 4.0);
        }
    }

    // trace the hidden layer for the final predictions
    let mut ctx = ctx.with_raw_prediction(Box::new(WriterSink::new(std::io::stdout())));
    for (i, (x, &y)) in inputs.iter().zip(&labels).enumerate() {
        let mut ec = make(&nn, *x, y, &format!("xor{i}"));
        nn.predict(&mut ctx, &mut ec).expect("delegate never fails");
        println!("Input: {:?} -> Output: {:.4}", x, ec.prediction);
    }
}
