// Small driver: streams XOR through the hidden-layer reduction.
// Options are the reduction's own, e.g.
//   cargo run -- --nn 8 --dropout --random_seed 3
use clap::Parser;
use log::{error, info};

use ferrite_reduce::{Example, LearnContext, LossType, NeuralNetwork, NnArgs, NnConfig, SgdLearner};

const PASSES: usize = 4000;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = if std::env::args().len() <= 1 {
        NnConfig::new(8).validate()
    } else {
        match NnArgs::try_parse() {
            Ok(args) => args.into_config(),
            Err(e) => e.exit(),
        }
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };
    info!("model options:{}", config.file_options());

    if let Err(e) = run(config) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: NnConfig) -> ferrite_reduce::Result<()> {
    let base = SgdLearner::new(18, config.hidden_units + 1, 0.5);
    let mut nn = NeuralNetwork::new(config, base)?;
    let mut ctx = LearnContext::new(LossType::Squared);
    let data = [([0.0, 0.0], 0.0), ([0.0, 1.0], 1.0), ([1.0, 0.0], 1.0), ([1.0, 1.0], 0.0)];

    for pass in 1..=PASSES {
        let mut pass_loss = 0.0;
        for (x, y) in data {
            let mut ec = xor_example(&nn, x, y);
            nn.learn(&mut ctx, &mut ec)?;
            pass_loss += ec.loss;
            nn.finish_example(&mut ctx, &mut ec);
        }
        nn.end_pass(&mut ctx);
        if pass % 500 == 0 {
            info!("pass {pass}: loss = {:.6}, average = {:.6}", pass_loss / 4.0, ctx.sd.average_loss());
        }
    }

    for (x, y) in data {
        let mut ec = xor_example(&nn, x, y);
        nn.predict(&mut ctx, &mut ec)?;
        println!("Input: {x:?} -> Output: {:.4} (expected {y})", ec.prediction);
    }
    nn.finish();
    Ok(())
}

fn xor_example(nn: &NeuralNetwork<SgdLearner>, x: [f32; 2], y: f32) -> Example {
    let mut ec = Example::new(Some(y));
    for (hash, v) in [1u64, 2].into_iter().zip(x) {
        if v != 0.0 {
            ec.push_feature(b'x', nn.base().feature_index(hash), v);
        }
    }
    nn.base().add_constant(&mut ec);
    ec
}
