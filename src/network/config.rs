use clap::Parser;
use log::warn;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Hyperparameters of the hidden-layer reduction.
///
/// Fields:
/// - `hidden_units`: number of sigmoidal hidden units `k` (at least 1)
/// - `dropout`: train with per-example dropout on the hidden layer
/// - `meanfield`: deterministic inference with every unit active;
///   overrides `dropout`
/// - `inpass`: feed the hidden layer into the delegate alongside the
///   original features instead of a separate output model
/// - `random_seed`: seed for weight seeding and dropout draws (default 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NnConfig {
    pub hidden_units: usize,
    #[serde(default)]
    pub dropout: bool,
    #[serde(default)]
    pub meanfield: bool,
    #[serde(default)]
    pub inpass: bool,
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Command-line options of the hidden-layer reduction.
#[derive(Debug, Clone, Parser)]
#[command(name = "ferrite-reduce", version, about = "Sigmoidal hidden-layer reduction over an online learner")]
pub struct NnArgs {
    /// Number of sigmoidal hidden units
    #[arg(long = "nn", value_name = "K")]
    pub hidden_units: usize,

    /// Train with per-example dropout on the hidden layer
    #[arg(long)]
    pub dropout: bool,

    /// Mean-field inference (overrides --dropout)
    #[arg(long)]
    pub meanfield: bool,

    /// Feed the hidden layer into the delegate next to the input features
    #[arg(long)]
    pub inpass: bool,

    /// Seed for weight seeding and dropout draws
    #[arg(long = "random_seed", value_name = "SEED")]
    pub random_seed: Option<u64>,
}

impl NnArgs {
    pub fn into_config(self) -> Result<NnConfig> {
        NnConfig {
            hidden_units: self.hidden_units,
            dropout: self.dropout,
            meanfield: self.meanfield,
            inpass: self.inpass,
            random_seed: self.random_seed,
        }
        .validate()
    }
}

impl NnConfig {
    pub fn new(hidden_units: usize) -> NnConfig {
        NnConfig {
            hidden_units,
            dropout: false,
            meanfield: false,
            inpass: false,
            random_seed: None,
        }
    }

    pub fn with_dropout(mut self, dropout: bool) -> NnConfig {
        self.dropout = dropout;
        self
    }

    pub fn with_meanfield(mut self, meanfield: bool) -> NnConfig {
        self.meanfield = meanfield;
        self
    }

    pub fn with_inpass(mut self, inpass: bool) -> NnConfig {
        self.inpass = inpass;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> NnConfig {
        self.random_seed = Some(seed);
        self
    }

    pub fn seed(&self) -> u64 {
        self.random_seed.unwrap_or(0)
    }

    /// Parses `--nn <k> [--dropout] [--meanfield] [--inpass] [--random_seed <n>]`
    /// (no program name) into a validated config.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<NnConfig> {
        let argv = std::iter::once("nn").chain(args.iter().map(|a| a.as_ref()));
        let args = NnArgs::try_parse_from(argv).map_err(|e| Error::Config(e.to_string()))?;
        args.into_config()
    }

    /// Checks preconditions and resolves conflicting flags: mean-field wins
    /// over dropout.
    pub fn validate(mut self) -> Result<NnConfig> {
        if self.hidden_units == 0 {
            return Err(Error::Config("--nn needs at least one hidden unit".into()));
        }
        if self.meanfield && self.dropout {
            warn!("--meanfield overrides --dropout; dropout disabled");
            self.dropout = false;
        }
        Ok(self)
    }

    /// Options that change the meaning of trained weights and therefore have
    /// to be stored alongside them.
    pub fn file_options(&self) -> String {
        let mut opts = format!(" --nn {}", self.hidden_units);
        if self.dropout {
            opts.push_str(" --dropout");
        }
        if self.inpass {
            opts.push_str(" --inpass");
        }
        opts
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a config previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<NnConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: NnConfig = serde_json::from_reader(reader)?;
        config.validate()
    }
}
