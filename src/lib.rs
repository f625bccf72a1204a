pub mod error;
pub mod math;
pub mod activation;
pub mod loss;
pub mod reduction;
pub mod optim;
pub mod network;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::fast::{fast_exp, fast_exp2, fast_tanh};
pub use loss::loss_type::LossType;
pub use reduction::context::{HiddenUnitScope, LearnContext};
pub use reduction::example::{Example, Feature};
pub use reduction::learner::BaseLearner;
pub use reduction::shared::SharedData;
pub use reduction::sink::{MemorySink, TextSink, WriterSink};
pub use optim::sgd::SgdLearner;
pub use network::config::{NnArgs, NnConfig};
pub use network::network::NeuralNetwork;
