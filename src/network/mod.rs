pub mod config;
pub mod template;
pub mod forward;
pub mod output;
pub mod backward;
pub mod network;

pub use config::{NnArgs, NnConfig};
pub use template::{OutputLayer, OutputTemplate};
pub use forward::HiddenActivations;
pub use output::OutputRecord;
pub use network::NeuralNetwork;
