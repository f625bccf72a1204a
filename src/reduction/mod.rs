pub mod shared;
pub mod example;
pub mod sink;
pub mod context;
pub mod learner;

pub use shared::SharedData;
pub use example::{Example, Feature, Namespace};
pub use sink::{MemorySink, TextSink, WriterSink};
pub use context::{HiddenUnitScope, LearnContext};
pub use learner::BaseLearner;
