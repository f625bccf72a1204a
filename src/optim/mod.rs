pub mod weights;
pub mod sgd;

pub use weights::WeightStore;
pub use sgd::SgdLearner;
