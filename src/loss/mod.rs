pub mod squared;
pub mod logistic;
pub mod hinge;
pub mod quantile;
pub mod loss_type;

pub use squared::SquaredLoss;
pub use logistic::LogisticLoss;
pub use hinge::HingeLoss;
pub use quantile::QuantileLoss;
pub use loss_type::LossType;
