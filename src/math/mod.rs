pub mod fast;

pub use fast::{fast_exp, fast_exp2, fast_tanh};
