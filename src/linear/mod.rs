//! Linear models consuming the feature matrix.

pub mod ridge;

pub use ridge::{default_alphas, RidgeCv, RidgeError, RidgeModel};
