//! Hyperparameter search: a small study driver over grid/random samplers.

pub mod space;
pub mod study;

pub use space::{ParamSet, ParamValue, SearchError, SearchSpace};
pub use study::{Direction, SamplerKind, Study, StudyConfig, StudyResult, Trial};
