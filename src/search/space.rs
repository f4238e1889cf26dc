//! Named parameter spaces and sampled parameter sets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parameter access and study execution.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("parameter '{name}' is not a {expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("search space has no parameters or an empty candidate list")]
    EmptySpace,

    #[error("no trials completed")]
    NoTrials,

    #[error("unknown sampler '{0}' (available: grid, random)")]
    UnknownSampler(String),

    #[error("objective failed: {0}")]
    Objective(String),
}

/// One candidate value for a parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Categorical(String),
}

/// An ordered set of named parameters, each with a finite candidate list.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    params: Vec<(String, Vec<ParamValue>)>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_float(&mut self, name: &str, candidates: &[f64]) -> &mut Self {
        self.params.push((
            name.to_string(),
            candidates.iter().map(|&v| ParamValue::Float(v)).collect(),
        ));
        self
    }

    pub fn add_int(&mut self, name: &str, candidates: &[i64]) -> &mut Self {
        self.params.push((
            name.to_string(),
            candidates.iter().map(|&v| ParamValue::Int(v)).collect(),
        ));
        self
    }

    pub fn add_categorical(&mut self, name: &str, candidates: &[&str]) -> &mut Self {
        self.params.push((
            name.to_string(),
            candidates
                .iter()
                .map(|&v| ParamValue::Categorical(v.to_string()))
                .collect(),
        ));
        self
    }

    /// Number of points in the full cartesian grid; 0 if any candidate list
    /// is empty or no parameter was added.
    pub fn grid_size(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        self.params.iter().map(|(_, c)| c.len()).product()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, Vec<ParamValue>)] {
        &self.params
    }
}

/// One sampled point in the search space.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParamSet {
    values: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub(crate) fn new(values: Vec<(String, ParamValue)>) -> Self {
        Self { values }
    }

    fn get(&self, name: &str) -> Result<&ParamValue, SearchError> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| SearchError::UnknownParam(name.to_string()))
    }

    pub fn get_float(&self, name: &str) -> Result<f64, SearchError> {
        match self.get(name)? {
            ParamValue::Float(v) => Ok(*v),
            _ => Err(SearchError::WrongType {
                name: name.to_string(),
                expected: "float",
            }),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, SearchError> {
        match self.get(name)? {
            ParamValue::Int(v) => Ok(*v),
            _ => Err(SearchError::WrongType {
                name: name.to_string(),
                expected: "int",
            }),
        }
    }

    pub fn get_categorical(&self, name: &str) -> Result<&str, SearchError> {
        match self.get(name)? {
            ParamValue::Categorical(v) => Ok(v.as_str()),
            _ => Err(SearchError::WrongType {
                name: name.to_string(),
                expected: "categorical",
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> SearchSpace {
        let mut s = SearchSpace::new();
        s.add_float("lr", &[0.1, 0.01])
            .add_int("kernels", &[100, 500, 1000])
            .add_categorical("backend", &["serial", "parallel"]);
        s
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(space().grid_size(), 12);
        assert_eq!(SearchSpace::new().grid_size(), 0);
    }

    #[test]
    fn test_empty_candidates_zero_grid() {
        let mut s = SearchSpace::new();
        s.add_float("lr", &[]);
        assert_eq!(s.grid_size(), 0);
    }

    #[test]
    fn test_typed_getters() {
        let p = ParamSet::new(vec![
            ("lr".into(), ParamValue::Float(0.1)),
            ("kernels".into(), ParamValue::Int(500)),
            ("backend".into(), ParamValue::Categorical("serial".into())),
        ]);
        assert_eq!(p.get_float("lr").unwrap(), 0.1);
        assert_eq!(p.get_int("kernels").unwrap(), 500);
        assert_eq!(p.get_categorical("backend").unwrap(), "serial");
    }

    #[test]
    fn test_wrong_type() {
        let p = ParamSet::new(vec![("lr".into(), ParamValue::Float(0.1))]);
        assert!(matches!(
            p.get_int("lr"),
            Err(SearchError::WrongType { .. })
        ));
    }

    #[test]
    fn test_unknown_param() {
        let p = ParamSet::default();
        assert!(matches!(
            p.get_float("missing"),
            Err(SearchError::UnknownParam(_))
        ));
    }
}
