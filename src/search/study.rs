//! Study driver: run an objective over sampled parameter sets.
//!
//! Supports exhaustive grid enumeration and seeded random sampling. Failed
//! trials are recorded and skipped, never fatal; the study fails only when
//! no trial completes at all.

use std::str::FromStr;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::space::{ParamSet, SearchError, SearchSpace};
use crate::config::DEFAULT_RANDOM_TRIALS;

/// How parameter sets are drawn from the space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerKind {
    /// Every point of the cartesian grid, in declaration order.
    Grid,
    /// Independent uniform draws per parameter, seeded.
    Random,
}

impl FromStr for SamplerKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" | "gridsearch" | "gridsampler" => Ok(SamplerKind::Grid),
            "random" | "randomsearch" | "randomsampler" => Ok(SamplerKind::Random),
            other => Err(SearchError::UnknownSampler(other.to_string())),
        }
    }
}

/// Optimization direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    fn better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }
}

/// Study configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudyConfig {
    pub sampler: SamplerKind,
    pub direction: Direction,
    /// Trial budget. Grid studies default to the full grid, random studies
    /// to `DEFAULT_RANDOM_TRIALS`.
    pub n_trials: Option<usize>,
    /// Wall-clock budget, checked before each trial.
    pub timeout: Option<Duration>,
    pub seed: Option<u64>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerKind::Random,
            direction: Direction::Maximize,
            n_trials: None,
            timeout: None,
            seed: None,
        }
    }
}

/// One evaluated (or failed) parameter set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trial {
    pub number: usize,
    pub params: ParamSet,
    pub value: Option<f64>,
    pub error: Option<String>,
}

/// Outcome of a completed study.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudyResult {
    pub best_params: ParamSet,
    pub best_value: f64,
    pub trials: Vec<Trial>,
}

/// A configured study over one search space.
pub struct Study {
    space: SearchSpace,
    config: StudyConfig,
}

impl Study {
    pub fn new(space: SearchSpace, config: StudyConfig) -> Self {
        Self { space, config }
    }

    /// Run the objective over sampled parameter sets and return the best.
    pub fn run<F>(&self, objective: F) -> Result<StudyResult, SearchError>
    where
        F: Fn(&ParamSet) -> Result<f64, SearchError>,
    {
        if self.space.grid_size() == 0 {
            return Err(SearchError::EmptySpace);
        }

        let start = Instant::now();
        let budget = match self.config.sampler {
            SamplerKind::Grid => {
                let grid = self.space.grid_size();
                self.config.n_trials.map_or(grid, |n| n.min(grid))
            }
            SamplerKind::Random => self.config.n_trials.unwrap_or(DEFAULT_RANDOM_TRIALS),
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed.unwrap_or(0));
        let sizes: Vec<usize> = self.space.entries().iter().map(|(_, c)| c.len()).collect();
        let mut odometer = vec![0usize; sizes.len()];

        let mut trials = Vec::with_capacity(budget);
        let mut best: Option<(f64, ParamSet)> = None;

        for number in 0..budget {
            if let Some(timeout) = self.config.timeout {
                if start.elapsed() >= timeout {
                    tracing::warn!("study timeout after {} trials", trials.len());
                    break;
                }
            }

            let indices: Vec<usize> = match self.config.sampler {
                SamplerKind::Grid => {
                    let current = odometer.clone();
                    advance(&mut odometer, &sizes);
                    current
                }
                SamplerKind::Random => sizes.iter().map(|&s| rng.gen_range(0..s)).collect(),
            };
            let params = self.materialize(&indices);

            match objective(&params) {
                Ok(value) => {
                    tracing::debug!("trial {number}: value={value:.6}");
                    let improved = best
                        .as_ref()
                        .map_or(true, |(b, _)| self.config.direction.better(value, *b));
                    if improved {
                        best = Some((value, params.clone()));
                    }
                    trials.push(Trial {
                        number,
                        params,
                        value: Some(value),
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!("trial {number} failed: {err}");
                    trials.push(Trial {
                        number,
                        params,
                        value: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let (best_value, best_params) = best.ok_or(SearchError::NoTrials)?;
        Ok(StudyResult {
            best_params,
            best_value,
            trials,
        })
    }

    fn materialize(&self, indices: &[usize]) -> ParamSet {
        ParamSet::new(
            self.space
                .entries()
                .iter()
                .zip(indices.iter())
                .map(|((name, candidates), &i)| (name.clone(), candidates[i].clone()))
                .collect(),
        )
    }
}

/// Advance a mixed-radix odometer; returns false after the last point.
fn advance(odometer: &mut [usize], sizes: &[usize]) -> bool {
    for i in (0..odometer.len()).rev() {
        odometer[i] += 1;
        if odometer[i] < sizes[i] {
            return true;
        }
        odometer[i] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> SearchSpace {
        let mut s = SearchSpace::new();
        s.add_int("a", &[1, 2, 3]).add_int("b", &[10, 20]);
        s
    }

    #[test]
    fn test_grid_visits_every_point() {
        let study = Study::new(
            space(),
            StudyConfig {
                sampler: SamplerKind::Grid,
                ..StudyConfig::default()
            },
        );
        let result = study
            .run(|p| Ok((p.get_int("a")? + p.get_int("b")?) as f64))
            .unwrap();
        assert_eq!(result.trials.len(), 6);
        assert_eq!(result.best_value, 23.0);
        assert_eq!(result.best_params.get_int("a").unwrap(), 3);
        assert_eq!(result.best_params.get_int("b").unwrap(), 20);
    }

    #[test]
    fn test_minimize_direction() {
        let study = Study::new(
            space(),
            StudyConfig {
                sampler: SamplerKind::Grid,
                direction: Direction::Minimize,
                ..StudyConfig::default()
            },
        );
        let result = study
            .run(|p| Ok((p.get_int("a")? + p.get_int("b")?) as f64))
            .unwrap();
        assert_eq!(result.best_value, 11.0);
    }

    #[test]
    fn test_random_is_seeded() {
        let cfg = StudyConfig {
            sampler: SamplerKind::Random,
            n_trials: Some(10),
            seed: Some(42),
            ..StudyConfig::default()
        };
        let a = Study::new(space(), cfg.clone())
            .run(|p| Ok(p.get_int("a")? as f64))
            .unwrap();
        let b = Study::new(space(), cfg)
            .run(|p| Ok(p.get_int("a")? as f64))
            .unwrap();
        assert_eq!(a.trials.len(), b.trials.len());
        for (ta, tb) in a.trials.iter().zip(b.trials.iter()) {
            assert_eq!(ta.params.get_int("a").unwrap(), tb.params.get_int("a").unwrap());
            assert_eq!(ta.params.get_int("b").unwrap(), tb.params.get_int("b").unwrap());
        }
    }

    #[test]
    fn test_failed_trials_are_recorded_not_fatal() {
        let study = Study::new(
            space(),
            StudyConfig {
                sampler: SamplerKind::Grid,
                ..StudyConfig::default()
            },
        );
        let result = study
            .run(|p| {
                let a = p.get_int("a")?;
                if a == 2 {
                    Err(SearchError::Objective("boom".into()))
                } else {
                    Ok(a as f64)
                }
            })
            .unwrap();
        let failed = result.trials.iter().filter(|t| t.error.is_some()).count();
        assert_eq!(failed, 2);
        assert_eq!(result.best_value, 3.0);
    }

    #[test]
    fn test_all_failed_is_no_trials() {
        let study = Study::new(
            space(),
            StudyConfig {
                sampler: SamplerKind::Grid,
                ..StudyConfig::default()
            },
        );
        let err = study
            .run(|_| Err::<f64, _>(SearchError::Objective("always".into())))
            .unwrap_err();
        assert!(matches!(err, SearchError::NoTrials));
    }

    #[test]
    fn test_zero_timeout_stops_immediately() {
        let study = Study::new(
            space(),
            StudyConfig {
                sampler: SamplerKind::Grid,
                timeout: Some(Duration::ZERO),
                ..StudyConfig::default()
            },
        );
        let err = study.run(|_| Ok(1.0)).unwrap_err();
        assert!(matches!(err, SearchError::NoTrials));
    }

    #[test]
    fn test_empty_space_errors() {
        let study = Study::new(SearchSpace::new(), StudyConfig::default());
        assert!(matches!(
            study.run(|_| Ok(0.0)),
            Err(SearchError::EmptySpace)
        ));
    }

    #[test]
    fn test_n_trials_caps_grid() {
        let study = Study::new(
            space(),
            StudyConfig {
                sampler: SamplerKind::Grid,
                n_trials: Some(4),
                ..StudyConfig::default()
            },
        );
        let result = study.run(|p| Ok(p.get_int("a")? as f64)).unwrap();
        assert_eq!(result.trials.len(), 4);
    }

    #[test]
    fn test_sampler_from_str() {
        assert_eq!("grid".parse::<SamplerKind>().unwrap(), SamplerKind::Grid);
        assert_eq!(
            "RandomSearch".parse::<SamplerKind>().unwrap(),
            SamplerKind::Random
        );
        assert!("bayesian".parse::<SamplerKind>().is_err());
    }
}
