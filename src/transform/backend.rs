//! Bulk evaluator selection for the batch transform.
//!
//! The batch applier depends on this seam rather than a hard-coded library
//! call: `Serial` is the always-available nested-loop reference, `Parallel`
//! fans the batch axis out over a rayon worker pool. Both produce
//! bit-identical output because only the outer loop differs.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TransformError;

/// Evaluator backend for `apply_bank`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// Sequential nested loops. Reference implementation.
    Serial,
    /// Rayon fork-join over the batch axis.
    Parallel,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Serial => write!(f, "serial"),
            Backend::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for Backend {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(Backend::Serial),
            "parallel" => Ok(Backend::Parallel),
            other => Err(TransformError::BackendUnavailable(other.to_string())),
        }
    }
}

/// Pick the best available backend.
pub fn detect_backend() -> Backend {
    Backend::Parallel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_roundtrip() {
        assert_eq!("serial".parse::<Backend>().unwrap(), Backend::Serial);
        assert_eq!("Parallel".parse::<Backend>().unwrap(), Backend::Parallel);
        assert_eq!(Backend::Serial.to_string(), "serial");
    }

    #[test]
    fn test_unknown_backend_is_typed_error() {
        let err = "cuda".parse::<Backend>().unwrap_err();
        assert!(matches!(err, TransformError::BackendUnavailable(_)));
    }

    #[test]
    fn test_detect_backend() {
        assert_eq!(detect_backend(), Backend::Parallel);
    }
}
