//! Configuration for iterative geometric solves.

use serde::{Deserialize, Serialize};

/// Bound and stopping criterion for the ellipsoid foot-point solve.
///
/// The solve bisects a monotone function of one variable, so every call
/// terminates after at most `max_iterations` evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Maximum number of bisection steps before reporting non-convergence.
    pub max_iterations: usize,
    /// Relative width of the bracketing interval at which the root is accepted.
    pub tolerance: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 256,
            tolerance: f64::EPSILON,
        }
    }
}

impl ProjectionConfig {
    /// Iterate until the bracket collapses to adjacent floats.
    pub fn precise() -> Self {
        Self {
            max_iterations: 1100,
            tolerance: 0.0,
        }
    }

    /// Coarse projection, roughly micrometre accuracy on an earth-sized body.
    pub fn fast() -> Self {
        Self {
            max_iterations: 64,
            tolerance: 1e-12,
        }
    }
}
