use thiserror::Error;

/// Failures raised by linear algebra, root solving and geometric primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeomError {
    #[error("Invalid parameters: {reason}")]
    Validation { reason: String },

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Did not converge after {max_iterations} iterations (residual: {residual})")]
    NonConvergence { max_iterations: usize, residual: f64 },

    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },
}

impl GeomError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeomError>;

/// Reject non-finite or non-positive lengths (radii, semi-axes).
pub(crate) fn check_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeomError::validation(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_positive() {
        assert_eq!(check_positive("radius", 2.0), Ok(2.0));
        assert!(matches!(
            check_positive("radius", 0.0),
            Err(GeomError::Validation { .. })
        ));
        assert!(check_positive("radius", -1.0).is_err());
        assert!(check_positive("radius", f64::NAN).is_err());
        assert!(check_positive("radius", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = GeomError::NonConvergence {
            max_iterations: 10,
            residual: 0.5,
        };
        assert_eq!(
            err.to_string(),
            "Did not converge after 10 iterations (residual: 0.5)"
        );
        let err = GeomError::IndexOutOfRange { index: 4, len: 4 };
        assert_eq!(err.to_string(), "Index 4 out of range (length 4)");
    }
}
