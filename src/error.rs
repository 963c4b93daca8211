//! Error taxonomy shared by every estimator and updater.

/// Failure of a model computation.
///
/// A domain error means the caller passed something outside the model.
/// Numeric and convergence errors mean one strategy could not produce a
/// usable answer for valid inputs; another strategy may still succeed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("invalid {name}: {value}")]
    Domain { name: &'static str, value: f64 },

    #[error("{operation}: numeric overflow/underflow ({detail})")]
    Numeric {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation}: no convergence after {iterations} iterations")]
    Convergence {
        operation: &'static str,
        iterations: usize,
    },
}

impl ModelError {
    pub fn domain(name: &'static str, value: f64) -> Self {
        Self::Domain { name, value }
    }

    pub fn numeric(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Numeric {
            operation,
            detail: detail.into(),
        }
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric { .. })
    }

    pub fn is_convergence(&self) -> bool {
        matches!(self, Self::Convergence { .. })
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
