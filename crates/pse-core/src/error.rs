use thiserror::Error;

#[derive(Debug, Error)]
pub enum PseError {
    /// A construction-time invariant was violated (empty domain, non-positive radius, ...).
    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Not converged: {0}")]
    NotConverged(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PseError>;

/// Fail with [`PseError::Domain`] unless `value` is finite and strictly positive.
pub fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PseError::Domain(format!("{name} must be positive, got {value}")))
    }
}
