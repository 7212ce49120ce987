//! Error types.
//!
//! - `FitError`: library-level taxonomy (what went wrong in the engine)
//! - `AppError`: binary-level error carrying a process exit code

use thiserror::Error;

/// Errors raised by the fitting engine and its file layer.
///
/// Statistical degeneracy (too few observations) is not an error: it is
/// reported through `UncertaintyStatus::InsufficientData`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Caller bug: misaligned arrays, invalid weights, bad slice settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Best fit or misfit requested over an empty candidate set.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// No candidate fell below the acceptance threshold. The best fit is always
    /// below its own threshold, so this signals a modeling bug.
    #[error("acceptance region is empty (min misfit {min_misfit}, threshold {threshold})")]
    EmptyAcceptedSet { min_misfit: f64, threshold: f64 },

    /// Fewer than two distinct slice points; nothing meaningful to render.
    #[error("not enough slice points to render: found {found}, need at least 2")]
    NotEnoughPoints { found: usize },

    /// File could not be opened, created or written.
    #[error("{0}")]
    Io(String),

    /// File content could not be parsed.
    #[error("{0}")]
    Parse(String),
}

impl FitError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Process exit code used by the `mmifit` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::Configuration(_) | FitError::Io(_) | FitError::Parse(_) => 2,
            FitError::EmptyInput(_) | FitError::NotEnoughPoints { .. } => 3,
            FitError::EmptyAcceptedSet { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
