//! # Error Types Module
//!
//! Centralized error handling for the sit-to-stand analyzer.
//! Each module gets its own error type so callers can match on exactly the
//! failures that module can produce.
//!
//! ## Error Types
//! - `AnalysisError`: The analysis pipeline could not run at all
//! - `ConfigError`: Configuration file I/O and parsing errors
//! - `InputError`: Evaluation document loading errors
//! - `WorkerError`: Background analysis pool failures
//! - `FilterError`: External filtering service failures
//!
//! ## Usage Examples
//! ```rust,ignore
//! // Analysis pipeline uses AnalysisError
//! pub fn analyze(...) -> Result<AnalysisReport, AnalysisError> { ... }
//!
//! // Config module uses ConfigError
//! pub fn load() -> Result<Config, ConfigError> { ... }
//!
//! // Input module uses InputError
//! pub fn load_from_path(path: &Path) -> Result<EvaluationInput, InputError> { ... }
//! ```
//!
//! Degenerate arithmetic (no valid cycles, zero divisors) is never an error;
//! the indicator engine has explicit fallback values for those cases.

use std::fmt;

/// Errors that stop an analysis before anything is computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The sample collection was empty
    NoData,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::NoData => {
                write!(f, "No sensor samples were provided for analysis")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Errors that can occur during configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read config file
    ReadFailed(std::io::Error),
    /// Failed to write config file
    WriteFailed(std::io::Error),
    /// Failed to parse config file
    ParseFailed(toml::de::Error),
    /// Failed to serialize config
    SerializeFailed(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed(e) => {
                write!(f, "Failed to read config file: {}", e)
            }
            ConfigError::WriteFailed(e) => {
                write!(f, "Failed to write config file: {}", e)
            }
            ConfigError::ParseFailed(e) => {
                write!(f, "Failed to parse config file: {}", e)
            }
            ConfigError::SerializeFailed(e) => {
                write!(f, "Failed to serialize config: {}", e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadFailed(e) => Some(e),
            ConfigError::WriteFailed(e) => Some(e),
            ConfigError::ParseFailed(e) => Some(e),
            ConfigError::SerializeFailed(e) => Some(e),
        }
    }
}

/// Errors that can occur while loading an evaluation document
#[derive(Debug)]
pub enum InputError {
    /// Failed to read the document from disk
    ReadFailed(std::io::Error),
    /// Document is not valid evaluation JSON
    ParseFailed(serde_json::Error),
    /// Test end precedes test start
    InvalidBounds { evaluation_id: String },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::ReadFailed(e) => {
                write!(f, "Failed to read evaluation file: {}", e)
            }
            InputError::ParseFailed(e) => {
                write!(f, "Failed to parse evaluation file: {}", e)
            }
            InputError::InvalidBounds { evaluation_id } => {
                write!(f, "Evaluation {} ends before it starts", evaluation_id)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::ReadFailed(e) => Some(e),
            InputError::ParseFailed(e) => Some(e),
            InputError::InvalidBounds { .. } => None,
        }
    }
}

/// Errors that can occur in the background analysis pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The pool shut down before the job completed
    Disconnected,
    /// A worker panicked while holding the result cache
    StatePoisoned,
    /// The analysis itself failed
    Analysis(AnalysisError),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::Disconnected => {
                write!(f, "Analysis pool is no longer running")
            }
            WorkerError::StatePoisoned => {
                write!(f, "Analysis result cache is unavailable after a worker panic")
            }
            WorkerError::Analysis(e) => {
                write!(f, "Analysis failed: {}", e)
            }
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkerError::Analysis(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AnalysisError> for WorkerError {
    fn from(e: AnalysisError) -> Self {
        WorkerError::Analysis(e)
    }
}

/// Errors reported by the external filtering service
#[derive(Debug, Clone)]
pub enum FilterError {
    /// Service could not be reached or refused the request
    Unavailable(String),
    /// Service answered with something we could not use
    InvalidResponse(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Unavailable(msg) => {
                write!(f, "Filtering service unavailable: {}", msg)
            }
            FilterError::InvalidResponse(msg) => {
                write!(f, "Filtering service returned an invalid response: {}", msg)
            }
        }
    }
}

impl std::error::Error for FilterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_display() {
        let err = AnalysisError::NoData;
        assert!(err.to_string().contains("No sensor samples"));
    }

    #[test]
    fn test_config_error_chain() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::ReadFailed(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_worker_error_wraps_analysis() {
        use std::error::Error;
        let err: WorkerError = AnalysisError::NoData.into();
        assert_eq!(err, WorkerError::Analysis(AnalysisError::NoData));
        assert!(err.source().is_some());
        assert!(WorkerError::Disconnected.source().is_none());
    }

    #[test]
    fn test_invalid_bounds_names_evaluation() {
        let err = InputError::InvalidBounds {
            evaluation_id: "eval-42".to_string(),
        };
        assert!(err.to_string().contains("eval-42"));
    }
}
