//! Error types for harness operations

use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that abort a validation run.
///
/// None of these are recovered from. A trial exceeding the error threshold is
/// not an error; it is counted by the runner instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A golden reference line is malformed
    #[error("Malformed golden reference at line {line}: {reason}")]
    ReferenceFormat {
        /// 1-based line number in the reference file
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The golden reference file ends before all trials are covered
    #[error("Golden reference truncated: expected {expected} lines, found {found}")]
    ReferenceMissing {
        /// Lines required (initial conditions plus one per trial)
        expected: usize,
        /// Lines actually present
        found: usize,
    },

    /// The device sent a line that does not match `<label>:<payload>`
    #[error("Malformed device response {line:?}: {reason}")]
    MalformedResponse {
        /// The offending line, as received
        line: String,
        /// What was wrong with it
        reason: String,
    },

    /// No non-empty line arrived before the response deadline
    #[error("No response from device after {waited_ms}ms")]
    ResponseTimeout {
        /// Time spent waiting in milliseconds
        waited_ms: u64,
    },

    /// I/O error on the serial channel or a file
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Serial port could not be opened or enumerated
    #[error("Serial port error: {source}")]
    Serial {
        /// Underlying serial port error
        #[from]
        source: serialport::Error,
    },
}

impl HarnessError {
    /// Create a reference format error
    pub fn reference_format(line: usize, reason: impl Into<String>) -> Self {
        Self::ReferenceFormat {
            line,
            reason: reason.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = HarnessError::reference_format(3, "expected at least 2 fields");
        assert_eq!(
            err.to_string(),
            "Malformed golden reference at line 3: expected at least 2 fields"
        );

        let err = HarnessError::ReferenceMissing { expected: 11, found: 4 };
        assert_eq!(
            err.to_string(),
            "Golden reference truncated: expected 11 lines, found 4"
        );

        let err = HarnessError::ResponseTimeout { waited_ms: 1500 };
        assert_eq!(err.to_string(), "No response from device after 1500ms");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged");
        let err: HarnessError = io.into();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
