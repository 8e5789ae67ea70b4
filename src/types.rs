/// Shared serializable output types for all commands.
///
/// These types are what gets written to stdout (or stderr for errors) —
/// either as JSON or rendered as a table. They are decoupled from the internal
/// `Finding` type.
use serde::{Deserialize, Serialize};

use crate::exit::{Classified, ExitCode};

/// One match produced by `scan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutput {
    /// File the match was found in, as given or discovered.
    pub path: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column (in characters) where the match starts.
    pub column: usize,
    /// The matching line, trimmed.
    pub text: String,
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (`snake_case`).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Process exit code this error produces.
    pub exit_code: ExitCode,
}

impl ErrorOutput {
    /// Construct from any classified failure.
    #[must_use]
    pub fn from_classified(err: &dyn Classified) -> Self {
        Self {
            ok: false,
            error: ErrorDetail {
                code: err.slug().to_owned(),
                message: err.to_string(),
                exit_code: err.exit_code(),
            },
        }
    }
}
