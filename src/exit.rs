/// Process exit codes and the failure type every subcommand body returns.
use std::fmt;

use serde::{Deserialize, Serialize};

/// A process exit code.
///
/// Mapping:
///   0 — success
///   1 — findings reported (only ever carried by a classified error)
///   2 — fatal: an unanticipated failure
///   3+ — other classified conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitCode(u8);

impl ExitCode {
    pub const OK: Self = Self(0);
    pub const FINDINGS: Self = Self(1);
    pub const FATAL: Self = Self(2);
    pub const INVALID_CONFIG: Self = Self(3);
    pub const INVALID_PATTERN: Self = Self(4);
    pub const MISSING_TARGET: Self = Self(7);

    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        i32::from(code.0)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An anticipated failure that declares the exit code it should produce.
///
/// Implementors are the error types of individual subcommands. The wrapper
/// forwards [`Classified::exit_code`] untouched and never prints a backtrace
/// for these.
pub trait Classified: std::error::Error + Send + Sync + 'static {
    /// Exit code this failure terminates the process with.
    fn exit_code(&self) -> ExitCode;

    /// Machine-readable error code (`snake_case`) for structured output.
    fn slug(&self) -> &'static str;
}

/// How a subcommand body failed.
#[derive(Debug)]
pub enum Failure {
    /// Expected, user-facing failure with its own exit code.
    Classified(Box<dyn Classified>),
    /// Anything else. Always fatal.
    Unclassified(anyhow::Error),
}

impl Failure {
    /// Wrap a classified error.
    #[must_use]
    pub fn classified(err: impl Classified) -> Self {
        Self::Classified(Box::new(err))
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::Unclassified(err)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified(err) => write!(f, "{err}"),
            Self::Unclassified(err) => write!(f, "{err}"),
        }
    }
}
