//! DK-007: Error taxonomy for declarations and runs.
//!
//! Constructor failures are returned unchanged through user code and the
//! run driver, so there is no wrapping "propagated" variant: the error a run
//! fails with is exactly the error the failing constructor produced.

use thiserror::Error;

/// All failures raised by the declaration runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A malformed or out-of-range value, an empty or duplicate map key,
    /// an empty logical name, or an unresolved option reference.
    #[error("invalid argument{}: {reason}", field_label(.field))]
    InvalidArgument { field: String, reason: String },

    /// The logical name is already registered in this run.
    #[error("duplicate resource name '{0}'")]
    DuplicateName(String),

    /// A required configuration key is not set for the run.
    #[error("missing required configuration value '{0}'")]
    MissingConfig(String),

    /// An error raised by the program itself rather than by a constructor.
    #[error("{0}")]
    Program(String),

    /// A driver was asked to run a second time.
    #[error("driver has already run")]
    AlreadyRun,

    /// The project file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A snapshot or event log could not be read or written.
    #[error("state error: {0}")]
    State(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Re-home an argument error under an enclosing field name, so a bad
    /// map key reads `objectProp.prop1`. Other errors pass through.
    pub fn within(self, parent: &str) -> Self {
        match self {
            Self::InvalidArgument { field, reason } => Self::InvalidArgument {
                field: if field.is_empty() {
                    parent.to_string()
                } else {
                    format!("{}.{}", parent, field)
                },
                reason,
            },
            other => other,
        }
    }

    /// Stable kind name, used in event logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::DuplicateName(_) => "duplicate_name",
            Self::MissingConfig(_) => "missing_config",
            Self::Program(_) => "program",
            Self::AlreadyRun => "already_run",
            Self::Config(_) => "config",
            Self::State(_) => "state",
        }
    }
}

fn field_label(field: &str) -> String {
    if field.is_empty() {
        String::new()
    } else {
        format!(" '{}'", field)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
