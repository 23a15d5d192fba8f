//! Domain error types.

/// Top-level error type for movecast.
#[derive(Debug, thiserror::Error)]
pub enum MovecastError {
    #[error("format error: {reason}")]
    Format { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("training error: {reason}")]
    Training { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MovecastError {
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        Self::Data {
            reason: reason.into(),
        }
    }

    pub fn training(reason: impl Into<String>) -> Self {
        Self::Training {
            reason: reason.into(),
        }
    }

    /// Process exit status for this error kind.
    pub fn exit_status(&self) -> u8 {
        match self {
            MovecastError::Io(_) => 1,
            MovecastError::ConfigParse { .. }
            | MovecastError::ConfigMissing { .. }
            | MovecastError::ConfigInvalid { .. } => 2,
            MovecastError::Format { .. } => 3,
            MovecastError::Data { .. } => 4,
            MovecastError::Training { .. } => 5,
        }
    }
}

impl From<&MovecastError> for std::process::ExitCode {
    fn from(err: &MovecastError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
