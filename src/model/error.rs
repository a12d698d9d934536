use holon_core::CoreError;
use holon_io::IoError;
use thiserror::Error;

/// Error surfaced by the facade and the cycle runner.
#[derive(Error, Debug)]
pub enum RealityError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RealityError>;

impl RealityError {
    /// True for caller mistakes: bad indices, bad parameters, bad config.
    pub fn is_validation(&self) -> bool {
        match self {
            RealityError::Core(e) => e.is_validation(),
            RealityError::Io(IoError::Validation(_)) => true,
            RealityError::Io(_) => false,
            RealityError::Config(_) => true,
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        let err: RealityError = CoreError::validation("bad pop").into();
        assert!(err.is_validation());
        let err: RealityError = CoreError::not_found("x").into();
        assert!(!err.is_validation());
        let err: RealityError = IoError::not_found("events.jsonl").into();
        assert!(!err.is_validation());
        assert!(RealityError::config("max_cycles").is_validation());
    }

    #[test]
    fn test_transparent_display() {
        let err: RealityError = CoreError::validation("population index 9 out of range").into();
        assert!(err.to_string().contains("out of range"));
    }
}
