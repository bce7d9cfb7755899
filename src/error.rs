use crate::types::FloatType;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("unsupported element representation {0:?}")]
    UnsupportedElement(FloatType),
    #[error("invalid strided view: {0}")]
    InvalidView(String),
    #[error("{what} buffer too small: need {needed} elements, have {available}")]
    BufferTooSmall {
        what: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("auxiliary f32 buffer required for compact element path")]
    MissingAuxiliary,
    #[error("length mismatch: {0}")]
    LengthMismatch(String),
    #[error("capability {capability} not available on tier {tier}")]
    MissingCapability {
        capability: &'static str,
        tier: &'static str,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("raw buffer cast failed: {0}")]
    RawCast(String),
}

pub type KernelResult<T> = Result<T, KernelError>;

impl From<bytemuck::PodCastError> for KernelError {
    fn from(err: bytemuck::PodCastError) -> Self {
        KernelError::RawCast(format!("{err:?}"))
    }
}

impl From<serde_json::Error> for KernelError {
    fn from(err: serde_json::Error) -> Self {
        KernelError::InvalidConfig(err.to_string())
    }
}

impl From<std::io::Error> for KernelError {
    fn from(err: std::io::Error) -> Self {
        KernelError::InvalidConfig(format!("io: {err}"))
    }
}
