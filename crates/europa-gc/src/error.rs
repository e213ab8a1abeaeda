use thiserror::Error;

#[derive(Debug, Error)]
pub enum GcError {
    #[error("allocation failed: heap exhausted after {attempted} bytes")]
    AllocationFailed { attempted: usize },

    #[error("swept a grey object during collection, which means a root was not fully marked")]
    SweptGreyObject,

    #[error("invalid gc configuration: {0}")]
    InvalidConfig(String),
}

pub type GcResult<T> = std::result::Result<T, GcError>;
