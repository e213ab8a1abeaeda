use thiserror::Error;

/// Errors shared by the small utilities in this crate. Component crates
/// (reader, compiler, vm, ...) define their own, more specific error enums;
/// this one only covers interning and index-vector misuse.
#[derive(Debug, Error)]
pub enum UtilError {
    #[error("index {index} out of bounds (length {length})")]
    IndexOutOfBounds { index: usize, length: usize },
}

pub type UtilResult<T> = std::result::Result<T, UtilError>;
