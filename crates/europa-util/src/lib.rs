//! Shared utilities used across the Europa crates: symbol interning, error
//! conventions and a small typed index vector, all following the same shape
//! the rest of the workspace uses for these concerns.

pub mod error;
pub mod index_vec;
pub mod symbol;

pub use error::{UtilError, UtilResult};
pub use index_vec::{Idx, IndexVec};
pub use symbol::{Interner, Symbol};
