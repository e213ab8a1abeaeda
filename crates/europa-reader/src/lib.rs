//! Streaming S-expression reader: turns source text directly into `Value`
//! datums, without an intermediate token stream.

mod cursor;
mod error;
mod number;
mod reader;

pub use error::{ReadError, ReadResult};
pub use reader::Reader;
