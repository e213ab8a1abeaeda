use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unexpected character '{found}' while reading {context}")]
    UnexpectedChar { found: char, context: &'static str },

    #[error("malformed number literal: {0}")]
    MalformedNumber(String),

    #[error("byte {0} out of range for a bytevector literal (0..=255)")]
    ByteOutOfRange(i64),

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unknown character escape: {0}")]
    UnknownEscape(String),
}

pub type ReadResult<T> = std::result::Result<T, ReadError>;
