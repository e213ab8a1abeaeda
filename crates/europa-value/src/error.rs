use crate::object::HeapObject;

/// The Scheme-visible error taxonomy. Mirrors the `flags` field of the
/// reference implementation's error object (`error.c`): a kind plus a
/// human-readable message plus an optional nested cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    None,
    Read,
    Write,
    BadArgument,
    NullArgument,
    BadResource,
    Invalid,
    BadAlloc,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::None => "none",
            ErrorKind::Read => "read",
            ErrorKind::Write => "write",
            ErrorKind::BadArgument => "bad-argument",
            ErrorKind::NullArgument => "null-argument",
            ErrorKind::BadResource => "bad-resource",
            ErrorKind::Invalid => "invalid",
            ErrorKind::BadAlloc => "bad-alloc",
        }
    }
}

/// A heap-allocated error value. `message` is an owned `String` instead of
/// the original's inline trailing buffer (`memcpy`'d past the struct) -
/// Rust has no reason to hand-roll a flexible array member for this.
#[derive(Debug, Clone)]
pub struct ErrorObj {
    pub kind: ErrorKind,
    pub message: String,
    pub nested: Option<europa_gc::Gc<HeapObject>>,
}

impl std::fmt::Display for ErrorObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for ErrorObj {}

impl ErrorObj {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ErrorObj {
            kind,
            message: message.into(),
            nested: None,
        }
    }

    pub fn with_nested(
        kind: ErrorKind,
        message: impl Into<String>,
        nested: europa_gc::Gc<HeapObject>,
    ) -> Self {
        ErrorObj {
            kind,
            message: message.into(),
            nested: Some(nested),
        }
    }
}
