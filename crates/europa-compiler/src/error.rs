use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{form}: formals must be a symbol, a proper list of symbols, or an improper list of symbols, got something else")]
    InvalidFormals { form: &'static str },

    #[error("{form}: expected a proper list, found an improper (dotted) list")]
    ImproperList { form: &'static str },

    #[error("{form}: expected {expected} argument(s), got {got}")]
    Arity {
        form: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("{form}: {detail}")]
    Malformed { form: &'static str, detail: String },

    #[error("cannot apply an empty combination '()'")]
    EmptyApplication,
}

pub type CompileResult<T> = std::result::Result<T, CompileError>;
