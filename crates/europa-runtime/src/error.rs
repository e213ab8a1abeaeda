use europa_compiler::CompileError;
use europa_reader::ReadError;
use europa_value::{ErrorKind, ErrorObj};
use europa_vm::VmError;
use thiserror::Error;

/// Everything that can stop a [`crate::Runtime`] from finishing a load,
/// folding the three compilation-pipeline stages and the VM's own error
/// channel into one type so `do_string`/`do_file` have a single `Result`
/// to return.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Vm(#[from] VmError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

impl RuntimeError {
    /// Projects any failure onto the same Scheme-visible error taxonomy a
    /// native procedure raises, so `recover()` always hands the embedder an
    /// [`ErrorObj`] regardless of which pipeline stage actually failed.
    pub fn to_error_obj(&self) -> ErrorObj {
        match self {
            RuntimeError::Vm(VmError::Raised(err)) => err.clone(),
            RuntimeError::Read(e) => ErrorObj::new(ErrorKind::Read, e.to_string()),
            RuntimeError::Compile(e) => ErrorObj::new(ErrorKind::Invalid, e.to_string()),
            RuntimeError::Vm(e) => ErrorObj::new(ErrorKind::Invalid, e.to_string()),
            RuntimeError::Io(e) => ErrorObj::new(ErrorKind::BadResource, e.to_string()),
            RuntimeError::Config(msg) => ErrorObj::new(ErrorKind::Invalid, msg.clone()),
        }
    }
}
