use std::fmt;

/// Extension point for port backends. `europa-port` implements this for a
/// file backend and an in-memory buffer backend; a host embedding Europa
/// can implement it for anything else (a socket, a log sink, ...) the way
/// the reference implementation lets a host install a custom
/// `eu_port_vtable`.
pub trait PortBackend {
    fn read_byte(&mut self) -> std::io::Result<Option<u8>>;
    fn peek_byte(&mut self) -> std::io::Result<Option<u8>>;
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()>;
    fn flush(&mut self) -> std::io::Result<()>;
    fn close(&mut self) -> std::io::Result<()>;
    fn is_input(&self) -> bool;
    fn is_output(&self) -> bool;
    fn is_closed(&self) -> bool;
}

impl fmt::Debug for dyn PortBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<port backend>")
    }
}
