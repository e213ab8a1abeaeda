//! Concrete [`PortBackend`] implementations: a file backend and an
//! in-memory buffer backend, mirroring `fport.c`/`mport.c`'s two built-in
//! port kinds. A host embedding Europa can implement `PortBackend` itself
//! for anything else, the same extension point the reference
//! implementation exposes through a custom `eu_port_vtable`.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use europa_value::PortBackend;

/// A port backed by an OS file. Closing is idempotent: once closed, every
/// further operation reports the port as closed rather than erroring on a
/// double-close, matching the apparent absence of a double-close guard in
/// `fport.c`.
pub struct FilePort {
    file: Option<File>,
    peeked: Option<u8>,
    input: bool,
    output: bool,
}

impl FilePort {
    pub fn open(path: impl AsRef<Path>, input: bool, output: bool) -> io::Result<Self> {
        let file = File::options().read(input).write(output).create(output).open(path)?;
        Ok(FilePort {
            file: Some(file),
            peeked: None,
            input,
            output,
        })
    }
}

impl PortBackend for FilePort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let Some(file) = self.file.as_mut() else { return Ok(None) };
        let mut buf = [0u8; 1];
        match file.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.peeked {
            return Ok(Some(b));
        }
        let next = self.read_byte()?;
        self.peeked = next;
        Ok(next)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.take();
        Ok(())
    }

    fn is_input(&self) -> bool {
        self.input
    }

    fn is_output(&self) -> bool {
        self.output
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

/// A port backed by an in-memory byte buffer - `do_string`'s reader input
/// and the `open-output-string`/`get-output-string` pair both go through
/// this, mirroring `eumport_from_str`'s fixed-source-buffer input mode and
/// a growable-buffer output mode.
pub struct MemoryPort {
    buffer: Vec<u8>,
    pos: usize,
    input: bool,
    output: bool,
    closed: bool,
}

impl MemoryPort {
    /// An input port reading from an existing byte buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        MemoryPort {
            buffer: bytes.into(),
            pos: 0,
            input: true,
            output: false,
            closed: false,
        }
    }

    /// A fresh, empty output port that accumulates whatever is written to
    /// it - `get-output-string`'s backing store.
    pub fn new_output() -> Self {
        MemoryPort {
            buffer: Vec::new(),
            pos: 0,
            input: false,
            output: true,
            closed: false,
        }
    }

    /// Snapshot of everything written so far, for `get-output-string`.
    pub fn written(&self) -> &[u8] {
        &self.buffer
    }
}

impl PortBackend for MemoryPort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.closed || self.pos >= self.buffer.len() {
            return Ok(None);
        }
        let b = self.buffer[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if self.closed || self.pos >= self.buffer.len() {
            return Ok(None);
        }
        Ok(Some(self.buffer[self.pos]))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.closed {
            self.buffer.extend_from_slice(bytes);
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_input(&self) -> bool {
        self.input
    }

    fn is_output(&self) -> bool {
        self.output
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// The process's standard input, opened once at startup the way
/// `set_standard_ports` binds `current-input-port` in the reference
/// embedding API. Reads are unbuffered past a one-byte peek, matching
/// `FilePort`'s buffering contract.
pub struct StdinPort {
    peeked: Option<u8>,
    closed: bool,
}

impl Default for StdinPort {
    fn default() -> Self {
        StdinPort { peeked: None, closed: false }
    }
}

impl PortBackend for StdinPort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.closed {
            return Ok(None);
        }
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        match io::stdin().read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = self.read_byte()?;
        }
        Ok(self.peeked)
    }

    fn write_bytes(&mut self, _bytes: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_input(&self) -> bool {
        true
    }

    fn is_output(&self) -> bool {
        false
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// The process's standard output, bound by `set_standard_ports` the same
/// way as [`StdinPort`].
#[derive(Default)]
pub struct StdoutPort {
    closed: bool,
}

impl PortBackend for StdoutPort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        io::stdout().write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_input(&self) -> bool {
        false
    }

    fn is_output(&self) -> bool {
        true
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Standard error, bound by `set_standard_ports` alongside stdin/stdout.
#[derive(Default)]
pub struct StderrPort {
    closed: bool,
}

impl PortBackend for StderrPort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        io::stderr().write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_input(&self) -> bool {
        false
    }

    fn is_output(&self) -> bool {
        true
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_port_reads_back_what_it_was_built_from() {
        let mut port = MemoryPort::from_bytes(*b"hi");
        assert_eq!(port.peek_byte().unwrap(), Some(b'h'));
        assert_eq!(port.read_byte().unwrap(), Some(b'h'));
        assert_eq!(port.read_byte().unwrap(), Some(b'i'));
        assert_eq!(port.read_byte().unwrap(), None);
    }

    #[test]
    fn memory_output_port_accumulates_writes() {
        let mut port = MemoryPort::new_output();
        port.write_bytes(b"abc").unwrap();
        port.write_bytes(b"def").unwrap();
        assert_eq!(port.written(), b"abcdef");
    }

    #[test]
    fn closing_a_memory_port_is_idempotent() {
        let mut port = MemoryPort::from_bytes(*b"x");
        port.close().unwrap();
        assert!(port.is_closed());
        port.close().unwrap();
        assert!(port.is_closed());
        assert_eq!(port.read_byte().unwrap(), None);
    }

    #[test]
    fn file_port_round_trips_through_a_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");

        {
            let mut port = FilePort::open(&path, false, true).unwrap();
            port.write_bytes(b"hello").unwrap();
            port.flush().unwrap();
        }

        let mut port = FilePort::open(&path, true, false).unwrap();
        let mut collected = Vec::new();
        while let Some(b) = port.read_byte().unwrap() {
            collected.push(b);
        }
        assert_eq!(collected, b"hello");
    }

    #[test]
    fn file_port_peek_does_not_consume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, b"ab").unwrap();

        let mut port = FilePort::open(&path, true, false).unwrap();
        assert_eq!(port.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(port.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(port.read_byte().unwrap(), Some(b'a'));
        assert_eq!(port.read_byte().unwrap(), Some(b'b'));
    }
}
