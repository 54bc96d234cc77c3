//! The byte-stream abstraction a [`crate::connection::Connection`] reads and writes through.
//!
//! A real serial port adapter is an external collaborator, not implemented here; the
//! [`cfg(test)`](self) [`ChannelTransport`] is provided for exercising the framer and connection
//! without hardware.

use std::io;

/// A bidirectional byte stream. Any I/O failure is fatal to the owning connection.
pub trait Transport: Send {
    /// Reads up to `buf.len()` bytes, returning the number read (`0` means EOF).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Reads exactly one byte, blocking until it is available.
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        let n = self.read(&mut byte)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "transport closed"));
        }
        Ok(byte[0])
    }

    /// Writes the entirety of `buf`.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flushes any buffered output.
    fn flush(&mut self) -> io::Result<()>;

    /// Closes the transport. Subsequent reads must return an error or `Ok(0)`.
    fn close(&mut self) -> io::Result<()>;
}

#[cfg(test)]
pub use test_support::ChannelTransport;

#[cfg(test)]
mod test_support {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::mpsc::{Receiver, Sender};
    use std::sync::{Arc, Mutex};

    use super::Transport;

    /// An in-memory, channel-backed [`Transport`] for tests.
    ///
    /// Bytes written with [`ChannelTransport::feed`] (or pushed by a peer `Sender`) are consumed
    /// by [`Transport::read`]; bytes written via [`Transport::write_all`] are collected and
    /// inspectable through [`ChannelTransport::written`].
    pub struct ChannelTransport {
        inbox: Receiver<Vec<u8>>,
        buffer: VecDeque<u8>,
        written: Arc<Mutex<Vec<u8>>>,
        closed: bool,
    }

    impl ChannelTransport {
        /// Creates a transport paired with a `Sender` a test can use to inject bytes, and a
        /// shared buffer it can inspect for writes.
        pub fn new() -> (Self, Sender<Vec<u8>>, Arc<Mutex<Vec<u8>>>) {
            let (tx, rx) = std::sync::mpsc::channel();
            let written = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    inbox: rx,
                    buffer: VecDeque::new(),
                    written: written.clone(),
                    closed: false,
                },
                tx,
                written,
            )
        }

        /// Convenience constructor that immediately enqueues `bytes` for reading.
        pub fn with_bytes(bytes: Vec<u8>) -> (Self, Arc<Mutex<Vec<u8>>>) {
            let (transport, tx, written) = Self::new();
            tx.send(bytes).expect("receiver not yet dropped");
            (transport, written)
        }
    }

    impl Transport for ChannelTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.buffer.is_empty() {
                if self.closed {
                    return Ok(0);
                }
                match self.inbox.recv() {
                    Ok(bytes) => self.buffer.extend(bytes),
                    Err(_) => return Ok(0),
                }
            }
            let n = buf.len().min(self.buffer.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.buffer.pop_front().unwrap();
            }
            Ok(n)
        }

        fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn reads_fed_bytes_then_reports_eof() {
        let (mut transport, _written) = ChannelTransport::with_bytes(vec![1, 2, 3]);
        let mut buf = [0u8; 2];
        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        transport.close().unwrap();
        let mut trailing = [0u8; 4];
        assert_eq!(transport.read(&mut trailing).unwrap(), 1);
        assert_eq!(transport.read(&mut trailing).unwrap(), 0);
    }

    #[test]
    fn collects_writes() {
        let (mut transport, _tx, written) = ChannelTransport::new();
        transport.write_all(&[9, 9]).unwrap();
        assert_eq!(*written.lock().unwrap(), vec![9, 9]);
    }
}
