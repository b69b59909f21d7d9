use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};

use crate::session::{Poll, Transport};

/// Largest frame a single poll can return.
pub const READ_BUFFER_SIZE: usize = 4096;

/// One accepted client. Each successful read is one command frame.
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
    buf: Box<[u8]>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            buf: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    fn read_nonblocking(&mut self) -> io::Result<usize> {
        self.stream.set_nonblocking(true)?;
        let read = self.stream.read(&mut self.buf);
        // Replies are written in blocking mode.
        self.stream.set_nonblocking(false)?;
        read
    }
}

impl Transport for TcpTransport {
    fn poll(&mut self) -> Poll {
        match self.read_nonblocking() {
            Ok(0) => {
                tracing::info!(peer = %self.peer, "client disconnected");
                Poll::Closed
            }
            Ok(n) => Poll::Frame(self.buf[..n].to_vec()),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Poll::Idle
            }
            Err(e) => {
                tracing::warn!(peer = %self.peer, error = %e, "read failed; closing session");
                Poll::Closed
            }
        }
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }
}
