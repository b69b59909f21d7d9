//! Raw TCP plumbing: a byte transport for one client and the listener that
//! turns accepted clients into sessions.

mod listener;
mod transport;

pub use listener::TcpSessionFactory;
pub use transport::{READ_BUFFER_SIZE, TcpTransport};
