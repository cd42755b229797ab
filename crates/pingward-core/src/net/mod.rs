mod channel;
mod platform;
mod socket;

pub use channel::Channel;
pub use platform::SocketImpl;
pub use socket::Socket;

use crate::probe::Reply;
use crate::{Result, Sequence};

/// The maximum size of any `IP` datagram we expect to receive.
const MAX_PACKET_SIZE: usize = 1024;

/// An abstraction over a network for sending probes and receiving replies.
#[cfg_attr(test, mockall::automock)]
pub trait Network {
    /// Send an `ICMP` echo request probe.
    fn send_probe(&mut self, sequence: Sequence) -> Result<()>;
    /// Receive the next matching `ICMP` echo reply, if any arrived.
    fn recv_reply(&mut self) -> Result<Option<Reply>>;
}
