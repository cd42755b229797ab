use crate::error::{Error, IoError, IoOperation, Result};
use crate::types::Port;
use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;
use tracing::instrument;

/// The round open token, sent before each probe is transmitted.
pub const START: &[u8; 6] = b"start\0";

/// The reply notification token.
pub const GOT_REPLY: &[u8; 10] = b"got reply\0";

/// The continue query token.
pub const CONTINUE_QUERY: &[u8; 10] = b"continue?\0";

/// The affirmative verdict token.
pub const YES: &[u8; 4] = b"yes\0";

/// The negative verdict token.
pub const NO: &[u8; 4] = b"no!\0";

/// The number of connect attempts before giving up.
const CONNECT_ATTEMPTS: usize = 10;

/// The pause between connect attempts.
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

/// An in-session request from the prober to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// A reply to the outstanding probe has arrived.
    GotReply,
    /// May the probe loop start another round?
    ContinueQuery,
}

/// A supervisor verdict on a continue query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Carry on probing.
    Yes,
    /// The reply deadline has expired, stop probing.
    No,
}

impl Verdict {
    const fn token(self) -> &'static [u8; 4] {
        match self {
            Self::Yes => YES,
            Self::No => NO,
        }
    }
}

/// A fixed-width token channel over a byte stream.
///
/// Every token travels as an exact-width frame, trailing `NUL` included, and
/// each width is fixed by the protocol.  A frame that does not decode to a
/// token of the expected width is a protocol violation and fails the session.
pub struct ControlChannel<T> {
    inner: T,
}

impl ControlChannel<TcpStream> {
    /// Connect to a supervisor listening on localhost.
    ///
    /// The supervisor may not have begun listening yet and so the connection
    /// is retried a bounded number of times before giving up.
    #[instrument(level = "debug")]
    pub fn connect(port: Port) -> Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port.0));
        let mut attempt = 1;
        loop {
            match TcpStream::connect(addr) {
                Ok(stream) => return Ok(Self::new(stream)),
                Err(err) if attempt < CONNECT_ATTEMPTS => {
                    tracing::debug!(%addr, attempt, %err, "connect failed, retrying");
                    attempt += 1;
                    std::thread::sleep(CONNECT_BACKOFF);
                }
                Err(err) => return Err(Error::IoError(IoError::Connect(err, addr))),
            }
        }
    }
}

impl<T: Read + Write> ControlChannel<T> {
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    #[cfg(test)]
    pub(crate) const fn inner(&self) -> &T {
        &self.inner
    }

    /// Open the session.
    pub fn send_start(&mut self) -> Result<()> {
        self.write_frame(START)
    }

    /// Notify the supervisor that a reply arrived.
    pub fn send_got_reply(&mut self) -> Result<()> {
        self.write_frame(GOT_REPLY)
    }

    /// Ask the supervisor whether to continue and await its verdict.
    pub fn ask_continue(&mut self) -> Result<Verdict> {
        self.write_frame(CONTINUE_QUERY)?;
        self.recv_verdict()
    }

    /// Read the session open token.
    ///
    /// Returns `false` if the peer disconnected cleanly between sessions.
    /// Anything other than an exact `start\0` frame is a protocol violation.
    pub fn recv_start(&mut self) -> Result<bool> {
        let mut frame = [0_u8; START.len()];
        match self.inner.read(&mut frame) {
            Ok(0) => return Ok(false),
            Ok(n) if n < frame.len() => {
                self.read_remainder(&mut frame[n..])?;
            }
            Ok(_) => {}
            Err(err) => return Err(read_failed(err)),
        }
        if &frame == START {
            Ok(true)
        } else {
            Err(protocol_violation(&frame))
        }
    }

    /// Read the next in-session request, or `None` if the peer disconnected.
    ///
    /// `GOT_REPLY` and `CONTINUE_QUERY` share a width and so a single
    /// exact-width read disambiguates them.
    pub fn recv_request(&mut self) -> Result<Option<Request>> {
        let mut frame = [0_u8; GOT_REPLY.len()];
        match self.inner.read(&mut frame) {
            Ok(0) => return Ok(None),
            Ok(n) if n < frame.len() => {
                self.read_remainder(&mut frame[n..])?;
            }
            Ok(_) => {}
            Err(err) => return Err(read_failed(err)),
        }
        if &frame == GOT_REPLY {
            Ok(Some(Request::GotReply))
        } else if &frame == CONTINUE_QUERY {
            Ok(Some(Request::ContinueQuery))
        } else {
            Err(protocol_violation(&frame))
        }
    }

    /// Send a verdict in answer to a continue query.
    pub fn send_verdict(&mut self, verdict: Verdict) -> Result<()> {
        self.write_frame(verdict.token())
    }

    fn recv_verdict(&mut self) -> Result<Verdict> {
        let mut frame = [0_u8; YES.len()];
        self.read_frame(&mut frame)?;
        if &frame == YES {
            Ok(Verdict::Yes)
        } else if &frame == NO {
            Ok(Verdict::No)
        } else {
            Err(protocol_violation(&frame))
        }
    }

    fn write_frame(&mut self, token: &[u8]) -> Result<()> {
        self.inner
            .write_all(token)
            .and_then(|()| self.inner.flush())
            .map_err(|err| Error::IoError(IoError::Other(err, IoOperation::Write)))
    }

    fn read_frame(&mut self, frame: &mut [u8]) -> Result<()> {
        self.inner.read_exact(frame).map_err(read_failed)
    }

    /// Complete a frame after a short read.  `EOF` mid-frame is a violation.
    fn read_remainder(&mut self, rest: &mut [u8]) -> Result<()> {
        self.inner.read_exact(rest).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                Error::ControlProtocol("connection closed mid-frame".to_string())
            } else {
                read_failed(err)
            }
        })
    }
}

fn read_failed(err: std::io::Error) -> Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        Error::ControlProtocol("connection closed before frame".to_string())
    } else {
        Error::IoError(IoError::Other(err, IoOperation::Read))
    }
}

fn protocol_violation(frame: &[u8]) -> Error {
    Error::ControlProtocol(format!("unexpected frame: {frame:02x?}"))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::io::Cursor;

    /// An in-memory `Read + Write` transport for driving one side of the
    /// protocol from a script of inbound bytes.
    pub struct Script {
        inbound: Cursor<Vec<u8>>,
        pub outbound: Vec<u8>,
    }

    impl Script {
        pub fn new(inbound: &[u8]) -> Self {
            Self {
                inbound: Cursor::new(inbound.to_vec()),
                outbound: Vec::new(),
            }
        }
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inbound.read(buf)
        }
    }

    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outbound.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_token_widths() {
        assert_eq!(6, START.len());
        assert_eq!(10, GOT_REPLY.len());
        assert_eq!(10, CONTINUE_QUERY.len());
        assert_eq!(4, YES.len());
        assert_eq!(4, NO.len());
    }

    #[test]
    fn test_session_open() -> anyhow::Result<()> {
        let mut channel = ControlChannel::new(Script::new(b"start\0"));
        assert!(channel.recv_start()?);
        assert!(!channel.recv_start()?);
        Ok(())
    }

    #[test]
    fn test_session_open_rejects_other_token() {
        let mut channel = ControlChannel::new(Script::new(b"sta rt"));
        let err = channel.recv_start().unwrap_err();
        assert!(matches!(err, Error::ControlProtocol(_)));
    }

    #[test]
    fn test_recv_request() -> anyhow::Result<()> {
        let mut channel = ControlChannel::new(Script::new(b"got reply\0continue?\0"));
        assert_eq!(Some(Request::GotReply), channel.recv_request()?);
        assert_eq!(Some(Request::ContinueQuery), channel.recv_request()?);
        assert_eq!(None, channel.recv_request()?);
        Ok(())
    }

    #[test]
    fn test_recv_request_rejects_unknown_token() {
        let mut channel = ControlChannel::new(Script::new(b"what else\0"));
        let err = channel.recv_request().unwrap_err();
        assert!(matches!(err, Error::ControlProtocol(_)));
    }

    #[test]
    fn test_recv_request_rejects_partial_frame() {
        let mut channel = ControlChannel::new(Script::new(b"got re"));
        let err = channel.recv_request().unwrap_err();
        assert!(matches!(err, Error::ControlProtocol(_)));
    }

    #[test]
    fn test_prober_side_requests() -> anyhow::Result<()> {
        let mut channel = ControlChannel::new(Script::new(b"yes\0"));
        channel.send_start()?;
        channel.send_got_reply()?;
        assert_eq!(Verdict::Yes, channel.ask_continue()?);
        assert_eq!(
            b"start\0got reply\0continue?\0".as_slice(),
            channel.inner.outbound.as_slice()
        );
        Ok(())
    }

    #[test]
    fn test_verdict_no() -> anyhow::Result<()> {
        let mut channel = ControlChannel::new(Script::new(b"no!\0"));
        assert_eq!(Verdict::No, channel.ask_continue()?);
        Ok(())
    }

    #[test]
    fn test_verdict_truncated() {
        let mut channel = ControlChannel::new(Script::new(b"ye"));
        let err = channel.ask_continue().unwrap_err();
        assert!(matches!(err, Error::ControlProtocol(_)));
    }

    #[test]
    fn test_send_verdict() -> anyhow::Result<()> {
        let mut channel = ControlChannel::new(Script::new(b""));
        channel.send_verdict(Verdict::Yes)?;
        channel.send_verdict(Verdict::No)?;
        assert_eq!(b"yes\0no!\0".as_slice(), channel.inner.outbound.as_slice());
        Ok(())
    }
}
