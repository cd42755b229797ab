use crate::clock::{Clock, SystemClock};
use crate::config::SupervisorConfig;
use crate::control::{ControlChannel, Request, Verdict};
use crate::error::{Error, IoError, IoOperation, Result};
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::time::{Duration, Instant};
use tracing::instrument;

/// The reply deadline supervisor.
///
/// Tracks the wall-clock age of the outstanding probe for a single prober
/// session and answers continue queries against a fixed deadline.  The
/// deadline is evaluated lazily, only when the prober asks, never by an
/// alarm of its own.
#[derive(Debug, Clone, Copy)]
pub struct Supervisor {
    config: SupervisorConfig,
}

impl Supervisor {
    #[must_use]
    pub const fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    /// Bind the control listener.
    ///
    /// Binding is separate from serving so that callers can report
    /// readiness before the prober attempts to connect.
    #[instrument(skip(self), level = "debug")]
    pub fn bind(self) -> Result<BoundSupervisor> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.port.0));
        let listener = TcpListener::bind(addr).map_err(|err| IoError::Bind(err, addr))?;
        tracing::info!(%addr, deadline = ?self.config.deadline, "listening");
        Ok(BoundSupervisor {
            listener,
            deadline: self.config.deadline,
        })
    }
}

/// A supervisor with a bound control listener, ready to serve.
pub struct BoundSupervisor {
    listener: TcpListener,
    deadline: Duration,
}

impl BoundSupervisor {
    /// The address the control listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self
            .listener
            .local_addr()
            .map_err(|err| IoError::Other(err, IoOperation::LocalAddr))?)
    }

    /// Accept a single prober connection and serve it to completion.
    ///
    /// Returns `Ok(())` if the prober disconnected cleanly between rounds
    /// and `Error::DeadlineExpired` if a `NO` verdict was issued.
    #[instrument(skip(self), level = "debug")]
    pub fn serve(self) -> Result<()> {
        let (stream, peer) = self
            .listener
            .accept()
            .map_err(|err| IoError::Other(err, IoOperation::Accept))?;
        tracing::debug!(%peer, "prober connected");
        let mut channel = ControlChannel::new(stream);
        let mut session = Session::new(self.deadline, SystemClock);
        serve_session(&mut channel, &mut session)
    }
}

/// Serve one prober session over an established control channel.
///
/// The outer loop handles one probe round per iteration: a session open
/// frame arms the clock, then in-session frames are handled until the round
/// ends with a reply or the deadline expires.
pub fn serve_session<T: Read + Write, C: Clock>(
    channel: &mut ControlChannel<T>,
    session: &mut Session<C>,
) -> Result<()> {
    loop {
        if !channel.recv_start()? {
            tracing::debug!("prober disconnected");
            return Ok(());
        }
        session.on_start();
        loop {
            match channel.recv_request()? {
                None => {
                    return Err(Error::ControlProtocol(
                        "prober disconnected mid-round".to_string(),
                    ));
                }
                Some(Request::GotReply) => {
                    session.on_got_reply();
                    break;
                }
                Some(Request::ContinueQuery) => {
                    let verdict = session.on_continue_query();
                    channel.send_verdict(verdict)?;
                    if verdict == Verdict::No {
                        return Err(Error::DeadlineExpired);
                    }
                }
            }
        }
    }
}

/// The phase of the supervised session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No probe is outstanding.
    Idle,
    /// A probe is outstanding, the clock was armed at the given instant.
    Timing(Instant),
    /// The deadline expired, terminal.
    Expired,
}

/// The timeout state for a single prober session.
pub struct Session<C: Clock> {
    deadline: Duration,
    clock: C,
    phase: Phase,
}

impl<C: Clock> Session<C> {
    pub const fn new(deadline: Duration, clock: C) -> Self {
        Self {
            deadline,
            clock,
            phase: Phase::Idle,
        }
    }

    /// Arm the clock for a new probe round.
    pub fn on_start(&mut self) {
        self.phase = Phase::Timing(self.clock.now());
    }

    /// A reply arrived, disarm the clock.
    pub fn on_got_reply(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Evaluate the deadline against the armed clock.
    ///
    /// Expiry is checked only here, when the prober asks.  A query with no
    /// probe outstanding has no deadline to enforce and is answered `YES`.
    pub fn on_continue_query(&mut self) -> Verdict {
        match self.phase {
            Phase::Idle => Verdict::Yes,
            Phase::Timing(armed_at) => {
                let elapsed = self.clock.now().saturating_duration_since(armed_at);
                if elapsed >= self.deadline {
                    tracing::debug!(?elapsed, deadline = ?self.deadline, "deadline expired");
                    self.phase = Phase::Expired;
                    Verdict::No
                } else {
                    Verdict::Yes
                }
            }
            Phase::Expired => Verdict::No,
        }
    }
}
