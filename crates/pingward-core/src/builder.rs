use crate::clock::SystemClock;
use crate::config::{defaults, ChannelConfig, ProbeConfig};
use crate::control::ControlChannel;
use crate::error::{Error, Result};
use crate::net::Channel;
use crate::probe::ProbeReport;
use crate::prober::ProbeLoop;
use crate::types::{MaxRounds, PingId, Port, Sequence};
use std::net::IpAddr;
use std::time::Duration;

/// Build a [`Pinger`].
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use pingward_core::Builder;
/// use std::net::{IpAddr, Ipv4Addr};
///
/// Builder::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)))
///     .ping_id(pingward_core::PingId(1234))
///     .build()?
///     .run_with(|report| println!("{report:?}"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Builder {
    target_addr: IpAddr,
    ping_id: PingId,
    initial_sequence: Sequence,
    interval: Duration,
    read_timeout: Duration,
    max_rounds: Option<MaxRounds>,
    control_port: Port,
}

impl Builder {
    /// Build a pinger for the given target address.
    #[must_use]
    pub fn new(target_addr: IpAddr) -> Self {
        Self {
            target_addr,
            ping_id: PingId::default(),
            initial_sequence: Sequence(defaults::DEFAULT_INITIAL_SEQUENCE),
            interval: defaults::DEFAULT_PROBE_INTERVAL,
            read_timeout: defaults::DEFAULT_READ_TIMEOUT,
            max_rounds: None,
            control_port: Port(defaults::DEFAULT_CONTROL_PORT),
        }
    }

    /// Set the echo identifier for this session.
    #[must_use]
    pub fn ping_id(self, ping_id: PingId) -> Self {
        Self { ping_id, ..self }
    }

    /// Set the initial echo sequence number.
    #[must_use]
    pub fn initial_sequence(self, initial_sequence: Sequence) -> Self {
        Self {
            initial_sequence,
            ..self
        }
    }

    /// Set the pause between probe rounds.
    #[must_use]
    pub fn interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// Set the bounded wait per receive attempt.
    #[must_use]
    pub fn read_timeout(self, read_timeout: Duration) -> Self {
        Self {
            read_timeout,
            ..self
        }
    }

    /// Set the number of rounds to run, unbounded if `None`.
    #[must_use]
    pub fn max_rounds(self, max_rounds: Option<MaxRounds>) -> Self {
        Self { max_rounds, ..self }
    }

    /// Set the supervisor control port.
    #[must_use]
    pub fn control_port(self, control_port: Port) -> Self {
        Self {
            control_port,
            ..self
        }
    }

    /// Build the `Pinger`.
    pub fn build(self) -> Result<Pinger> {
        if self.target_addr.is_ipv6() {
            return Err(Error::BadConfig(format!(
                "IPv6 target not supported: {}",
                self.target_addr
            )));
        }
        if self.interval.is_zero() {
            return Err(Error::BadConfig("interval must be non-zero".to_string()));
        }
        Ok(Pinger {
            channel_config: ChannelConfig {
                target_addr: self.target_addr,
                ping_id: self.ping_id,
                read_timeout: self.read_timeout,
            },
            probe_config: ProbeConfig {
                initial_sequence: self.initial_sequence,
                interval: self.interval,
                max_rounds: self.max_rounds,
            },
            control_port: self.control_port,
        })
    }
}

/// A supervised pinger.
#[derive(Debug, Clone, Copy)]
pub struct Pinger {
    channel_config: ChannelConfig,
    probe_config: ProbeConfig,
    control_port: Port,
}

impl Pinger {
    /// Run the probe loop, invoking `publish` once per answered probe.
    ///
    /// Opens the raw `ICMP` channel, connects to the supervisor and probes
    /// until the supervisor orders a stop, a fatal error occurs or the
    /// configured number of rounds completes.
    pub fn run_with<F: FnMut(&ProbeReport)>(&self, publish: F) -> Result<()> {
        let mut channel = Channel::connect(&self.channel_config)?;
        let mut control = ControlChannel::connect(self.control_port)?;
        ProbeLoop::new(self.probe_config, &mut channel, &mut control, &SystemClock).run(publish)
    }
}
