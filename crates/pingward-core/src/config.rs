use crate::types::Port;
use crate::{MaxRounds, PingId, Sequence};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use std::time::Duration;

    /// The default value for `interval`.
    pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(1000);

    /// The default value for `deadline`.
    pub const DEFAULT_REPLY_DEADLINE: Duration = Duration::from_secs(10);

    /// The default value for `control-port`.
    pub const DEFAULT_CONTROL_PORT: u16 = 3000;

    /// The default value for `read-timeout`.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

    /// The default value for `initial-sequence`.
    pub const DEFAULT_INITIAL_SEQUENCE: u16 = 0;

    /// The default echo request payload.
    pub const DEFAULT_PAYLOAD: &[u8] = b"Ping!\0";
}

/// Probe network channel configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChannelConfig {
    pub target_addr: IpAddr,
    pub ping_id: PingId,
    pub read_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            target_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ping_id: PingId::default(),
            read_timeout: defaults::DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Probe loop configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ProbeConfig {
    pub initial_sequence: Sequence,
    pub interval: Duration,
    pub max_rounds: Option<MaxRounds>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            initial_sequence: Sequence(defaults::DEFAULT_INITIAL_SEQUENCE),
            interval: defaults::DEFAULT_PROBE_INTERVAL,
            max_rounds: None,
        }
    }
}

/// Reply deadline supervisor configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SupervisorConfig {
    pub port: Port,
    pub deadline: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            port: Port(defaults::DEFAULT_CONTROL_PORT),
            deadline: defaults::DEFAULT_REPLY_DEADLINE,
        }
    }
}
