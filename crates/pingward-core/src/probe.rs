use crate::types::{PingId, RoundId, Sequence};
use std::net::IpAddr;
use std::time::Duration;

/// An `ICMP` echo reply received from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// The source address of the reply datagram.
    pub addr: IpAddr,
    /// The echo identifier.
    pub identifier: PingId,
    /// The echo sequence number.
    pub sequence: Sequence,
    /// The length of the `ICMP` packet, in bytes.
    pub bytes: usize,
}

/// The outcome of a single completed probe round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    /// The probe round.
    pub round: RoundId,
    /// The sequence number of the probe that was answered.
    pub sequence: Sequence,
    /// The address which answered.
    pub addr: IpAddr,
    /// The length of the reply `ICMP` packet, in bytes.
    pub bytes: usize,
    /// The round trip time of the probe.
    pub rtt: Duration,
}
