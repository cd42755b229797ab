use crate::config::{defaults, ChannelConfig};
use crate::error::{Error, Result};
use crate::net::socket::Socket;
use crate::net::{Network, SocketImpl, MAX_PACKET_SIZE};
use crate::probe::Reply;
use crate::types::{PingId, Sequence};
use pingward_packet::checksum::icmp_ipv4_checksum;
use pingward_packet::icmpv4::echo_reply::EchoReplyPacket;
use pingward_packet::icmpv4::echo_request::EchoRequestPacket;
use pingward_packet::icmpv4::{IcmpCode, IcmpPacket, IcmpType};
use pingward_packet::ipv4::Ipv4Packet;
use pingward_packet::IpProtocol;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::instrument;

/// The size of an echo request packet we send.
const ECHO_REQUEST_SIZE: usize =
    EchoRequestPacket::minimum_packet_size() + defaults::DEFAULT_PAYLOAD.len();

/// An `ICMP` echo channel for a single `IPv4` target.
pub struct Channel<S: Socket> {
    socket: S,
    dest_addr: Ipv4Addr,
    ping_id: PingId,
    read_timeout: Duration,
}

impl Channel<SocketImpl> {
    /// Create an `ICMP` channel for the given configuration.
    ///
    /// This operation requires the `CAP_NET_RAW` capability on Linux.
    pub fn connect(config: &ChannelConfig) -> Result<Self> {
        Self::with_socket(config, SocketImpl::new_icmp_socket_ipv4()?)
    }
}

impl<S: Socket> Channel<S> {
    /// Create a channel over an existing socket.
    pub fn with_socket(config: &ChannelConfig, socket: S) -> Result<Self> {
        let IpAddr::V4(dest_addr) = config.target_addr else {
            return Err(Error::BadConfig(format!(
                "IPv6 target not supported: {}",
                config.target_addr
            )));
        };
        Ok(Self {
            socket,
            dest_addr,
            ping_id: config.ping_id,
            read_timeout: config.read_timeout,
        })
    }
}

impl<S: Socket> Network for Channel<S> {
    #[instrument(skip(self), level = "debug")]
    fn send_probe(&mut self, sequence: Sequence) -> Result<()> {
        let mut icmp_buf = [0_u8; ECHO_REQUEST_SIZE];
        let mut icmp = EchoRequestPacket::new(&mut icmp_buf)?;
        icmp.set_icmp_type(IcmpType::EchoRequest);
        icmp.set_icmp_code(IcmpCode(0));
        icmp.set_identifier(self.ping_id.0);
        icmp.set_sequence(sequence.0);
        icmp.set_payload(defaults::DEFAULT_PAYLOAD);
        icmp.set_checksum(icmp_ipv4_checksum(icmp.packet()));
        let remote_addr = SocketAddr::new(IpAddr::V4(self.dest_addr), 0);
        self.socket
            .send_to(icmp.packet(), remote_addr)
            .map_err(Error::ProbeFailed)?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn recv_reply(&mut self) -> Result<Option<Reply>> {
        if !self.socket.is_readable(self.read_timeout)? {
            return Ok(None);
        }
        let mut buf = [0_u8; MAX_PACKET_SIZE];
        let bytes_read = match self.socket.read(&mut buf) {
            Ok(bytes_read) => bytes_read,
            Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(err) => return Err(Error::IoError(err)),
        };
        if bytes_read < Ipv4Packet::minimum_packet_size() {
            return Ok(None);
        }
        let ipv4 = Ipv4Packet::new_view(&buf[..bytes_read])?;
        if ipv4.get_protocol() != IpProtocol::Icmp {
            return Ok(None);
        }
        if ipv4.payload().len() < IcmpPacket::minimum_packet_size() {
            return Ok(None);
        }
        let icmp = IcmpPacket::new_view(ipv4.payload())?;
        if icmp.get_icmp_type() != IcmpType::EchoReply {
            return Ok(None);
        }
        let echo_reply = EchoReplyPacket::new_view(ipv4.payload())?;
        if echo_reply.get_identifier() != self.ping_id.0 {
            return Ok(None);
        }
        Ok(Some(Reply {
            addr: IpAddr::V4(ipv4.get_source()),
            identifier: PingId(echo_reply.get_identifier()),
            sequence: Sequence(echo_reply.get_sequence()),
            bytes: echo_reply.packet().len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoResult;
    use crate::mocket_read;
    use crate::net::socket::MockSocket;
    use hex_literal::hex;
    use mockall::predicate;

    const CONFIG: ChannelConfig = ChannelConfig {
        target_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        ping_id: PingId(0x04d2),
        read_timeout: Duration::from_millis(10),
    };

    #[test]
    fn test_send_probe() -> anyhow::Result<()> {
        let expected_send_to_buf = hex!("08 00 13 5d 04 d2 00 00 50 69 6e 67 21 00");
        let expected_send_to_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let mut mocket = MockSocket::new();
        mocket
            .expect_send_to()
            .with(
                predicate::eq(expected_send_to_buf),
                predicate::eq(expected_send_to_addr),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        let mut channel = Channel::with_socket(&CONFIG, mocket)?;
        channel.send_probe(Sequence(0))?;
        Ok(())
    }

    #[test]
    fn test_send_probe_sequence_is_wired_through() -> anyhow::Result<()> {
        let expected_send_to_buf = hex!("08 00 13 58 04 d2 00 05 50 69 6e 67 21 00");
        let mut mocket = MockSocket::new();
        mocket
            .expect_send_to()
            .with(predicate::eq(expected_send_to_buf), predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));
        let mut channel = Channel::with_socket(&CONFIG, mocket)?;
        channel.send_probe(Sequence(5))?;
        Ok(())
    }

    #[test]
    fn test_recv_reply() -> anyhow::Result<()> {
        let expected_read_buf = hex!(
            "
            45 00 00 22 00 00 00 00 40 01 00 00 7f 00 00 01
            7f 00 00 01 00 00 1b 58 04 d2 00 05 50 69 6e 67
            21 00
            "
        );
        let mut mocket = MockSocket::new();
        mocket
            .expect_is_readable()
            .times(1)
            .returning(|_| Ok(true));
        mocket
            .expect_read()
            .times(1)
            .returning(mocket_read!(expected_read_buf));
        let mut channel = Channel::with_socket(&CONFIG, mocket)?;
        let reply = channel.recv_reply()?;
        assert_eq!(
            Some(Reply {
                addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
                identifier: PingId(0x04d2),
                sequence: Sequence(5),
                bytes: 14,
            }),
            reply
        );
        Ok(())
    }

    #[test]
    fn test_recv_reply_not_readable() -> anyhow::Result<()> {
        let mut mocket = MockSocket::new();
        mocket
            .expect_is_readable()
            .times(1)
            .returning(|_| Ok(false));
        let mut channel = Channel::with_socket(&CONFIG, mocket)?;
        assert_eq!(None, channel.recv_reply()?);
        Ok(())
    }

    #[test]
    fn test_recv_reply_wrong_identifier_discarded() -> anyhow::Result<()> {
        let expected_read_buf = hex!(
            "
            45 00 00 22 00 00 00 00 40 01 00 00 7f 00 00 01
            7f 00 00 01 00 00 1a 58 05 d2 00 05 50 69 6e 67
            21 00
            "
        );
        let mut mocket = MockSocket::new();
        mocket
            .expect_is_readable()
            .times(1)
            .returning(|_| Ok(true));
        mocket
            .expect_read()
            .times(1)
            .returning(mocket_read!(expected_read_buf));
        let mut channel = Channel::with_socket(&CONFIG, mocket)?;
        assert_eq!(None, channel.recv_reply()?);
        Ok(())
    }

    #[test]
    fn test_recv_non_echo_icmp_discarded() -> anyhow::Result<()> {
        // a destination unreachable message for some unrelated traffic
        let expected_read_buf = hex!(
            "
            45 00 00 24 00 00 00 00 40 01 00 00 7f 00 00 01
            7f 00 00 01 03 01 fc fe 00 00 00 00 45 00 00 08
            11 00 00 00
            "
        );
        let mut mocket = MockSocket::new();
        mocket
            .expect_is_readable()
            .times(1)
            .returning(|_| Ok(true));
        mocket
            .expect_read()
            .times(1)
            .returning(mocket_read!(expected_read_buf));
        let mut channel = Channel::with_socket(&CONFIG, mocket)?;
        assert_eq!(None, channel.recv_reply()?);
        Ok(())
    }

    #[test]
    fn test_recv_echo_request_discarded() -> anyhow::Result<()> {
        // an outbound echo request looped back by the raw socket
        let expected_read_buf = hex!(
            "
            45 00 00 22 00 00 00 00 40 01 00 00 7f 00 00 01
            7f 00 00 01 08 00 13 58 04 d2 00 05 50 69 6e 67
            21 00
            "
        );
        let mut mocket = MockSocket::new();
        mocket
            .expect_is_readable()
            .times(1)
            .returning(|_| Ok(true));
        mocket
            .expect_read()
            .times(1)
            .returning(mocket_read!(expected_read_buf));
        let mut channel = Channel::with_socket(&CONFIG, mocket)?;
        assert_eq!(None, channel.recv_reply()?);
        Ok(())
    }

    #[test]
    fn test_ipv6_target_rejected() {
        let config = ChannelConfig {
            target_addr: IpAddr::V6(std::net::Ipv6Addr::LOCALHOST),
            ..CONFIG
        };
        let channel = Channel::with_socket(&config, MockSocket::new());
        assert!(matches!(channel, Err(Error::BadConfig(_))));
    }
}
