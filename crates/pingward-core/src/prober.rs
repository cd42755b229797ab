use crate::clock::Clock;
use crate::config::ProbeConfig;
use crate::control::{ControlChannel, Verdict};
use crate::error::{Error, Result};
use crate::net::Network;
use crate::probe::{ProbeReport, Reply};
use crate::types::RoundId;
use std::io::{Read, Write};
use tracing::instrument;

/// The non-blocking probe loop.
///
/// Each round sends a single echo request and then alternates between one
/// bounded receive attempt and one continue query to the supervisor until
/// either a reply arrives or the supervisor orders a stop.  The loop never
/// blocks on the raw socket and never enforces the deadline itself.
pub struct ProbeLoop<'a, N, T, C> {
    config: ProbeConfig,
    network: &'a mut N,
    control: &'a mut ControlChannel<T>,
    clock: &'a C,
}

impl<'a, N: Network, T: Read + Write, C: Clock> ProbeLoop<'a, N, T, C> {
    pub fn new(
        config: ProbeConfig,
        network: &'a mut N,
        control: &'a mut ControlChannel<T>,
        clock: &'a C,
    ) -> Self {
        Self {
            config,
            network,
            control,
            clock,
        }
    }

    /// Run probe rounds until the supervisor orders a stop, a fatal error
    /// occurs or the configured number of rounds completes.
    ///
    /// The `publish` callback is invoked once per answered probe.
    #[instrument(skip_all, level = "debug")]
    pub fn run<F: FnMut(&ProbeReport)>(&mut self, mut publish: F) -> Result<()> {
        let mut sequence = self.config.initial_sequence;
        let mut round = RoundId(0);
        while self.config.max_rounds.map_or(true, |max| round.0 < max.0.get()) {
            self.clock.sleep(self.config.interval);
            self.control.send_start()?;
            let sent_at = self.clock.now();
            self.network.send_probe(sequence)?;
            let Some(reply) = self.await_reply()? else {
                tracing::debug!(?sequence, "supervisor ordered stop");
                return Err(Error::DeadlineExpired);
            };
            let rtt = self.clock.now().saturating_duration_since(sent_at);
            self.control.send_got_reply()?;
            publish(&ProbeReport {
                round,
                sequence,
                addr: reply.addr,
                bytes: reply.bytes,
                rtt,
            });
            sequence = sequence.next();
            round += 1;
        }
        Ok(())
    }

    /// Await the reply to the outstanding probe.
    ///
    /// Returns `None` if the supervisor answered `NO` before a reply
    /// arrived.  A malformed verdict fails the session.
    fn await_reply(&mut self) -> Result<Option<Reply>> {
        loop {
            if let Some(reply) = self.network.recv_reply()? {
                return Ok(Some(reply));
            }
            match self.control.ask_continue()? {
                Verdict::Yes => {}
                Verdict::No => return Ok(None),
            }
        }
    }
}
