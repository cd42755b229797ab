use clap::{Parser, Subcommand};
use pingward_core::defaults;
use std::net::Ipv4Addr;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Ping a host under the watch of a reply deadline supervisor
#[derive(Parser, Debug)]
#[command(name = "pingward", author, version, about, long_about = None, arg_required_else_help(true))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// The debug log filter [default: pingward=debug]
    #[arg(long, global = true)]
    pub log_filter: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send ICMP echo requests to a target and report round trip times
    Probe(ProbeArgs),
    /// Run the reply deadline supervisor
    Watch(WatchArgs),
}

#[derive(clap::Args, Debug)]
pub struct ProbeArgs {
    /// The IPv4 address to ping
    pub target: Ipv4Addr,

    /// The pause between probe rounds [default: 1s]
    #[arg(short = 'i', long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// The number of rounds to run, unbounded if not given
    #[arg(short = 'r', long)]
    pub max_rounds: Option<NonZeroUsize>,

    /// The supervisor control port [default: 3000]
    #[arg(short = 'p', long)]
    pub control_port: Option<u16>,
}

#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// The reply deadline [default: 10s]
    #[arg(short = 'd', long, value_parser = parse_duration)]
    pub deadline: Option<Duration>,

    /// The control port to listen on [default: 3000]
    #[arg(short = 'p', long)]
    pub control_port: Option<u16>,
}

impl ProbeArgs {
    pub fn interval(&self) -> Duration {
        self.interval.unwrap_or(defaults::DEFAULT_PROBE_INTERVAL)
    }

    pub fn control_port(&self) -> u16 {
        self.control_port.unwrap_or(defaults::DEFAULT_CONTROL_PORT)
    }
}

impl WatchArgs {
    pub fn deadline(&self) -> Duration {
        self.deadline.unwrap_or(defaults::DEFAULT_REPLY_DEADLINE)
    }

    pub fn control_port(&self) -> u16 {
        self.control_port.unwrap_or(defaults::DEFAULT_CONTROL_PORT)
    }
}

fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    Ok(humantime::parse_duration(value)?)
}
