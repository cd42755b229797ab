#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use pingward_core::{Builder, MaxRounds, PingId, Port, Supervisor, SupervisorConfig};
use std::net::IpAddr;

mod args;

use args::{Args, Command, ProbeArgs, WatchArgs};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    configure_logging(&args);
    tracing::debug!(?args, "parsed args");
    match args.command {
        Command::Probe(probe) => run_probe(&probe),
        Command::Watch(watch) => run_watch(&watch),
    }
}

fn configure_logging(args: &Args) {
    if args.verbose {
        let filter = args.log_filter.as_deref().unwrap_or("pingward=debug");
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

fn run_probe(args: &ProbeArgs) -> anyhow::Result<()> {
    let pinger = Builder::new(IpAddr::V4(args.target))
        .ping_id(process_ping_id())
        .interval(args.interval())
        .max_rounds(args.max_rounds.map(MaxRounds))
        .control_port(Port(args.control_port()))
        .build()?;
    println!("Pinging the address: {}", args.target);
    pinger
        .run_with(|report| {
            println!(
                "-- Reply from {}: seq = {}, bytes = {}, time = {:.3} ms.",
                report.addr,
                report.sequence.0,
                report.bytes,
                report.rtt.as_secs_f64() * 1000.0
            );
        })
        .context("probe session failed")
}

fn run_watch(args: &WatchArgs) -> anyhow::Result<()> {
    let config = SupervisorConfig {
        port: Port(args.control_port()),
        deadline: args.deadline(),
    };
    let bound = Supervisor::new(config)
        .bind()
        .context("failed to bind control listener")?;
    bound.serve().context("supervisor session failed")
}

/// Derive the echo identifier from the process id.
fn process_ping_id() -> PingId {
    PingId((std::process::id() % u32::from(u16::MAX)) as u16)
}
