//! Pingward - a supervised `ICMP` echo probing library.
//!
//! This crate provides the probing and supervision facility used by the
//! standalone `pingward` application.
//!
//! A [`Pinger`] sends `ICMP` echo requests to a single `IPv4` target over a
//! raw socket and reports the round trip time of each answered probe.  The
//! probe loop never blocks on the raw socket and never tracks the reply
//! deadline itself; instead it holds a control connection to a separate
//! [`Supervisor`] process and exchanges fixed-width tokens with it.  The
//! supervisor arms a wall-clock timer per probe and answers each continue
//! query against a fixed deadline, evaluated lazily at query time.
//!
//! # Example
//!
//! The following example builds and runs a pinger with default configuration
//! and prints a line for each answered probe:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # use std::net::IpAddr;
//! # use std::str::FromStr;
//! use pingward_core::Builder;
//!
//! let addr = IpAddr::from_str("1.1.1.1")?;
//! Builder::new(addr)
//!     .build()?
//!     .run_with(|report| println!("{report:?}"))?;
//! # Ok(())
//! # }
//! ```
//!
//! The supervisor side binds first and then serves a single session:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use pingward_core::{Supervisor, SupervisorConfig};
//!
//! Supervisor::new(SupervisorConfig::default()).bind()?.serve()?;
//! # Ok(())
//! # }
//! ```
//!
//! Note that sending probes requires a raw socket and so the probe side
//! must run with the necessary privileges.
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc
)]
#![deny(unsafe_code)]

mod builder;
mod clock;
mod config;
mod control;
mod error;
mod net;
mod probe;
mod prober;
mod supervisor;
mod types;

pub use builder::{Builder, Pinger};
pub use clock::{Clock, SystemClock};
pub use config::{defaults, ChannelConfig, ProbeConfig, SupervisorConfig};
pub use control::{ControlChannel, Request, Verdict};
pub use error::{Error, Result};
pub use net::{Channel, Network, Socket, SocketImpl};
pub use probe::{ProbeReport, Reply};
pub use prober::ProbeLoop;
pub use supervisor::{BoundSupervisor, Session, Supervisor};
pub use types::{MaxRounds, PingId, Port, RoundId, Sequence};
