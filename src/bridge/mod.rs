//! # Bridges
//!
//! The two ways telemetry enters the crate:
//!
//! - [`flight_loop`]: a simulator host samples data references every tick and
//!   hands them to [`FlightLoopBridge`]
//! - [`udp`]: [`UdpBridge`] listens for XGPS datagrams from the simulator's
//!   data output

pub mod flight_loop;
pub mod udp;

pub use flight_loop::FlightLoopBridge;
pub use udp::UdpBridge;
