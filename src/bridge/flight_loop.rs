//! # Flight Loop Bridge
//!
//! Per-tick pipeline for the simulator plugin variant.
//!
//! The host calls [`FlightLoopBridge::tick`] from its flight-loop callback and
//! schedules the next call after the returned number of seconds:
//!
//! ```text
//! host tick ──► DataRefSampler ──► TelemetrySnapshot ──► encode_tick ──► TransportWriter
//!    ▲                                                                        │
//!    └──────────────────── next interval (1.0 s / 10.0 s) ◄───────────────────┘
//! ```
//!
//! `tick` never waits on I/O: the encoded batch is queued for the writer task.

use std::time::Duration;

use bytes::Bytes;
use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::FlightLoopConfig;
use crate::nmea::encoder::encode_tick;
use crate::nmea::fields::format_date;
use crate::telemetry::datarefs::{DataRefSampler, DataSource};
use crate::transport::{Liveness, TransportWriter};

/// Payload of the start-up trial write
pub const PROBE_PAYLOAD: &[u8] = b"HELLO?";

/// Number of ticks between status log messages
const LOG_INTERVAL_TICKS: u64 = 60;

/// Simulator-driven NMEA pipeline
#[derive(Debug)]
pub struct FlightLoopBridge {
    sampler: DataRefSampler,
    writer: TransportWriter,
    config: FlightLoopConfig,
    liveness: Liveness,
    date: String,
    ticks: u64,
    dispatched: u64,
}

impl FlightLoopBridge {
    /// Connect and probe the transport, then prepare for ticking
    ///
    /// The connect follows the transport's policy and is not timed; only the
    /// trial write is bounded by `probe_timeout`. A blocking-retry connect
    /// that gives up leaves the bridge unwritable. The date carried in GPRMC
    /// is taken once here from the host clock.
    ///
    /// # Arguments
    ///
    /// * `sampler` - Resolved data references
    /// * `writer` - Writer task owning the transport
    /// * `config` - Tick intervals and LXWP0 switch
    /// * `probe_timeout` - How long the trial write may take
    pub async fn start(
        sampler: DataRefSampler,
        writer: TransportWriter,
        config: FlightLoopConfig,
        probe_timeout: Duration,
    ) -> Self {
        let liveness = match writer.connect().await {
            Ok(_) => {
                writer
                    .probe(Bytes::from_static(PROBE_PAYLOAD), probe_timeout)
                    .await
            }
            Err(e) => {
                warn!("{}", e);
                Liveness::Unwritable
            }
        };

        match liveness {
            Liveness::Writable => info!("Transport writable, starting NMEA output"),
            Liveness::Unwritable => warn!(
                "Transport not writable, NMEA output disabled for this session"
            ),
        }

        Self {
            sampler,
            writer,
            config,
            liveness,
            date: format_date(Local::now().date_naive()),
            ticks: 0,
            dispatched: 0,
        }
    }

    /// Run one flight-loop tick
    ///
    /// # Returns
    ///
    /// * `f32` - Seconds until the host should call again: `interval_s`
    ///   normally, `backoff_interval_s` once the transport is unwritable
    pub fn tick(&mut self, source: &dyn DataSource) -> f32 {
        if self.liveness == Liveness::Unwritable {
            return self.config.backoff_interval_s;
        }

        self.ticks += 1;

        match self.sampler.sample(source) {
            Ok(snapshot) => {
                let batch = encode_tick(&snapshot, &self.date, self.config.extended_sentences);
                if self.writer.dispatch(batch) {
                    self.dispatched += 1;
                }
            }
            Err(e) => debug!("Skipping tick {}: {}", self.ticks, e),
        }

        if self.ticks % LOG_INTERVAL_TICKS == 0 {
            info!(
                "Tick {}: {} batches dispatched",
                self.ticks, self.dispatched
            );
        }

        self.config.interval_s
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    /// `ddmmyy` date used for GPRMC
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Ticks processed since start (excluding back-off ticks)
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Batches handed to the writer task
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Stop the writer, draining queued batches if the transport is writable
    pub async fn stop(self) {
        info!(
            ticks = self.ticks,
            dispatched = self.dispatched,
            "Flight loop bridge stopping"
        );

        match self.liveness {
            Liveness::Writable => self.writer.shutdown().await,
            Liveness::Unwritable => self.writer.abort(),
        }
    }
}
