//! # Transport Module
//!
//! Delivers NMEA sentence batches over a connection that can drop at any time.
//!
//! This module handles:
//! - Opening TCP or serial connections to the configured endpoint
//! - Reconnecting on demand with a blocking-retry or fail-soft policy
//! - Swallowing send failures (the batch is lost, the link is closed)
//! - A single writer task so the flight loop never waits on I/O

pub mod link;
pub mod writer;

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{TransportConfig, TransportKind};
use crate::error::{NmeaBridgeError, Result};
use link::{Connector, Link, SerialConnector, TcpConnector};

pub use writer::{Liveness, TransportWriter};

/// How a disconnected transport re-establishes its connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPolicy {
    /// Retry with a pause between attempts; fail after `max_attempts`
    BlockingRetry {
        max_attempts: u32,
        retry_interval: Duration,
    },

    /// One attempt per write; stay disconnected on failure
    FailSoft,
}

/// Result of a single [`Transport::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The whole batch was written and flushed
    Sent,

    /// The send failed; the batch was discarded and the link closed
    Dropped,

    /// No connection could be made (fail-soft policy); nothing was sent
    NotConnected,
}

/// Connection state machine owning the link to the navigation software
///
/// # Examples
///
/// ```no_run
/// use nmea_bridge::transport::{ConnectPolicy, Transport};
/// use nmea_bridge::transport::link::TcpConnector;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut transport = Transport::new(
///         TcpConnector::new("10.0.0.13", 4353),
///         ConnectPolicy::FailSoft,
///     );
///     transport.write(b"$GPGGA*56\r\n").await?;
///     Ok(())
/// }
/// ```
pub struct Transport<C: Connector> {
    connector: C,
    policy: ConnectPolicy,
    link: Option<Box<dyn Link>>,
}

impl<C: Connector> std::fmt::Debug for Transport<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.connector.endpoint())
            .field("policy", &self.policy)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Transport<C> {
    /// Create a disconnected transport
    pub fn new(connector: C, policy: ConnectPolicy) -> Self {
        Self {
            connector,
            policy,
            link: None,
        }
    }

    /// Whether a link is currently open
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn endpoint(&self) -> String {
        self.connector.endpoint()
    }

    pub fn policy(&self) -> ConnectPolicy {
        self.policy
    }

    /// Establish the connection according to the policy
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Connected (or already connected)
    /// * `Ok(false)` - Fail-soft attempt failed; try again on the next write
    ///
    /// # Errors
    ///
    /// Returns `NmeaBridgeError::Connect` when the blocking-retry bound is
    /// exhausted
    pub async fn connect(&mut self) -> Result<bool> {
        if self.is_connected() {
            return Ok(true);
        }

        match self.policy {
            ConnectPolicy::FailSoft => match self.connector.connect().await {
                Ok(link) => {
                    self.on_connected(link, 1);
                    Ok(true)
                }
                Err(e) => {
                    debug!("Failed to connect to {}: {}", self.connector.endpoint(), e);
                    Ok(false)
                }
            },
            ConnectPolicy::BlockingRetry {
                max_attempts,
                retry_interval,
            } => {
                let max_attempts = max_attempts.max(1);
                let mut attempts = 0;

                loop {
                    attempts += 1;
                    match self.connector.connect().await {
                        Ok(link) => {
                            self.on_connected(link, attempts);
                            return Ok(true);
                        }
                        Err(e) if attempts >= max_attempts => {
                            warn!(
                                "Giving up on {} after {} attempts: {}",
                                self.connector.endpoint(),
                                attempts,
                                e
                            );
                            return Err(NmeaBridgeError::Connect {
                                endpoint: self.connector.endpoint(),
                                attempts,
                                source: e,
                            });
                        }
                        Err(e) => {
                            debug!(
                                attempt = attempts,
                                "Failed to connect to {}: {}",
                                self.connector.endpoint(),
                                e
                            );
                            tokio::time::sleep(retry_interval).await;
                        }
                    }
                }
            }
        }
    }

    fn on_connected(&mut self, link: Box<dyn Link>, attempts: u32) {
        info!(attempts, "Connected to {}", self.connector.endpoint());
        self.link = Some(link);
    }

    /// Send one batch, connecting first if needed
    ///
    /// Send failures are not surfaced: the link is closed and the batch is
    /// dropped. The next write reconnects.
    ///
    /// # Errors
    ///
    /// Only a blocking-retry connect that exhausts its bound is an error
    pub async fn write(&mut self, data: &[u8]) -> Result<WriteOutcome> {
        if !self.is_connected() && !self.connect().await? {
            return Ok(WriteOutcome::NotConnected);
        }

        let Some(link) = self.link.as_mut() else {
            return Ok(WriteOutcome::NotConnected);
        };

        match Self::send(link.as_mut(), data).await {
            Ok(()) => {
                debug!("Sent {} bytes to {}", data.len(), self.connector.endpoint());
                Ok(WriteOutcome::Sent)
            }
            Err(e) => {
                warn!("Write to {} failed, disconnecting: {}", self.connector.endpoint(), e);
                self.close();
                Ok(WriteOutcome::Dropped)
            }
        }
    }

    async fn send(link: &mut dyn Link, data: &[u8]) -> io::Result<()> {
        link.write_all(data).await?;
        link.flush().await
    }

    /// Close the link and mark the transport disconnected
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            info!("Closed connection to {}", self.connector.endpoint());
        }
    }
}

/// Connector for whichever endpoint the configuration names
#[derive(Debug, Clone)]
pub enum EndpointConnector {
    Tcp(TcpConnector),
    Serial(SerialConnector),
}

impl EndpointConnector {
    pub fn from_config(config: &TransportConfig) -> Self {
        match config.kind {
            TransportKind::Tcp => Self::Tcp(TcpConnector::new(&config.host, config.port)),
            TransportKind::Serial => {
                Self::Serial(SerialConnector::new(&config.device, config.baud_rate))
            }
        }
    }
}

#[async_trait]
impl Connector for EndpointConnector {
    async fn connect(&mut self) -> io::Result<Box<dyn Link>> {
        match self {
            Self::Tcp(connector) => connector.connect().await,
            Self::Serial(connector) => connector.connect().await,
        }
    }

    fn endpoint(&self) -> String {
        match self {
            Self::Tcp(connector) => connector.endpoint(),
            Self::Serial(connector) => connector.endpoint(),
        }
    }
}

/// Build the configured transport (disconnected)
pub fn transport_from_config(config: &TransportConfig) -> Transport<EndpointConnector> {
    Transport::new(EndpointConnector::from_config(config), config.connect_policy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use link::mocks::MockConnector;
    use tokio_test::{assert_err, assert_ok};

    fn blocking(max_attempts: u32) -> ConnectPolicy {
        ConnectPolicy::BlockingRetry {
            max_attempts,
            retry_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let transport = Transport::new(MockConnector::new(), ConnectPolicy::FailSoft);
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_write_connects_and_sends() {
        let connector = MockConnector::new();
        let mut transport = Transport::new(connector.clone(), ConnectPolicy::FailSoft);

        let outcome = assert_ok!(transport.write(b"$GPGGA*56\r\n").await);

        assert_eq!(outcome, WriteOutcome::Sent);
        assert!(transport.is_connected());
        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.link.get_written_data(), vec![b"$GPGGA*56\r\n".to_vec()]);
    }

    #[tokio::test]
    async fn test_connected_write_does_not_reconnect() {
        let connector = MockConnector::new();
        let mut transport = Transport::new(connector.clone(), ConnectPolicy::FailSoft);

        transport.write(b"a").await.unwrap();
        transport.write(b"b").await.unwrap();

        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.link.get_written_data().len(), 2);
    }

    #[tokio::test]
    async fn test_send_failure_disconnects_and_drops() {
        let connector = MockConnector::new();
        let mut transport = Transport::new(connector.clone(), blocking(3));
        transport.connect().await.unwrap();

        connector.link.set_write_error(io::ErrorKind::BrokenPipe);
        let outcome = assert_ok!(transport.write(b"lost").await);

        assert_eq!(outcome, WriteOutcome::Dropped);
        assert!(!transport.is_connected());
        assert!(connector.link.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_flush_failure_disconnects() {
        let connector = MockConnector::new();
        let mut transport = Transport::new(connector.clone(), ConnectPolicy::FailSoft);
        connector.link.set_flush_error(io::ErrorKind::TimedOut);

        let outcome = transport.write(b"x").await.unwrap();

        assert_eq!(outcome, WriteOutcome::Dropped);
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_reconnect_once_after_send_failure() {
        let connector = MockConnector::new();
        let mut transport = Transport::new(connector.clone(), blocking(3));
        transport.connect().await.unwrap();
        assert_eq!(connector.attempts(), 1);

        connector.link.set_write_error(io::ErrorKind::ConnectionReset);
        transport.write(b"lost").await.unwrap();
        assert!(!transport.is_connected());

        connector.link.clear_write_error();
        let outcome = transport.write(b"next").await.unwrap();

        assert_eq!(outcome, WriteOutcome::Sent);
        assert_eq!(connector.attempts(), 2, "exactly one reconnect attempt");
        assert_eq!(connector.link.get_written_data(), vec![b"next".to_vec()]);
    }

    #[tokio::test]
    async fn test_blocking_retry_recovers_within_bound() {
        let connector = MockConnector::new();
        connector.fail_next(2);
        let mut transport = Transport::new(connector.clone(), blocking(3));

        assert!(assert_ok!(transport.connect().await));
        assert_eq!(connector.attempts(), 3);
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn test_blocking_retry_bound_exceeded() {
        let connector = MockConnector::new();
        connector.fail_next(10);
        let mut transport = Transport::new(connector.clone(), blocking(4));

        let err = assert_err!(transport.write(b"x").await);

        match err {
            NmeaBridgeError::Connect {
                endpoint, attempts, ..
            } => {
                assert_eq!(endpoint, "mock:0");
                assert_eq!(attempts, 4);
            }
            other => panic!("Expected Connect error, got: {:?}", other),
        }
        assert_eq!(connector.attempts(), 4);
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_blocking_retry_zero_attempts_means_one() {
        let connector = MockConnector::new();
        connector.fail_next(1);
        let mut transport = Transport::new(connector.clone(), blocking(0));

        assert!(transport.connect().await.is_err());
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn test_fail_soft_single_attempt() {
        let connector = MockConnector::new();
        connector.fail_next(1);
        let mut transport = Transport::new(connector.clone(), ConnectPolicy::FailSoft);

        let outcome = assert_ok!(transport.write(b"x").await);

        assert_eq!(outcome, WriteOutcome::NotConnected);
        assert_eq!(connector.attempts(), 1);
        assert!(connector.link.get_written_data().is_empty());

        // Next write tries again
        let outcome = transport.write(b"y").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Sent);
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_close() {
        let connector = MockConnector::new();
        let mut transport = Transport::new(connector, ConnectPolicy::FailSoft);
        transport.connect().await.unwrap();

        transport.close();
        assert!(!transport.is_connected());

        // Closing twice is harmless
        transport.close();
    }

    #[test]
    fn test_transport_from_config() {
        let mut config = TransportConfig::default();
        config.kind = TransportKind::Serial;
        config.device = "/dev/ttyS1".to_string();
        config.baud_rate = 9600;

        let transport = transport_from_config(&config);
        assert_eq!(transport.endpoint(), "/dev/ttyS1@9600");
        assert!(!transport.is_connected());
    }
}
