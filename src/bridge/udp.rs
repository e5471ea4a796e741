//! UDP bridge: XGPS datagrams in, GPGGA + GPRMC out.
//!
//! Runs its own receive loop rather than being ticked by a host. Any socket
//! error, or a connect failure beyond the blocking-retry bound, ends the loop
//! and closes both the socket and the transport.

use std::future::Future;

use chrono::{DateTime, Timelike, Utc};
use tokio::net::UdpSocket;
use tracing::{debug, info, trace, warn};

use crate::config::UdpConfig;
use crate::error::Result;
use crate::nmea::encoder::encode_position_report;
use crate::nmea::fields::format_date;
use crate::telemetry::xgps::parse_xgps;
use crate::transport::link::Connector;
use crate::transport::{Transport, WriteOutcome};

/// Maximum datagram size we expect.
const MAX_DATAGRAM_SIZE: usize = 1024;

/// Forwards XGPS telemetry datagrams to the transport.
pub struct UdpBridge<C: Connector> {
    config: UdpConfig,
    transport: Transport<C>,
    datagrams: u64,
    reports: u64,
}

impl<C: Connector> UdpBridge<C> {
    pub fn new(config: UdpConfig, transport: Transport<C>) -> Self {
        Self {
            config,
            transport,
            datagrams: 0,
            reports: 0,
        }
    }

    /// Bind the configured socket and run until `shutdown` resolves.
    pub async fn run_until<F: Future<Output = ()>>(self, shutdown: F) -> Result<()> {
        let address = format!("{}:{}", self.config.bind_address, self.config.port);
        let socket = UdpSocket::bind(&address).await?;

        self.run_on(socket, shutdown).await
    }

    /// Run the receive loop on an already bound socket.
    pub async fn run_on<F: Future<Output = ()>>(mut self, socket: UdpSocket, shutdown: F) -> Result<()> {
        info!(
            local_addr = ?socket.local_addr().ok(),
            tag = %self.config.message_tag,
            endpoint = %self.transport.endpoint(),
            "UDP bridge started"
        );

        let result = self.serve(&socket, shutdown).await;

        self.transport.close();
        drop(socket);

        match &result {
            Ok(()) => info!(
                datagrams = self.datagrams,
                reports = self.reports,
                "UDP bridge stopped"
            ),
            Err(e) => warn!(
                datagrams = self.datagrams,
                reports = self.reports,
                "UDP bridge terminated: {}",
                e
            ),
        }

        result
    }

    async fn serve<F: Future<Output = ()>>(&mut self, socket: &UdpSocket, shutdown: F) -> Result<()> {
        tokio::pin!(shutdown);
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            tokio::select! {
                _ = &mut shutdown => return Ok(()),
                received = socket.recv_from(&mut buffer) => {
                    let (len, peer) = received?;
                    trace!(%peer, len, "Datagram received");
                    self.handle_datagram(&buffer[..len], Utc::now()).await?;
                }
            }
        }
    }

    /// Convert and forward one datagram.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Datagram ignored (unknown tag or malformed)
    /// * `Ok(Some(outcome))` - Position report written (or dropped)
    ///
    /// # Errors
    ///
    /// Only a blocking-retry connect that exhausts its bound
    pub async fn handle_datagram(
        &mut self,
        datagram: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<Option<WriteOutcome>> {
        self.datagrams += 1;

        let Some(fix) = parse_xgps(datagram, &self.config.message_tag) else {
            trace!("Ignoring datagram without {} tag", self.config.message_tag);
            return Ok(None);
        };

        let snapshot = match fix.to_snapshot(time_of_day_s(&received_at)) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Ignoring datagram: {}", e);
                return Ok(None);
            }
        };

        let report = encode_position_report(&snapshot, &format_date(received_at.date_naive()));
        let outcome = self.transport.write(&report).await?;
        self.reports += 1;

        Ok(Some(outcome))
    }

    /// Datagrams received so far
    pub fn datagrams(&self) -> u64 {
        self.datagrams
    }

    /// Position reports handed to the transport so far
    pub fn reports(&self) -> u64 {
        self.reports
    }
}

/// Whole seconds since UTC midnight; the fraction is dropped.
fn time_of_day_s(time: &DateTime<Utc>) -> f64 {
    time.num_seconds_from_midnight() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NmeaBridgeError;
    use crate::nmea::decoder::decode_sentence;
    use crate::transport::link::mocks::MockConnector;
    use crate::transport::ConnectPolicy;
    use chrono::TimeZone;
    use std::time::Duration;

    const DATAGRAM: &[u8] = b"XGPS1,151.2093,-33.8688,120.4,257.5,43.9";

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 34, 56).unwrap()
    }

    fn bridge(connector: &MockConnector, policy: ConnectPolicy) -> UdpBridge<MockConnector> {
        UdpBridge::new(UdpConfig::default(), Transport::new(connector.clone(), policy))
    }

    fn sentences(batch: &[u8]) -> Vec<String> {
        std::str::from_utf8(batch)
            .unwrap()
            .split_inclusive("\r\n")
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_time_of_day() {
        assert_eq!(time_of_day_s(&received_at()), 45296.0);

        let late = received_at() + chrono::Duration::milliseconds(999);
        assert_eq!(time_of_day_s(&late), 45296.0);
    }

    #[tokio::test]
    async fn test_handle_datagram_writes_gga_then_rmc() {
        let connector = MockConnector::new();
        let mut bridge = bridge(&connector, ConnectPolicy::FailSoft);

        let outcome = bridge.handle_datagram(DATAGRAM, received_at()).await.unwrap();
        assert_eq!(outcome, Some(WriteOutcome::Sent));

        let written = connector.link.get_written_data();
        assert_eq!(written.len(), 1);

        let report = sentences(&written[0]);
        assert_eq!(report.len(), 2);
        assert_eq!(
            decode_sentence(&report[0]).unwrap().body(),
            "GPGGA,123456.00,3352.1280,S,15112.5580,E,1,04,0.0,120.4,M,,,,"
        );
        let rmc = decode_sentence(&report[1]).unwrap();
        assert_eq!(
            rmc.body(),
            "GPRMC,123456.00,A,3352.1280,S,15112.5580,E,085.4,257.5,191026,0.0,W"
        );
        assert_eq!(bridge.datagrams(), 1);
        assert_eq!(bridge.reports(), 1);
    }

    #[tokio::test]
    async fn test_handle_datagram_truncates_to_whole_second() {
        let connector = MockConnector::new();
        let mut bridge = bridge(&connector, ConnectPolicy::FailSoft);

        let late = received_at() + chrono::Duration::milliseconds(700);
        bridge.handle_datagram(DATAGRAM, late).await.unwrap();

        let written = connector.link.get_written_data();
        assert!(sentences(&written[0])[0].starts_with("$GPGGA,123456.00,"));
    }

    #[tokio::test]
    async fn test_handle_datagram_ignores_unknown_tag() {
        let connector = MockConnector::new();
        let mut bridge = bridge(&connector, ConnectPolicy::FailSoft);

        let outcome = bridge
            .handle_datagram(b"XATT1,270.0,1.0,2.0", received_at())
            .await
            .unwrap();

        assert_eq!(outcome, None);
        assert_eq!(connector.attempts(), 0);
        assert_eq!(bridge.datagrams(), 1);
        assert_eq!(bridge.reports(), 0);
    }

    #[tokio::test]
    async fn test_handle_datagram_connect_bound_exceeded() {
        let connector = MockConnector::new();
        connector.fail_next(5);
        let mut bridge = bridge(
            &connector,
            ConnectPolicy::BlockingRetry {
                max_attempts: 2,
                retry_interval: Duration::from_millis(1),
            },
        );

        let result = bridge.handle_datagram(DATAGRAM, received_at()).await;
        assert!(matches!(result, Err(NmeaBridgeError::Connect { attempts: 2, .. })));
    }

    #[tokio::test]
    async fn test_run_on_forwards_datagrams_until_shutdown() {
        let connector = MockConnector::new();
        let bridge = bridge(&connector, ConnectPolicy::FailSoft);

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let address = socket.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(bridge.run_on(socket, async {
            let _ = stop_rx.await;
        }));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"XATT1,1,2,3", address).await.unwrap();
        sender.send_to(DATAGRAM, address).await.unwrap();

        for _ in 0..100 {
            if !connector.link.get_written_data().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        stop_tx.send(()).unwrap();
        let result = handle.await.unwrap();

        assert!(result.is_ok());
        assert_eq!(connector.link.get_written_data().len(), 1);
    }

    #[tokio::test]
    async fn test_run_on_terminates_on_connect_failure() {
        let connector = MockConnector::new();
        connector.fail_next(u32::MAX);
        let bridge = bridge(
            &connector,
            ConnectPolicy::BlockingRetry {
                max_attempts: 3,
                retry_interval: Duration::from_millis(1),
            },
        );

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let address = socket.local_addr().unwrap();
        let handle = tokio::spawn(bridge.run_on(socket, std::future::pending::<()>()));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(DATAGRAM, address).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("bridge should terminate")
            .unwrap();

        assert!(matches!(result, Err(NmeaBridgeError::Connect { .. })));
        assert_eq!(connector.attempts(), 3);
    }
}
