//! Trait abstraction for the outbound connection to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;

/// An open connection that accepts sentence batches
#[async_trait]
pub trait Link: Send {
    /// Write all data to the connection
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Opens new links to a fixed endpoint
#[async_trait]
pub trait Connector: Send {
    /// Open a fresh connection
    async fn connect(&mut self) -> io::Result<Box<dyn Link>>;

    /// Human readable endpoint (e.g. `10.0.0.13:4353` or `/dev/ttyUSB0@4800`)
    fn endpoint(&self) -> String;
}

/// TCP stream link
pub struct TcpLink {
    stream: TcpStream,
}

#[async_trait]
impl Link for TcpLink {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }
}

/// Connects to a TCP `host:port`
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
}

impl TcpConnector {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host, port),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&mut self) -> io::Result<Box<dyn Link>> {
        let stream = TcpStream::connect(&self.address).await?;
        stream.set_nodelay(true)?;
        Ok(Box::new(TcpLink { stream }))
    }

    fn endpoint(&self) -> String {
        self.address.clone()
    }
}

/// Serial port link
pub struct SerialLink {
    port: tokio_serial::SerialStream,
}

#[async_trait]
impl Link for SerialLink {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.port.flush().await
    }
}

/// Opens a serial device at a fixed baud rate, 8N1, no flow control
#[derive(Debug, Clone)]
pub struct SerialConnector {
    device: String,
    baud_rate: u32,
}

impl SerialConnector {
    pub fn new(device: &str, baud_rate: u32) -> Self {
        Self {
            device: device.to_string(),
            baud_rate,
        }
    }
}

#[async_trait]
impl Connector for SerialConnector {
    async fn connect(&mut self) -> io::Result<Box<dyn Link>> {
        let port = tokio_serial::new(&self.device, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(io::Error::from)?;

        Ok(Box::new(SerialLink { port }))
    }

    fn endpoint(&self) -> String {
        format!("{}@{}", self.device, self.baud_rate)
    }
}
