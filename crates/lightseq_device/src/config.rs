//! Configuration for the device client.

use crate::frame::DataType;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default UDP port of the device protocol.
pub const DEFAULT_PORT: u16 = 4048;

/// Default largest payload per frame, chosen to fit one Ethernet MTU.
pub const DEFAULT_MAX_PAYLOAD: usize = 1440;

/// Configuration for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Device IP address.
    pub host: IpAddr,
    /// Device UDP port.
    pub port: u16,
    /// Output (strip) the data frames address.
    pub output_id: u8,
    /// Pixel format of data frames.
    pub data_type: DataType,
    /// Largest payload accepted by `send`.
    pub max_payload: usize,
    /// Protocol version written into every header.
    pub version: u8,
}

impl DeviceConfig {
    /// Creates a configuration for the device at `host`.
    pub fn new(host: IpAddr) -> Self {
        Self {
            host,
            port: DEFAULT_PORT,
            output_id: 1,
            data_type: DataType::Rgb8,
            max_payload: DEFAULT_MAX_PAYLOAD,
            version: 1,
        }
    }

    /// Sets the UDP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the output id.
    pub fn with_output_id(mut self, output_id: u8) -> Self {
        self.output_id = output_id;
        self
    }

    /// Sets the pixel format.
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Sets the payload limit.
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Sets the protocol version. Only the low nibble is sent.
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// The device's socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Local address to bind: any port on the unspecified address of the
    /// device's family.
    pub fn bind_addr(&self) -> SocketAddr {
        let ip = match self.host {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
        };
        SocketAddr::new(ip, 0)
    }
}

impl From<SocketAddr> for DeviceConfig {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip()).with_port(addr.port())
    }
}
