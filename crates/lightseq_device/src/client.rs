//! Stateful UDP client for one device.

use crate::config::DeviceConfig;
use crate::error::{DeviceError, DeviceResult};
use crate::frame::{encode_frame, solid_payload, DataType, CONFIG_OUTPUT_ID};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Connection state of a device client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    /// No socket.
    Disconnected,
    /// Socket being set up.
    Connecting,
    /// A close arrived while connecting; it runs once connected.
    CloseRequested,
    /// Ready to send.
    Connected,
    /// Socket being released.
    Closing,
    /// Setup or a send failed; `connect` may be retried.
    Error,
}

impl DeviceState {
    /// Returns true if frames can be sent.
    pub fn is_connected(&self) -> bool {
        matches!(self, DeviceState::Connected)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceState::Disconnected => "disconnected",
            DeviceState::Connecting => "connecting",
            DeviceState::CloseRequested => "close_requested",
            DeviceState::Connected => "connected",
            DeviceState::Closing => "closing",
            DeviceState::Error => "error",
        })
    }
}

/// Counters for one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Frames sent.
    pub frames_sent: u64,
    /// Bytes sent, headers included.
    pub bytes_sent: u64,
}

/// UDP client driving one device.
///
/// States move `disconnected → connecting → connected → closing →
/// disconnected`. A close requested while connecting is deferred and runs as
/// soon as the connection is up. Sending outside `connected` fails with
/// [`DeviceError::NotConnected`].
pub struct DeviceClient {
    config: DeviceConfig,
    state: watch::Sender<DeviceState>,
    socket: Mutex<Option<Arc<UdpSocket>>>,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl DeviceClient {
    /// Creates a disconnected client.
    pub fn new(config: DeviceConfig) -> Self {
        let (state, _) = watch::channel(DeviceState::Disconnected);
        Self {
            config,
            state,
            socket: Mutex::new(None),
            frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> DeviceState {
        *self.state.borrow()
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<DeviceState> {
        self.state.subscribe()
    }

    /// Counters so far.
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }

    /// Opens the socket. Allowed from `disconnected` and `error`.
    pub async fn connect(&self) -> DeviceResult<()> {
        self.begin_connect()?;
        let addr = self.config.socket_addr();
        let socket = match open_socket(&self.config).await {
            Ok(socket) => socket,
            Err(err) => {
                warn!(%addr, error = %err, "device connect failed");
                self.set_state(DeviceState::Error);
                return Err(err);
            }
        };
        self.finish_connect(socket);
        Ok(())
    }

    fn begin_connect(&self) -> DeviceResult<()> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| match *state {
            DeviceState::Disconnected | DeviceState::Error => {
                *state = DeviceState::Connecting;
                true
            }
            from => {
                result = Err(DeviceError::InvalidTransition {
                    from,
                    to: DeviceState::Connecting,
                });
                false
            }
        });
        result
    }

    fn finish_connect(&self, socket: UdpSocket) {
        *self.socket.lock() = Some(Arc::new(socket));
        let deferred_close = self.state() == DeviceState::CloseRequested;
        self.set_state(DeviceState::Connected);
        info!(addr = %self.config.socket_addr(), "device connected");
        if deferred_close {
            debug!("running close requested during connect");
            self.release();
        }
    }

    /// Closes the socket. A close while connecting is deferred until the
    /// connection is up; closing an idle client does nothing.
    pub fn close(&self) {
        match self.state() {
            DeviceState::Connecting => self.set_state(DeviceState::CloseRequested),
            DeviceState::Connected | DeviceState::Error => self.release(),
            DeviceState::Disconnected | DeviceState::CloseRequested | DeviceState::Closing => {}
        }
    }

    fn release(&self) {
        self.set_state(DeviceState::Closing);
        self.socket.lock().take();
        self.set_state(DeviceState::Disconnected);
        debug!(addr = %self.config.socket_addr(), "device closed");
    }

    /// Sends one pushed data frame carrying `pixels`.
    pub async fn send(&self, pixels: &[u8]) -> DeviceResult<usize> {
        let frame = encode_frame(
            self.config.version,
            self.config.data_type,
            self.config.output_id,
            pixels,
            self.config.max_payload,
        )?;
        self.transmit(frame).await
    }

    /// Paints `pixels` pixels with one colour.
    pub async fn send_color(&self, color: [u8; 3], pixels: usize) -> DeviceResult<usize> {
        self.send(&solid_payload(self.config.data_type, color, pixels))
            .await
    }

    /// Sets the device brightness, clamped to `0..=255`. Returns the level sent.
    pub async fn set_brightness(&self, level: i64) -> DeviceResult<u8> {
        let clamped = level.clamp(0, 255) as u8;
        let payload = serde_json::to_vec(&serde_json::json!({ "brightness": clamped }))?;
        let frame = encode_frame(
            self.config.version,
            DataType::Control,
            CONFIG_OUTPUT_ID,
            &payload,
            self.config.max_payload,
        )?;
        self.transmit(frame).await?;
        Ok(clamped)
    }

    async fn transmit(&self, frame: Bytes) -> DeviceResult<usize> {
        let state = self.state();
        let socket = match (state, self.socket.lock().clone()) {
            (DeviceState::Connected, Some(socket)) => socket,
            _ => {
                warn!(%state, "frame dropped: device not connected");
                return Err(DeviceError::NotConnected { state });
            }
        };

        match socket.send(&frame).await {
            Ok(sent) => {
                self.frames_sent.fetch_add(1, Ordering::Relaxed);
                self.bytes_sent.fetch_add(sent as u64, Ordering::Relaxed);
                Ok(sent)
            }
            Err(err) => {
                warn!(error = %err, "device send failed");
                self.set_state(DeviceState::Error);
                Err(err.into())
            }
        }
    }

    fn set_state(&self, next: DeviceState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            let from = *state;
            debug!(%from, to = %next, "device state");
            *state = next;
            true
        });
    }
}

impl fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceClient")
            .field("target", &self.config.socket_addr())
            .field("state", &self.state())
            .finish()
    }
}

async fn open_socket(config: &DeviceConfig) -> DeviceResult<UdpSocket> {
    let socket = UdpSocket::bind(config.bind_addr()).await?;
    socket.connect(config.socket_addr()).await?;
    Ok(socket)
}
