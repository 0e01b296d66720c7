//! # LightSeq Device
//!
//! UDP client for LED controllers speaking a DDP-style frame protocol.
//!
//! This crate provides:
//! - A connection state machine per device ([`DeviceClient`])
//! - The fixed 10-byte frame header codec
//! - Colour data frames and JSON control frames (brightness)
//!
//! ## Key Invariants
//!
//! - Frames are only sent while `connected`; anything else is an error
//! - A close requested mid-connect runs as soon as the connection is up
//! - Brightness is clamped to `0..=255` before it is sent

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod frame;

pub use client::{DeviceClient, DeviceState, DeviceStats};
pub use config::{DeviceConfig, DEFAULT_MAX_PAYLOAD, DEFAULT_PORT};
pub use error::{DeviceError, DeviceResult};
pub use frame::{
    encode_frame, solid_payload, DataType, FrameHeader, CONFIG_OUTPUT_ID, HEADER_LEN, PUSH_FLAG,
};
