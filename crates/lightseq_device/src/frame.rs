//! Frame header codec.
//!
//! Every frame starts with a fixed 10-byte header:
//!
//! ```text
//! byte 0     version (high nibble) | push flag (bit 0)
//! byte 1     reserved, 0
//! byte 2     data type
//! byte 3     output id
//! bytes 4-7  offset, big-endian (always 0)
//! bytes 8-9  payload length, big-endian
//! ```

use crate::error::{DeviceError, DeviceResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

/// Header length in bytes.
pub const HEADER_LEN: usize = 10;

/// Push flag: the device displays the frame immediately.
pub const PUSH_FLAG: u8 = 0x01;

/// Output id addressed by configuration frames.
pub const CONFIG_OUTPUT_ID: u8 = 250;

/// Pixel format of a frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// JSON control payload.
    Control,
    /// 8-bit RGB, 3 bytes per pixel.
    Rgb8,
    /// 8-bit RGBW, 4 bytes per pixel.
    Rgbw8,
}

impl DataType {
    /// Wire code.
    pub fn code(self) -> u8 {
        match self {
            DataType::Control => 0x00,
            DataType::Rgb8 => 0x0B,
            DataType::Rgbw8 => 0x1B,
        }
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(DataType::Control),
            0x0B => Some(DataType::Rgb8),
            0x1B => Some(DataType::Rgbw8),
            _ => None,
        }
    }

    /// Bytes per pixel, or `None` for control payloads.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            DataType::Control => None,
            DataType::Rgb8 => Some(3),
            DataType::Rgbw8 => Some(4),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Control => "control",
            DataType::Rgb8 => "rgb8",
            DataType::Rgbw8 => "rgbw8",
        })
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Protocol version (4 bits).
    pub version: u8,
    /// Display immediately.
    pub push: bool,
    /// Payload format.
    pub data_type: DataType,
    /// Addressed output.
    pub output_id: u8,
    /// Byte offset into the output's buffer.
    pub offset: u32,
    /// Payload length.
    pub length: u16,
}

impl FrameHeader {
    /// Header of a pushed frame at offset 0.
    pub fn new(version: u8, data_type: DataType, output_id: u8, length: u16) -> Self {
        Self {
            version: version & 0x0F,
            push: true,
            data_type,
            output_id,
            offset: 0,
            length,
        }
    }

    /// Appends the encoded header to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        let flags = (self.version & 0x0F) << 4 | if self.push { PUSH_FLAG } else { 0 };
        buf.put_u8(flags);
        buf.put_u8(0);
        buf.put_u8(self.data_type.code());
        buf.put_u8(self.output_id);
        buf.put_u32(self.offset);
        buf.put_u16(self.length);
    }

    /// Parses a header from the start of `frame`.
    pub fn decode(mut frame: &[u8]) -> DeviceResult<Self> {
        if frame.len() < HEADER_LEN {
            return Err(DeviceError::Codec(format!(
                "frame of {} bytes is shorter than the header",
                frame.len()
            )));
        }
        let flags = frame.get_u8();
        let _reserved = frame.get_u8();
        let code = frame.get_u8();
        let data_type = DataType::from_code(code)
            .ok_or_else(|| DeviceError::Codec(format!("unknown data type {code:#04x}")))?;
        let output_id = frame.get_u8();
        let offset = frame.get_u32();
        let length = frame.get_u16();
        Ok(Self {
            version: flags >> 4,
            push: flags & PUSH_FLAG != 0,
            data_type,
            output_id,
            offset,
            length,
        })
    }
}

/// Builds a complete frame. Fails if `payload` exceeds `max_payload` or the
/// 16-bit length field.
pub fn encode_frame(
    version: u8,
    data_type: DataType,
    output_id: u8,
    payload: &[u8],
    max_payload: usize,
) -> DeviceResult<Bytes> {
    let too_large = DeviceError::PayloadTooLarge {
        len: payload.len(),
        max: max_payload.min(u16::MAX as usize),
    };
    if payload.len() > max_payload {
        return Err(too_large);
    }
    let length = u16::try_from(payload.len()).map_err(|_| too_large)?;

    let header = FrameHeader::new(version, data_type, output_id, length);
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    header.encode(&mut buf);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Payload that paints `pixels` pixels with one colour. RGBW payloads leave
/// the white channel off.
pub fn solid_payload(data_type: DataType, color: [u8; 3], pixels: usize) -> Vec<u8> {
    let Some(width) = data_type.bytes_per_pixel() else {
        return Vec::new();
    };
    let mut pixel = color.to_vec();
    pixel.resize(width, 0);
    pixel.repeat(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut buf = BytesMut::new();
        FrameHeader::new(1, DataType::Rgb8, 1, 6).encode(&mut buf);
        assert_eq!(&buf[..], &[0x11, 0x00, 0x0B, 0x01, 0, 0, 0, 0, 0x00, 0x06]);
    }

    #[test]
    fn length_is_big_endian() {
        let frame = encode_frame(1, DataType::Rgb8, 2, &vec![7u8; 0x1A2], 1440).unwrap();
        assert_eq!(frame.len(), HEADER_LEN + 0x1A2);
        assert_eq!(&frame[8..10], &[0x01, 0xA2]);

        let header = FrameHeader::decode(&frame).unwrap();
        assert_eq!(header.length, 0x1A2);
        assert_eq!(header.output_id, 2);
        assert_eq!(header.offset, 0);
        assert!(header.push);
    }

    #[test]
    fn version_only_keeps_low_nibble() {
        let header = FrameHeader::new(0x13, DataType::Control, CONFIG_OUTPUT_ID, 0);
        assert_eq!(header.version, 3);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let result = encode_frame(1, DataType::Rgb8, 1, &[0u8; 31], 30);
        assert!(matches!(
            result,
            Err(DeviceError::PayloadTooLarge { len: 31, max: 30 })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            FrameHeader::decode(&[0x11, 0, 0x0B]),
            Err(DeviceError::Codec(_))
        ));
        assert!(matches!(
            FrameHeader::decode(&[0x11, 0, 0x42, 1, 0, 0, 0, 0, 0, 0]),
            Err(DeviceError::Codec(_))
        ));
    }

    #[test]
    fn solid_payloads() {
        assert_eq!(
            solid_payload(DataType::Rgb8, [1, 2, 3], 2),
            vec![1, 2, 3, 1, 2, 3]
        );
        assert_eq!(
            solid_payload(DataType::Rgbw8, [1, 2, 3], 1),
            vec![1, 2, 3, 0]
        );
        assert!(solid_payload(DataType::Control, [1, 2, 3], 4).is_empty());
    }
}
