//! Decoder for the encoded polyline format used by routing providers.
//!
//! Each coordinate is stored as a pair of signed deltas (latitude first)
//! against the previous point, scaled by 1e5, zig-zag encoded, and split
//! into 5-bit chunks offset by 63. A chunk with bit 0x20 set is followed
//! by another chunk of the same value.

use thiserror::Error;

use crate::geo::RouteCoordinate;

const PRECISION: f64 = 1e5;
const CHUNK_OFFSET: u8 = 63;
const CONTINUATION_BIT: u64 = 0x20;
const CHUNK_MASK: u64 = 0x1f;
// Seven chunks carry 35 bits, enough for any 32-bit delta.
const MAX_SHIFT: u32 = 30;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("polyline truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("invalid polyline byte {byte:#04x} at offset {offset}")]
    InvalidByte { offset: usize, byte: u8 },

    #[error("polyline value overflows at byte {offset}")]
    Overflow { offset: usize },
}

/// Lazily yields coordinates from an encoded polyline.
///
/// Stops after the first error. Construct a new decoder over the same
/// input to restart from the beginning.
#[derive(Debug, Clone)]
pub struct PolylineDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    lat: i64,
    lng: i64,
    failed: bool,
}

impl<'a> PolylineDecoder<'a> {
    pub fn new(encoded: &'a str) -> Self {
        Self {
            bytes: encoded.as_bytes(),
            pos: 0,
            lat: 0,
            lng: 0,
            failed: false,
        }
    }

    fn next_delta(&mut self) -> Result<i64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift: u32 = 0;

        loop {
            let offset = self.pos;
            let byte = *self
                .bytes
                .get(offset)
                .ok_or(DecodeError::Truncated { offset })?;

            if !(CHUNK_OFFSET..=126).contains(&byte) {
                return Err(DecodeError::InvalidByte { offset, byte });
            }
            if shift > MAX_SHIFT {
                return Err(DecodeError::Overflow { offset });
            }

            self.pos += 1;
            let chunk = u64::from(byte - CHUNK_OFFSET);
            result |= (chunk & CHUNK_MASK) << shift;

            if chunk & CONTINUATION_BIT == 0 {
                break;
            }
            shift += 5;
        }

        let delta = if result & 1 == 1 {
            !(result >> 1) as i64
        } else {
            (result >> 1) as i64
        };

        Ok(delta)
    }
}

impl Iterator for PolylineDecoder<'_> {
    type Item = Result<RouteCoordinate, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }

        let deltas = self
            .next_delta()
            .and_then(|d_lat| self.next_delta().map(|d_lng| (d_lat, d_lng)));

        match deltas {
            Ok((d_lat, d_lng)) => {
                self.lat += d_lat;
                self.lng += d_lng;
                Some(Ok(RouteCoordinate::new(
                    self.lat as f64 / PRECISION,
                    self.lng as f64 / PRECISION,
                )))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

pub fn decode(encoded: &str) -> Result<Vec<RouteCoordinate>, DecodeError> {
    PolylineDecoder::new(encoded).collect()
}
