//! Encoded polyline codec (5-bit groups, zig-zag signs, 1e-5 scale).
//!
//! Each coordinate is stored as the delta from the previous one. A value is
//! split into 5-bit chunks, least significant first, each offset by 63 and
//! flagged with `0x20` when more chunks follow.

use thiserror::Error;

use crate::geo::Coordinate;

const SCALE: f64 = 1e5;
const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const OFFSET: u8 = 63;
/// 64-bit accumulator: anything past this shift cannot be a valid delta.
const MAX_SHIFT: u32 = 60;
/// Largest absolute latitude and longitude, in scaled units.
const MAX_LAT: i64 = 9_000_000;
const MAX_LNG: i64 = 18_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("polyline ends mid-value at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid polyline byte {byte:#04x} at {offset}")]
    InvalidByte { offset: usize, byte: u8 },
    #[error("polyline value starting at byte {offset} overflows")]
    Overflow { offset: usize },
    #[error("polyline point ending at byte {offset} lies outside valid coordinates")]
    OutOfRange { offset: usize },
}

/// Decode a full encoded polyline into coordinates.
///
/// The whole string must be consumed; a trailing partial value or a latitude
/// without its longitude is reported as [`PolylineError::Truncated`]. Running
/// totals must stay within ±90° latitude and ±180° longitude.
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::with_capacity(bytes.len() / 4);
    let mut offset = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;

    while offset < bytes.len() {
        let (dlat, lng_start) = decode_value(bytes, offset)?;
        if lng_start >= bytes.len() {
            return Err(PolylineError::Truncated { offset: lng_start });
        }
        let (dlng, next) = decode_value(bytes, lng_start)?;
        lat = lat
            .checked_add(dlat)
            .ok_or(PolylineError::Overflow { offset })?;
        lng = lng
            .checked_add(dlng)
            .ok_or(PolylineError::Overflow { offset: lng_start })?;
        if lat.abs() > MAX_LAT || lng.abs() > MAX_LNG {
            return Err(PolylineError::OutOfRange { offset: next });
        }
        coordinates.push(Coordinate::new(lat as f64 / SCALE, lng as f64 / SCALE));
        offset = next;
    }

    Ok(coordinates)
}

/// Decode one signed value starting at `start`; returns it with the next offset.
fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize), PolylineError> {
    let mut result = 0i64;
    let mut shift = 0u32;
    let mut offset = start;

    loop {
        let Some(&byte) = bytes.get(offset) else {
            return Err(PolylineError::Truncated { offset });
        };
        if !(OFFSET..=OFFSET + 63).contains(&byte) {
            return Err(PolylineError::InvalidByte { offset, byte });
        }
        if shift > MAX_SHIFT {
            return Err(PolylineError::Overflow { offset: start });
        }
        let chunk = i64::from(byte - OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;
        offset += 1;
        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    let value = if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    };
    Ok((value, offset))
}

/// Encode coordinates with the same scheme [`decode_polyline`] reads.
pub fn encode_polyline(coordinates: &[Coordinate]) -> String {
    let mut encoded = String::with_capacity(coordinates.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for coordinate in coordinates {
        let lat = (coordinate.latitude * SCALE).round() as i64;
        let lng = (coordinate.longitude * SCALE).round() as i64;
        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lng - prev_lng, &mut encoded);
        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

fn encode_value(value: i64, out: &mut String) {
    let mut zigzag = ((value << 1) ^ (value >> 63)) as u64;
    while zigzag >= CONTINUATION as u64 {
        let chunk = (zigzag & CHUNK_MASK as u64) as u8 | CONTINUATION as u8;
        out.push(char::from(chunk + OFFSET));
        zigzag >>= CHUNK_BITS;
    }
    out.push(char::from(zigzag as u8 + OFFSET));
}
