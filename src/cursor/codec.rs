//! Cursor encoding/decoding
//!
//! Cursors are a small versioned binary record, base64url encoded without
//! padding so they can travel in query strings untouched:
//!
//! ```text
//! version:u8 | direction:u8 | field_len:u16 | field:utf8
//!   | value:tagged | id:tagged | checksum:[u8; 4]
//! ```
//!
//! The checksum is the first four bytes of SHA-256 over everything before
//! it. It catches corruption and casual edits; it is not a signature.

use super::types::{CursorDirection, CursorToken, PaginationKey};
use crate::error::{Error, Result};
use crate::value::Scalar;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::{Buf, BufMut, BytesMut};
use chrono::DateTime;
use sha2::{Digest, Sha256};

/// Current cursor format version
pub const CURSOR_VERSION: u8 = 1;

/// Default maximum accepted cursor length (4KB)
pub const DEFAULT_MAX_CURSOR_BYTES: usize = 4 * 1024;

const CHECKSUM_LEN: usize = 4;

// version + direction + field length + two type tags + checksum
const MIN_PAYLOAD_LEN: usize = 1 + 1 + 2 + 1 + 1 + CHECKSUM_LEN;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_TIMESTAMP: u8 = 5;
const TAG_OBJECT_ID: u8 = 6;

/// Encodes and decodes opaque cursor strings
#[derive(Debug, Clone, Copy)]
pub struct CursorCodec {
    max_cursor_bytes: usize,
}

impl Default for CursorCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CURSOR_BYTES)
    }
}

impl CursorCodec {
    /// Create a codec that rejects cursors longer than `max_cursor_bytes`
    pub fn new(max_cursor_bytes: usize) -> Self {
        Self { max_cursor_bytes }
    }

    /// Maximum accepted cursor length
    pub fn max_cursor_bytes(&self) -> usize {
        self.max_cursor_bytes
    }

    /// Encode a cursor token to an opaque string
    pub fn encode(&self, token: &CursorToken) -> String {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u8(CURSOR_VERSION);
        buf.put_u8(token.direction.marker());

        let field = token.field.as_bytes();
        // Field names longer than u16::MAX are truncated by the length prefix
        // and fail the field check on decode.
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u16(field.len() as u16);
        buf.put_slice(field);

        put_scalar(&mut buf, token.key.field_value());
        put_scalar(&mut buf, token.key.id());

        let checksum = checksum(&buf);
        buf.put_slice(&checksum);

        URL_SAFE_NO_PAD.encode(&buf)
    }

    /// Decode an opaque cursor string.
    ///
    /// Any malformed input fails with [`Error::InvalidCursor`].
    pub fn decode(&self, cursor: &str) -> Result<CursorToken> {
        if cursor.len() > self.max_cursor_bytes {
            return Err(Error::invalid_cursor(format!(
                "cursor exceeds maximum size ({} bytes)",
                self.max_cursor_bytes
            )));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|e| Error::invalid_cursor(format!("invalid base64 encoding: {e}")))?;

        if payload.len() < MIN_PAYLOAD_LEN {
            return Err(Error::invalid_cursor("cursor is truncated"));
        }

        let (body, expected) = payload.split_at(payload.len() - CHECKSUM_LEN);
        if checksum(body) != expected {
            return Err(Error::invalid_cursor("checksum mismatch"));
        }

        let mut buf = body;
        let version = buf.get_u8();
        if version != CURSOR_VERSION {
            return Err(Error::invalid_cursor(format!(
                "unsupported cursor version {version}"
            )));
        }

        let marker = buf.get_u8();
        let direction = CursorDirection::from_marker(marker).ok_or_else(|| {
            Error::invalid_cursor(format!("unknown direction marker {marker:#04x}"))
        })?;

        let field_len = usize::from(buf.get_u16());
        let field = take_utf8(&mut buf, field_len, "field name")?;

        let field_value = get_scalar(&mut buf)?;
        let id = get_scalar(&mut buf)?;

        if buf.has_remaining() {
            return Err(Error::invalid_cursor(format!(
                "{} trailing bytes after id",
                buf.remaining()
            )));
        }

        Ok(CursorToken {
            direction,
            field,
            key: PaginationKey::new(field_value, id),
        })
    }

    /// Decode a cursor submitted for a specific request.
    ///
    /// Besides being well formed, the cursor must have been issued for the
    /// same direction and the same paginated field; anything else would
    /// position the page against the wrong ordering.
    pub fn decode_for(
        &self,
        cursor: &str,
        paginated_field: &str,
        direction: CursorDirection,
    ) -> Result<PaginationKey> {
        let token = self.decode(cursor)?;

        if token.direction != direction {
            return Err(Error::invalid_cursor(format!(
                "cursor was issued for the {} page but submitted as {direction}",
                token.direction
            )));
        }

        if token.field != paginated_field {
            return Err(Error::invalid_cursor(format!(
                "cursor was issued for field '{}' but the request paginates on '{paginated_field}'",
                token.field
            )));
        }

        Ok(token.key)
    }
}

fn checksum(body: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(body);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

fn put_scalar(buf: &mut BytesMut, value: &Scalar) {
    match value {
        Scalar::Null => buf.put_u8(TAG_NULL),
        Scalar::Bool(b) => {
            buf.put_u8(TAG_BOOL);
            buf.put_u8(u8::from(*b));
        }
        Scalar::Int(i) => {
            buf.put_u8(TAG_INT);
            buf.put_i64(*i);
        }
        Scalar::Float(f) => {
            buf.put_u8(TAG_FLOAT);
            buf.put_u64(f.to_bits());
        }
        Scalar::String(s) => {
            buf.put_u8(TAG_STRING);
            #[allow(clippy::cast_possible_truncation)]
            buf.put_u32(s.len() as u32);
            buf.put_slice(s.as_bytes());
        }
        Scalar::Timestamp(ts) => {
            buf.put_u8(TAG_TIMESTAMP);
            buf.put_i64(ts.timestamp());
            buf.put_u32(ts.timestamp_subsec_nanos());
        }
        Scalar::ObjectId(oid) => {
            buf.put_u8(TAG_OBJECT_ID);
            buf.put_slice(oid);
        }
    }
}

fn get_scalar(buf: &mut &[u8]) -> Result<Scalar> {
    need(buf, 1)?;
    match buf.get_u8() {
        TAG_NULL => Ok(Scalar::Null),
        TAG_BOOL => {
            need(buf, 1)?;
            match buf.get_u8() {
                0 => Ok(Scalar::Bool(false)),
                1 => Ok(Scalar::Bool(true)),
                other => Err(Error::invalid_cursor(format!("invalid bool byte {other}"))),
            }
        }
        TAG_INT => {
            need(buf, 8)?;
            Ok(Scalar::Int(buf.get_i64()))
        }
        TAG_FLOAT => {
            need(buf, 8)?;
            Ok(Scalar::Float(f64::from_bits(buf.get_u64())))
        }
        TAG_STRING => {
            need(buf, 4)?;
            let len = buf.get_u32() as usize;
            take_utf8(buf, len, "string value").map(Scalar::String)
        }
        TAG_TIMESTAMP => {
            need(buf, 12)?;
            let secs = buf.get_i64();
            let nanos = buf.get_u32();
            DateTime::from_timestamp(secs, nanos)
                .map(Scalar::Timestamp)
                .ok_or_else(|| Error::invalid_cursor("timestamp out of range"))
        }
        TAG_OBJECT_ID => {
            need(buf, 12)?;
            let mut oid = [0u8; 12];
            buf.copy_to_slice(&mut oid);
            Ok(Scalar::ObjectId(oid))
        }
        tag => Err(Error::invalid_cursor(format!("unknown value type tag {tag}"))),
    }
}

fn take_utf8(buf: &mut &[u8], len: usize, what: &str) -> Result<String> {
    need(buf, len)?;
    let slice: &[u8] = *buf;
    let (bytes, rest) = slice.split_at(len);
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::invalid_cursor(format!("{what} is not valid UTF-8")))?
        .to_string();
    *buf = rest;
    Ok(text)
}

fn need(buf: &&[u8], len: usize) -> Result<()> {
    if buf.remaining() < len {
        return Err(Error::invalid_cursor("cursor is truncated"));
    }
    Ok(())
}
