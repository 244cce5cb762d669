//! Codec trait and the line-delimited JSON implementation.
//!
//! The byte stream between two peers is a sequence of records. Each record
//! is one self-contained encoded value followed by a single delimiter byte
//! that never appears inside an encoded record. The transport splits on the
//! delimiter; the codec turns one record's bytes into a value and back.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts values to delimited records and record bodies back to values.
///
/// `encode` returns the full record *including* the trailing delimiter, so
/// the transport can write it in one `write_all`. `decode` receives the body
/// only (the transport has already stripped the delimiter).
pub trait Codec: Send + Sync + 'static {
    /// The record delimiter byte.
    fn delimiter(&self) -> u8;

    /// Serializes a value into one delimited record.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one record body.
    fn decode<T: DeserializeOwned>(&self, record: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// LineCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] producing compact JSON terminated by `\n`.
///
/// Compact `serde_json` output never contains a raw newline (newlines in
/// strings are escaped as `\n`), so the delimiter is unambiguous.
///
/// ```rust
/// use duelnet_protocol::{Codec, LineCodec, Message, Side};
///
/// let codec = LineCodec;
/// let record = codec.encode(&Message::ChooseColor { color: Side::B }).unwrap();
/// assert_eq!(record, b"{\"type\":\"choose\",\"color\":\"B\"}\n");
///
/// let body = &record[..record.len() - 1];
/// let decoded: Message = codec.decode(body).unwrap();
/// assert_eq!(decoded, Message::ChooseColor { color: Side::B });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCodec;

#[cfg(feature = "json")]
impl LineCodec {
    /// The record delimiter: a single line feed.
    pub const DELIMITER: u8 = b'\n';
}

#[cfg(feature = "json")]
impl Codec for LineCodec {
    fn delimiter(&self) -> u8 {
        Self::DELIMITER
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        let mut record = serde_json::to_vec(value).map_err(ProtocolError::Encode)?;
        record.push(Self::DELIMITER);
        Ok(record)
    }

    fn decode<T: DeserializeOwned>(&self, record: &[u8]) -> Result<T, ProtocolError> {
        // A peer on Windows may send "\r\n"; serde_json treats the stray
        // '\r' as trailing whitespace.
        serde_json::from_slice(record).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Message, Move, Side};

    #[test]
    fn test_encoded_record_ends_with_single_delimiter() {
        let codec = LineCodec;
        let mv: Move = "e2e4".parse().unwrap();
        let record = codec.encode(&Message::relay(mv, 600.0, 600.0)).unwrap();

        assert_eq!(record.last(), Some(&b'\n'));
        let newlines = record.iter().filter(|b| **b == b'\n').count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn test_decode_tolerates_carriage_return() {
        let codec = LineCodec;
        let msg: Message = codec.decode(b"{\"type\":\"choose\",\"color\":\"A\"}\r").unwrap();
        assert_eq!(msg, Message::ChooseColor { color: Side::A });
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let codec = LineCodec;
        let result: Result<Message, _> = codec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_shape_is_decode_error() {
        let codec = LineCodec;
        let result: Result<Message, _> = codec.decode(br#"{"color":"A"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
