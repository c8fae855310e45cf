//! Chunked message framing.
//!
//! A Bolt message payload is PackStream-encoded, split into chunks of at
//! most 65 535 bytes, and each chunk is written as a big-endian `u16` length
//! followed by the chunk body. A zero-length chunk terminates the message.
//! Zero-length chunks between messages (NOOP keep-alives) are skipped.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::message::{BoltRequest, BoltResponse};
use super::packstream::{decode, encode, PackStreamError, Value};
use super::BoltError;

/// Maximum chunk body size: the chunk header is a u16.
pub const MAX_CHUNK_SIZE: usize = 0xFFFF;

/// End-of-message marker (a zero-length chunk).
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Default cap on a single reassembled message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Value-level chunking codec.
///
/// Decoding accumulates chunk bodies until the terminator, then decodes the
/// assembled payload as exactly one PackStream value. Incomplete input
/// yields `None` (read more); leftover bytes after the value are a protocol
/// error because a message carries exactly one structure.
#[derive(Debug)]
pub struct BoltCodec {
    max_message_size: usize,
    message_buffer: BytesMut,
}

impl BoltCodec {
    /// Create a new codec with the default message size limit.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a codec with a custom message size limit.
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            message_buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Split an encoded payload into chunks followed by the end marker.
    fn encode_chunked(&self, data: &[u8], dst: &mut BytesMut) {
        let mut offset = 0;

        while offset < data.len() {
            let chunk_size = (data.len() - offset).min(MAX_CHUNK_SIZE);
            dst.put_u16(chunk_size as u16);
            dst.put_slice(&data[offset..offset + chunk_size]);
            offset += chunk_size;
        }

        dst.put_slice(&END_MARKER);
    }
}

impl Default for BoltCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BoltCodec {
    type Item = Value;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }

            let chunk_size = u16::from_be_bytes([src[0], src[1]]) as usize;

            if chunk_size == 0 {
                src.advance(2);

                if self.message_buffer.is_empty() {
                    // NOOP between messages, keep scanning.
                    continue;
                }

                let message_data = self.message_buffer.split();

                let (value, consumed) = decode(&message_data).map_err(|e| match e {
                    // The terminator was seen, so a short payload is not
                    // "read more" but a malformed message.
                    PackStreamError::Incomplete => {
                        BoltError::Protocol("malformed message: truncated payload".to_string())
                    }
                    other => BoltError::PackStream(other),
                })?;

                if consumed != message_data.len() {
                    return Err(BoltError::Protocol(format!(
                        "malformed message: {} trailing bytes after payload",
                        message_data.len() - consumed
                    )));
                }

                return Ok(Some(value));
            }

            if src.len() < 2 + chunk_size {
                return Ok(None);
            }

            if self.message_buffer.len() + chunk_size > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size: self.message_buffer.len() + chunk_size,
                    max: self.max_message_size,
                });
            }

            src.advance(2);
            self.message_buffer.extend_from_slice(&src[..chunk_size]);
            src.advance(chunk_size);
        }
    }
}

impl Encoder<Value> for BoltCodec {
    type Error = BoltError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let encoded = encode(&item).map_err(BoltError::PackStream)?;
        self.encode_chunked(&encoded, dst);
        Ok(())
    }
}

/// Client-side message codec: encodes requests, decodes responses.
#[derive(Debug, Default)]
pub struct BoltMessageCodec {
    inner: BoltCodec,
}

impl BoltMessageCodec {
    /// Create a new message codec.
    pub fn new() -> Self {
        Self {
            inner: BoltCodec::new(),
        }
    }
}

impl Decoder for BoltMessageCodec {
    type Item = BoltResponse;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(value) => {
                let response = BoltResponse::classify(value).map_err(BoltError::PackStream)?;
                Ok(Some(response))
            }
            None => Ok(None),
        }
    }
}

impl<'a> Encoder<&'a BoltRequest> for BoltMessageCodec {
    type Error = BoltError;

    fn encode(&mut self, item: &'a BoltRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let value = Value::Structure(item.to_structure());
        self.inner.encode(value, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::message::{RunMessage, SuccessMessage};

    #[test]
    fn test_encode_decode_value() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        let value = Value::String("Hello, Bolt!".to_string());
        codec.encode(value.clone(), &mut buf).unwrap();

        // Chunk header + payload + end marker.
        assert!(buf.len() > 4);
        assert_eq!(&buf[buf.len() - 2..], &END_MARKER);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.as_str().unwrap(), "Hello, Bolt!");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_chunked_large_message() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        // Larger than two full chunks.
        let large = "x".repeat(MAX_CHUNK_SIZE * 2 + 100);
        codec.encode(Value::String(large.clone()), &mut buf).unwrap();

        // First chunk header announces a full chunk.
        assert_eq!(u16::from_be_bytes([buf[0], buf[1]]) as usize, MAX_CHUNK_SIZE);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.as_str().unwrap(), large);
    }

    #[test]
    fn test_incremental_prefixes_need_more() {
        let mut encoder = BoltCodec::new();
        let mut full = BytesMut::new();
        encoder
            .encode(Value::String("prefix-test".to_string()), &mut full)
            .unwrap();

        // Every strict prefix decodes to None; the full sequence decodes to
        // exactly one message.
        for end in 0..full.len() {
            let mut codec = BoltCodec::new();
            let mut partial = BytesMut::from(&full[..end]);
            assert!(
                codec.decode(&mut partial).unwrap().is_none(),
                "prefix of {} bytes",
                end
            );
        }

        let mut codec = BoltCodec::new();
        let mut complete = full.clone();
        let decoded = codec.decode(&mut complete).unwrap().unwrap();
        assert_eq!(decoded.as_str().unwrap(), "prefix-test");
        assert!(codec.decode(&mut complete).unwrap().is_none());
    }

    #[test]
    fn test_message_too_large() {
        let mut codec = BoltCodec::with_max_size(100);
        let mut buf = BytesMut::new();

        buf.put_u16(200);
        buf.extend_from_slice(&[0u8; 200]);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(BoltError::MessageTooLarge { .. })));
    }

    #[test]
    fn test_noop_skipped() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        // Two NOOPs, then a real message.
        buf.put_slice(&END_MARKER);
        buf.put_slice(&END_MARKER);

        let encoded = encode(&Value::Boolean(true)).unwrap();
        buf.put_u16(encoded.len() as u16);
        buf.put_slice(&encoded);
        buf.put_slice(&END_MARKER);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.as_bool(), Some(true));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        // One message body carrying two values.
        let mut payload = encode(&Value::Integer(1)).unwrap();
        payload.extend_from_slice(&encode(&Value::Integer(2)).unwrap());
        buf.put_u16(payload.len() as u16);
        buf.put_slice(&payload);
        buf.put_slice(&END_MARKER);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, BoltError::Protocol(msg) if msg.contains("trailing")));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        // INT_16 marker with no payload, then the terminator: the message is
        // complete on the framing level but its body is truncated.
        buf.put_u16(1);
        buf.put_u8(0xC9);
        buf.put_slice(&END_MARKER);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, BoltError::Protocol(msg) if msg.contains("truncated")));
    }

    #[test]
    fn test_multiple_messages() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        codec.encode(Value::Integer(1), &mut buf).unwrap();
        codec.encode(Value::Integer(2), &mut buf).unwrap();
        codec.encode(Value::Integer(3), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().as_int(), Some(1));
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().as_int(), Some(2));
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().as_int(), Some(3));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_message_codec_roundtrip() {
        let mut codec = BoltMessageCodec::new();
        let mut buf = BytesMut::new();

        let request = BoltRequest::Run(RunMessage::new("RETURN 1"));
        codec.encode(&request, &mut buf).unwrap();

        // The client never decodes requests; verify the bytes carry one
        // chunked structure by decoding at the value level.
        let mut value_codec = BoltCodec::new();
        let value = value_codec.decode(&mut buf).unwrap().unwrap();
        match value {
            Value::Structure(s) => assert_eq!(s.signature, 0x10),
            other => panic!("expected structure, got {:?}", other),
        }
    }

    #[test]
    fn test_message_codec_decodes_response() {
        let mut value_codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        let success = SuccessMessage::hello_success("Neo4j/5.13.0", "bolt-7");
        value_codec
            .encode(Value::Structure(success.to_structure()), &mut buf)
            .unwrap();

        let mut codec = BoltMessageCodec::new();
        let response = codec.decode(&mut buf).unwrap().unwrap();
        assert!(response.is_success());
    }

    #[test]
    fn test_coalesced_messages_decode_from_one_buffer() {
        // RECORD and terminal SUCCESS arriving in a single segment.
        let mut value_codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        let record = crate::bolt::message::RecordMessage::new(vec![Value::Integer(1)]);
        value_codec
            .encode(Value::Structure(record.to_structure()), &mut buf)
            .unwrap();
        let success = SuccessMessage::streaming_success(false);
        value_codec
            .encode(Value::Structure(success.to_structure()), &mut buf)
            .unwrap();

        let mut codec = BoltMessageCodec::new();
        assert!(codec.decode(&mut buf).unwrap().unwrap().is_record());
        assert!(codec.decode(&mut buf).unwrap().unwrap().is_success());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
