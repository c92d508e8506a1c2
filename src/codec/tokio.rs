use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::{parse_token, MAX_TOKEN_LEN};
use crate::errors::CodecError;
use crate::Verdict;

/// The probe codec, raw payloads out and verdict tokens in
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ProbeCodec;

impl Encoder<Bytes> for ProbeCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl Decoder for ProbeCodec {
    type Error = CodecError;
    type Item = Verdict;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(pos) = src.iter().position(|b| *b == b'\n') else {
            if src.len() > MAX_TOKEN_LEN {
                return Err(CodecError::TokenTooLong(MAX_TOKEN_LEN));
            }
            return Ok(None);
        };
        let line = src.split_to(pos + 1);
        parse_token(&line[..pos]).map(Some)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(verdict) = self.decode(buf)? {
            return Ok(Some(verdict));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let rest = buf.split();
        Err(CodecError::Truncated(
            String::from_utf8_lossy(&rest).into_owned(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_split_tokens() {
        let mut codec = ProbeCodec;
        let mut buf = BytesMut::from(&b"AC"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"K\nNAK\nA");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Verdict::Accept));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Verdict::Reject));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"A");
    }

    #[test]
    fn test_decode_violations() {
        let mut codec = ProbeCodec;
        let mut buf = BytesMut::from(&b"HELLO\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::UnexpectedToken(token)) if token == "HELLO"
        ));

        let mut buf = BytesMut::from(&[b'x'; MAX_TOKEN_LEN + 1][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::TokenTooLong(MAX_TOKEN_LEN))
        ));

        let mut buf = BytesMut::from(&b"NA"[..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(CodecError::Truncated(token)) if token == "NA"
        ));
        assert_eq!(codec.decode_eof(&mut BytesMut::new()).unwrap(), None);
    }

    #[test]
    fn test_encode_payload() {
        let mut codec = ProbeCodec;
        let mut dst = BytesMut::new();
        codec
            .encode(Bytes::from_static(b"abcd"), &mut dst)
            .unwrap();
        codec.encode(Bytes::from_static(b"ef"), &mut dst).unwrap();
        assert_eq!(&dst[..], b"abcdef");
    }
}
