//! Verdicts travel as one newline terminated token, `ACK\n` or `NAK\n`. Payloads carry no
//! framing at all, the client never sends the next payload before the verdict on the previous
//! one arrived.

#[cfg(feature = "tokio-rt")]
mod tokio;

#[cfg(feature = "tokio-rt")]
pub(crate) use self::tokio::ProbeCodec;
use crate::errors::CodecError;
use crate::Verdict;

/// Longest line the client buffers while waiting for a line feed.
pub(crate) const MAX_TOKEN_LEN: usize = 16;

impl Verdict {
    /// The token written on the wire, including the line feed.
    pub(crate) fn token(&self) -> &'static [u8] {
        match self {
            Verdict::Accept => b"ACK\n",
            Verdict::Reject => b"NAK\n",
        }
    }
}

/// Parse one line without its line feed.
pub(crate) fn parse_token(line: &[u8]) -> Result<Verdict, CodecError> {
    match line {
        b"ACK" => Ok(Verdict::Accept),
        b"NAK" => Ok(Verdict::Reject),
        other => Err(CodecError::UnexpectedToken(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token(b"ACK").unwrap(), Verdict::Accept);
        assert_eq!(parse_token(b"NAK").unwrap(), Verdict::Reject);
        assert!(matches!(
            parse_token(b"ACK\r"),
            Err(CodecError::UnexpectedToken(token)) if token == "ACK\r"
        ));
        assert!(parse_token(b"ack").is_err());
        assert!(parse_token(b"").is_err());
    }

    #[test]
    fn test_token() {
        for verdict in [Verdict::Accept, Verdict::Reject] {
            let token = verdict.token();
            assert_eq!(token.last(), Some(&b'\n'));
            assert_eq!(parse_token(&token[..token.len() - 1]).unwrap(), verdict);
        }
    }
}
