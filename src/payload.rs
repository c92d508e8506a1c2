use bytes::{Bytes, BytesMut};
use rand::Rng;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Filler content for probes.
///
/// The content never matters to the oracle, only its length. Growing appends random letters
/// and shrinking slices the existing content, so a window keeps the prefix it already sent.
#[derive(Debug, Default)]
pub(crate) struct Payload {
    content: Bytes,
}

impl Payload {
    /// Take a payload of exactly `len` bytes.
    pub(crate) fn take(&mut self, len: usize) -> Bytes {
        if len > self.content.len() {
            let mut grown = BytesMut::with_capacity(len);
            grown.extend_from_slice(&self.content);
            let mut rng = rand::thread_rng();
            grown.extend(
                (self.content.len()..len).map(|_| LETTERS[rng.gen_range(0..LETTERS.len())]),
            );
            self.content = grown.freeze();
        }
        self.content.slice(..len)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_payload_length_and_prefix() {
        let mut payload = Payload::default();
        let first = payload.take(8);
        assert_eq!(first.len(), 8);
        assert!(first.iter().all(|b| b.is_ascii_alphabetic()));

        let grown = payload.take(32);
        assert_eq!(grown.len(), 32);
        assert_eq!(&grown[..8], &first[..]);

        let shrunk = payload.take(5);
        assert_eq!(&shrunk[..], &first[..5]);
        assert!(payload.take(0).is_empty());
    }
}
