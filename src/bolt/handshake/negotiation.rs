//! Client-side handshake negotiation.
//!
//! After the TCP connect the client writes the 4-byte magic followed by four
//! 4-byte version proposals (preference order, unused slots zero). The server
//! answers with exactly 4 bytes naming the agreed version, or all zeros when
//! there is no overlap.

use super::{BoltVersion, HandshakeError, BOLT_MAGIC, HANDSHAKE_SIZE};

/// Build the 20-byte client handshake for the given proposals.
///
/// At most four versions are proposed; remaining slots stay zero.
pub fn build_handshake(versions: &[BoltVersion]) -> [u8; HANDSHAKE_SIZE] {
    let mut data = [0u8; HANDSHAKE_SIZE];
    data[0..4].copy_from_slice(&BOLT_MAGIC);

    for (i, version) in versions.iter().take(4).enumerate() {
        let offset = 4 + i * 4;
        data[offset..offset + 4].copy_from_slice(&version.to_proposal());
    }

    data
}

/// Interpret the server's 4-byte handshake reply.
///
/// All zeros means the server supports none of the proposals. Anything else
/// must parse (under either accepted byte order) to a version we proposed.
pub fn parse_reply(reply: [u8; 4]) -> Result<BoltVersion, HandshakeError> {
    if reply == [0, 0, 0, 0] {
        return Err(HandshakeError::VersionNegotiationFailed);
    }

    BoltVersion::from_reply(reply).ok_or(HandshakeError::UnexpectedReply(reply))
}
