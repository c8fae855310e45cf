//! Bolt protocol version definitions.

use std::fmt;

/// Supported Bolt protocol versions.
///
/// A version proposal occupies 4 bytes on the wire, laid out as
/// `00 00 minor major`. Some servers reply with the historical layout
/// `minor 00 00 major` instead; both are accepted on receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoltVersion {
    /// Bolt 5.1 - split HELLO/LOGON authentication
    V5_1,
    /// Bolt 5.2 - notification filtering
    V5_2,
    /// Bolt 5.3 - bolt_agent in HELLO
    V5_3,
    /// Bolt 5.4 - telemetry
    V5_4,
}

impl BoltVersion {
    /// All supported versions in preference order (newest first).
    pub const ALL: [BoltVersion; 4] = [
        BoltVersion::V5_4,
        BoltVersion::V5_3,
        BoltVersion::V5_2,
        BoltVersion::V5_1,
    ];

    /// Get the major version number.
    pub fn major(self) -> u8 {
        5
    }

    /// Get the minor version number.
    pub fn minor(self) -> u8 {
        match self {
            BoltVersion::V5_1 => 1,
            BoltVersion::V5_2 => 2,
            BoltVersion::V5_3 => 3,
            BoltVersion::V5_4 => 4,
        }
    }

    /// Build from (major, minor), if supported.
    pub fn from_parts(major: u8, minor: u8) -> Option<Self> {
        match (major, minor) {
            (5, 1) => Some(BoltVersion::V5_1),
            (5, 2) => Some(BoltVersion::V5_2),
            (5, 3) => Some(BoltVersion::V5_3),
            (5, 4) => Some(BoltVersion::V5_4),
            _ => None,
        }
    }

    /// Encode as a 4-byte proposal: `00 00 minor major`.
    pub fn to_proposal(self) -> [u8; 4] {
        [0, 0, self.minor(), self.major()]
    }

    /// Parse a server reply, accepting both `00 00 minor major` and the
    /// historical `minor 00 00 major` layouts.
    pub fn from_reply(bytes: [u8; 4]) -> Option<Self> {
        if bytes[0] == 0 && bytes[1] == 0 {
            if let Some(v) = Self::from_parts(bytes[3], bytes[2]) {
                return Some(v);
            }
        }
        if bytes[1] == 0 && bytes[2] == 0 {
            return Self::from_parts(bytes[3], bytes[0]);
        }
        None
    }

    /// Whether HELLO should carry the `bolt_agent` map.
    pub fn supports_bolt_agent(self) -> bool {
        self >= BoltVersion::V5_3
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_minor() {
        assert_eq!(BoltVersion::V5_1.major(), 5);
        assert_eq!(BoltVersion::V5_1.minor(), 1);
        assert_eq!(BoltVersion::V5_4.minor(), 4);
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(BoltVersion::from_parts(5, 1), Some(BoltVersion::V5_1));
        assert_eq!(BoltVersion::from_parts(5, 4), Some(BoltVersion::V5_4));
        assert_eq!(BoltVersion::from_parts(5, 0), None);
        assert_eq!(BoltVersion::from_parts(5, 5), None);
        assert_eq!(BoltVersion::from_parts(4, 4), None);
        assert_eq!(BoltVersion::from_parts(0, 0), None);
    }

    #[test]
    fn test_proposal_layout() {
        assert_eq!(BoltVersion::V5_4.to_proposal(), [0x00, 0x00, 0x04, 0x05]);
        assert_eq!(BoltVersion::V5_1.to_proposal(), [0x00, 0x00, 0x01, 0x05]);
    }

    #[test]
    fn test_reply_both_byte_orders() {
        for v in BoltVersion::ALL {
            // 00 00 minor major
            assert_eq!(
                BoltVersion::from_reply([0, 0, v.minor(), v.major()]),
                Some(v)
            );
            // minor 00 00 major
            assert_eq!(
                BoltVersion::from_reply([v.minor(), 0, 0, v.major()]),
                Some(v)
            );
        }
    }

    #[test]
    fn test_reply_rejections() {
        assert_eq!(BoltVersion::from_reply([0, 0, 0, 0]), None);
        assert_eq!(BoltVersion::from_reply([0, 0, 0, 4]), None); // 4.0
        assert_eq!(BoltVersion::from_reply([0, 0, 5, 5]), None); // 5.5
        assert_eq!(BoltVersion::from_reply([1, 2, 3, 4]), None); // garbage
    }

    #[test]
    fn test_ordering_and_preference() {
        assert!(BoltVersion::V5_4 > BoltVersion::V5_1);
        assert_eq!(BoltVersion::ALL[0], BoltVersion::V5_4);
        assert_eq!(BoltVersion::ALL[3], BoltVersion::V5_1);
    }

    #[test]
    fn test_supports_bolt_agent() {
        assert!(!BoltVersion::V5_1.supports_bolt_agent());
        assert!(!BoltVersion::V5_2.supports_bolt_agent());
        assert!(BoltVersion::V5_3.supports_bolt_agent());
        assert!(BoltVersion::V5_4.supports_bolt_agent());
    }

    #[test]
    fn test_display() {
        assert_eq!(BoltVersion::V5_1.to_string(), "5.1");
        assert_eq!(BoltVersion::V5_4.to_string(), "5.4");
    }
}
