//! Protocol error types.

use thiserror::Error;

/// Failure to decipher one datagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The datagram is too short to carry the header or the IV.
    #[error("short data: got {len} bytes, need at least {min}")]
    ShortData {
        /// Bytes received
        len: usize,
        /// Bytes required
        min: usize,
    },

    /// The deciphered header does not carry the expected magic word.
    #[error("invalid magic after decipher: 0x{found:08X}")]
    InvalidMagic {
        /// Little-endian word found at bytes 0..4
        found: u32,
    },
}

/// Failure to decode a deciphered frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Header magic mismatch.
    #[error("bad magic: expected 0x{expected:08X}, got 0x{found:08X}")]
    BadMagic {
        /// Expected magic word
        expected: u32,
        /// Word found at bytes 0..4
        found: u32,
    },

    /// Frame shorter than a standard packet.
    #[error("short packet: got {len} bytes, need at least {min}")]
    ShortPacket {
        /// Bytes received
        len: usize,
        /// Bytes required
        min: usize,
    },

    /// A field runs past the end of the frame.
    #[error("unexpected end of frame reading {field} at offset 0x{offset:X} (frame is {len} bytes)")]
    UnexpectedEof {
        /// Field being read
        field: &'static str,
        /// Offset of the field
        offset: usize,
        /// Frame length
        len: usize,
    },
}

/// Either half of the decipher-then-decode pipeline failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Decipher failure
    #[error("decipher failed: {0}")]
    Cipher(#[from] CipherError),

    /// Decode failure
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_error_display() {
        insta::assert_snapshot!(
            CipherError::InvalidMagic { found: 0 }.to_string(),
            @"invalid magic after decipher: 0x00000000"
        );
        insta::assert_snapshot!(
            CipherError::ShortData { len: 10, min: 32 }.to_string(),
            @"short data: got 10 bytes, need at least 32"
        );
    }

    #[test]
    fn test_decode_error_display() {
        insta::assert_snapshot!(
            DecodeError::BadMagic { expected: crate::MAGIC, found: 0 }.to_string(),
            @"bad magic: expected 0x47375330, got 0x00000000"
        );
        insta::assert_snapshot!(
            DecodeError::UnexpectedEof { field: "energy_recovery", offset: 0x150, len: 330 }.to_string(),
            @"unexpected end of frame reading energy_recovery at offset 0x150 (frame is 330 bytes)"
        );
    }

    #[test]
    fn test_packet_error_wraps_sources() {
        let err: PacketError = DecodeError::ShortPacket { len: 4, min: 296 }.into();
        assert!(matches!(err, PacketError::Decode(DecodeError::ShortPacket { .. })));
        let err: PacketError = CipherError::ShortData { len: 1, min: 32 }.into();
        assert!(matches!(err, PacketError::Cipher(_)));
    }
}
