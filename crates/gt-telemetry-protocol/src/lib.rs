//! Gran Turismo telemetry protocol: Salsa20 packet cipher and fixed-offset decoder.
//!
//! This crate is intentionally I/O-free. It turns one encrypted datagram into
//! deciphered bytes ([`cipher`]) and deciphered bytes into a typed
//! [`Snapshot`] ([`decoder`]), so both halves can be tested and fuzzed without
//! a console on the network.
//!
//! # Protocol overview
//!
//! The console broadcasts one Salsa20-encrypted datagram per simulation tick
//! (~60 Hz) to any host that has recently sent a heartbeat. Three packet
//! generations exist, selected by the heartbeat byte and told apart on the
//! wire purely by length:
//!
//! | Format | Heartbeat | IV seed | Length |
//! |---|---|---|---|
//! | [`TelemetryFormat::Standard`] | `A` | `0xDEADBEAF` | 296 |
//! | [`TelemetryFormat::Addendum1`] | `B` | `0xDEADBEEF` | 316 |
//! | [`TelemetryFormat::Addendum2`] | `~` | `0x55FABB4F` | 344 |
//!
//! # Example
//!
//! ```
//! use gt_telemetry_protocol::{TelemetryFormat, cipher, decode, offsets, MAGIC};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut plain = vec![0u8; TelemetryFormat::Standard.packet_len()];
//! plain[..4].copy_from_slice(&MAGIC.to_le_bytes());
//! plain[offsets::ENGINE_RPM..offsets::ENGINE_RPM + 4].copy_from_slice(&6500.0f32.to_le_bytes());
//!
//! let wire = cipher::encode(TelemetryFormat::Standard.iv_seed(), 0x1234_5678, &plain)?;
//! let frame = cipher::decode(TelemetryFormat::Standard.iv_seed(), &wire)?;
//! let snapshot = decode(&frame)?;
//! assert_eq!(snapshot.engine_rpm, 6500.0);
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]

pub mod cipher;
pub mod decoder;
pub mod error;
pub mod format;
pub mod snapshot;

pub use decoder::{decode, offsets};
pub use error::{CipherError, DecodeError, PacketError};
pub use format::TelemetryFormat;
pub use snapshot::{
    CornerSet, Flags, Rotation, SectionB, SectionTilde, Snapshot, Transmission, Translation,
    Vector3,
};

/// Magic word at bytes 0..4 of every deciphered frame, read little-endian.
pub const MAGIC: u32 = 0x4737_5330;

/// The magic word in on-wire byte order (`"0S7G"`).
pub const MAGIC_BYTES: [u8; 4] = MAGIC.to_le_bytes();

/// Decipher a datagram and decode it in one step.
///
/// # Errors
///
/// Returns [`PacketError::Cipher`] when the datagram cannot be deciphered and
/// [`PacketError::Decode`] when the deciphered frame is malformed.
pub fn decipher_and_decode(
    format: TelemetryFormat,
    datagram: &[u8],
) -> Result<Snapshot, PacketError> {
    let frame = cipher::decode(format.iv_seed(), datagram)?;
    Ok(decode(&frame)?)
}
