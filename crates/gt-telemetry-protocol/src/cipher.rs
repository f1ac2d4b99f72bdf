//! Salsa20 packet cipher.
//!
//! Each datagram is enciphered with Salsa20/20 under a fixed key. The 8-byte
//! nonce comes from the packet itself: the little-endian word at `0x40` is the
//! IV, and the nonce is `[IV ^ seed, IV]` where the seed depends on the
//! [`TelemetryFormat`](crate::TelemetryFormat).
//!
//! The IV bytes are read from the ciphertext before the keystream is applied,
//! so the plaintext word at `0x40` is meaningless and the decoder skips it.

use salsa20::Salsa20;
use salsa20::cipher::{KeyIvInit, StreamCipher};

use crate::MAGIC;
use crate::error::CipherError;

/// Key phrase; the cipher uses its first 32 bytes.
pub const KEY_PHRASE: &[u8; 38] = b"Simulator Interface Packet GT7 ver 0.0";

/// Shortest datagram accepted before any other check.
pub const MIN_CIPHERTEXT_LEN: usize = 32;

/// Offset of the packet-local IV.
pub const IV_OFFSET: usize = 0x40;

const IV_END: usize = IV_OFFSET + 4;

fn key() -> [u8; 32] {
    let mut key = [0u8; 32];
    for (dst, src) in key.iter_mut().zip(KEY_PHRASE.iter()) {
        *dst = *src;
    }
    key
}

fn nonce(iv: u32, iv_seed: u32) -> [u8; 8] {
    let mut nonce = [0u8; 8];
    let (lo, hi) = nonce.split_at_mut(4);
    lo.copy_from_slice(&(iv ^ iv_seed).to_le_bytes());
    hi.copy_from_slice(&iv.to_le_bytes());
    nonce
}

fn read_iv(data: &[u8]) -> Result<u32, CipherError> {
    data.get(IV_OFFSET..IV_END)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(CipherError::ShortData {
            len: data.len(),
            min: IV_END,
        })
}

fn apply_keystream(iv: u32, iv_seed: u32, buf: &mut [u8]) {
    let mut cipher = Salsa20::new(&key().into(), &nonce(iv, iv_seed).into());
    cipher.apply_keystream(buf);
}

/// Decipher one datagram and verify its magic word.
///
/// Returns the deciphered bytes, magic header included. The input is not
/// modified.
///
/// # Errors
///
/// - [`CipherError::ShortData`] when the datagram is shorter than
///   [`MIN_CIPHERTEXT_LEN`] or too short to carry the IV.
/// - [`CipherError::InvalidMagic`] when the deciphered header is not
///   [`MAGIC`].
pub fn decode(iv_seed: u32, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    if ciphertext.len() < MIN_CIPHERTEXT_LEN {
        return Err(CipherError::ShortData {
            len: ciphertext.len(),
            min: MIN_CIPHERTEXT_LEN,
        });
    }
    let iv = read_iv(ciphertext)?;

    let mut plain = ciphertext.to_vec();
    apply_keystream(iv, iv_seed, &mut plain);

    let found = plain
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .unwrap_or_default();
    if found != MAGIC {
        return Err(CipherError::InvalidMagic { found });
    }
    Ok(plain)
}

/// Encipher a plaintext frame the way the console does.
///
/// The keystream is derived from `iv`, and `iv` is then written in clear at
/// [`IV_OFFSET`] so that [`decode`] can recover it. Deciphering the result
/// reproduces `plaintext` everywhere except the four IV bytes.
///
/// # Errors
///
/// Returns [`CipherError::ShortData`] when the plaintext cannot hold the IV.
pub fn encode(iv_seed: u32, iv: u32, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    if plaintext.len() < IV_END {
        return Err(CipherError::ShortData {
            len: plaintext.len(),
            min: IV_END,
        });
    }
    let mut wire = plaintext.to_vec();
    apply_keystream(iv, iv_seed, &mut wire);
    if let Some(slot) = wire.get_mut(IV_OFFSET..IV_END) {
        slot.copy_from_slice(&iv.to_le_bytes());
    }
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryFormat;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn plain_frame(len: usize) -> Vec<u8> {
        let mut buf: Vec<u8> = (0..len).map(|i| (i & 0xFF) as u8).collect();
        buf[..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf
    }

    #[test]
    fn test_key_is_first_32_bytes_of_phrase() {
        assert_eq!(&key(), b"Simulator Interface Packet GT7 v");
    }

    #[test]
    fn test_nonce_layout() {
        let n = nonce(0x1122_3344, 0xDEAD_BEAF);
        assert_eq!(&n[..4], &(0x1122_3344u32 ^ 0xDEAD_BEAF).to_le_bytes());
        assert_eq!(&n[4..], &0x1122_3344u32.to_le_bytes());
    }

    #[test]
    fn test_short_data_rejected() {
        assert_eq!(
            decode(0, &[0u8; 31]),
            Err(CipherError::ShortData { len: 31, min: 32 })
        );
        assert_eq!(
            decode(0, &[0u8; 40]),
            Err(CipherError::ShortData { len: 40, min: 0x44 })
        );
    }

    #[test]
    fn test_round_trip_all_formats() -> TestResult {
        for format in TelemetryFormat::ALL {
            let plain = plain_frame(format.packet_len());
            let wire = encode(format.iv_seed(), 0xCAFE_F00D, &plain)?;
            assert_ne!(wire, plain, "ciphertext must differ from plaintext");
            assert_eq!(&wire[IV_OFFSET..IV_END], &0xCAFE_F00Du32.to_le_bytes());

            let decoded = decode(format.iv_seed(), &wire)?;
            assert_eq!(decoded.len(), plain.len());
            assert_eq!(&decoded[..IV_OFFSET], &plain[..IV_OFFSET]);
            assert_eq!(&decoded[IV_END..], &plain[IV_END..]);
        }
        Ok(())
    }

    #[test]
    fn test_wrong_seed_fails_magic() -> TestResult {
        let plain = plain_frame(296);
        let wire = encode(TelemetryFormat::Standard.iv_seed(), 7, &plain)?;
        let result = decode(TelemetryFormat::Addendum1.iv_seed(), &wire);
        assert!(matches!(result, Err(CipherError::InvalidMagic { .. })));
        Ok(())
    }

    #[test]
    fn test_decode_does_not_touch_input() -> TestResult {
        let plain = plain_frame(344);
        let wire = encode(TelemetryFormat::Addendum2.iv_seed(), 99, &plain)?;
        let before = wire.clone();
        let _frame = decode(TelemetryFormat::Addendum2.iv_seed(), &wire)?;
        assert_eq!(wire, before);
        Ok(())
    }
}
