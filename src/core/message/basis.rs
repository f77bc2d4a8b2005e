/*!
Basis sequences and their encrypted wire form.

Bases are packed one bit each, most significant bit first, and hidden
behind a cyclic XOR keystream taken directly from the KEM shared secret.
The keystream gives secrecy only; there is no authentication tag.
*/

use std::fmt;

use rand::Rng;

use crate::core::error::{Error, Result};

/// Encoding/measurement reference frame for one qubit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Basis {
    /// Z basis, packed as 0
    Rectilinear,
    /// X basis, packed as 1
    Diagonal,
}

impl Basis {
    /// Draw a basis uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }

    fn as_bit(self) -> u8 {
        match self {
            Basis::Rectilinear => 0,
            Basis::Diagonal => 1,
        }
    }

    fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Rectilinear => write!(f, "Z"),
            Basis::Diagonal => write!(f, "X"),
        }
    }
}

/// Packs, unpacks and encrypts basis sequences
pub struct BasisCodec;

impl BasisCodec {
    /// Number of bytes needed to carry `bit_count` bases
    pub fn packed_len(bit_count: usize) -> usize {
        bit_count.div_ceil(8)
    }

    /// Pack bases 8 per byte, MSB first, zero-padding the final byte
    pub fn pack(bases: &[Basis]) -> Vec<u8> {
        let mut out = vec![0u8; Self::packed_len(bases.len())];
        for (i, basis) in bases.iter().enumerate() {
            out[i / 8] |= basis.as_bit() << (7 - (i % 8));
        }
        out
    }

    /// Inverse of [`BasisCodec::pack`], truncated to `bit_count`
    pub fn unpack(bytes: &[u8], bit_count: usize) -> Result<Vec<Basis>> {
        let needed = Self::packed_len(bit_count);
        if bytes.len() < needed {
            return Err(Error::Codec(format!(
                "{} bases need {} bytes, got {}",
                bit_count,
                needed,
                bytes.len()
            )));
        }
        Ok((0..bit_count)
            .map(|i| Basis::from_bit(bytes[i / 8] >> (7 - (i % 8))))
            .collect())
    }

    /// XOR `data` with `secret` repeated cyclically.
    ///
    /// Applying it twice with the same secret returns the original data.
    pub fn apply_keystream(data: &[u8], secret: &[u8]) -> Result<Vec<u8>> {
        if secret.is_empty() {
            return Err(Error::Codec("keystream secret is empty".to_string()));
        }
        Ok(data
            .iter()
            .zip(secret.iter().cycle())
            .map(|(d, k)| d ^ k)
            .collect())
    }

    /// Pack then encrypt
    pub fn seal(bases: &[Basis], secret: &[u8]) -> Result<Vec<u8>> {
        Self::apply_keystream(&Self::pack(bases), secret)
    }

    /// Decrypt then unpack
    pub fn open(sealed: &[u8], secret: &[u8], bit_count: usize) -> Result<Vec<Basis>> {
        Self::unpack(&Self::apply_keystream(sealed, secret)?, bit_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Basis::{Diagonal as X, Rectilinear as Z};

    #[test]
    fn test_pack_msb_first() {
        assert_eq!(BasisCodec::pack(&[X, Z, Z, Z, Z, Z, Z, X]), vec![0b1000_0001]);
        assert_eq!(BasisCodec::pack(&[X, X, Z]), vec![0b1100_0000]);
        assert_eq!(BasisCodec::pack(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_pack_pads_final_byte() {
        let bases = vec![X; 9];
        assert_eq!(BasisCodec::pack(&bases), vec![0xFF, 0x80]);
    }

    #[test]
    fn test_unpack_truncates() -> Result<()> {
        let bases = BasisCodec::unpack(&[0b1010_0000, 0xFF], 3)?;
        assert_eq!(bases, vec![X, Z, X]);
        Ok(())
    }

    #[test]
    fn test_unpack_short_input() {
        assert!(matches!(BasisCodec::unpack(&[0u8], 9), Err(Error::Codec(_))));
    }

    #[test]
    fn test_keystream_cycles_secret() -> Result<()> {
        let out = BasisCodec::apply_keystream(&[0x00, 0x00, 0x00, 0xFF], &[0x0F, 0xF0])?;
        assert_eq!(out, vec![0x0F, 0xF0, 0x0F, 0x0F]);
        Ok(())
    }

    #[test]
    fn test_keystream_rejects_empty_secret() {
        assert!(BasisCodec::apply_keystream(&[1, 2, 3], &[]).is_err());
    }

    #[test]
    fn test_seal_open() -> Result<()> {
        let bases = vec![Z, X, X, Z, X, Z, Z, X, X, X, Z];
        let secret = [0x5Au8; 32];
        let sealed = BasisCodec::seal(&bases, &secret)?;
        assert_ne!(sealed, BasisCodec::pack(&bases));
        assert_eq!(BasisCodec::open(&sealed, &secret, bases.len())?, bases);
        Ok(())
    }
}
