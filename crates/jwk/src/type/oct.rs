use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{Base64urlUInt, Error};

/// Parameters of a symmetric (octet sequence) key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq, Zeroize)]
pub struct OctParams {
    #[serde(rename = "k")]
    pub key_value: Base64urlUInt,
}

impl OctParams {
    /// Generate `bits` of fresh key material from the system CSRNG.
    /// `bits` must be a positive multiple of 8.
    pub fn generate(bits: usize) -> Result<Self, Error> {
        if bits == 0 || bits % 8 != 0 {
            return Err(Error::InvalidKeyLength(bits));
        }
        let mut buffer = vec![0u8; bits / 8];
        OsRng.fill_bytes(&mut buffer);
        Ok(Self {
            key_value: Base64urlUInt(buffer),
        })
    }

    /// Copy the caller's key material.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.is_empty() {
            return Err(Error::InvalidKeyLength(0));
        }
        Ok(Self {
            key_value: Base64urlUInt(data.to_vec()),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key_value.0
    }

    pub fn keysize_bits(&self) -> usize {
        self.key_value.0.len() * 8
    }
}

impl Drop for OctParams {
    fn drop(&mut self) {
        self.key_value.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_sizes() {
        let params = OctParams::generate(256).unwrap();
        assert_eq!(params.as_bytes().len(), 32);
        assert_eq!(params.keysize_bits(), 256);
    }

    #[test]
    fn rejects_non_octet_sizes() {
        assert!(matches!(
            OctParams::generate(0),
            Err(Error::InvalidKeyLength(0))
        ));
        assert!(matches!(
            OctParams::generate(12),
            Err(Error::InvalidKeyLength(12))
        ));
    }

    #[test]
    fn from_bytes_copies() {
        let data = [1u8, 2, 3, 4];
        let params = OctParams::from_bytes(&data).unwrap();
        assert_eq!(params.as_bytes(), &data);
        assert_eq!(params.keysize_bits(), 32);
        assert!(matches!(
            OctParams::from_bytes(&[]),
            Err(Error::InvalidKeyLength(0))
        ));
    }
}
