//! Content encryption: the AES-GCM family (RFC 7518 §5.3).

use core::fmt;
use std::str::FromStr;

use aes::cipher::consts::U12;
use aes::Aes192;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{AeadInPlace, Aes128Gcm, Aes256Gcm, AesGcm, KeyInit};

use crate::Error;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AEAD used to encrypt the plaintext under the CEK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncryptionAlgorithm {
    /// AES GCM using a 128-bit key
    A128Gcm,
    /// AES GCM using a 192-bit key
    A192Gcm,
    /// AES GCM using a 256-bit key
    A256Gcm,
}

impl ContentEncryptionAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    /// Required CEK length in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A256Gcm => 32,
        }
    }

    /// Initialization vector length in bytes (96 bits for GCM).
    pub const fn iv_size(self) -> usize {
        12
    }

    /// Authentication tag length in bytes (128 bits for GCM).
    pub const fn tag_size(self) -> usize {
        16
    }
}

impl fmt::Display for ContentEncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentEncryptionAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A128GCM" => Ok(Self::A128Gcm),
            "A192GCM" => Ok(Self::A192Gcm),
            "A256GCM" => Ok(Self::A256Gcm),
            other => Err(Error::UnknownEncryption(other.to_string())),
        }
    }
}

/// Encrypt `plaintext` in one shot, returning `(ciphertext, tag)`.
pub(crate) fn seal(
    enc: ContentEncryptionAlgorithm,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    if cek.len() != enc.key_size() {
        return Err(Error::CekLength {
            expected: enc.key_size(),
            actual: cek.len(),
        });
    }
    if iv.len() != enc.iv_size() {
        return Err(Error::IvLength {
            expected: enc.iv_size(),
            actual: iv.len(),
        });
    }
    match enc {
        ContentEncryptionAlgorithm::A128Gcm => seal_with::<Aes128Gcm>(cek, iv, aad, plaintext),
        ContentEncryptionAlgorithm::A192Gcm => seal_with::<Aes192Gcm>(cek, iv, aad, plaintext),
        ContentEncryptionAlgorithm::A256Gcm => seal_with::<Aes256Gcm>(cek, iv, aad, plaintext),
    }
}

/// Decrypt and authenticate in one shot. Every backend failure is the
/// opaque [`Error::Crypto`].
pub(crate) fn open(
    enc: ContentEncryptionAlgorithm,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, Error> {
    if cek.len() != enc.key_size() || iv.len() != enc.iv_size() || tag.len() != enc.tag_size() {
        return Err(Error::Crypto);
    }
    match enc {
        ContentEncryptionAlgorithm::A128Gcm => open_with::<Aes128Gcm>(cek, iv, aad, ciphertext, tag),
        ContentEncryptionAlgorithm::A192Gcm => open_with::<Aes192Gcm>(cek, iv, aad, ciphertext, tag),
        ContentEncryptionAlgorithm::A256Gcm => open_with::<Aes256Gcm>(cek, iv, aad, ciphertext, tag),
    }
}

fn seal_with<A: AeadInPlace + KeyInit>(
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let cipher = A::new_from_slice(cek).map_err(|_| Error::Crypto)?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(iv), aad, &mut buffer)
        .map_err(|_| Error::Crypto)?;
    Ok((buffer, tag.to_vec()))
}

fn open_with<A: AeadInPlace + KeyInit>(
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, Error> {
    let cipher = A::new_from_slice(cek).map_err(|_| Error::Crypto)?;
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(iv),
            aad,
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| Error::Crypto)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        for enc in [
            ContentEncryptionAlgorithm::A128Gcm,
            ContentEncryptionAlgorithm::A192Gcm,
            ContentEncryptionAlgorithm::A256Gcm,
        ] {
            let cek = vec![0x42u8; enc.key_size()];
            let iv = vec![0x24u8; enc.iv_size()];
            let (ciphertext, tag) = seal(enc, &cek, &iv, b"aad", b"plaintext").unwrap();
            assert_eq!(ciphertext.len(), b"plaintext".len());
            assert_eq!(tag.len(), enc.tag_size());
            let plaintext = open(enc, &cek, &iv, b"aad", &ciphertext, &tag).unwrap();
            assert_eq!(plaintext, b"plaintext");
        }
    }

    #[test]
    fn open_rejects_wrong_aad() {
        let enc = ContentEncryptionAlgorithm::A256Gcm;
        let cek = vec![1u8; 32];
        let iv = vec![2u8; 12];
        let (ciphertext, tag) = seal(enc, &cek, &iv, b"aad", b"data").unwrap();
        assert!(matches!(
            open(enc, &cek, &iv, b"aae", &ciphertext, &tag),
            Err(Error::Crypto)
        ));
    }

    #[test]
    fn seal_rejects_wrong_key_size() {
        let enc = ContentEncryptionAlgorithm::A256Gcm;
        assert!(matches!(
            seal(enc, &[0u8; 16], &[0u8; 12], b"", b""),
            Err(Error::CekLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            "A256CBC-HS512".parse::<ContentEncryptionAlgorithm>(),
            Err(Error::UnknownEncryption(_))
        ));
    }
}
