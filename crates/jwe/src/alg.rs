//! Key management: how the content encryption key is determined, wrapped
//! and recovered (RFC 7518 §4).

use core::fmt;
use std::str::FromStr;

use aes_kw::{KekAes128, KekAes192, KekAes256};
use rand::{rngs::OsRng, RngCore};
use rjose_jwk::{Params, JWK};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::enc::ContentEncryptionAlgorithm;
use crate::header::JweHeader;
use crate::Error;

/// ECDH-ES derivation yields a 256-bit key, which pins the usable `enc`.
const DERIVED_KEY_LEN: usize = 32;

/// Algorithm used to determine or transport the content encryption key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyManagementAlgorithm {
    /// Direct use of a shared symmetric key as the CEK
    Dir,
    /// AES Key Wrap with a 128-bit KEK
    A128Kw,
    /// AES Key Wrap with a 192-bit KEK
    A192Kw,
    /// AES Key Wrap with a 256-bit KEK
    A256Kw,
    /// RSAES OAEP (SHA-1, MGF1 with SHA-1)
    RsaOaep,
    /// Elliptic Curve Diffie-Hellman Ephemeral Static key agreement
    EcdhEs,
}

impl KeyManagementAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::A128Kw => "A128KW",
            Self::A192Kw => "A192KW",
            Self::A256Kw => "A256KW",
            Self::RsaOaep => "RSA-OAEP",
            Self::EcdhEs => "ECDH-ES",
        }
    }

    /// KEK length in bytes for the AES Key Wrap variants.
    pub const fn kek_size(self) -> Option<usize> {
        match self {
            Self::A128Kw => Some(16),
            Self::A192Kw => Some(24),
            Self::A256Kw => Some(32),
            _ => None,
        }
    }

    /// Whether the encrypted key segment is empty for this algorithm.
    pub const fn has_empty_encrypted_key(self) -> bool {
        matches!(self, Self::Dir | Self::EcdhEs)
    }
}

impl fmt::Display for KeyManagementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyManagementAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dir" => Ok(Self::Dir),
            "A128KW" => Ok(Self::A128Kw),
            "A192KW" => Ok(Self::A192Kw),
            "A256KW" => Ok(Self::A256Kw),
            "RSA-OAEP" => Ok(Self::RsaOaep),
            "ECDH-ES" => Ok(Self::EcdhEs),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Materialize the CEK for an encryption, returning it together with the
/// encrypted key segment. For ECDH-ES the ephemeral public key is written
/// into the header, which must therefore not be serialized yet; a fresh
/// ephemeral pair is generated unless the caller supplies one.
pub(crate) fn determine_cek(
    alg: KeyManagementAlgorithm,
    enc: ContentEncryptionAlgorithm,
    recipient: &JWK,
    header: &mut JweHeader,
    ephemeral: Option<JWK>,
) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), Error> {
    match alg {
        KeyManagementAlgorithm::Dir => {
            let Params::Oct(oct) = &recipient.params else {
                return Err(Error::KeyTypeMismatch(alg.name()));
            };
            if oct.as_bytes().len() != enc.key_size() {
                return Err(Error::CekLength {
                    expected: enc.key_size(),
                    actual: oct.as_bytes().len(),
                });
            }
            Ok((Zeroizing::new(oct.as_bytes().to_vec()), Vec::new()))
        }
        KeyManagementAlgorithm::A128Kw
        | KeyManagementAlgorithm::A192Kw
        | KeyManagementAlgorithm::A256Kw => {
            let kek = kek_bytes(alg, recipient)?;
            let mut cek = Zeroizing::new(vec![0u8; enc.key_size()]);
            OsRng.fill_bytes(&mut cek);
            let wrapped = wrap_key(kek, &cek)?;
            Ok((cek, wrapped))
        }
        KeyManagementAlgorithm::RsaOaep => {
            let Params::Rsa(params) = &recipient.params else {
                return Err(Error::KeyTypeMismatch(alg.name()));
            };
            let public_key = RsaPublicKey::try_from(params)?;
            let mut cek = Zeroizing::new(vec![0u8; enc.key_size()]);
            OsRng.fill_bytes(&mut cek);
            let wrapped = public_key
                .encrypt(&mut OsRng, Oaep::new::<Sha1>(), &cek)
                .map_err(|_| Error::Crypto)?;
            Ok((cek, wrapped))
        }
        KeyManagementAlgorithm::EcdhEs => {
            let Params::Ec(params) = &recipient.params else {
                return Err(Error::KeyTypeMismatch(alg.name()));
            };
            if enc.key_size() != DERIVED_KEY_LEN {
                return Err(Error::CekLength {
                    expected: enc.key_size(),
                    actual: DERIVED_KEY_LEN,
                });
            }
            let ephemeral = match ephemeral {
                Some(key) => key,
                None => JWK::generate_ec(params.curve),
            };
            let derived = ephemeral.derive_ecdh(recipient)?;
            header.set_ephemeral_key(&ephemeral.to_public())?;
            Ok((derived_bytes(&derived)?, Vec::new()))
        }
    }
}

/// Recover the CEK on the decryption side.
pub(crate) fn recover_cek(
    alg: KeyManagementAlgorithm,
    enc: ContentEncryptionAlgorithm,
    recipient: &JWK,
    header: &JweHeader,
    encrypted_key: &[u8],
) -> Result<Zeroizing<Vec<u8>>, Error> {
    if alg.has_empty_encrypted_key() && !encrypted_key.is_empty() {
        return Err(Error::UnexpectedEncryptedKey(alg.name()));
    }
    match alg {
        KeyManagementAlgorithm::Dir => {
            let Params::Oct(oct) = &recipient.params else {
                return Err(Error::KeyTypeMismatch(alg.name()));
            };
            if oct.as_bytes().len() != enc.key_size() {
                return Err(Error::CekLength {
                    expected: enc.key_size(),
                    actual: oct.as_bytes().len(),
                });
            }
            Ok(Zeroizing::new(oct.as_bytes().to_vec()))
        }
        KeyManagementAlgorithm::A128Kw
        | KeyManagementAlgorithm::A192Kw
        | KeyManagementAlgorithm::A256Kw => {
            let kek = kek_bytes(alg, recipient)?;
            unwrap_key(kek, encrypted_key, enc.key_size())
        }
        KeyManagementAlgorithm::RsaOaep => {
            let Params::Rsa(params) = &recipient.params else {
                return Err(Error::KeyTypeMismatch(alg.name()));
            };
            let private_key = RsaPrivateKey::try_from(params)?;
            let cek = private_key
                .decrypt(Oaep::new::<Sha1>(), encrypted_key)
                .map(Zeroizing::new)
                .map_err(|_| Error::Crypto)?;
            if cek.len() != enc.key_size() {
                return Err(Error::Crypto);
            }
            Ok(cek)
        }
        KeyManagementAlgorithm::EcdhEs => {
            if enc.key_size() != DERIVED_KEY_LEN {
                return Err(Error::CekLength {
                    expected: enc.key_size(),
                    actual: DERIVED_KEY_LEN,
                });
            }
            let ephemeral = header.ephemeral_key()?;
            let derived = recipient.derive_ecdh(&ephemeral)?;
            derived_bytes(&derived)
        }
    }
}

fn derived_bytes(derived: &JWK) -> Result<Zeroizing<Vec<u8>>, Error> {
    match &derived.params {
        Params::Oct(oct) => Ok(Zeroizing::new(oct.as_bytes().to_vec())),
        _ => Err(Error::Crypto),
    }
}

fn kek_bytes(alg: KeyManagementAlgorithm, recipient: &JWK) -> Result<&[u8], Error> {
    let Params::Oct(oct) = &recipient.params else {
        return Err(Error::KeyTypeMismatch(alg.name()));
    };
    let expected = alg.kek_size().ok_or(Error::KeyTypeMismatch(alg.name()))?;
    if oct.as_bytes().len() != expected {
        return Err(Error::KekLength {
            expected,
            actual: oct.as_bytes().len(),
        });
    }
    Ok(oct.as_bytes())
}

fn wrap_key(kek: &[u8], cek: &[u8]) -> Result<Vec<u8>, Error> {
    let mut wrapped = vec![0u8; cek.len() + 8];
    match kek.len() {
        16 => KekAes128::from(to_array::<16>(kek)?)
            .wrap(cek, &mut wrapped)
            .map_err(|_| Error::Crypto)?,
        24 => KekAes192::from(to_array::<24>(kek)?)
            .wrap(cek, &mut wrapped)
            .map_err(|_| Error::Crypto)?,
        32 => KekAes256::from(to_array::<32>(kek)?)
            .wrap(cek, &mut wrapped)
            .map_err(|_| Error::Crypto)?,
        other => {
            return Err(Error::KekLength {
                expected: 32,
                actual: other,
            })
        }
    }
    Ok(wrapped)
}

fn unwrap_key(kek: &[u8], wrapped: &[u8], cek_len: usize) -> Result<Zeroizing<Vec<u8>>, Error> {
    if wrapped.len() != cek_len + 8 {
        return Err(Error::Crypto);
    }
    let mut cek = Zeroizing::new(vec![0u8; cek_len]);
    match kek.len() {
        16 => KekAes128::from(to_array::<16>(kek)?)
            .unwrap(wrapped, &mut cek)
            .map_err(|_| Error::Crypto)?,
        24 => KekAes192::from(to_array::<24>(kek)?)
            .unwrap(wrapped, &mut cek)
            .map_err(|_| Error::Crypto)?,
        32 => KekAes256::from(to_array::<32>(kek)?)
            .unwrap(wrapped, &mut cek)
            .map_err(|_| Error::Crypto)?,
        other => {
            return Err(Error::KekLength {
                expected: 32,
                actual: other,
            })
        }
    }
    Ok(cek)
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], Error> {
    bytes.try_into().map_err(|_| Error::KekLength {
        expected: N,
        actual: bytes.len(),
    })
}
