//! Error types for `rjose-jwe`.

use thiserror::Error;

/// Error type for `rjose-jwe`.
///
/// Cryptographic failures during decryption are deliberately collapsed into
/// the single [`Error::Crypto`] variant so callers cannot distinguish a tag
/// mismatch from an unwrap or unpadding failure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Compact serialization does not have exactly five segments
    #[error("expected 5 compact serialization segments, found {0}")]
    InvalidSegmentCount(usize),
    /// A required header parameter is absent
    #[error("missing required header parameter `{0}`")]
    MissingHeaderParameter(&'static str),
    /// `alg` names an unsupported key management algorithm
    #[error("unknown key management algorithm `{0}`")]
    UnknownAlgorithm(String),
    /// `enc` names an unsupported content encryption algorithm
    #[error("unknown content encryption algorithm `{0}`")]
    UnknownEncryption(String),
    /// `epk` supplied for an algorithm that does not use one
    #[error("`epk` may only appear when alg is ECDH-ES")]
    UnexpectedEphemeralKey,
    /// The encrypted key segment must be empty for this algorithm
    #[error("encrypted key must be empty for `{0}`")]
    UnexpectedEncryptedKey(&'static str),
    /// Recipient key type does not fit the key management algorithm
    #[error("recipient key type does not match `{0}`")]
    KeyTypeMismatch(&'static str),
    /// Content encryption key has the wrong length
    #[error("content encryption key must be {expected} bytes, found {actual}")]
    CekLength { expected: usize, actual: usize },
    /// Key encryption key has the wrong length
    #[error("key encryption key must be {expected} bytes, found {actual}")]
    KekLength { expected: usize, actual: usize },
    /// Initialization vector has the wrong length
    #[error("initialization vector must be {expected} bytes, found {actual}")]
    IvLength { expected: usize, actual: usize },
    /// Authentication tag has the wrong length
    #[error("authentication tag must be {expected} bytes, found {actual}")]
    TagLength { expected: usize, actual: usize },
    /// Error decoding base64url
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    /// Error parsing or producing JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Error from the key layer
    #[error(transparent)]
    Key(#[from] rjose_jwk::Error),
    /// The cryptographic backend failed; no further detail is exposed
    #[error("cryptographic operation failed")]
    Crypto,
}
