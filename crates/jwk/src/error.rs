//! Error types for `rjose-jwk`.

use base64::DecodeError as Base64Error;
use rsa::errors::Error as RsaError;
use thiserror::Error;

/// Error type for `rjose-jwk`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Curve name is not one of P-256, P-384, P-521
    #[error("Curve not implemented: '{0}'")]
    CurveNotImplemented(String),
    /// Operands of a key agreement are not on the same curve
    #[error("Keys are not on the same curve")]
    CurveMismatch,
    /// Key type not usable for the requested operation
    #[error("Key type not supported for this operation")]
    UnsupportedKeyType,
    /// Missing private key parameter in JWK
    #[error("Missing private key parameter in JWK")]
    MissingPrivateKey,
    /// Missing exponent in RSA key
    #[error("Missing exponent in RSA key")]
    MissingExponent,
    /// Invalid key length
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),
    /// Coordinate or scalar wider than the curve field
    #[error("Octet string of {0} bytes exceeds the curve field width")]
    OversizedCoordinate(usize),
    /// Point is not on the named curve
    #[error("Invalid elliptic curve point")]
    InvalidPoint,
    /// Scalar is zero or not reduced modulo the curve order
    #[error("Invalid elliptic curve scalar")]
    InvalidScalar,
    /// Error decoding base64url
    #[error(transparent)]
    Base64(#[from] Base64Error),
    /// Error from the `rsa` crate
    #[error(transparent)]
    Rsa(#[from] RsaError),
    /// Error parsing or producing JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
