use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::{Base64urlUInt, Error};

mod p256;
mod p384;
mod p521;

/// Named NIST curves supported for `kty: EC` keys.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    #[serde(rename = "P-256")]
    P256,
    #[serde(rename = "P-384")]
    P384,
    #[serde(rename = "P-521")]
    P521,
}

impl Curve {
    /// Width in bytes of a coordinate or scalar octet string
    /// (RFC 7518 §6.2.1.2).
    pub const fn coordinate_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    pub const fn keysize_bits(self) -> usize {
        match self {
            Self::P256 => 256,
            Self::P384 => 384,
            Self::P521 => 521,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Curve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "P-521" => Ok(Self::P521),
            other => Err(Error::CurveNotImplemented(other.to_string())),
        }
    }
}

/// Parameters of an elliptic curve key. Coordinates and the private scalar
/// are held at the curve's fixed width.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq, Zeroize)]
pub struct EcParams {
    #[serde(rename = "crv")]
    #[zeroize(skip)]
    pub curve: Curve,
    #[serde(rename = "x")]
    pub x_coordinate: Base64urlUInt,
    #[serde(rename = "y")]
    pub y_coordinate: Base64urlUInt,

    // Parameters for Elliptic Curve Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecc_private_key: Option<Base64urlUInt>,
}

impl EcParams {
    pub fn is_public(&self) -> bool {
        self.ecc_private_key.is_none()
    }

    /// Strip private key material
    pub fn to_public(&self) -> Self {
        Self {
            curve: self.curve,
            x_coordinate: self.x_coordinate.clone(),
            y_coordinate: self.y_coordinate.clone(),
            ecc_private_key: None,
        }
    }

    /// Generate a fresh key pair on the named curve.
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::P256 => Self::generate_p256(),
            Curve::P384 => Self::generate_p384(),
            Curve::P521 => Self::generate_p521(),
        }
    }

    /// Build a private key from the scalar `d`. The public point is always
    /// derived as `d·G`; caller-supplied coordinates are ignored.
    pub fn from_secret_bytes(curve: Curve, d: &[u8]) -> Result<Self, Error> {
        let d = left_pad(curve.coordinate_size(), d)?;
        match curve {
            Curve::P256 => ::p256::SecretKey::from_slice(&d)
                .map_err(|_| Error::InvalidScalar)
                .map(|key| Self::from_secret_p256(&key)),
            Curve::P384 => ::p384::SecretKey::from_slice(&d)
                .map_err(|_| Error::InvalidScalar)
                .map(|key| Self::from_secret_p384(&key)),
            Curve::P521 => ::p521::SecretKey::from_slice(&d)
                .map_err(|_| Error::InvalidScalar)
                .map(|key| Self::from_secret_p521(&key)),
        }
    }

    /// Build a public-only key from affine coordinates, validating that the
    /// point lies on the curve.
    pub fn from_coordinates(curve: Curve, x: &[u8], y: &[u8]) -> Result<Self, Error> {
        let width = curve.coordinate_size();
        let x = left_pad(width, x)?;
        let y = left_pad(width, y)?;
        let mut sec1 = Vec::with_capacity(1 + 2 * width);
        sec1.push(0x04);
        sec1.extend_from_slice(&x);
        sec1.extend_from_slice(&y);
        match curve {
            Curve::P256 => ::p256::PublicKey::from_sec1_bytes(&sec1)
                .map_err(|_| Error::InvalidPoint)
                .map(|key| Self::from_public_p256(&key)),
            Curve::P384 => ::p384::PublicKey::from_sec1_bytes(&sec1)
                .map_err(|_| Error::InvalidPoint)
                .map(|key| Self::from_public_p384(&key)),
            Curve::P521 => ::p521::PublicKey::from_sec1_bytes(&sec1)
                .map_err(|_| Error::InvalidPoint)
                .map(|key| Self::from_public_p521(&key)),
        }
    }

    /// SEC1 uncompressed encoding of the public point.
    pub(crate) fn to_sec1_bytes(&self) -> Vec<u8> {
        let mut sec1 = Vec::with_capacity(1 + 2 * self.curve.coordinate_size());
        sec1.push(0x04);
        sec1.extend_from_slice(&self.x_coordinate.0);
        sec1.extend_from_slice(&self.y_coordinate.0);
        sec1
    }
}

impl Drop for EcParams {
    fn drop(&mut self) {
        // Zeroize private key
        if let Some(ref mut d) = self.ecc_private_key {
            d.zeroize();
        }
    }
}

/// Left-pad an octet string with zeros to the given width.
pub(crate) fn left_pad(width: usize, bytes: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
    if bytes.len() > width {
        return Err(Error::OversizedCoordinate(bytes.len()));
    }
    let mut out = Zeroizing::new(vec![0u8; width]);
    out[width - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}
