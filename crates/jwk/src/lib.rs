//! JSON Web Key (RFC 7517) for the [`rjose`](https://docs.rs/rjose) family.
//!
//! A [`JWK`] is a tagged value over three key types — octet sequence,
//! elliptic curve and RSA — together with an optional key identifier.
//! Keys can be generated from the system CSRNG, built from caller-supplied
//! components, imported from JSON and exported back, and elliptic curve
//! keys support Diffie-Hellman derivation of a symmetric JWK.

use core::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

pub mod base64url;
pub use base64url::Base64urlUInt;

pub mod error;
pub use error::Error;

mod r#type;
pub use r#type::*;

mod ecdh;

// RFC 7517 - JSON Web Key (JWK)
// RFC 7518 - JSON Web Algorithms (JWA)
// RFC 7638 - JSON Web Key (JWK) Thumbprint

#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub struct JWK {
    pub key_id: Option<String>,
    pub params: Params,
}

impl JWK {
    /// Generate a symmetric key of `bits` (a positive multiple of 8) from
    /// the system CSRNG.
    pub fn generate_oct(bits: usize) -> Result<JWK, Error> {
        Ok(Params::Oct(OctParams::generate(bits)?).into())
    }

    /// Build a symmetric key from a copy of the caller's bytes.
    pub fn from_oct_bytes(data: &[u8]) -> Result<JWK, Error> {
        Ok(Params::Oct(OctParams::from_bytes(data)?).into())
    }

    /// Generate a key pair on the named curve.
    pub fn generate_ec(curve: Curve) -> JWK {
        Params::Ec(EcParams::generate(curve)).into()
    }

    /// Generate an RSA key pair. The public exponent defaults to 65537.
    pub fn generate_rsa(bits: usize, exponent: Option<&[u8]>) -> Result<JWK, Error> {
        Ok(Params::Rsa(RsaParams::generate(bits, exponent)?).into())
    }

    /// Effective key size: bit length of the octet material, the curve size,
    /// or the modulus size.
    pub fn keysize_bits(&self) -> usize {
        match &self.params {
            Params::Ec(params) => params.curve.keysize_bits(),
            Params::Rsa(params) => params.keysize_bits(),
            Params::Oct(params) => params.keysize_bits(),
        }
    }

    /// Strip private key material
    pub fn to_public(&self) -> Self {
        Self {
            key_id: self.key_id.clone(),
            params: self.params.to_public(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.params.is_public()
    }

    /// Compare JWK equality by public key properties.
    pub fn equals_public(&self, other: &JWK) -> bool {
        match (&self.params, &other.params) {
            (Params::Rsa(a), Params::Rsa(b)) => a.modulus == b.modulus && a.exponent == b.exponent,
            (Params::Ec(a), Params::Ec(b)) => {
                a.curve == b.curve
                    && a.x_coordinate == b.x_coordinate
                    && a.y_coordinate == b.y_coordinate
            }
            (Params::Oct(a), Params::Oct(b)) => a.key_value == b.key_value,
            _ => false,
        }
    }

    /// RFC 7638 thumbprint: base64url of the SHA-256 hash over the required
    /// members in lexicographic order, without whitespace or escaping.
    pub fn thumbprint(&self) -> Result<String, Error> {
        let json_string = match &self.params {
            Params::Rsa(params) => {
                let e = params.exponent.as_ref().ok_or(Error::MissingExponent)?;
                format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, e, params.modulus)
            }
            Params::Ec(params) => format!(
                r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
                params.curve, params.x_coordinate, params.y_coordinate
            ),
            Params::Oct(params) => {
                format!(r#"{{"k":"{}","kty":"oct"}}"#, params.key_value)
            }
        };
        let hash = Sha256::digest(json_string.as_bytes());
        Ok(base64url::encode(hash))
    }

    /// Parse and validate an RFC 7517 JSON object.
    pub fn from_json(json: &str) -> Result<JWK, Error> {
        let jwk: JWK = serde_json::from_str(json)?;
        jwk.validated()
    }

    /// Parse and validate an already-decoded JSON value.
    pub fn from_json_value(value: &serde_json::Value) -> Result<JWK, Error> {
        let jwk: JWK = serde_json::from_value(value.clone())?;
        jwk.validated()
    }

    /// Serialize to a compact RFC 7517 JSON object. With `include_private`
    /// unset, EC and RSA private components are withheld; the octet key
    /// value `k` is always emitted since an octet key has no public form.
    pub fn to_json(&self, include_private: bool) -> Result<String, Error> {
        if include_private {
            Ok(serde_json::to_string(self)?)
        } else {
            Ok(serde_json::to_string(&self.to_public())?)
        }
    }

    fn validated(mut self) -> Result<Self, Error> {
        match &mut self.params {
            Params::Ec(ec) => {
                // normalizes field widths and checks curve membership; a
                // present scalar wins over the transported point
                let checked = match &ec.ecc_private_key {
                    Some(d) => EcParams::from_secret_bytes(ec.curve, &d.0)?,
                    None => EcParams::from_coordinates(
                        ec.curve,
                        &ec.x_coordinate.0,
                        &ec.y_coordinate.0,
                    )?,
                };
                *ec = checked;
            }
            Params::Rsa(rsa) => {
                if rsa.exponent.is_none() {
                    return Err(Error::MissingExponent);
                }
                rsa.normalize();
            }
            Params::Oct(oct) => {
                if oct.key_value.0.is_empty() {
                    return Err(Error::InvalidKeyLength(0));
                }
            }
        }
        Ok(self)
    }
}

/// Members are emitted in the order `kty`, `kid`, then the key-type fields:
/// `crv x y d` / `n e d p q dp dq qi` / `k`.
impl Serialize for JWK {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kty", self.params.kty_name())?;
        if let Some(kid) = &self.key_id {
            map.serialize_entry("kid", kid)?;
        }
        match &self.params {
            Params::Ec(params) => {
                map.serialize_entry("crv", &params.curve)?;
                map.serialize_entry("x", &params.x_coordinate)?;
                map.serialize_entry("y", &params.y_coordinate)?;
                if let Some(d) = &params.ecc_private_key {
                    map.serialize_entry("d", d)?;
                }
            }
            Params::Rsa(params) => {
                map.serialize_entry("n", &params.modulus)?;
                if let Some(e) = &params.exponent {
                    map.serialize_entry("e", e)?;
                }
                if let Some(d) = &params.private_exponent {
                    map.serialize_entry("d", d)?;
                }
                if let Some(p) = &params.first_prime_factor {
                    map.serialize_entry("p", p)?;
                }
                if let Some(q) = &params.second_prime_factor {
                    map.serialize_entry("q", q)?;
                }
                if let Some(dp) = &params.first_prime_factor_crt_exponent {
                    map.serialize_entry("dp", dp)?;
                }
                if let Some(dq) = &params.second_prime_factor_crt_exponent {
                    map.serialize_entry("dq", dq)?;
                }
                if let Some(qi) = &params.first_crt_coefficient {
                    map.serialize_entry("qi", qi)?;
                }
            }
            Params::Oct(params) => {
                map.serialize_entry("k", &params.key_value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for JWK {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct JwkRepr {
            #[serde(rename = "kid")]
            key_id: Option<String>,
            #[serde(flatten)]
            params: Params,
        }
        let repr = JwkRepr::deserialize(deserializer)?;
        Ok(JWK {
            key_id: repr.key_id,
            params: repr.params,
        })
    }
}

impl fmt::Display for JWK {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        serde_json::to_string(self).map_err(|_| fmt::Error)?.fmt(f)
    }
}

impl FromStr for JWK {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}
