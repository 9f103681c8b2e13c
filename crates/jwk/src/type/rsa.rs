use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{Base64urlUInt, Error};

/// Parameters of an RSA key. Integers are minimal-length big-endian octet
/// strings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq, Zeroize)]
pub struct RsaParams {
    // Parameters for RSA Public Keys
    #[serde(rename = "n")]
    pub modulus: Base64urlUInt,
    #[serde(rename = "e")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<Base64urlUInt>,

    // Parameters for RSA Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_exponent: Option<Base64urlUInt>,
    #[serde(rename = "p")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prime_factor: Option<Base64urlUInt>,
    #[serde(rename = "q")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_prime_factor: Option<Base64urlUInt>,
    #[serde(rename = "dp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prime_factor_crt_exponent: Option<Base64urlUInt>,
    #[serde(rename = "dq")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_prime_factor_crt_exponent: Option<Base64urlUInt>,
    #[serde(rename = "qi")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_crt_coefficient: Option<Base64urlUInt>,
}

impl RsaParams {
    pub fn is_public(&self) -> bool {
        self.private_exponent.is_none()
            && self.first_prime_factor.is_none()
            && self.second_prime_factor.is_none()
            && self.first_prime_factor_crt_exponent.is_none()
            && self.second_prime_factor_crt_exponent.is_none()
            && self.first_crt_coefficient.is_none()
    }

    /// Strip private key material
    pub fn to_public(&self) -> Self {
        Self {
            modulus: self.modulus.clone(),
            exponent: self.exponent.clone(),
            private_exponent: None,
            first_prime_factor: None,
            second_prime_factor: None,
            first_prime_factor_crt_exponent: None,
            second_prime_factor_crt_exponent: None,
            first_crt_coefficient: None,
        }
    }

    /// Construct a RSA public key
    pub fn new_public(modulus: &[u8], exponent: &[u8]) -> Self {
        Self {
            modulus: Base64urlUInt(modulus.to_vec()),
            exponent: Some(Base64urlUInt(exponent.to_vec())),
            private_exponent: None,
            first_prime_factor: None,
            second_prime_factor: None,
            first_prime_factor_crt_exponent: None,
            second_prime_factor_crt_exponent: None,
            first_crt_coefficient: None,
        }
    }

    /// Generate a fresh key pair of the given modulus size. The public
    /// exponent defaults to 65537.
    pub fn generate(bits: usize, exponent: Option<&[u8]>) -> Result<Self, Error> {
        let mut rng = OsRng;
        let key = match exponent {
            None => RsaPrivateKey::new(&mut rng, bits)?,
            Some(e) => RsaPrivateKey::new_with_exp(&mut rng, bits, &BigUint::from_bytes_be(e))?,
        };
        Ok(Self::from_private_key(&key))
    }

    /// Capture all components of a backend private key, including the CRT
    /// parameters.
    pub fn from_private_key(key: &RsaPrivateKey) -> Self {
        let primes = key.primes();
        let (p, q) = (&primes[0], &primes[1]);
        let d = key.d();
        let one = BigUint::from(1u32);
        let two = BigUint::from(2u32);
        let dp = d % &(p - &one);
        let dq = d % &(q - &one);
        // p is prime, so q^-1 mod p = q^(p-2) mod p
        let qi = q.modpow(&(p - &two), p);
        Self {
            modulus: Base64urlUInt(key.n().to_bytes_be()),
            exponent: Some(Base64urlUInt(key.e().to_bytes_be())),
            private_exponent: Some(Base64urlUInt(d.to_bytes_be())),
            first_prime_factor: Some(Base64urlUInt(p.to_bytes_be())),
            second_prime_factor: Some(Base64urlUInt(q.to_bytes_be())),
            first_prime_factor_crt_exponent: Some(Base64urlUInt(dp.to_bytes_be())),
            second_prime_factor_crt_exponent: Some(Base64urlUInt(dq.to_bytes_be())),
            first_crt_coefficient: Some(Base64urlUInt(qi.to_bytes_be())),
        }
    }

    pub fn keysize_bits(&self) -> usize {
        self.modulus.0.len() * 8
    }

    /// Re-encode every integer field at its minimal length.
    pub(crate) fn normalize(&mut self) {
        strip_leading_zeros(&mut self.modulus.0);
        for field in [
            &mut self.exponent,
            &mut self.private_exponent,
            &mut self.first_prime_factor,
            &mut self.second_prime_factor,
            &mut self.first_prime_factor_crt_exponent,
            &mut self.second_prime_factor_crt_exponent,
            &mut self.first_crt_coefficient,
        ]
        .into_iter()
        .flatten()
        {
            strip_leading_zeros(&mut field.0);
        }
    }
}

fn strip_leading_zeros(bytes: &mut Vec<u8>) {
    let zeros = bytes.iter().take_while(|b| **b == 0).count();
    if zeros > 0 && zeros < bytes.len() {
        bytes.drain(..zeros);
    } else if zeros == bytes.len() && zeros > 1 {
        bytes.truncate(1);
    }
}

impl Drop for RsaParams {
    fn drop(&mut self) {
        // Zeroize private key fields
        if let Some(ref mut d) = self.private_exponent {
            d.zeroize();
        }
        if let Some(ref mut p) = self.first_prime_factor {
            p.zeroize();
        }
        if let Some(ref mut q) = self.second_prime_factor {
            q.zeroize();
        }
        if let Some(ref mut dp) = self.first_prime_factor_crt_exponent {
            dp.zeroize();
        }
        if let Some(ref mut dq) = self.second_prime_factor_crt_exponent {
            dq.zeroize();
        }
        if let Some(ref mut qi) = self.first_crt_coefficient {
            qi.zeroize();
        }
    }
}

impl From<&Base64urlUInt> for BigUint {
    fn from(uint: &Base64urlUInt) -> Self {
        Self::from_bytes_be(&uint.0)
    }
}

impl TryFrom<&RsaParams> for RsaPublicKey {
    type Error = Error;
    fn try_from(params: &RsaParams) -> Result<Self, Self::Error> {
        let n = &params.modulus;
        let e = params.exponent.as_ref().ok_or(Error::MissingExponent)?;
        Ok(Self::new(n.into(), e.into())?)
    }
}

impl TryFrom<&RsaParams> for RsaPrivateKey {
    type Error = Error;
    fn try_from(params: &RsaParams) -> Result<Self, Self::Error> {
        let n = &params.modulus;
        let e = params.exponent.as_ref().ok_or(Error::MissingExponent)?;
        let d = params
            .private_exponent
            .as_ref()
            .ok_or(Error::MissingPrivateKey)?;
        let primes = match (&params.first_prime_factor, &params.second_prime_factor) {
            (Some(p), Some(q)) => vec![p.into(), q.into()],
            _ => Vec::new(),
        };
        Ok(Self::from_components(n.into(), e.into(), d.into(), primes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_carries_crt_parameters() {
        let params = RsaParams::generate(2048, None).unwrap();
        assert_eq!(params.keysize_bits(), 2048);
        assert_eq!(params.exponent.as_ref().unwrap().0, vec![0x01, 0x00, 0x01]);
        assert!(params.first_prime_factor_crt_exponent.is_some());
        assert!(params.second_prime_factor_crt_exponent.is_some());
        assert!(params.first_crt_coefficient.is_some());

        // the captured components must rebuild a working backend key
        let rebuilt = RsaPrivateKey::try_from(&params).unwrap();
        assert_eq!(rebuilt.n().to_bytes_be(), params.modulus.0);
    }

    #[test]
    fn public_key_requires_exponent() {
        let mut params = RsaParams::generate(2048, None).unwrap().to_public();
        params.exponent = None;
        assert!(matches!(
            RsaPublicKey::try_from(&params),
            Err(Error::MissingExponent)
        ));
    }

    #[test]
    fn normalize_strips_leading_zeros() {
        let mut params = RsaParams::new_public(&[0, 0, 0xab, 0xcd], &[0, 1, 0, 1]);
        params.normalize();
        assert_eq!(params.modulus.0, vec![0xab, 0xcd]);
        assert_eq!(params.exponent.as_ref().unwrap().0, vec![1, 0, 1]);
    }
}
