//! Elliptic-curve Diffie-Hellman shared-secret derivation.
//!
//! The derived value is the HKDF-SHA256 expansion of the raw x-coordinate
//! shared secret to 256 bits, wrapped as an octet JWK. This is the key
//! agreement profile used by ECDH-ES content key derivation.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{Curve, Error, OctParams, Params, JWK};

/// Length in bytes of a derived shared key.
const SHARED_KEY_LEN: usize = 32;

impl JWK {
    /// Derive a 256-bit octet JWK from `self`'s private scalar and `peer`'s
    /// public point. Both keys must be on the same curve.
    pub fn derive_ecdh(&self, peer: &JWK) -> Result<JWK, Error> {
        let (Params::Ec(own), Params::Ec(theirs)) = (&self.params, &peer.params) else {
            return Err(Error::UnsupportedKeyType);
        };
        if own.curve != theirs.curve {
            return Err(Error::CurveMismatch);
        }

        // raw_secret_bytes is the x-coordinate at the curve's fixed width
        let z: Zeroizing<Vec<u8>> = match own.curve {
            Curve::P256 => {
                let secret = own.to_secret_p256()?;
                let public = theirs.to_public_p256()?;
                let shared =
                    p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().to_vec())
            }
            Curve::P384 => {
                let secret = own.to_secret_p384()?;
                let public = theirs.to_public_p384()?;
                let shared =
                    p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().to_vec())
            }
            Curve::P521 => {
                let secret = own.to_secret_p521()?;
                let public = theirs.to_public_p521()?;
                let shared =
                    p521::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().to_vec())
            }
        };

        let okm = hkdf_sha256(None, &[], &z, SHARED_KEY_LEN)?;
        Ok(JWK::from(Params::Oct(OctParams::from_bytes(&okm)?)))
    }
}

/// HKDF-SHA256 (RFC 5869). An absent salt is equivalent to a zero-filled
/// salt of hash length.
pub(crate) fn hkdf_sha256(
    salt: Option<&[u8]>,
    info: &[u8],
    ikm: &[u8],
    okm_len: usize,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    let mut okm = Zeroizing::new(vec![0u8; okm_len]);
    Hkdf::<Sha256>::new(salt, ikm)
        .expand(info, &mut okm)
        .map_err(|_| Error::InvalidKeyLength(okm_len))?;
    Ok(okm)
}
