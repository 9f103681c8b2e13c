use p256::elliptic_curve::sec1::ToEncodedPoint;

use super::{Curve, EcParams};
use crate::{Base64urlUInt, Error, Params, JWK};

impl EcParams {
    pub fn generate_p256() -> Self {
        let mut rng = rand::rngs::OsRng {};
        Self::from_secret_p256(&p256::SecretKey::random(&mut rng))
    }

    pub fn from_public_p256(key: &p256::PublicKey) -> Self {
        // the uncompressed encoding always carries both coordinates
        let point = key.to_encoded_point(false);
        Self {
            curve: Curve::P256,
            x_coordinate: Base64urlUInt(point.x().expect("uncompressed point has x").to_vec()),
            y_coordinate: Base64urlUInt(point.y().expect("uncompressed point has y").to_vec()),
            ecc_private_key: None,
        }
    }

    pub fn from_secret_p256(key: &p256::SecretKey) -> Self {
        let mut params = Self::from_public_p256(&key.public_key());
        params.ecc_private_key = Some(Base64urlUInt(key.to_bytes().to_vec()));
        params
    }

    pub fn to_public_p256(&self) -> Result<p256::PublicKey, Error> {
        if self.curve != Curve::P256 {
            return Err(Error::CurveMismatch);
        }
        p256::PublicKey::from_sec1_bytes(&self.to_sec1_bytes()).map_err(|_| Error::InvalidPoint)
    }

    pub fn to_secret_p256(&self) -> Result<p256::SecretKey, Error> {
        if self.curve != Curve::P256 {
            return Err(Error::CurveMismatch);
        }
        let d = self
            .ecc_private_key
            .as_ref()
            .ok_or(Error::MissingPrivateKey)?;
        p256::SecretKey::from_slice(&d.0).map_err(|_| Error::InvalidScalar)
    }
}

impl JWK {
    pub fn generate_p256() -> JWK {
        JWK::from(Params::Ec(EcParams::generate_p256()))
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn p256_generate() {
        let jwk = crate::JWK::generate_p256();
        assert_eq!(jwk.keysize_bits(), 256);
    }
}
