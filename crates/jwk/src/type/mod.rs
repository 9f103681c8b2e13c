use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::JWK;

pub mod ec;
pub use ec::{Curve, EcParams};

pub mod rsa;
pub use rsa::RsaParams;

mod oct;
pub use oct::OctParams;

/// Key-type specific JWK members, tagged by `kty`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq, Zeroize)]
#[serde(tag = "kty")]
pub enum Params {
    #[serde(rename = "EC")]
    Ec(EcParams),
    #[serde(rename = "RSA")]
    Rsa(RsaParams),
    #[serde(rename = "oct")]
    Oct(OctParams),
}

impl Params {
    pub fn kty_name(&self) -> &'static str {
        match self {
            Self::Ec(_) => "EC",
            Self::Rsa(_) => "RSA",
            Self::Oct(_) => "oct",
        }
    }

    pub fn is_public(&self) -> bool {
        match self {
            Self::Ec(params) => params.is_public(),
            Self::Rsa(params) => params.is_public(),
            Self::Oct(_) => false,
        }
    }

    /// Strip private key material. Octet keys have no public-only form, so
    /// their key value is carried unchanged.
    pub fn to_public(&self) -> Self {
        match self {
            Self::Ec(params) => Self::Ec(params.to_public()),
            Self::Rsa(params) => Self::Rsa(params.to_public()),
            Self::Oct(params) => Self::Oct(params.clone()),
        }
    }
}

impl From<Params> for JWK {
    fn from(params: Params) -> Self {
        Self {
            key_id: None,
            params,
        }
    }
}
