//! Unpadded base64url (RFC 7515 §2) and the octet-string integer
//! representation used by JWK fields.

use core::fmt;

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::{DecodeError, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Encode bytes as unpadded base64url.
pub fn encode(input: impl AsRef<[u8]>) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(input)
}

/// Decode a base64url string. Canonical trailing `=` padding is stripped
/// before decoding; any other non-alphabet character is an error.
pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = input.as_ref();
    if bytes.ends_with(b"=") {
        // padding only ever brings the length up to a multiple of four
        if bytes.len() % 4 != 0 {
            return Err(DecodeError::InvalidPadding);
        }
        while let Some(rest) = bytes.strip_suffix(b"=") {
            bytes = rest;
        }
    }
    BASE64_URL_SAFE_NO_PAD.decode(bytes)
}

/// A big-endian octet string carried as a base64url JSON string, as used by
/// the `x`, `y`, `d`, `n`, `e`, `p`, `q`, `dp`, `dq`, `qi` and `k` members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Zeroize)]
pub struct Base64urlUInt(pub Vec<u8>);

impl fmt::Display for Base64urlUInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(&self.0))
    }
}

impl Serialize for Base64urlUInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64urlUInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode(&text)
            .map(Base64urlUInt)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_bytes() {
        let all: Vec<u8> = (0u8..=255).collect();
        for chunk in [&all[..], &[], &[0], &[0xff, 0xfe, 0x00]] {
            assert_eq!(decode(encode(chunk)).unwrap(), chunk);
        }
    }

    #[test]
    fn round_trip_canonical_string() {
        for s in ["", "AA", "AAE", "AAPapAv4LbFbiVawEjagUBluYqN5rhna-8nuldDvOx8"] {
            assert_eq!(encode(decode(s).unwrap()), s);
        }
    }

    #[test]
    fn padding_is_tolerated() {
        assert_eq!(decode("AAE=").unwrap(), decode("AAE").unwrap());
        assert_eq!(decode("AA==").unwrap(), decode("AA").unwrap());
    }

    #[test]
    fn rejects_bad_padding() {
        // padded input must still come in four-byte groups
        assert!(matches!(decode("AAE=="), Err(DecodeError::InvalidPadding)));
        // padding in the middle is not padding
        assert!(decode("A=AE").is_err());
    }

    #[test]
    fn rejects_standard_alphabet() {
        assert!(decode("a+b/").is_err());
        assert!(decode("a b").is_err());
    }

    #[test]
    fn uint_serializes_as_base64url_string() {
        let uint = Base64urlUInt(vec![0, 1, 2]);
        assert_eq!(serde_json::to_string(&uint).unwrap(), "\"AAEC\"");
        let parsed: Base64urlUInt = serde_json::from_str("\"AAEC\"").unwrap();
        assert_eq!(parsed, uint);
    }
}
