//! # JSON Web Encryption (JWE)
//!
//! JWE ([RFC7516]) specifies how encrypted content can be represented using
//! JSON. See JWA ([RFC7518]) for the cryptographic algorithms and
//! identifiers used here.
//!
//! This crate implements the compact serialization with the `dir`,
//! `A128KW`/`A192KW`/`A256KW`, `RSA-OAEP` and `ECDH-ES` key management
//! algorithms over the AES-GCM content encryption family.
//!
//! ```
//! use rjose_jwe::{ContentEncryptionAlgorithm, Jwe, JweHeader, KeyManagementAlgorithm};
//! use rjose_jwk::JWK;
//!
//! # fn main() -> Result<(), rjose_jwe::Error> {
//! let key = JWK::generate_oct(256)?;
//! let mut header = JweHeader::new();
//! header.set_algorithm(KeyManagementAlgorithm::Dir);
//! header.set_content_encryption(ContentEncryptionAlgorithm::A256Gcm);
//!
//! let jwe = Jwe::encrypt(&key, header, b"attack at dawn")?;
//! let compact = jwe.to_compact();
//!
//! let received = Jwe::from_compact(&compact)?;
//! assert_eq!(received.decrypt(&key)?, b"attack at dawn");
//! # Ok(())
//! # }
//! ```
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use core::fmt;
use std::str::FromStr;

use rand::{rngs::OsRng, RngCore};

use rjose_jwk::{base64url, JWK};

pub mod alg;
pub use alg::KeyManagementAlgorithm;

pub mod enc;
pub use enc::ContentEncryptionAlgorithm;

mod error;
pub use error::Error;

mod header;
pub use header::JweHeader;

/// A JWE object: the parsed protected header plus the five parts of the
/// compact serialization.
///
/// The base64url form of the header is kept verbatim because it is the AEAD
/// associated data; re-serializing the parsed header on the receiving side
/// would break authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jwe {
    protected: JweHeader,
    protected_b64: String,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl Jwe {
    /// Encrypt `plaintext` for `recipient` under the header's `(alg, enc)`
    /// pair. The header is consumed: for ECDH-ES the ephemeral public key is
    /// added to it, and after encryption its bytes are fixed.
    pub fn encrypt(recipient: &JWK, header: JweHeader, plaintext: &[u8]) -> Result<Jwe, Error> {
        Self::encrypt_inner(recipient, header, plaintext, None)
    }

    /// Encrypt with a caller-fixed ECDH-ES ephemeral key instead of a fresh
    /// one, so the key derivation can be exercised with known inputs.
    #[cfg(test)]
    pub(crate) fn encrypt_with_ephemeral(
        recipient: &JWK,
        header: JweHeader,
        plaintext: &[u8],
        ephemeral: JWK,
    ) -> Result<Jwe, Error> {
        Self::encrypt_inner(recipient, header, plaintext, Some(ephemeral))
    }

    fn encrypt_inner(
        recipient: &JWK,
        mut header: JweHeader,
        plaintext: &[u8],
        ephemeral: Option<JWK>,
    ) -> Result<Jwe, Error> {
        let alg = header.algorithm()?;
        let enc = header.content_encryption()?;
        if alg != KeyManagementAlgorithm::EcdhEs && header.claim("epk").is_some() {
            return Err(Error::UnexpectedEphemeralKey);
        }

        let (cek, encrypted_key) = alg::determine_cek(alg, enc, recipient, &mut header, ephemeral)?;

        // the header is final from here on; its encoded form is the AAD
        let protected_b64 = base64url::encode(header.to_bytes()?);

        // fresh IV for every encryption, generated only once the CEK and
        // header are fixed
        let mut iv = vec![0u8; enc.iv_size()];
        OsRng.fill_bytes(&mut iv);

        let (ciphertext, tag) = enc::seal(enc, &cek, &iv, protected_b64.as_bytes(), plaintext)?;

        Ok(Jwe {
            protected: header,
            protected_b64,
            encrypted_key,
            iv,
            ciphertext,
            tag,
        })
    }

    /// Recover the plaintext with the recipient's key. All cryptographic
    /// failures surface as [`Error::Crypto`] without further detail.
    pub fn decrypt(&self, recipient: &JWK) -> Result<Vec<u8>, Error> {
        let alg = self.protected.algorithm()?;
        let enc = self.protected.content_encryption()?;
        let cek = alg::recover_cek(alg, enc, recipient, &self.protected, &self.encrypted_key)?;
        enc::open(
            enc,
            &cek,
            &self.iv,
            self.protected_b64.as_bytes(),
            &self.ciphertext,
            &self.tag,
        )
    }

    /// Compact serialization (RFC 7516 §7.1): five base64url segments joined
    /// by `.`. The encrypted key segment is empty for `dir` and `ECDH-ES`.
    pub fn to_compact(&self) -> String {
        format!(
            "{}.{}.{}.{}.{}",
            self.protected_b64,
            base64url::encode(&self.encrypted_key),
            base64url::encode(&self.iv),
            base64url::encode(&self.ciphertext),
            base64url::encode(&self.tag),
        )
    }

    /// Parse a compact serialization. The header must carry a supported
    /// `(alg, enc)` pair and the IV and tag must have the widths the
    /// content encryption algorithm demands.
    pub fn from_compact(input: &str) -> Result<Jwe, Error> {
        let parts: Vec<&str> = input.split('.').collect();
        let &[protected_b64, encrypted_key, iv, ciphertext, tag] = parts.as_slice() else {
            return Err(Error::InvalidSegmentCount(parts.len()));
        };

        let protected = JweHeader::from_slice(&base64url::decode(protected_b64)?)?;
        protected.algorithm()?;
        let enc = protected.content_encryption()?;

        let encrypted_key = base64url::decode(encrypted_key)?;
        let iv = base64url::decode(iv)?;
        let ciphertext = base64url::decode(ciphertext)?;
        let tag = base64url::decode(tag)?;

        if iv.len() != enc.iv_size() {
            return Err(Error::IvLength {
                expected: enc.iv_size(),
                actual: iv.len(),
            });
        }
        if tag.len() != enc.tag_size() {
            return Err(Error::TagLength {
                expected: enc.tag_size(),
                actual: tag.len(),
            });
        }

        Ok(Jwe {
            protected,
            protected_b64: protected_b64.to_string(),
            encrypted_key,
            iv,
            ciphertext,
            tag,
        })
    }

    pub fn header(&self) -> &JweHeader {
        &self.protected
    }

    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }
}

impl fmt::Display for Jwe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact())
    }
}

impl FromStr for Jwe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_compact(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const OCT_256_K: &str = "AAPapAv4LbFbiVawEjagUBluYqN5rhna-8nuldDvOx8";

    fn oct_key(len: usize) -> JWK {
        JWK::generate_oct(len * 8).unwrap()
    }

    fn header_for(alg: KeyManagementAlgorithm, enc: ContentEncryptionAlgorithm) -> JweHeader {
        let mut header = JweHeader::new();
        header.set_algorithm(alg);
        header.set_content_encryption(enc);
        header
    }

    fn reassemble(parts: &[&str]) -> String {
        parts.join(".")
    }

    /// Flip one bit inside the decoded form of segment `index`, re-encode.
    fn tamper_segment(compact: &str, index: usize) -> String {
        let mut parts: Vec<String> = compact.split('.').map(str::to_string).collect();
        let mut bytes = base64url::decode(&parts[index]).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        parts[index] = base64url::encode(&bytes);
        parts.join(".")
    }

    #[test]
    fn dir_a256gcm_round_trip() {
        let key = JWK::from_oct_bytes(&base64url::decode(OCT_256_K).unwrap()).unwrap();
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );

        let jwe = Jwe::encrypt(&key, header, b"Hello world!").unwrap();
        let compact = jwe.to_compact();
        assert_eq!(compact.split('.').count(), 5);
        // dir leaves the encrypted key segment empty
        assert!(compact.contains(".."));

        let received = Jwe::from_compact(&compact).unwrap();
        assert_eq!(received, jwe);
        assert_eq!(received.decrypt(&key).unwrap(), b"Hello world!");
    }

    #[test]
    fn round_trip_every_supported_pair() {
        let encs = [
            ContentEncryptionAlgorithm::A128Gcm,
            ContentEncryptionAlgorithm::A192Gcm,
            ContentEncryptionAlgorithm::A256Gcm,
        ];
        let plaintext = b"the quick brown fox";

        for enc in encs {
            let key = oct_key(enc.key_size());
            let jwe =
                Jwe::encrypt(&key, header_for(KeyManagementAlgorithm::Dir, enc), plaintext)
                    .unwrap();
            assert_eq!(jwe.decrypt(&key).unwrap(), plaintext);
        }

        for (alg, kek_len) in [
            (KeyManagementAlgorithm::A128Kw, 16),
            (KeyManagementAlgorithm::A192Kw, 24),
            (KeyManagementAlgorithm::A256Kw, 32),
        ] {
            for enc in encs {
                let key = oct_key(kek_len);
                let jwe = Jwe::encrypt(&key, header_for(alg, enc), plaintext).unwrap();
                assert_eq!(jwe.encrypted_key().len(), enc.key_size() + 8);
                let received = Jwe::from_compact(&jwe.to_compact()).unwrap();
                assert_eq!(received.decrypt(&key).unwrap(), plaintext);
            }
        }

        let rsa = JWK::generate_rsa(2048, None).unwrap();
        for enc in encs {
            let jwe = Jwe::encrypt(
                &rsa.to_public(),
                header_for(KeyManagementAlgorithm::RsaOaep, enc),
                plaintext,
            )
            .unwrap();
            let received = Jwe::from_compact(&jwe.to_compact()).unwrap();
            assert_eq!(received.decrypt(&rsa).unwrap(), plaintext);
        }

        let ec = JWK::generate_p256();
        let jwe = Jwe::encrypt(
            &ec.to_public(),
            header_for(
                KeyManagementAlgorithm::EcdhEs,
                ContentEncryptionAlgorithm::A256Gcm,
            ),
            plaintext,
        )
        .unwrap();
        assert!(jwe.encrypted_key().is_empty());
        assert!(jwe.header().claim("epk").is_some());
        let received = Jwe::from_compact(&jwe.to_compact()).unwrap();
        assert_eq!(received.decrypt(&ec).unwrap(), plaintext);
    }

    #[test]
    fn ecdh_es_works_on_higher_curves() {
        for key in [JWK::generate_p384(), JWK::generate_p521()] {
            let jwe = Jwe::encrypt(
                &key.to_public(),
                header_for(
                    KeyManagementAlgorithm::EcdhEs,
                    ContentEncryptionAlgorithm::A256Gcm,
                ),
                b"payload",
            )
            .unwrap();
            assert_eq!(jwe.decrypt(&key).unwrap(), b"payload");
        }
    }

    #[test]
    fn ecdh_es_derivation_with_fixed_ephemeral() {
        use hkdf::Hkdf;
        use rjose_jwk::{Curve, EcParams, Params};
        use sha2::Sha256;

        // fixed recipient and ephemeral pairs make the derivation reproducible
        let recipient = JWK::from(Params::Ec(
            EcParams::from_secret_bytes(Curve::P256, &[0x02; 32]).unwrap(),
        ));
        let ephemeral = JWK::from(Params::Ec(
            EcParams::from_secret_bytes(Curve::P256, &[0x03; 32]).unwrap(),
        ));

        // expected CEK: HKDF-SHA256 expansion of the x-coordinate shared
        // secret to 32 bytes
        let secret = p256::SecretKey::from_slice(&[0x03; 32]).unwrap();
        let public = p256::SecretKey::from_slice(&[0x02; 32]).unwrap().public_key();
        let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        let mut expected_cek = [0u8; 32];
        Hkdf::<Sha256>::new(None, shared.raw_secret_bytes())
            .expand(&[], &mut expected_cek)
            .unwrap();

        let header = header_for(
            KeyManagementAlgorithm::EcdhEs,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        let jwe = Jwe::encrypt_with_ephemeral(
            &recipient.to_public(),
            header,
            b"Hello world!",
            ephemeral.clone(),
        )
        .unwrap();

        // the header carries exactly the fixed ephemeral public key
        let epk = JWK::from_json_value(jwe.header().claim("epk").unwrap()).unwrap();
        assert!(epk.is_public());
        assert!(epk.equals_public(&ephemeral));

        // the ciphertext opens under the independently computed CEK
        let compact = jwe.to_compact();
        let parts: Vec<&str> = compact.split('.').collect();
        let plaintext = enc::open(
            ContentEncryptionAlgorithm::A256Gcm,
            &expected_cek,
            jwe.iv(),
            parts[0].as_bytes(),
            jwe.ciphertext(),
            jwe.tag(),
        )
        .unwrap();
        assert_eq!(plaintext, b"Hello world!");

        // and the recipient recovers it through the normal path
        assert_eq!(jwe.decrypt(&recipient).unwrap(), b"Hello world!");
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let key = oct_key(32);
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        let jwe = Jwe::encrypt(&key, header, b"").unwrap();
        assert!(jwe.ciphertext().is_empty());
        let received = Jwe::from_compact(&jwe.to_compact()).unwrap();
        assert_eq!(received.decrypt(&key).unwrap(), b"");
    }

    #[test]
    fn tag_tamper_fails_with_crypto() {
        let key = oct_key(32);
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        let compact = Jwe::encrypt(&key, header, b"Hello world!").unwrap().to_compact();

        let tampered = tamper_segment(&compact, 4);
        let received = Jwe::from_compact(&tampered).unwrap();
        assert!(matches!(received.decrypt(&key), Err(Error::Crypto)));
    }

    #[test]
    fn iv_and_ciphertext_tamper_fail_with_crypto() {
        let key = oct_key(32);
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        let compact = Jwe::encrypt(&key, header, b"Hello world!").unwrap().to_compact();

        for segment in [2, 3] {
            let received = Jwe::from_compact(&tamper_segment(&compact, segment)).unwrap();
            assert!(matches!(received.decrypt(&key), Err(Error::Crypto)));
        }
    }

    #[test]
    fn encrypted_key_tamper_fails_with_crypto() {
        let key = oct_key(32);
        let header = header_for(
            KeyManagementAlgorithm::A256Kw,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        let compact = Jwe::encrypt(&key, header, b"Hello world!").unwrap().to_compact();

        let received = Jwe::from_compact(&tamper_segment(&compact, 1)).unwrap();
        assert!(matches!(received.decrypt(&key), Err(Error::Crypto)));
    }

    #[test]
    fn aad_change_fails_with_crypto() {
        let key = oct_key(32);
        let mut header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        header.set_key_id("0000");
        let compact = Jwe::encrypt(&key, header, b"Hello world!").unwrap().to_compact();

        // alter the authenticated header bytes while keeping them valid JSON
        let parts: Vec<&str> = compact.split('.').collect();
        let header_json = String::from_utf8(base64url::decode(parts[0]).unwrap()).unwrap();
        let altered = header_json.replace("\"0000\"", "\"0001\"");
        assert_ne!(altered, header_json);
        let tampered = reassemble(&[
            &base64url::encode(altered.as_bytes()),
            parts[1],
            parts[2],
            parts[3],
            parts[4],
        ]);

        let received = Jwe::from_compact(&tampered).unwrap();
        assert!(matches!(received.decrypt(&key), Err(Error::Crypto)));
    }

    #[test]
    fn decrypt_with_wrong_key_fails_with_crypto() {
        let key = oct_key(32);
        let other = oct_key(32);
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        let jwe = Jwe::encrypt(&key, header, b"secret").unwrap();
        assert!(matches!(jwe.decrypt(&other), Err(Error::Crypto)));
    }

    #[test]
    fn import_rejects_wrong_segment_count() {
        assert!(matches!(
            Jwe::from_compact("aa.bb.cc.dd"),
            Err(Error::InvalidSegmentCount(4))
        ));
        assert!(matches!(
            Jwe::from_compact("aa.bb.cc.dd.ee.ff"),
            Err(Error::InvalidSegmentCount(6))
        ));
    }

    #[test]
    fn import_rejects_missing_or_unknown_algorithms() {
        let iv = base64url::encode([0u8; 12]);
        let tag = base64url::encode([0u8; 16]);

        let no_enc = base64url::encode(br#"{"alg":"dir"}"#);
        assert!(matches!(
            Jwe::from_compact(&format!("{no_enc}..{iv}..{tag}")),
            Err(Error::MissingHeaderParameter("enc"))
        ));

        let no_alg = base64url::encode(br#"{"enc":"A256GCM"}"#);
        assert!(matches!(
            Jwe::from_compact(&format!("{no_alg}..{iv}..{tag}")),
            Err(Error::MissingHeaderParameter("alg"))
        ));

        let bad_alg = base64url::encode(br#"{"alg":"RSA1_5","enc":"A256GCM"}"#);
        assert!(matches!(
            Jwe::from_compact(&format!("{bad_alg}..{iv}..{tag}")),
            Err(Error::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn import_checks_iv_and_tag_widths() {
        let header = base64url::encode(br#"{"alg":"dir","enc":"A256GCM"}"#);
        let short_iv = base64url::encode([0u8; 8]);
        let iv = base64url::encode([0u8; 12]);
        let short_tag = base64url::encode([0u8; 8]);
        let tag = base64url::encode([0u8; 16]);

        assert!(matches!(
            Jwe::from_compact(&format!("{header}..{short_iv}..{tag}")),
            Err(Error::IvLength {
                expected: 12,
                actual: 8
            })
        ));
        assert!(matches!(
            Jwe::from_compact(&format!("{header}..{iv}..{short_tag}")),
            Err(Error::TagLength {
                expected: 16,
                actual: 8
            })
        ));
    }

    #[test]
    fn encrypt_validates_key_and_header() {
        // dir requires an oct key of the enc's width
        let short = oct_key(16);
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        assert!(matches!(
            Jwe::encrypt(&short, header, b"x"),
            Err(Error::CekLength {
                expected: 32,
                actual: 16
            })
        ));

        // key type must match the algorithm
        let ec = JWK::generate_p256();
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        assert!(matches!(
            Jwe::encrypt(&ec, header, b"x"),
            Err(Error::KeyTypeMismatch("dir"))
        ));

        // epk is reserved for ECDH-ES output
        let key = oct_key(32);
        let mut header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        header.set_claim("epk", "bogus");
        assert!(matches!(
            Jwe::encrypt(&key, header, b"x"),
            Err(Error::UnexpectedEphemeralKey)
        ));

        // the 32-byte derived key cannot serve a 128-bit enc
        let ec = JWK::generate_p256();
        let header = header_for(
            KeyManagementAlgorithm::EcdhEs,
            ContentEncryptionAlgorithm::A128Gcm,
        );
        assert!(matches!(
            Jwe::encrypt(&ec.to_public(), header, b"x"),
            Err(Error::CekLength { .. })
        ));
    }

    #[test]
    fn custom_claims_are_authenticated_pass_through() {
        let key = oct_key(32);
        let mut header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        header.set_claim("x-request", "r-42");
        let jwe = Jwe::encrypt(&key, header, b"data").unwrap();
        let received = Jwe::from_compact(&jwe.to_compact()).unwrap();
        assert_eq!(
            received.header().claim("x-request").and_then(|v| v.as_str()),
            Some("r-42")
        );
        assert_eq!(received.decrypt(&key).unwrap(), b"data");
    }

    #[test]
    fn ivs_are_unique_across_encryptions() {
        let key = oct_key(32);
        let mut seen = HashSet::new();
        for _ in 0..1024 {
            let header = header_for(
                KeyManagementAlgorithm::Dir,
                ContentEncryptionAlgorithm::A256Gcm,
            );
            let jwe = Jwe::encrypt(&key, header, b"fixed input").unwrap();
            assert!(seen.insert(jwe.iv().to_vec()));
        }
    }

    #[test]
    fn ceks_are_unique_across_encryptions() {
        // AES-KW is deterministic, so distinct wrapped keys mean distinct CEKs
        let key = oct_key(32);
        let mut seen = HashSet::new();
        for _ in 0..1024 {
            let header = header_for(
                KeyManagementAlgorithm::A256Kw,
                ContentEncryptionAlgorithm::A256Gcm,
            );
            let jwe = Jwe::encrypt(&key, header, b"fixed input").unwrap();
            assert!(seen.insert(jwe.encrypted_key().to_vec()));
        }
    }

    #[test]
    fn display_and_from_str() {
        let key = oct_key(32);
        let header = header_for(
            KeyManagementAlgorithm::Dir,
            ContentEncryptionAlgorithm::A256Gcm,
        );
        let jwe = Jwe::encrypt(&key, header, b"abc").unwrap();
        let parsed: Jwe = jwe.to_string().parse().unwrap();
        assert_eq!(parsed, jwe);
    }
}
