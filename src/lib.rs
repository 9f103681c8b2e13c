//! JSON Object Signing and Encryption for Rust.
//!
//! `rjose` bundles the two core pieces of a JOSE stack:
//!
//! - [`jwk`]: JSON Web Key (RFC 7517) — octet, elliptic curve and RSA key
//!   objects with generation, JSON import/export and ECDH key derivation.
//! - [`jwe`]: JSON Web Encryption (RFC 7516) — compact serialization with
//!   `dir`, AES Key Wrap, `RSA-OAEP` and `ECDH-ES` key management over the
//!   AES-GCM content encryption family.

pub use rjose_jwk as jwk;

pub use rjose_jwe as jwe;

pub use rjose_jwe::{ContentEncryptionAlgorithm, Jwe, JweHeader, KeyManagementAlgorithm};
pub use rjose_jwk::{Curve, Params, JWK};
