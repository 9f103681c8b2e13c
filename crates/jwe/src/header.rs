//! The JWE protected header: an insertion-ordered set of header parameters.
//!
//! Order matters because the serialized header doubles as the AEAD
//! associated data, so the emitted bytes must be reproducible.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rjose_jwk::JWK;

use crate::alg::KeyManagementAlgorithm;
use crate::enc::ContentEncryptionAlgorithm;
use crate::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JweHeader {
    claims: Map<String, Value>,
}

impl JweHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary header parameter. Values are restricted to strings
    /// at the public surface.
    pub fn set_claim(&mut self, name: &str, value: &str) {
        self.claims
            .insert(name.to_string(), Value::String(value.to_string()));
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn set_algorithm(&mut self, alg: KeyManagementAlgorithm) {
        self.set_claim("alg", alg.name());
    }

    pub fn set_content_encryption(&mut self, enc: ContentEncryptionAlgorithm) {
        self.set_claim("enc", enc.name());
    }

    pub fn set_key_id(&mut self, kid: &str) {
        self.set_claim("kid", kid);
    }

    pub fn set_content_type(&mut self, cty: &str) {
        self.set_claim("cty", cty);
    }

    pub fn algorithm(&self) -> Result<KeyManagementAlgorithm, Error> {
        self.string_claim("alg")?.parse()
    }

    pub fn content_encryption(&self) -> Result<ContentEncryptionAlgorithm, Error> {
        self.string_claim("enc")?.parse()
    }

    pub fn key_id(&self) -> Option<&str> {
        self.claims.get("kid").and_then(Value::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.claims.get("cty").and_then(Value::as_str)
    }

    pub(crate) fn set_ephemeral_key(&mut self, key: &JWK) -> Result<(), Error> {
        self.claims
            .insert("epk".to_string(), serde_json::to_value(key)?);
        Ok(())
    }

    pub(crate) fn ephemeral_key(&self) -> Result<JWK, Error> {
        let value = self
            .claims
            .get("epk")
            .ok_or(Error::MissingHeaderParameter("epk"))?;
        Ok(JWK::from_json_value(value)?)
    }

    /// Compact JSON in insertion order; the bytes that get base64url
    /// encoded and authenticated.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(&self.claims)?)
    }

    pub(crate) fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn string_claim(&self, name: &'static str) -> Result<&str, Error> {
        self.claims
            .get(name)
            .ok_or(Error::MissingHeaderParameter(name))?
            .as_str()
            .ok_or(Error::MissingHeaderParameter(name))
    }
}
