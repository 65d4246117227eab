use rand::{CryptoRng, Rng};
use serde_json::Value;

use crate::error::Error;
use crate::hash;

/// Salt length in bytes, before base64url encoding.
pub const SALT_LENGTH: usize = 128 / 8;

/// A single selectively disclosable claim: a salted `[salt, name, value]`
/// triple committed to by a digest inside the signed credential.
///
/// Only primitive claim values can be disclosed; objects and arrays fail
/// with [`Error::NestedNotSupported`].
#[derive(Debug, Clone, PartialEq)]
pub struct Disclosure {
    /// 16 random bytes, base64url-encoded.
    pub salt: String,
    pub name: String,
    pub value: Value,
}

fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null
    )
}

impl Disclosure {
    /// Create a disclosure with a fresh salt from the system CSPRNG.
    pub fn new(name: &str, value: Value) -> Result<Self, Error> {
        let mut rng = rand::rngs::OsRng {};
        Self::new_with_rng(&mut rng, name, value)
    }

    pub fn new_with_rng<R: Rng + CryptoRng>(
        rng: &mut R,
        name: &str,
        value: Value,
    ) -> Result<Self, Error> {
        if !is_primitive(&value) {
            return Err(Error::NestedNotSupported);
        }
        let mut salt_bytes = [0u8; SALT_LENGTH];
        rng.fill_bytes(&mut salt_bytes);
        Ok(Self {
            salt: base64::encode_config(salt_bytes, base64::URL_SAFE_NO_PAD),
            name: name.to_string(),
            value,
        })
    }

    /// Wire form: `base64url(json([salt, name, value]))`, compact JSON,
    /// no padding.
    pub fn encode(&self) -> Result<String, Error> {
        let json = serde_json::to_string(&serde_json::json!([self.salt, self.name, self.value]))?;
        Ok(base64::encode_config(json, base64::URL_SAFE_NO_PAD))
    }

    /// Decode the wire form. The JSON array must have exactly three
    /// elements with a string salt and claim name.
    pub fn parse(encoded: &str) -> Result<Self, Error> {
        let bytes = base64::decode_config(encoded, base64::URL_SAFE_NO_PAD)
            .map_err(|_| Error::MalformedDisclosure)?;
        let json: Value =
            serde_json::from_slice(&bytes).map_err(|_| Error::MalformedDisclosure)?;
        let values = match &json {
            Value::Array(values) if values.len() == 3 => values,
            _ => return Err(Error::MalformedDisclosure),
        };
        let salt = values[0].as_str().ok_or(Error::MalformedDisclosure)?;
        let name = values[1].as_str().ok_or(Error::MalformedDisclosure)?;
        Ok(Self {
            salt: salt.to_string(),
            name: name.to_string(),
            value: values[2].clone(),
        })
    }
}

/// Digest of an encoded disclosure, base64url without padding.
///
/// The digest is taken over the encoded string, not the decoded triple,
/// so commitments stay byte-exact.
pub fn digest_disclosure(hash_alg: &str, encoded: &str) -> Result<String, Error> {
    let digest = hash::digest(hash_alg, encoded.as_bytes())?;
    Ok(base64::encode_config(digest, base64::URL_SAFE_NO_PAD))
}
