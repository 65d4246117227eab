//! Digest agility for disclosure commitments.
//!
//! The `_sd_alg` claim names the JWS algorithm whose digest function
//! commits to hidden claims. Signature algorithms map to the digest they
//! are defined over; bare digest names pass through normalized.

use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::Error;

/// Map an IANA JWS algorithm identifier to a digest identifier.
pub fn digest_name(hash_alg: &str) -> String {
    match hash_alg {
        "ES256K" => "sha256".to_string(),
        "EdDSA" => "sha512".to_string(),
        other => other.replace('-', "").to_lowercase(),
    }
}

/// Hash `data` with the digest behind `hash_alg`.
///
/// Dispatch is over an explicit allow-list; names that normalize to
/// anything else fail with [`Error::UnsupportedAlg`].
pub fn digest(hash_alg: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    match digest_name(hash_alg).as_str() {
        "sha256" => Ok(Sha256::digest(data).to_vec()),
        "sha384" => Ok(Sha384::digest(data).to_vec()),
        "sha512" => Ok(Sha512::digest(data).to_vec()),
        _ => Err(Error::UnsupportedAlg(hash_alg.to_string())),
    }
}
