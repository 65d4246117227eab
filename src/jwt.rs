use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::did_resolve::DIDResolver;
use crate::error::Error;
use crate::jws::{self, Header};
use crate::key::KeyMaterial;

// RFC 7519 - JSON Web Token (JWT)

pub fn encode_sign<Claims: Serialize>(claims: &Claims, key: &KeyMaterial) -> Result<String, Error> {
    let payload = serde_json::to_string(claims)?;
    let header = Header {
        algorithm: key.algorithm,
        key_id: Some(key.did.clone()),
        type_: Some("JWT".to_string()),
    };
    jws::encode_sign_custom_header(&payload, key, &header)
}

pub fn decode_verify<Claims: DeserializeOwned>(
    jwt: &str,
    key: &KeyMaterial,
) -> Result<Claims, Error> {
    let (_header, payload) = jws::decode_verify(jwt, key)?;
    let claims = serde_json::from_slice(&payload)?;
    Ok(claims)
}

pub fn decode_unverified<Claims: DeserializeOwned>(jwt: &str) -> Result<Claims, Error> {
    let (_header, payload) = jws::decode_unverified(jwt)?;
    let claims = serde_json::from_slice(&payload)?;
    Ok(claims)
}

#[derive(Deserialize)]
struct IssuerClaim {
    iss: Option<String>,
}

/// Verify a JWT against the key its `iss` claim resolves to.
pub async fn decode_verify_resolved<Claims: DeserializeOwned>(
    jwt: &str,
    resolver: &dyn DIDResolver,
) -> Result<Claims, Error> {
    let (_header, payload) = jws::decode_unverified(jwt)?;
    let unverified: IssuerClaim = serde_json::from_slice(&payload)?;
    let issuer = unverified.iss.ok_or(Error::MissingIssuer)?;
    let key = resolver.resolve(&issuer).await?;
    decode_verify(jwt, &key)
}
