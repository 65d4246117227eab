use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// RFC 7518 - JSON Web Algorithms (JWA)

/// Signature algorithm of a key pair.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// ECDSA over secp256k1
    ES256K,
    /// Ed25519
    EdDSA,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ES256K => "ES256K",
            Self::EdDSA => "EdDSA",
        }
    }
}

/// Raw octets serialized as base64url without padding.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct Base64urlUInt(pub Vec<u8>);

impl TryFrom<String> for Base64urlUInt {
    type Error = Error;
    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(base64::decode_config(
            data,
            base64::URL_SAFE,
        )?))
    }
}

impl From<Base64urlUInt> for String {
    fn from(data: Base64urlUInt) -> String {
        base64::encode_config(data.0, base64::URL_SAFE_NO_PAD)
    }
}

/// Key pair bound to a DID.
///
/// The public half is what a [DIDResolver](crate::did_resolve::DIDResolver)
/// returns for the DID; the private half is present only on the owner's
/// side and is required for signing.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct KeyMaterial {
    pub did: String,
    #[serde(rename = "alg")]
    pub algorithm: Algorithm,
    pub public_key: Base64urlUInt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Base64urlUInt>,
}

impl KeyMaterial {
    /// Generate a secp256k1 key pair for ES256K signatures.
    ///
    /// The public key is kept in compressed SEC1 form.
    pub fn generate_secp256k1(did: &str) -> Self {
        use k256::elliptic_curve::sec1::ToEncodedPoint;
        let mut rng = rand::rngs::OsRng {};
        let signing_key = k256::ecdsa::SigningKey::random(&mut rng);
        let public_key = signing_key.verifying_key().to_encoded_point(true);
        Self {
            did: did.to_string(),
            algorithm: Algorithm::ES256K,
            public_key: Base64urlUInt(public_key.as_bytes().to_vec()),
            private_key: Some(Base64urlUInt(signing_key.to_bytes().to_vec())),
        }
    }

    /// Generate an Ed25519 key pair for EdDSA signatures.
    pub fn generate_ed25519(did: &str) -> Self {
        let mut csprng = rand::rngs::OsRng {};
        let signing_key = ed25519_dalek::SigningKey::generate(&mut csprng);
        Self {
            did: did.to_string(),
            algorithm: Algorithm::EdDSA,
            public_key: Base64urlUInt(signing_key.verifying_key().to_bytes().to_vec()),
            private_key: Some(Base64urlUInt(signing_key.to_bytes().to_vec())),
        }
    }

    /// Copy of this key with the private half dropped.
    pub fn to_public(&self) -> Self {
        Self {
            private_key: None,
            ..self.clone()
        }
    }
}
