use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::key::{Algorithm, KeyMaterial};

// RFC 7515 - JSON Web Signature (JWS)

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Header {
    #[serde(rename = "alg")]
    pub algorithm: Algorithm,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "typ")]
    pub type_: Option<String>,
}

fn base64_encode_json<T: Serialize>(object: &T) -> Result<String, Error> {
    let json = serde_json::to_string(&object)?;
    Ok(base64::encode_config(json, base64::URL_SAFE_NO_PAD))
}

pub fn sign_bytes(algorithm: Algorithm, data: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, Error> {
    let private_key = key
        .private_key
        .as_ref()
        .ok_or(Error::MissingPrivateKey)?;
    let signature = match algorithm {
        Algorithm::ES256K => {
            use k256::ecdsa::signature::Signer;
            let signing_key = k256::ecdsa::SigningKey::from_slice(&private_key.0)
                .map_err(|_| Error::InvalidKey)?;
            let sig: k256::ecdsa::Signature =
                signing_key.try_sign(data).map_err(|_| Error::SigningFailed)?;
            sig.to_bytes().to_vec()
        }
        Algorithm::EdDSA => {
            use ed25519_dalek::Signer;
            let secret: [u8; 32] = private_key
                .0
                .as_slice()
                .try_into()
                .map_err(|_| Error::InvalidKey)?;
            let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret);
            signing_key.sign(data).to_bytes().to_vec()
        }
    };
    Ok(signature)
}

pub fn sign_bytes_b64(
    algorithm: Algorithm,
    data: &[u8],
    key: &KeyMaterial,
) -> Result<String, Error> {
    let signature = sign_bytes(algorithm, data, key)?;
    Ok(base64::encode_config(signature, base64::URL_SAFE_NO_PAD))
}

pub fn verify_bytes(
    algorithm: Algorithm,
    data: &[u8],
    key: &KeyMaterial,
    signature: &[u8],
) -> Result<(), Error> {
    if key.algorithm != algorithm {
        return Err(Error::AlgorithmMismatch);
    }
    match algorithm {
        Algorithm::ES256K => {
            use k256::ecdsa::signature::Verifier;
            let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&key.public_key.0)
                .map_err(|_| Error::InvalidKey)?;
            let sig = k256::ecdsa::Signature::from_slice(signature)
                .map_err(|_| Error::InvalidSignature)?;
            verifying_key
                .verify(data, &sig)
                .map_err(|_| Error::InvalidSignature)?;
        }
        Algorithm::EdDSA => {
            use ed25519_dalek::Verifier;
            let public: [u8; 32] = key
                .public_key
                .0
                .as_slice()
                .try_into()
                .map_err(|_| Error::InvalidKey)?;
            let verifying_key =
                ed25519_dalek::VerifyingKey::from_bytes(&public).map_err(|_| Error::InvalidKey)?;
            let sig = ed25519_dalek::Signature::from_slice(signature)
                .map_err(|_| Error::InvalidSignature)?;
            verifying_key
                .verify(data, &sig)
                .map_err(|_| Error::InvalidSignature)?;
        }
    }
    Ok(())
}

/// Sign a payload as a compact JWS.
pub fn encode_sign_custom_header(
    payload: &str,
    key: &KeyMaterial,
    header: &Header,
) -> Result<String, Error> {
    let header_b64 = base64_encode_json(header)?;
    let payload_b64 = base64::encode_config(payload, base64::URL_SAFE_NO_PAD);
    let signing_input = header_b64 + "." + &payload_b64;
    let sig_b64 = sign_bytes_b64(header.algorithm, signing_input.as_bytes(), key)?;
    Ok([signing_input, sig_b64].join("."))
}

pub fn encode_sign(algorithm: Algorithm, payload: &str, key: &KeyMaterial) -> Result<String, Error> {
    let header = Header {
        algorithm,
        key_id: Some(key.did.clone()),
        type_: None,
    };
    encode_sign_custom_header(payload, key, &header)
}

pub fn split_jws(jws: &str) -> Result<(&str, &str, &str), Error> {
    let mut parts = jws.splitn(3, '.');
    Ok(
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c), None) => (a, b, c),
            _ => return Err(Error::InvalidJWS),
        },
    )
}

pub struct DecodedJWS {
    pub header: Header,
    pub signing_input: Vec<u8>,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Decode JWS parts (JOSE header, payload, and signature) into useful values.
pub fn decode_jws_parts(
    header_b64: &str,
    payload_b64: &str,
    signature_b64: &str,
) -> Result<DecodedJWS, Error> {
    let signature = base64::decode_config(signature_b64, base64::URL_SAFE_NO_PAD)?;
    let header_json = base64::decode_config(header_b64, base64::URL_SAFE_NO_PAD)?;
    let header: Header = serde_json::from_slice(&header_json)?;
    let payload = base64::decode_config(payload_b64, base64::URL_SAFE_NO_PAD)?;
    let signing_input = [header_b64.as_bytes(), b".", payload_b64.as_bytes()].concat();
    Ok(DecodedJWS {
        header,
        signing_input,
        payload,
        signature,
    })
}

pub fn decode_verify(jws: &str, key: &KeyMaterial) -> Result<(Header, Vec<u8>), Error> {
    let (header_b64, payload_b64, signature_b64) = split_jws(jws)?;
    let DecodedJWS {
        header,
        signing_input,
        payload,
        signature,
    } = decode_jws_parts(header_b64, payload_b64, signature_b64)?;
    verify_bytes(header.algorithm, &signing_input, key, &signature)?;
    Ok((header, payload))
}

pub fn decode_unverified(jws: &str) -> Result<(Header, Vec<u8>), Error> {
    let (header_b64, payload_b64, signature_b64) = split_jws(jws)?;
    let DecodedJWS {
        header,
        signing_input: _,
        payload,
        signature: _,
    } = decode_jws_parts(header_b64, payload_b64, signature_b64)?;
    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyMaterial;

    #[test]
    fn secp256k1_sign_verify() {
        let key = KeyMaterial::generate_secp256k1("did:example:foo");
        let data = b"asdf";
        let bad_data = b"no";
        let sig = sign_bytes(Algorithm::ES256K, data, &key).unwrap();
        verify_bytes(Algorithm::ES256K, data, &key, &sig).unwrap();
        verify_bytes(Algorithm::ES256K, bad_data, &key, &sig).unwrap_err();

        let other_key = KeyMaterial::generate_secp256k1("did:example:bar");
        verify_bytes(Algorithm::ES256K, data, &other_key, &sig).unwrap_err();
    }

    #[test]
    fn ed25519_sign_verify() {
        let key = KeyMaterial::generate_ed25519("did:example:foo");
        let data = b"asdf";
        let bad_data = b"no";
        let sig = sign_bytes(Algorithm::EdDSA, data, &key).unwrap();
        verify_bytes(Algorithm::EdDSA, data, &key, &sig).unwrap();
        verify_bytes(Algorithm::EdDSA, bad_data, &key, &sig).unwrap_err();
    }

    #[test]
    fn algorithm_mismatch() {
        let key = KeyMaterial::generate_ed25519("did:example:foo");
        let sig = sign_bytes(Algorithm::EdDSA, b"data", &key).unwrap();
        assert!(matches!(
            verify_bytes(Algorithm::ES256K, b"data", &key, &sig),
            Err(Error::AlgorithmMismatch)
        ));
    }

    #[test]
    fn jws_roundtrip() {
        let key = KeyMaterial::generate_secp256k1("did:example:foo");
        let payload = "{\"iss\":\"did:example:foo\"}";
        let jws = encode_sign(Algorithm::ES256K, payload, &key).unwrap();
        let (header, decoded) = decode_verify(&jws, &key).unwrap();
        assert_eq!(header.algorithm, Algorithm::ES256K);
        assert_eq!(decoded, payload.as_bytes());

        // tampering with the payload must break the signature
        let mut parts: Vec<String> = jws.split('.').map(String::from).collect();
        parts[1] = base64::encode_config(
            "{\"iss\":\"did:example:mallory\"}",
            base64::URL_SAFE_NO_PAD,
        );
        decode_verify(&parts.join("."), &key).unwrap_err();
    }

    #[test]
    fn signing_requires_private_key() {
        let key = KeyMaterial::generate_secp256k1("did:example:foo").to_public();
        assert!(matches!(
            sign_bytes(Algorithm::ES256K, b"data", &key),
            Err(Error::MissingPrivateKey)
        ));
    }
}
