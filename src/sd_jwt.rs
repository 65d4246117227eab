//! Selective-disclosure JWT credentials and presentations.
//!
//! An SD-JWT is a signed JWT VC followed by the disclosures that open
//! its hidden claims: `<jws>~<disclosure>~<disclosure>...`. Holders
//! derive presentations by keeping a subset of the disclosures; the
//! signature never changes because the payload only commits to digests.
//!
//! Multi-credential presentations use a grouped wire form,
//! `<vp-jws>~<g1>&<g2>&...&<gN>`, where group K holds the disclosures
//! for the K-th credential of `vp.verifiableCredential`. Group position
//! is significant and checked strictly.

use std::collections::HashMap as Map;

use serde_json::Value;

use crate::did_resolve::DIDResolver;
use crate::disclosure::{digest_disclosure, Disclosure};
use crate::error::Error;
use crate::jwt;
use crate::key::KeyMaterial;
use crate::vc::{create_presentation, CredentialOrJWT, JWTClaims};

pub const DISCLOSURE_SEPARATOR: char = '~';
pub const GROUP_SEPARATOR: char = '&';

/// A verified SD-JWT credential: its JWT claims plus the claims opened
/// by the supplied disclosures.
#[derive(Debug)]
pub struct VerifiedCredential {
    pub claims: JWTClaims,
    pub disclosed: Map<String, Value>,
}

/// A verified SD presentation. `disclosed[i]` holds the claims opened
/// for the i-th credential of the presentation.
#[derive(Debug)]
pub struct VerifiedPresentation {
    pub holder: Option<String>,
    pub credentials: Vec<JWTClaims>,
    pub disclosed: Vec<Map<String, Value>>,
}

/// Issue an SD-JWT: hide `claims_to_hide` from the credential subject
/// behind salted digest commitments and append their disclosures.
///
/// The payload is taken by value; callers keep their original. Hidden
/// claim values must be JSON primitives.
pub fn issue_sd(
    key: &KeyMaterial,
    mut claims: JWTClaims,
    hash_alg: &str,
    claims_to_hide: &[&str],
) -> Result<String, Error> {
    let mut rng = rand::rngs::OsRng {};
    let vc = claims
        .verifiable_credential
        .as_mut()
        .ok_or(Error::MissingCredential)?;
    let subject = &mut vc.credential_subject;

    let mut disclosures = Vec::with_capacity(claims_to_hide.len());
    let mut digests = Vec::with_capacity(claims_to_hide.len());
    for name in claims_to_hide {
        let value = subject
            .property_set
            .as_mut()
            .and_then(|properties| properties.remove(*name))
            .ok_or_else(|| Error::MissingClaim(name.to_string()))?;
        let disclosure = Disclosure::new_with_rng(&mut rng, name, value)?;
        let encoded = disclosure.encode()?;
        digests.push(digest_disclosure(hash_alg, &encoded)?);
        disclosures.push(encoded);
    }
    digests.sort();
    subject.sd = Some(digests);
    vc.sd_alg = Some(hash_alg.to_string());

    let jws = jwt::encode_sign(&claims, key)?;
    let mut segments = vec![jws];
    segments.extend(disclosures);
    Ok(segments.join("~"))
}

/// Derive a new SD-JWT revealing only the claims named in `reveal`.
///
/// Disclosures are filtered, never re-encoded, so the issuer signature
/// stays valid. Revealing nothing yields the bare JWS.
pub fn disclose(sd_jwt: &str, reveal: &[&str]) -> Result<String, Error> {
    let mut parts = sd_jwt.split(DISCLOSURE_SEPARATOR);
    let jws = parts.next().ok_or(Error::InvalidJWS)?;
    let disclosures: Vec<&str> = parts.collect();
    if disclosures.is_empty() {
        return Err(Error::NoDisclosures);
    }
    let mut kept = vec![jws];
    for encoded in disclosures {
        if encoded.is_empty() {
            continue;
        }
        let disclosure = Disclosure::parse(encoded)?;
        if reveal.contains(&disclosure.name.as_str()) {
            kept.push(encoded);
        }
    }
    Ok(kept.join("~"))
}

/// Present multiple SD-JWT credentials as one signed presentation.
///
/// `reveal_sets[i]` names the claims to open for `credentials[i]`; the
/// positional correspondence is carried through to the wire form. A
/// credential revealing nothing contributes an empty group.
pub fn present_vp(
    holder: &KeyMaterial,
    credentials: &[String],
    reveal_sets: &[Vec<&str>],
) -> Result<String, Error> {
    if credentials.len() != reveal_sets.len() {
        return Err(Error::GroupCountMismatch);
    }

    let mut bare_credentials = Vec::with_capacity(credentials.len());
    let mut groups = Vec::with_capacity(credentials.len());
    for (sd_jwt, reveal) in credentials.iter().zip(reveal_sets) {
        let mut parts = sd_jwt.split(DISCLOSURE_SEPARATOR);
        let jws = parts.next().ok_or(Error::InvalidJWS)?;
        let mut kept = Vec::new();
        for encoded in parts {
            if encoded.is_empty() {
                continue;
            }
            let disclosure = Disclosure::parse(encoded)?;
            if reveal.contains(&disclosure.name.as_str()) {
                kept.push(encoded);
            }
        }
        bare_credentials.push(CredentialOrJWT::JWT(jws.to_string()));
        groups.push(kept.join("~"));
    }

    let presentation = create_presentation(&holder.did, bare_credentials);
    let vp_jws = jwt::encode_sign(&presentation.to_jwt_claims(), holder)?;
    Ok(format!("{}~{}", vp_jws, groups.join("&")))
}

/// Verify a single SD-JWT: issuer signature plus every supplied
/// disclosure.
pub async fn verify_sd_jwt(
    sd_jwt: &str,
    resolver: &dyn DIDResolver,
) -> Result<VerifiedCredential, Error> {
    let (jws, tail) = match sd_jwt.split_once(DISCLOSURE_SEPARATOR) {
        Some((jws, tail)) => (jws, tail),
        None => (sd_jwt, ""),
    };
    let claims: JWTClaims = jwt::decode_verify_resolved(jws, resolver).await?;
    let disclosed = disclosed_claims(&claims, tail)?;
    Ok(VerifiedCredential { claims, disclosed })
}

/// Verify an SD presentation: the holder's signature on the VP, each
/// enclosed credential's issuer signature, and every disclosure against
/// its credential's `_sd` commitments.
pub async fn verify_vp(
    presentation: &str,
    resolver: &dyn DIDResolver,
) -> Result<VerifiedPresentation, Error> {
    let (vp_jws, tail) = presentation
        .split_once(DISCLOSURE_SEPARATOR)
        .ok_or(Error::NoDisclosures)?;
    let vp_claims: JWTClaims = jwt::decode_verify_resolved(vp_jws, resolver).await?;
    let vp = vp_claims
        .verifiable_presentation
        .as_ref()
        .ok_or(Error::MissingPresentation)?;

    let mut credentials = Vec::with_capacity(vp.verifiable_credential.len());
    for credential in &vp.verifiable_credential {
        match credential {
            CredentialOrJWT::JWT(jws) => credentials.push(jws.as_str()),
            CredentialOrJWT::Credential(_) => return Err(Error::ExpectedJWTCredential),
        }
    }

    let groups: Vec<&str> = tail.split(GROUP_SEPARATOR).collect();
    if groups.len() != credentials.len() {
        return Err(Error::GroupCountMismatch);
    }

    let mut verified = Vec::with_capacity(credentials.len());
    let mut disclosed = Vec::with_capacity(credentials.len());
    for (vc_jws, group) in credentials.into_iter().zip(groups) {
        let vc_claims: JWTClaims = jwt::decode_verify_resolved(vc_jws, resolver).await?;
        disclosed.push(disclosed_claims(&vc_claims, group)?);
        verified.push(vc_claims);
    }

    Ok(VerifiedPresentation {
        holder: vp_claims.issuer.clone(),
        credentials: verified,
        disclosed,
    })
}

/// Check a `~`-separated disclosure group against a verified
/// credential's commitments and rebuild the opened claims.
fn disclosed_claims(claims: &JWTClaims, group: &str) -> Result<Map<String, Value>, Error> {
    let mut opened = Map::new();
    let encoded_disclosures: Vec<&str> = group
        .split(DISCLOSURE_SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect();
    if encoded_disclosures.is_empty() {
        return Ok(opened);
    }

    let vc = claims
        .verifiable_credential
        .as_ref()
        .ok_or(Error::MissingCredential)?;
    let sd_alg = vc.sd_alg.as_deref().ok_or(Error::MissingSdAlg)?;
    let empty = Vec::new();
    let sd = vc.credential_subject.sd.as_ref().unwrap_or(&empty);

    for encoded in encoded_disclosures {
        let digest = digest_disclosure(sd_alg, encoded)?;
        if !sd.contains(&digest) {
            return Err(Error::DisclosureMismatch);
        }
        let disclosure = Disclosure::parse(encoded)?;
        opened.insert(disclosure.name, disclosure.value);
    }
    Ok(opened)
}
