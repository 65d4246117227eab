use std::collections::HashMap as Map;
use std::convert::TryFrom;
use std::fmt;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::did_resolve::DIDResolver;
use crate::error::Error;
use crate::jwt;
use crate::key::KeyMaterial;
use crate::one_or_many::OneOrMany;

// Data structures for Verifiable Credentials
// https://www.w3.org/TR/vc-data-model/

pub const DEFAULT_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "String")]
#[serde(untagged)]
pub enum URI {
    String(String),
}

impl TryFrom<String> for URI {
    type Error = Error;
    fn try_from(uri: String) -> Result<Self, Self::Error> {
        if uri.contains(':') {
            Ok(URI::String(uri))
        } else {
            Err(Error::URI)
        }
    }
}

impl From<URI> for String {
    fn from(uri: URI) -> String {
        let URI::String(string) = uri;
        string
    }
}

impl fmt::Display for URI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let URI::String(string) = self;
        string.fmt(f)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: OneOrMany<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<URI>,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    pub credential_subject: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<URI>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>, // must be RFC3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Status>,
    /// JWS algorithm whose digest commits to the `_sd` entries.
    #[serde(rename = "_sd_alg")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sd_alg: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<URI>,
    /// Lexicographically sorted digests of disclosures held back from
    /// the subject's claims.
    #[serde(rename = "_sd")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sd: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

/// Credential status entry, e.g. a StatusList2021Entry.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: URI,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(rename = "@context")]
    pub context: OneOrMany<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<URI>,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    pub verifiable_credential: OneOrMany<CredentialOrJWT>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<URI>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum CredentialOrJWT {
    Credential(Credential),
    JWT(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "exp")]
    pub expiration_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "iss")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "iat")]
    pub issued_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "jti")]
    pub jwt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sub")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "aud")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "vc")]
    pub verifiable_credential: Option<Credential>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "vp")]
    pub verifiable_presentation: Option<Presentation>,
}

/// Build an unsigned credential around a claims map.
pub fn create_credential(
    issuer_did: &str,
    subject_did: &str,
    claims: Map<String, Value>,
    more_types: &[&str],
) -> Credential {
    let mut types = vec!["VerifiableCredential".to_string()];
    types.extend(more_types.iter().map(|t| t.to_string()));
    Credential {
        context: OneOrMany::Many(vec![DEFAULT_CONTEXT.to_string()]),
        id: None,
        type_: OneOrMany::Many(types),
        credential_subject: Subject {
            id: Some(URI::String(subject_did.to_string())),
            sd: None,
            property_set: Some(claims),
        },
        issuer: Some(URI::String(issuer_did.to_string())),
        issuance_date: Some(Utc::now()),
        credential_status: None,
        sd_alg: None,
    }
}

/// Build an unsigned presentation wrapping the given credentials.
pub fn create_presentation(holder_did: &str, credentials: Vec<CredentialOrJWT>) -> Presentation {
    Presentation {
        context: OneOrMany::Many(vec![DEFAULT_CONTEXT.to_string()]),
        id: None,
        type_: OneOrMany::One("VerifiablePresentation".to_string()),
        verifiable_credential: OneOrMany::Many(credentials),
        holder: Some(URI::String(holder_did.to_string())),
    }
}

impl Credential {
    pub fn from_json(s: &str) -> Result<Self, Error> {
        let vc: Self = serde_json::from_str(s)?;
        vc.validate()?;
        Ok(vc)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.type_.contains(&"VerifiableCredential".to_string()) {
            return Err(Error::MissingTypeVerifiableCredential);
        }
        match self.context.first() {
            Some(context) if context == DEFAULT_CONTEXT => {}
            _ => return Err(Error::InvalidContext),
        }
        if self.issuer.is_none() {
            return Err(Error::MissingIssuer);
        }
        Ok(())
    }

    /// Lift the credential into JWT claims. Fields duplicated into
    /// registered claims are removed from the embedded copy, except for
    /// timestamps.
    pub fn to_jwt_claims(&self) -> Result<JWTClaims, Error> {
        let subject_id = self.credential_subject.id.clone().map(String::from);
        let mut vc = self.clone();
        let issuer = match vc.issuer.take() {
            Some(URI::String(uri)) => uri,
            None => return Err(Error::MissingIssuer),
        };
        Ok(JWTClaims {
            expiration_time: None,
            issuer: Some(issuer),
            issued_at: vc.issuance_date.map(|date| date.timestamp()),
            jwt_id: vc.id.take().map(|id| id.into()),
            subject: subject_id,
            audience: None,
            verifiable_credential: Some(vc),
            verifiable_presentation: None,
        })
    }

    /// Restore a credential from verified JWT claims.
    pub fn from_jwt_claims(claims: JWTClaims) -> Result<Self, Error> {
        let mut vc = claims.verifiable_credential.ok_or(Error::MissingCredential)?;
        if let Some(iss) = claims.issuer {
            vc.issuer = Some(URI::String(iss));
        }
        if let Some(iat) = claims.issued_at {
            if vc.issuance_date.is_none() {
                match Utc.timestamp_opt(iat, 0).latest() {
                    Some(time) => vc.issuance_date = Some(time),
                    None => return Err(Error::TimeError),
                }
            }
        }
        if let Some(sub) = claims.subject {
            vc.credential_subject.id = Some(URI::try_from(sub)?);
        }
        if let Some(id) = claims.jwt_id {
            vc.id = Some(URI::try_from(id)?);
        }
        Ok(vc)
    }

    /// Sign the credential as a compact JWT VC.
    pub fn encode_sign_jwt(&self, key: &KeyMaterial) -> Result<String, Error> {
        jwt::encode_sign(&self.to_jwt_claims()?, key)
    }

    /// Verify a JWT VC against the key its issuer resolves to.
    pub async fn decode_verify_jwt(jwt: &str, resolver: &dyn DIDResolver) -> Result<Self, Error> {
        let claims: JWTClaims = jwt::decode_verify_resolved(jwt, resolver).await?;
        Self::from_jwt_claims(claims)
    }
}

impl Presentation {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.type_.contains(&"VerifiablePresentation".to_string()) {
            return Err(Error::MissingTypeVerifiablePresentation);
        }
        Ok(())
    }

    pub fn to_jwt_claims(&self) -> JWTClaims {
        JWTClaims {
            expiration_time: None,
            issuer: self.holder.clone().map(|id| id.into()),
            issued_at: None,
            jwt_id: self.id.clone().map(|id| id.into()),
            subject: None,
            audience: None,
            verifiable_credential: None,
            verifiable_presentation: Some(self.clone()),
        }
    }
}
