use crate::revocation::{DecodeListError, EncodeListError};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The digest behind a JWS algorithm name is not supported.
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlg(String),
    /// Selective disclosure is limited to primitive claim values.
    #[error("Selective disclosure of non-primitive claim values is not supported")]
    NestedNotSupported,
    #[error("Claim not present in credentialSubject: {0}")]
    MissingClaim(String),
    #[error("Signing failed")]
    SigningFailed,
    #[error("Malformed disclosure")]
    MalformedDisclosure,
    #[error("SD-JWT carries no disclosures")]
    NoDisclosures,
    #[error("Disclosure group count does not match presented credentials")]
    GroupCountMismatch,
    /// A supplied disclosure's digest is not committed in `_sd`.
    #[error("Disclosure does not match any digest in _sd")]
    DisclosureMismatch,
    #[error("Credential is missing _sd_alg")]
    MissingSdAlg,
    #[error("Invalid JWS")]
    InvalidJWS,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("JWS algorithm does not match verification key")]
    AlgorithmMismatch,
    #[error("Invalid key bytes")]
    InvalidKey,
    #[error("Missing private key")]
    MissingPrivateKey,
    #[error("Missing issuer (iss)")]
    MissingIssuer,
    #[error("Verifiable credential not found in JWT claims")]
    MissingCredential,
    #[error("Verifiable presentation not found in JWT claims")]
    MissingPresentation,
    /// Presentations wrap their credentials as compact JWS strings.
    #[error("Expected JWT verifiable credential in presentation")]
    ExpectedJWTCredential,
    #[error("Invalid URI")]
    URI,
    #[error("Invalid context")]
    InvalidContext,
    #[error("Missing type VerifiableCredential")]
    MissingTypeVerifiableCredential,
    #[error("Missing type VerifiablePresentation")]
    MissingTypeVerifiablePresentation,
    #[error("Unable to convert date/time")]
    TimeError,
    #[error("DID resolution failed: {0}")]
    Resolution(String),
    #[error("Revocation list index out of range: {0}")]
    IndexOutOfRange(usize),
    #[error("Malformed credentialStatus id: {0}")]
    InvalidStatusId(String),
    #[error("Status list credential is missing its encoded list")]
    MissingEncodedList,
    #[error("Unable to fetch status list: {0}")]
    FetchFailure(String),
    #[error("Unable to publish status list: {0}")]
    PublishFailure(String),
    #[error("Unable to decode revocation list: {0}")]
    DecodeList(#[from] DecodeListError),
    #[error("Unable to encode revocation list: {0}")]
    EncodeList(#[from] EncodeListError),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    SerdeJSON(#[from] serde_json::Error),
}
