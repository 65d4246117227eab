//! Self-sovereign identity toolkit for JWT Verifiable Credentials.
//!
//! Credentials and presentations are issued as compact JWS, with two
//! capabilities layered on top:
//!
//! - Selective disclosure (SD-JWT): individual credential claims are
//!   replaced by salted digest commitments at issuance and opened by the
//!   holder per presentation. See [`sd_jwt`] and [`disclosure`].
//! - StatusList2021 revocation: a compressed bitstring published as its
//!   own Verifiable Credential. See [`revocation`].
//!
//! DID method drivers and transports stay outside the crate: signature
//! verification goes through the [`did_resolve::DIDResolver`] seam and
//! status list I/O through [`revocation::StatusListFetcher`].

pub mod did_resolve;
pub mod disclosure;
pub mod error;
pub mod hash;
pub mod jws;
pub mod jwt;
pub mod key;
pub mod one_or_many;
pub mod revocation;
pub mod sd_jwt;
pub mod vc;

pub use error::Error;

pub static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
