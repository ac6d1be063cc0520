//! Bearer credential decoding.
//!
//! # Purpose
//! Extracts the caller email from a JWT-shaped credential
//! (`header.payload.signature`) issued by the trusted identity provider.
//!
//! # Key invariants
//! - The credential must split into exactly three non-empty segments.
//! - The payload is padded with `=` to a multiple of four before decoding.
//! - `iss` must equal the configured issuer exactly and `email_verified` must be
//!   true.
//!
//! # Security model
//! The signature segment is never checked. The decoder trusts the claims as
//! presented; authenticity is the responsibility of the layer in front of the
//! service. Do not add partial verification here without also fetching the
//! issuer's published keys.
use crate::{CredentialError, Identity};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Issuer string of Google-issued identity tokens.
pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";

/// Claims read from the credential payload. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Clone)]
pub struct TokenDecoder {
    trusted_issuer: String,
}

impl Default for TokenDecoder {
    fn default() -> Self {
        Self::new(GOOGLE_ISSUER)
    }
}

impl TokenDecoder {
    pub fn new(trusted_issuer: impl Into<String>) -> Self {
        Self {
            trusted_issuer: trusted_issuer.into(),
        }
    }

    pub fn trusted_issuer(&self) -> &str {
        &self.trusted_issuer
    }

    /// Decode `credential` into the caller identity.
    ///
    /// # Errors
    /// - [`CredentialError::Malformed`] unless there are exactly three non-empty segments.
    /// - [`CredentialError::BadEncoding`] if the payload is not base64.
    /// - [`CredentialError::BadClaims`] if the payload is not a JSON claims object.
    /// - [`CredentialError::UntrustedIssuer`] if `iss` is not the trusted issuer.
    /// - [`CredentialError::UnverifiedEmail`] if `email_verified` is false.
    pub fn decode(&self, credential: &str) -> Result<Identity, CredentialError> {
        tracing::debug!("decoding bearer credential");
        let claims = decode_claims(credential)?;
        if claims.iss != self.trusted_issuer {
            tracing::warn!(issuer = %claims.iss, "credential issued by untrusted issuer");
            return Err(CredentialError::UntrustedIssuer);
        }
        if !claims.email_verified {
            return Err(CredentialError::UnverifiedEmail);
        }
        tracing::debug!(email = %claims.email, "credential decoded");
        Ok(Identity {
            email: claims.email,
        })
    }
}

/// Decode the payload segment of `credential` without any issuer checks.
pub fn decode_claims(credential: &str) -> Result<TokenClaims, CredentialError> {
    let segments: Vec<&str> = credential.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(CredentialError::Malformed);
    };
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(CredentialError::Malformed);
    }

    let padded = pad_base64(payload);
    // Standard alphabet first; identity providers emit the URL-safe one.
    let bytes = STANDARD
        .decode(padded.as_bytes())
        .or_else(|_| URL_SAFE.decode(padded.as_bytes()))
        .map_err(|err| {
            tracing::error!(error = %err, "failed to base64 decode credential payload");
            CredentialError::BadEncoding
        })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::error!(error = %err, "failed to parse credential claims");
        CredentialError::BadClaims
    })
}

/// Pad `input` with `=` so its length is a multiple of four.
pub fn pad_base64(input: &str) -> Cow<'_, str> {
    let remainder = input.len() % 4;
    if remainder == 0 {
        return Cow::Borrowed(input);
    }
    Cow::Owned(format!("{input}{}", "=".repeat(4 - remainder)))
}
