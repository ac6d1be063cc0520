//! Request-time authorization primitives for the firewall rule gateway.
//!
//! # Purpose
//! Turns a bearer credential into an [`Identity`] and decides whether that
//! identity may manage firewall rules of a service project attached to a host
//! project.
//!
//! # How it fits
//! The HTTP service builds one [`AuthorizationPipeline`] at start-up, injecting
//! the provider clients, and calls [`AuthorizationPipeline::authorize`] before
//! touching any rule.
//!
//! # Key invariants
//! - Checks run in a fixed order: credential, ownership, hierarchy. The first
//!   failure wins and later providers are never called.
//! - Forbidden reasons are fixed strings and never echo policy contents.
//!
//! # Security boundary
//! The credential signature is NOT verified here. Claims are trusted as
//! presented; authenticity must be guaranteed by whatever sits in front of the
//! service (a verifying proxy or a provider-validated issuance channel).
//!
//! # Examples
//! ```rust
//! use firewall_authz::pad_base64;
//!
//! assert_eq!(pad_base64("abc"), "abc=");
//! ```

mod errors;
mod pipeline;
mod provider;
mod token;
mod types;
mod verify;

pub use errors::{
    AuthzError, AuthzResult, CredentialError, INVALID_CREDENTIAL_HINT, NOT_PROJECT_OWNER,
    NOT_SERVICE_PROJECT, ProviderError,
};
pub use pipeline::AuthorizationPipeline;
pub use provider::{Binding, HostLink, HostLinkProvider, Policy, PolicyProvider};
pub use token::{GOOGLE_ISSUER, TokenClaims, TokenDecoder, decode_claims, pad_base64};
pub use types::{Identity, ProjectId};
pub use verify::{HierarchyVerifier, OWNER_ROLE, OwnershipVerifier};
