//! Admission decision for a single request.
//!
//! # Purpose
//! Composes [`TokenDecoder`], [`OwnershipVerifier`] and [`HierarchyVerifier`]
//! into one call made before any rule is listed, read, created or deleted.
//!
//! # Key invariants
//! - Order is fixed: credential, ownership of the service project, then the
//!   service/host relation. Decoding is local and runs first.
//! - The first failure is returned as-is; no later provider is contacted and
//!   nothing is retried.
//!
//! # Concurrency model
//! The pipeline holds only immutable configuration and shared provider handles,
//! so one instance is cloned into every request.
use crate::{AuthzResult, HierarchyVerifier, Identity, OwnershipVerifier, ProjectId, TokenDecoder};

#[derive(Clone)]
pub struct AuthorizationPipeline {
    decoder: TokenDecoder,
    ownership: OwnershipVerifier,
    hierarchy: HierarchyVerifier,
}

impl AuthorizationPipeline {
    pub fn new(
        decoder: TokenDecoder,
        ownership: OwnershipVerifier,
        hierarchy: HierarchyVerifier,
    ) -> Self {
        Self {
            decoder,
            ownership,
            hierarchy,
        }
    }

    /// Admit `credential` to manage rules of `service_project` under `host_project`.
    ///
    /// Returns the decoded identity so callers can attribute the request.
    pub async fn authorize(
        &self,
        credential: &str,
        host_project: &ProjectId,
        service_project: &ProjectId,
    ) -> AuthzResult<Identity> {
        let identity = self.decoder.decode(credential)?;
        self.ownership
            .verify(&identity, service_project)
            .await?;
        self.hierarchy.verify(service_project, host_project).await?;
        tracing::debug!(
            email = %identity.email,
            %host_project,
            %service_project,
            "request authorized"
        );
        Ok(identity)
    }
}
