//! Ownership and hierarchy checks against provider data.
use crate::{AuthzError, AuthzResult, HostLinkProvider, Identity, PolicyProvider, ProjectId};
use std::sync::Arc;

/// Role treated as owner-equivalent unless configured otherwise.
pub const OWNER_ROLE: &str = "roles/owner";

/// Decides whether a user holds the owner role on a project.
#[derive(Clone)]
pub struct OwnershipVerifier {
    policies: Arc<dyn PolicyProvider>,
    owner_role: String,
}

impl OwnershipVerifier {
    pub fn new(policies: Arc<dyn PolicyProvider>) -> Self {
        Self {
            policies,
            owner_role: OWNER_ROLE.to_string(),
        }
    }

    pub fn with_owner_role(mut self, owner_role: impl Into<String>) -> Self {
        self.owner_role = owner_role.into();
        self
    }

    pub fn owner_role(&self) -> &str {
        &self.owner_role
    }

    /// Succeeds iff a binding for the owner role lists `user:<email>`.
    ///
    /// Member comparison is exact and case-sensitive.
    pub async fn verify(&self, identity: &Identity, project: &ProjectId) -> AuthzResult<()> {
        let policy = self.policies.get_policy(project).await?;
        if policy.grants(&self.owner_role, &identity.policy_member()) {
            return Ok(());
        }
        tracing::info!(%project, "caller is not a project owner");
        Err(AuthzError::not_project_owner())
    }
}

/// Decides whether a project is a registered service project of a host.
#[derive(Clone)]
pub struct HierarchyVerifier {
    host_links: Arc<dyn HostLinkProvider>,
}

impl HierarchyVerifier {
    pub fn new(host_links: Arc<dyn HostLinkProvider>) -> Self {
        Self { host_links }
    }

    pub async fn verify(
        &self,
        service_project: &ProjectId,
        host_project: &ProjectId,
    ) -> AuthzResult<()> {
        match self.host_links.get_host_link(service_project).await? {
            Some(link) if link.name == host_project.as_str() => Ok(()),
            _ => {
                tracing::info!(
                    %service_project,
                    %host_project,
                    "project is not attached to host project"
                );
                Err(AuthzError::not_service_project())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Binding, HostLink, NOT_PROJECT_OWNER, NOT_SERVICE_PROJECT, Policy, ProviderError};
    use async_trait::async_trait;

    struct StaticPolicy(Result<Policy, ProviderError>);

    #[async_trait]
    impl PolicyProvider for StaticPolicy {
        async fn get_policy(&self, _project: &ProjectId) -> Result<Policy, ProviderError> {
            self.0.clone()
        }
    }

    struct StaticHostLink(Result<Option<HostLink>, ProviderError>);

    #[async_trait]
    impl HostLinkProvider for StaticHostLink {
        async fn get_host_link(
            &self,
            _project: &ProjectId,
        ) -> Result<Option<HostLink>, ProviderError> {
            self.0.clone()
        }
    }

    fn owner_policy(member: &str) -> Policy {
        Policy {
            bindings: vec![Binding {
                role: OWNER_ROLE.to_string(),
                members: vec![member.to_string()],
            }],
        }
    }

    fn user(email: &str) -> Identity {
        Identity {
            email: email.to_string(),
        }
    }

    fn ownership(policy: Result<Policy, ProviderError>) -> OwnershipVerifier {
        OwnershipVerifier::new(Arc::new(StaticPolicy(policy)))
    }

    fn assert_forbidden(result: AuthzResult<()>, expected: &str) {
        match result {
            Err(AuthzError::Forbidden { reason }) => assert_eq!(reason, expected),
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn owner_binding_admits_exact_member() {
        let verifier = ownership(Ok(owner_policy("user:x@y.com")));
        verifier
            .verify(&user("x@y.com"), &ProjectId::new("svc"))
            .await
            .expect("owner admitted");
    }

    #[tokio::test]
    async fn member_match_is_exact_and_case_sensitive() {
        let verifier = ownership(Ok(owner_policy("user:x@y.com")));
        let project = ProjectId::new("svc");
        assert_forbidden(verifier.verify(&user("X@y.com"), &project).await, NOT_PROJECT_OWNER);
        assert_forbidden(verifier.verify(&user("x@y.co"), &project).await, NOT_PROJECT_OWNER);

        let verifier = ownership(Ok(owner_policy("serviceAccount:x@y.com")));
        assert_forbidden(verifier.verify(&user("x@y.com"), &project).await, NOT_PROJECT_OWNER);
    }

    #[tokio::test]
    async fn non_owner_role_is_denied() {
        let policy = Policy {
            bindings: vec![Binding {
                role: "roles/editor".to_string(),
                members: vec!["user:x@y.com".to_string()],
            }],
        };
        let verifier = ownership(Ok(policy));
        assert_forbidden(
            verifier.verify(&user("x@y.com"), &ProjectId::new("svc")).await,
            NOT_PROJECT_OWNER,
        );
    }

    #[tokio::test]
    async fn configured_owner_role_replaces_default() {
        let policy = Policy {
            bindings: vec![Binding {
                role: "roles/compute.securityAdmin".to_string(),
                members: vec!["user:x@y.com".to_string()],
            }],
        };
        let verifier = ownership(Ok(policy)).with_owner_role("roles/compute.securityAdmin");
        assert_eq!(verifier.owner_role(), "roles/compute.securityAdmin");
        verifier
            .verify(&user("x@y.com"), &ProjectId::new("svc"))
            .await
            .expect("custom role admitted");
    }

    #[tokio::test]
    async fn policy_provider_failure_propagates() {
        let verifier = ownership(Err(ProviderError::new(403, "permission denied")));
        let err = verifier
            .verify(&user("x@y.com"), &ProjectId::new("svc"))
            .await
            .expect_err("provider error");
        assert!(matches!(err, AuthzError::Provider(ref inner) if inner.code == 403));
    }

    #[tokio::test]
    async fn hierarchy_requires_matching_host_link() {
        let service = ProjectId::new("svc");
        let host = ProjectId::new("host");

        let verifier = HierarchyVerifier::new(Arc::new(StaticHostLink(Ok(Some(HostLink {
            name: "host".to_string(),
        })))));
        verifier.verify(&service, &host).await.expect("attached");

        let verifier = HierarchyVerifier::new(Arc::new(StaticHostLink(Ok(Some(HostLink {
            name: "other-host".to_string(),
        })))));
        assert_forbidden(verifier.verify(&service, &host).await, NOT_SERVICE_PROJECT);

        let verifier = HierarchyVerifier::new(Arc::new(StaticHostLink(Ok(None))));
        assert_forbidden(verifier.verify(&service, &host).await, NOT_SERVICE_PROJECT);
    }

    #[tokio::test]
    async fn host_link_provider_failure_propagates() {
        let verifier = HierarchyVerifier::new(Arc::new(StaticHostLink(Err(
            ProviderError::new(429, "quota exceeded"),
        ))));
        let err = verifier
            .verify(&ProjectId::new("svc"), &ProjectId::new("host"))
            .await
            .expect_err("provider error");
        assert!(matches!(err, AuthzError::Provider(ref inner) if inner.code == 429));
    }
}
