use thiserror::Error;

/// Remediation hint prefixed to every credential failure shown to callers.
pub const INVALID_CREDENTIAL_HINT: &str =
    "Invalid Bearer token. Please make sure you are using 'gcloud auth print-identity-token'";

/// Reason returned when the caller is not an owner of the service project.
pub const NOT_PROJECT_OWNER: &str = "user does not have owner rights on service project";

/// Reason returned when the service project is not attached to the host project.
pub const NOT_SERVICE_PROJECT: &str = "service project is not a service project of host project";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Malformed JWT")]
    Malformed,
    #[error("Bad token encoding")]
    BadEncoding,
    #[error("Bad token claims")]
    BadClaims,
    #[error("Invalid issuer")]
    UntrustedIssuer,
    #[error("Email not verified")]
    UnverifiedEmail,
}

impl CredentialError {
    /// Message safe to hand back to the caller.
    pub fn client_message(&self) -> String {
        format!("{INVALID_CREDENTIAL_HINT}: {self}")
    }
}

/// Failure reported by an upstream provider.
///
/// `code` keeps the upstream HTTP status when one was received; transport
/// failures use `0`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: u16,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] CredentialError),
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AuthzError {
    pub fn not_project_owner() -> Self {
        Self::Forbidden {
            reason: NOT_PROJECT_OWNER.to_string(),
        }
    }

    pub fn not_service_project() -> Self {
        Self::Forbidden {
            reason: NOT_SERVICE_PROJECT.to_string(),
        }
    }
}

pub type AuthzResult<T> = Result<T, AuthzError>;
