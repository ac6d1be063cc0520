//! JSON answers for unknown routes and unsupported methods.
use crate::api::error::{ApiError, NOT_FOUND_MESSAGE, api_method_not_allowed, api_not_found};

pub(crate) async fn not_found() -> ApiError {
    api_not_found(NOT_FOUND_MESSAGE)
}

pub(crate) async fn method_not_allowed() -> ApiError {
    api_method_not_allowed()
}
