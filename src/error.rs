//! Unified application error model and mapping helpers.
//! This module provides the caller-visible error enum used by the HTTP boundary,
//! along with the mapping to HTTP status codes and the JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::identity::ResolveError;
use crate::vault::VaultError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    CredentialMissing { code: String, message: String },
    CredentialInvalid { code: String, message: String },
    ResolverUnavailable { code: String, message: String },
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    UserInput { code: String, message: String },
    Validation { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::CredentialMissing { code, .. }
            | AppError::CredentialInvalid { code, .. }
            | AppError::ResolverUnavailable { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::UserInput { code, .. }
            | AppError::Validation { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::CredentialMissing { message, .. }
            | AppError::CredentialInvalid { message, .. }
            | AppError::ResolverUnavailable { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::UserInput { message, .. }
            | AppError::Validation { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn credential_missing<S: Into<String>>(code: S, msg: S) -> Self { AppError::CredentialMissing { code: code.into(), message: msg.into() } }
    pub fn credential_invalid<S: Into<String>>(code: S, msg: S) -> Self { AppError::CredentialInvalid { code: code.into(), message: msg.into() } }
    pub fn resolver_unavailable<S: Into<String>>(code: S, msg: S) -> Self { AppError::ResolverUnavailable { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { AppError::Validation { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// True for every failure raised before a verified identity exists.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AppError::CredentialMissing { .. } | AppError::CredentialInvalid { .. } | AppError::ResolverUnavailable { .. }
        )
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::CredentialMissing { .. } => 401,
            AppError::CredentialInvalid { .. } => 401,
            // Fails closed: callers cannot tell an outage from a bad credential.
            AppError::ResolverUnavailable { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::UserInput { .. } => 400,
            AppError::Validation { .. } => 422,
            AppError::Internal { .. } => 500,
        }
    }

    /// Code placed in the response body. Authorization failures collapse to one code
    /// so the body does not reveal which stage rejected the request.
    pub fn public_code(&self) -> &str {
        if self.is_auth_failure() { "unauthorized" } else { self.code_str() }
    }

    pub fn public_message(&self) -> &str {
        if self.is_auth_failure() { "authentication required" } else { self.message() }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Unavailable(detail) => AppError::resolver_unavailable("resolver_unavailable".to_string(), detail),
            other => AppError::credential_invalid("credential_invalid".to_string(), other.to_string()),
        }
    }
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::EmptyResourceRef => AppError::validation("resource_ref_required".to_string(), err.to_string()),
            VaultError::ScopeRequiresIdentity => AppError::user("scope_requires_identity".to_string(), err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "status": "error",
            "code": self.public_code(),
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
