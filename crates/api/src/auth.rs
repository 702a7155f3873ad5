//! Authentication seam.
//!
//! Credential issuance lives elsewhere; this crate only asks an
//! [`Authenticator`] whether a presented credential maps to a principal.

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::CredentialParams;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use catalog_common::AuthConfig;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Identity an accepted credential resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No credential supplied")]
    Missing,

    #[error("Credential rejected")]
    Rejected,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<Principal, AuthError>;
}

/// Fixed credential table loaded from `[auth]`
#[derive(Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl fmt::Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenAuthenticator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl StaticTokenAuthenticator {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.tokens.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<Principal, AuthError> {
        self.tokens
            .get(credential)
            .map(|name| Principal(name.clone()))
            .ok_or(AuthError::Rejected)
    }
}

/// `Authorization: Bearer <credential>`, falling back to `?token=`
pub fn extract_credential(headers: &HeaderMap, params: &CredentialParams) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| params.token.clone().filter(|token| !token.is_empty()))
}

/// Extractor that only succeeds for an accepted credential
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let params = Query::<CredentialParams>::try_from_uri(&parts.uri)
            .map(|Query(params)| params)
            .unwrap_or_default();

        let Some(credential) = extract_credential(&parts.headers, &params) else {
            debug!(uri = %parts.uri.path(), "Request without credential");
            return Err(AuthError::Missing.into());
        };

        match state.authenticator.authenticate(&credential).await {
            Ok(principal) => Ok(Authenticated(principal)),
            Err(e) => {
                warn!(uri = %parts.uri.path(), "Authentication rejected");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn authenticator() -> StaticTokenAuthenticator {
        StaticTokenAuthenticator::new(HashMap::from([("s3cret".to_string(), "operator".to_string())]))
    }

    #[tokio::test]
    async fn test_static_tokens() {
        let auth = authenticator();
        assert_eq!(auth.authenticate("s3cret").await, Ok(Principal("operator".to_string())));
        assert_eq!(auth.authenticate("guess").await, Err(AuthError::Rejected));
    }

    #[test]
    fn test_bearer_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let params = CredentialParams {
            token: Some("from-query".to_string()),
        };
        assert_eq!(extract_credential(&headers, &params).as_deref(), Some("from-header"));
        assert_eq!(
            extract_credential(&HeaderMap::new(), &params).as_deref(),
            Some("from-query")
        );
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic b3BlcmF0b3I="));
        assert_eq!(extract_credential(&headers, &CredentialParams::default()), None);
    }

    #[test]
    fn test_debug_hides_credentials() {
        let rendered = format!("{:?}", authenticator());
        assert!(!rendered.contains("s3cret"));
    }
}
