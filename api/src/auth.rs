use crate::{error::ApiError, AppState};
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Supported authentication modes, selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    ApiKey,
    BearerToken,
    BasicAuth,
}

impl Default for AuthMethod {
    fn default() -> Self {
        AuthMethod::ApiKey
    }
}

/// Shared-secret credentials checked on every API request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::ApiKey,
            api_key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Verify the credential carried by the request. Every failure,
    /// including missing server-side configuration, is an authentication
    /// error: the gate never fails open.
    pub fn verify(&self, request: &Request<Body>) -> Result<(), ApiError> {
        match self.method {
            AuthMethod::ApiKey => self.verify_api_key(request),
            AuthMethod::BearerToken => self.verify_bearer_token(request),
            AuthMethod::BasicAuth => self.verify_basic_auth(request),
        }
    }

    fn verify_api_key(&self, request: &Request<Body>) -> Result<(), ApiError> {
        let expected = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(ApiError::Authentication(
                    "API key not configured. Please set the api_key in your configuration."
                        .to_string(),
                ))
            }
        };

        let provided = header_value(request, "x-api-key")
            .ok_or_else(|| ApiError::Authentication("X-API-Key header is required".to_string()))?;

        if !constant_time_eq(expected, provided) {
            return Err(ApiError::Authentication("Invalid API key".to_string()));
        }
        Ok(())
    }

    fn verify_bearer_token(&self, request: &Request<Body>) -> Result<(), ApiError> {
        let expected = match self.bearer_token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(ApiError::Authentication(
                    "Bearer token not configured. Please set the bearer_token in your configuration."
                        .to_string(),
                ))
            }
        };

        let authorization = header_value(request, header::AUTHORIZATION.as_str()).ok_or_else(
            || ApiError::Authentication("Authorization header is required".to_string()),
        )?;

        let provided = authorization
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Authentication("Invalid bearer token".to_string()))?;

        if !constant_time_eq(expected, provided) {
            return Err(ApiError::Authentication("Invalid bearer token".to_string()));
        }
        Ok(())
    }

    fn verify_basic_auth(&self, request: &Request<Body>) -> Result<(), ApiError> {
        let (username, password) = match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() => (u, p),
            _ => {
                return Err(ApiError::Authentication(
                    "Basic auth credentials not configured. Please set the username and password in your configuration."
                        .to_string(),
                ))
            }
        };

        let authorization = header_value(request, header::AUTHORIZATION.as_str()).ok_or_else(
            || ApiError::Authentication("Authorization header is required".to_string()),
        )?;

        let encoded = authorization
            .strip_prefix("Basic ")
            .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

        let expected = format!("{}:{}", username, password);
        if !constant_time_eq(&expected, &decoded) {
            return Err(ApiError::Authentication("Invalid credentials".to_string()));
        }
        Ok(())
    }
}

fn header_value<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

// Length is not secret here; the comparison of the bytes is what must
// not leak through timing.
fn constant_time_eq(expected: &str, provided: &str) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Middleware that gates every API route behind the shared credential
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = state.auth.verify(&request) {
        warn!(
            "Authentication failed for {} {}: {}",
            request.method(),
            request.uri().path(),
            e
        );
        return Err(e);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_header(name: &str, value: &str) -> Request<Body> {
        Request::builder()
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_api_key_accepts_matching_header() {
        let config = AuthConfig::api_key("secret-key");
        let request = request_with_header("X-API-Key", "secret-key");
        assert!(config.verify(&request).is_ok());
    }

    #[test]
    fn test_api_key_rejects_missing_header() {
        let config = AuthConfig::api_key("secret-key");
        let request = Request::builder().body(Body::empty()).unwrap();
        let err = config.verify(&request).unwrap_err();
        assert_eq!(err.to_string(), "X-API-Key header is required");
    }

    #[test]
    fn test_api_key_rejects_wrong_key() {
        let config = AuthConfig::api_key("secret-key");
        let request = request_with_header("X-API-Key", "other-key");
        let err = config.verify(&request).unwrap_err();
        assert_eq!(err.to_string(), "Invalid API key");
    }

    #[test]
    fn test_unconfigured_key_never_fails_open() {
        let config = AuthConfig {
            method: AuthMethod::ApiKey,
            ..Default::default()
        };
        let request = request_with_header("X-API-Key", "anything");
        assert!(config.verify(&request).is_err());
    }

    #[test]
    fn test_bearer_token() {
        let config = AuthConfig {
            method: AuthMethod::BearerToken,
            bearer_token: Some("tok-123".to_string()),
            ..Default::default()
        };

        let ok = request_with_header("Authorization", "Bearer tok-123");
        assert!(config.verify(&ok).is_ok());

        let wrong = request_with_header("Authorization", "Bearer tok-999");
        assert!(config.verify(&wrong).is_err());

        let malformed = request_with_header("Authorization", "tok-123");
        assert!(config.verify(&malformed).is_err());
    }

    #[test]
    fn test_basic_auth() {
        let config = AuthConfig {
            method: AuthMethod::BasicAuth,
            username: Some("articlai".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };

        let encoded = base64::engine::general_purpose::STANDARD.encode("articlai:pw");
        let ok = request_with_header("Authorization", &format!("Basic {}", encoded));
        assert!(config.verify(&ok).is_ok());

        let bad = base64::engine::general_purpose::STANDARD.encode("articlai:nope");
        let wrong = request_with_header("Authorization", &format!("Basic {}", bad));
        assert!(config.verify(&wrong).is_err());
    }
}
