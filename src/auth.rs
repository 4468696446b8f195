//! Authentication Module
//!
//! Resolves a bearer token to a caller identity. Tokens are HS256 JWTs whose
//! `sub` claim becomes the user id used for flag evaluation.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

// == User ==
/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Stable identifier, taken from the token subject
    pub id: String,
}

// == Authenticator Trait ==
/// Turns an opaque bearer token into a [`User`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::Malformed("non-ASCII authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[derive(Debug, Deserialize, Serialize)]
struct JwtHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

// == JWT Authenticator ==
/// Verifies HS256-signed JWTs against a shared secret.
#[derive(Clone)]
pub struct JwtAuthenticator {
    secret: Vec<u8>,
}

impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticator").finish_non_exhaustive()
    }
}

impl JwtAuthenticator {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| AuthError::Malformed(format!("bad base64: {}", e)))?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::Malformed(format!("bad JSON: {}", e)))
    }

    fn encode_segment<T: Serialize>(value: &T) -> String {
        // Serializing these plain structs cannot fail
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap_or_default())
    }

    /// Signs a token for `subject`, expiring `ttl_secs` from now if given.
    pub fn issue(&self, subject: &str, ttl_secs: Option<i64>) -> String {
        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: Some("JWT".to_string()),
        };
        let claims = Claims {
            sub: Some(subject.to_string()),
            exp: ttl_secs.map(|ttl| chrono::Utc::now().timestamp() + ttl),
        };

        let signing_input = format!(
            "{}.{}",
            Self::encode_segment(&header),
            Self::encode_segment(&claims)
        );
        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }

    /// Checks signature, expiry and subject, returning the subject.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let mut parts = token.split('.');
        let (header, payload, signature) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(AuthError::Malformed("expected three segments".to_string())),
            };

        let jwt_header: JwtHeader = Self::decode_segment(header)?;
        if jwt_header.alg != "HS256" {
            return Err(AuthError::Malformed(format!(
                "unsupported algorithm {}",
                jwt_header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::BadSignature)?;
        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims: Claims = Self::decode_segment(payload)?;
        if let Some(exp) = claims.exp {
            if exp <= chrono::Utc::now().timestamp() {
                return Err(AuthError::Expired);
            }
        }

        claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthError::MissingSubject)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let id = self.verify(token)?;
        Ok(User { id })
    }
}
