//! Room-join access tokens for the LiveKit voice room.
//!
//! Tokens are HS256 JWTs signed with the API secret, carrying the API key as
//! issuer, the caller identity as subject and a `video` grant for one room.

use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("environment variable {0} is not set")]
    MissingCredential(String),
    #[error("failed to encode token claims: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid signing key")]
    InvalidKey,
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub url: String,
}

impl Credentials {
    /// Reads the three values from the named environment variables. Blank
    /// values count as missing.
    pub fn from_env(key_var: &str, secret_var: &str, url_var: &str) -> Result<Self, TokenError> {
        Ok(Self {
            api_key: read_var(key_var)?,
            api_secret: read_var(secret_var)?,
            url: read_var(url_var)?,
        })
    }
}

fn read_var(name: &str) -> Result<String, TokenError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(TokenError::MissingCredential(name.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room_join: bool,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub nbf: u64,
    pub exp: u64,
    pub video: VideoGrant,
}

/// What the token endpoint hands back to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub url: String,
    pub identity: String,
    pub room: String,
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    credentials: Credentials,
    room: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(credentials: Credentials, room: impl Into<String>, ttl: Duration) -> Self {
        Self {
            credentials,
            room: room.into(),
            ttl,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Mints a token for a fresh random caller identity.
    pub fn issue(&self) -> Result<IssuedToken, TokenError> {
        self.issue_for(&random_identity(), now_epoch_secs())
    }

    pub fn issue_for(&self, identity: &str, issued_at: u64) -> Result<IssuedToken, TokenError> {
        let claims = Claims {
            iss: self.credentials.api_key.clone(),
            sub: identity.to_string(),
            jti: identity.to_string(),
            nbf: issued_at,
            exp: issued_at.saturating_add(self.ttl.as_secs()),
            video: VideoGrant {
                room_join: true,
                room: self.room.clone(),
            },
        };
        Ok(IssuedToken {
            token: sign(&claims, &self.credentials.api_secret)?,
            url: self.credentials.url.clone(),
            identity: identity.to_string(),
            room: self.room.clone(),
        })
    }
}

/// `caller_NNNN` with a four-digit suffix. Uniqueness is not checked.
pub fn random_identity() -> String {
    format!("caller_{}", rand::rng().random_range(1000..=9999))
}

pub fn sign(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = URL_SAFE_NO_PAD.encode(JWT_HEADER);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{payload}");
    let mac = mac_for(secret)?.chain_update(&signing_input);
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{signing_input}.{signature}"))
}

/// Checks the signature and returns the claims. Expiry is not checked.
pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;
    mac_for(secret)?
        .chain_update(format!("{header}.{payload}"))
        .verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)
}

fn mac_for(secret: &str) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
