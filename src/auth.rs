// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

//! Access tokens, password hashing and random identifiers.
//!
//! Tokens follow the hosted backend's shape: HS256 JWTs with `sub`,
//! `email`, `aud = "authenticated"` and the display name under
//! `user_metadata`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

/// Audience claim carried by every user token.
pub const AUDIENCE: &str = "authenticated";

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL_SECS: usize = 60 * 60;

/// Display name stored alongside the auth user.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserMetadata {
    #[serde(default)]
    pub display_name: String,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl Claims {
    pub fn user(&self) -> User {
        User {
            id: self.sub.clone(),
            email: self.email.clone(),
            display_name: self.user_metadata.display_name.clone(),
        }
    }
}

pub fn unix_now() -> Result<usize> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?;
    Ok(now.as_secs() as usize)
}

/// Create an access token for a user.
pub fn create_access_token(user: &User, signing_key: &[u8]) -> Result<(String, usize)> {
    let now = unix_now()?;
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        aud: AUDIENCE.to_string(),
        iat: now,
        exp: now + ACCESS_TOKEN_TTL_SECS,
        user_metadata: UserMetadata {
            display_name: user.display_name.clone(),
        },
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok((token, claims.exp))
}

/// Verify signature, expiry and audience of an access token.
pub fn verify_access_token(token: &str, signing_key: &[u8]) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUDIENCE]);

    decode::<Claims>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

/// Hash a password with a per-user salt under the server key.
pub fn hash_password(key: &[u8], salt: &str, password: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(salt.as_bytes());
    mac.update(b"|");
    mac.update(password.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of a candidate password against a stored hash.
pub fn verify_password(key: &[u8], salt: &str, password: &str, stored_hash: &str) -> Result<bool> {
    let candidate = hash_password(key, salt, password)?;
    Ok(candidate.as_bytes().ct_eq(stored_hash.as_bytes()).into())
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;
    Ok(buf)
}

/// Random row identifier (32 hex chars).
pub fn random_id() -> Result<String> {
    Ok(hex::encode(random_bytes::<16>()?))
}

/// Opaque URL-safe token (refresh tokens, salts).
pub fn random_token() -> Result<String> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes::<32>()?))
}
