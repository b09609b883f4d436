//! Session credentials: signed, time-bounded JWTs carrying a claim snapshot.
//!
//! Claims reflect the user at issue time. A user blocked or deactivated
//! afterwards keeps the old flags in already-issued tokens until they expire,
//! unless `auth.verify_live_status` makes access control re-read the store.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
};

#[derive(Clone)]
pub struct SessionCredential {
    config: AuthConfig,
}

impl SessionCredential {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue a token for `user`, valid from now
    pub fn issue(&self, user: &User) -> AppResult<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> AppResult<String> {
        let exp = now + Duration::minutes(self.config.jwt_expiration_minutes);
        let claims = UserClaims {
            sub: user.id.to_string(),
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            mobile: user.mobile.clone(),
            email: user.email.clone(),
            blocked: user.blocked,
            active: user.active,
            created_at: user.created_on,
            user_type: user.role,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify signature, issuer, audience and expiry and return the claims
    pub fn validate(&self, token: &str) -> AppResult<UserClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.audience.as_str()]);

        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken(e.to_string()),
        })?;

        Ok(data.claims)
    }
}
