//! Registration, login and token validation

use crate::adapters::database::ClinicStore;
use crate::config::schema::AuthConfig;
use crate::core::auth::password::{hash_password, verify_password};
use crate::core::auth::token::{Claims, TokenSigner};
use crate::domain::{ClinicError, Identity, IdentityDraft, NewIdentity, Result, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

/// Credential and token service
pub struct AuthService {
    store: Arc<dyn ClinicStore>,
    tokens: TokenSigner,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn ClinicStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            tokens: TokenSigner::new(config),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Creates an identity with a salted password hash
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` when a field is malformed
    /// - `Conflict` when the username or email is taken
    pub async fn register(&self, candidate: NewIdentity) -> Result<Identity> {
        candidate.validate()?;

        let username = candidate.username.trim().to_string();
        let email = candidate.email.trim().to_string();

        if self.store.find_identity_by_username(&username).await?.is_some() {
            return Err(ClinicError::Conflict("Username already exists".to_string()));
        }
        if self.store.find_identity_by_email(&email).await?.is_some() {
            return Err(ClinicError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(candidate.password, self.bcrypt_cost).await?;
        // The store enforces uniqueness again on insert
        let identity = self
            .store
            .insert_identity(IdentityDraft {
                username,
                email,
                password_hash,
                first_name: candidate.first_name.trim().to_string(),
                last_name: candidate.last_name.trim().to_string(),
                phone: candidate.phone,
                role: candidate.role,
            })
            .await?;

        tracing::info!(
            user_id = %identity.id,
            username = %identity.username,
            role = %identity.role,
            "Identity registered"
        );
        Ok(identity)
    }

    /// Verifies credentials and issues a bearer token
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let Some(identity) = self.store.find_identity_by_username(username.trim()).await? else {
            crate::log_login_failed!(username, "unknown username");
            return Err(ClinicError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };

        if !verify_password(password.to_string(), identity.password_hash.clone()).await? {
            crate::log_login_failed!(username, "password mismatch");
            return Err(ClinicError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        let issued = self.tokens.issue(&identity)?;
        tracing::info!(user_id = %identity.id, role = %identity.role, "Login succeeded");

        Ok(LoginResponse {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.claims.expires_at(),
            user: identity,
        })
    }

    /// Verifies a token without touching the store
    pub fn authenticate(&self, token: &str) -> Result<Claims> {
        self.tokens.verify(token)
    }

    /// Verifies a token and confirms its identity still exists unchanged
    pub async fn validate(&self, token: &str) -> Result<Claims> {
        let claims = self.tokens.verify(token)?;
        let id = UserId::new(claims.uid).map_err(ClinicError::Unauthorized)?;

        match self.store.get_identity(id).await? {
            Some(identity) if identity.username == claims.sub && identity.role == claims.role => {
                Ok(claims)
            }
            _ => {
                crate::log_token_rejected!("identity no longer exists");
                Err(ClinicError::Unauthorized(
                    "Token refers to an unknown identity".to_string(),
                ))
            }
        }
    }
}
