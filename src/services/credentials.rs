//! Credential store: user identity, role and account-status flags

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateAccount, NewUser, User, UserRole},
    repository::SharedStore,
};

const INVALID_LOGIN: &str = "Invalid";

#[derive(Clone)]
pub struct CredentialStore {
    store: SharedStore,
}

impl CredentialStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Register a reader account. Role is always USER and the account
    /// starts inactive until an administrator activates it.
    pub async fn register(&self, account: CreateAccount) -> AppResult<User> {
        let account = account.normalized();
        account.validate()?;
        self.create(account, UserRole::User, false).await
    }

    /// Create the configured administrator if no account uses that email yet
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<User> {
        if let Some(existing) = self.store.get_user_by_email(email).await? {
            return Ok(existing);
        }
        let account = CreateAccount {
            first_name: "Library".to_string(),
            last_name: "Administrator".to_string(),
            email: email.to_string(),
            mobile: String::new(),
            password: password.to_string(),
        }
        .normalized();
        let admin = self.create(account, UserRole::Admin, true).await?;
        tracing::info!("Provisioned administrator account {}", admin.id);
        Ok(admin)
    }

    async fn create(&self, account: CreateAccount, role: UserRole, active: bool) -> AppResult<User> {
        if self.store.email_exists(&account.email).await? {
            return Err(AppError::Conflict("Email is not available.".to_string()));
        }

        let user = NewUser {
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            mobile: account.mobile,
            password_hash: hash_password(&account.password)?,
            blocked: false,
            active,
            role,
            created_on: Utc::now(),
        };

        let created = self.store.insert_user(&user).await?;
        tracing::info!("Created {} account {}", created.role, created.id);
        Ok(created)
    }

    /// Check an email/password pair
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_LOGIN.to_string()))?;

        if !verify_password(&user, password)? {
            tracing::warn!("Rejected login for user {}", user.id);
            return Err(AppError::Authentication(INVALID_LOGIN.to_string()));
        }

        Ok(user)
    }

    /// Get user by ID
    pub async fn get(&self, id: i32) -> AppResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn update_blocked(&self, id: i32, blocked: bool) -> AppResult<()> {
        if !self.store.set_user_blocked(id, blocked).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn update_active(&self, id: i32, active: bool) -> AppResult<()> {
        if !self.store.set_user_active(id, active).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
