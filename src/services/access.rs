//! Access control: capability checks over USER/ADMIN roles and account status

use crate::{
    error::{AppError, AppResult},
    models::user::{UserClaims, UserRole},
};

use super::credentials::CredentialStore;

/// Operations a caller may ask to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewCatalog,
    ViewProfile,
    /// Borrow or return on behalf of `user_id`
    Circulate { user_id: i32 },
    /// Read loans or fine of `user_id`
    ViewAccount { user_id: i32 },
    ManageInventory,
    ManageCategories,
    ManageUsers,
    ViewAllLoans,
    ViewAllUsers,
}

impl Capability {
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Capability::ManageInventory
                | Capability::ManageCategories
                | Capability::ManageUsers
                | Capability::ViewAllLoans
                | Capability::ViewAllUsers
        )
    }

    /// Blocked or inactive accounts may still read their own session
    fn requires_good_standing(&self) -> bool {
        !matches!(self, Capability::ViewProfile)
    }

    /// User the operation acts on, when it is scoped to one
    fn subject(&self) -> Option<i32> {
        match self {
            Capability::Circulate { user_id } | Capability::ViewAccount { user_id } => {
                Some(*user_id)
            }
            _ => None,
        }
    }
}

/// Identity facts an authorization decision is based on
#[derive(Debug, Clone, Copy)]
struct Standing {
    id: i32,
    role: UserRole,
    blocked: bool,
    active: bool,
}

#[derive(Clone)]
pub struct AccessControl {
    credentials: CredentialStore,
    verify_live_status: bool,
}

impl AccessControl {
    pub fn new(credentials: CredentialStore, verify_live_status: bool) -> Self {
        Self {
            credentials,
            verify_live_status,
        }
    }

    /// Allow or reject `capability` for the caller identified by `claims`
    pub async fn authorize(&self, claims: &UserClaims, capability: Capability) -> AppResult<()> {
        let standing = if self.verify_live_status {
            let user = self
                .credentials
                .get(claims.id)
                .await
                .map_err(|_| AppError::Authorization("Unknown account".to_string()))?;
            Standing {
                id: user.id,
                role: user.role,
                blocked: user.blocked,
                active: user.active,
            }
        } else {
            Standing {
                id: claims.id,
                role: claims.user_type,
                blocked: claims.blocked,
                active: claims.active,
            }
        };

        check(standing, capability)
    }

    pub async fn set_blocked(&self, user_id: i32, blocked: bool) -> AppResult<()> {
        self.credentials.update_blocked(user_id, blocked).await?;
        tracing::info!("User {} {}", user_id, if blocked { "blocked" } else { "unblocked" });
        Ok(())
    }

    pub async fn set_active(&self, user_id: i32, active: bool) -> AppResult<()> {
        self.credentials.update_active(user_id, active).await?;
        tracing::info!("User {} {}", user_id, if active { "activated" } else { "deactivated" });
        Ok(())
    }
}

fn check(standing: Standing, capability: Capability) -> AppResult<()> {
    if capability.requires_good_standing() {
        if standing.blocked {
            return Err(AppError::Authorization("Account is blocked".to_string()));
        }
        if !standing.active {
            return Err(AppError::Authorization("Account is not active".to_string()));
        }
    }

    let is_admin = standing.role == UserRole::Admin;
    if capability.requires_admin() && !is_admin {
        return Err(AppError::Authorization(
            "Administrator privileges required".to_string(),
        ));
    }
    if let Some(subject) = capability.subject() {
        if subject != standing.id && !is_admin {
            return Err(AppError::Authorization(
                "Cannot act on behalf of another user".to_string(),
            ));
        }
    }

    Ok(())
}
