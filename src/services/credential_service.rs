//! Domain service for credentials and roles.
//!
//! This is the whole surface the application shell sees: account creation,
//! login verification, secret-key rotation, role changes and deletion.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::db::DependentRecords;
use crate::db::repositories::user::User;
use crate::domain::{Identity, UserId};

/// Errors specific to credential operations.
///
/// `AuthFailed` deliberately covers every credential mismatch (unknown user,
/// wrong password, wrong secret key) with one message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already taken")]
    UsernameTaken,

    #[error("Invalid username, password, or secret key")]
    AuthFailed,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// `true` for rejections caused by what the user supplied, `false` for
    /// infrastructure failures that are worth retrying later.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A freshly created account and the secret key the operator must hand over.
#[derive(Debug, Clone)]
pub struct CreatedUser {
    pub id: UserId,
    pub secret_key: String,
}

/// A secret key that now lives only in the key file at `key_path`.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedKey {
    pub user_id: UserId,
    pub key_path: PathBuf,
}

/// Domain service trait for credentials.
#[async_trait::async_trait]
pub trait CredentialService: Send + Sync {
    /// Creates a non-admin user with a salted password hash and a new secret key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] if the username already exists.
    async fn create_user(&self, username: &str, password: &str)
    -> Result<CreatedUser, AuthError>;

    /// Like [`CredentialService::create_user`], but the key goes straight to
    /// `<key_dir>/<username>.key`. No account is left behind if the file
    /// cannot be written.
    async fn register(
        &self,
        username: &str,
        password: &str,
        key_dir: &Path,
    ) -> Result<IssuedKey, AuthError>;

    /// Checks both factors and returns the identity on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AuthFailed`] on any mismatch, without saying which.
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
        secret_key: &str,
    ) -> Result<Identity, AuthError>;

    /// Replaces the target's secret key and returns the new one. The old key
    /// stops working immediately.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PermissionDenied`] if `actor` is neither an admin
    /// nor the target.
    async fn rotate_secret_key(&self, actor: Identity, target: UserId)
    -> Result<String, AuthError>;

    /// Rotation that writes the new key to `<key_dir>/<username>.key`. The
    /// file is prepared before the old key is replaced, so a directory that
    /// cannot be written leaves the old key valid.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PermissionDenied`] before looking up `target`
    /// if `actor` may not manage it.
    async fn rotate_secret_key_to_file(
        &self,
        actor: Identity,
        target: UserId,
        key_dir: &Path,
    ) -> Result<IssuedKey, AuthError>;

    async fn set_role(&self, target: UserId, is_admin: bool) -> Result<(), AuthError>;

    async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError>;

    /// Like [`CredentialService::delete_user`], purging `dependents` in the
    /// same transaction.
    async fn delete_user_with(
        &self,
        user_id: UserId,
        dependents: &dyn DependentRecords,
    ) -> Result<(), AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::AuthFailed`] if `current_password` is wrong.
    async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_user(&self, user_id: UserId) -> Result<User, AuthError>;

    /// All users ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    /// Users whose name contains `query`, ignoring case.
    async fn search_users(&self, query: &str) -> Result<Vec<User>, AuthError>;

    /// Creates the `admin` account on first run and writes its key file into
    /// `key_dir`. Returns `None` if the account already exists.
    async fn ensure_bootstrap_admin(
        &self,
        key_dir: &Path,
    ) -> Result<Option<IssuedKey>, AuthError>;
}
