//! `SeaORM` implementation of the `CredentialService` trait.

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::constants::bootstrap::{ADMIN_DEFAULT_PASSWORD, ADMIN_USERNAME};
use crate::db::repositories::user::{StoredCredentials, User};
use crate::db::{DependentRecords, NoDependents, Store};
use crate::domain::{Identity, UserId};
use crate::services::credential_service::{AuthError, CreatedUser, CredentialService, IssuedKey};
use crate::services::password::{self, PasswordHasherConfig};
use crate::services::secret_key;

pub struct SeaOrmCredentialService {
    store: Store,
    hasher: PasswordHasherConfig,
}

impl SeaOrmCredentialService {
    #[must_use]
    pub const fn new(store: Store, hasher: PasswordHasherConfig) -> Self {
        Self { store, hasher }
    }

    pub fn from_config(store: Store, security: &SecurityConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            store,
            PasswordHasherConfig::from_security(security)?,
        ))
    }

    async fn insert_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
        secret_key: String,
    ) -> Result<CreatedUser, AuthError> {
        let password_hash = self.hasher.hash_blocking(password).await?;

        // Uniqueness is left to the constraint so check and insert cannot race.
        match self
            .store
            .user_repo()
            .insert(username, password_hash, secret_key.clone(), is_admin)
            .await
        {
            Ok(user) => Ok(CreatedUser {
                id: user.id,
                secret_key,
            }),
            Err(err) if is_unique_violation(&err) => Err(AuthError::UsernameTaken),
            Err(err) => Err(err.into()),
        }
    }

    /// Insert a user whose key is only ever written to `key_dir`. The file
    /// is staged first; if it cannot be published the row is removed again.
    async fn insert_with_key_file(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
        key_dir: &Path,
    ) -> Result<IssuedKey, AuthError> {
        let new_key = secret_key::generate();
        let staged = secret_key::stage_key_file(key_dir, username, &new_key).await?;

        let created = match self
            .insert_user(username, password, is_admin, new_key)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                staged.discard().await;
                return Err(err);
            }
        };

        let published = staged.publish().await;
        match published {
            Ok(key_path) => Ok(IssuedKey {
                user_id: created.id,
                key_path,
            }),
            Err(err) => {
                staged.discard().await;
                // A user whose key nobody holds is unusable.
                self.store
                    .user_repo()
                    .delete(created.id, &NoDependents)
                    .await?;
                warn!(user_id = %created.id, username, "Key file not written; account removed");
                Err(err.into())
            }
        }
    }

    /// Replace a bcrypt hash with Argon2id once the password has been
    /// confirmed. Failures are logged; the login itself already succeeded.
    async fn upgrade_legacy_hash(&self, stored: &StoredCredentials, password: &str) {
        let user_id = stored.user.id;
        let new_hash = match self.hasher.hash_blocking(password).await {
            Ok(hash) => hash,
            Err(err) => {
                warn!(%user_id, error = %err, "Password hash migration failed");
                return;
            }
        };

        match self
            .store
            .user_repo()
            .replace_password_hash(user_id, &stored.password_hash, new_hash)
            .await
        {
            Ok(true) => info!(%user_id, "Password hash migrated to Argon2id"),
            Ok(false) => debug!(%user_id, "Password hash changed concurrently; migration skipped"),
            Err(err) => warn!(%user_id, error = %err, "Password hash migration failed"),
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[async_trait]
impl CredentialService for SeaOrmCredentialService {
    async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CreatedUser, AuthError> {
        require_non_empty("Username", username)?;
        require_non_empty("Password", password)?;

        match self
            .insert_user(username, password, false, secret_key::generate())
            .await
        {
            Ok(created) => {
                info!(user_id = %created.id, username, "User created");
                Ok(created)
            }
            Err(AuthError::UsernameTaken) => {
                warn!(username, "Registration rejected: username taken");
                Err(AuthError::UsernameTaken)
            }
            Err(err) => Err(err),
        }
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        key_dir: &Path,
    ) -> Result<IssuedKey, AuthError> {
        require_non_empty("Username", username)?;
        require_non_empty("Password", password)?;

        match self
            .insert_with_key_file(username, password, false, key_dir)
            .await
        {
            Ok(issued) => {
                info!(user_id = %issued.user_id, username, "User created");
                Ok(issued)
            }
            Err(AuthError::UsernameTaken) => {
                warn!(username, "Registration rejected: username taken");
                Err(AuthError::UsernameTaken)
            }
            Err(err) => Err(err),
        }
    }

    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
        secret_key: &str,
    ) -> Result<Identity, AuthError> {
        let Some(stored) = self.store.user_repo().get_credentials(username).await? else {
            warn!(username, "Login rejected");
            return Err(AuthError::AuthFailed);
        };

        // Both factors are always evaluated.
        let key_ok = secret_key::matches(&stored.secret_key, secret_key);
        let password_ok = self
            .hasher
            .verify_blocking(password, &stored.password_hash)
            .await?;

        if !(key_ok && password_ok) {
            warn!(username, "Login rejected");
            return Err(AuthError::AuthFailed);
        }

        if password::needs_rehash(&stored.password_hash) {
            self.upgrade_legacy_hash(&stored, password).await;
        }

        debug!(user_id = %stored.user.id, username, "Login accepted");
        Ok(Identity {
            user_id: stored.user.id,
            is_admin: stored.user.is_admin,
        })
    }

    async fn rotate_secret_key(
        &self,
        actor: Identity,
        target: UserId,
    ) -> Result<String, AuthError> {
        if !actor.may_manage(target) {
            warn!(actor = %actor.user_id, %target, "Secret key rotation denied");
            return Err(AuthError::PermissionDenied);
        }

        let new_key = secret_key::generate();
        if !self
            .store
            .user_repo()
            .update_secret_key(target, new_key.clone())
            .await?
        {
            return Err(AuthError::UserNotFound);
        }

        info!(actor = %actor.user_id, %target, "Secret key rotated");
        Ok(new_key)
    }

    async fn rotate_secret_key_to_file(
        &self,
        actor: Identity,
        target: UserId,
        key_dir: &Path,
    ) -> Result<IssuedKey, AuthError> {
        if !actor.may_manage(target) {
            warn!(actor = %actor.user_id, %target, "Secret key rotation denied");
            return Err(AuthError::PermissionDenied);
        }

        let repo = self.store.user_repo();
        let user = repo.get_by_id(target).await?.ok_or(AuthError::UserNotFound)?;

        let new_key = secret_key::generate();
        let staged = secret_key::stage_key_file(key_dir, &user.username, &new_key).await?;

        match repo.update_secret_key(target, new_key).await {
            Ok(true) => {}
            Ok(false) => {
                staged.discard().await;
                return Err(AuthError::UserNotFound);
            }
            Err(err) => {
                staged.discard().await;
                return Err(err.into());
            }
        }
        info!(actor = %actor.user_id, %target, "Secret key rotated");

        // The old key is gone now; the staged copy must survive a failed move.
        let key_path = staged.publish().await.map_err(|err| {
            AuthError::Internal(format!(
                "{err:#}; the new key is in {}",
                staged.staged_path().display()
            ))
        })?;

        Ok(IssuedKey {
            user_id: target,
            key_path,
        })
    }

    async fn set_role(&self, target: UserId, is_admin: bool) -> Result<(), AuthError> {
        if !self.store.user_repo().update_role(target, is_admin).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(%target, is_admin, "Role updated");
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError> {
        self.delete_user_with(user_id, &NoDependents).await
    }

    async fn delete_user_with(
        &self,
        user_id: UserId,
        dependents: &dyn DependentRecords,
    ) -> Result<(), AuthError> {
        if !self.store.user_repo().delete(user_id, dependents).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(%user_id, "User deleted");
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        require_non_empty("New password", new_password)?;

        let repo = self.store.user_repo();
        let stored = repo
            .get_credentials_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .hasher
            .verify_blocking(current_password, &stored.password_hash)
            .await?
        {
            warn!(%user_id, "Password change rejected");
            return Err(AuthError::AuthFailed);
        }

        let new_hash = self.hasher.hash_blocking(new_password).await?;
        if !repo
            .replace_password_hash(user_id, &stored.password_hash, new_hash)
            .await?
        {
            // Deleted or changed since we read it; the verified password is stale.
            warn!(%user_id, "Password change rejected: stored hash changed");
            return Err(AuthError::AuthFailed);
        }

        info!(%user_id, "Password changed");
        Ok(())
    }

    async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .user_repo()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.store.user_repo().list().await?)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>, AuthError> {
        let needle = query.to_lowercase();
        let users = self.store.user_repo().list().await?;

        Ok(users
            .into_iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .collect())
    }

    async fn ensure_bootstrap_admin(
        &self,
        key_dir: &Path,
    ) -> Result<Option<IssuedKey>, AuthError> {
        if self
            .store
            .user_repo()
            .get_by_username(ADMIN_USERNAME)
            .await?
            .is_some()
        {
            debug!("Bootstrap admin already present");
            return Ok(None);
        }

        let issued = match self
            .insert_with_key_file(ADMIN_USERNAME, ADMIN_DEFAULT_PASSWORD, true, key_dir)
            .await
        {
            Ok(issued) => issued,
            // Another process created it between our lookup and insert.
            Err(AuthError::UsernameTaken) => return Ok(None),
            Err(err) => return Err(err),
        };

        warn!(
            user_id = %issued.user_id,
            key_path = %issued.key_path.display(),
            "Bootstrap admin created with the default password; change it and store the key file securely"
        );

        Ok(Some(issued))
    }
}
