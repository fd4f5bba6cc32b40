use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::db::DependentRecords;
use crate::domain::UserId;
use crate::entities::users;

/// User data returned from the repository (no password hash, no secret key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            is_admin: model.is_admin(),
            username: model.username,
        }
    }
}

/// Stored credential material for one user, used only for verification.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
    pub secret_key: String,
}

impl From<users::Model> for StoredCredentials {
    fn from(model: users::Model) -> Self {
        let password_hash = model.password_hash.clone();
        let secret_key = model.secret_key.clone();
        Self {
            user: User::from(model),
            password_hash,
            secret_key,
        }
    }
}

/// Direct SQL access to the `users` table. Every write runs in its own
/// transaction; nothing here retries.
pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new row. A duplicate username surfaces as the backend's
    /// unique-constraint error; callers inspect it with `DbErr::sql_err`.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: String,
        secret_key: String,
        is_admin: bool,
    ) -> Result<User, DbErr> {
        let txn = self.conn.begin().await?;

        let model = users::ActiveModel {
            id: NotSet,
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            secret_key: Set(secret_key),
            is_admin: Set(Some(i32::from(is_admin))),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, DbErr> {
        let user = users::Entity::find_by_id(id.value()).one(&self.conn).await?;
        Ok(user.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, DbErr> {
        Ok(self.find_model(username).await?.map(User::from))
    }

    /// Get user by username together with the stored hash and key
    pub async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, DbErr> {
        Ok(self
            .find_model(username)
            .await?
            .map(StoredCredentials::from))
    }

    pub async fn get_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<StoredCredentials>, DbErr> {
        let user = users::Entity::find_by_id(id.value()).one(&self.conn).await?;
        Ok(user.map(StoredCredentials::from))
    }

    pub async fn list(&self) -> Result<Vec<User>, DbErr> {
        let users = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(users.into_iter().map(User::from).collect())
    }

    /// Returns `false` when no row has this id.
    pub async fn update_secret_key(&self, id: UserId, secret_key: String) -> Result<bool, DbErr> {
        self.update_column(id, users::Column::SecretKey, Expr::value(secret_key))
            .await
    }

    pub async fn update_role(&self, id: UserId, is_admin: bool) -> Result<bool, DbErr> {
        self.update_column(id, users::Column::IsAdmin, Expr::value(i32::from(is_admin)))
            .await
    }

    /// Swap the stored hash only if it still equals `expected`. Returns
    /// `false` when the row is gone or another write changed the hash first.
    pub async fn replace_password_hash(
        &self,
        id: UserId,
        expected: &str,
        password_hash: String,
    ) -> Result<bool, DbErr> {
        let txn = self.conn.begin().await?;

        let result = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .filter(users::Column::Id.eq(id.value()))
            .filter(users::Column::PasswordHash.eq(expected))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// Remove the user together with whatever `dependents` owns, in one
    /// transaction. Returns `false` (and rolls back) when no row matched.
    pub async fn delete(
        &self,
        id: UserId,
        dependents: &dyn DependentRecords,
    ) -> Result<bool, DbErr> {
        let txn = self.conn.begin().await?;

        dependents.purge(&txn, id).await?;

        let result = users::Entity::delete_by_id(id.value()).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        txn.commit().await?;
        Ok(true)
    }

    async fn find_model(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
    }

    async fn update_column(
        &self,
        id: UserId,
        column: users::Column,
        value: sea_orm::sea_query::SimpleExpr,
    ) -> Result<bool, DbErr> {
        let txn = self.conn.begin().await?;

        let result = users::Entity::update_many()
            .col_expr(column, value)
            .filter(users::Column::Id.eq(id.value()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}
