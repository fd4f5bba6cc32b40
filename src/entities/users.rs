use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id PHC string; the column keeps its historical name.
    #[sea_orm(column_name = "password")]
    pub password_hash: String,

    /// 32-char hex token distributed out-of-band as `<username>.key`
    pub secret_key: String,

    /// Integer role flag; NULL on legacy rows means "not admin".
    pub is_admin: Option<i32>,
}

impl Model {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(0) != 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
