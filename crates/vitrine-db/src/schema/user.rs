//! `User` table.

use chrono::Utc;

use vitrine_core::validation::normalize_email;
use vitrine_core::{NewUser, User, USER_STATUS_ACTIVE};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model, UniqueKey};
use crate::query::{columns, Changes, Value};

columns! {
    pub enum UserColumn for "User" {
        Id => "id": Text,
        Email => "email": Text,
        PasswordHash => "passwordHash": Text,
        FullName => "fullName": Text,
        Role => "role": Text,
        Status => "status": Text,
        LastLoginAt => "lastLoginAt": Timestamp,
        CreatedAt => "createdAt": Timestamp,
        UpdatedAt => "updatedAt": Timestamp,
    }
}

/// Unique lookups of a user.
///
/// `Email` is normalized the same way it is on insert, so
/// `UserKey::Email(" Awa@Shop.sn ")` finds `awa@shop.sn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(String),
    Email(String),
}

impl UniqueKey for UserKey {
    type Column = UserColumn;

    fn fields(&self) -> Vec<(UserColumn, Value)> {
        match self {
            UserKey::Id(id) => vec![(UserColumn::Id, id.into())],
            UserKey::Email(email) => vec![(UserColumn::Email, normalize_email(email).into())],
        }
    }
}

impl Model for User {
    type Column = UserColumn;
    type Key = UserKey;
    type Create = NewUser;

    const ENTITY: &'static str = "User";
    const UPDATED_AT: Option<UserColumn> = Some(UserColumn::UpdatedAt);

    fn prepare_changes(changes: Changes<UserColumn>) -> Changes<UserColumn> {
        changes.map_text(UserColumn::Email, normalize_email)
    }
}

impl Insertable for NewUser {
    type Column = UserColumn;

    fn into_row(self) -> DbResult<Vec<(UserColumn, Value)>> {
        self.validate()?;
        let now = Utc::now();

        Ok(vec![
            (UserColumn::Id, generate_id(self.id).into()),
            (UserColumn::Email, normalize_email(&self.email).into()),
            (UserColumn::PasswordHash, self.password_hash.into()),
            (UserColumn::FullName, self.full_name.trim().into()),
            (UserColumn::Role, self.role.unwrap_or_default().into()),
            (
                UserColumn::Status,
                self.status
                    .unwrap_or_else(|| USER_STATUS_ACTIVE.to_string())
                    .into(),
            ),
            (UserColumn::LastLoginAt, self.last_login_at.into()),
            (UserColumn::CreatedAt, now.into()),
            (UserColumn::UpdatedAt, now.into()),
        ])
    }
}
