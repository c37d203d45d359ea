//! # User Repository
//!
//! Account registration and sign-in.
//!
//! ```text
//! register(NewUserAccount)          authenticate(email, password)
//!   ├── validate                      ├── find by normalized email   ─┐
//!   ├── argon2 hash                   ├── verify argon2 hash          ├─ InvalidCredentials
//!   └── INSERT User                   ├── status == active?  ── no ──▶ UserInactive
//!                                     └── stamp lastLoginAt
//! ```

use chrono::Utc;
use tracing::{info, warn};

use vitrine_core::password::{hash_password, verify_password};
use vitrine_core::validation::{validate_one_of, validate_password};
use vitrine_core::{CoreError, NewUser, NewUserAccount, Role, User, USER_STATUSES};

use crate::error::DbResult;
use crate::pool::Database;
use crate::query::{Changes, ColumnExt, Direction, FindMany};
use crate::schema::{UserColumn, UserKey};

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        UserRepository { db }
    }

    /// Creates an account, storing an argon2 hash of the password.
    ///
    /// ## Errors
    /// * `DbError::Validation` - bad email, short password, empty name
    /// * `DbError::UniqueViolation` - email already registered
    pub async fn register(&self, account: NewUserAccount) -> DbResult<User> {
        account.validate()?;
        let password_hash = hash_password(&account.password)?;

        let user = self
            .db
            .users()
            .create(NewUser {
                id: None,
                email: account.email,
                password_hash,
                full_name: account.full_name,
                role: account.role,
                status: None,
                last_login_at: None,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Checks an email/password pair and stamps `lastLoginAt`.
    ///
    /// Unknown email and wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<User> {
        let user = self
            .db
            .users()
            .find_unique(UserKey::Email(email.to_string()))
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "Rejected sign-in: wrong password");
            return Err(CoreError::InvalidCredentials.into());
        }
        if !user.is_active() {
            warn!(user_id = %user.id, status = %user.status, "Rejected sign-in: inactive");
            return Err(CoreError::UserInactive {
                email: user.email,
                status: user.status,
            }
            .into());
        }

        self.db
            .users()
            .update(
                UserKey::Id(user.id),
                Changes::new().set(UserColumn::LastLoginAt, Utc::now()),
            )
            .await
    }

    /// Sets `status` to one of `active` / `disabled`.
    pub async fn set_status(&self, user_id: &str, status: &str) -> DbResult<User> {
        validate_one_of("status", status, &USER_STATUSES)?;

        let user = self
            .db
            .users()
            .update(
                UserKey::Id(user_id.to_string()),
                Changes::new().set(UserColumn::Status, status),
            )
            .await?;

        info!(user_id = %user.id, status = %user.status, "User status changed");
        Ok(user)
    }

    /// Replaces the password hash.
    pub async fn change_password(&self, user_id: &str, new_password: &str) -> DbResult<User> {
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        self.db
            .users()
            .update(
                UserKey::Id(user_id.to_string()),
                Changes::new().set(UserColumn::PasswordHash, password_hash),
            )
            .await
    }

    /// Users holding `role`, by name.
    pub async fn with_role(&self, role: Role) -> DbResult<Vec<User>> {
        self.db
            .users()
            .find_many(
                FindMany::new()
                    .filter(UserColumn::Role.equals(role))
                    .order_by(UserColumn::FullName, Direction::Asc),
            )
            .await
    }
}
