use diesel::prelude::*;
use tracing::{info, trace};

use super::models::{NewUser, User, UserPatch};
use super::schema::users;
use super::{Store, StorageError, conflict_on_unique, now_utc};
use journey_shared::auth::Role;

/// Registration data after validation and hashing.
#[derive(Debug, Clone)]
pub struct NewAccountRow {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
}

impl Store {
    pub async fn create_user(&self, account: NewAccountRow) -> Result<User, StorageError> {
        trace!(email = %account.email, "create_user starting");
        self.blocking(move |conn| {
            let now = now_utc();
            let row = NewUser {
                name: &account.name,
                email: &account.email,
                password: &account.password_hash,
                age: account.age,
                role: Role::User.as_str(),
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(users::table)
                .values(&row)
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(|e| conflict_on_unique(e, "User with this email already exists"))
        })
        .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let email = email.to_string();
        self.blocking(move |conn| {
            Ok(users::table
                .filter(users::email.eq(&email))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn get_user(&self, user_id: i32) -> Result<Option<User>, StorageError> {
        self.blocking(move |conn| {
            Ok(users::table
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn update_user(&self, user_id: i32, patch: UserPatch) -> Result<User, StorageError> {
        if patch.is_empty() {
            return Err(StorageError::InvalidInput("No fields to update".into()));
        }
        self.blocking(move |conn| {
            let patch = UserPatch {
                updated_at: Some(now_utc()),
                ..patch
            };
            diesel::update(users::table.find(user_id))
                .set(&patch)
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| StorageError::NotFound("User not found".into()))
        })
        .await
    }

    /// Deletes the account; dependent rows go with it via `ON DELETE CASCADE`.
    pub async fn delete_user(&self, user_id: i32) -> Result<bool, StorageError> {
        let deleted = self
            .blocking(move |conn| {
                Ok(diesel::delete(users::table.find(user_id)).execute(conn)?)
            })
            .await?;
        if deleted > 0 {
            info!(user_id, "account deleted");
        }
        Ok(deleted > 0)
    }

    /// Stores the new image path and returns the one it replaced.
    pub async fn set_profile_image(
        &self,
        user_id: i32,
        path: &str,
    ) -> Result<Option<String>, StorageError> {
        let path = path.to_string();
        self.blocking(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Option<String>, StorageError> {
                let previous: Option<String> = users::table
                    .find(user_id)
                    .select(users::profile_image)
                    .first::<Option<String>>(conn)
                    .optional()?
                    .ok_or_else(|| StorageError::NotFound("User not found".into()))?;
                diesel::update(users::table.find(user_id))
                    .set((
                        users::profile_image.eq(Some(&path)),
                        users::updated_at.eq(now_utc()),
                    ))
                    .execute(conn)?;
                Ok(previous)
            })
        })
        .await
    }

    /// Returns `false` when no user has that email.
    pub async fn set_role_by_email(&self, email: &str, role: Role) -> Result<bool, StorageError> {
        let email = email.to_string();
        self.blocking(move |conn| {
            let n = diesel::update(users::table.filter(users::email.eq(&email)))
                .set((users::role.eq(role.as_str()), users::updated_at.eq(now_utc())))
                .execute(conn)?;
            Ok(n > 0)
        })
        .await
    }

    /// Grants admin to every registered address in `emails`; returns how many changed.
    pub async fn promote_admins(&self, emails: &[String]) -> Result<usize, StorageError> {
        if emails.is_empty() {
            return Ok(0);
        }
        let emails: Vec<String> = emails.iter().map(|e| e.trim().to_lowercase()).collect();
        self.blocking(move |conn| {
            Ok(diesel::update(
                users::table
                    .filter(users::email.eq_any(&emails))
                    .filter(users::role.ne(Role::Admin.as_str())),
            )
            .set(users::role.eq(Role::Admin.as_str()))
            .execute(conn)?)
        })
        .await
    }
}
