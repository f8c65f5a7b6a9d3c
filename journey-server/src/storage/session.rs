use diesel::prelude::*;
use tracing::debug;

use super::models::SessionRow;
use super::schema::sessions;
use super::{Store, StorageError};

impl Store {
    /// The stored record for `id`, unless it expired before `now` (unix seconds).
    pub async fn load_session(
        &self,
        id: &str,
        now: i64,
    ) -> Result<Option<SessionRow>, StorageError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            Ok(sessions::table
                .find(&id)
                .filter(sessions::expires_at.gt(now))
                .select(SessionRow::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn session_exists(&self, id: &str) -> Result<bool, StorageError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let n = sessions::table
                .find(&id)
                .count()
                .get_result::<i64>(conn)?;
            Ok(n > 0)
        })
        .await
    }

    /// Inserts or replaces the record.
    pub async fn save_session(&self, row: SessionRow) -> Result<(), StorageError> {
        self.blocking(move |conn| {
            diesel::insert_into(sessions::table)
                .values(&row)
                .on_conflict(sessions::id)
                .do_update()
                .set((
                    sessions::data.eq(&row.data),
                    sessions::expires_at.eq(row.expires_at),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn delete_session(&self, id: &str) -> Result<(), StorageError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            diesel::delete(sessions::table.find(&id)).execute(conn)?;
            Ok(())
        })
        .await
    }

    /// Drops every record that expired at or before `now`; returns how many.
    pub async fn purge_expired_sessions(&self, now: i64) -> Result<usize, StorageError> {
        let n = self
            .blocking(move |conn| {
                Ok(diesel::delete(sessions::table.filter(sessions::expires_at.le(now)))
                    .execute(conn)?)
            })
            .await?;
        if n > 0 {
            debug!(purged = n, "expired sessions removed");
        }
        Ok(n)
    }
}
