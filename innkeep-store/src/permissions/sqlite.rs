// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use innkeep_core::{Flags, PermissionRecord};
use sqlx::{FromRow, query, query_as};

use crate::permissions::PermissionStore;
use crate::sqlite::{SqliteError, SqliteStore};

/// A single permission row as it is queried from the database.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
struct PermissionRow {
    user_id: String,
    page: String,
    can_view: bool,
    can_create: bool,
    can_update: bool,
    can_delete: bool,
    is_active: bool,
}

impl PermissionRow {
    fn into_record<ID>(self) -> Result<PermissionRecord<ID>, SqliteError>
    where
        ID: FromStr,
    {
        let user_id = self
            .user_id
            .parse()
            .map_err(|_| SqliteError::Decode("user_id".into()))?;

        Ok(PermissionRecord {
            user_id,
            page: self.page,
            flags: Flags {
                can_view: self.can_view,
                can_create: self.can_create,
                can_update: self.can_update,
                can_delete: self.can_delete,
            },
            is_active: self.is_active,
        })
    }
}

/// SQLite `PermissionStore` implementation, user ids are stored in their string representation.
impl<'a, ID> PermissionStore<ID> for SqliteStore<'a>
where
    ID: Display + FromStr,
{
    type Error = SqliteError;

    async fn permission(
        &self,
        user_id: &ID,
        page: &str,
    ) -> Result<Option<PermissionRecord<ID>>, Self::Error> {
        let row = self
            .execute(async |pool| {
                query_as::<_, PermissionRow>(
                    "
                    SELECT
                        user_id,
                        page,
                        can_view,
                        can_create,
                        can_update,
                        can_delete,
                        is_active
                    FROM
                        permissions_v1
                    WHERE
                        user_id = ?
                        AND page = ?
                    ",
                )
                .bind(user_id.to_string())
                .bind(page)
                .fetch_optional(pool)
                .await
                .map_err(SqliteError::Sqlite)
            })
            .await?;

        row.map(PermissionRow::into_record).transpose()
    }

    async fn permissions(&self, user_id: &ID) -> Result<Vec<PermissionRecord<ID>>, Self::Error> {
        let rows = self
            .execute(async |pool| {
                query_as::<_, PermissionRow>(
                    "
                    SELECT
                        user_id,
                        page,
                        can_view,
                        can_create,
                        can_update,
                        can_delete,
                        is_active
                    FROM
                        permissions_v1
                    WHERE
                        user_id = ?
                    ORDER BY
                        page
                    ",
                )
                .bind(user_id.to_string())
                .fetch_all(pool)
                .await
                .map_err(SqliteError::Sqlite)
            })
            .await?;

        rows.into_iter().map(PermissionRow::into_record).collect()
    }

    async fn upsert_permission(&self, record: &PermissionRecord<ID>) -> Result<bool, Self::Error> {
        let user_id = record.user_id.to_string();

        self.tx(async |tx| {
            let exists = query(
                "
                SELECT
                    1
                FROM
                    permissions_v1
                WHERE
                    user_id = ?
                    AND page = ?
                ",
            )
            .bind(&user_id)
            .bind(&record.page)
            .fetch_optional(&mut **tx)
            .await?
            .is_some();

            // All four flags are written on every upsert, a partial row would reset the others
            // to the column defaults.
            query(
                "
                INSERT INTO
                    permissions_v1 (
                        user_id,
                        page,
                        can_view,
                        can_create,
                        can_update,
                        can_delete,
                        is_active
                    )
                VALUES
                    (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (user_id, page) DO UPDATE SET
                    can_view = excluded.can_view,
                    can_create = excluded.can_create,
                    can_update = excluded.can_update,
                    can_delete = excluded.can_delete,
                    is_active = excluded.is_active
                ",
            )
            .bind(&user_id)
            .bind(&record.page)
            .bind(record.flags.can_view)
            .bind(record.flags.can_create)
            .bind(record.flags.can_update)
            .bind(record.flags.can_delete)
            .bind(record.is_active)
            .execute(&mut **tx)
            .await?;

            Ok(!exists)
        })
        .await
    }

    async fn set_active(
        &self,
        user_id: &ID,
        page: &str,
        is_active: bool,
    ) -> Result<bool, Self::Error> {
        let result = self
            .tx(async |tx| {
                query(
                    "
                    UPDATE
                        permissions_v1
                    SET
                        is_active = ?
                    WHERE
                        user_id = ?
                        AND page = ?
                    ",
                )
                .bind(is_active)
                .bind(user_id.to_string())
                .bind(page)
                .execute(&mut **tx)
                .await
                .map_err(SqliteError::Sqlite)
            })
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
