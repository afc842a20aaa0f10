// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use innkeep_core::PermissionRecord;

/// Interface for storing and querying permission records.
///
/// Records are identified by the natural key `(user_id, page)`. Implementations never keep more
/// than one row per key and never delete rows.
pub trait PermissionStore<ID> {
    type Error: Error;

    /// Returns the record of a user for one page, active or not.
    ///
    /// Returns `None` if no record was ever written for this pair.
    fn permission(
        &self,
        user_id: &ID,
        page: &str,
    ) -> impl Future<Output = Result<Option<PermissionRecord<ID>>, Self::Error>>;

    /// Returns all records of a user, active or not, ordered by page key.
    fn permissions(
        &self,
        user_id: &ID,
    ) -> impl Future<Output = Result<Vec<PermissionRecord<ID>>, Self::Error>>;

    /// Inserts the record or overwrites all four flags and the active marker of an existing one.
    ///
    /// Returns `true` if a new row was inserted or `false` if an existing row was updated.
    fn upsert_permission(
        &self,
        record: &PermissionRecord<ID>,
    ) -> impl Future<Output = Result<bool, Self::Error>>;

    /// Marks an existing record as active or inactive, leaving its flags untouched.
    ///
    /// Returns `false` if no record exists for this pair.
    fn set_active(
        &self,
        user_id: &ID,
        page: &str,
        is_active: bool,
    ) -> impl Future<Output = Result<bool, Self::Error>>;
}
