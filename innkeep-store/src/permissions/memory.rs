// SPDX-License-Identifier: MIT OR Apache-2.0

use std::convert::Infallible;

use innkeep_core::PermissionRecord;

use crate::memory::MemoryStore;
use crate::permissions::PermissionStore;

impl<ID> PermissionStore<ID> for MemoryStore<ID>
where
    ID: Clone + Ord,
{
    type Error = Infallible;

    async fn permission(
        &self,
        user_id: &ID,
        page: &str,
    ) -> Result<Option<PermissionRecord<ID>>, Self::Error> {
        let permissions = self.permissions.borrow();
        Ok(permissions
            .get(&(user_id.clone(), page.to_string()))
            .cloned())
    }

    async fn permissions(&self, user_id: &ID) -> Result<Vec<PermissionRecord<ID>>, Self::Error> {
        let permissions = self.permissions.borrow();
        // Keys are ordered by user first, then by page.
        Ok(permissions
            .iter()
            .filter(|((id, _), _)| id == user_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn upsert_permission(&self, record: &PermissionRecord<ID>) -> Result<bool, Self::Error> {
        let mut permissions = self.permissions.borrow_mut();
        let key = (record.user_id.clone(), record.page.clone());
        Ok(permissions.insert(key, record.clone()).is_none())
    }

    async fn set_active(
        &self,
        user_id: &ID,
        page: &str,
        is_active: bool,
    ) -> Result<bool, Self::Error> {
        let mut permissions = self.permissions.borrow_mut();
        match permissions.get_mut(&(user_id.clone(), page.to_string())) {
            Some(record) => {
                record.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
