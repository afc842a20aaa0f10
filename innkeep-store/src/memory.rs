// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::rc::Rc;

use innkeep_core::PermissionRecord;

use crate::traits::Transaction;

/// In-memory store.
///
/// This does not persist data permamently, all changes are lost when the process ends. Use this
/// only in development or test contexts.
///
/// Rows are keyed by `(user_id, page)`, clones share the same rows.
#[derive(Clone, Debug)]
pub struct MemoryStore<ID> {
    pub(crate) permissions: Rc<RefCell<BTreeMap<(ID, String), PermissionRecord<ID>>>>,
}

impl<ID> MemoryStore<ID> {
    pub fn new() -> Self {
        Self {
            permissions: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }
}

impl<ID> Default for MemoryStore<ID> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every write is applied immediately, transactions are no-ops.
impl<ID> Transaction for MemoryStore<ID> {
    type Error = Infallible;

    type Permit = ();

    async fn begin(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn rollback(&self, _permit: ()) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn commit(&self, _permit: ()) -> Result<(), Self::Error> {
        Ok(())
    }
}

// Trait implementations are in the regarding modules, see for example `permissions`.
