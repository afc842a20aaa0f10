// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use thiserror::Error;
use tracing::debug;

/// Interface to the user accounts of the application.
///
/// Authentication happens elsewhere, the directory only tells who is acting right now and whether
/// that user is a super-user.
pub trait UserDirectory<ID> {
    type Error: Error;

    /// Returns the currently signed-in user or `None` if nobody is authenticated.
    fn acting_user(&self) -> impl Future<Output = Result<Option<ID>, Self::Error>>;

    /// Returns `true` if the user is exempt from permission checks and may edit the grants of
    /// other users.
    fn is_super_user(&self, user_id: &ID) -> impl Future<Output = Result<bool, Self::Error>>;
}

/// Proof that the acting user was checked to be a super-user.
///
/// Only [`require_super_user`] hands these out, the permission editor can't be opened without one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuperUser<ID>(ID);

impl<ID> SuperUser<ID> {
    pub fn id(&self) -> &ID {
        &self.0
    }
}

/// Checks that the acting user may manage permissions.
///
/// The permission screens call this before they load or change any grant.
pub async fn require_super_user<ID, D>(directory: &D) -> Result<SuperUser<ID>, GuardError<D::Error>>
where
    D: UserDirectory<ID>,
{
    let user_id = directory
        .acting_user()
        .await
        .map_err(GuardError::Directory)?
        .ok_or(GuardError::Unauthenticated)?;

    if !directory
        .is_super_user(&user_id)
        .await
        .map_err(GuardError::Directory)?
    {
        return Err(GuardError::NotSuperUser);
    }

    debug!("permission editor unlocked");
    Ok(SuperUser(user_id))
}

#[derive(Debug, Error)]
pub enum GuardError<E> {
    #[error("no authenticated user")]
    Unauthenticated,

    #[error("only super-users can manage permissions")]
    NotSuperUser,

    #[error("user directory failed: {0}")]
    Directory(E),
}

#[cfg(test)]
mod tests {
    use crate::test_utils::MemoryDirectory;

    use super::{GuardError, require_super_user};

    #[tokio::test]
    async fn only_super_users_pass() {
        let directory = MemoryDirectory::<u64>::new();

        let result = require_super_user(&directory).await;
        assert!(matches!(result, Err(GuardError::Unauthenticated)));

        directory.sign_in(3);
        let result = require_super_user(&directory).await;
        assert!(matches!(result, Err(GuardError::NotSuperUser)));

        directory.promote(3);
        let super_user = require_super_user(&directory).await.unwrap();
        assert_eq!(super_user.id(), &3);
    }
}
