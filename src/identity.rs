//! Maps usernames and user ids onto the organizations they act for
use crate::error::StoreError;
use crate::repository::Repository;
use crate::store::Store;
use crate::types::{OrganizationId, UserId};

/// Read-only view of the employee/responsibility relation. `None` means the
/// identity does not exist; only store faults are errors.
pub struct IdentityResolver<S> {
    repo: Repository<S>,
}

impl<S> Clone for IdentityResolver<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<S: Store> IdentityResolver<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    pub fn resolve_user(&self, username: &str) -> Result<Option<UserId>, StoreError> {
        let user = self.repo.user_id_by_username(username)?;
        tracing::debug!(username, found = user.is_some(), "resolved user");
        Ok(user)
    }

    /// Organization `username` is responsible for.
    pub fn resolve_organization(
        &self,
        username: &str,
    ) -> Result<Option<OrganizationId>, StoreError> {
        let organization = self.repo.organization_id_by_username(username)?;
        tracing::debug!(username, found = organization.is_some(), "resolved organization");
        Ok(organization)
    }

    pub fn resolve_organization_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<OrganizationId>, StoreError> {
        self.repo.organization_id_by_user_id(user_id)
    }
}
