//! Tender use cases
use crate::authz::tender_gate;
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::identity::IdentityResolver;
use crate::models::{NewTender, Tender};
use crate::repository::Repository;
use crate::status::TenderStatus;
use crate::store::Store;
use crate::types::{Page, ServiceType, TenderId, TimeStamp, VersionId};
use crate::versioning::{EditPatch, TenderVersion, VersionedStore};
use std::sync::Arc;

pub struct TenderService<S> {
    repo: Repository<S>,
    identity: IdentityResolver<S>,
    versions: VersionedStore<S>,
    config: ServiceConfig,
}

impl<S: Store> TenderService<S> {
    pub fn new(instance: Arc<S>, config: ServiceConfig) -> Self {
        let repo = Repository::new(instance);

        Self {
            identity: IdentityResolver::new(repo.clone()),
            versions: VersionedStore::new(repo.clone())
                .with_snapshot_before_rollback(config.snapshot_before_rollback),
            repo,
            config,
        }
    }

    /// Load a tender and check that `username` acts for its organization
    fn authorize(&self, tender_id: &TenderId, username: &str) -> ServiceResult<Tender> {
        if username.is_empty() {
            return Err(ValidationError::Missing("username").into());
        }

        let tender = self.repo.tender(tender_id)?;
        let organization = self.identity.resolve_organization(username)?;

        if let Err(denied) = tender_gate(tender.as_ref(), (username, organization.as_ref())).into_result() {
            tracing::warn!(tender = %tender_id, username, error = %denied, "tender access denied");
            return Err(denied);
        }

        tender.ok_or_else(|| ServiceError::NotFound("tender".into()))
    }

    /// Published tenders, optionally restricted to one service type
    pub fn list_tenders(
        &self,
        service_type: Option<ServiceType>,
        page: Page,
    ) -> ServiceResult<Vec<Tender>> {
        let (limit, offset) = page.resolve(self.config.default_page_limit);
        Ok(self.repo.published_tenders(service_type, limit, offset)?)
    }

    /// Create a tender on behalf of the creator's organization
    pub fn create_tender(&self, new_tender: NewTender) -> ServiceResult<Tender> {
        new_tender.validate()?;

        // the creator has to act for the organization the tender is filed under
        let organization = self
            .identity
            .resolve_organization(&new_tender.creator_username)?
            .ok_or_else(|| {
                ServiceError::Unauthorized(format!(
                    "user not found: {}",
                    new_tender.creator_username
                ))
            })?;
        if organization != new_tender.organization_id {
            return Err(ServiceError::Forbidden(format!(
                "user {} does not belong to organization {}",
                new_tender.creator_username, new_tender.organization_id
            )));
        }

        let tender = new_tender.into_tender()?;
        self.repo.append(&tender)?;
        tracing::info!(tender = %tender.id, organization = %tender.organization_id, "tender created");

        Ok(tender)
    }

    /// Tenders whose creator username matches `username` (`%` and `_` act as wildcards)
    pub fn my_tenders(&self, username: &str, page: Page) -> ServiceResult<Vec<Tender>> {
        if username.is_empty() {
            return Err(ValidationError::Missing("username").into());
        }

        let (limit, offset) = page.resolve(self.config.default_page_limit);
        Ok(self.repo.tenders_by_creator(username, limit, offset)?)
    }

    pub fn tender_status(&self, tender_id: &TenderId) -> ServiceResult<TenderStatus> {
        self.repo
            .tender(tender_id)?
            .map(|tender| tender.status)
            .ok_or_else(|| ServiceError::NotFound("tender".into()))
    }

    /// Move a tender to `status`; only its organization may do so
    pub fn set_tender_status(
        &self,
        tender_id: &TenderId,
        status: TenderStatus,
        username: &str,
    ) -> ServiceResult<Tender> {
        let mut tender = self.authorize(tender_id, username)?;

        let previous = tender.status;
        tender.status = previous.transition(status);
        tender.updated_at = TimeStamp::new();
        self.repo.save(&tender)?;
        tracing::info!(tender = %tender.id, from = %previous, to = %tender.status, "tender status changed");

        Ok(tender)
    }

    /// Edit name and/or description, logging the previous content first
    pub fn edit_tender(
        &self,
        tender_id: &TenderId,
        username: &str,
        patch: &EditPatch,
    ) -> ServiceResult<Tender> {
        let tender = self.authorize(tender_id, username)?;

        let tender = self.versions.apply_edit(tender, patch)?;
        tracing::info!(tender = %tender.id, username, "tender edited");

        Ok(tender)
    }

    /// Restore the name and description captured by `version_id`
    pub fn rollback_tender(
        &self,
        tender_id: &TenderId,
        version_id: &VersionId,
        username: &str,
    ) -> ServiceResult<Tender> {
        let tender = self.authorize(tender_id, username)?;

        let tender = self.versions.rollback(tender, version_id)?;
        tracing::info!(tender = %tender.id, version = %version_id, username, "tender rolled back");

        Ok(tender)
    }

    /// Version log of a tender, oldest first
    pub fn tender_versions(
        &self,
        tender_id: &TenderId,
        username: &str,
    ) -> ServiceResult<Vec<TenderVersion>> {
        let tender = self.authorize(tender_id, username)?;
        self.versions.history(&tender)
    }
}
