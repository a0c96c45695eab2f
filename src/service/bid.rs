//! Bid use cases
use crate::authz::{Actor, bid_gate, can_submit_bid, tender_gate};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::identity::IdentityResolver;
use crate::models::{Author, Bid, NewBid};
use crate::repository::Repository;
use crate::store::Store;
use crate::types::{BidId, OrganizationId, Page, TenderId, VersionId};
use crate::versioning::{BidVersion, EditPatch, VersionedStore};
use std::sync::Arc;

pub struct BidService<S> {
    repo: Repository<S>,
    identity: IdentityResolver<S>,
    versions: VersionedStore<S>,
    config: ServiceConfig,
}

impl<S: Store> BidService<S> {
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

    // organization a bid is filed under: the author itself, or the user author's organization
    fn author_organization(&self, author: &Author) -> ServiceResult<Option<OrganizationId>> {
        match author {
            Author::Organization(id) => Ok(Some(id.clone())),
            Author::User(id) => Ok(self.identity.resolve_organization_by_user(id)?),
        }
    }

    /// Load a bid and check that `username` may change it
    fn authorize(&self, bid_id: &BidId, username: &str) -> ServiceResult<Bid> {
        if username.is_empty() {
            return Err(ValidationError::Missing("username").into());
        }

        let bid = self.repo.bid(bid_id)?;
        let author_organization = match &bid {
            Some(bid) => self.author_organization(&bid.author)?,
            None => None,
        };
        let user_id = self.identity.resolve_user(username)?;
        let organization = self.identity.resolve_organization(username)?;

        let actor = Actor {
            username,
            user_id: user_id.as_ref(),
            organization: organization.as_ref(),
        };
        if let Err(denied) = bid_gate(bid.as_ref(), author_organization.as_ref(), actor).into_result() {
            tracing::warn!(bid = %bid_id, username, error = %denied, "bid access denied");
            return Err(denied);
        }

        bid.ok_or_else(|| ServiceError::NotFound("bid".into()))
    }

    /// Submit a bid against an existing tender
    pub fn create_bid(&self, new_bid: NewBid) -> ServiceResult<Bid> {
        new_bid.validate()?;

        let tender = self
            .repo
            .tender(&new_bid.tender_id)?
            .ok_or_else(|| ServiceError::NotFound("tender".into()))?;

        // Verify the author acts for the tender's organization
        let author_organization = match &new_bid.author {
            Author::User(id) => self.identity.resolve_organization_by_user(id)?,
            Author::Organization(_) => None,
        };
        if let Err(denied) =
            can_submit_bid(&tender, &new_bid.author, author_organization.as_ref()).into_result()
        {
            tracing::warn!(tender = %tender.id, author = new_bid.author.author_id(), error = %denied, "bid rejected");
            return Err(denied);
        }

        let bid = new_bid.into_bid()?;
        self.repo.append(&bid)?;
        tracing::info!(bid = %bid.id, tender = %bid.tender_id, author_type = %bid.author.author_type(), "bid created");

        Ok(bid)
    }

    /// Bids authored by the user, or by the organization the user acts for.
    /// A user who acts for no organization is not recognised here.
    pub fn my_bids(&self, username: &str, page: Page) -> ServiceResult<Vec<Bid>> {
        if username.is_empty() {
            return Err(ValidationError::Missing("username").into());
        }

        let unknown = || ServiceError::Unauthorized(format!("user not found: {username}"));
        let user_id = self.identity.resolve_user(username)?.ok_or_else(unknown)?;
        let organization = self
            .identity
            .resolve_organization_by_user(&user_id)?
            .ok_or_else(unknown)?;

        let (limit, offset) = page.resolve(self.config.default_page_limit);
        Ok(self
            .repo
            .bids_by_author(&user_id, &organization, limit, offset)?)
    }

    /// Bids placed on a tender; only the tender's organization may look
    pub fn bids_by_tender(
        &self,
        tender_id: &TenderId,
        username: &str,
        page: Page,
    ) -> ServiceResult<Vec<Bid>> {
        if username.is_empty() {
            return Err(ValidationError::Missing("username").into());
        }

        let tender = self.repo.tender(tender_id)?;
        let organization = self.identity.resolve_organization(username)?;
        tender_gate(tender.as_ref(), (username, organization.as_ref())).into_result()?;

        let (limit, offset) = page.resolve(self.config.default_page_limit);
        Ok(self.repo.bids_by_tender(tender_id, limit, offset)?)
    }

    /// Edit name and/or description, logging the previous content first
    pub fn edit_bid(&self, bid_id: &BidId, username: &str, patch: &EditPatch) -> ServiceResult<Bid> {
        let bid = self.authorize(bid_id, username)?;

        let bid = self.versions.apply_edit(bid, patch)?;
        tracing::info!(bid = %bid.id, username, "bid edited");

        Ok(bid)
    }

    /// Restore the name and description captured by `version_id`
    pub fn rollback_bid(
        &self,
        bid_id: &BidId,
        version_id: &VersionId,
        username: &str,
    ) -> ServiceResult<Bid> {
        let bid = self.authorize(bid_id, username)?;

        let bid = self.versions.rollback(bid, version_id)?;
        tracing::info!(bid = %bid.id, version = %version_id, username, "bid rolled back");

        Ok(bid)
    }

    /// Version log of a bid, oldest first
    pub fn bid_versions(&self, bid_id: &BidId, username: &str) -> ServiceResult<Vec<BidVersion>> {
        let bid = self.authorize(bid_id, username)?;
        self.versions.history(&bid)
    }
}
