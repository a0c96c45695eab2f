//! Typed access to the rows held by a [`Store`]
use crate::error::StoreError;
use crate::models::{Author, Bid, Employee, Organization, OrganizationResponsible, Tender};
use crate::store::{Store, Table};
use crate::types::{BidId, OrganizationId, ServiceType, TenderId, UserId};
use crate::utils::like_match;
use crate::versioning::{BidVersion, TenderVersion};
use std::sync::Arc;

/// A row type and where it lives.
pub trait Record: minicbor::Encode<()> + for<'b> minicbor::Decode<'b, ()> {
    const TABLE: Table;

    fn key(&self) -> String;
}

impl Record for Tender {
    const TABLE: Table = Table::Tenders;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for Bid {
    const TABLE: Table = Table::Bids;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for TenderVersion {
    const TABLE: Table = Table::TenderVersions;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for BidVersion {
    const TABLE: Table = Table::BidVersions;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

// employees are keyed by their unique username
impl Record for Employee {
    const TABLE: Table = Table::Employees;

    fn key(&self) -> String {
        self.username.clone()
    }
}

impl Record for Organization {
    const TABLE: Table = Table::Organizations;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

// one responsibility row per user
impl Record for OrganizationResponsible {
    const TABLE: Table = Table::Responsibles;

    fn key(&self) -> String {
        self.user_id.to_string()
    }
}

pub struct Repository<S> {
    store: Arc<S>,
}

impl<S> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> Repository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn load<R: Record>(&self, key: &str) -> Result<Option<R>, StoreError> {
        match self.store.get(R::TABLE, key)? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite `record`.
    pub fn save<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.store
            .put(R::TABLE, &record.key(), minicbor::to_vec(record)?)
    }

    /// Insert `record`, refusing to replace an existing row.
    pub fn append<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.store
            .insert_new(R::TABLE, &record.key(), minicbor::to_vec(record)?)
    }

    pub fn scan<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.store
            .scan(R::TABLE)?
            .iter()
            .map(|bytes| minicbor::decode(bytes).map_err(StoreError::from))
            .collect()
    }

    pub fn tender(&self, id: &TenderId) -> Result<Option<Tender>, StoreError> {
        self.load(id.as_str())
    }

    pub fn bid(&self, id: &BidId) -> Result<Option<Bid>, StoreError> {
        self.load(id.as_str())
    }

    /// Published tenders, optionally of one service type, ordered by name.
    pub fn published_tenders(
        &self,
        service_type: Option<ServiceType>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Tender>, StoreError> {
        let mut tenders: Vec<Tender> = self
            .scan::<Tender>()?
            .into_iter()
            .filter(|t| t.status.is_listed())
            .filter(|t| service_type.is_none_or(|st| t.service_type == Some(st)))
            .collect();
        tenders.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Ok(window(tenders, limit, offset))
    }

    /// Tenders whose creator matches the `LIKE` style `pattern`.
    pub fn tenders_by_creator(
        &self,
        pattern: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Tender>, StoreError> {
        let mut tenders: Vec<Tender> = self
            .scan::<Tender>()?
            .into_iter()
            .filter(|t| like_match(pattern, &t.creator_username))
            .collect();
        tenders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(window(tenders, limit, offset))
    }

    /// Bids authored by `user_id` directly, or by `organization_id`.
    pub fn bids_by_author(
        &self,
        user_id: &UserId,
        organization_id: &OrganizationId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Bid>, StoreError> {
        let mut bids: Vec<Bid> = self
            .scan::<Bid>()?
            .into_iter()
            .filter(|b| match &b.author {
                Author::User(id) => id == user_id,
                Author::Organization(id) => id == organization_id,
            })
            .collect();
        bids.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(window(bids, limit, offset))
    }

    pub fn bids_by_tender(
        &self,
        tender_id: &TenderId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Bid>, StoreError> {
        let mut bids: Vec<Bid> = self
            .scan::<Bid>()?
            .into_iter()
            .filter(|b| &b.tender_id == tender_id)
            .collect();
        bids.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(window(bids, limit, offset))
    }

    pub fn employee(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        self.load(username)
    }

    pub fn organization(&self, id: &OrganizationId) -> Result<Option<Organization>, StoreError> {
        self.load(id.as_str())
    }

    pub fn responsible(&self, user_id: &UserId) -> Result<Option<OrganizationResponsible>, StoreError> {
        self.load(user_id.as_str())
    }

    pub fn user_id_by_username(&self, username: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.employee(username)?.map(|e| e.id))
    }

    /// Organization the user is responsible for, provided it still exists.
    pub fn organization_id_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<OrganizationId>, StoreError> {
        let Some(responsible) = self.responsible(user_id)? else {
            return Ok(None);
        };

        Ok(self
            .organization(&responsible.organization_id)?
            .map(|org| org.id))
    }

    pub fn organization_id_by_username(
        &self,
        username: &str,
    ) -> Result<Option<OrganizationId>, StoreError> {
        match self.user_id_by_username(username)? {
            Some(user_id) => self.organization_id_by_user_id(&user_id),
            None => Ok(None),
        }
    }
}

fn window<T>(items: Vec<T>, limit: usize, offset: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}
