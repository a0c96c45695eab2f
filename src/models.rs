//! Marketplace records as they are persisted
use crate::error::ValidationError;
use crate::status::{BidStatus, TenderStatus};
use crate::types::{
    AuthorType, BidId, OrganizationId, OrganizationType, ResponsibleId, ServiceType, TenderId,
    TimeStamp, UserId,
};
use chrono::Utc;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_USERNAME_LEN: usize = 50;

// rejects empty values and values longer than `max` characters
pub(crate) fn require(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

#[derive(minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    #[n(0)]
    pub id: TenderId,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub service_type: Option<ServiceType>,
    #[n(4)]
    pub status: TenderStatus,
    #[n(5)]
    pub organization_id: OrganizationId,
    #[n(6)]
    pub creator_username: String,
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
    #[n(8)]
    pub updated_at: TimeStamp<Utc>,
}

/// Fields a caller supplies to publish a tender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTender {
    pub name: String,
    pub description: String,
    pub service_type: Option<ServiceType>,
    pub organization_id: OrganizationId,
    pub creator_username: String,
}

impl NewTender {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name, MAX_NAME_LEN)?;
        require("creatorUsername", &self.creator_username, MAX_USERNAME_LEN)
    }

    pub fn into_tender(self) -> Result<Tender, ValidationError> {
        self.validate()?;
        let now = TimeStamp::new();

        Ok(Tender {
            id: TenderId::generate()?,
            name: self.name,
            description: self.description,
            service_type: self.service_type,
            status: TenderStatus::Created,
            organization_id: self.organization_id,
            creator_username: self.creator_username,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// Who submitted a bid: an individual user or an organization acting directly.
#[derive(minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "authorType", content = "authorId")]
pub enum Author {
    #[n(0)]
    User(#[n(0)] UserId),
    #[n(1)]
    Organization(#[n(0)] OrganizationId),
}

impl Author {
    /// Builds an author from the loosely typed pair a caller submits.
    pub fn parse(author_type: AuthorType, author_id: &str) -> Result<Self, ValidationError> {
        if author_id.is_empty() {
            return Err(ValidationError::Missing("authorId"));
        }
        match author_type {
            AuthorType::User => UserId::parse(author_id).map(Author::User),
            AuthorType::Organization => OrganizationId::parse(author_id).map(Author::Organization),
        }
    }

    pub fn author_type(&self) -> AuthorType {
        match self {
            Author::User(_) => AuthorType::User,
            Author::Organization(_) => AuthorType::Organization,
        }
    }

    pub fn author_id(&self) -> &str {
        match self {
            Author::User(id) => id.as_str(),
            Author::Organization(id) => id.as_str(),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    #[n(0)]
    pub id: BidId,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub status: BidStatus,
    #[n(4)]
    pub tender_id: TenderId,
    #[n(5)]
    #[serde(flatten)]
    pub author: Author,
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
    #[n(7)]
    pub updated_at: TimeStamp<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBid {
    pub name: String,
    pub description: String,
    pub tender_id: TenderId,
    pub author: Author,
}

impl NewBid {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name, MAX_NAME_LEN)
    }

    pub fn into_bid(self) -> Result<Bid, ValidationError> {
        self.validate()?;
        let now = TimeStamp::new();

        Ok(Bid {
            id: BidId::generate()?,
            name: self.name,
            description: self.description,
            status: BidStatus::Created,
            tender_id: self.tender_id,
            author: self.author,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

#[derive(minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[n(0)]
    pub id: UserId,
    #[n(1)]
    pub username: String,
    #[n(2)]
    pub first_name: Option<String>,
    #[n(3)]
    pub last_name: Option<String>,
    #[n(4)]
    pub created_at: TimeStamp<Utc>,
    #[n(5)]
    pub updated_at: TimeStamp<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewEmployee {
    pub fn into_employee(self) -> Result<Employee, ValidationError> {
        require("username", &self.username, MAX_USERNAME_LEN)?;
        let now = TimeStamp::new();

        Ok(Employee {
            id: UserId::generate()?,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

#[derive(minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[n(0)]
    pub id: OrganizationId,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    #[serde(rename = "type")]
    pub organization_type: Option<OrganizationType>,
    #[n(4)]
    pub created_at: TimeStamp<Utc>,
    #[n(5)]
    pub updated_at: TimeStamp<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub name: String,
    pub description: String,
    pub organization_type: Option<OrganizationType>,
}

impl NewOrganization {
    pub fn into_organization(self) -> Result<Organization, ValidationError> {
        require("name", &self.name, MAX_NAME_LEN)?;
        let now = TimeStamp::new();

        Ok(Organization {
            id: OrganizationId::generate()?,
            name: self.name,
            description: self.description,
            organization_type: self.organization_type,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// Links a user to the organization they act on behalf of.
#[derive(minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponsible {
    #[n(0)]
    pub id: ResponsibleId,
    #[n(1)]
    pub organization_id: OrganizationId,
    #[n(2)]
    pub user_id: UserId,
}
