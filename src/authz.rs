//! Ownership decisions for tenders and bids
//!
//! Every check returns a [`Decision`] so callers cannot fold "who are you?",
//! "you may not" and "no such thing" into one boolean.
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Author, Bid, Tender};
use crate::types::{OrganizationId, UserId};

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The resource being acted on does not exist.
    NotFound(String),
    /// The acting identity could not be resolved.
    Unauthorized(String),
    /// The actor is known but has no rights on this resource.
    Forbidden(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> ServiceResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::NotFound(what) => Err(ServiceError::NotFound(what)),
            Decision::Unauthorized(why) => Err(ServiceError::Unauthorized(why)),
            Decision::Forbidden(why) => Err(ServiceError::Forbidden(why)),
        }
    }
}

pub fn can_act_on_tender(tender: &Tender, acting: &OrganizationId) -> bool {
    &tender.organization_id == acting
}

/// Gate for edit, status change, rollback and bid listing of a tender.
/// `actor` is the acting username together with its resolved organization.
pub fn tender_gate(
    tender: Option<&Tender>,
    actor: (&str, Option<&OrganizationId>),
) -> Decision {
    let (username, organization) = actor;

    let Some(tender) = tender else {
        return Decision::NotFound("tender".into());
    };
    let Some(organization) = organization else {
        return Decision::Unauthorized(format!("user not found: {username}"));
    };
    if !can_act_on_tender(tender, organization) {
        return Decision::Forbidden(format!(
            "user {username} does not have permissions to tender {}",
            tender.id
        ));
    }

    Decision::Allow
}

/// Whether `author` may bid on `tender`. For a user author,
/// `author_organization` is the organization that user is responsible for.
pub fn can_submit_bid(
    tender: &Tender,
    author: &Author,
    author_organization: Option<&OrganizationId>,
) -> Decision {
    match author {
        Author::Organization(id) => {
            if can_act_on_tender(tender, id) {
                Decision::Allow
            } else {
                Decision::Forbidden(format!("tender does not belong to organization {id}"))
            }
        }
        Author::User(id) => match author_organization {
            None => Decision::Unauthorized(format!("user not found: {id}")),
            Some(org) if can_act_on_tender(tender, org) => Decision::Allow,
            Some(_) => Decision::Forbidden(format!(
                "user {id} does not have permissions to tender {}",
                tender.id
            )),
        },
    }
}

/// The acting side of a bid mutation.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub username: &'a str,
    pub user_id: Option<&'a UserId>,
    pub organization: Option<&'a OrganizationId>,
}

/// Gate for bid edit, rollback and history. The actor must exist and either
/// be the bid's user author or act for the organization behind the bid
/// (`author_organization`: the organization author itself, or the
/// organization of the user author).
pub fn bid_gate(
    bid: Option<&Bid>,
    author_organization: Option<&OrganizationId>,
    actor: Actor<'_>,
) -> Decision {
    let Some(bid) = bid else {
        return Decision::NotFound("bid".into());
    };
    let Some(user_id) = actor.user_id else {
        return Decision::Unauthorized(format!("user not found: {}", actor.username));
    };

    if let Author::User(author) = &bid.author {
        if author == user_id {
            return Decision::Allow;
        }
    }

    match (actor.organization, author_organization) {
        (Some(acting), Some(owner)) if acting == owner => Decision::Allow,
        _ => Decision::Forbidden(format!(
            "user {} does not have permissions to bid {}",
            actor.username, bid.id
        )),
    }
}
