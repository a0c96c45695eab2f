//! Snapshot-then-mutate editing and rollback, shared by tenders and bids
//!
//! Before an edit is applied the entity's current name and description are
//! appended to its version log. A rollback copies a logged version back onto
//! the entity. Versions are addressed by their own id and are never updated
//! or removed.
use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::models::{Bid, MAX_NAME_LEN, Tender};
use crate::repository::{Record, Repository};
use crate::store::Store;
use crate::types::{BidId, TenderId, TimeStamp, VersionId};
use chrono::Utc;
use std::fmt;

/// The editable part of a versioned entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Content {
    pub name: String,
    pub description: String,
}

/// Immutable snapshot of an entity's [`Content`], taken just before a
/// mutation. `I` is the id type of the entity it belongs to.
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Version<I> {
    pub id: VersionId,
    pub parent_id: I,
    pub name: String,
    pub description: String,
    pub created_at: TimeStamp<Utc>,
}

pub type TenderVersion = Version<TenderId>;
pub type BidVersion = Version<BidId>;

impl<I> Version<I> {
    pub fn content(&self) -> Content {
        Content {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

impl<C, I: minicbor::Encode<C>> minicbor::Encode<C> for Version<I> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(5)?;
        minicbor::Encode::encode(&self.id, e, ctx)?;
        minicbor::Encode::encode(&self.parent_id, e, ctx)?;
        e.str(&self.name)?.str(&self.description)?;
        minicbor::Encode::encode(&self.created_at, e, ctx)
    }
}

impl<'b, C, I: minicbor::Decode<'b, C>> minicbor::Decode<'b, C> for Version<I> {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        if d.array()? != Some(5) {
            return Err(minicbor::decode::Error::message(
                "expected a definite array of 5 version fields",
            ));
        }

        Ok(Version {
            id: minicbor::Decode::decode(d, ctx)?,
            parent_id: minicbor::Decode::decode(d, ctx)?,
            name: d.str()?.to_owned(),
            description: d.str()?.to_owned(),
            created_at: minicbor::Decode::decode(d, ctx)?,
        })
    }
}

/// Partial update of an entity's [`Content`]. A field that is absent or empty
/// leaves the current value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl EditPatch {
    pub fn new(name: Option<String>, description: Option<String>) -> Self {
        Self { name, description }
    }

    /// True when applying the patch cannot change anything.
    pub fn is_empty(&self) -> bool {
        let blank = |field: &Option<String>| field.as_deref().is_none_or(str::is_empty);
        blank(&self.name) && blank(&self.description)
    }

    /// Rejects a replacement name past the column width. Empty fields are
    /// "no change" and always pass.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_deref() {
            let actual = name.chars().count();
            if actual > MAX_NAME_LEN {
                return Err(ValidationError::TooLong {
                    field: "name",
                    max: MAX_NAME_LEN,
                    actual,
                });
            }
        }
        Ok(())
    }

    pub fn apply(&self, current: Content) -> Content {
        let pick = |patch: &Option<String>, current: String| match patch.as_deref() {
            Some(value) if !value.is_empty() => value.to_owned(),
            _ => current,
        };

        Content {
            name: pick(&self.name, current.name),
            description: pick(&self.description, current.description),
        }
    }
}

/// An entity with a name/description pair and a version log.
pub trait Versioned: Record + Clone {
    type Id: Clone + PartialEq + fmt::Display;

    /// Label used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
    fn content(&self) -> Content;
    fn set_content(&mut self, content: Content);
    fn touch(&mut self);
}

impl Versioned for Tender {
    type Id = TenderId;
    const KIND: &'static str = "tender";

    fn id(&self) -> &TenderId {
        &self.id
    }
    fn content(&self) -> Content {
        Content {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
    fn set_content(&mut self, content: Content) {
        self.name = content.name;
        self.description = content.description;
    }
    fn touch(&mut self) {
        self.updated_at = TimeStamp::new();
    }
}

impl Versioned for Bid {
    type Id = BidId;
    const KIND: &'static str = "bid";

    fn id(&self) -> &BidId {
        &self.id
    }
    fn content(&self) -> Content {
        Content {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
    fn set_content(&mut self, content: Content) {
        self.name = content.name;
        self.description = content.description;
    }
    fn touch(&mut self) {
        self.updated_at = TimeStamp::new();
    }
}

/// Edit/rollback engine over any [`Versioned`] entity.
pub struct VersionedStore<S> {
    repo: Repository<S>,
    snapshot_before_rollback: bool,
}

impl<S> Clone for VersionedStore<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            snapshot_before_rollback: self.snapshot_before_rollback,
        }
    }
}

impl<S: Store> VersionedStore<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self {
            repo,
            snapshot_before_rollback: false,
        }
    }

    /// Also log the pre-rollback content, making a rollback itself reversible.
    pub fn with_snapshot_before_rollback(mut self, enabled: bool) -> Self {
        self.snapshot_before_rollback = enabled;
        self
    }

    /// Append the entity's current content to its version log.
    pub fn snapshot<T>(&self, entity: &T) -> ServiceResult<Version<T::Id>>
    where
        T: Versioned,
        Version<T::Id>: Record,
    {
        let content = entity.content();
        let version = Version {
            id: VersionId::generate()?,
            parent_id: entity.id().clone(),
            name: content.name,
            description: content.description,
            created_at: TimeStamp::new(),
        };

        self.repo.append(&version)?;
        tracing::debug!(kind = T::KIND, id = %entity.id(), version = %version.id, "snapshot taken");

        Ok(version)
    }

    /// Validate, snapshot, apply `patch`, persist. Nothing is written to the
    /// entity if the snapshot cannot be stored, and nothing at all if the
    /// patch is invalid.
    pub fn apply_edit<T>(&self, mut entity: T, patch: &EditPatch) -> ServiceResult<T>
    where
        T: Versioned,
        Version<T::Id>: Record,
    {
        patch.validate()?;
        self.snapshot(&entity)?;

        let content = patch.apply(entity.content());
        entity.set_content(content);
        entity.touch();
        self.repo.save(&entity)?;

        Ok(entity)
    }

    /// Restore the content captured by `version_id`.
    pub fn rollback<T>(&self, mut entity: T, version_id: &VersionId) -> ServiceResult<T>
    where
        T: Versioned,
        Version<T::Id>: Record,
    {
        let version: Version<T::Id> = self
            .repo
            .load(version_id.as_str())?
            .ok_or_else(|| ServiceError::NotFound(format!("{} version {version_id}", T::KIND)))?;

        if &version.parent_id != entity.id() {
            return Err(ServiceError::Forbidden(format!(
                "{} version {version_id} does not belong to {} {}",
                T::KIND,
                T::KIND,
                entity.id()
            )));
        }

        if self.snapshot_before_rollback {
            self.snapshot(&entity)?;
        }

        entity.set_content(version.content());
        entity.touch();
        self.repo.save(&entity)?;

        Ok(entity)
    }

    /// Every version logged for `entity`, oldest first.
    pub fn history<T>(&self, entity: &T) -> ServiceResult<Vec<Version<T::Id>>>
    where
        T: Versioned,
        Version<T::Id>: Record,
    {
        let mut versions: Vec<Version<T::Id>> = self
            .repo
            .scan::<Version<T::Id>>()?
            .into_iter()
            .filter(|v| &v.parent_id == entity.id())
            .collect();
        versions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTender;
    use crate::store::MemoryStore;
    use crate::types::OrganizationId;
    use std::sync::Arc;

    fn setup() -> (Repository<MemoryStore>, VersionedStore<MemoryStore>, Tender) {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let versions = VersionedStore::new(repo.clone());
        let tender = NewTender {
            name: "Old name".into(),
            description: "Old description".into(),
            service_type: None,
            organization_id: OrganizationId::generate().unwrap(),
            creator_username: "alice".into(),
        }
        .into_tender()
        .unwrap();
        repo.save(&tender).unwrap();

        (repo, versions, tender)
    }

    #[test]
    fn empty_patch_fields_mean_no_change() {
        let current = Content {
            name: "n".into(),
            description: "d".into(),
        };
        let patch = EditPatch::new(Some(String::new()), Some("x".into()));

        assert_eq!(
            patch.apply(current),
            Content {
                name: "n".into(),
                description: "x".into()
            }
        );
        assert!(!patch.is_empty());
        assert!(EditPatch::new(Some(String::new()), None).is_empty());
    }

    #[test]
    fn edit_logs_previous_content() {
        let (repo, versions, tender) = setup();

        let edited = versions
            .apply_edit(tender.clone(), &EditPatch::new(Some("New name".into()), None))
            .unwrap();
        assert_eq!(edited.name, "New name");
        assert_eq!(edited.description, "Old description");
        assert_eq!(repo.tender(&tender.id).unwrap(), Some(edited.clone()));

        let history = versions.history(&edited).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].parent_id, tender.id);
        assert_eq!(history[0].name, "Old name");
    }

    #[test]
    fn overlong_names_are_rejected_before_logging() {
        let (repo, versions, tender) = setup();

        let patch = EditPatch::new(Some("x".repeat(MAX_NAME_LEN + 1)), None);
        let err = versions.apply_edit(tender.clone(), &patch).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::TooLong { field: "name", .. })
        ));
        assert!(versions.history(&tender).unwrap().is_empty());
        assert_eq!(repo.tender(&tender.id).unwrap(), Some(tender.clone()));

        // exactly at the limit is fine
        let patch = EditPatch::new(Some("x".repeat(MAX_NAME_LEN)), None);
        assert!(versions.apply_edit(tender, &patch).is_ok());
    }

    #[test]
    fn rollback_restores_and_does_not_log_by_default() {
        let (_, versions, tender) = setup();

        let edited = versions
            .apply_edit(tender, &EditPatch::new(Some("New".into()), Some("Newer".into())))
            .unwrap();
        let version = versions.history(&edited).unwrap().remove(0);

        let restored = versions.rollback(edited, &version.id).unwrap();
        assert_eq!(restored.content(), version.content());
        assert_eq!(versions.history(&restored).unwrap().len(), 1);
    }

    #[test]
    fn rollback_can_log_when_enabled() {
        let (_, versions, tender) = setup();
        let versions = versions.with_snapshot_before_rollback(true);

        let edited = versions
            .apply_edit(tender, &EditPatch::new(Some("New".into()), None))
            .unwrap();
        let version = versions.history(&edited).unwrap().remove(0);
        let restored = versions.rollback(edited, &version.id).unwrap();

        let history = versions.history(&restored).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].name, "New");
    }

    #[test]
    fn rollback_checks_version_owner() {
        let (repo, versions, tender) = setup();
        let other = NewTender {
            name: "Other".into(),
            description: String::new(),
            service_type: None,
            organization_id: tender.organization_id.clone(),
            creator_username: "alice".into(),
        }
        .into_tender()
        .unwrap();
        repo.save(&other).unwrap();

        let foreign = versions.snapshot(&other).unwrap();
        let err = versions.rollback(tender.clone(), &foreign.id).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let missing = VersionId::generate().unwrap();
        let err = versions.rollback(tender, &missing).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn version_cbor_roundtrip() {
        let (_, versions, tender) = setup();
        let version = versions.snapshot(&tender).unwrap();

        let encoded = minicbor::to_vec(&version).unwrap();
        let decoded: TenderVersion = minicbor::decode(&encoded).unwrap();
        assert_eq!(version, decoded);
    }
}
