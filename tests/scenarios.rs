use anyhow::Context;
use std::sync::Arc;
use tender_market::config::ServiceConfig;
use tender_market::error::StoreError;
use tender_market::models::{Author, NewBid, NewEmployee, NewOrganization, NewTender, Tender};
use tender_market::status::TenderStatus;
use tender_market::store::{SledStore, Store, Table};
use tender_market::types::{OrganizationId, Page, ServiceType, VersionId};
use tender_market::versioning::EditPatch;
use tender_market::{ErrorKind, Marketplace};

use tempfile::tempdir; // Use for test db cleanup.

// Each test opens its own sled database under a temp dir, since sled holds
// a file lock on the path.
fn open_market(
    dir: &tempfile::TempDir,
    name: &str,
    config: ServiceConfig,
) -> anyhow::Result<Marketplace<SledStore>> {
    let store = SledStore::open(dir.path().join(name))?;
    Ok(Marketplace::new(Arc::new(store), config))
}

fn register<S: Store>(
    market: &Marketplace<S>,
    username: &str,
    organization: &str,
) -> anyhow::Result<OrganizationId> {
    let org = market.directory.register_organization(NewOrganization {
        name: organization.into(),
        description: String::new(),
        organization_type: None,
    })?;
    market.directory.register_employee(NewEmployee {
        username: username.into(),
        first_name: None,
        last_name: None,
    })?;
    market.directory.assign_responsible(&org.id, username)?;

    Ok(org.id)
}

fn tender<S: Store>(
    market: &Marketplace<S>,
    name: &str,
    organization_id: &OrganizationId,
    creator: &str,
) -> anyhow::Result<Tender> {
    Ok(market.tenders.create_tender(NewTender {
        name: name.into(),
        description: format!("{name} description"),
        service_type: Some(ServiceType::Construction),
        organization_id: organization_id.clone(),
        creator_username: creator.into(),
    })?)
}

#[test]
fn bid_edit_and_rollback_survive_reopen() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("bid_rollback.db");

    let bid_id = {
        let market = Marketplace::new(
            Arc::new(SledStore::open(&db_path)?),
            ServiceConfig::default(),
        );
        let organization = register(&market, "user_u", "Org O")?;
        let tender = tender(&market, "T", &organization, "user_u")?;
        let user = market.directory.employee("user_u")?;

        let bid = market
            .bids
            .create_bid(NewBid {
                name: "Initial".into(),
                description: "offer".into(),
                tender_id: tender.id,
                author: Author::User(user.id),
            })
            .context("bid rejected: ")?;

        let edited = market.bids.edit_bid(
            &bid.id,
            "user_u",
            &EditPatch::new(Some("New".into()), None),
        )?;
        assert_eq!(edited.name, "New");
        bid.id
    };

    // reopen and roll back from the persisted log
    let market = Marketplace::new(
        Arc::new(SledStore::open(&db_path)?),
        ServiceConfig::default(),
    );
    let versions = market.bids.bid_versions(&bid_id, "user_u")?;
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].name, "Initial");
    assert_eq!(versions[0].parent_id, bid_id);

    let restored = market
        .bids
        .rollback_bid(&bid_id, &versions[0].id, "user_u")
        .context("rollback failed: ")?;
    assert_eq!(restored.name, "Initial");
    assert_eq!(restored.description, "offer");

    Ok(())
}

#[test]
fn tender_history_tracks_every_edit() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let market = open_market(&temp_dir, "tender_history.db", ServiceConfig::default())?;
    let organization = register(&market, "alice", "Acme")?;
    let tender = tender(&market, "v1", &organization, "alice")?;

    market
        .tenders
        .edit_tender(&tender.id, "alice", &EditPatch::new(Some("v2".into()), None))?;
    market.tenders.edit_tender(
        &tender.id,
        "alice",
        &EditPatch::new(Some("v3".into()), Some("third".into())),
    )?;

    let versions = market.tenders.tender_versions(&tender.id, "alice")?;
    let names: Vec<_> = versions.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["v1", "v2"]);

    // status survives a rollback; only name and description are restored
    market
        .tenders
        .set_tender_status(&tender.id, TenderStatus::Published, "alice")?;
    let restored = market
        .tenders
        .rollback_tender(&tender.id, &versions[0].id, "alice")?;
    assert_eq!(restored.name, "v1");
    assert_eq!(restored.description, "v1 description");
    assert_eq!(restored.status, TenderStatus::Published);

    // rollback is not itself logged by default
    assert_eq!(market.tenders.tender_versions(&tender.id, "alice")?.len(), 2);

    Ok(())
}

#[test]
fn rollback_can_be_logged_when_configured() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let config = ServiceConfig {
        snapshot_before_rollback: true,
        ..ServiceConfig::default()
    };
    let market = open_market(&temp_dir, "logged_rollback.db", config)?;
    let organization = register(&market, "alice", "Acme")?;
    let tender = tender(&market, "first", &organization, "alice")?;

    market.tenders.edit_tender(
        &tender.id,
        "alice",
        &EditPatch::new(Some("second".into()), None),
    )?;
    let first = market.tenders.tender_versions(&tender.id, "alice")?[0].id.clone();
    market.tenders.rollback_tender(&tender.id, &first, "alice")?;

    let versions = market.tenders.tender_versions(&tender.id, "alice")?;
    let names: Vec<_> = versions.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);

    // and the rollback itself can be undone
    let undone = market
        .tenders
        .rollback_tender(&tender.id, &versions[1].id, "alice")?;
    assert_eq!(undone.name, "second");

    Ok(())
}

#[test]
fn foreign_and_unknown_versions_are_refused() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let market = open_market(&temp_dir, "foreign_version.db", ServiceConfig::default())?;
    let organization = register(&market, "alice", "Acme")?;
    let first = tender(&market, "first", &organization, "alice")?;
    let second = tender(&market, "second", &organization, "alice")?;

    market
        .tenders
        .edit_tender(&first.id, "alice", &EditPatch::new(Some("renamed".into()), None))?;
    let foreign = market.tenders.tender_versions(&first.id, "alice")?[0].id.clone();

    let err = market
        .tenders
        .rollback_tender(&second.id, &foreign, "alice")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = market
        .tenders
        .rollback_tender(&second.id, &VersionId::generate()?, "alice")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // neither attempt touched the target
    assert_eq!(market.tenders.tender_versions(&second.id, "alice")?.len(), 0);

    Ok(())
}

#[test]
fn access_failures_are_told_apart() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let market = open_market(&temp_dir, "access.db", ServiceConfig::default())?;
    let acme = register(&market, "alice", "Acme")?;
    register(&market, "bob", "Globex")?;
    let tender = tender(&market, "Bridge", &acme, "alice")?;
    let patch = EditPatch::new(Some("hijacked".into()), None);

    let err = market
        .tenders
        .edit_tender(&tender.id, "ghost", &patch)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = market
        .tenders
        .edit_tender(&tender.id, "bob", &patch)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let missing = tender_market::types::TenderId::generate()?;
    let err = market
        .tenders
        .edit_tender(&missing, "alice", &patch)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // the bid listing uses the same gate
    let err = market
        .bids
        .bids_by_tender(&tender.id, "bob", Page::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = market
        .tenders
        .edit_tender(&tender.id, "", &patch)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(market.tenders.tender_versions(&tender.id, "alice")?.is_empty());

    Ok(())
}

#[test]
fn organization_bids_and_listings() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let market = open_market(&temp_dir, "org_bids.db", ServiceConfig::default())?;
    let acme = register(&market, "alice", "Acme")?;
    let globex = register(&market, "bob", "Globex")?;
    let tender = tender(&market, "Bridge", &acme, "alice")?;

    let bid = market.bids.create_bid(NewBid {
        name: "Acme offer".into(),
        description: String::new(),
        tender_id: tender.id.clone(),
        author: Author::Organization(acme.clone()),
    })?;

    let err = market
        .bids
        .create_bid(NewBid {
            name: "Globex offer".into(),
            description: String::new(),
            tender_id: tender.id.clone(),
            author: Author::Organization(globex),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = market
        .bids
        .create_bid(NewBid {
            name: "Lost".into(),
            description: String::new(),
            tender_id: tender_market::types::TenderId::generate()?,
            author: Author::Organization(acme),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // alice acts for the authoring organization, bob does not
    assert_eq!(market.bids.my_bids("alice", Page::default())?, vec![bid.clone()]);
    assert!(market.bids.my_bids("bob", Page::default())?.is_empty());
    assert_eq!(
        market.bids.bids_by_tender(&tender.id, "alice", Page::default())?,
        vec![bid.clone()]
    );

    let err = market
        .bids
        .edit_bid(&bid.id, "bob", &EditPatch::new(Some("mine".into()), None))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    Ok(())
}

#[test]
fn public_listing_shows_published_tenders_by_name() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let market = open_market(&temp_dir, "listing.db", ServiceConfig::default())?;
    let organization = register(&market, "alice", "Acme")?;

    for name in ["g", "c", "a", "f", "b", "e", "d"] {
        let created = tender(&market, name, &organization, "alice")?;
        market
            .tenders
            .set_tender_status(&created.id, TenderStatus::Published, "alice")?;
    }
    // left in CREATED, never listed
    tender(&market, "0-draft", &organization, "alice")?;

    let names = |page: Page, service_type| -> anyhow::Result<Vec<String>> {
        Ok(market
            .tenders
            .list_tenders(service_type, page)?
            .into_iter()
            .map(|t| t.name)
            .collect())
    };

    assert_eq!(names(Page::default(), None)?, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(names(Page::new(Some(3), Some(5)), None)?, vec!["f", "g"]);
    assert_eq!(
        names(Page::new(Some(0), None), Some(ServiceType::Construction))?.len(),
        5
    );
    assert!(names(Page::default(), Some(ServiceType::Delivery))?.is_empty());

    Ok(())
}

#[test]
fn my_tenders_matches_like_patterns() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let market = open_market(&temp_dir, "my_tenders.db", ServiceConfig::default())?;
    let organization = register(&market, "alice", "Acme")?;
    tender(&market, "Bridge", &organization, "alice")?;

    assert_eq!(market.tenders.my_tenders("alice", Page::default())?.len(), 1);
    assert_eq!(market.tenders.my_tenders("al%", Page::default())?.len(), 1);
    assert_eq!(market.tenders.my_tenders("_lice", Page::default())?.len(), 1);
    assert!(market.tenders.my_tenders("bob", Page::default())?.is_empty());

    Ok(())
}

/// Delegates to sled but refuses every version log write.
struct FailingVersionLog(SledStore);

impl Store for FailingVersionLog {
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.0.get(table, key)
    }

    fn put(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.0.put(table, key, value)
    }

    fn insert_new(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        match table {
            Table::TenderVersions | Table::BidVersions => Err(StoreError::Sled(
                sled::Error::Unsupported("version log offline".into()),
            )),
            _ => self.0.insert_new(table, key, value),
        }
    }

    fn scan(&self, table: Table) -> Result<Vec<Vec<u8>>, StoreError> {
        self.0.scan(table)
    }
}

#[test]
fn failed_snapshot_leaves_entity_untouched() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let store = FailingVersionLog(SledStore::open(temp_dir.path().join("fail_closed.db"))?);
    let market = Marketplace::new(Arc::new(store), ServiceConfig::default());
    let organization = register(&market, "alice", "Acme")?;
    let tender = tender(&market, "Bridge", &organization, "alice")?;

    let err = market
        .tenders
        .edit_tender(
            &tender.id,
            "alice",
            &EditPatch::new(Some("changed".into()), Some("changed".into())),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    let mine = market.tenders.my_tenders("alice", Page::default())?;
    assert_eq!(mine, vec![tender]);

    Ok(())
}

/// Delegates to sled but refuses to overwrite tender and bid rows.
struct FailingEntityWrites(SledStore);

impl Store for FailingEntityWrites {
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.0.get(table, key)
    }

    fn put(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        match table {
            Table::Tenders | Table::Bids => Err(StoreError::Sled(sled::Error::Unsupported(
                "entity rows are read-only".into(),
            ))),
            _ => self.0.put(table, key, value),
        }
    }

    fn insert_new(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.0.insert_new(table, key, value)
    }

    fn scan(&self, table: Table) -> Result<Vec<Vec<u8>>, StoreError> {
        self.0.scan(table)
    }
}

#[test]
fn failed_update_keeps_its_snapshot() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let store = FailingEntityWrites(SledStore::open(temp_dir.path().join("orphan.db"))?);
    let market = Marketplace::new(Arc::new(store), ServiceConfig::default());
    let organization = register(&market, "alice", "Acme")?;
    let tender = tender(&market, "Bridge", &organization, "alice")?;
    let user = market.directory.employee("alice")?;
    let bid = market.bids.create_bid(NewBid {
        name: "Offer".into(),
        description: String::new(),
        tender_id: tender.id.clone(),
        author: Author::User(user.id),
    })?;
    let patch = EditPatch::new(Some("changed".into()), None);

    let err = market
        .tenders
        .edit_tender(&tender.id, "alice", &patch)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(market.tenders.my_tenders("alice", Page::default())?, vec![tender.clone()]);

    // the snapshot stays behind without a matching change
    let versions = market.tenders.tender_versions(&tender.id, "alice")?;
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].name, "Bridge");

    let err = market.bids.edit_bid(&bid.id, "alice", &patch).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(market.bids.my_bids("alice", Page::default())?, vec![bid.clone()]);
    let versions = market.bids.bid_versions(&bid.id, "alice")?;
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].name, "Offer");

    Ok(())
}
