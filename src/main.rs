//! Tender marketplace CLI
//!
//! ```bash
//! tender org add --name "Acme" --type LLC
//! tender user add alice
//! tender user assign alice --organization org1...
//! tender tender new --name "Bridge" --organization org1... --creator alice
//! tender tender edit tender1... --username alice --name "Bridge repair"
//! tender bid versions bid1... --username bob
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tender_market::config::Config;
use tender_market::error::ValidationError;
use tender_market::models::{Author, NewBid, NewEmployee, NewOrganization, NewTender};
use tender_market::status::TenderStatus;
use tender_market::store::{MemoryStore, SledStore, Store};
use tender_market::types::{
    AuthorType, BidId, OrganizationId, OrganizationType, Page, ServiceType, TenderId, VersionId,
};
use tender_market::versioning::EditPatch;
use tender_market::{ErrorKind, Marketplace, ServiceError};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tender")]
#[command(version)]
#[command(about = "Tender and bid marketplace", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory of the sled database, overrides the configured path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Run against a throwaway in-memory store
    #[arg(long)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage organizations
    Org {
        #[command(subcommand)]
        action: OrgCommands,
    },
    /// Manage employees
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Manage tenders
    Tender {
        #[command(subcommand)]
        action: TenderCommands,
    },
    /// Manage bids
    Bid {
        #[command(subcommand)]
        action: BidCommands,
    },
}

#[derive(Subcommand)]
enum OrgCommands {
    /// Register an organization
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "type")]
        organization_type: Option<OrganizationType>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register an employee
    Add {
        username: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Make a user responsible for an organization
    Assign {
        username: String,
        #[arg(long)]
        organization: OrganizationId,
    },
}

#[derive(clap::Args)]
struct PageArgs {
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
}

impl PageArgs {
    fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

#[derive(Subcommand)]
enum TenderCommands {
    /// List published tenders
    List {
        #[arg(long)]
        service_type: Option<ServiceType>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Create a tender
    New {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        service_type: Option<ServiceType>,
        #[arg(long)]
        organization: OrganizationId,
        #[arg(long)]
        creator: String,
    },
    /// Tenders created by a username (`%` and `_` match like SQL LIKE)
    My {
        username: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show or change a tender's status
    Status {
        id: TenderId,
        /// New status; omit to print the current one
        #[arg(long)]
        set: Option<TenderStatus>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Edit name and/or description
    Edit {
        id: TenderId,
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Restore a logged version
    Rollback {
        id: TenderId,
        version: VersionId,
        #[arg(long)]
        username: String,
    },
    /// Show the version log
    Versions {
        id: TenderId,
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum BidCommands {
    /// Submit a bid
    New {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        tender: TenderId,
        #[arg(long)]
        author_type: AuthorType,
        #[arg(long)]
        author_id: String,
    },
    /// Bids authored by a user or their organization
    My {
        username: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Bids placed on a tender
    List {
        tender: TenderId,
        #[arg(long)]
        username: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Edit name and/or description
    Edit {
        id: BidId,
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Restore a logged version
    Rollback {
        id: BidId,
        version: VersionId,
        #[arg(long)]
        username: String,
    },
    /// Show the version log
    Versions {
        id: BidId,
        #[arg(long)]
        username: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(exit_code(&error))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.storage.path = db;
    }
    config.storage.in_memory |= cli.in_memory;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if config.storage.in_memory {
        let store = Arc::new(MemoryStore::new());
        dispatch(store, config, cli.command)
    } else {
        let store = SledStore::open(&config.storage.path)
            .with_context(|| format!("opening {}", config.storage.path.display()))?;
        tracing::debug!(path = %config.storage.path.display(), "store opened");
        dispatch(Arc::new(store), config, cli.command)
    }
}

fn dispatch<S: Store>(store: Arc<S>, config: Config, command: Commands) -> anyhow::Result<()> {
    let market = Marketplace::new(Arc::clone(&store), config.service);

    match command {
        Commands::Org { action } => org(&market, action)?,
        Commands::User { action } => user(&market, action)?,
        Commands::Tender { action } => tender(&market, action)?,
        Commands::Bid { action } => bid(&market, action)?,
    }

    store.flush()?;
    Ok(())
}

fn org<S: Store>(market: &Marketplace<S>, action: OrgCommands) -> anyhow::Result<()> {
    match action {
        OrgCommands::Add {
            name,
            description,
            organization_type,
        } => print(&market.directory.register_organization(NewOrganization {
            name,
            description,
            organization_type,
        })?),
    }
}

fn user<S: Store>(market: &Marketplace<S>, action: UserCommands) -> anyhow::Result<()> {
    match action {
        UserCommands::Add {
            username,
            first_name,
            last_name,
        } => print(&market.directory.register_employee(NewEmployee {
            username,
            first_name,
            last_name,
        })?),
        UserCommands::Assign {
            username,
            organization,
        } => print(&market.directory.assign_responsible(&organization, &username)?),
    }
}

fn tender<S: Store>(market: &Marketplace<S>, action: TenderCommands) -> anyhow::Result<()> {
    let tenders = &market.tenders;

    match action {
        TenderCommands::List { service_type, page } => {
            print(&tenders.list_tenders(service_type, page.page())?)
        }
        TenderCommands::New {
            name,
            description,
            service_type,
            organization,
            creator,
        } => print(&tenders.create_tender(NewTender {
            name,
            description,
            service_type,
            organization_id: organization,
            creator_username: creator,
        })?),
        TenderCommands::My { username, page } => print(&tenders.my_tenders(&username, page.page())?),
        TenderCommands::Status { id, set, username } => match set {
            Some(status) => {
                let username = username.context("--username is required to change a status")?;
                print(&tenders.set_tender_status(&id, status, &username)?)
            }
            None => print(&tenders.tender_status(&id)?),
        },
        TenderCommands::Edit {
            id,
            username,
            name,
            description,
        } => print(&tenders.edit_tender(&id, &username, &EditPatch::new(name, description))?),
        TenderCommands::Rollback {
            id,
            version,
            username,
        } => print(&tenders.rollback_tender(&id, &version, &username)?),
        TenderCommands::Versions { id, username } => {
            print(&tenders.tender_versions(&id, &username)?)
        }
    }
}

fn bid<S: Store>(market: &Marketplace<S>, action: BidCommands) -> anyhow::Result<()> {
    let bids = &market.bids;

    match action {
        BidCommands::New {
            name,
            description,
            tender,
            author_type,
            author_id,
        } => print(&bids.create_bid(NewBid {
            name,
            description,
            tender_id: tender,
            author: Author::parse(author_type, &author_id).map_err(ServiceError::from)?,
        })?),
        BidCommands::My { username, page } => print(&bids.my_bids(&username, page.page())?),
        BidCommands::List {
            tender,
            username,
            page,
        } => print(&bids.bids_by_tender(&tender, &username, page.page())?),
        BidCommands::Edit {
            id,
            username,
            name,
            description,
        } => print(&bids.edit_bid(&id, &username, &EditPatch::new(name, description))?),
        BidCommands::Rollback {
            id,
            version,
            username,
        } => print(&bids.rollback_bid(&id, &version, &username)?),
        BidCommands::Versions { id, username } => print(&bids.bid_versions(&id, &username)?),
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(error: &anyhow::Error) -> u8 {
    let kind = error.chain().find_map(|cause| {
        if let Some(service) = cause.downcast_ref::<ServiceError>() {
            return Some(service.kind());
        }
        cause
            .downcast_ref::<ValidationError>()
            .map(|_| ErrorKind::Validation)
    });

    match kind {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::Unauthorized) => 4,
        Some(ErrorKind::Forbidden) => 5,
        Some(ErrorKind::Storage) | None => 1,
    }
}
