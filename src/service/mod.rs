//! Service layer API for the marketplace use cases
//!
//! Each service resolves the acting identity, runs the ownership gate and
//! only then touches the version log and the entity rows.
mod bid;
mod directory;
mod tender;

pub use bid::BidService;
pub use directory::DirectoryService;
pub use tender::TenderService;

use crate::config::ServiceConfig;
use crate::store::Store;
use std::sync::Arc;

/// All services wired over one shared store.
pub struct Marketplace<S> {
    pub tenders: TenderService<S>,
    pub bids: BidService<S>,
    pub directory: DirectoryService<S>,
}

impl<S: Store> Marketplace<S> {
    pub fn new(instance: Arc<S>, config: ServiceConfig) -> Self {
        Self {
            tenders: TenderService::new(Arc::clone(&instance), config.clone()),
            bids: BidService::new(Arc::clone(&instance), config),
            directory: DirectoryService::new(instance),
        }
    }
}
