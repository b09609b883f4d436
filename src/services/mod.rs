//! Business logic services

pub mod access;
pub mod catalog;
pub mod circulation;
pub mod credentials;
pub mod fines;
pub mod inventory;
pub mod session;

use crate::{config::AppConfig, repository::SharedStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub credentials: credentials::CredentialStore,
    pub sessions: session::SessionCredential,
    pub inventory: inventory::InventoryLedger,
    pub loans: circulation::LoanWorkflow,
    pub fines: fines::FineEngine,
    pub access: access::AccessControl,
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services over the given store
    pub fn new(store: SharedStore, config: &AppConfig) -> Self {
        let credentials = credentials::CredentialStore::new(store.clone());
        let inventory = inventory::InventoryLedger::new(store.clone());

        Self {
            sessions: session::SessionCredential::new(config.auth.clone()),
            loans: circulation::LoanWorkflow::new(
                store.clone(),
                inventory.clone(),
                credentials.clone(),
                config.circulation.clone(),
            ),
            fines: fines::FineEngine::new(
                store.clone(),
                credentials.clone(),
                fines::FinePolicy::from(&config.circulation),
            ),
            access: access::AccessControl::new(credentials.clone(), config.auth.verify_live_status),
            catalog: catalog::CatalogService::new(store),
            credentials,
            inventory,
        }
    }
}
