use axum::extract::FromRef;

use crate::collection_store::CollectionStore;
use crate::import_export::ImportExportService;
use std::sync::Arc;
use std::time::Instant;

use super::auth::AuthGate;
use super::ServerConfig;

pub type GuardedCollectionStore = Arc<dyn CollectionStore>;
pub type GuardedAuthGate = Arc<dyn AuthGate>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub collection_store: GuardedCollectionStore,
    pub import_export: ImportExportService,
    pub auth_gate: GuardedAuthGate,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        collection_store: GuardedCollectionStore,
        auth_gate: GuardedAuthGate,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            import_export: ImportExportService::new(collection_store.clone()),
            collection_store,
            auth_gate,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for GuardedCollectionStore {
    fn from_ref(input: &ServerState) -> Self {
        input.collection_store.clone()
    }
}

impl FromRef<ServerState> for ImportExportService {
    fn from_ref(input: &ServerState) -> Self {
        input.import_export.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
