use axum::extract::FromRef;

use crate::history::HistoryStore;
use crate::mood::MoodClassifier;
use std::sync::Arc;
use std::time::Instant;

use super::pages::Pages;
use super::ServerConfig;

pub type GuardedHistoryStore = Arc<dyn HistoryStore>;
pub type GuardedClassifier = Arc<dyn MoodClassifier>;
pub type GuardedPages = Arc<Pages>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub history_store: GuardedHistoryStore,
    pub classifier: GuardedClassifier,
    pub pages: GuardedPages,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        history_store: GuardedHistoryStore,
        classifier: GuardedClassifier,
        pages: GuardedPages,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            history_store,
            classifier,
            pages,
        }
    }
}

impl FromRef<ServerState> for GuardedHistoryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.history_store.clone()
    }
}

impl FromRef<ServerState> for GuardedClassifier {
    fn from_ref(input: &ServerState) -> Self {
        input.classifier.clone()
    }
}

impl FromRef<ServerState> for GuardedPages {
    fn from_ref(input: &ServerState) -> Self {
        input.pages.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
